use {
    reqwest::{Client, ClientBuilder},
    std::{
        fmt::{self, Display, Formatter},
        time::Duration,
    },
    url::Url,
};

const USER_AGENT: &str = concat!("ardrive-pricing/", env!("CARGO_PKG_VERSION"));

/// An HTTP client factory.
///
/// This ensures a common configuration for all HTTP clients talking to
/// gateways and contract caches, while still giving each of them its own
/// connection pool.
#[derive(Clone, Debug)]
pub struct HttpClientFactory {
    timeout: Duration,
}

impl HttpClientFactory {
    pub fn new(args: &Arguments) -> Self {
        Self {
            timeout: args.http_timeout,
        }
    }

    /// Creates a new HTTP client with the default settings.
    pub fn create(&self) -> reqwest::Result<Client> {
        self.builder().build()
    }

    fn builder(&self) -> ClientBuilder {
        ClientBuilder::new()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
    }
}

/// Command line arguments for the common HTTP factory.
#[derive(clap::Parser)]
#[group(skip)]
pub struct Arguments {
    /// Default timeout for http requests.
    #[clap(
        long,
        env,
        default_value = "10s",
        value_parser = humantime::parse_duration,
    )]
    pub http_timeout: Duration,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self { http_timeout } = self;

        writeln!(f, "http_timeout: {:?}", http_timeout)
    }
}

/// Appends `segment` as a new path segment of `base`, keeping any path the
/// base URL already has.
pub fn join(base: &Url, segment: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_appends_segment() {
        let base = Url::parse("https://arweave.net").unwrap();
        assert_eq!(join(&base, "price").as_str(), "https://arweave.net/price");

        let base = Url::parse("https://gateway.example/api/").unwrap();
        assert_eq!(
            join(&join(&base, "price"), "1024").as_str(),
            "https://gateway.example/api/price/1024"
        );
    }

    #[test]
    fn join_escapes_segment() {
        let base = Url::parse("https://v2.cache.verto.exchange").unwrap();
        assert_eq!(
            join(&base, "a/b").as_str(),
            "https://v2.cache.verto.exchange/a%2Fb"
        );
    }
}
