use {
    anyhow::{Context, Result},
    number::{ByteCount, Winston},
    reqwest::Client,
    tracing::instrument,
    url::Url,
};

/// Source of network prices for storing data.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait ArweaveOracle: Send + Sync {
    /// The winston price of a transaction carrying `byte_count` bytes of data.
    async fn get_winston_price_for_byte_count(&self, byte_count: ByteCount) -> Result<Winston>;
}

/// Asks an Arweave gateway via `GET {gateway}/price/{bytes}`.
pub struct GatewayArweaveOracle {
    client: Client,
    gateway: Url,
}

impl GatewayArweaveOracle {
    pub const DEFAULT_GATEWAY: &'static str = "https://arweave.net";

    pub fn new(client: Client, gateway: Url) -> Self {
        Self { client, gateway }
    }

    fn price_url(&self, byte_count: ByteCount) -> Url {
        let price = http_client::join(&self.gateway, "price");
        http_client::join(&price, &byte_count.to_string())
    }
}

#[async_trait::async_trait]
impl ArweaveOracle for GatewayArweaveOracle {
    #[instrument(skip(self))]
    async fn get_winston_price_for_byte_count(&self, byte_count: ByteCount) -> Result<Winston> {
        let url = self.price_url(byte_count);
        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .context("failed to make request")?
            .error_for_status()
            .context("response status is not success")?
            .text()
            .await
            .context("failed to fetch response body")?;
        tracing::debug!(%url, %body, "gateway price");

        body.trim()
            .parse()
            .with_context(|| format!("failed to parse price response: {body:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_price_url() {
        let oracle = GatewayArweaveOracle::new(
            Client::new(),
            GatewayArweaveOracle::DEFAULT_GATEWAY.parse().unwrap(),
        );
        assert_eq!(
            oracle.price_url(ByteCount::kib(100)).as_str(),
            "https://arweave.net/price/102400"
        );
    }

    #[tokio::test]
    #[ignore]
    async fn arweave_gateway_price() {
        let oracle = GatewayArweaveOracle::new(
            Client::new(),
            GatewayArweaveOracle::DEFAULT_GATEWAY.parse().unwrap(),
        );
        let price = oracle
            .get_winston_price_for_byte_count(ByteCount::kib(100))
            .await
            .unwrap();
        println!("100 KiB cost {price} winston");
        assert!(!price.is_zero());
    }
}
