use {
    crate::Config,
    std::{io::IsTerminal, panic::PanicHookInfo, sync::Once},
    time::macros::format_description,
    tracing::{Metadata, level_filters::LevelFilter},
    tracing_subscriber::{
        EnvFilter,
        Layer,
        fmt::{MakeWriter, time::UtcTime, writer::MakeWriterExt as _},
        prelude::*,
        util::SubscriberInitExt,
    },
};

/// Initializes the tracing setup shared between the binaries.
///
/// Events at or above the severity of the configured stderr threshold go to
/// stderr, all others to stdout. A `TRACE` threshold keeps stdout free of
/// logs.
pub fn initialize(config: &Config) {
    set_tracing_subscriber(config);
    std::panic::set_hook(Box::new(tracing_panic_hook));
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(env_filter: &str) {
    // The tracing subscriber below is a global object so initializing it again
    // in the same process would fail.
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        set_tracing_subscriber(&Config::default().with_env_filter(env_filter));
        std::panic::set_hook(Box::new(tracing_panic_hook));
    });
}

fn set_tracing_subscriber(config: &Config) {
    let writer = split_by_level(std::io::stderr, std::io::stdout, config.stderr_threshold);
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ));

    let fmt_layer = if config.use_json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(timer)
            .with_filter(EnvFilter::new(&config.env_filter))
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_timer(timer)
            .with_ansi(std::io::stdout().is_terminal() && std::io::stderr().is_terminal())
            .with_filter(EnvFilter::new(&config.env_filter))
            .boxed()
    };

    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Sends events the threshold enables to `stderr` and everything else to
/// `stdout`.
fn split_by_level<E, O>(
    stderr: E,
    stdout: O,
    threshold: LevelFilter,
) -> impl for<'a> MakeWriter<'a> + Send + Sync + 'static
where
    E: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    O: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    stderr
        .with_filter(move |meta: &Metadata<'_>| threshold >= *meta.level())
        .or_else(stdout)
}

/// Panic hook that prints roughly the same message as the default panic hook
/// but uses `tracing::error` instead of stderr so the message ends up in the
/// regular log format.
fn tracing_panic_hook(panic: &PanicHookInfo) {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("<unnamed>");
    let backtrace = std::backtrace::Backtrace::force_capture();
    tracing::error!("thread '{name}' {panic}\nstack backtrace:\n{backtrace}");
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::{
            io,
            sync::{Arc, Mutex},
        },
    };

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Logs one event per level and returns what ended up on (stderr, stdout).
    fn log_with_threshold(threshold: LevelFilter) -> (String, String) {
        let stderr = Buffer::default();
        let stdout = Buffer::default();
        let writer = split_by_level(
            {
                let stderr = stderr.clone();
                move || stderr.clone()
            },
            {
                let stdout = stdout.clone();
                move || stdout.clone()
            },
            threshold,
        );
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .with_max_level(LevelFilter::TRACE)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("error event");
            tracing::warn!("warn event");
            tracing::info!("info event");
            tracing::debug!("debug event");
        });
        (stderr.contents(), stdout.contents())
    }

    #[test]
    fn severe_events_go_to_stderr() {
        let (stderr, stdout) = log_with_threshold(LevelFilter::WARN);
        assert!(stderr.contains("error event"));
        assert!(stderr.contains("warn event"));
        assert!(!stderr.contains("info event"));
        assert!(!stdout.contains("warn event"));
        assert!(stdout.contains("info event"));
        assert!(stdout.contains("debug event"));
    }

    #[test]
    fn error_threshold_keeps_only_errors_on_stderr() {
        let (stderr, stdout) = log_with_threshold(LevelFilter::ERROR);
        assert!(stderr.contains("error event"));
        assert!(!stderr.contains("warn event"));
        assert!(!stdout.contains("error event"));
        assert!(stdout.contains("warn event"));
    }

    #[test]
    fn trace_threshold_keeps_stdout_clean() {
        let (stderr, stdout) = log_with_threshold(LevelFilter::TRACE);
        assert!(stderr.contains("error event"));
        assert!(stderr.contains("debug event"));
        assert!(stdout.is_empty());
    }

    #[test]
    fn off_threshold_keeps_stderr_clean() {
        let (stderr, stdout) = log_with_threshold(LevelFilter::OFF);
        assert!(stderr.is_empty());
        assert!(stdout.contains("error event"));
    }
}
