use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use anchor_config::{LogFormat, LogLevel};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level` when set. Calling this more than once keeps the
/// first subscriber.
pub fn init(log_level: LogLevel, log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stdout()))
        .with_thread_ids(false);

    let _ = match log_format {
        LogFormat::Plaintext => builder.finish().try_init(),
        LogFormat::Json => builder.json().finish().try_init(),
    };
}

fn default_directive(log_level: LogLevel) -> String {
    format!("{log_level},anchor={log_level}")
}
