use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Timestamp format of log records
const LOG_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Default log level for a `-v` count.
pub fn default_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the process-wide subscriber. Must be called once, before any
/// command runs. `RUST_LOG` overrides the default level.
pub fn setup_logging(verbose: u8) -> Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new(LOG_TIME_FORMAT.into());
    let format = tracing_subscriber::fmt::format()
        .with_timer(timer)
        .with_target(false);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level(verbose).into())
        .from_env()?;
    let subscriber = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(subscriber).try_init()?;
    Ok(())
}
