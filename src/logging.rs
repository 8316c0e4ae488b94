// logging.rs
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "collabsync";

/// Console logging always; in production a second layer writes to
/// `<log_dir>/collabsync.YYYY-MM-DD.log`, starting a new file each UTC day.
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(
    production: bool,
    log_dir: &str,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    let console = fmt::layer().with_target(false);

    if production {
        std::fs::create_dir_all(log_dir)?;
        let (writer, guard) = tracing_appender::non_blocking(daily_appender(log_dir)?);

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()?;

        tracing::info!("Logging to console and {}/{}.*.log", log_dir, LOG_FILE_PREFIX);
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init()?;

        Ok(None)
    }
}

pub fn daily_appender(log_dir: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
}
