use crate::config::LoggingConfig;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

pub const LOG_FILE_PREFIX: &str = "clinic.log";

/// JSON lines to a daily-rotated file under `log_dir`, text to the console.
///
/// `RUST_LOG` overrides the configured level. Keep the returned guard alive
/// for the life of the process or buffered file lines are lost.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_target(true)
        .with_current_span(true);

    let console_layer = fmt::layer().with_target(true).with_thread_ids(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    set_global_default(
        Registry::default()
            .with(env_filter)
            .with(file_layer)
            .with(console_layer),
    )?;

    tracing::info!(level = %config.level, log_dir = %config.log_dir, "Logging initialized");

    Ok(guard)
}

/// Audit log for authentication and record mutations.
/// Only identifiers go in here: never names, emails or passwords.
#[macro_export]
macro_rules! audit_log {
    ($event_type:expr, $action:expr, $subject_id:expr, $success:expr) => {
        tracing::info!(
            event_type = $event_type,
            action = $action,
            subject_id = ?$subject_id,
            success = $success,
            timestamp = chrono::Utc::now().to_rfc3339(),
            "AUDIT_EVENT"
        );
    };
    ($event_type:expr, $action:expr, $subject_id:expr, $success:expr, $reason:expr) => {
        tracing::info!(
            event_type = $event_type,
            action = $action,
            subject_id = ?$subject_id,
            success = $success,
            reason = $reason,
            timestamp = chrono::Utc::now().to_rfc3339(),
            "AUDIT_EVENT"
        );
    };
}
