//! Tracing initialization for binaries embedding the core.

use tracing_subscriber::EnvFilter;

use crate::config::TelemetrySettings;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Safe to call once per
/// process; later calls are ignored.
pub fn init_tracing(settings: &TelemetrySettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));

    if settings.json_logs {
        let _ = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init();
    }
}
