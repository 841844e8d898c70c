//! Logging system setup and configuration.
//!
//! Installs a tracing-subscriber registry with an `EnvFilter` and either a
//! human-readable or a JSON formatting layer.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the configured level. JSON output is used
/// when either the config or the `json_format` override asks for it.
pub fn setup_logging(config: &LoggingSettings, json_format: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        registry
            .with(fmt::layer().json().with_file(false).with_line_number(false).with_target(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_file(false).with_line_number(false))
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    Ok(())
}

/// Logs the startup banner
pub fn display_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("╔══════════════════════════════════════════╗");
    info!("║                 📊 TALLY                 ║");
    info!("║      analytics host v{:<20}║", version);
    info!("║                                          ║");
    info!("║  🔔 Ordered, plugin-aware events         ║");
    info!("║  ⏪ Pending replay for late plugins      ║");
    info!("║  🌐 Per-plugin translations              ║");
    info!("╚══════════════════════════════════════════╝");
}
