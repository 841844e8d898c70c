//! # Tally
//!
//! Analytics host built around an ordered, plugin-aware event dispatcher.
//! This crate is the composition root: it reads configuration, sets up
//! logging, builds the [`Host`] and loads the built-in plugins.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (writes tally.toml if missing)
//! tally
//!
//! # Custom configuration, catalog and verbose logs
//! tally --config production.toml --catalog lang/en.json --log-level debug
//!
//! # Enable test-only events
//! TALLY_TEST_MODE=1 tally
//! ```

use tracing::error;

pub mod app;
pub mod builtin;
pub mod cli;
pub mod config;
pub mod host;
pub mod logging;
pub mod menu;
pub mod options;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Entry point called from the binary's `main`.
///
/// Exits the process with status 1 when logging, configuration or startup
/// fails.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the config file, before it is validated
    let mut log_settings = AppConfig::load_from_file(&args.config_path)
        .await
        .map(|config| config.logging)
        .unwrap_or_default();
    if let Some(level) = &args.log_level {
        log_settings.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&log_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{LoggingSettings, PluginSettings, TranslationSettings};
pub use host::Host;
pub use menu::{MenuEntry, MenuItem, MenuKind, MenuRegistry};
pub use options::{InMemoryOptionStore, OptionStore};
