//! Application lifecycle: configuration, host construction, plugin loading
//! and shutdown.

use crate::{builtin, cli::CliArgs, config::AppConfig, host::Host, logging::display_banner};
use serde_json::json;
use tally_events::{EventParameters, EventStats, PluginSystemError};
use tally_i18n::{Catalog, Translator};
use tracing::{error, info};

/// Event posted once the host is constructed. It is pending, so plugins
/// loaded afterwards still receive it.
pub const HOST_INITIALIZED_EVENT: &str = "Host.initialized";

pub struct Application {
    config: AppConfig,
    host: Host,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply environment and command-line overrides
    /// 3. Validate merged configuration
    /// 4. Load the translation catalog and build the host
    /// 5. Post the pending `Host.initialized` event
    /// 6. Load the enabled built-in plugins
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        Self::apply_overrides(&mut config, &args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();
        Self::from_config(config)
    }

    /// Environment first, then command line, so flags win
    fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
        config.apply_env_overrides();

        if let Some(log_level) = &args.log_level {
            config.logging.level = log_level.clone();
        }
        if args.json_logs {
            config.logging.json_format = true;
        }
        if args.test_mode {
            config.dispatcher.test_mode = true;
        }
        if let Some(catalog) = &args.catalog {
            config.translation.catalog_path = Some(catalog.to_string_lossy().to_string());
        }
    }

    /// Build the host from a validated configuration
    pub fn from_config(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let catalog = match &config.translation.catalog_path {
            Some(path) => Catalog::load_file(path)?,
            None => Catalog::new(),
        };
        let translator = Translator::new(catalog, config.translation.format_policy());

        let mut host = Host::new(
            config.dispatcher.clone(),
            config.plugins.to_plugin_config(),
            translator,
        );
        builtin::install_providers(&mut host);

        let mut params = EventParameters::new();
        params.push(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "test_mode": config.dispatcher.test_mode,
        }))?;
        host.post_event(HOST_INITIALIZED_EVENT, &mut params, true, None);

        for name in &config.plugins.enabled {
            let factory = builtin::factory(name).ok_or_else(|| PluginSystemError::NotFound(name.clone()))?;
            host.load_plugin(factory.as_ref())?;
        }

        Ok(Self { config, host })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Runs the host once through: builds the menus, fires the self-check
    /// test event, reports statistics and shuts plugins down.
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Tally");
        self.log_configuration_summary();

        let main = self.host.get_menu();
        let admin = self.host.get_admin_menu();
        let top = self.host.get_top_menu();
        info!("🧭 Menus: {} main, {} admin, {} top entries", main.len(), admin.len(), top.len());

        let mut params = EventParameters::new();
        params.push(self.host.plugins().plugin_names())?;
        if let Some(report) = self.host.post_test_event("Host.selfCheck", &mut params, false, None) {
            if !report.is_success() {
                error!("❌ Self-check reported {} failure(s)", report.failures.len());
            }
        }

        if let Some(trail) = builtin::activity_trail(&self.host) {
            info!("📝 Activity trail holds {} event(s)", trail.len());
        }
        log_statistics(&self.host.dispatcher().stats());

        info!("🔌 Shutting down plugins...");
        self.host.shutdown();
        info!("✅ Tally shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🧪 Test mode: {}", self.config.dispatcher.test_mode);
        info!(
            "  ⏪ Pending replay: {} (max {})",
            self.config.dispatcher.record_pending, self.config.dispatcher.max_pending
        );
        info!(
            "  🌐 Catalog: {}",
            self.config.translation.catalog_path.as_deref().unwrap_or("<none>")
        );
        info!("  🔌 Plugins: {:?}", self.host.plugins().plugin_names());
    }
}

fn log_statistics(stats: &EventStats) {
    info!("📊 Event Statistics:");
    info!("  - Events dispatched: {}", stats.events_dispatched);
    info!("  - Observers registered: {}", stats.total_observers);
    info!("  - Observer invocations: {}", stats.observers_invoked);
    info!("  - Observer failures: {}", stats.observer_failures);
    info!("  - Pending events recorded: {}", stats.pending_recorded);
}
