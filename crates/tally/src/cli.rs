//! Command-line interface handling for the Tally host.
//!
//! Flags override the matching configuration file settings.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Whether to force test mode on
    pub test_mode: bool,
    /// Optional override for the translation catalog
    pub catalog: Option<PathBuf>,
}

impl CliArgs {
    /// Parses the process arguments. Exits with usage on invalid input.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            test_mode: matches.get_flag("test-mode"),
            catalog: matches.get_one::<String>("catalog").map(PathBuf::from),
        }
    }
}

const DEFAULT_CONFIG_PATH: &str = "tally.toml";

/// The clap command definition
pub fn command() -> Command {
    Command::new("Tally")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Analytics host with an ordered, plugin-aware event dispatcher")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-mode")
                .long("test-mode")
                .help("Enable test-only events (overrides config and TALLY_TEST_MODE)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .value_name("FILE")
                .help("Translation catalog (JSON) to load"),
        )
}
