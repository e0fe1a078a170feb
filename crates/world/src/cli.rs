//! Command-line interface handling for the world server.
//!
//! This module provides command-line argument parsing using the `clap` crate.
//! Every option except `--config` overrides the matching configuration file
//! setting.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// This structure holds all the command-line options that can be used to
/// override configuration file settings or provide runtime parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for bind address
    pub bind_address: Option<String>,
    /// Optional override for the navigation mesh file
    pub navmesh_path: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional override for the AI tick interval
    pub tick_interval_ms: Option<u64>,
}

impl CliArgs {
    /// Parses the process's command line.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list, e.g. in tests.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config.toml")),
            bind_address: matches.get_one::<String>("bind").cloned(),
            navmesh_path: matches.get_one::<String>("navmesh").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            tick_interval_ms: matches.get_one::<u64>("tick-ms").copied(),
        }
    }
}

fn command() -> Command {
    Command::new("World Server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Authoritative multiplayer world server with monster AI")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDRESS")
                .help("Bind address (e.g., 127.0.0.1:8080)"),
        )
        .arg(
            Arg::new("navmesh")
                .short('n')
                .long("navmesh")
                .value_name("FILE")
                .help("Navigation mesh JSON file"),
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
            Arg::new("tick-ms")
                .long("tick-ms")
                .value_name("MILLIS")
                .help("AI tick interval in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["world"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
        assert_eq!(args.bind_address, None);
        assert!(!args.json_logs);
        assert_eq!(args.tick_interval_ms, None);
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::try_parse_from([
            "world",
            "--config",
            "prod.toml",
            "--bind",
            "0.0.0.0:9000",
            "--navmesh",
            "maps/arena.json",
            "--log-level",
            "debug",
            "--json-logs",
            "--tick-ms",
            "33",
        ])
        .unwrap();

        assert_eq!(args.config_path, PathBuf::from("prod.toml"));
        assert_eq!(args.bind_address.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(args.navmesh_path, Some(PathBuf::from("maps/arena.json")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert_eq!(args.tick_interval_ms, Some(33));
    }

    #[test]
    fn test_bad_tick_value_is_rejected() {
        assert!(CliArgs::try_parse_from(["world", "--tick-ms", "fast"]).is_err());
    }
}
