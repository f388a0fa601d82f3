//! Agent configuration
//!
//! Settings are layered: built-in defaults, then an optional config file,
//! then `AGENT_*` environment variables, then command-line flags.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Command-line flags
#[derive(Debug, Default, Parser)]
#[command(name = "telemetry-agent", version, about = "Node telemetry agent")]
pub struct Cli {
    /// Path to a config file (TOML, YAML or JSON)
    #[arg(long, env = "AGENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Relay address, `host:port` or a full URL
    #[arg(long)]
    pub relay_address: Option<String>,

    /// Collection interval in seconds
    #[arg(long, value_name = "SECONDS")]
    pub main_loop_duration: Option<u64>,

    /// How long snapshots are kept while the relay is unreachable, in minutes
    #[arg(long, value_name = "MINUTES")]
    pub buffer_retention: Option<u64>,

    /// Number of processes in the top memory list
    #[arg(long)]
    pub top_n: Option<u64>,

    /// Container runtime socket; probed from well-known paths when unset
    #[arg(long)]
    pub runtime_endpoint: Option<String>,

    /// Port for the health and metrics server
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Node name used in logs
    #[arg(long)]
    pub node_name: Option<String>,

    /// Log level or filter directive; `RUST_LOG` takes precedence
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also write JSON logs to this file, rotated on the configured schedule
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// When the log file rolls over
    #[arg(long, value_parser = ["minutely", "hourly", "daily", "never"])]
    pub log_rotation: Option<String>,

    /// Rotated log files kept on disk
    #[arg(long)]
    pub log_max_files: Option<u64>,
}

/// When the log file is rolled over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    #[serde(default = "default_log_max_files")]
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            rotation: LogRotation::default(),
            max_files: default_log_max_files(),
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Node name from the Kubernetes downward API
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Relay address; required
    #[serde(default)]
    pub relay_address: Option<String>,

    /// Collection interval in seconds
    #[serde(default = "default_main_loop_duration")]
    pub main_loop_duration: u64,

    /// Backlog retention window in minutes
    #[serde(default = "default_buffer_retention")]
    pub buffer_retention: u64,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub runtime_endpoint: Option<String>,

    /// Per-source deadline in seconds, defaults to the collection interval
    #[serde(default)]
    pub source_timeout: Option<u64>,

    /// List sandboxes in every state instead of only ready ones
    #[serde(default)]
    pub all_sandboxes: bool,

    #[serde(default)]
    pub log: LogConfig,
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_main_loop_duration() -> u64 {
    5
}

fn default_buffer_retention() -> u64 {
    10
}

fn default_top_n() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_max_files() -> usize {
    5
}

/// `AGENT_*` variables; nested keys use a double underscore, as in `AGENT_LOG__LEVEL`
fn environment() -> config::Environment {
    config::Environment::with_prefix("AGENT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl AgentConfig {
    /// Load configuration from the file, the environment and the flags
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with_env(cli, environment())
    }

    pub fn load_with_env(cli: &Cli, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        let config = builder
            .add_source(env)
            .set_override_option("relay_address", cli.relay_address.clone())?
            .set_override_option("main_loop_duration", cli.main_loop_duration)?
            .set_override_option("buffer_retention", cli.buffer_retention)?
            .set_override_option("top_n", cli.top_n)?
            .set_override_option("runtime_endpoint", cli.runtime_endpoint.clone())?
            .set_override_option("api_port", cli.api_port.map(u64::from))?
            .set_override_option("node_name", cli.node_name.clone())?
            .set_override_option("log.level", cli.log_level.clone())?
            .set_override_option(
                "log.file",
                cli.log_file.as_ref().map(|p| p.display().to_string()),
            )?
            .set_override_option("log.rotation", cli.log_rotation.clone())?
            .set_override_option("log.max_files", cli.log_max_files)?
            .build()
            .context("Failed to read configuration")?;

        let config: AgentConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        match self.relay_address.as_deref().map(str::trim) {
            None | Some("") => {
                bail!("A relay address is required (--relay-address or AGENT_RELAY_ADDRESS)")
            }
            Some(_) => {}
        }
        if self.main_loop_duration == 0 {
            bail!("main_loop_duration must be at least one second");
        }
        EnvFilter::try_new(&self.log.level)
            .with_context(|| format!("Invalid log level {:?}", self.log.level))?;
        if self.log.file.is_some() && self.log.max_files == 0 {
            bail!("log max_files must be at least 1 when a log file is set");
        }
        Ok(())
    }

    /// Relay address; present once the config has been validated
    pub fn relay_address(&self) -> &str {
        self.relay_address.as_deref().unwrap_or_default()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.main_loop_duration)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.buffer_retention * 60)
    }

    pub fn source_timeout(&self) -> Duration {
        self.source_timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_defaults_with_relay_from_env() {
        let config =
            AgentConfig::load_with_env(&Cli::default(), env(&[("AGENT_RELAY_ADDRESS", "relay:9090")]))
                .unwrap();

        assert_eq!(config.relay_address(), "relay:9090");
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert_eq!(config.retention(), Duration::from_secs(600));
        assert_eq!(config.source_timeout(), config.interval());
        assert_eq!(config.top_n, 10);
        assert_eq!(config.api_port, 8080);
        assert!(!config.all_sandboxes);
        assert_eq!(config.log.level, "info");
        assert!(config.log.file.is_none());
        assert_eq!(config.log.rotation, LogRotation::Daily);
        assert_eq!(config.log.max_files, 5);
    }

    #[test]
    fn test_log_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(
            &path,
            "relay_address = \"relay:1\"\n[log]\nlevel = \"warn\"\nmax_files = 9\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "telemetry-agent",
            "--config",
            path.to_str().unwrap(),
            "--log-level",
            "debug",
            "--log-file",
            "/var/log/telemetry-agent/agent.log",
            "--log-rotation",
            "hourly",
        ])
        .unwrap();
        let config = AgentConfig::load_with_env(&cli, env(&[])).unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(
            config.log.file.as_deref(),
            Some(std::path::Path::new("/var/log/telemetry-agent/agent.log"))
        );
        assert_eq!(config.log.rotation, LogRotation::Hourly);
        assert_eq!(config.log.max_files, 9);
    }

    #[test]
    fn test_nested_log_settings_from_environment() {
        let config = AgentConfig::load_with_env(
            &Cli::default(),
            env(&[
                ("AGENT_RELAY_ADDRESS", "relay:1"),
                ("AGENT_LOG__LEVEL", "agent_lib=debug,info"),
                ("AGENT_LOG__ROTATION", "never"),
            ]),
        )
        .unwrap();

        assert_eq!(config.relay_address(), "relay:1");
        assert_eq!(config.log.level, "agent_lib=debug,info");
        assert_eq!(config.log.rotation, LogRotation::Never);
    }

    #[test]
    fn test_unknown_log_rotation_flag_rejected() {
        tokio_test::assert_err!(Cli::try_parse_from([
            "telemetry-agent",
            "--log-rotation",
            "weekly",
        ]));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let cli = Cli {
            relay_address: Some("relay:1".to_string()),
            log_level: Some("agent_lib=verbose".to_string()),
            ..Default::default()
        };
        let err = AgentConfig::load_with_env(&cli, env(&[])).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_zero_log_files_rejected_with_log_file() {
        let cli = Cli {
            relay_address: Some("relay:1".to_string()),
            log_file: Some(PathBuf::from("/tmp/agent.log")),
            log_max_files: Some(0),
            ..Default::default()
        };
        let err = AgentConfig::load_with_env(&cli, env(&[])).unwrap_err();
        assert!(err.to_string().contains("max_files"));
    }

    #[test]
    fn test_missing_relay_address_is_fatal() {
        let err = AgentConfig::load_with_env(&Cli::default(), env(&[])).unwrap_err();
        assert!(err.to_string().contains("relay address is required"));
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::try_parse_from([
            "telemetry-agent",
            "--relay-address",
            "flag-relay:1",
            "--main-loop-duration",
            "15",
            "--buffer-retention",
            "2",
            "--top-n",
            "3",
        ])
        .unwrap();
        let config = AgentConfig::load_with_env(
            &cli,
            env(&[
                ("AGENT_RELAY_ADDRESS", "env-relay:1"),
                ("AGENT_MAIN_LOOP_DURATION", "30"),
                ("AGENT_API_PORT", "9100"),
            ]),
        )
        .unwrap();

        assert_eq!(config.relay_address(), "flag-relay:1");
        assert_eq!(config.interval(), Duration::from_secs(15));
        assert_eq!(config.retention(), Duration::from_secs(120));
        assert_eq!(config.top_n, 3);
        assert_eq!(config.api_port, 9100);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cli = Cli {
            relay_address: Some("relay:1".to_string()),
            main_loop_duration: Some(0),
            ..Default::default()
        };
        tokio_test::assert_err!(AgentConfig::load_with_env(&cli, env(&[])));
    }

    #[test]
    fn test_config_file_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(
            &path,
            "relay_address = \"file-relay:7000\"\nsource_timeout = 2\nall_sandboxes = true\n",
        )
        .unwrap();

        let cli = Cli {
            config: Some(path),
            ..Default::default()
        };
        let config = AgentConfig::load_with_env(&cli, env(&[])).unwrap();

        assert_eq!(config.relay_address(), "file-relay:7000");
        assert_eq!(config.source_timeout(), Duration::from_secs(2));
        assert!(config.all_sandboxes);
    }
}
