//! Configuration for the `redwire` command-line client.
//!
//! Settings are resolved in layers: an explicit `--config` file, or
//! `conf/redwire.toml` when present, then individual command-line flags.
//!
//! # Example
//!
//! ```no_run
//! use redwire::config::{Cli, Parser, setup};
//!
//! let args = Cli::parse();
//! let config = setup(&args)?;
//! println!("Connecting to {}:{}", config.host, config.port);
//! # Ok::<(), redwire::config::ConfigError>(())
//! ```

use std::path::Path;
use std::time::Duration;

pub use clap::Parser;
use client::ClientOptions;
use client::ConnectionIdentifier;
use client::DEFAULT_HOST;
use client::DEFAULT_PORT;
use resp::DEFAULT_MAX_BULK_LEN;
use resp::DEFAULT_MAX_DEPTH;
use resp::DEFAULT_MAX_LINE_LEN;
use resp::DecodeLimits;
use serde::Deserialize;
use serde::Serialize;
use telemetry::TelemetryError;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "conf/redwire.toml";

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("Failed to read configuration file '{path}': {source}")]
	Io {
		source: std::io::Error,
		path: String,
	},

	#[error("Failed to parse TOML configuration: {0}")]
	TomlParse(#[from] toml::de::Error),

	#[error("Failed to parse JSON configuration: {0}")]
	JsonParse(#[from] serde_json::Error),

	#[error("Failed to parse YAML configuration: {0}")]
	YamlParse(#[from] serde_yaml::Error),

	#[error("Unsupported configuration format: {0}")]
	UnsupportedFormat(String),

	#[error("Configuration file has no extension")]
	NoExtension,

	#[error("Invalid value for '{field}': {reason}")]
	InvalidValue { field: &'static str, reason: String },

	#[error(transparent)]
	Telemetry(#[from] TelemetryError),
}

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None, disable_help_flag = true)]
pub struct Cli {
	/// Server hostname
	#[arg(short = 'h', long)]
	pub host: Option<String>,

	/// Server port
	#[arg(short, long)]
	pub port: Option<u16>,

	/// Password sent with AUTH after connecting
	#[arg(short = 'a', long)]
	pub password: Option<String>,

	/// Configuration file path (TOML, JSON, or YAML).
	/// Defaults to conf/redwire.toml if it exists.
	#[arg(short, long)]
	pub config: Option<String>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long)]
	pub log_level: Option<String>,

	/// Seconds to wait for each read of a reply
	#[arg(long = "timeout")]
	pub timeout_secs: Option<u64>,

	/// Seconds to wait for the connection to be established
	#[arg(long = "connect-timeout")]
	pub connect_timeout_secs: Option<u64>,

	/// Send commands in the inline form instead of multi-bulk
	#[arg(long)]
	pub inline: bool,

	/// Print help
	#[arg(long, action = clap::ArgAction::Help)]
	pub help: Option<bool>,

	/// Command to run once; starts an interactive shell when omitted
	#[arg(
		value_name = "COMMAND",
		trailing_var_arg = true,
		allow_hyphen_values = true
	)]
	pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
	pub host: String,
	pub port: u16,
	pub password: Option<String>,
	pub timeout_secs: u64,
	pub connect_timeout_secs: u64,
	pub log_level: String,
	pub inline: bool,
	pub max_depth: usize,
	pub max_bulk_len: usize,
	pub max_line_len: usize,
}

impl Default for CliConfig {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST.into(),
			port: DEFAULT_PORT,
			password: None,
			timeout_secs: 5,
			connect_timeout_secs: 5,
			log_level: "warn".into(),
			inline: false,
			max_depth: DEFAULT_MAX_DEPTH,
			max_bulk_len: DEFAULT_MAX_BULK_LEN,
			max_line_len: DEFAULT_MAX_LINE_LEN,
		}
	}
}

impl CliConfig {
	pub fn identifier(&self) -> ConnectionIdentifier {
		let id = ConnectionIdentifier::new(self.host.clone(), self.port);
		match &self.password {
			Some(password) => id.with_password(password.clone()),
			None => id,
		}
	}

	pub fn client_options(&self) -> ClientOptions {
		ClientOptions {
			read_timeout: Duration::from_secs(self.timeout_secs),
			connect_timeout: Duration::from_secs(self.connect_timeout_secs),
			limits: DecodeLimits {
				max_depth: self.max_depth,
				max_bulk_len: self.max_bulk_len,
				max_line_len: self.max_line_len,
			},
		}
	}

	fn validate(&mut self) -> Result<(), ConfigError> {
		self.log_level = telemetry::validate_level(&self.log_level)?;

		let positive = [
			("timeout_secs", self.timeout_secs as usize),
			("connect_timeout_secs", self.connect_timeout_secs as usize),
			("max_depth", self.max_depth),
			("max_bulk_len", self.max_bulk_len),
			("max_line_len", self.max_line_len),
		];
		for (field, value) in positive {
			if value == 0 {
				return Err(ConfigError::InvalidValue {
					field,
					reason: "must be greater than zero".into(),
				});
			}
		}
		if self.host.trim().is_empty() {
			return Err(ConfigError::InvalidValue {
				field: "host",
				reason: "must not be empty".into(),
			});
		}
		Ok(())
	}
}

/// Build the effective configuration without touching global state.
pub fn resolve(args: &Cli) -> Result<CliConfig, ConfigError> {
	let mut config = match args.config.as_deref() {
		Some(p) => load_from_file(p)?,
		None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from_file(DEFAULT_CONFIG_PATH)?,
		None => CliConfig::default(),
	};

	// Override with CLI arguments if explicitly provided
	if let Some(host) = &args.host {
		config.host = host.clone();
	}
	if let Some(port) = args.port {
		config.port = port;
	}
	if let Some(password) = &args.password {
		config.password = Some(password.clone());
	}
	if let Some(log_level) = &args.log_level {
		config.log_level = log_level.clone();
	}
	if let Some(t) = args.timeout_secs {
		config.timeout_secs = t;
	}
	if let Some(t) = args.connect_timeout_secs {
		config.connect_timeout_secs = t;
	}
	if args.inline {
		config.inline = true;
	}

	config.validate()?;
	Ok(config)
}

/// Resolve the configuration and install the logger.
pub fn setup(args: &Cli) -> Result<CliConfig, ConfigError> {
	let config = resolve(args)?;
	telemetry::init(&config.log_level)?;
	Ok(config)
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<CliConfig, ConfigError> {
	let path_ref = path.as_ref();
	let content = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
		path: path_ref.display().to_string(),
		source,
	})?;

	let extension = path_ref
		.extension()
		.and_then(|ext| ext.to_str())
		.ok_or(ConfigError::NoExtension)?;

	match extension.to_lowercase().as_str() {
		"toml" => Ok(toml::from_str(&content)?),
		"json" => Ok(serde_json::from_str(&content)?),
		"yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
		_ => Err(ConfigError::UnsupportedFormat(extension.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn write_config(name: &str, content: &str) -> (tempfile::TempDir, String) {
		let dir = tempfile::tempdir().unwrap();
		let file_path = dir.path().join(name);
		std::fs::write(&file_path, content).unwrap();
		let path = file_path.display().to_string();
		(dir, path)
	}

	#[test]
	fn test_parse_toml() {
		let (_dir, path) = write_config(
			"redwire.toml",
			r#"
host = "10.0.0.5"
port = 7000
password = "s3cret"
timeout_secs = 2
log_level = "debug"
inline = true
"#,
		);

		let config = load_from_file(&path).unwrap();
		assert_eq!(config.host, "10.0.0.5");
		assert_eq!(config.port, 7000);
		assert_eq!(config.password.as_deref(), Some("s3cret"));
		assert_eq!(config.timeout_secs, 2);
		assert_eq!(config.log_level, "debug");
		assert!(config.inline);
		// Unset fields fall back to defaults
		assert_eq!(config.connect_timeout_secs, 5);
		assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
	}

	#[test]
	fn test_parse_json() {
		let (_dir, path) = write_config(
			"redwire.json",
			r#"
{
  "host": "127.0.0.1",
  "port": 1234,
  "max_bulk_len": 1024
}
"#,
		);

		let config = load_from_file(&path).unwrap();
		assert_eq!(config.port, 1234);
		assert_eq!(config.max_bulk_len, 1024);
		assert_eq!(config.password, None);
	}

	#[rstest]
	#[case("redwire.yaml")]
	#[case("redwire.yml")]
	fn test_parse_yaml(#[case] name: &str) {
		let (_dir, path) = write_config(
			name,
			r#"
host: "cache.internal"
port: 6380
log_level: "info"
"#,
		);

		let config = load_from_file(&path).unwrap();
		assert_eq!(config.host, "cache.internal");
		assert_eq!(config.port, 6380);
		assert_eq!(config.log_level, "info");
	}

	#[test]
	fn test_unsupported_extension() {
		let (_dir, path) = write_config("redwire.ini", "host = x");
		assert!(matches!(
			load_from_file(&path),
			Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"
		));
	}

	#[test]
	fn test_missing_extension() {
		let (_dir, path) = write_config("redwire", "host = \"x\"");
		assert!(matches!(load_from_file(&path), Err(ConfigError::NoExtension)));
	}

	#[test]
	fn test_missing_file() {
		assert!(matches!(
			load_from_file("/nonexistent/redwire.toml"),
			Err(ConfigError::Io { .. })
		));
	}

	#[test]
	fn test_cli_overrides_file() {
		let (_dir, path) = write_config(
			"redwire.toml",
			r#"
host = "from-file"
port = 7000
log_level = "info"
"#,
		);

		let args = Cli {
			config: Some(path),
			port: Some(7001),
			password: Some("pw".into()),
			log_level: Some("DEBUG".into()),
			timeout_secs: Some(9),
			inline: true,
			..Cli::default()
		};
		let config = resolve(&args).unwrap();

		assert_eq!(config.host, "from-file");
		assert_eq!(config.port, 7001);
		assert_eq!(config.password.as_deref(), Some("pw"));
		assert_eq!(config.log_level, "debug");
		assert_eq!(config.timeout_secs, 9);
		assert!(config.inline);
	}

	#[test]
	fn test_invalid_log_level_rejected() {
		let (_dir, path) = write_config("redwire.toml", "log_level = \"chatty\"");
		let args = Cli {
			config: Some(path),
			..Cli::default()
		};
		assert!(matches!(
			resolve(&args),
			Err(ConfigError::Telemetry(TelemetryError::InvalidLogLevel(_)))
		));
	}

	#[rstest]
	#[case("timeout_secs = 0", "timeout_secs")]
	#[case("connect_timeout_secs = 0", "connect_timeout_secs")]
	#[case("max_depth = 0", "max_depth")]
	#[case("max_line_len = 0", "max_line_len")]
	#[case("host = \"  \"", "host")]
	fn test_invalid_values_rejected(#[case] content: &str, #[case] expected_field: &str) {
		let (_dir, path) = write_config("redwire.toml", content);
		let args = Cli {
			config: Some(path),
			..Cli::default()
		};
		match resolve(&args) {
			Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected_field),
			other => panic!("Expected InvalidValue, got {:?}", other),
		}
	}

	#[test]
	fn test_options_and_identifier() {
		let config = CliConfig {
			host: "db".into(),
			port: 6390,
			password: Some("pw".into()),
			timeout_secs: 3,
			connect_timeout_secs: 1,
			max_depth: 8,
			max_bulk_len: 4096,
			max_line_len: 256,
			..CliConfig::default()
		};

		let id = config.identifier();
		assert_eq!(id.host(), "db");
		assert_eq!(id.port(), 6390);
		assert_eq!(id.password(), Some("pw"));

		let options = config.client_options();
		assert_eq!(options.read_timeout, Duration::from_secs(3));
		assert_eq!(options.connect_timeout, Duration::from_secs(1));
		assert_eq!(options.limits.max_depth, 8);
		assert_eq!(options.limits.max_bulk_len, 4096);
		assert_eq!(options.limits.max_line_len, 256);
	}

	#[test]
	fn test_parse_command_line() {
		let args = Cli::try_parse_from([
			"redwire", "-h", "db.local", "-p", "6380", "-a", "pw", "--timeout", "3", "SET",
			"key", "-1",
		])
		.unwrap();

		assert_eq!(args.host.as_deref(), Some("db.local"));
		assert_eq!(args.port, Some(6380));
		assert_eq!(args.password.as_deref(), Some("pw"));
		assert_eq!(args.timeout_secs, Some(3));
		assert_eq!(args.command, vec!["SET", "key", "-1"]);
	}
}
