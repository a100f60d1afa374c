//! Server configuration file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name looked up in the working directory and the user config directory.
pub const CONFIG_FILE_NAME: &str = "gbs.toml";

/// Errors loading a [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The file could not be read.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path of the file.
		path: PathBuf,
		/// Underlying error.
		error: std::io::Error,
	},
	/// The file is not valid TOML for this schema.
	#[error("invalid config {path}: {error}")]
	Parse {
		/// Path of the file.
		path: PathBuf,
		/// Underlying error.
		error: toml::de::Error,
	},
}

/// External command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
	/// Executable.
	pub program: String,
	/// Leading arguments.
	#[serde(default)]
	pub args: Vec<String>,
	/// Extra environment.
	#[serde(default)]
	pub env: BTreeMap<String, String>,
}

impl CommandConfig {
	fn bridge(subcommand: &str) -> Self {
		Self {
			program: "gbs-bridge".to_owned(),
			args: vec![subcommand.to_owned()],
			env: BTreeMap::new(),
		}
	}
}

/// `[log]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
	/// `tracing` filter directive used when no environment override is set.
	pub filter: Option<String>,
}

/// Contents of `gbs.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
	/// Command printing the workspace's source sets as JSON.
	pub provider: CommandConfig,
	/// Command running tasks and streaming progress events as JSON lines.
	pub runner: CommandConfig,
	/// Logging.
	pub log: LogConfig,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			provider: CommandConfig::bridge("source-sets"),
			runner: CommandConfig::bridge("run"),
			log: LogConfig::default(),
		}
	}
}

impl ServerConfig {
	/// Reads and parses a config file.
	///
	/// # Errors
	///
	/// [`ConfigError::Io`] when the file cannot be read, [`ConfigError::Parse`] when it does
	/// not match the schema.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		toml::from_str(&text).map_err(|error| ConfigError::Parse {
			path: path.to_path_buf(),
			error,
		})
	}

	/// Loads the first config that exists among `candidates`, or the defaults.
	///
	/// # Errors
	///
	/// Errors of [`ServerConfig::load`] for the first existing candidate.
	pub fn discover(candidates: &[PathBuf]) -> Result<(Self, Option<PathBuf>), ConfigError> {
		match candidates.iter().find(|path| path.is_file()) {
			Some(path) => Ok((Self::load(path)?, Some(path.clone()))),
			None => Ok((Self::default(), None)),
		}
	}
}
