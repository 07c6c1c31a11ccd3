use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::LayoutMetrics;
use crate::key_buffer::DEFAULT_SEQUENCE_TIMEOUT;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("read config file failed: {path}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("parse config failed")]
	Parse {
		#[source]
		source: toml::de::Error,
	},
	#[error("vim.sequence_timeout_ms must be greater than zero")]
	ZeroTimeout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotevimConfig {
	pub vim: VimConfig,
	pub log: LogConfig,
	pub layout: LayoutMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VimConfig {
	/// When false every key reaches the host untouched.
	pub enabled: bool,
	pub sequence_timeout_ms: u64,
}

impl VimConfig {
	pub fn sequence_timeout(&self) -> Duration {
		Duration::from_millis(self.sequence_timeout_ms)
	}
}

impl Default for VimConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			sequence_timeout_ms: DEFAULT_SEQUENCE_TIMEOUT.as_millis() as u64,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
	/// `EnvFilter` directive; `RUST_LOG` takes precedence.
	pub filter: String,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self { filter: "info".to_string() }
	}
}

impl NotevimConfig {
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source).map_err(|source| ConfigError::Parse { source })?;
		config.validate()?;
		Ok(config)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let source = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
		Self::from_toml_str(&source)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.vim.sequence_timeout_ms == 0 {
			return Err(ConfigError::ZeroTimeout);
		}
		Ok(())
	}
}
