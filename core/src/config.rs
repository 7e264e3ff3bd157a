//! Service configuration

use crate::infra::rpc::DEFAULT_MAX_FRAME_BYTES;
use serde::{Deserialize, Serialize};
use std::{
	fs,
	path::{Path, PathBuf},
	time::Duration,
};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	Read {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("failed to parse config file {path}: {source}")]
	Parse {
		path: PathBuf,
		source: toml::de::Error,
	},
}

/// Top-level configuration, every field has a default
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
	/// First segment of every routing key
	pub prefix: String,
	pub database: DatabaseConfig,
	pub rpc: RpcConfig,
	pub search: SearchConfig,
	pub patch: PatchConfig,
	pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self {
			prefix: "quickapi".to_string(),
			database: DatabaseConfig::default(),
			rpc: RpcConfig::default(),
			search: SearchConfig::default(),
			patch: PatchConfig::default(),
			logging: LoggingConfig::default(),
		}
	}
}

impl ServiceConfig {
	/// Load configuration from a TOML file
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		info!("Loading config from {:?}", path);

		let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;

		Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(raw)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	pub url: String,
	pub max_connections: u32,
	pub connect_timeout_secs: u64,
	/// Let sqlx log every statement (we log through tracing instead)
	pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite::memory:".to_string(),
			max_connections: 10,
			connect_timeout_secs: 8,
			sqlx_logging: false,
		}
	}
}

impl DatabaseConfig {
	/// In-memory sqlite databases live and die with a single connection.
	pub fn is_in_memory(&self) -> bool {
		self.url.contains(":memory:") || self.url.contains("mode=memory")
	}

	pub fn connect_timeout(&self) -> Duration {
		Duration::from_secs(self.connect_timeout_secs)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
	pub socket_path: PathBuf,
	pub max_connections: usize,
	/// Longest accepted request line, in bytes
	pub max_frame_bytes: usize,
}

impl Default for RpcConfig {
	fn default() -> Self {
		Self {
			socket_path: std::env::temp_dir().join("quickstore.sock"),
			max_connections: 100,
			max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
	/// Upper bound on `take`, also applied when a search asks for no limit
	pub max_take: Option<u64>,
}

impl SearchConfig {
	/// Effective page size for a requested `take` (`0` = unbounded)
	pub fn page_size(&self, take: u64) -> Option<u64> {
		let requested = (take > 0).then_some(take);

		match (requested, self.max_take) {
			(Some(take), Some(max)) => Some(take.min(max)),
			(None, max) => max,
			(take, None) => take,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
	/// Apply the request's named filters to the patch update itself, not
	/// only to the read that returns the patched row.
	pub scoped_update: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// Filter directive used when `RUST_LOG` is not set
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}
