//! Per-user settings stored in `<home>/config.json`.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shunt::TeardownConfig;
use shunt::resolver::{DEFAULT_HOSTS_FILE, DEFAULT_RESOLVER_DIR};
use tracing::debug;

use crate::error::{CliError, Result};
use crate::output::EffectiveConfig;

/// Directory name of the shunt home under the user's home directory.
pub const HOME_DIR_NAME: &str = ".shunt";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShuntConfig {
	/// Seconds to wait for a scaled-down origin to become ready again.
	pub recover_wait_time: u64,
	pub hosts_file: PathBuf,
	pub resolver_dir: PathBuf,
}

impl Default for ShuntConfig {
	fn default() -> Self {
		Self {
			recover_wait_time: shunt::DEFAULT_RECOVER_WAIT_TIME.as_secs(),
			hosts_file: PathBuf::from(DEFAULT_HOSTS_FILE),
			resolver_dir: PathBuf::from(DEFAULT_RESOLVER_DIR),
		}
	}
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
	pub recover_wait_time: Option<u64>,
	pub hosts_file: Option<PathBuf>,
	pub resolver_dir: Option<PathBuf>,
}

impl ShuntConfig {
	/// Loads `<home>/config.json`, falling back to defaults when it is absent.
	pub fn load(home: &Path) -> Result<Self> {
		let path = home.join(CONFIG_FILE);
		let content = match std::fs::read_to_string(&path) {
			Ok(content) => content,
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				debug!(target = "shunt.config", path = %path.display(), "no config file; using defaults");
				return Ok(Self::default());
			}
			Err(source) => return Err(CliError::Read { path, source }),
		};
		serde_json::from_str(&content).map_err(|source| CliError::Config { path, source })
	}

	pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
		if let Some(wait) = overrides.recover_wait_time {
			self.recover_wait_time = wait;
		}
		if let Some(hosts) = overrides.hosts_file {
			self.hosts_file = hosts;
		}
		if let Some(dir) = overrides.resolver_dir {
			self.resolver_dir = dir;
		}
		self
	}

	pub fn teardown_config(&self, home: &Path) -> TeardownConfig {
		TeardownConfig::new(home).with_recover_wait_time(Duration::from_secs(self.recover_wait_time))
	}

	pub fn effective(&self, home: &Path) -> EffectiveConfig {
		EffectiveConfig {
			home: home.to_path_buf(),
			recover_wait_time: self.recover_wait_time,
			hosts_file: self.hosts_file.clone(),
			resolver_dir: self.resolver_dir.clone(),
		}
	}
}

/// `--home` when given, otherwise `~/.shunt`.
pub fn resolve_home(flag: Option<PathBuf>) -> Result<PathBuf> {
	match flag {
		Some(home) => Ok(home),
		None => dirs::home_dir().map(|dir| dir.join(HOME_DIR_NAME)).ok_or(CliError::NoHome),
	}
}
