use std::path::PathBuf;

use thiserror::Error;

use crate::output::ErrorCode;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to read {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write {path}: {source}")]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid session state in {path}: {source}")]
	Session {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid cluster snapshot in {path}: {source}")]
	Snapshot {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid configuration in {path}: {source}")]
	Config {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("cannot determine home directory; pass --home")]
	NoHome,

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Read { .. } | CliError::Write { .. } => ErrorCode::IoError,
			CliError::Session { .. } => ErrorCode::SessionError,
			CliError::Snapshot { .. } => ErrorCode::SnapshotError,
			CliError::Config { .. } | CliError::NoHome => ErrorCode::ConfigError,
			CliError::Json(_) => ErrorCode::InternalError,
		}
	}
}

pub type Result<T> = std::result::Result<T, CliError>;
