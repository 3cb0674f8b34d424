use shunt_runtime::{ClusterError, ResourceKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShuntError {
	#[error(transparent)]
	Cluster(#[from] ClusterError),

	#[error("malformed {key} annotation on {kind} {namespace}/{name}: {source}")]
	Decode {
		key: &'static str,
		kind: ResourceKind,
		namespace: String,
		name: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("reference count on {kind} {namespace}/{name} is not a number: {value:?}")]
	RefCountFormat {
		kind: ResourceKind,
		namespace: String,
		name: String,
		value: String,
	},

	#[error("reference count on {kind} {namespace}/{name} kept conflicting after {attempts} attempts")]
	RefContention {
		kind: ResourceKind,
		namespace: String,
		name: String,
		attempts: usize,
	},

	#[error("name resolution cleanup failed: {0}")]
	Resolver(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl ShuntError {
	/// Whether the underlying cause is an already-absent cluster object.
	pub fn is_not_found(&self) -> bool {
		matches!(self, ShuntError::Cluster(err) if err.is_not_found())
	}
}

pub type Result<T> = std::result::Result<T, ShuntError>;
