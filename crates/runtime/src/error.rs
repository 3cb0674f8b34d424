use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of cluster object a request addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
	Pod,
	Deployment,
	Service,
	ConfigMap,
	Namespace,
}

impl fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ResourceKind::Pod => "pod",
			ResourceKind::Deployment => "deployment",
			ResourceKind::Service => "service",
			ResourceKind::ConfigMap => "configmap",
			ResourceKind::Namespace => "namespace",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
	#[error("{kind} {namespace}/{name} not found")]
	NotFound { kind: ResourceKind, namespace: String, name: String },

	#[error("{kind} {namespace}/{name} already exists")]
	AlreadyExists { kind: ResourceKind, namespace: String, name: String },

	#[error("conflicting update to {kind} {namespace}/{name}: sent version {sent}, current version {current}")]
	Conflict {
		kind: ResourceKind,
		namespace: String,
		name: String,
		sent: u64,
		current: u64,
	},

	#[error("exec in pod {namespace}/{pod} failed: {message}")]
	Exec { namespace: String, pod: String, message: String },

	#[error("control plane request failed: {0}")]
	Transport(String),
}

impl ClusterError {
	pub fn not_found(kind: ResourceKind, namespace: &str, name: &str) -> Self {
		ClusterError::NotFound {
			kind,
			namespace: namespace.to_string(),
			name: name.to_string(),
		}
	}

	/// Target object is already absent.
	pub fn is_not_found(&self) -> bool {
		matches!(self, ClusterError::NotFound { .. })
	}

	/// Update lost an optimistic-concurrency race.
	pub fn is_conflict(&self) -> bool {
		matches!(self, ClusterError::Conflict { .. })
	}
}

pub type ClusterResult<T> = std::result::Result<T, ClusterError>;
