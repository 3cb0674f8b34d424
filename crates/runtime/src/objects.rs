//! Cluster object shapes as seen through the control plane.
//!
//! Only the fields lifecycle code reads or writes are modelled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ResourceKind;

/// Metadata common to every namespaced object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
	pub name: String,
	pub namespace: String,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub labels: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub annotations: BTreeMap<String, String>,
	/// Version used for optimistic concurrency; bumped on every write.
	#[serde(default)]
	pub resource_version: u64,
}

impl ObjectMeta {
	pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			namespace: namespace.into(),
			..Default::default()
		}
	}

	pub fn annotation(&self, key: &str) -> Option<&str> {
		self.annotations.get(key).map(String::as_str)
	}

	/// Whether every pair in `selector` is present in this object's labels.
	pub fn matches_labels(&self, selector: &BTreeMap<String, String>) -> bool {
		selector.iter().all(|(key, value)| self.labels.get(key) == Some(value))
	}
}

/// Object addressable by kind, namespace and name.
pub trait Resource: Clone + Send + Sync + 'static {
	const KIND: ResourceKind;

	fn meta(&self) -> &ObjectMeta;
	fn meta_mut(&mut self) -> &mut ObjectMeta;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
	pub name: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
	#[serde(default)]
	pub containers: Vec<Container>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub ephemeral_containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
	pub metadata: ObjectMeta,
	#[serde(default)]
	pub spec: PodSpec,
}

impl Pod {
	pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
		Self {
			metadata: ObjectMeta::new(name, namespace),
			spec: PodSpec::default(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
	#[serde(default)]
	pub replicas: i32,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub selector: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
	#[serde(default)]
	pub ready_replicas: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
	pub metadata: ObjectMeta,
	#[serde(default)]
	pub spec: DeploymentSpec,
	#[serde(default)]
	pub status: DeploymentStatus,
}

impl Deployment {
	pub fn new(name: impl Into<String>, namespace: impl Into<String>, replicas: i32) -> Self {
		Self {
			metadata: ObjectMeta::new(name, namespace),
			spec: DeploymentSpec {
				replicas,
				selector: BTreeMap::new(),
			},
			status: DeploymentStatus { ready_replicas: replicas },
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	pub port: u16,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
	#[serde(default)]
	pub selector: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
	pub metadata: ObjectMeta,
	#[serde(default)]
	pub spec: ServiceSpec,
}

impl Service {
	pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
		Self {
			metadata: ObjectMeta::new(name, namespace),
			spec: ServiceSpec::default(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
	pub metadata: ObjectMeta,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub data: BTreeMap<String, String>,
}

impl ConfigMap {
	pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
		Self {
			metadata: ObjectMeta::new(name, namespace),
			data: BTreeMap::new(),
		}
	}
}

/// Captured output of a command executed inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
	pub stdout: String,
	pub stderr: String,
}

macro_rules! impl_resource {
	($ty:ty, $kind:expr) => {
		impl Resource for $ty {
			const KIND: ResourceKind = $kind;

			fn meta(&self) -> &ObjectMeta {
				&self.metadata
			}

			fn meta_mut(&mut self) -> &mut ObjectMeta {
				&mut self.metadata
			}
		}
	};
}

impl_resource!(Pod, ResourceKind::Pod);
impl_resource!(Deployment, ResourceKind::Deployment);
impl_resource!(Service, ResourceKind::Service);
impl_resource!(ConfigMap, ResourceKind::ConfigMap);
