//! Session runtime record written when a redirection starts.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Kind of redirection a session performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
	/// Tunnel from the local machine into the cluster.
	Connect,
	/// Swap a cluster target for a local process.
	Exchange,
	/// Split one service's traffic by version through a shared router.
	Mesh,
}

impl Component {
	pub fn as_str(self) -> &'static str {
		match self {
			Component::Connect => "connect",
			Component::Exchange => "exchange",
			Component::Mesh => "mesh",
		}
	}
}

impl fmt::Display for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Strategy used to take over an exchange target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeMode {
	/// Origin deployment was scaled down while the shadow took its traffic.
	Scale,
	/// Origin service selector was pointed at the shadow.
	Selector,
	/// An exchange container was attached ephemerally to the target pods.
	Ephemeral,
}

/// How a mesh session routes its version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshMode {
	/// A shared router pod fronts the origin service.
	Auto,
	/// Routing labels only; no router is installed.
	Manual,
}

/// How a connect session overrides local name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DnsMode {
	/// Cluster names were written into the hosts file.
	Hosts,
	/// A local resolver was configured, backed by hosts records.
	LocalDns,
	/// Resolution is delegated to a pod; nothing local to undo.
	PodDns,
}

impl DnsMode {
	/// Whether this mode injected local records that teardown must drop.
	pub fn injects_local_records(self) -> bool {
		matches!(self, DnsMode::Hosts | DnsMode::LocalDns)
	}
}

/// Ordered set of shadow workload names.
///
/// Persisted as the comma-joined identity; when the shadow is shared the
/// joined identity is the name of the single shared workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ShadowNames(Vec<String>);

impl ShadowNames {
	pub fn parse(joined: &str) -> Self {
		let mut names: Vec<String> = Vec::new();
		for name in joined.split(',').map(str::trim).filter(|name| !name.is_empty()) {
			if !names.iter().any(|existing| existing == name) {
				names.push(name.to_string());
			}
		}
		Self(names)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Comma-joined identity used for shared reference counting.
	pub fn identity(&self) -> String {
		self.0.join(",")
	}
}

impl From<String> for ShadowNames {
	fn from(joined: String) -> Self {
		Self::parse(&joined)
	}
}

impl From<ShadowNames> for String {
	fn from(names: ShadowNames) -> Self {
		names.identity()
	}
}

impl<S: AsRef<str>> FromIterator<S> for ShadowNames {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		let joined: Vec<String> = iter.into_iter().map(|name| name.as_ref().to_string()).collect();
		Self::parse(&joined.join(","))
	}
}

/// Everything teardown needs to know about what the session created.
///
/// Written once when the session starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRuntimeState {
	pub component: Component,
	pub namespace: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exchange_mode: Option<ExchangeMode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mesh_mode: Option<MeshMode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dns_mode: Option<DnsMode>,
	#[serde(default)]
	pub shared_shadow: bool,
	#[serde(default)]
	pub use_deployment_shadow: bool,
	#[serde(default)]
	pub shadow: ShadowNames,
	/// Target that was mutated; absent when the mutation never completed.
	#[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
	pub origin: Option<String>,
	#[serde(default)]
	pub origin_replicas: i32,
	/// Dedicated service owned by this session alone.
	#[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
	pub service: Option<String>,
	#[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
	pub router: Option<String>,
	#[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
	pub mesh_version: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pid: Option<u32>,
}

impl SessionRuntimeState {
	/// Creates a record with no mutations, as written at session start.
	pub fn new(component: Component, namespace: impl Into<String>) -> Self {
		Self {
			component,
			namespace: namespace.into(),
			exchange_mode: None,
			mesh_mode: None,
			dns_mode: None,
			shared_shadow: false,
			use_deployment_shadow: false,
			shadow: ShadowNames::default(),
			origin: None,
			origin_replicas: 0,
			service: None,
			router: None,
			mesh_version: None,
			pid: None,
		}
	}

	/// Whether the exchange attached containers ephemerally instead of replacing pods.
	pub fn is_ephemeral(&self) -> bool {
		self.component == Component::Exchange && self.exchange_mode == Some(ExchangeMode::Ephemeral)
	}

	pub fn from_json(content: &str) -> serde_json::Result<Self> {
		serde_json::from_str(content)
	}

	pub fn to_json_pretty(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<String>::deserialize(deserializer)?;
	Ok(value.filter(|s| !s.trim().is_empty()))
}
