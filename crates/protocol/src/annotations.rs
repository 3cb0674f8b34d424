//! Annotation keys and payload formats written onto cluster objects.

use std::collections::BTreeMap;
use std::fmt;

/// Service annotation holding the JSON-encoded original selector.
pub const SELECTOR_BACKUP_KEY: &str = "shunt/selector";
/// Router pod annotation holding the router's own configuration.
pub const ROUTER_CONFIG_KEY: &str = "shunt/config";
/// Workload annotation counting the sessions that share it.
pub const REF_COUNT_KEY: &str = "shunt/ref-count";

/// Label selector mapping label key to value.
pub type Selector = BTreeMap<String, String>;

/// Encodes a selector for storage under [`SELECTOR_BACKUP_KEY`].
pub fn encode_selector(selector: &Selector) -> serde_json::Result<String> {
	serde_json::to_string(selector)
}

/// Decodes a selector previously stored under [`SELECTOR_BACKUP_KEY`].
pub fn decode_selector(raw: &str) -> serde_json::Result<Selector> {
	serde_json::from_str(raw)
}

/// Router configuration persisted as `key=value` pairs joined by commas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterConfig {
	entries: BTreeMap<String, String>,
}

impl RouterConfig {
	/// Key naming the origin service a router fronts.
	pub const SERVICE: &'static str = "service";

	/// Parses the annotation value. Malformed pairs are skipped.
	pub fn parse(raw: &str) -> Self {
		let entries = raw
			.split(',')
			.filter_map(|pair| {
				let (key, value) = pair.split_once('=')?;
				let key = key.trim();
				if key.is_empty() {
					return None;
				}
				Some((key.to_string(), value.trim().to_string()))
			})
			.collect();
		Self { entries }
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.entries.insert(key.into(), value.into());
		self
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.get(key).map(String::as_str).filter(|value| !value.is_empty())
	}

	/// Origin service this router was installed for.
	pub fn service(&self) -> Option<&str> {
		self.get(Self::SERVICE)
	}
}

impl fmt::Display for RouterConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (key, value) in &self.entries {
			if !first {
				f.write_str(",")?;
			}
			write!(f, "{key}={value}")?;
			first = false;
		}
		Ok(())
	}
}

/// Parsed value of a [`REF_COUNT_KEY`] annotation.
///
/// Signed so that a corrupted negative count is observable rather than
/// rejected at parse time.
pub fn parse_ref_count(raw: &str) -> Result<i64, std::num::ParseIntError> {
	raw.trim().parse()
}
