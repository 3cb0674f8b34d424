//! Naming rules for objects and commands that setup and teardown must agree on.

/// Suffix of the mirror service created beside a selector-exchanged origin.
pub const MIRROR_SERVICE_SUFFIX: &str = "-stuntman";
/// Container attached ephemerally to target pods by an ephemeral exchange.
pub const EXCHANGE_CONTAINER: &str = "shunt-exchange";
/// Container running the router binary inside a router pod.
pub const ROUTER_CONTAINER: &str = "standalone";
/// Router binary path inside [`ROUTER_CONTAINER`].
pub const ROUTER_BIN: &str = "/usr/sbin/router";

/// Name of the mirror service paired with `origin`.
pub fn mirror_service_name(origin: &str) -> String {
	format!("{origin}{MIRROR_SERVICE_SUFFIX}")
}

/// Router command removing the route for a mesh version.
pub fn router_remove_command(version: &str) -> Vec<String> {
	vec![ROUTER_BIN.to_string(), "remove".to_string(), version.to_string()]
}
