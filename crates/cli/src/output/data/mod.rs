use serde::Serialize;
use shunt::TeardownReport;
use shunt_protocol::{Component, DnsMode, ExchangeMode, MeshMode};
use shunt_runtime::CallRecord;

/// What a recorded session created, as reported back to the user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
	pub component: Component,
	pub namespace: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub exchange_mode: Option<ExchangeMode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mesh_mode: Option<MeshMode>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dns_mode: Option<DnsMode>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub shadows: Vec<String>,
	pub shared_shadow: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub origin: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub router: Option<String>,
}

/// Result data for the clean command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanData {
	pub session: SessionSummary,
	pub report: TeardownReport,
	/// Every control-plane call teardown made, in order.
	pub calls: Vec<CallRecord>,
	pub wrote_back: bool,
}

/// Result data for the status command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
	pub session: SessionSummary,
	/// Absent when the session did not record its process.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pid: Option<u32>,
	pub alive: bool,
	pub pid_file_present: bool,
}
