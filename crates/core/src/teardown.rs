//! Best-effort teardown of everything a session left behind.
//!
//! [`Teardown::run`] walks [`Stage::ALL`] in order. Stages are independent: a
//! stage that fails is logged and recorded in the [`TeardownReport`], and the
//! next stage runs regardless. Teardown itself never fails.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use shunt_protocol::{Component, DnsMode, EXCHANGE_CONTAINER, SessionRuntimeState};
use shunt_runtime::ControlPlane;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::TeardownConfig;
use crate::recovery::{ExchangeRecovery, MeshRecovery, recover_exchanged_target, recover_mesh_route};
use crate::refcount::{RefRelease, SharedKind, SharedRefs};
use crate::resolver::{LocalResolver, NameResolver};
use crate::workspace::LocalWorkspace;

/// Teardown stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
	/// Pid marker and shadow key files.
	LocalFiles,
	/// Hosts block and resolver entries of connect sessions.
	NameResolution,
	/// Exchange or mesh recovery of the origin target.
	ModeRecovery,
	/// The session's own service.
	DedicatedService,
	/// Shadow workloads, their config maps and ephemeral exchange containers.
	SharedShadow,
}

impl Stage {
	pub const ALL: [Stage; 5] = [
		Stage::LocalFiles,
		Stage::NameResolution,
		Stage::ModeRecovery,
		Stage::DedicatedService,
		Stage::SharedShadow,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Stage::LocalFiles => "local-files",
			Stage::NameResolution => "name-resolution",
			Stage::ModeRecovery => "mode-recovery",
			Stage::DedicatedService => "dedicated-service",
			Stage::SharedShadow => "shared-shadow",
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StageStatus {
	Completed,
	/// Nothing in the session state applies to this stage.
	Skipped,
	/// Some steps failed; the rest went through.
	Degraded { failures: Vec<String> },
	/// The stage was abandoned.
	Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
	pub stage: Stage,
	#[serde(flatten)]
	pub status: StageStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail: Option<Value>,
}

impl StageReport {
	fn new(stage: Stage, status: StageStatus) -> Self {
		Self { stage, status, detail: None }
	}

	fn with_detail(mut self, detail: impl Serialize) -> Self {
		self.detail = serde_json::to_value(detail).ok();
		self
	}
}

/// Per-stage record of one teardown run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownReport {
	pub stages: Vec<StageReport>,
}

impl TeardownReport {
	pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
		self.stages.iter().find(|report| report.stage == stage)
	}

	pub fn status(&self, stage: Stage) -> Option<&StageStatus> {
		self.stage(stage).map(|report| &report.status)
	}

	/// True when no stage failed or degraded.
	pub fn is_clean(&self) -> bool {
		self.stages
			.iter()
			.all(|report| matches!(report.status, StageStatus::Completed | StageStatus::Skipped))
	}
}

/// Tears a recorded session down against a control plane.
pub struct Teardown {
	gateway: Arc<dyn ControlPlane>,
	resolver: Arc<dyn NameResolver>,
	workspace: LocalWorkspace,
	config: TeardownConfig,
	cancel: CancellationToken,
}

impl Teardown {
	/// Creates a teardown using the system hosts file and resolver directory.
	pub fn new(gateway: Arc<dyn ControlPlane>, config: TeardownConfig) -> Self {
		Self {
			gateway,
			resolver: Arc::new(LocalResolver::default()),
			workspace: LocalWorkspace::new(config.home.clone()),
			config,
			cancel: CancellationToken::new(),
		}
	}

	pub fn with_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
		self.resolver = resolver;
		self
	}

	/// Replaces the token that cuts the scale-recovery wait short.
	pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}

	pub fn cancellation_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	pub fn config(&self) -> &TeardownConfig {
		&self.config
	}

	/// Runs every stage against `state` and reports how each went.
	pub async fn run(&self, state: &SessionRuntimeState) -> TeardownReport {
		info!(
			target = "shunt.teardown",
			component = %state.component,
			namespace = %state.namespace,
			"cleaning up session"
		);

		let mut report = TeardownReport::default();
		for stage in Stage::ALL {
			let outcome = match stage {
				Stage::LocalFiles => self.clean_local_files(state),
				Stage::NameResolution => self.recover_name_resolution(state),
				Stage::ModeRecovery => self.recover_mode(state).await,
				Stage::DedicatedService => self.clean_service(state).await,
				Stage::SharedShadow => self.clean_shadow(state).await,
			};
			log_outcome(&outcome);
			report.stages.push(outcome);
		}
		report
	}

	fn clean_local_files(&self, state: &SessionRuntimeState) -> StageReport {
		let cleanup = self.workspace.clean(state);
		let status = if cleanup.failed.is_empty() {
			StageStatus::Completed
		} else {
			StageStatus::Degraded {
				failures: cleanup.failed.iter().map(|(path, err)| format!("{}: {err}", path.display())).collect(),
			}
		};
		StageReport::new(Stage::LocalFiles, status).with_detail(&cleanup)
	}

	fn recover_name_resolution(&self, state: &SessionRuntimeState) -> StageReport {
		let dns_mode = match state.dns_mode {
			Some(mode) if state.component == Component::Connect && mode.injects_local_records() => mode,
			_ => return StageReport::new(Stage::NameResolution, StageStatus::Skipped),
		};

		let mut failures = Vec::new();
		if let Err(err) = self.resolver.drop_hosts() {
			failures.push(format!("drop hosts: {err}"));
		}
		if dns_mode == DnsMode::LocalDns {
			if let Err(err) = self.resolver.restore_dns_server() {
				failures.push(format!("restore dns server: {err}"));
			}
		}

		StageReport::new(Stage::NameResolution, degraded_if(failures))
	}

	async fn recover_mode(&self, state: &SessionRuntimeState) -> StageReport {
		match state.component {
			Component::Connect => StageReport::new(Stage::ModeRecovery, StageStatus::Skipped),
			Component::Exchange => match recover_exchanged_target(Arc::clone(&self.gateway), state, &self.config, &self.cancel).await {
				ExchangeRecovery::NotExchanged => StageReport::new(Stage::ModeRecovery, StageStatus::Skipped),
				recovery => StageReport::new(Stage::ModeRecovery, degraded_if(recovery.failures())).with_detail(recovery),
			},
			Component::Mesh => match recover_mesh_route(self.gateway.as_ref(), state).await {
				Ok(MeshRecovery::NoRouter) => StageReport::new(Stage::ModeRecovery, StageStatus::Skipped),
				Ok(recovery) => StageReport::new(Stage::ModeRecovery, degraded_if(recovery.failures())).with_detail(recovery),
				Err(err) => failed(Stage::ModeRecovery, err),
			},
		}
	}

	async fn clean_service(&self, state: &SessionRuntimeState) -> StageReport {
		let Some(service) = state.service.as_deref() else {
			return StageReport::new(Stage::DedicatedService, StageStatus::Skipped);
		};

		info!(target = "shunt.teardown", %service, "cleaning service");
		match self.gateway.remove_service(service, &state.namespace).await {
			Ok(()) => StageReport::new(Stage::DedicatedService, StageStatus::Completed),
			Err(err) if err.is_not_found() => {
				debug!(target = "shunt.teardown", %service, "service already removed");
				StageReport::new(Stage::DedicatedService, StageStatus::Completed)
			}
			Err(err) => failed(Stage::DedicatedService, err),
		}
	}

	async fn clean_shadow(&self, state: &SessionRuntimeState) -> StageReport {
		if state.shadow.is_empty() {
			return StageReport::new(Stage::SharedShadow, StageStatus::Skipped);
		}

		let namespace = state.namespace.as_str();
		let kind = if state.use_deployment_shadow { SharedKind::Deployment } else { SharedKind::Pod };
		let mut failures = Vec::new();

		let release = if state.shared_shadow {
			let identity = state.shadow.identity();
			match SharedRefs::new(self.gateway.as_ref()).decrease(kind, &identity, namespace).await {
				Ok(release) => Some(release),
				Err(err) => {
					error!(target = "shunt.teardown", shadow = %identity, error = %err, "failed to decrease shadow reference count");
					failures.push(format!("release {identity}: {err}"));
					None
				}
			}
		} else {
			None
		};

		let delete = match release {
			Some(release) => release.is_last_holder(),
			None => !state.shared_shadow,
		};

		if delete {
			for shadow in state.shadow.iter() {
				info!(target = "shunt.teardown", %shadow, "cleaning shadow config map and workload");
				if let Err(err) = tolerate_absent(self.gateway.remove_config_map(shadow, namespace).await) {
					error!(target = "shunt.teardown", config_map = %shadow, error = %err, "failed to delete config map");
					failures.push(format!("config map {shadow}: {err}"));
				}
				let removed = match kind {
					SharedKind::Deployment => self.gateway.remove_deployment(shadow, namespace).await,
					SharedKind::Pod => self.gateway.remove_pod(shadow, namespace).await,
				};
				if let Err(err) = tolerate_absent(removed) {
					error!(target = "shunt.teardown", %shadow, error = %err, "failed to delete shadow workload");
					failures.push(format!("{} {shadow}: {err}", kind.resource_kind()));
				}
			}
		}

		if state.is_ephemeral() {
			for pod in state.shadow.iter() {
				info!(target = "shunt.teardown", %pod, "removing ephemeral exchange container");
				if let Err(err) = tolerate_absent(self.gateway.remove_ephemeral_container(EXCHANGE_CONTAINER, pod, namespace).await) {
					error!(target = "shunt.teardown", %pod, error = %err, "failed to remove ephemeral container");
					failures.push(format!("ephemeral container on {pod}: {err}"));
				}
			}
		}

		let detail = ShadowCleanup {
			release,
			deleted: delete,
		};
		StageReport::new(Stage::SharedShadow, degraded_if(failures)).with_detail(detail)
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShadowCleanup {
	#[serde(skip_serializing_if = "Option::is_none")]
	release: Option<RefRelease>,
	deleted: bool,
}

fn tolerate_absent(result: shunt_runtime::ClusterResult<()>) -> shunt_runtime::ClusterResult<()> {
	match result {
		Err(err) if err.is_not_found() => Ok(()),
		other => other,
	}
}

fn degraded_if(failures: Vec<String>) -> StageStatus {
	if failures.is_empty() {
		StageStatus::Completed
	} else {
		StageStatus::Degraded { failures }
	}
}

fn failed(stage: Stage, err: impl fmt::Display) -> StageReport {
	StageReport::new(stage, StageStatus::Failed { error: err.to_string() })
}

fn log_outcome(report: &StageReport) {
	let stage = report.stage;
	match &report.status {
		StageStatus::Completed => info!(target = "shunt.teardown", %stage, "stage completed"),
		StageStatus::Skipped => debug!(target = "shunt.teardown", %stage, "stage skipped"),
		StageStatus::Degraded { failures } => warn!(target = "shunt.teardown", %stage, failures = failures.len(), "stage completed with failures"),
		StageStatus::Failed { error } => error!(target = "shunt.teardown", %stage, %error, "stage failed"),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use shunt_protocol::ShadowNames;
	use shunt_runtime::MemoryCluster;

	use super::*;
	use crate::error::{Result, ShuntError};

	#[derive(Default)]
	struct CountingResolver {
		hosts: AtomicUsize,
		dns: AtomicUsize,
		fail_hosts: bool,
	}

	impl NameResolver for CountingResolver {
		fn drop_hosts(&self) -> Result<bool> {
			self.hosts.fetch_add(1, Ordering::SeqCst);
			if self.fail_hosts {
				return Err(ShuntError::Resolver("read-only hosts file".into()));
			}
			Ok(true)
		}

		fn restore_dns_server(&self) -> Result<usize> {
			self.dns.fetch_add(1, Ordering::SeqCst);
			Ok(0)
		}
	}

	fn teardown(cluster: Arc<MemoryCluster>, resolver: Arc<CountingResolver>, home: &std::path::Path) -> Teardown {
		Teardown::new(cluster, TeardownConfig::new(home)).with_resolver(resolver)
	}

	#[test]
	fn stages_run_in_fixed_order() {
		let names: Vec<_> = Stage::ALL.iter().map(|stage| stage.as_str()).collect();
		assert_eq!(names, ["local-files", "name-resolution", "mode-recovery", "dedicated-service", "shared-shadow"]);
	}

	#[tokio::test]
	async fn local_dns_drops_hosts_and_restores_resolver() {
		let home = tempfile::tempdir().unwrap();
		let resolver = Arc::new(CountingResolver::default());
		let mut state = SessionRuntimeState::new(Component::Connect, "dev");
		state.dns_mode = Some(DnsMode::LocalDns);

		let report = teardown(Arc::new(MemoryCluster::new()), resolver.clone(), home.path()).run(&state).await;
		assert_eq!(report.status(Stage::NameResolution), Some(&StageStatus::Completed));
		assert_eq!(resolver.hosts.load(Ordering::SeqCst), 1);
		assert_eq!(resolver.dns.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn hosts_mode_skips_resolver_restore() {
		let home = tempfile::tempdir().unwrap();
		let resolver = Arc::new(CountingResolver::default());
		let mut state = SessionRuntimeState::new(Component::Connect, "dev");
		state.dns_mode = Some(DnsMode::Hosts);

		teardown(Arc::new(MemoryCluster::new()), resolver.clone(), home.path()).run(&state).await;
		assert_eq!(resolver.hosts.load(Ordering::SeqCst), 1);
		assert_eq!(resolver.dns.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn pod_dns_and_other_components_leave_resolution_alone() {
		let home = tempfile::tempdir().unwrap();
		let resolver = Arc::new(CountingResolver::default());
		let mut connect = SessionRuntimeState::new(Component::Connect, "dev");
		connect.dns_mode = Some(DnsMode::PodDns);
		let mut exchange = SessionRuntimeState::new(Component::Exchange, "dev");
		exchange.dns_mode = Some(DnsMode::Hosts);

		let teardown = teardown(Arc::new(MemoryCluster::new()), resolver.clone(), home.path());
		for state in [connect, exchange] {
			let report = teardown.run(&state).await;
			assert_eq!(report.status(Stage::NameResolution), Some(&StageStatus::Skipped));
		}
		assert_eq!(resolver.hosts.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn resolver_failure_does_not_stop_later_stages() {
		let home = tempfile::tempdir().unwrap();
		let cluster = Arc::new(MemoryCluster::new());
		cluster.insert_service(shunt_runtime::Service::new("dev-svc", "dev"));
		let resolver = Arc::new(CountingResolver {
			fail_hosts: true,
			..Default::default()
		});
		let mut state = SessionRuntimeState::new(Component::Connect, "dev");
		state.dns_mode = Some(DnsMode::Hosts);
		state.service = Some("dev-svc".into());

		let report = teardown(cluster.clone(), resolver, home.path()).run(&state).await;
		assert!(matches!(report.status(Stage::NameResolution), Some(StageStatus::Degraded { .. })));
		assert_eq!(report.status(Stage::DedicatedService), Some(&StageStatus::Completed));
		assert!(cluster.service("dev-svc", "dev").is_none());
		assert!(!report.is_clean());
	}

	#[tokio::test]
	async fn empty_session_skips_everything_but_local_files() {
		let home = tempfile::tempdir().unwrap();
		let cluster = Arc::new(MemoryCluster::new());
		let mut state = SessionRuntimeState::new(Component::Connect, "dev");
		state.shadow = ShadowNames::default();

		let report = teardown(cluster.clone(), Arc::new(CountingResolver::default()), home.path()).run(&state).await;
		assert_eq!(report.stages.len(), Stage::ALL.len());
		assert_eq!(report.status(Stage::LocalFiles), Some(&StageStatus::Completed));
		for stage in &Stage::ALL[1..] {
			assert_eq!(report.status(*stage), Some(&StageStatus::Skipped), "{stage}");
		}
		assert!(report.is_clean());
		assert!(cluster.calls().is_empty());
	}
}
