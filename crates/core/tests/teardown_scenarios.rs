use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use shunt::{ExchangeRecovery, MeshRecovery, OriginRecovery, RecoveryWait, RefRelease, SelectorRestore, SharedKind, SharedRefs, Stage, StageStatus, Teardown, TeardownConfig};
use shunt::{LocalResolver, ShuntError};
use shunt_protocol::{
	Component, ExchangeMode, MeshMode, REF_COUNT_KEY, ROUTER_CONFIG_KEY, ROUTER_CONTAINER, SELECTOR_BACKUP_KEY, SessionRuntimeState, ShadowNames,
};
use shunt_runtime::{
	ClusterError, ClusterResult, ConfigMap, Container, ControlPlane, Deployment, ExecOutput, MemoryCluster, Operation, Pod, ResourceKind, Service,
};
use tempfile::TempDir;
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

struct Harness {
	cluster: Arc<MemoryCluster>,
	home: TempDir,
}

impl Harness {
	fn new() -> Self {
		Self {
			cluster: Arc::new(MemoryCluster::new()),
			home: tempfile::tempdir().expect("temp home"),
		}
	}

	fn teardown(&self) -> Teardown {
		self.teardown_with(TeardownConfig::new(self.home.path()))
	}

	fn teardown_with(&self, config: TeardownConfig) -> Teardown {
		let resolver = LocalResolver::new(self.home.path().join("hosts"), self.home.path().join("resolver"));
		Teardown::new(self.cluster.clone(), config).with_resolver(Arc::new(resolver))
	}

	fn call_details(&self, operation: Operation) -> Vec<String> {
		self.cluster
			.calls()
			.into_iter()
			.filter(|call| call.operation == operation)
			.filter_map(|call| call.detail)
			.collect()
	}
}

fn redirected_service(name: &str, backup: &str) -> Service {
	let mut svc = Service::new(name, "dev");
	svc.spec.selector.insert("shunt-role".into(), "shadow".into());
	svc.metadata.annotations.insert(SELECTOR_BACKUP_KEY.into(), backup.into());
	svc
}

fn router_pod(refs: &str) -> Pod {
	let mut pod = Pod::new("api-router", "dev");
	pod.spec.containers.push(Container {
		name: ROUTER_CONTAINER.into(),
		image: "shunt/router".into(),
	});
	pod.metadata.annotations.insert(REF_COUNT_KEY.into(), refs.into());
	pod.metadata.annotations.insert(ROUTER_CONFIG_KEY.into(), "service=api,port=8080".into());
	pod
}

fn mesh_session() -> SessionRuntimeState {
	let mut state = SessionRuntimeState::new(Component::Mesh, "dev");
	state.mesh_mode = Some(MeshMode::Auto);
	state.router = Some("api-router".into());
	state.mesh_version = Some("v1".into());
	state.origin = Some("api".into());
	state
}

fn shared_shadow_pod(refs: &str) -> Pod {
	let mut pod = Pod::new("shunt-connect-shared", "dev");
	pod.metadata.annotations.insert(REF_COUNT_KEY.into(), refs.into());
	pod
}

fn shared_connect_session() -> SessionRuntimeState {
	let mut state = SessionRuntimeState::new(Component::Connect, "dev");
	state.shared_shadow = true;
	state.shadow = ShadowNames::parse("shunt-connect-shared");
	state
}

fn detail(report: &shunt::TeardownReport, stage: Stage) -> Option<serde_json::Value> {
	report.stage(stage).and_then(|r| r.detail.clone())
}

fn failures(report: &shunt::TeardownReport, stage: Stage) -> Vec<String> {
	match report.status(stage) {
		Some(StageStatus::Degraded { failures }) => failures.clone(),
		other => panic!("expected {stage} to be degraded, got {other:?}"),
	}
}

fn restored() -> Option<OriginRecovery> {
	Some(OriginRecovery {
		restore: Some(SelectorRestore::Restored),
		failures: Vec::new(),
	})
}

fn scale_session(replicas: i32) -> SessionRuntimeState {
	let mut state = SessionRuntimeState::new(Component::Exchange, "dev");
	state.exchange_mode = Some(ExchangeMode::Scale);
	state.origin = Some("api".into());
	state.origin_replicas = replicas;
	state
}

fn scaled_down_origin() -> Deployment {
	let mut origin = Deployment::new("api", "dev", 0);
	origin.status.ready_replicas = 0;
	origin
}

#[tokio::test(start_paused = true)]
async fn scale_exchange_rescales_origin_and_stops_polling_once_ready() {
	let harness = Harness::new();
	harness.cluster.insert_deployment(scaled_down_origin());
	harness.cluster.set_rollout_step("api", "dev", 1);

	let report = harness.teardown().run(&scale_session(3)).await;

	assert_eq!(report.status(Stage::ModeRecovery), Some(&StageStatus::Completed));
	let scales: Vec<_> = harness
		.cluster
		.calls_for("api")
		.into_iter()
		.filter(|call| call.operation == Operation::Scale)
		.collect();
	assert_eq!(scales.len(), 1);
	assert_eq!(scales[0].detail.as_deref(), Some("3"));
	assert_eq!(harness.cluster.count(Operation::Get, ResourceKind::Deployment), 3);
	assert_eq!(harness.cluster.deployment("api", "dev").unwrap().status.ready_replicas, 3);

	let expected = serde_json::to_value(ExchangeRecovery::Scale {
		scale_error: None,
		wait: RecoveryWait::Ready { polls: 3 },
	})
	.unwrap();
	assert_eq!(detail(&report, Stage::ModeRecovery), Some(expected));
}

#[tokio::test(start_paused = true)]
async fn stalled_scale_recovery_degrades_the_stage() {
	let harness = Harness::new();
	harness.cluster.insert_deployment(scaled_down_origin());
	harness.cluster.set_rollout_step("api", "dev", 0);

	let report = harness
		.teardown_with(TeardownConfig::new(harness.home.path()).with_recover_wait_time(Duration::from_secs(30)))
		.run(&scale_session(3))
		.await;

	assert_eq!(failures(&report, Stage::ModeRecovery), ["origin not ready after 6 polls"]);
	assert_eq!(detail(&report, Stage::ModeRecovery).unwrap()["wait"]["outcome"], "timedOut");
	assert!(!report.is_clean());
}

#[tokio::test(start_paused = true)]
async fn failed_scale_request_degrades_the_stage() {
	let harness = Harness::new();
	harness.cluster.insert_deployment(scaled_down_origin());
	harness
		.cluster
		.fail_next(Operation::Scale, ResourceKind::Deployment, "api", ClusterError::Transport("timeout".into()));

	let report = harness
		.teardown_with(TeardownConfig::new(harness.home.path()).with_recover_wait_time(Duration::from_secs(10)))
		.run(&scale_session(3))
		.await;

	let failures = failures(&report, Stage::ModeRecovery);
	assert_eq!(failures[0], "scale api to 3: control plane request failed: timeout");
	assert_eq!(failures.len(), 2);
	assert_eq!(
		detail(&report, Stage::ModeRecovery).unwrap()["scaleError"],
		"scale api to 3: control plane request failed: timeout"
	);
}

#[tokio::test]
async fn selector_exchange_restores_selector_and_removes_mirror() {
	let harness = Harness::new();
	harness.cluster.insert_service(redirected_service("api", r#"{"app":"api"}"#));
	harness.cluster.insert_service(Service::new("api-stuntman", "dev"));

	let mut state = SessionRuntimeState::new(Component::Exchange, "dev");
	state.exchange_mode = Some(ExchangeMode::Selector);
	state.origin = Some("api".into());

	let report = harness.teardown().run(&state).await;
	assert!(report.is_clean(), "{report:?}");

	let svc = harness.cluster.service("api", "dev").unwrap();
	assert_eq!(svc.spec.selector.len(), 1);
	assert_eq!(svc.spec.selector.get("app").map(String::as_str), Some("api"));
	assert!(svc.metadata.annotation(SELECTOR_BACKUP_KEY).is_none());
	assert!(harness.cluster.service("api-stuntman", "dev").is_none());
	assert_eq!(detail(&report, Stage::ModeRecovery).unwrap()["restore"], "restored");
}

#[tokio::test]
async fn selector_exchange_with_stuck_mirror_degrades_the_stage() {
	let harness = Harness::new();
	harness.cluster.insert_service(redirected_service("api", r#"{"app":"api"}"#));
	harness.cluster.insert_service(Service::new("api-stuntman", "dev"));
	harness
		.cluster
		.fail_next(Operation::Remove, ResourceKind::Service, "api-stuntman", ClusterError::Transport("timeout".into()));

	let mut state = SessionRuntimeState::new(Component::Exchange, "dev");
	state.exchange_mode = Some(ExchangeMode::Selector);
	state.origin = Some("api".into());

	let report = harness.teardown().run(&state).await;
	assert_eq!(
		failures(&report, Stage::ModeRecovery),
		["remove mirror service api-stuntman: control plane request failed: timeout"]
	);
	assert!(harness.cluster.service("api-stuntman", "dev").is_some());
}

#[tokio::test]
async fn mesh_last_holder_deletes_router_and_restores_configured_origin() {
	let harness = Harness::new();
	harness.cluster.insert_pod(router_pod("1"));
	harness.cluster.insert_service(redirected_service("api", r#"{"app":"api"}"#));

	// The router's own config names the origin, not the session state.
	let mut state = mesh_session();
	state.origin = None;

	let report = harness.teardown().run(&state).await;

	assert!(harness.cluster.pod("api-router", "dev").is_none());
	assert_eq!(harness.cluster.service("api", "dev").unwrap().spec.selector.get("app").map(String::as_str), Some("api"));
	assert_eq!(harness.cluster.count(Operation::Exec, ResourceKind::Pod), 0);

	let expected = serde_json::to_value(MeshRecovery::RouterReleased {
		origin: restored(),
		delete_error: None,
	})
	.unwrap();
	assert_eq!(detail(&report, Stage::ModeRecovery), Some(expected));
	assert_eq!(report.status(Stage::ModeRecovery), Some(&StageStatus::Completed));
}

#[tokio::test]
async fn mesh_router_that_survives_deletion_degrades_the_stage() {
	let harness = Harness::new();
	harness.cluster.insert_pod(router_pod("1"));
	harness.cluster.insert_service(redirected_service("api", r#"{"app":"api"}"#));
	harness
		.cluster
		.fail_next(Operation::Remove, ResourceKind::Pod, "api-router", ClusterError::Transport("timeout".into()));

	let report = harness.teardown().run(&mesh_session()).await;

	assert!(harness.cluster.pod("api-router", "dev").is_some());
	assert_eq!(
		failures(&report, Stage::ModeRecovery),
		["delete router api-router: control plane request failed: timeout"]
	);
	assert_eq!(detail(&report, Stage::ModeRecovery).unwrap()["deleteError"], "delete router api-router: control plane request failed: timeout");
	assert!(!report.is_clean());
}

#[tokio::test]
async fn mesh_last_holder_with_unrestorable_origin_degrades_the_stage() {
	let harness = Harness::new();
	harness.cluster.insert_pod(router_pod("1"));
	harness.cluster.insert_service(redirected_service("api", "app=api"));

	let report = harness.teardown().run(&mesh_session()).await;

	assert!(harness.cluster.pod("api-router", "dev").is_none());
	let failures = failures(&report, Stage::ModeRecovery);
	assert_eq!(failures.len(), 1);
	assert!(failures[0].starts_with("restore selector of api: "), "{failures:?}");
}

#[tokio::test]
async fn mesh_shared_router_only_loses_this_version_route() {
	let harness = Harness::new();
	harness.cluster.insert_pod(router_pod("2"));
	harness.cluster.insert_service(redirected_service("api", r#"{"app":"api"}"#));

	harness.teardown().run(&mesh_session()).await;

	let execs: Vec<_> = harness
		.cluster
		.calls()
		.into_iter()
		.filter(|call| call.operation == Operation::Exec)
		.collect();
	assert_eq!(execs.len(), 1);
	assert_eq!(execs[0].name, "api-router");
	assert_eq!(execs[0].detail.as_deref(), Some("standalone: /usr/sbin/router remove v1"));

	let router = harness.cluster.pod("api-router", "dev").expect("router kept");
	assert_eq!(router.metadata.annotation(REF_COUNT_KEY), Some("1"));
	assert!(harness.cluster.service("api", "dev").unwrap().metadata.annotation(SELECTOR_BACKUP_KEY).is_some());
}

#[tokio::test]
async fn mesh_with_vanished_router_falls_back_to_recorded_origin() {
	let harness = Harness::new();
	harness.cluster.insert_service(redirected_service("api", r#"{"app":"api"}"#));

	let report = harness.teardown().run(&mesh_session()).await;

	let router_calls = harness.cluster.calls_for("api-router");
	assert_eq!(router_calls.len(), 1);
	assert_eq!(router_calls[0].operation, Operation::Get);
	assert!(harness.cluster.service("api", "dev").unwrap().metadata.annotation(SELECTOR_BACKUP_KEY).is_none());

	let expected = serde_json::to_value(MeshRecovery::RouterVanished {
		origin: restored(),
		lookup_error: None,
	})
	.unwrap();
	assert_eq!(detail(&report, Stage::ModeRecovery), Some(expected));
	assert_eq!(report.status(Stage::ModeRecovery), Some(&StageStatus::Completed));
}

#[tokio::test]
async fn mesh_with_vanished_router_and_failed_fallback_degrades_the_stage() {
	let harness = Harness::new();
	harness.cluster.insert_service(redirected_service("api", r#"{"app":"api"}"#));
	harness
		.cluster
		.fail_next(Operation::Update, ResourceKind::Service, "api", ClusterError::Transport("timeout".into()));

	let report = harness.teardown().run(&mesh_session()).await;

	assert_eq!(
		failures(&report, Stage::ModeRecovery),
		["restore selector of api: control plane request failed: timeout"]
	);
	assert!(harness.cluster.service("api", "dev").unwrap().metadata.annotation(SELECTOR_BACKUP_KEY).is_some());
}

#[tokio::test]
async fn private_shadows_are_deleted_without_touching_ref_counts() {
	let harness = Harness::new();
	for name in ["api-shadow", "db-shadow"] {
		harness.cluster.insert_pod(Pod::new(name, "dev"));
		harness.cluster.insert_config_map(ConfigMap::new(name, "dev"));
	}

	let mut state = SessionRuntimeState::new(Component::Exchange, "dev");
	state.shadow = ShadowNames::parse("api-shadow,db-shadow");

	let report = harness.teardown().run(&state).await;
	assert_eq!(report.status(Stage::SharedShadow), Some(&StageStatus::Completed));

	for name in ["api-shadow", "db-shadow"] {
		assert!(harness.cluster.pod(name, "dev").is_none());
		assert!(harness.cluster.config_map(name, "dev").is_none());
	}
	assert_eq!(harness.cluster.count(Operation::Get, ResourceKind::Pod), 0);
	assert_eq!(harness.cluster.count(Operation::Update, ResourceKind::Pod), 0);
}

#[tokio::test]
async fn deployment_shadows_are_removed_as_deployments() {
	let harness = Harness::new();
	harness.cluster.insert_deployment(Deployment::new("api-shadow", "dev", 1));

	let mut state = SessionRuntimeState::new(Component::Connect, "dev");
	state.use_deployment_shadow = true;
	state.shadow = ShadowNames::parse("api-shadow");

	let report = harness.teardown().run(&state).await;
	assert_eq!(report.status(Stage::SharedShadow), Some(&StageStatus::Completed));
	assert!(harness.cluster.deployment("api-shadow", "dev").is_none());
	assert_eq!(harness.cluster.count(Operation::Remove, ResourceKind::Pod), 0);
}

#[tokio::test]
async fn shared_shadow_survives_until_last_session_leaves() {
	let harness = Harness::new();
	harness.cluster.insert_pod(shared_shadow_pod("2"));
	harness.cluster.insert_config_map(ConfigMap::new("shunt-connect-shared", "dev"));
	let state = shared_connect_session();

	harness.teardown().run(&state).await;
	let shadow = harness.cluster.pod("shunt-connect-shared", "dev").expect("still shared");
	assert_eq!(shadow.metadata.annotation(REF_COUNT_KEY), Some("1"));
	assert!(harness.cluster.config_map("shunt-connect-shared", "dev").is_some());

	harness.teardown().run(&state).await;
	assert!(harness.cluster.pod("shunt-connect-shared", "dev").is_none());
	assert!(harness.cluster.config_map("shunt-connect-shared", "dev").is_none());
	assert_eq!(harness.cluster.count(Operation::Remove, ResourceKind::Pod), 1);

	let report = harness.teardown().run(&state).await;
	assert_eq!(report.status(Stage::SharedShadow), Some(&StageStatus::Completed));
	assert_eq!(
		detail(&report, Stage::SharedShadow),
		Some(serde_json::json!({ "release": { "outcome": "vanished" }, "deleted": false }))
	);
	assert_eq!(harness.cluster.count(Operation::Remove, ResourceKind::Pod), 1);
}

#[tokio::test]
async fn failed_shadow_release_keeps_the_shared_shadow() {
	let harness = Harness::new();
	harness.cluster.insert_pod(shared_shadow_pod("1"));
	harness
		.cluster
		.fail_always(Operation::Get, ResourceKind::Pod, "shunt-connect-shared", ClusterError::Transport("connection reset".into()));

	let report = harness.teardown().run(&shared_connect_session()).await;
	assert!(matches!(report.status(Stage::SharedShadow), Some(StageStatus::Degraded { .. })));
	assert!(harness.cluster.pod("shunt-connect-shared", "dev").is_some());
}

#[tokio::test]
async fn ephemeral_exchange_detaches_container_from_each_pod() {
	let harness = Harness::new();
	for name in ["api-7f9c", "api-b21d"] {
		let mut pod = Pod::new(name, "dev");
		pod.spec.ephemeral_containers.push(Container {
			name: "shunt-exchange".into(),
			image: "shunt/shadow".into(),
		});
		harness.cluster.insert_pod(pod);
	}

	let mut state = SessionRuntimeState::new(Component::Exchange, "dev");
	state.exchange_mode = Some(ExchangeMode::Ephemeral);
	state.origin = Some("api".into());
	state.shadow = ShadowNames::parse("api-7f9c,api-b21d");

	let report = harness.teardown().run(&state).await;
	assert_eq!(report.status(Stage::SharedShadow), Some(&StageStatus::Completed));
	assert_eq!(harness.cluster.count(Operation::RemoveEphemeral, ResourceKind::Pod), 2);
	assert_eq!(harness.call_details(Operation::RemoveEphemeral), ["shunt-exchange", "shunt-exchange"]);
}

#[tokio::test(start_paused = true)]
async fn cancelled_wait_still_runs_later_stages() {
	let harness = Harness::new();
	harness.cluster.insert_deployment(scaled_down_origin());
	harness.cluster.set_rollout_step("api", "dev", 0);
	harness.cluster.insert_service(Service::new("api-dev-svc", "dev"));
	harness.cluster.insert_pod(Pod::new("api-shadow", "dev"));

	let mut state = scale_session(2);
	state.service = Some("api-dev-svc".into());
	state.shadow = ShadowNames::parse("api-shadow");

	let cancel = CancellationToken::new();
	let teardown = harness
		.teardown_with(TeardownConfig::new(harness.home.path()).with_recover_wait_time(Duration::from_secs(600)))
		.with_cancellation(cancel.clone());
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_secs(7)).await;
		cancel.cancel();
	});

	let report = teardown.run(&state).await;

	let expected = serde_json::to_value(ExchangeRecovery::Scale {
		scale_error: None,
		wait: RecoveryWait::Cancelled,
	})
	.unwrap();
	assert_eq!(detail(&report, Stage::ModeRecovery), Some(expected));
	assert_eq!(report.status(Stage::DedicatedService), Some(&StageStatus::Completed));
	assert!(harness.cluster.service("api-dev-svc", "dev").is_none());
	assert!(harness.cluster.pod("api-shadow", "dev").is_none());
}

#[tokio::test]
async fn interleaved_releases_elect_exactly_one_last_holder() {
	let cluster = Arc::new(MemoryCluster::new());
	cluster.insert_pod(shared_shadow_pod("2"));
	// Both sessions read the count before either writes it back.
	let gateway = LockstepReads::new(cluster.clone(), 2);

	let refs = SharedRefs::new(&gateway);
	let (first, second) = tokio::join!(
		refs.decrease(SharedKind::Pod, "shunt-connect-shared", "dev"),
		refs.decrease(SharedKind::Pod, "shunt-connect-shared", "dev"),
	);
	let mut outcomes = vec![first.unwrap(), second.unwrap()];
	outcomes.sort_by_key(|release| release.is_last_holder());

	assert_eq!(outcomes, vec![RefRelease::Retained { remaining: 1 }, RefRelease::LastHolder]);
	assert_eq!(cluster.pod("shunt-connect-shared", "dev").unwrap().metadata.annotation(REF_COUNT_KEY), Some("0"));
	// One stale write, one re-read, one retried write.
	assert_eq!(cluster.count(Operation::Get, ResourceKind::Pod), 3);
	assert_eq!(cluster.count(Operation::Update, ResourceKind::Pod), 3);
}

#[tokio::test]
async fn persistent_conflicts_surface_as_contention() {
	let cluster = MemoryCluster::new();
	cluster.insert_pod(shared_shadow_pod("3"));
	cluster.fail_always(
		Operation::Update,
		ResourceKind::Pod,
		"shunt-connect-shared",
		ClusterError::Conflict {
			kind: ResourceKind::Pod,
			namespace: "dev".into(),
			name: "shunt-connect-shared".into(),
			sent: 1,
			current: 9,
		},
	);

	let err = SharedRefs::new(&cluster)
		.decrease(SharedKind::Pod, "shunt-connect-shared", "dev")
		.await
		.unwrap_err();
	assert!(matches!(err, ShuntError::RefContention { attempts: 5, .. }));
	assert_eq!(cluster.count(Operation::Update, ResourceKind::Pod), 5);
}

/// Holds the first `held` pod reads at a barrier until all of them have read,
/// so concurrent sessions see the same resource version.
struct LockstepReads {
	cluster: Arc<MemoryCluster>,
	barrier: Barrier,
	held: AtomicUsize,
}

impl LockstepReads {
	fn new(cluster: Arc<MemoryCluster>, sessions: usize) -> Self {
		Self {
			cluster,
			barrier: Barrier::new(sessions),
			held: AtomicUsize::new(sessions),
		}
	}
}

#[async_trait]
impl ControlPlane for LockstepReads {
	async fn get_pod(&self, name: &str, namespace: &str) -> ClusterResult<Pod> {
		let pod = self.cluster.get_pod(name, namespace).await;
		if self.held.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
			self.barrier.wait().await;
		}
		pod
	}

	async fn get_pods_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Pod>> {
		self.cluster.get_pods_by_label(labels, namespace).await
	}

	async fn create_pod(&self, pod: Pod) -> ClusterResult<Pod> {
		self.cluster.create_pod(pod).await
	}

	async fn update_pod(&self, pod: Pod) -> ClusterResult<Pod> {
		self.cluster.update_pod(pod).await
	}

	async fn remove_pod(&self, name: &str, namespace: &str) -> ClusterResult<()> {
		self.cluster.remove_pod(name, namespace).await
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> ClusterResult<Deployment> {
		self.cluster.get_deployment(name, namespace).await
	}

	async fn get_deployments_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Deployment>> {
		self.cluster.get_deployments_by_label(labels, namespace).await
	}

	async fn create_deployment(&self, deployment: Deployment) -> ClusterResult<Deployment> {
		self.cluster.create_deployment(deployment).await
	}

	async fn update_deployment(&self, deployment: Deployment) -> ClusterResult<Deployment> {
		self.cluster.update_deployment(deployment).await
	}

	async fn scale_deployment(&self, name: &str, namespace: &str, replicas: i32) -> ClusterResult<()> {
		self.cluster.scale_deployment(name, namespace, replicas).await
	}

	async fn remove_deployment(&self, name: &str, namespace: &str) -> ClusterResult<()> {
		self.cluster.remove_deployment(name, namespace).await
	}

	async fn get_service(&self, name: &str, namespace: &str) -> ClusterResult<Service> {
		self.cluster.get_service(name, namespace).await
	}

	async fn get_services_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Service>> {
		self.cluster.get_services_by_label(labels, namespace).await
	}

	async fn create_service(&self, service: Service) -> ClusterResult<Service> {
		self.cluster.create_service(service).await
	}

	async fn update_service(&self, service: Service) -> ClusterResult<Service> {
		self.cluster.update_service(service).await
	}

	async fn remove_service(&self, name: &str, namespace: &str) -> ClusterResult<()> {
		self.cluster.remove_service(name, namespace).await
	}

	async fn get_config_map(&self, name: &str, namespace: &str) -> ClusterResult<ConfigMap> {
		self.cluster.get_config_map(name, namespace).await
	}

	async fn get_config_maps_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<ConfigMap>> {
		self.cluster.get_config_maps_by_label(labels, namespace).await
	}

	async fn create_config_map(&self, config_map: ConfigMap) -> ClusterResult<ConfigMap> {
		self.cluster.create_config_map(config_map).await
	}

	async fn update_config_map(&self, config_map: ConfigMap) -> ClusterResult<ConfigMap> {
		self.cluster.update_config_map(config_map).await
	}

	async fn remove_config_map(&self, name: &str, namespace: &str) -> ClusterResult<()> {
		self.cluster.remove_config_map(name, namespace).await
	}

	async fn exec_in_pod(&self, container: &str, pod: &str, namespace: &str, command: &[String]) -> ClusterResult<ExecOutput> {
		self.cluster.exec_in_pod(container, pod, namespace, command).await
	}

	async fn remove_ephemeral_container(&self, container: &str, pod: &str, namespace: &str) -> ClusterResult<()> {
		self.cluster.remove_ephemeral_container(container, pod, namespace).await
	}

	async fn list_namespaces(&self) -> ClusterResult<Vec<String>> {
		self.cluster.list_namespaces().await
	}
}
