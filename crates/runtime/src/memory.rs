//! In-memory control plane for tests and teardown rehearsals.
//!
//! Provides a conflict-detecting object store without a cluster, plus a call
//! journal and fault injection for inspecting what lifecycle code did.
//!
//! # Example
//!
//! ```ignore
//! let cluster = Arc::new(MemoryCluster::new());
//! cluster.insert_service(Service::new("api", "dev"));
//! cluster.fail_next(Operation::Update, ResourceKind::Service, "api", ClusterError::Transport("timeout".into()));
//!
//! let gateway: Arc<dyn ControlPlane> = cluster.clone();
//! // ... drive lifecycle code through `gateway` ...
//! assert_eq!(cluster.count(Operation::Remove, ResourceKind::Service), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClusterError, ClusterResult, ResourceKind};
use crate::gateway::ControlPlane;
use crate::objects::{ConfigMap, Deployment, ExecOutput, Pod, Resource, Service};

/// Control-plane operation recorded in the call journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
	Get,
	List,
	Create,
	Update,
	Scale,
	Remove,
	Exec,
	RemoveEphemeral,
	ListNamespaces,
}

/// One control-plane call, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
	pub operation: Operation,
	pub kind: ResourceKind,
	pub namespace: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
}

/// Serializable cluster contents used to seed and persist a [`MemoryCluster`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
	#[serde(default)]
	pub namespaces: Vec<String>,
	#[serde(default)]
	pub pods: Vec<Pod>,
	#[serde(default)]
	pub deployments: Vec<Deployment>,
	#[serde(default)]
	pub services: Vec<Service>,
	#[serde(default)]
	pub config_maps: Vec<ConfigMap>,
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
	(namespace.to_string(), name.to_string())
}

struct Store<T> {
	objects: BTreeMap<Key, T>,
}

impl<T> Default for Store<T> {
	fn default() -> Self {
		Self { objects: BTreeMap::new() }
	}
}

impl<T: Resource> Store<T> {
	fn seed(&mut self, mut object: T) {
		if object.meta().resource_version == 0 {
			object.meta_mut().resource_version = 1;
		}
		let meta = object.meta();
		self.objects.insert(key(&meta.namespace, &meta.name), object);
	}

	fn peek(&self, namespace: &str, name: &str) -> Option<&T> {
		self.objects.get(&key(namespace, name))
	}

	fn get(&self, namespace: &str, name: &str) -> ClusterResult<T> {
		self.peek(namespace, name)
			.cloned()
			.ok_or_else(|| ClusterError::not_found(T::KIND, namespace, name))
	}

	fn get_mut(&mut self, namespace: &str, name: &str) -> ClusterResult<&mut T> {
		self.objects
			.get_mut(&key(namespace, name))
			.ok_or_else(|| ClusterError::not_found(T::KIND, namespace, name))
	}

	fn list(&self, labels: &BTreeMap<String, String>, namespace: &str) -> Vec<T> {
		self.objects
			.values()
			.filter(|object| object.meta().namespace == namespace && object.meta().matches_labels(labels))
			.cloned()
			.collect()
	}

	fn create(&mut self, mut object: T) -> ClusterResult<T> {
		let meta = object.meta();
		let k = key(&meta.namespace, &meta.name);
		if self.objects.contains_key(&k) {
			return Err(ClusterError::AlreadyExists {
				kind: T::KIND,
				namespace: k.0,
				name: k.1,
			});
		}
		object.meta_mut().resource_version = 1;
		self.objects.insert(k, object.clone());
		Ok(object)
	}

	fn update(&mut self, mut object: T) -> ClusterResult<T> {
		let meta = object.meta();
		let (namespace, name, sent) = (meta.namespace.clone(), meta.name.clone(), meta.resource_version);
		let stored = self.get_mut(&namespace, &name)?;
		let current = stored.meta().resource_version;
		if sent != current {
			return Err(ClusterError::Conflict {
				kind: T::KIND,
				namespace,
				name,
				sent,
				current,
			});
		}
		object.meta_mut().resource_version = current + 1;
		*stored = object.clone();
		Ok(object)
	}

	fn remove(&mut self, namespace: &str, name: &str) -> ClusterResult<T> {
		self.objects
			.remove(&key(namespace, name))
			.ok_or_else(|| ClusterError::not_found(T::KIND, namespace, name))
	}
}

struct Fault {
	operation: Operation,
	kind: ResourceKind,
	name: String,
	error: ClusterError,
	/// `None` fails every matching call.
	remaining: Option<usize>,
}

#[derive(Default)]
struct ClusterState {
	namespaces: BTreeSet<String>,
	pods: Store<Pod>,
	deployments: Store<Deployment>,
	services: Store<Service>,
	config_maps: Store<ConfigMap>,
	calls: Vec<CallRecord>,
	faults: Vec<Fault>,
	/// Ready replicas gained per deployment read; absent means instant rollout.
	rollout: HashMap<Key, i32>,
	exec_output: ExecOutput,
}

impl ClusterState {
	fn record(&mut self, operation: Operation, kind: ResourceKind, namespace: &str, name: &str, detail: Option<String>) -> ClusterResult<()> {
		self.calls.push(CallRecord {
			operation,
			kind,
			namespace: namespace.to_string(),
			name: name.to_string(),
			detail,
		});
		self.injected_fault(operation, kind, name)
	}

	fn injected_fault(&mut self, operation: Operation, kind: ResourceKind, name: &str) -> ClusterResult<()> {
		let Some(index) = self
			.faults
			.iter()
			.position(|fault| fault.operation == operation && fault.kind == kind && fault.name == name)
		else {
			return Ok(());
		};
		let error = self.faults[index].error.clone();
		debug!(target = "shunt.memory", ?operation, %kind, %name, error = %error, "injecting fault");
		if let Some(remaining) = self.faults[index].remaining.as_mut() {
			*remaining -= 1;
			if *remaining == 0 {
				self.faults.remove(index);
			}
		}
		Err(error)
	}

	fn advance_rollout(&mut self, namespace: &str, name: &str) {
		let step = self.rollout.get(&key(namespace, name)).copied();
		if let Some(deployment) = self.deployments.objects.get_mut(&key(namespace, name)) {
			let target = deployment.spec.replicas;
			let ready = &mut deployment.status.ready_replicas;
			match step {
				None => *ready = target,
				Some(step) if *ready < target => *ready = (*ready + step).min(target),
				Some(step) if *ready > target => *ready = (*ready - step).max(target),
				Some(_) => {}
			}
		}
	}
}

/// Conflict-detecting in-memory [`ControlPlane`].
#[derive(Default)]
pub struct MemoryCluster {
	state: Mutex<ClusterState>,
}

impl MemoryCluster {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_snapshot(snapshot: ClusterSnapshot) -> Self {
		let cluster = Self::new();
		{
			let mut state = cluster.state.lock();
			state.namespaces.extend(snapshot.namespaces);
		}
		snapshot.pods.into_iter().for_each(|pod| cluster.insert_pod(pod));
		snapshot.deployments.into_iter().for_each(|deployment| cluster.insert_deployment(deployment));
		snapshot.services.into_iter().for_each(|service| cluster.insert_service(service));
		snapshot.config_maps.into_iter().for_each(|config_map| cluster.insert_config_map(config_map));
		cluster
	}

	pub fn snapshot(&self) -> ClusterSnapshot {
		let state = self.state.lock();
		ClusterSnapshot {
			namespaces: state.namespaces.iter().cloned().collect(),
			pods: state.pods.objects.values().cloned().collect(),
			deployments: state.deployments.objects.values().cloned().collect(),
			services: state.services.objects.values().cloned().collect(),
			config_maps: state.config_maps.objects.values().cloned().collect(),
		}
	}

	pub fn insert_pod(&self, pod: Pod) {
		let mut state = self.state.lock();
		state.namespaces.insert(pod.metadata.namespace.clone());
		state.pods.seed(pod);
	}

	pub fn insert_deployment(&self, deployment: Deployment) {
		let mut state = self.state.lock();
		state.namespaces.insert(deployment.metadata.namespace.clone());
		state.deployments.seed(deployment);
	}

	pub fn insert_service(&self, service: Service) {
		let mut state = self.state.lock();
		state.namespaces.insert(service.metadata.namespace.clone());
		state.services.seed(service);
	}

	pub fn insert_config_map(&self, config_map: ConfigMap) {
		let mut state = self.state.lock();
		state.namespaces.insert(config_map.metadata.namespace.clone());
		state.config_maps.seed(config_map);
	}

	pub fn pod(&self, name: &str, namespace: &str) -> Option<Pod> {
		self.state.lock().pods.peek(namespace, name).cloned()
	}

	pub fn deployment(&self, name: &str, namespace: &str) -> Option<Deployment> {
		self.state.lock().deployments.peek(namespace, name).cloned()
	}

	pub fn service(&self, name: &str, namespace: &str) -> Option<Service> {
		self.state.lock().services.peek(namespace, name).cloned()
	}

	pub fn config_map(&self, name: &str, namespace: &str) -> Option<ConfigMap> {
		self.state.lock().config_maps.peek(namespace, name).cloned()
	}

	/// Fails the next matching call with `error`.
	pub fn fail_next(&self, operation: Operation, kind: ResourceKind, name: &str, error: ClusterError) {
		self.fail_times(operation, kind, name, error, 1);
	}

	/// Fails the next `times` matching calls with `error`.
	pub fn fail_times(&self, operation: Operation, kind: ResourceKind, name: &str, error: ClusterError, times: usize) {
		if times == 0 {
			return;
		}
		self.state.lock().faults.push(Fault {
			operation,
			kind,
			name: name.to_string(),
			error,
			remaining: Some(times),
		});
	}

	/// Fails every matching call with `error`.
	pub fn fail_always(&self, operation: Operation, kind: ResourceKind, name: &str, error: ClusterError) {
		self.state.lock().faults.push(Fault {
			operation,
			kind,
			name: name.to_string(),
			error,
			remaining: None,
		});
	}

	/// Makes a deployment gain (or lose) `step` ready replicas per read; 0 stalls it.
	pub fn set_rollout_step(&self, name: &str, namespace: &str, step: i32) {
		self.state.lock().rollout.insert(key(namespace, name), step.max(0));
	}

	/// Output returned by every successful exec.
	pub fn set_exec_output(&self, output: ExecOutput) {
		self.state.lock().exec_output = output;
	}

	pub fn calls(&self) -> Vec<CallRecord> {
		self.state.lock().calls.clone()
	}

	pub fn take_calls(&self) -> Vec<CallRecord> {
		std::mem::take(&mut self.state.lock().calls)
	}

	/// Calls that addressed an object named `name`.
	pub fn calls_for(&self, name: &str) -> Vec<CallRecord> {
		self.state.lock().calls.iter().filter(|call| call.name == name).cloned().collect()
	}

	pub fn count(&self, operation: Operation, kind: ResourceKind) -> usize {
		self.state
			.lock()
			.calls
			.iter()
			.filter(|call| call.operation == operation && call.kind == kind)
			.count()
	}
}

#[async_trait]
impl ControlPlane for MemoryCluster {
	async fn get_pod(&self, name: &str, namespace: &str) -> ClusterResult<Pod> {
		let mut state = self.state.lock();
		state.record(Operation::Get, ResourceKind::Pod, namespace, name, None)?;
		state.pods.get(namespace, name)
	}

	async fn get_pods_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Pod>> {
		let mut state = self.state.lock();
		state.record(Operation::List, ResourceKind::Pod, namespace, "", None)?;
		Ok(state.pods.list(labels, namespace))
	}

	async fn create_pod(&self, pod: Pod) -> ClusterResult<Pod> {
		let mut state = self.state.lock();
		state.record(Operation::Create, ResourceKind::Pod, &pod.metadata.namespace, &pod.metadata.name, None)?;
		state.namespaces.insert(pod.metadata.namespace.clone());
		state.pods.create(pod)
	}

	async fn update_pod(&self, pod: Pod) -> ClusterResult<Pod> {
		let mut state = self.state.lock();
		state.record(Operation::Update, ResourceKind::Pod, &pod.metadata.namespace, &pod.metadata.name, None)?;
		state.pods.update(pod)
	}

	async fn remove_pod(&self, name: &str, namespace: &str) -> ClusterResult<()> {
		let mut state = self.state.lock();
		state.record(Operation::Remove, ResourceKind::Pod, namespace, name, None)?;
		state.pods.remove(namespace, name).map(drop)
	}

	async fn get_deployment(&self, name: &str, namespace: &str) -> ClusterResult<Deployment> {
		let mut state = self.state.lock();
		state.record(Operation::Get, ResourceKind::Deployment, namespace, name, None)?;
		state.advance_rollout(namespace, name);
		state.deployments.get(namespace, name)
	}

	async fn get_deployments_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Deployment>> {
		let mut state = self.state.lock();
		state.record(Operation::List, ResourceKind::Deployment, namespace, "", None)?;
		Ok(state.deployments.list(labels, namespace))
	}

	async fn create_deployment(&self, deployment: Deployment) -> ClusterResult<Deployment> {
		let mut state = self.state.lock();
		let (namespace, name) = (deployment.metadata.namespace.clone(), deployment.metadata.name.clone());
		state.record(Operation::Create, ResourceKind::Deployment, &namespace, &name, None)?;
		state.namespaces.insert(namespace);
		state.deployments.create(deployment)
	}

	async fn update_deployment(&self, deployment: Deployment) -> ClusterResult<Deployment> {
		let mut state = self.state.lock();
		let (namespace, name) = (deployment.metadata.namespace.clone(), deployment.metadata.name.clone());
		state.record(Operation::Update, ResourceKind::Deployment, &namespace, &name, None)?;
		state.deployments.update(deployment)
	}

	async fn scale_deployment(&self, name: &str, namespace: &str, replicas: i32) -> ClusterResult<()> {
		let mut state = self.state.lock();
		state.record(Operation::Scale, ResourceKind::Deployment, namespace, name, Some(replicas.to_string()))?;
		let deployment = state.deployments.get_mut(namespace, name)?;
		deployment.spec.replicas = replicas;
		deployment.metadata.resource_version += 1;
		Ok(())
	}

	async fn remove_deployment(&self, name: &str, namespace: &str) -> ClusterResult<()> {
		let mut state = self.state.lock();
		state.record(Operation::Remove, ResourceKind::Deployment, namespace, name, None)?;
		state.deployments.remove(namespace, name).map(drop)
	}

	async fn get_service(&self, name: &str, namespace: &str) -> ClusterResult<Service> {
		let mut state = self.state.lock();
		state.record(Operation::Get, ResourceKind::Service, namespace, name, None)?;
		state.services.get(namespace, name)
	}

	async fn get_services_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Service>> {
		let mut state = self.state.lock();
		state.record(Operation::List, ResourceKind::Service, namespace, "", None)?;
		Ok(state.services.list(labels, namespace))
	}

	async fn create_service(&self, service: Service) -> ClusterResult<Service> {
		let mut state = self.state.lock();
		let (namespace, name) = (service.metadata.namespace.clone(), service.metadata.name.clone());
		state.record(Operation::Create, ResourceKind::Service, &namespace, &name, None)?;
		state.namespaces.insert(namespace);
		state.services.create(service)
	}

	async fn update_service(&self, service: Service) -> ClusterResult<Service> {
		let mut state = self.state.lock();
		let (namespace, name) = (service.metadata.namespace.clone(), service.metadata.name.clone());
		state.record(Operation::Update, ResourceKind::Service, &namespace, &name, None)?;
		state.services.update(service)
	}

	async fn remove_service(&self, name: &str, namespace: &str) -> ClusterResult<()> {
		let mut state = self.state.lock();
		state.record(Operation::Remove, ResourceKind::Service, namespace, name, None)?;
		state.services.remove(namespace, name).map(drop)
	}

	async fn get_config_map(&self, name: &str, namespace: &str) -> ClusterResult<ConfigMap> {
		let mut state = self.state.lock();
		state.record(Operation::Get, ResourceKind::ConfigMap, namespace, name, None)?;
		state.config_maps.get(namespace, name)
	}

	async fn get_config_maps_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<ConfigMap>> {
		let mut state = self.state.lock();
		state.record(Operation::List, ResourceKind::ConfigMap, namespace, "", None)?;
		Ok(state.config_maps.list(labels, namespace))
	}

	async fn create_config_map(&self, config_map: ConfigMap) -> ClusterResult<ConfigMap> {
		let mut state = self.state.lock();
		let (namespace, name) = (config_map.metadata.namespace.clone(), config_map.metadata.name.clone());
		state.record(Operation::Create, ResourceKind::ConfigMap, &namespace, &name, None)?;
		state.namespaces.insert(namespace);
		state.config_maps.create(config_map)
	}

	async fn update_config_map(&self, config_map: ConfigMap) -> ClusterResult<ConfigMap> {
		let mut state = self.state.lock();
		let (namespace, name) = (config_map.metadata.namespace.clone(), config_map.metadata.name.clone());
		state.record(Operation::Update, ResourceKind::ConfigMap, &namespace, &name, None)?;
		state.config_maps.update(config_map)
	}

	async fn remove_config_map(&self, name: &str, namespace: &str) -> ClusterResult<()> {
		let mut state = self.state.lock();
		state.record(Operation::Remove, ResourceKind::ConfigMap, namespace, name, None)?;
		state.config_maps.remove(namespace, name).map(drop)
	}

	async fn exec_in_pod(&self, container: &str, pod: &str, namespace: &str, command: &[String]) -> ClusterResult<ExecOutput> {
		let mut state = self.state.lock();
		let detail = format!("{container}: {}", command.join(" "));
		state.record(Operation::Exec, ResourceKind::Pod, namespace, pod, Some(detail))?;
		let target = state.pods.get(namespace, pod)?;
		let known = target
			.spec
			.containers
			.iter()
			.chain(target.spec.ephemeral_containers.iter())
			.any(|c| c.name == container);
		if !known && !target.spec.containers.is_empty() {
			return Err(ClusterError::Exec {
				namespace: namespace.to_string(),
				pod: pod.to_string(),
				message: format!("container {container} not found"),
			});
		}
		Ok(state.exec_output.clone())
	}

	async fn remove_ephemeral_container(&self, container: &str, pod: &str, namespace: &str) -> ClusterResult<()> {
		let mut state = self.state.lock();
		state.record(Operation::RemoveEphemeral, ResourceKind::Pod, namespace, pod, Some(container.to_string()))?;
		let target = state.pods.get_mut(namespace, pod)?;
		let before = target.spec.ephemeral_containers.len();
		target.spec.ephemeral_containers.retain(|c| c.name != container);
		if target.spec.ephemeral_containers.len() != before {
			target.metadata.resource_version += 1;
		}
		Ok(())
	}

	async fn list_namespaces(&self) -> ClusterResult<Vec<String>> {
		let mut state = self.state.lock();
		state.record(Operation::ListNamespaces, ResourceKind::Namespace, "", "", None)?;
		Ok(state.namespaces.iter().cloned().collect())
	}
}
