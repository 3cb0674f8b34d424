//! The control-plane contract lifecycle code is written against.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::ClusterResult;
use crate::objects::{ConfigMap, Deployment, ExecOutput, Pod, Service};

/// Cluster API surface consumed by shunt sessions.
///
/// `update_*` calls must be conflict-detecting: an object whose
/// `resource_version` no longer matches the stored one is rejected with
/// [`ClusterError::Conflict`](crate::ClusterError::Conflict). Sessions in
/// different processes rely on this for every shared read-modify-write.
///
/// `remove_*` calls report an absent object as
/// [`ClusterError::NotFound`](crate::ClusterError::NotFound); callers decide
/// whether that is success.
#[async_trait]
pub trait ControlPlane: Send + Sync {
	async fn get_pod(&self, name: &str, namespace: &str) -> ClusterResult<Pod>;
	async fn get_pods_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Pod>>;
	async fn create_pod(&self, pod: Pod) -> ClusterResult<Pod>;
	async fn update_pod(&self, pod: Pod) -> ClusterResult<Pod>;
	async fn remove_pod(&self, name: &str, namespace: &str) -> ClusterResult<()>;

	async fn get_deployment(&self, name: &str, namespace: &str) -> ClusterResult<Deployment>;
	async fn get_deployments_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Deployment>>;
	async fn create_deployment(&self, deployment: Deployment) -> ClusterResult<Deployment>;
	async fn update_deployment(&self, deployment: Deployment) -> ClusterResult<Deployment>;
	async fn scale_deployment(&self, name: &str, namespace: &str, replicas: i32) -> ClusterResult<()>;
	async fn remove_deployment(&self, name: &str, namespace: &str) -> ClusterResult<()>;

	async fn get_service(&self, name: &str, namespace: &str) -> ClusterResult<Service>;
	async fn get_services_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<Service>>;
	async fn create_service(&self, service: Service) -> ClusterResult<Service>;
	async fn update_service(&self, service: Service) -> ClusterResult<Service>;
	async fn remove_service(&self, name: &str, namespace: &str) -> ClusterResult<()>;

	async fn get_config_map(&self, name: &str, namespace: &str) -> ClusterResult<ConfigMap>;
	async fn get_config_maps_by_label(&self, labels: &BTreeMap<String, String>, namespace: &str) -> ClusterResult<Vec<ConfigMap>>;
	async fn create_config_map(&self, config_map: ConfigMap) -> ClusterResult<ConfigMap>;
	async fn update_config_map(&self, config_map: ConfigMap) -> ClusterResult<ConfigMap>;
	async fn remove_config_map(&self, name: &str, namespace: &str) -> ClusterResult<()>;

	/// Runs `command` in `container` of `pod` and captures its output.
	async fn exec_in_pod(&self, container: &str, pod: &str, namespace: &str, command: &[String]) -> ClusterResult<ExecOutput>;
	/// Detaches an ephemerally attached container from `pod`.
	async fn remove_ephemeral_container(&self, container: &str, pod: &str, namespace: &str) -> ClusterResult<()>;

	async fn list_namespaces(&self) -> ClusterResult<Vec<String>>;
}
