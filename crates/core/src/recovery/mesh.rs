//! Mesh recovery: release this session's hold on the shared router.

use serde::Serialize;
use shunt_protocol::{ROUTER_CONFIG_KEY, ROUTER_CONTAINER, RouterConfig, SessionRuntimeState, router_remove_command};
use shunt_runtime::ControlPlane;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::refcount::{SharedKind, SharedRefs};
use crate::selector::{OriginRecovery, recover_origin_service};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MeshRecovery {
	/// Session never installed or joined a router.
	NoRouter,
	/// Router pod could not be read; the origin was restored from session state instead.
	RouterVanished {
		/// `None` when no origin was recorded.
		#[serde(skip_serializing_if = "Option::is_none")]
		origin: Option<OriginRecovery>,
		/// Set when the read failed for a reason other than absence.
		#[serde(skip_serializing_if = "Option::is_none")]
		lookup_error: Option<String>,
	},
	/// Other sessions still use the router; only this version's route was dropped.
	RouterRetained {
		route_removed: bool,
		#[serde(skip_serializing_if = "Option::is_none")]
		route_error: Option<String>,
	},
	/// This session was the last user; origin restored and router deleted.
	RouterReleased {
		/// `None` when the router config names no origin service.
		#[serde(skip_serializing_if = "Option::is_none")]
		origin: Option<OriginRecovery>,
		/// Set when the router pod is still in place.
		#[serde(skip_serializing_if = "Option::is_none")]
		delete_error: Option<String>,
	},
}

impl MeshRecovery {
	/// Steps that did not go through.
	pub fn failures(&self) -> Vec<String> {
		let origin_failures = |origin: &Option<OriginRecovery>| origin.iter().flat_map(|origin| origin.failures.clone()).collect::<Vec<_>>();
		match self {
			MeshRecovery::NoRouter => Vec::new(),
			MeshRecovery::RouterVanished { origin, lookup_error } => lookup_error.iter().cloned().chain(origin_failures(origin)).collect(),
			MeshRecovery::RouterRetained { route_error, .. } => route_error.iter().cloned().collect(),
			MeshRecovery::RouterReleased { origin, delete_error } => origin_failures(origin).into_iter().chain(delete_error.iter().cloned()).collect(),
		}
	}
}

/// Undoes this session's share of the mesh router recorded in `state`.
///
/// Only a failed reference release is returned as an error, and the router
/// is then left untouched.
/// Every other failed step is logged and carried in the returned recovery.
pub async fn recover_mesh_route(gateway: &dyn ControlPlane, state: &SessionRuntimeState) -> Result<MeshRecovery> {
	let Some(router) = state.router.as_deref() else {
		return Ok(MeshRecovery::NoRouter);
	};
	let namespace = state.namespace.as_str();

	let router_pod = match gateway.get_pod(router, namespace).await {
		Ok(pod) => pod,
		Err(err) => {
			error!(target = "shunt.mesh", %router, error = %err, "router pod has been removed unexpectedly");
			let lookup_error = (!err.is_not_found()).then(|| format!("read router {router}: {err}"));
			let origin = match state.origin.as_deref() {
				Some(origin) => Some(recover_origin_service(gateway, origin, namespace).await),
				None => None,
			};
			return Ok(MeshRecovery::RouterVanished { origin, lookup_error });
		}
	};

	let release = SharedRefs::new(gateway).decrease(SharedKind::Pod, router, namespace).await?;

	if !release.is_last_holder() {
		let Some(version) = state.mesh_version.as_deref() else {
			warn!(target = "shunt.mesh", %router, "no mesh version recorded; leaving router routes untouched");
			return Ok(MeshRecovery::RouterRetained {
				route_removed: false,
				route_error: None,
			});
		};

		let command = router_remove_command(version);
		let route_error = match gateway.exec_in_pod(ROUTER_CONTAINER, router, namespace, &command).await {
			Ok(output) => {
				debug!(target = "shunt.mesh", stdout = %output.stdout, stderr = %output.stderr, "router remove finished");
				info!(target = "shunt.mesh", %router, %version, "mesh version route removed");
				None
			}
			Err(err) => {
				warn!(target = "shunt.mesh", %router, %version, error = %err, "failed to remove version from router pod");
				Some(format!("remove route {version} from {router}: {err}"))
			}
		};
		return Ok(MeshRecovery::RouterRetained {
			route_removed: route_error.is_none(),
			route_error,
		});
	}

	let config = RouterConfig::parse(router_pod.metadata.annotation(ROUTER_CONFIG_KEY).unwrap_or_default());
	let origin = match config.service() {
		Some(service) => Some(recover_origin_service(gateway, service, namespace).await),
		None => {
			warn!(target = "shunt.mesh", %router, "router config names no origin service; skipping selector restore");
			None
		}
	};

	let delete_error = match gateway.remove_pod(router, namespace).await {
		Ok(()) => {
			info!(target = "shunt.mesh", %router, "router pod removed");
			None
		}
		Err(err) if err.is_not_found() => None,
		Err(err) => {
			warn!(target = "shunt.mesh", %router, error = %err, "failed to remove router pod");
			Some(format!("delete router {router}: {err}"))
		}
	};

	Ok(MeshRecovery::RouterReleased { origin, delete_error })
}
