//! Reference counting for workloads shared by several sessions.
//!
//! The count lives in the [`REF_COUNT_KEY`] annotation of the shared pod or
//! deployment. Every change is a read-modify-write through the control plane's
//! version-checked update, so sessions in different processes never need a
//! common lock: a lost race comes back as a conflict and is re-read.

use serde::Serialize;
use shunt_protocol::{REF_COUNT_KEY, parse_ref_count};
use shunt_runtime::{ClusterResult, ControlPlane, Deployment, ObjectMeta, Pod, ResourceKind};
use tracing::{debug, warn};

use crate::error::{Result, ShuntError};

/// Conflicting writes tolerated before giving up on a count update.
pub const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Workload kinds that can carry a shared reference count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SharedKind {
	Pod,
	Deployment,
}

impl SharedKind {
	pub fn resource_kind(self) -> ResourceKind {
		match self {
			SharedKind::Pod => ResourceKind::Pod,
			SharedKind::Deployment => ResourceKind::Deployment,
		}
	}
}

/// Result of releasing one session's reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RefRelease {
	/// Other sessions still hold the resource; it must survive.
	Retained { remaining: u32 },
	/// This session was the last holder; the caller deletes the resource.
	LastHolder,
	/// Count was already zero or negative before this release.
	///
	/// Indicates a counting bug somewhere. Treated as last holder so the
	/// resource is not leaked forever.
	Underflow { count: i64 },
	/// Resource was deleted before this release, typically by a racing last
	/// holder. Nothing is left to do.
	Vanished,
}

impl RefRelease {
	/// Whether the caller should go on to delete the resource.
	pub fn is_last_holder(self) -> bool {
		matches!(self, RefRelease::LastHolder | RefRelease::Underflow { .. })
	}
}

enum Workload {
	Pod(Pod),
	Deployment(Deployment),
}

impl Workload {
	fn meta(&self) -> &ObjectMeta {
		match self {
			Workload::Pod(pod) => &pod.metadata,
			Workload::Deployment(deployment) => &deployment.metadata,
		}
	}

	fn meta_mut(&mut self) -> &mut ObjectMeta {
		match self {
			Workload::Pod(pod) => &mut pod.metadata,
			Workload::Deployment(deployment) => &mut deployment.metadata,
		}
	}
}

/// Increment/decrement protocol shared by shadow workloads and router pods.
pub struct SharedRefs<'a> {
	gateway: &'a dyn ControlPlane,
}

impl<'a> SharedRefs<'a> {
	pub fn new(gateway: &'a dyn ControlPlane) -> Self {
		Self { gateway }
	}

	/// Registers one more session as a holder and returns the new count.
	pub async fn increase(&self, kind: SharedKind, name: &str, namespace: &str) -> Result<u32> {
		for attempt in 1..=MAX_UPDATE_ATTEMPTS {
			let mut workload = self.fetch(kind, name, namespace).await?;
			let count = self.current_count(kind, workload.meta())?.max(0);
			let next = count + 1;
			set_count(workload.meta_mut(), next);

			match self.store(workload).await {
				Ok(()) => {
					debug!(target = "shunt.refcount", kind = %kind.resource_kind(), %name, %namespace, count = next, "reference added");
					return Ok(u32::try_from(next).unwrap_or(u32::MAX));
				}
				Err(err) if err.is_conflict() => {
					debug!(target = "shunt.refcount", %name, attempt, "reference count changed concurrently; retrying");
				}
				Err(err) => return Err(err.into()),
			}
		}
		Err(self.contention(kind, name, namespace))
	}

	/// Releases this session's reference.
	pub async fn decrease(&self, kind: SharedKind, name: &str, namespace: &str) -> Result<RefRelease> {
		for attempt in 1..=MAX_UPDATE_ATTEMPTS {
			let mut workload = match self.fetch(kind, name, namespace).await {
				Ok(workload) => workload,
				Err(err) if err.is_not_found() => {
					debug!(target = "shunt.refcount", kind = %kind.resource_kind(), %name, %namespace, "shared resource already removed");
					return Ok(RefRelease::Vanished);
				}
				Err(err) => return Err(err.into()),
			};

			let count = self.current_count(kind, workload.meta())?;
			if count <= 0 {
				warn!(
					target = "shunt.refcount",
					kind = %kind.resource_kind(),
					%name,
					%namespace,
					count,
					"reference count would drop below zero; treating this session as last holder"
				);
				return Ok(RefRelease::Underflow { count });
			}

			let remaining = count - 1;
			set_count(workload.meta_mut(), remaining);
			match self.store(workload).await {
				Ok(()) if remaining == 0 => {
					debug!(target = "shunt.refcount", %name, %namespace, "last reference released");
					return Ok(RefRelease::LastHolder);
				}
				Ok(()) => {
					debug!(target = "shunt.refcount", %name, %namespace, remaining, "reference released");
					return Ok(RefRelease::Retained {
						remaining: u32::try_from(remaining).unwrap_or(u32::MAX),
					});
				}
				Err(err) if err.is_conflict() => {
					debug!(target = "shunt.refcount", %name, attempt, "reference count changed concurrently; retrying");
				}
				Err(err) if err.is_not_found() => return Ok(RefRelease::Vanished),
				Err(err) => return Err(err.into()),
			}
		}
		Err(self.contention(kind, name, namespace))
	}

	async fn fetch(&self, kind: SharedKind, name: &str, namespace: &str) -> ClusterResult<Workload> {
		match kind {
			SharedKind::Pod => self.gateway.get_pod(name, namespace).await.map(Workload::Pod),
			SharedKind::Deployment => self.gateway.get_deployment(name, namespace).await.map(Workload::Deployment),
		}
	}

	async fn store(&self, workload: Workload) -> ClusterResult<()> {
		match workload {
			Workload::Pod(pod) => self.gateway.update_pod(pod).await.map(drop),
			Workload::Deployment(deployment) => self.gateway.update_deployment(deployment).await.map(drop),
		}
	}

	/// A workload without the annotation was created by a single session.
	fn current_count(&self, kind: SharedKind, meta: &ObjectMeta) -> Result<i64> {
		let Some(raw) = meta.annotation(REF_COUNT_KEY) else {
			return Ok(1);
		};
		parse_ref_count(raw).map_err(|_| ShuntError::RefCountFormat {
			kind: kind.resource_kind(),
			namespace: meta.namespace.clone(),
			name: meta.name.clone(),
			value: raw.to_string(),
		})
	}

	fn contention(&self, kind: SharedKind, name: &str, namespace: &str) -> ShuntError {
		ShuntError::RefContention {
			kind: kind.resource_kind(),
			namespace: namespace.to_string(),
			name: name.to_string(),
			attempts: MAX_UPDATE_ATTEMPTS,
		}
	}
}

fn set_count(meta: &mut ObjectMeta, count: i64) {
	meta.annotations.insert(REF_COUNT_KEY.to_string(), count.to_string());
}
