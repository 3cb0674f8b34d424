//! Restoring service selectors that a session redirected.
//!
//! Setup stores the original selector as JSON under [`SELECTOR_BACKUP_KEY`] on
//! the service before pointing it elsewhere. The annotation's presence is the
//! only signal that a restore is owed, which keeps restore idempotent: once it
//! is consumed, a repeated restore finds nothing to do.

use serde::Serialize;
use shunt_protocol::{SELECTOR_BACKUP_KEY, decode_selector, mirror_service_name};
use shunt_runtime::{ControlPlane, ResourceKind};
use tracing::{debug, error, info, warn};

use crate::error::{Result, ShuntError};

/// Outcome of a selector restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectorRestore {
	/// Selector was rewritten from the backup and the backup removed.
	Restored,
	/// No backup present: never redirected or already restored.
	NothingToRestore,
	/// Service no longer exists.
	ServiceMissing,
}

/// Puts the backed-up selector of `service` back in place.
pub async fn restore_original_selector(gateway: &dyn ControlPlane, service: &str, namespace: &str) -> Result<SelectorRestore> {
	let mut svc = match gateway.get_service(service, namespace).await {
		Ok(svc) => svc,
		Err(err) if err.is_not_found() => {
			warn!(target = "shunt.selector", %service, %namespace, "original service not found; nothing to restore");
			return Ok(SelectorRestore::ServiceMissing);
		}
		Err(err) => return Err(err.into()),
	};

	let Some(raw) = svc.metadata.annotations.get(SELECTOR_BACKUP_KEY) else {
		debug!(target = "shunt.selector", %service, "no selector backup on service; skipping");
		return Ok(SelectorRestore::NothingToRestore);
	};

	let selector = decode_selector(raw).map_err(|source| ShuntError::Decode {
		key: SELECTOR_BACKUP_KEY,
		kind: ResourceKind::Service,
		namespace: namespace.to_string(),
		name: service.to_string(),
		source,
	})?;

	svc.spec.selector = selector;
	svc.metadata.annotations.remove(SELECTOR_BACKUP_KEY);
	gateway.update_service(svc).await?;
	Ok(SelectorRestore::Restored)
}

/// What [`recover_origin_service`] managed to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginRecovery {
	/// `None` when the restore failed; the reason is in `failures`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub restore: Option<SelectorRestore>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub failures: Vec<String>,
}

impl OriginRecovery {
	pub fn is_complete(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Restores `origin`'s selector, then removes its mirror service.
///
/// The mirror goes whether or not the restore worked; a stray mirror keeps
/// matching shadow pods after the session is gone.
pub async fn recover_origin_service(gateway: &dyn ControlPlane, origin: &str, namespace: &str) -> OriginRecovery {
	let mut failures = Vec::new();
	let restore = match restore_original_selector(gateway, origin, namespace).await {
		Ok(restore) => {
			if restore == SelectorRestore::Restored {
				info!(target = "shunt.selector", service = %origin, "original service recovered");
			}
			Some(restore)
		}
		Err(err) => {
			error!(target = "shunt.selector", service = %origin, error = %err, "failed to recover original service selector");
			failures.push(format!("restore selector of {origin}: {err}"));
			None
		}
	};

	let mirror = mirror_service_name(origin);
	match gateway.remove_service(&mirror, namespace).await {
		Ok(()) => info!(target = "shunt.selector", service = %mirror, "mirror service removed"),
		Err(err) if err.is_not_found() => debug!(target = "shunt.selector", service = %mirror, "mirror service already absent"),
		Err(err) => {
			error!(target = "shunt.selector", service = %mirror, error = %err, "failed to remove mirror service");
			failures.push(format!("remove mirror service {mirror}: {err}"));
		}
	}

	OriginRecovery { restore, failures }
}
