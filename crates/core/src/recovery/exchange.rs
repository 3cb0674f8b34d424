//! Exchange recovery: give the origin its traffic back.

use std::sync::Arc;

use serde::Serialize;
use shunt_protocol::{ExchangeMode, SessionRuntimeState};
use shunt_runtime::ControlPlane;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{RECOVER_POLL_INTERVAL, TeardownConfig};
use crate::selector::{OriginRecovery, recover_origin_service};

/// How the wait for a rescaled origin ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RecoveryWait {
	/// Ready replicas matched the recorded count.
	Ready { polls: u64 },
	/// Poll budget ran out first.
	TimedOut { polls: u64 },
	/// The deployment could not be read; polling stopped early.
	Unavailable { polls: u64 },
	/// An external termination request cut the wait short.
	Cancelled,
}

impl RecoveryWait {
	/// Why the origin is not known to be back, if it is not.
	pub fn failure(&self) -> Option<String> {
		match *self {
			RecoveryWait::TimedOut { polls } => Some(format!("origin not ready after {polls} polls")),
			RecoveryWait::Unavailable { polls } => Some(format!("origin unreadable at poll {polls}")),
			RecoveryWait::Ready { .. } | RecoveryWait::Cancelled => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ExchangeRecovery {
	/// The session exited before any target was exchanged.
	NotExchanged,
	Scale {
		#[serde(skip_serializing_if = "Option::is_none")]
		scale_error: Option<String>,
		wait: RecoveryWait,
	},
	Selector {
		#[serde(flatten)]
		origin: OriginRecovery,
	},
	/// Nothing to revert on the target; the exchange container is detached
	/// with the shadow cleanup.
	Ephemeral,
}

impl ExchangeRecovery {
	/// Steps that did not go through.
	pub fn failures(&self) -> Vec<String> {
		match self {
			ExchangeRecovery::Scale { scale_error, wait } => scale_error.iter().cloned().chain(wait.failure()).collect(),
			ExchangeRecovery::Selector { origin } => origin.failures.clone(),
			ExchangeRecovery::NotExchanged | ExchangeRecovery::Ephemeral => Vec::new(),
		}
	}
}

/// Reverses the exchange recorded in `state`.
///
/// For scale exchanges this blocks until the origin is ready again, the poll
/// budget in `config` runs out, or `cancel` fires, whichever comes first.
/// Failed steps are logged and carried in the returned recovery.
pub async fn recover_exchanged_target(
	gateway: Arc<dyn ControlPlane>,
	state: &SessionRuntimeState,
	config: &TeardownConfig,
	cancel: &CancellationToken,
) -> ExchangeRecovery {
	let Some(origin) = state.origin.as_deref() else {
		debug!(target = "shunt.exchange", "session ended before target was exchanged");
		return ExchangeRecovery::NotExchanged;
	};
	let namespace = state.namespace.as_str();

	match state.exchange_mode.unwrap_or(ExchangeMode::Selector) {
		ExchangeMode::Scale => {
			info!(target = "shunt.exchange", deployment = %origin, replicas = state.origin_replicas, "recovering origin deployment");
			let scale_error = match gateway.scale_deployment(origin, namespace, state.origin_replicas).await {
				Ok(()) => None,
				Err(err) => {
					error!(
						target = "shunt.exchange",
						deployment = %origin,
						replicas = state.origin_replicas,
						error = %err,
						"failed to scale origin deployment"
					);
					Some(format!("scale {origin} to {}: {err}", state.origin_replicas))
				}
			};

			let mut task = tokio::spawn(wait_deployment_recover(
				Arc::clone(&gateway),
				origin.to_string(),
				namespace.to_string(),
				state.origin_replicas,
				config.recover_poll_attempts(),
			));

			let wait = tokio::select! {
				joined = &mut task => joined.unwrap_or_else(|err| {
					warn!(target = "shunt.exchange", error = %err, "recovery wait task ended abnormally");
					RecoveryWait::Unavailable { polls: 0 }
				}),
				_ = cancel.cancelled() => {
					task.abort();
					warn!(target = "shunt.exchange", deployment = %origin, "stopped waiting for origin deployment to recover");
					RecoveryWait::Cancelled
				}
			};

			ExchangeRecovery::Scale { scale_error, wait }
		}
		ExchangeMode::Selector => ExchangeRecovery::Selector {
			origin: recover_origin_service(gateway.as_ref(), origin, namespace).await,
		},
		ExchangeMode::Ephemeral => ExchangeRecovery::Ephemeral,
	}
}

/// Polls `deployment` until its ready replicas equal `replicas`.
///
/// Makes at most `attempts` reads spaced by [`RECOVER_POLL_INTERVAL`] and never
/// sleeps after the final one.
pub async fn wait_deployment_recover(gateway: Arc<dyn ControlPlane>, deployment: String, namespace: String, replicas: i32, attempts: u64) -> RecoveryWait {
	for poll in 1..=attempts {
		match gateway.get_deployment(&deployment, &namespace).await {
			Ok(current) if current.status.ready_replicas == replicas => {
				info!(target = "shunt.exchange", %deployment, polls = poll, "origin deployment recovered");
				return RecoveryWait::Ready { polls: poll };
			}
			Ok(current) => {
				info!(
					target = "shunt.exchange",
					%deployment,
					ready = current.status.ready_replicas,
					wanted = replicas,
					"waiting for deployment to recover"
				);
				if poll < attempts {
					tokio::time::sleep(RECOVER_POLL_INTERVAL).await;
				}
			}
			Err(err) => {
				error!(target = "shunt.exchange", %deployment, error = %err, "cannot fetch origin deployment");
				return RecoveryWait::Unavailable { polls: poll };
			}
		}
	}

	warn!(target = "shunt.exchange", %deployment, "deployment recover timeout");
	RecoveryWait::TimedOut { polls: attempts }
}
