//! Lifecycle and recovery engine for shunt redirection sessions.
//!
//! A session leaves cluster-side artifacts behind: shadow workloads, rewritten
//! service selectors, shared router pods. Several sessions may share one
//! artifact, and any of them may already be gone by the time teardown runs.
//! This crate undoes a session's changes from its recorded
//! [`SessionRuntimeState`](shunt_protocol::SessionRuntimeState):
//!
//! * [`refcount`]: last-holder detection for shared workloads
//! * [`selector`]: restore of backed-up service selectors
//! * [`recovery`]: exchange and mesh specific recovery
//! * [`teardown`]: the ordered, best-effort stage runner
//!
//! All cluster access goes through an injected
//! [`ControlPlane`](shunt_runtime::ControlPlane).

pub mod config;
pub mod error;
pub mod recovery;
pub mod refcount;
pub mod resolver;
pub mod selector;
pub mod teardown;
pub mod workspace;

pub use config::{DEFAULT_RECOVER_WAIT_TIME, RECOVER_POLL_INTERVAL, TeardownConfig};
pub use error::{Result, ShuntError};
pub use recovery::{ExchangeRecovery, MeshRecovery, RecoveryWait};
pub use refcount::{RefRelease, SharedKind, SharedRefs};
pub use resolver::{LocalResolver, NameResolver};
pub use selector::{OriginRecovery, SelectorRestore, recover_origin_service, restore_original_selector};
pub use teardown::{Stage, StageReport, StageStatus, Teardown, TeardownReport};
pub use workspace::{LocalCleanup, LocalWorkspace};
