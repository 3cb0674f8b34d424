//! Per-mode recovery of cluster targets a session mutated.
//!
//! Exchange sessions took over an origin by scaling it down, by redirecting
//! its service selector, or by attaching an ephemeral container. Mesh sessions
//! share a router pod that fronts the origin service. Each module here reverses
//! one of those, tolerating objects that already vanished.

pub mod exchange;
pub mod mesh;

pub use exchange::{ExchangeRecovery, RecoveryWait, recover_exchanged_target, wait_deployment_recover};
pub use mesh::{MeshRecovery, recover_mesh_route};
