//! Control-plane boundary for shunt sessions.
//!
//! [`ControlPlane`] is the only way lifecycle code talks to a cluster. Updates
//! through it are version-checked, so concurrent read-modify-write cycles from
//! separate processes surface as [`ClusterError::Conflict`] instead of lost
//! writes. [`MemoryCluster`] implements the contract in memory for tests and
//! rehearsals.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod objects;
pub mod process;

pub use error::{ClusterError, ClusterResult, ResourceKind};
pub use gateway::ControlPlane;
pub use memory::{CallRecord, ClusterSnapshot, MemoryCluster, Operation};
pub use objects::*;
