//! Wire and on-disk formats shared by shunt sessions.
//!
//! This crate contains the serde-serializable types a redirection session
//! leaves behind for teardown to consume: the local session runtime record and
//! the annotation formats written onto cluster objects.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond encoding/decoding and naming rules
//! * Stable: Changes only when a session's persisted format changes
//!
//! Lifecycle and recovery logic is built on top of these types in `shunt`.

pub mod annotations;
pub mod names;
pub mod session;

pub use annotations::*;
pub use names::*;
pub use session::*;
