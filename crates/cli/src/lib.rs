//! Command line surface for shunt.
//!
//! `shunt clean` rehearses a session's teardown against a JSON cluster
//! snapshot and reports every control-plane call it made. `shunt status`
//! summarises a recorded session.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod shutdown;
