//! Tunables for teardown.

use std::path::PathBuf;
use std::time::Duration;

/// Spacing between readiness polls while a scaled-down origin recovers.
pub const RECOVER_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default upper bound on waiting for a scaled-down origin to become ready.
pub const DEFAULT_RECOVER_WAIT_TIME: Duration = Duration::from_secs(120);

/// Settings a [`Teardown`](crate::Teardown) runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownConfig {
	/// Total budget for the scale-recovery wait.
	pub recover_wait_time: Duration,
	/// Directory holding pid markers and key material.
	pub home: PathBuf,
}

impl TeardownConfig {
	pub fn new(home: impl Into<PathBuf>) -> Self {
		Self {
			recover_wait_time: DEFAULT_RECOVER_WAIT_TIME,
			home: home.into(),
		}
	}

	pub fn with_recover_wait_time(mut self, wait: Duration) -> Self {
		self.recover_wait_time = wait;
		self
	}

	/// Number of readiness polls the recovery wait may make.
	pub fn recover_poll_attempts(&self) -> u64 {
		self.recover_wait_time.as_secs() / RECOVER_POLL_INTERVAL.as_secs()
	}
}
