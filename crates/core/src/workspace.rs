//! Local files a session leaves under the shunt home directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use shunt_protocol::SessionRuntimeState;
use shunt_runtime::process::{key_file_path, pid_file_path, remove_if_present};
use tracing::{debug, info, warn};

/// Files removed for one session, and the ones that could not be.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCleanup {
	pub removed: Vec<PathBuf>,
	pub failed: Vec<(PathBuf, String)>,
}

/// The shunt home directory holding pid markers and key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalWorkspace {
	home: PathBuf,
}

impl LocalWorkspace {
	pub fn new(home: impl Into<PathBuf>) -> Self {
		Self { home: home.into() }
	}

	pub fn home(&self) -> &Path {
		&self.home
	}

	/// Removes the session's pid marker and every shadow's key file.
	///
	/// Files that are already gone count as cleaned.
	pub fn clean(&self, state: &SessionRuntimeState) -> LocalCleanup {
		let mut cleanup = LocalCleanup::default();

		match state.pid {
			Some(pid) => self.remove(pid_file_path(&self.home, state.component, pid), "pid", &mut cleanup),
			None => debug!(target = "shunt.workspace", component = %state.component, "no pid recorded; skipping pid marker"),
		}

		for shadow in state.shadow.iter() {
			self.remove(key_file_path(&self.home, shadow), "key", &mut cleanup);
		}

		cleanup
	}

	fn remove(&self, path: PathBuf, what: &str, cleanup: &mut LocalCleanup) {
		match remove_if_present(&path) {
			Ok(true) => {
				info!(target = "shunt.workspace", path = %path.display(), "removed {what} file");
				cleanup.removed.push(path);
			}
			Ok(false) => debug!(target = "shunt.workspace", path = %path.display(), "{what} file does not exist"),
			Err(err) => {
				warn!(target = "shunt.workspace", path = %path.display(), error = %err, "failed to remove {what} file");
				cleanup.failed.push((path, err.to_string()));
			}
		}
	}
}
