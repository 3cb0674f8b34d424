//! Local process markers and key material left behind by sessions.

use std::io;
use std::path::{Path, PathBuf};

use shunt_protocol::Component;

/// Directory under the shunt home holding per-shadow private keys.
pub const KEY_DIR: &str = "key";

/// Pid marker written by a running session: `<home>/<component>-<pid>.pid`.
pub fn pid_file_path(home: &Path, component: Component, pid: u32) -> PathBuf {
	home.join(format!("{component}-{pid}.pid"))
}

/// Private key generated for a shadow: `<home>/key/<shadow>.key`.
pub fn key_file_path(home: &Path, shadow: &str) -> PathBuf {
	home.join(KEY_DIR).join(format!("{shadow}.key"))
}

/// Removes `path`, returning `false` when it was already gone.
pub fn remove_if_present(path: &Path) -> io::Result<bool> {
	match std::fs::remove_file(path) {
		Ok(()) => Ok(true),
		Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
		Err(err) => Err(err),
	}
}

/// Returns `true` when a process with `pid` appears alive on this platform.
pub fn pid_is_alive(pid: u32) -> bool {
	if pid == std::process::id() {
		return true;
	}

	#[cfg(unix)]
	{
		if pid == 0 {
			return false;
		}

		if PathBuf::from("/proc").join(pid.to_string()).exists() {
			return true;
		}

		std::process::Command::new("kill")
			.arg("-0")
			.arg(pid.to_string())
			.status()
			.map(|status| status.success())
			.unwrap_or(false)
	}

	#[cfg(windows)]
	{
		let filter = format!("PID eq {pid}");
		std::process::Command::new("tasklist")
			.args(["/FI", &filter, "/FO", "CSV", "/NH"])
			.output()
			.map(|output| output.status.success() && tasklist_has_pid(&String::from_utf8_lossy(&output.stdout), pid))
			.unwrap_or(false)
	}

	#[cfg(not(any(unix, windows)))]
	{
		false
	}
}

#[cfg(any(test, windows))]
fn tasklist_has_pid(output: &str, pid: u32) -> bool {
	let pid_str = pid.to_string();
	output.lines().any(|line| {
		let line = line.trim();
		if !line.starts_with('"') {
			return false;
		}

		line.trim_matches('"')
			.split("\",\"")
			.nth(1)
			.is_some_and(|field| field.trim() == pid_str.as_str())
	})
}
