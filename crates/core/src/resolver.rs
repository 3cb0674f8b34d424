//! Host name-resolution overrides injected by connect sessions.
//!
//! Connect sessions make cluster names resolvable locally, either through a
//! marked block in the hosts file or through per-domain resolver files. This
//! module only removes them; both operations are safe to repeat and do
//! nothing when no override is present.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, ShuntError};

/// First line of the block a session appends to the hosts file.
pub const HOSTS_BEGIN_MARKER: &str = "# shunt hosts begin";
/// Last line of the hosts block.
pub const HOSTS_END_MARKER: &str = "# shunt hosts end";
/// File name prefix of resolver entries written for cluster domains.
pub const RESOLVER_FILE_PREFIX: &str = "shunt.";

pub const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";
pub const DEFAULT_RESOLVER_DIR: &str = "/etc/resolver";

/// Undoes local name-resolution changes.
pub trait NameResolver: Send + Sync {
	/// Removes injected host records. Returns whether anything was removed.
	fn drop_hosts(&self) -> Result<bool>;

	/// Removes injected resolver entries. Returns how many were removed.
	fn restore_dns_server(&self) -> Result<usize>;
}

/// [`NameResolver`] over the local hosts file and resolver directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalResolver {
	hosts_path: PathBuf,
	resolver_dir: PathBuf,
}

impl Default for LocalResolver {
	fn default() -> Self {
		Self::new(DEFAULT_HOSTS_FILE, DEFAULT_RESOLVER_DIR)
	}
}

impl LocalResolver {
	pub fn new(hosts_path: impl Into<PathBuf>, resolver_dir: impl Into<PathBuf>) -> Self {
		Self {
			hosts_path: hosts_path.into(),
			resolver_dir: resolver_dir.into(),
		}
	}

	pub fn hosts_path(&self) -> &Path {
		&self.hosts_path
	}

	pub fn resolver_dir(&self) -> &Path {
		&self.resolver_dir
	}
}

impl NameResolver for LocalResolver {
	fn drop_hosts(&self) -> Result<bool> {
		let content = match fs::read_to_string(&self.hosts_path) {
			Ok(content) => content,
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				debug!(target = "shunt.resolver", path = %self.hosts_path.display(), "hosts file absent");
				return Ok(false);
			}
			Err(err) => return Err(err.into()),
		};

		let Some(cleaned) = strip_hosts_block(&content) else {
			debug!(target = "shunt.resolver", path = %self.hosts_path.display(), "no injected hosts block");
			return Ok(false);
		};

		replace_file(&self.hosts_path, &cleaned)?;
		info!(target = "shunt.resolver", path = %self.hosts_path.display(), "injected hosts removed");
		Ok(true)
	}

	fn restore_dns_server(&self) -> Result<usize> {
		let entries = match fs::read_dir(&self.resolver_dir) {
			Ok(entries) => entries,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
			Err(err) => return Err(err.into()),
		};

		let mut removed = 0;
		let mut failed = Vec::new();
		for entry in entries.flatten() {
			let name = entry.file_name();
			let Some(name) = name.to_str() else { continue };
			if !name.starts_with(RESOLVER_FILE_PREFIX) || entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
				continue;
			}
			match fs::remove_file(entry.path()) {
				Ok(()) => removed += 1,
				Err(err) if err.kind() == io::ErrorKind::NotFound => {}
				Err(err) => {
					warn!(target = "shunt.resolver", file = %name, error = %err, "failed to remove resolver file");
					failed.push(name.to_string());
				}
			}
		}

		if !failed.is_empty() {
			return Err(ShuntError::Resolver(format!("could not remove resolver files: {}", failed.join(", "))));
		}
		if removed > 0 {
			info!(target = "shunt.resolver", removed, "resolver entries removed");
		}
		Ok(removed)
	}
}

/// Returns `content` without the marked block, or `None` if there is none.
///
/// Kept lines retain their own terminators, so CRLF files stay CRLF. An
/// unterminated block runs to the end of the file.
fn strip_hosts_block(content: &str) -> Option<String> {
	let mut cleaned = String::with_capacity(content.len());
	let mut inside = false;
	let mut found = false;

	for line in content.split_inclusive('\n') {
		match line.trim() {
			HOSTS_BEGIN_MARKER => {
				inside = true;
				found = true;
			}
			HOSTS_END_MARKER if inside => inside = false,
			_ if inside => {}
			_ => cleaned.push_str(line),
		}
	}

	if !found {
		return None;
	}
	if inside {
		warn!(target = "shunt.resolver", "hosts block has no end marker; dropped to end of file");
	}
	Some(cleaned)
}

/// Swaps `content` in for `path` through a sibling temp file and a rename, so
/// readers see either the old file or the new one. Permissions carry over.
fn replace_file(path: &Path, content: &str) -> io::Result<()> {
	let permissions = fs::metadata(path)?.permissions();
	let mut temp_name = OsString::from(".");
	temp_name.push(path.file_name().unwrap_or_default());
	temp_name.push(".shunt-tmp");
	let temp_path = path.with_file_name(temp_name);

	let written = (|| {
		let mut file = fs::File::create(&temp_path)?;
		file.write_all(content.as_bytes())?;
		file.sync_all()?;
		fs::set_permissions(&temp_path, permissions)?;
		fs::rename(&temp_path, path)
	})();
	if written.is_err() {
		let _ = fs::remove_file(&temp_path);
	}
	written
}
