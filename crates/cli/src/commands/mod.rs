mod clean;
mod status;

use std::path::Path;

use serde::Serialize;
use shunt_protocol::SessionRuntimeState;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::resolve_home;
use crate::error::{CliError, Result};
use crate::output::{CommandResult, OutputFormat, ResultBuilder, SessionSummary, print_error_stderr, print_result};

/// Runs the parsed command, prints its envelope, and reports whether it succeeded.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> bool {
	let format = cli.format;
	let home = match resolve_home(cli.home) {
		Ok(home) => home,
		Err(err) => return emit_failure(command_name(&cli.command), err, format),
	};
	debug!(target = "shunt.cli", home = %home.display(), "resolved shunt home");

	match cli.command {
		Commands::Clean(args) => match clean::run(args, &home, cancel).await {
			Ok(result) => emit(&result, format),
			Err(err) => emit_failure("clean", err, format),
		},
		Commands::Status(args) => match status::run(args, &home) {
			Ok(result) => emit(&result, format),
			Err(err) => emit_failure("status", err, format),
		},
	}
}

fn command_name(command: &Commands) -> &'static str {
	match command {
		Commands::Clean(_) => "clean",
		Commands::Status(_) => "status",
	}
}

fn emit<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) -> bool {
	print_result(result, format);
	result.ok
}

fn emit_failure(command: &str, err: CliError, format: OutputFormat) -> bool {
	let result: CommandResult<()> = ResultBuilder::new(command).error(err.code(), err.to_string()).build();
	if format == OutputFormat::Text {
		if let Some(ref error) = result.error {
			print_error_stderr(error);
		}
		return false;
	}
	print_result(&result, format);
	false
}

pub(crate) fn read_session(path: &Path) -> Result<SessionRuntimeState> {
	let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	SessionRuntimeState::from_json(&content).map_err(|source| CliError::Session {
		path: path.to_path_buf(),
		source,
	})
}

pub(crate) fn summarize(state: &SessionRuntimeState) -> SessionSummary {
	SessionSummary {
		component: state.component,
		namespace: state.namespace.clone(),
		exchange_mode: state.exchange_mode,
		mesh_mode: state.mesh_mode,
		dns_mode: state.dns_mode,
		shadows: state.shadow.iter().map(str::to_string).collect(),
		shared_shadow: state.shared_shadow,
		origin: state.origin.clone(),
		router: state.router.clone(),
	}
}
