use std::path::Path;

use shunt_runtime::process::{pid_file_path, pid_is_alive};

use crate::cli::StatusArgs;
use crate::error::Result;
use crate::output::{CommandInputs, CommandResult, ResultBuilder, StatusData};

use super::{read_session, summarize};

pub(super) fn run(args: StatusArgs, home: &Path) -> Result<CommandResult<StatusData>> {
	let state = read_session(&args.session)?;
	let pid = state.pid;

	Ok(ResultBuilder::new("status")
		.inputs(CommandInputs {
			session: args.session,
			cluster: None,
		})
		.data(StatusData {
			session: summarize(&state),
			pid,
			alive: pid.is_some_and(pid_is_alive),
			pid_file_present: pid.is_some_and(|pid| pid_file_path(home, state.component, pid).exists()),
		})
		.build())
}
