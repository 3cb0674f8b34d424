use std::path::Path;
use std::sync::Arc;

use shunt::{LocalResolver, StageStatus, Teardown};
use shunt_runtime::{ClusterSnapshot, MemoryCluster};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::CleanArgs;
use crate::config::{ConfigOverrides, ShuntConfig};
use crate::error::{CliError, Result};
use crate::output::{Artifact, ArtifactType, CleanData, CommandInputs, CommandResult, DiagnosticLevel, ResultBuilder};

use super::{read_session, summarize};

pub(super) async fn run(args: CleanArgs, home: &Path, cancel: CancellationToken) -> Result<CommandResult<CleanData>> {
	let builder = ResultBuilder::new("clean").inputs(CommandInputs {
		session: args.session.clone(),
		cluster: Some(args.cluster.clone()),
	});

	let config = ShuntConfig::load(home)?.with_overrides(ConfigOverrides {
		recover_wait_time: args.recover_wait_time,
		hosts_file: args.hosts_file,
		resolver_dir: args.resolver_dir,
	});
	let state = read_session(&args.session)?;
	let cluster = Arc::new(MemoryCluster::from_snapshot(read_snapshot(&args.cluster)?));

	let teardown = Teardown::new(cluster.clone(), config.teardown_config(home))
		.with_resolver(Arc::new(LocalResolver::new(&config.hosts_file, &config.resolver_dir)))
		.with_cancellation(cancel);
	let report = teardown.run(&state).await;
	let calls = cluster.take_calls();
	info!(target = "shunt.cli", calls = calls.len(), clean = report.is_clean(), "teardown finished");

	let mut builder = builder.config(config.effective(home));
	for stage in &report.stages {
		match &stage.status {
			StageStatus::Degraded { failures } => {
				for failure in failures {
					builder = builder.diagnostic(DiagnosticLevel::Warning, failure, stage.stage.as_str());
				}
			}
			StageStatus::Failed { error } => {
				builder = builder.diagnostic(DiagnosticLevel::Error, error, stage.stage.as_str());
			}
			StageStatus::Completed | StageStatus::Skipped => {}
		}
	}

	if args.write_back {
		let size = write_snapshot(&args.cluster, &cluster.snapshot())?;
		builder = builder.artifact(Artifact {
			artifact_type: ArtifactType::Snapshot,
			path: args.cluster.clone(),
			size_bytes: size,
		});
	}

	Ok(builder
		.data(CleanData {
			session: summarize(&state),
			report,
			calls,
			wrote_back: args.write_back,
		})
		.build())
}

fn read_snapshot(path: &Path) -> Result<ClusterSnapshot> {
	let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	serde_json::from_str(&content).map_err(|source| CliError::Snapshot {
		path: path.to_path_buf(),
		source,
	})
}

fn write_snapshot(path: &Path, snapshot: &ClusterSnapshot) -> Result<u64> {
	let json = serde_json::to_string_pretty(snapshot)?;
	std::fs::write(path, &json).map_err(|source| CliError::Write {
		path: path.to_path_buf(),
		source,
	})?;
	Ok(json.len() as u64)
}
