use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "shunt")]
#[command(about = "Tear down cluster redirection sessions and inspect their recorded state")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
	pub format: OutputFormat,

	/// Shunt home directory (defaults to ~/.shunt)
	#[arg(long, global = true, value_name = "DIR")]
	pub home: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run teardown for a recorded session against a cluster snapshot
	Clean(CleanArgs),

	/// Summarise a recorded session and whether its process is still running
	Status(StatusArgs),
}

#[derive(Args, Debug)]
pub struct CleanArgs {
	/// Session runtime state file
	#[arg(long, value_name = "FILE")]
	pub session: PathBuf,

	/// Cluster snapshot to tear the session down against
	#[arg(long, value_name = "FILE")]
	pub cluster: PathBuf,

	/// Write the resulting cluster state back to the snapshot file
	#[arg(long)]
	pub write_back: bool,

	/// Seconds to wait for a scaled-down origin to recover
	#[arg(long, value_name = "SECONDS")]
	pub recover_wait_time: Option<u64>,

	/// Hosts file holding injected records
	#[arg(long, value_name = "FILE")]
	pub hosts_file: Option<PathBuf>,

	/// Directory holding injected resolver entries
	#[arg(long, value_name = "DIR")]
	pub resolver_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
	/// Session runtime state file
	#[arg(long, value_name = "FILE")]
	pub session: PathBuf,
}
