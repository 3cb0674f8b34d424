use clap::Parser;
use shunt_cli::cli::Cli;
use shunt_cli::{commands, logging, shutdown};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let cancel = CancellationToken::new();
	shutdown::cancel_on_signal(cancel.clone())?;

	if !commands::dispatch(cli, cancel).await {
		std::process::exit(1);
	}
	Ok(())
}
