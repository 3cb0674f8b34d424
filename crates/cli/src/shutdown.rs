//! Turns Ctrl-C and SIGTERM into teardown cancellation.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancels `token` on the first Ctrl-C or SIGTERM.
///
/// Handlers are installed before this returns, so a signal that arrives while
/// teardown is running is never missed.
pub fn cancel_on_signal(token: CancellationToken) -> anyhow::Result<()> {
	#[cfg(unix)]
	let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).context("failed to install SIGTERM handler")?;

	tokio::spawn(async move {
		#[cfg(unix)]
		let terminated = async move {
			terminate.recv().await;
		};
		#[cfg(not(unix))]
		let terminated = std::future::pending::<()>();

		tokio::select! {
			result = tokio::signal::ctrl_c() => {
				if let Err(err) = result {
					warn!(target = "shunt.signal", error = %err, "failed to listen for Ctrl-C");
					return;
				}
			}
			_ = terminated => {}
		}

		warn!(target = "shunt.signal", "termination requested; cutting recovery wait short");
		token.cancel();
	});

	Ok(())
}
