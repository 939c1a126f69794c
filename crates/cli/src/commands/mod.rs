//! CLI subcommand implementations.

mod close;
mod run;
mod status;

use anyhow::Result;

use crate::cli::Commands;

/// Routes a parsed command to its implementation.
pub async fn dispatch(command: Commands) -> Result<()> {
	match command {
		Commands::Run { os, appium_version, active_timeout, close_timeout, no_probe } => {
			run::execute(os, appium_version, active_timeout, close_timeout, no_probe).await
		}
		Commands::Status { session_id } => status::execute(&session_id).await,
		Commands::Close { session_id, wait } => close::execute(&session_id, wait).await,
	}
}
