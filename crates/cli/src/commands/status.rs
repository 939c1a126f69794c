//! One-shot session state query.

use anyhow::{Context, Result};
use rdc::{Config, DeviceApi, HttpApi, SessionState};

pub async fn execute(session_id: &str) -> Result<()> {
	let config = Config::from_env().context("loading device cloud configuration")?;
	let api = HttpApi::new(config)?;

	let raw = api.session_state(session_id).await?;
	let state = SessionState::parse(&raw)?;
	println!("{state}");
	Ok(())
}
