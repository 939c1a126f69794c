//! Releases a session by id, e.g. one leaked by an interrupted run.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use rdc::{CloseOutcome, Config, DEFAULT_POLL_INTERVAL, DeviceApi, HttpApi, SessionState, poll_until};
use tracing::{info, warn};

pub async fn execute(session_id: &str, wait: u64) -> Result<()> {
	let config = Config::from_env().context("loading device cloud configuration")?;
	let api = HttpApi::new(config)?;

	match api.close_session(session_id).await? {
		CloseOutcome::Closing => {
			info!(target = "rdc", session_id, "session release requested");
		}
		CloseOutcome::AlreadyClosed => {
			warn!(target = "rdc", session_id, "session already closing or closed");
		}
	}

	if wait > 0 {
		let confirmed = poll_until(DEFAULT_POLL_INTERVAL, Duration::from_secs(wait), || {
			let api = &api;
			async move {
				let raw = api.session_state(session_id).await?;
				let state = SessionState::parse(&raw)?;
				Ok::<_, rdc::Error>((state == SessionState::Closed).then_some(()))
			}
		})
		.await?;
		if confirmed.is_none() {
			bail!("session {session_id} did not reach CLOSED within {wait}s");
		}
		info!(target = "rdc", session_id, "session confirmed closed");
	}
	Ok(())
}
