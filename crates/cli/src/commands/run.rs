//! Full lifecycle demo: reserve, wait, provision, exercise, release.

use std::time::Duration;

use anyhow::{Context, Result};
use rdc::{Config, HttpApi, RunRequest, SessionController};
use tracing::info;
use url::Url;

pub async fn execute(
	os: String,
	appium_version: String,
	active_timeout: u64,
	close_timeout: u64,
	no_probe: bool,
) -> Result<()> {
	let config = Config::from_env().context("loading device cloud configuration")?;
	let api = HttpApi::new(config)?;
	let controller = SessionController::new(api);

	let request = RunRequest::new(os)
		.with_appium_version(appium_version)
		.with_active_timeout(Duration::from_secs(active_timeout))
		.with_close_timeout(Duration::from_secs(close_timeout));

	let endpoint = controller
		.run(&request, |endpoint| async move {
			if !no_probe {
				probe_webdriver_status(&endpoint).await?;
			}
			Ok(endpoint)
		})
		.await?;

	// the endpoint outlives this process only as output for downstream
	// automation clients; the reserved session itself is already released
	println!("{endpoint}");
	Ok(())
}

/// Issues a WebDriver `GET /status` against the Appium endpoint as a smoke
/// check. Driving the device beyond that is a downstream client's job.
async fn probe_webdriver_status(endpoint: &Url) -> rdc::Result<()> {
	let url = format!("{}/status", endpoint.as_str().trim_end_matches('/'));
	info!(target = "rdc", %url, "probing appium endpoint");
	let response = reqwest::get(&url).await?.error_for_status()?;
	info!(target = "rdc", status = %response.status(), "appium endpoint answered");
	Ok(())
}
