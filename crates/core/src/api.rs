//! Remote device cloud REST operations.
//!
//! [`DeviceApi`] is the transport seam the lifecycle controller is built
//! on; [`HttpApi`] is the reqwest-backed production implementation. State
//! values cross this seam as raw server strings so interpretation (and
//! unknown-value rejection) stays with the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response to a successful reservation call.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
	pub id: String,
	pub state: String,
}

/// What the service did with a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
	/// Teardown accepted; the session is transitioning to CLOSING.
	Closing,
	/// The session was already closing or gone; nothing left to release.
	AlreadyClosed,
}

/// The four remote operations against a reserved device session.
#[async_trait]
pub trait DeviceApi: Send + Sync {
	/// Reserves a device of the requested operating system class.
	async fn create_session(&self, os: &str) -> Result<CreatedSession>;

	/// Fetches the current server-reported state string for a session.
	async fn session_state(&self, id: &str) -> Result<String>;

	/// Attaches a WebDriver-compatible Appium endpoint to an active session.
	async fn start_appium_server(&self, id: &str, appium_version: &str) -> Result<Url>;

	/// Requests release of a reserved session.
	async fn close_session(&self, id: &str) -> Result<CloseOutcome>;
}

/// reqwest-backed [`DeviceApi`] with HTTP Basic auth on every request.
///
/// Single-attempt primitives: no retry happens at this layer. Reservation
/// in particular is not safe to retry blindly, since a repeated create may
/// allocate a second device.
pub struct HttpApi {
	client: Client,
	base_url: String,
	username: String,
	access_key: String,
}

impl HttpApi {
	/// Builds a client for the configured service.
	pub fn new(config: Config) -> Result<Self> {
		let client = Client::builder()
			.connect_timeout(CONNECT_TIMEOUT)
			.timeout(REQUEST_TIMEOUT)
			.build()?;
		Ok(Self {
			client,
			base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
			username: config.username,
			access_key: config.access_key,
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	// every call carries Basic credentials and a JSON content type; the
	// bodied requests get theirs from `.json()`
	async fn send(&self, request: RequestBuilder) -> Result<Response> {
		let response = request
			.basic_auth(&self.username, Some(&self.access_key))
			.send()
			.await?;
		Ok(response)
	}
}

#[async_trait]
impl DeviceApi for HttpApi {
	async fn create_session(&self, os: &str) -> Result<CreatedSession> {
		let url = self.url("/sessions");
		debug!(target = "rdc.http", %url, os, "creating session");
		let body = json!({ "device": { "os": os } });
		let response = self.send(self.client.post(&url).json(&body)).await?;

		let status = response.status();
		let text = response.text().await?;
		if !status.is_success() {
			return Err(Error::Reservation(format!("status {status}: {text}")));
		}

		let created: CreatedSession = serde_json::from_str(&text)
			.map_err(|err| Error::Reservation(format!("unusable response body ({err}): {text}")))?;
		if created.id.is_empty() {
			return Err(Error::Reservation(format!("response carried no session id: {text}")));
		}
		Ok(created)
	}

	async fn session_state(&self, id: &str) -> Result<String> {
		#[derive(Deserialize)]
		struct StateBody {
			state: String,
		}

		let url = self.url(&format!("/sessions/{id}"));
		let request = self.client.get(&url).header(reqwest::header::CONTENT_TYPE, "application/json");
		let response = self.send(request).await?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(Error::Status { status, body });
		}

		let body: StateBody = response.json().await?;
		debug!(target = "rdc.http", id, state = %body.state, "fetched session state");
		Ok(body.state)
	}

	async fn start_appium_server(&self, id: &str, appium_version: &str) -> Result<Url> {
		let url = self.url(&format!("/sessions/{id}/appiumserver"));
		debug!(target = "rdc.http", %url, appium_version, "starting appium server");
		let body = json!({ "appiumVersion": appium_version });
		let response = self.send(self.client.post(&url).json(&body)).await?;

		let status = response.status();
		let text = response.text().await?;
		if !status.is_success() {
			return Err(Error::Provisioning(format!("status {status}: {text}")));
		}

		#[derive(Deserialize)]
		struct AppiumServerBody {
			url: String,
		}

		let parsed: AppiumServerBody = serde_json::from_str(&text)
			.map_err(|err| Error::Provisioning(format!("unusable response body ({err}): {text}")))?;
		Url::parse(&parsed.url)
			.map_err(|err| Error::Provisioning(format!("unusable endpoint URL {:?}: {err}", parsed.url)))
	}

	async fn close_session(&self, id: &str) -> Result<CloseOutcome> {
		let url = self.url(&format!("/sessions/{id}"));
		debug!(target = "rdc.http", %url, "closing session");
		let request = self.client.delete(&url).header(reqwest::header::CONTENT_TYPE, "application/json");
		let response = self.send(request).await?;

		let status = response.status();
		match status {
			status if status.is_success() => Ok(CloseOutcome::Closing),
			StatusCode::NOT_FOUND | StatusCode::CONFLICT | StatusCode::GONE => {
				Ok(CloseOutcome::AlreadyClosed)
			}
			status => {
				let body = response.text().await.unwrap_or_default();
				Err(Error::Status { status, body })
			}
		}
	}
}
