//! Session lifecycle orchestration: create, wait, provision, release.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{CloseOutcome, DeviceApi};
use crate::error::{Error, Result};
use crate::poll::poll_until;
use crate::session::Session;
use crate::state::SessionState;

/// Default pause between state polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default bound for a session to reach ACTIVE after reservation.
pub const DEFAULT_ACTIVE_TIMEOUT: Duration = Duration::from_secs(180);
/// Default bound for a session to reach CLOSED after release.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Parameters for one full lifecycle run.
#[derive(Debug, Clone)]
pub struct RunRequest {
	/// Device operating system class to reserve, e.g. "Android".
	pub os: String,
	/// Appium version attached to the session.
	pub appium_version: String,
	/// Bound for the session to reach ACTIVE.
	pub active_timeout: Duration,
	/// Bound for the session to reach CLOSED after release.
	pub close_timeout: Duration,
}

impl RunRequest {
	/// Builds a request for the given device OS class with default bounds.
	pub fn new(os: impl Into<String>) -> Self {
		Self {
			os: os.into(),
			appium_version: "latest".to_string(),
			active_timeout: DEFAULT_ACTIVE_TIMEOUT,
			close_timeout: DEFAULT_CLOSE_TIMEOUT,
		}
	}

	/// Sets the Appium version requested for the session.
	pub fn with_appium_version(mut self, version: impl Into<String>) -> Self {
		self.appium_version = version.into();
		self
	}

	/// Sets the activation bound.
	pub fn with_active_timeout(mut self, timeout: Duration) -> Self {
		self.active_timeout = timeout;
		self
	}

	/// Sets the close-confirmation bound.
	pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
		self.close_timeout = timeout;
		self
	}
}

/// Owns the full life of one reserved device session.
///
/// The controller never computes or predicts transitions locally; it only
/// observes server-reported state through polling. All operations are
/// single-attempt; retries, if wanted, are a caller-level policy.
pub struct SessionController<A> {
	api: A,
	poll_interval: Duration,
}

impl<A: DeviceApi> SessionController<A> {
	/// Creates a controller over the given API with the default poll interval.
	pub fn new(api: A) -> Self {
		Self { api, poll_interval: DEFAULT_POLL_INTERVAL }
	}

	/// Overrides the pause between state polls.
	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;
		self
	}

	/// Reserves a device and returns the session in its initial
	/// server-reported state (normally PENDING).
	///
	/// A failed reservation surfaces immediately; it is not retried, since a
	/// blind retry may allocate a second device.
	pub async fn create(&self, os: &str) -> Result<Session> {
		let created = self.api.create_session(os).await?;
		if created.id.is_empty() {
			return Err(Error::Reservation("service returned an empty session id".to_string()));
		}
		let state = SessionState::parse(&created.state)?;
		info!(target = "rdc.session", id = %created.id, %state, "session reserved");
		Ok(Session::new(created.id, state))
	}

	/// Polls until the session reports `target`, the bound elapses, or the
	/// server reports a state outside the known set.
	///
	/// An ERRORED observation while waiting for a different target is
	/// treated like any other non-matching state and keeps polling until
	/// the bound.
	pub async fn wait_for_state(
		&self,
		session: &mut Session,
		target: SessionState,
		timeout: Duration,
	) -> Result<()> {
		debug!(target = "rdc.session", id = session.id(), %target, ?timeout, "waiting for state");
		let api = &self.api;
		let id = session.id().to_owned();
		let last_observed = Mutex::new(session.state());

		let outcome = poll_until(self.poll_interval, timeout, || {
			let id = id.clone();
			let last_observed = &last_observed;
			async move {
				let raw = api.session_state(&id).await?;
				let state = SessionState::parse(&raw)?;
				debug!(target = "rdc.session", id = %id, %state, "observed state");
				*last_observed.lock() = state;
				Ok::<_, Error>((state == target).then_some(()))
			}
		})
		.await;

		session.observe(*last_observed.lock());
		match outcome? {
			Some(()) => Ok(()),
			None => {
				warn!(
					target = "rdc.session",
					id = session.id(),
					%target,
					last = %session.state(),
					"state wait timed out"
				);
				Err(Error::Timeout { target, waited: timeout })
			}
		}
	}

	/// Attaches an Appium endpoint to the session and records its URL.
	///
	/// The session must already be ACTIVE; that precondition is the
	/// caller's to uphold and the server rejects premature calls.
	pub async fn start_appium_server(
		&self,
		session: &mut Session,
		appium_version: &str,
	) -> Result<Url> {
		let url = self.api.start_appium_server(session.id(), appium_version).await?;
		session.set_appium_url(url.clone());
		info!(target = "rdc.session", id = session.id(), %url, "appium server ready");
		Ok(url)
	}

	/// Requests release of the session.
	///
	/// Safe to call unconditionally during failure unwinding: a session
	/// already closing or closed is tolerated with a warning, and only
	/// genuine transport or service failures surface.
	pub async fn close(&self, session: &mut Session) -> Result<()> {
		match self.api.close_session(session.id()).await? {
			CloseOutcome::Closing => {
				session.observe(SessionState::Closing);
				info!(target = "rdc.session", id = session.id(), "session release requested");
			}
			CloseOutcome::AlreadyClosed => {
				warn!(target = "rdc.session", id = session.id(), "session already closing or closed");
			}
		}
		Ok(())
	}

	/// Runs the full lifecycle protocol around `automation`:
	/// create, wait ACTIVE, attach Appium, run `automation` with the
	/// endpoint, then close and wait CLOSED.
	///
	/// Once a session identifier exists the release step runs on every exit
	/// path. If the run already failed, a failure during release is logged
	/// and the original error is kept; if the run succeeded, a release
	/// failure surfaces so a leaked device does not go unnoticed. When
	/// creation itself fails there is nothing to release.
	pub async fn run<T, F, Fut>(&self, request: &RunRequest, automation: F) -> Result<T>
	where
		F: FnOnce(Url) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut session = self.create(&request.os).await?;
		let outcome = self.drive(&mut session, request, automation).await;

		if let Err(cleanup) = self.release(&mut session, request.close_timeout).await {
			match &outcome {
				Ok(_) => return Err(cleanup),
				Err(original) => warn!(
					target = "rdc.session",
					id = session.id(),
					error = %cleanup,
					original = %original,
					"session release failed during error unwinding"
				),
			}
		}
		outcome
	}

	async fn drive<T, F, Fut>(
		&self,
		session: &mut Session,
		request: &RunRequest,
		automation: F,
	) -> Result<T>
	where
		F: FnOnce(Url) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		self.wait_for_state(session, SessionState::Active, request.active_timeout).await?;
		let endpoint = self.start_appium_server(session, &request.appium_version).await?;
		automation(endpoint).await
	}

	async fn release(&self, session: &mut Session, timeout: Duration) -> Result<()> {
		self.close(session).await?;
		self.wait_for_state(session, SessionState::Closed, timeout).await
	}
}
