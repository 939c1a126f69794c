//! Lifecycle controller scenarios against a scripted in-memory service.
//!
//! Runs under a paused tokio clock, so minute-scale activation bounds
//! complete instantly while elapsed-time assertions stay exact.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rdc::{
	CloseOutcome, CreatedSession, DeviceApi, Error, RunRequest, SessionController, SessionState,
};
use reqwest::StatusCode;
use tokio::time::Instant;
use url::Url;

const APPIUM_URL: &str = "http://127.0.0.1:4723/wd/hub";

#[derive(Clone)]
enum CloseBehavior {
	Succeed,
	AlreadyClosed,
	Fail,
}

struct Inner {
	create: Option<CreatedSession>,
	states: VecDeque<String>,
	appium_url: Option<String>,
	close: CloseBehavior,
	calls: Vec<String>,
}

/// Scripted [`DeviceApi`] double: canned responses in, recorded calls out.
/// The last scripted state repeats for every further poll.
#[derive(Clone)]
struct FakeDeviceApi {
	inner: Arc<Mutex<Inner>>,
}

impl FakeDeviceApi {
	fn new() -> Self {
		Self {
			inner: Arc::new(Mutex::new(Inner {
				create: Some(CreatedSession { id: "abc123".to_string(), state: "PENDING".to_string() }),
				states: VecDeque::new(),
				appium_url: Some(APPIUM_URL.to_string()),
				close: CloseBehavior::Succeed,
				calls: Vec::new(),
			})),
		}
	}

	fn with_states<const N: usize>(self, states: [&str; N]) -> Self {
		self.inner.lock().unwrap().states = states.iter().map(|s| s.to_string()).collect();
		self
	}

	fn without_create(self) -> Self {
		self.inner.lock().unwrap().create = None;
		self
	}

	fn with_create(self, id: &str, state: &str) -> Self {
		self.inner.lock().unwrap().create =
			Some(CreatedSession { id: id.to_string(), state: state.to_string() });
		self
	}

	fn without_appium(self) -> Self {
		self.inner.lock().unwrap().appium_url = None;
		self
	}

	fn with_close(self, close: CloseBehavior) -> Self {
		self.inner.lock().unwrap().close = close;
		self
	}

	fn calls(&self) -> Vec<String> {
		self.inner.lock().unwrap().calls.clone()
	}

	fn state_polls(&self) -> usize {
		self.calls().iter().filter(|call| call.starts_with("state:")).count()
	}
}

#[async_trait]
impl DeviceApi for FakeDeviceApi {
	async fn create_session(&self, os: &str) -> rdc::Result<CreatedSession> {
		let mut inner = self.inner.lock().unwrap();
		inner.calls.push(format!("create:{os}"));
		match &inner.create {
			Some(created) => Ok(created.clone()),
			None => Err(Error::Reservation(
				"status 500 Internal Server Error: device pool exhausted".to_string(),
			)),
		}
	}

	async fn session_state(&self, id: &str) -> rdc::Result<String> {
		let mut inner = self.inner.lock().unwrap();
		inner.calls.push(format!("state:{id}"));
		let state = if inner.states.len() > 1 {
			inner.states.pop_front().unwrap()
		} else {
			inner.states.front().cloned().unwrap_or_else(|| "ERRORED".to_string())
		};
		Ok(state)
	}

	async fn start_appium_server(&self, id: &str, appium_version: &str) -> rdc::Result<Url> {
		let mut inner = self.inner.lock().unwrap();
		inner.calls.push(format!("appium:{id}:{appium_version}"));
		match &inner.appium_url {
			Some(url) => Ok(Url::parse(url).unwrap()),
			None => Err(Error::Provisioning(
				"status 500 Internal Server Error: no emulator slot".to_string(),
			)),
		}
	}

	async fn close_session(&self, id: &str) -> rdc::Result<CloseOutcome> {
		let mut inner = self.inner.lock().unwrap();
		inner.calls.push(format!("close:{id}"));
		match inner.close {
			CloseBehavior::Succeed => Ok(CloseOutcome::Closing),
			CloseBehavior::AlreadyClosed => Ok(CloseOutcome::AlreadyClosed),
			CloseBehavior::Fail => Err(Error::Status {
				status: StatusCode::SERVICE_UNAVAILABLE,
				body: "maintenance".to_string(),
			}),
		}
	}
}

fn controller(api: &FakeDeviceApi) -> SessionController<FakeDeviceApi> {
	SessionController::new(api.clone())
}

#[tokio::test(start_paused = true)]
async fn reserve_then_wait_until_active() {
	let api = FakeDeviceApi::new().with_states(["CREATING", "CREATING", "ACTIVE"]);
	let controller = controller(&api);

	let mut session = controller.create("Android").await.unwrap();
	assert_eq!(session.id(), "abc123");
	assert_eq!(session.state(), SessionState::Pending);

	let started = Instant::now();
	controller
		.wait_for_state(&mut session, SessionState::Active, Duration::from_secs(180))
		.await
		.unwrap();
	assert_eq!(session.state(), SessionState::Active);
	// two pending probes, then the match on the third
	assert_eq!(started.elapsed(), Duration::from_secs(10));
	assert_eq!(api.state_polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn create_never_yields_a_session_with_an_empty_id() {
	let api = FakeDeviceApi::new().with_create("", "PENDING");
	let controller = controller(&api);

	let err = controller.create("Android").await.unwrap_err();
	assert!(matches!(err, Error::Reservation(_)), "got: {err:?}");
}

#[tokio::test(start_paused = true)]
async fn create_rejects_an_out_of_set_initial_state() {
	let api = FakeDeviceApi::new().with_create("abc123", "PROVISIONING");
	let controller = controller(&api);

	let err = controller.create("Android").await.unwrap_err();
	assert!(matches!(err, Error::UnknownState { .. }), "got: {err:?}");
}

#[tokio::test(start_paused = true)]
async fn activation_wait_times_out_when_state_never_advances() {
	let api = FakeDeviceApi::new().with_states(["CREATING"]);
	let controller = controller(&api);

	let mut session = controller.create("Android").await.unwrap();
	let started = Instant::now();
	let err = controller
		.wait_for_state(&mut session, SessionState::Active, Duration::from_secs(60))
		.await
		.unwrap_err();

	match err {
		Error::Timeout { target, waited } => {
			assert_eq!(target, SessionState::Active);
			assert_eq!(waited, Duration::from_secs(60));
		}
		other => panic!("expected Timeout, got {other:?}"),
	}
	let waited = started.elapsed();
	assert!(waited >= Duration::from_secs(60), "waited only {waited:?}");
	assert!(waited < Duration::from_secs(65), "waited {waited:?}");
	// probes at t = 0, 5, ..., 60
	assert_eq!(api.state_polls(), 13);
	assert_eq!(session.state(), SessionState::Creating);
}

#[tokio::test(start_paused = true)]
async fn unknown_state_fails_fast_instead_of_polling_until_timeout() {
	let api = FakeDeviceApi::new().with_states(["UNKNOWN_FOO"]);
	let controller = controller(&api);

	let mut session = controller.create("Android").await.unwrap();
	let started = Instant::now();
	let err = controller
		.wait_for_state(&mut session, SessionState::Active, Duration::from_secs(60))
		.await
		.unwrap_err();

	match err {
		Error::UnknownState { value } => assert_eq!(value, "UNKNOWN_FOO"),
		other => panic!("expected UnknownState, got {other:?}"),
	}
	assert_eq!(started.elapsed(), Duration::ZERO);
	assert_eq!(api.state_polls(), 1);
}

#[tokio::test(start_paused = true)]
async fn errored_observation_keeps_polling_until_the_bound() {
	let api = FakeDeviceApi::new().with_states(["ERRORED"]);
	let controller = controller(&api);

	let mut session = controller.create("Android").await.unwrap();
	let err = controller
		.wait_for_state(&mut session, SessionState::Active, Duration::from_secs(30))
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Timeout { target: SessionState::Active, .. }));
	// probes at t = 0, 5, ..., 30
	assert_eq!(api.state_polls(), 7);
	assert_eq!(session.state(), SessionState::Errored);
}

#[tokio::test(start_paused = true)]
async fn close_tolerates_an_already_closing_session() {
	let api = FakeDeviceApi::new().with_close(CloseBehavior::AlreadyClosed);
	let controller = controller(&api);

	let mut session = controller.create("Android").await.unwrap();
	controller.close(&mut session).await.unwrap();
	controller.close(&mut session).await.unwrap();
	assert_eq!(api.calls().iter().filter(|c| c.starts_with("close:")).count(), 2);
}

#[tokio::test(start_paused = true)]
async fn close_propagates_genuine_service_failures() {
	let api = FakeDeviceApi::new().with_close(CloseBehavior::Fail);
	let controller = controller(&api);

	let mut session = controller.create("Android").await.unwrap();
	let err = controller.close(&mut session).await.unwrap_err();
	assert!(matches!(err, Error::Status { .. }));
}

#[tokio::test(start_paused = true)]
async fn run_drives_the_full_protocol_in_order() {
	let api = FakeDeviceApi::new().with_states(["CREATING", "ACTIVE", "CLOSING", "CLOSED"]);
	let controller = controller(&api);

	let endpoint = controller
		.run(&RunRequest::new("Android"), |endpoint| async move { Ok(endpoint) })
		.await
		.unwrap();

	assert_eq!(endpoint.as_str(), APPIUM_URL);
	assert_eq!(
		api.calls(),
		vec![
			"create:Android",
			"state:abc123",
			"state:abc123",
			"appium:abc123:latest",
			"close:abc123",
			"state:abc123",
			"state:abc123",
		]
	);
}

#[tokio::test(start_paused = true)]
async fn run_releases_the_session_when_provisioning_fails() {
	let api = FakeDeviceApi::new().without_appium().with_states(["ACTIVE", "CLOSED"]);
	let controller = controller(&api);

	let err = controller
		.run(&RunRequest::new("Android"), |_| async move { Ok(()) })
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Provisioning(_)));
	let calls = api.calls();
	let appium = calls.iter().position(|c| c.starts_with("appium:")).unwrap();
	let close = calls.iter().position(|c| c.starts_with("close:")).unwrap();
	assert!(close > appium, "close must follow the failed provisioning call: {calls:?}");
}

#[tokio::test(start_paused = true)]
async fn run_keeps_the_original_error_when_cleanup_also_fails() {
	let api = FakeDeviceApi::new()
		.without_appium()
		.with_close(CloseBehavior::Fail)
		.with_states(["ACTIVE"]);
	let controller = controller(&api);

	let err = controller
		.run(&RunRequest::new("Android"), |_| async move { Ok(()) })
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Provisioning(_)), "cleanup failure must not mask: {err:?}");
	assert!(api.calls().iter().any(|c| c.starts_with("close:")));
}

#[tokio::test(start_paused = true)]
async fn run_surfaces_a_cleanup_failure_after_successful_automation() {
	let api = FakeDeviceApi::new().with_close(CloseBehavior::Fail).with_states(["ACTIVE"]);
	let controller = controller(&api);

	let err = controller
		.run(&RunRequest::new("Android"), |_| async move { Ok(()) })
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Status { .. }));
}

#[tokio::test(start_paused = true)]
async fn run_does_not_attempt_cleanup_when_reservation_fails() {
	let api = FakeDeviceApi::new().without_create();
	let controller = controller(&api);

	let err = controller
		.run(&RunRequest::new("Android"), |_| async move { Ok(()) })
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Reservation(_)));
	assert_eq!(api.calls(), vec!["create:Android"]);
}

#[tokio::test(start_paused = true)]
async fn run_still_releases_after_an_activation_timeout() {
	let api = FakeDeviceApi::new().with_states(["CREATING"]);
	let controller = controller(&api);

	let request = RunRequest::new("Android")
		.with_active_timeout(Duration::from_secs(60))
		.with_close_timeout(Duration::from_secs(30));
	let err = controller.run(&request, |_| async move { Ok(()) }).await.unwrap_err();

	// the close-confirmation wait also times out here; the activation
	// timeout must still be the error the caller sees
	assert!(matches!(err, Error::Timeout { target: SessionState::Active, .. }));
	assert!(api.calls().iter().any(|c| c.starts_with("close:")));
}

#[tokio::test(start_paused = true)]
async fn automation_failures_still_release_the_session() {
	let api = FakeDeviceApi::new().with_states(["ACTIVE", "CLOSING", "CLOSED"]);
	let controller = controller(&api);

	let err = controller
		.run(&RunRequest::new("Android"), |_| async move {
			Err::<(), _>(Error::Status { status: StatusCode::BAD_GATEWAY, body: "driver died".to_string() })
		})
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Status { .. }));
	assert!(api.calls().iter().any(|c| c.starts_with("close:")));
}
