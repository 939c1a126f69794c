//! The reserved device session owned by one run.

use url::Url;

use crate::state::SessionState;

/// A reserved remote device, tracked by an opaque identifier and the
/// lifecycle state most recently observed from the service.
///
/// A `Session` is single-owner: it is created by one run, mutated only by
/// observations surfaced through polling, and released exactly once. The
/// identifier is never empty; creation either yields a populated id or
/// fails outright.
#[derive(Debug)]
pub struct Session {
	id: String,
	state: SessionState,
	appium_url: Option<Url>,
}

impl Session {
	pub(crate) fn new(id: String, state: SessionState) -> Self {
		Self { id, state, appium_url: None }
	}

	/// Opaque identifier assigned by the service at creation time.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Most recently observed lifecycle state.
	pub fn state(&self) -> SessionState {
		self.state
	}

	/// Appium endpoint attached to this session, once provisioned.
	///
	/// Only meaningful after the session was observed `ACTIVE`; before
	/// provisioning this is `None`.
	pub fn appium_url(&self) -> Option<&Url> {
		self.appium_url.as_ref()
	}

	pub(crate) fn observe(&mut self, state: SessionState) {
		self.state = state;
	}

	pub(crate) fn set_appium_url(&mut self, url: Url) {
		self.appium_url = Some(url);
	}
}
