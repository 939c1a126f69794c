//! Failure taxonomy for session reservation and lifecycle operations.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::state::SessionState;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the device cloud client.
#[derive(Debug, Error)]
pub enum Error {
	/// Session reservation failed or the response carried no identifier.
	/// Fatal to the run; nothing was allocated that needs cleanup.
	#[error("session reservation failed: {0}")]
	Reservation(String),

	/// Appium server attachment failed after a session was already
	/// reserved. The session still has to be released.
	#[error("appium server provisioning failed: {0}")]
	Provisioning(String),

	/// A state wait exceeded its bound.
	#[error("timed out after {waited:?} waiting for session state {target}")]
	Timeout { target: SessionState, waited: Duration },

	/// The server reported a state outside the known enumeration.
	#[error("server reported unknown session state {value:?}")]
	UnknownState { value: String },

	/// A required environment variable is absent or blank.
	#[error("missing required environment variable {0}")]
	MissingEnv(&'static str),

	/// The configured base URL failed to parse.
	#[error("invalid base URL {url:?}")]
	InvalidUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	/// Transport-level failure: connect, TLS, request timeout, body read.
	#[error(transparent)]
	Http(#[from] reqwest::Error),

	/// The service answered a call with a non-success status.
	#[error("remote call failed with status {status}: {body}")]
	Status { status: StatusCode, body: String },
}
