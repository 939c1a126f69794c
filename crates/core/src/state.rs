//! Server-reported session lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle stage of a reserved device session.
///
/// Transitions are driven entirely by the remote service; clients only
/// observe them through polling. The normal provisioning path is
/// `Pending → Creating → Active`, teardown is `Active → Closing → Closed`,
/// and any state may transition to `Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
	Pending,
	Creating,
	Active,
	Closing,
	Closed,
	Errored,
}

impl SessionState {
	/// Parses a server state string, rejecting values outside the known set.
	///
	/// An unrecognized value is a protocol drift between client and service
	/// and surfaces as [`Error::UnknownState`] rather than being treated as
	/// "not yet there".
	pub fn parse(value: &str) -> Result<Self> {
		match value {
			"PENDING" => Ok(Self::Pending),
			"CREATING" => Ok(Self::Creating),
			"ACTIVE" => Ok(Self::Active),
			"CLOSING" => Ok(Self::Closing),
			"CLOSED" => Ok(Self::Closed),
			"ERRORED" => Ok(Self::Errored),
			other => Err(Error::UnknownState { value: other.to_string() }),
		}
	}

	/// Whether no further transitions are expected once this state is observed.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Closed | Self::Errored)
	}

	/// The server spelling of this state.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "PENDING",
			Self::Creating => "CREATING",
			Self::Active => "ACTIVE",
			Self::Closing => "CLOSING",
			Self::Closed => "CLOSED",
			Self::Errored => "ERRORED",
		}
	}
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
