//! Client for a remote device cloud: session reservation, state polling,
//! Appium server bootstrap, and deterministic release.
//!
//! The crate is organized around a small set of seams: [`DeviceApi`]
//! abstracts the vendor REST surface (with [`HttpApi`] as the production
//! implementation), [`SessionController`] owns the lifecycle protocol for
//! exactly one reserved session, and [`poll_until`] is the bounded polling
//! primitive underneath state waits.
//!
//! The lifecycle a caller drives, either manually or through
//! [`SessionController::run`]:
//!
//! ```text
//! create(os)                          state = PENDING
//! wait_for_state(ACTIVE, bound)       state settles to ACTIVE
//! start_appium_server(...)            endpoint handed to automation
//! close()                            state -> CLOSING
//! wait_for_state(CLOSED, bound)
//! ```
//!
//! The close half runs on every exit path once a session id exists; a
//! reserved device is a scarce external resource.

/// Remote REST operations and the reqwest-backed client.
pub mod api;
/// Environment-supplied service location and credentials.
pub mod config;
/// Failure taxonomy.
pub mod error;
/// Session lifecycle controller and run orchestration.
pub mod lifecycle;
/// Bounded fixed-interval polling.
pub mod poll;
/// The owned session value.
pub mod session;
/// Server-reported lifecycle states.
pub mod state;

pub use api::{CloseOutcome, CreatedSession, DeviceApi, HttpApi};
pub use config::Config;
pub use error::{Error, Result};
pub use lifecycle::{
	DEFAULT_ACTIVE_TIMEOUT, DEFAULT_CLOSE_TIMEOUT, DEFAULT_POLL_INTERVAL, RunRequest,
	SessionController,
};
pub use poll::poll_until;
pub use session::Session;
pub use state::SessionState;
