//! Environment-supplied service location and credentials.

use url::Url;

use crate::error::{Error, Result};

/// Variable naming the service base URL, e.g. `https://api.example.test/rdc/v2`.
pub const BASE_URL_VAR: &str = "RDC_BASE_URL";
/// Variable naming the account used for HTTP Basic auth.
pub const USERNAME_VAR: &str = "RDC_USERNAME";
/// Variable naming the API access key used for HTTP Basic auth.
pub const ACCESS_KEY_VAR: &str = "RDC_ACCESS_KEY";

/// Connection settings for the device cloud API.
#[derive(Debug, Clone)]
pub struct Config {
	pub base_url: Url,
	pub username: String,
	pub access_key: String,
}

impl Config {
	/// Loads configuration from process environment variables.
	///
	/// A missing or blank variable is a hard startup failure, not a
	/// retryable condition.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|var| std::env::var(var).ok())
	}

	/// Loads configuration through an arbitrary variable lookup, so callers
	/// and tests can supply values without touching the process environment.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let raw = required(&lookup, BASE_URL_VAR)?;
		let base_url = Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })?;
		Ok(Self {
			base_url,
			username: required(&lookup, USERNAME_VAR)?,
			access_key: required(&lookup, ACCESS_KEY_VAR)?,
		})
	}
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String>
where
	F: Fn(&str) -> Option<String>,
{
	match lookup(var) {
		Some(value) if !value.trim().is_empty() => Ok(value),
		_ => Err(Error::MissingEnv(var)),
	}
}
