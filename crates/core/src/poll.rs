//! Fixed-interval polling with a wall-clock bound.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};

/// Polls `probe` at a fixed `interval` until it yields a value or `timeout`
/// elapses.
///
/// The probe runs once immediately, then once per interval. Returns
/// `Ok(Some(value))` on the first ready probe, `Ok(None)` once elapsed time
/// reaches `timeout` without readiness, and the probe's error as soon as
/// one occurs. The elapsed time before a `None` return is at least
/// `timeout` and less than `timeout + interval`.
///
/// The interval is fixed rather than backing off: remote provisioning is a
/// human-timescale operation and only a handful of probes are expected.
/// Time goes through `tokio::time`, so tests can run under a paused clock.
pub async fn poll_until<T, E, F, Fut>(
	interval: Duration,
	timeout: Duration,
	mut probe: F,
) -> std::result::Result<Option<T>, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = std::result::Result<Option<T>, E>>,
{
	let started = Instant::now();
	loop {
		if let Some(value) = probe().await? {
			return Ok(Some(value));
		}
		if started.elapsed() >= timeout {
			return Ok(None);
		}
		time::sleep(interval).await;
	}
}
