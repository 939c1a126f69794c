//! Tracing setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the `-v` count picks
/// the level for this workspace's crates.
pub fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("rdc={level},rdc_cli={level}")));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
