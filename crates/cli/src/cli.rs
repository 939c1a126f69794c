use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rdc")]
#[command(about = "Remote device cloud sessions - reserve, inspect, release")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Reserve a device, wait until active, start Appium, then release
	Run {
		/// Device operating system class to reserve
		#[arg(long, default_value = "Android")]
		os: String,

		/// Appium version to attach to the session
		#[arg(long, default_value = "latest")]
		appium_version: String,

		/// Seconds to wait for the session to become active
		#[arg(long, default_value = "180")]
		active_timeout: u64,

		/// Seconds to wait for the session to close
		#[arg(long, default_value = "60")]
		close_timeout: u64,

		/// Skip the WebDriver status probe against the Appium endpoint
		#[arg(long)]
		no_probe: bool,
	},

	/// Query the current state of a session
	Status { session_id: String },

	/// Release a session (safe to call on one already closing)
	Close {
		session_id: String,

		/// Seconds to wait for CLOSED confirmation (0 = don't wait)
		#[arg(long, default_value = "0")]
		wait: u64,
	},
}
