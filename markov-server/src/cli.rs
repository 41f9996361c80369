use std::path::PathBuf;

use clap::Parser;

/// HTTP server exposing an incrementally built text Markov chain.
#[derive(Parser)]
#[command(name = "markov-server", version, about = "Markov chain HTTP server")]
pub struct Cli {
	/// Path to an optional TOML configuration file.
	#[arg(short, long)]
	pub config: Option<PathBuf>,

	/// Override the listening port from config.
	#[arg(short, long)]
	pub port: Option<u16>,

	/// Increase verbosity (-v info, -vv debug, -vvv trace).
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}
