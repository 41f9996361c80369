use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration, read from an optional TOML file.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
	/// Address to bind.
	#[serde(default = "default_host")]
	pub host: String,

	/// Port to bind.
	#[serde(default = "default_port")]
	pub port: u16,

	/// Separator placed between generated states.
	#[serde(default = "default_separator")]
	pub separator: String,

	/// Default maximum length of a generated sequence.
	#[serde(default = "default_max_len")]
	pub max_len: usize,

	/// Accept cross-origin requests from any origin.
	#[serde(default)]
	pub permissive_cors: bool,
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}
fn default_port() -> u16 {
	5000
}
fn default_separator() -> String {
	" ".to_string()
}
fn default_max_len() -> usize {
	32
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			separator: default_separator(),
			max_len: default_max_len(),
			permissive_cors: false,
		}
	}
}

impl ServerConfig {
	/// Loads the configuration from `path`, or returns defaults without one.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let Some(path) = path else {
			return Ok(Self::default());
		};
		let text = fs::read_to_string(path)
			.with_context(|| format!("failed to read config {}", path.display()))?;
		Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
	}

	fn parse(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}
}
