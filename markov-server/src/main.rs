mod cli;
mod config;
mod logging;
mod routes;

use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Condition;
use actix_web::{App, HttpServer, web};
use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;
use crate::config::ServerConfig;
use crate::routes::SharedData;

/// Main entry point for the server.
///
/// Loads the configuration, wraps an empty text model in a `Mutex` (the
/// model itself is not synchronized) and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	logging::init(cli.verbose);

	let mut config = ServerConfig::load(cli.config.as_deref())?;
	if let Some(port) = cli.port {
		config.port = port;
	}

	let shared_data = SharedData::new(config.separator.clone(), config.max_len);
	let shared_model = web::Data::new(Mutex::new(shared_data));
	let permissive_cors = config.permissive_cors;

	tracing::info!(host = %config.host, port = config.port, "starting markov server");

	HttpServer::new(move || {
		App::new()
			.wrap(Condition::new(permissive_cors, Cors::permissive()))
			.app_data(shared_model.clone())
			.configure(routes::configure)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await?;

	Ok(())
}
