//! Vote broker HTTP server.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
// self
use vote_broker::{config, error::display_chain, flows::VoteBroker, obs, server};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let dotenv = config::load_dotenv();

	obs::init_tracing();

	match dotenv {
		Ok(Some(path)) => tracing::debug!(path = %path.display(), "Loaded environment file."),
		Ok(None) => {},
		Err(e) => tracing::warn!(error = %display_chain(&e), "Ignoring malformed environment file."),
	}

	let config = config::Config::from_env()?;
	let broker = Arc::new(VoteBroker::new(&config)?);
	let app = server::app(broker, &config.cors_origins);
	let listener = TcpListener::bind(config.listen_addr).await?;
	let addr = listener.local_addr()?;

	tracing::info!(
		%addr,
		token_endpoint = %config.token_endpoint,
		data_endpoint = %config.data_endpoint,
		upstream_timeout = ?config.upstream_timeout,
		"Vote broker listening."
	);
	tracing::info!("Health check: http://{addr}/health");
	tracing::info!("Vote endpoint: http://{addr}/vote");

	server::serve(listener, app).await?;

	Ok(())
}
