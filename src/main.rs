//! Gateway server entry point.

// crates.io
use clap::Parser;
// self
use wxa_gateway::{
	api::{self, AppState},
	config::GatewayConfig,
	obs,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let config = GatewayConfig::parse();

	obs::init_tracing(config.log_json);

	let status = config.credential_status();

	if !status.is_complete() {
		tracing::warn!(
			app_id_configured = status.app_id_configured,
			app_secret_configured = status.app_secret_configured,
			"Mini-program credentials are incomplete; login, token, and text check routes will report a configuration error."
		);
	}

	tracing::debug!(?config, "Loaded configuration.");

	let bind = config.bind;
	let state = AppState::from_config(config)?;

	api::serve(state, bind).await?;

	Ok(())
}
