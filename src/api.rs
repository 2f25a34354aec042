//! HTTP surface: routes, shared state, and the server loop.

pub mod envelope;

mod handlers;

pub use envelope::{ApiError, Category, Failure, Success};

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Router,
	http::{
		HeaderValue, Method,
		header::{
			ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, AUTHORIZATION, CONTENT_TYPE,
		},
	},
	routing::{MethodRouter, get, post},
};
use tokio::net::TcpListener;
use tower_http::{
	cors::{Any, CorsLayer},
	set_header::SetResponseHeaderLayer,
	trace::TraceLayer,
};
// self
use crate::{
	_prelude::*, cache::TokenCache, config::GatewayConfig, error::ConfigError,
	upstream::UpstreamClient,
};

const LOGIN_EXCHANGE_PATHS: [&str; 2] = ["/login-exchange", "/api/auth/code2session"];
const TOKEN_PATHS: [&str; 2] = ["/token", "/api/auth/token"];
const TEXT_CHECK_PATHS: [&str; 2] = ["/text-check", "/api/security/text-check"];
const HEALTH_PATHS: [&str; 2] = ["/health", "/api/health"];

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
	config: Arc<GatewayConfig>,
	upstream: Arc<UpstreamClient>,
	cache: Arc<TokenCache>,
}
impl AppState {
	/// Assembles state from already-built parts.
	pub fn new(config: GatewayConfig, upstream: UpstreamClient, cache: TokenCache) -> Self {
		Self { config: Arc::new(config), upstream: Arc::new(upstream), cache: Arc::new(cache) }
	}

	/// Builds the reqwest-backed upstream client and an empty cache from `config`.
	pub fn from_config(config: GatewayConfig) -> Result<Self, ConfigError> {
		let upstream = UpstreamClient::from_config(&config)?;
		let cache = TokenCache::new(config.refresh_margin());

		Ok(Self::new(config, upstream, cache))
	}

	/// Process configuration.
	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	/// Shared token cache.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}
}

/// Builds the router with every route, its legacy alias, CORS, and request tracing.
pub fn router(state: AppState) -> Router {
	let mut router = Router::<AppState>::new();

	for path in LOGIN_EXCHANGE_PATHS {
		router = router.route(path, with_fallbacks(post(handlers::login_exchange)));
	}
	for path in TOKEN_PATHS {
		router = router.route(path, with_fallbacks(get(handlers::token)));
	}
	for path in TEXT_CHECK_PATHS {
		router = router.route(path, with_fallbacks(post(handlers::text_check)));
	}
	for path in HEALTH_PATHS {
		router = router.route(path, with_fallbacks(get(handlers::health)));
	}

	let cors = CorsLayer::new()
		.allow_origin(Any)
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([CONTENT_TYPE, AUTHORIZATION]);

	router
		.fallback(handlers::not_found)
		.layer(TraceLayer::new_for_http())
		.layer(SetResponseHeaderLayer::if_not_present(
			ACCESS_CONTROL_ALLOW_METHODS,
			HeaderValue::from_static("GET, POST, OPTIONS"),
		))
		.layer(SetResponseHeaderLayer::if_not_present(
			ACCESS_CONTROL_ALLOW_HEADERS,
			HeaderValue::from_static("Content-Type, Authorization"),
		))
		.layer(cors)
		.with_state(state)
}

/// Binds `bind` and serves until Ctrl-C.
pub async fn serve(state: AppState, bind: SocketAddr) -> std::io::Result<()> {
	let listener = TcpListener::bind(bind).await?;

	tracing::info!(addr = %listener.local_addr()?, "Gateway listening.");

	axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

fn with_fallbacks(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
	route.options(handlers::preflight).fallback(handlers::method_not_allowed)
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "Failed to listen for the shutdown signal.");
		std::future::pending::<()>().await;
	}

	tracing::info!("Shutting down.");
}
