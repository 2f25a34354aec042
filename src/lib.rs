//! Mini-program platform gateway: login-code exchange, cached access tokens, and text-safety
//! checks served as a small JSON API.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod upstream;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	pub use crate::{
		api::{AppState, router},
		cache::{Clock, SystemClock, TokenCache},
		config::GatewayConfig,
		upstream::UpstreamClient,
	};

	/// App identifier used across tests.
	pub const TEST_APP_ID: &str = "wx-test-app";
	/// App secret used across tests.
	pub const TEST_APP_SECRET: &str = "test-app-secret";

	/// Clock whose instant only moves when a test says so.
	#[derive(Clone, Debug)]
	pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
	impl ManualClock {
		/// Creates a clock frozen at `start`.
		pub fn new(start: OffsetDateTime) -> Self {
			Self(Arc::new(Mutex::new(start)))
		}

		/// Moves the clock forward by `delta`.
		pub fn advance(&self, delta: Duration) {
			*self.0.lock() += delta;
		}

		/// Moves the clock to `instant`.
		pub fn set(&self, instant: OffsetDateTime) {
			*self.0.lock() = instant;
		}
	}
	impl Clock for ManualClock {
		fn now(&self) -> OffsetDateTime {
			*self.0.lock()
		}
	}

	/// Gateway configuration with test credentials and the upstream pointed at `base_url`.
	pub fn test_config(base_url: &str) -> GatewayConfig {
		GatewayConfig {
			app_id: Some(TEST_APP_ID.into()),
			app_secret: Some(TEST_APP_SECRET.into()),
			upstream_base_url: Url::parse(base_url).expect("Mock server base URL should parse."),
			environment: "test".into(),
			..GatewayConfig::default()
		}
	}

	/// Builds handler state from `config`, sharing `clock` with the token cache.
	pub fn test_state(config: GatewayConfig, clock: Arc<dyn Clock>) -> AppState {
		let upstream = UpstreamClient::from_config(&config)
			.expect("Test configuration should produce an upstream client.");
		let cache = TokenCache::with_clock(config.refresh_margin(), clock);

		AppState::new(config, upstream, cache)
	}

	/// Builds the full router against `base_url` with a manual clock.
	pub fn test_router(base_url: &str) -> (axum::Router, ManualClock) {
		let clock = ManualClock::new(time::macros::datetime!(2025-06-01 00:00 UTC));
		let state = test_state(test_config(base_url), Arc::new(clock.clone()));

		(router(state), clock)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
// Used by the binary target.
use color_eyre as _;
#[cfg(test)] use {httpmock as _, tower as _};
