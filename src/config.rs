//! Process configuration sourced from command-line flags and environment variables.

// std
use std::{net::SocketAddr, time::Duration as StdDuration};
// crates.io
use clap::{Args, Parser};
// self
use crate::{_prelude::*, auth::Credentials, error::ConfigError};

/// Production base URL of the platform API.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.weixin.qq.com";

/// Gateway configuration.
///
/// Credentials are optional at startup: handlers that need them report a configuration error
/// per request, and `/health` reports which ones are present.
#[derive(Clone, Parser)]
#[command(name = "wxa-gateway", version, about)]
pub struct GatewayConfig {
	/// Mini-program app identifier.
	#[arg(long, env = "WECHAT_APP_ID")]
	pub app_id: Option<String>,
	/// Mini-program app secret.
	#[arg(long, env = "WECHAT_APP_SECRET", hide_env_values = true)]
	pub app_secret: Option<String>,
	/// Socket address the HTTP server binds to.
	#[arg(long, env = "WXA_GATEWAY_BIND", default_value = "0.0.0.0:3000")]
	pub bind: SocketAddr,
	/// Base URL of the platform API.
	#[arg(long, env = "WECHAT_API_BASE_URL", default_value = DEFAULT_UPSTREAM_BASE_URL)]
	pub upstream_base_url: Url,
	/// Deployment environment label reported by `/health`.
	#[arg(long, env = "APP_ENV", default_value = "development")]
	pub environment: String,
	/// Seconds before expiry at which a cached access token is renewed.
	#[arg(long, env = "WXA_TOKEN_REFRESH_MARGIN_SECS", default_value_t = 300)]
	pub token_refresh_margin_secs: u32,
	/// Per-operation upstream timeouts.
	#[command(flatten)]
	pub timeouts: UpstreamTimeouts,
	/// Emit logs as JSON lines.
	#[arg(long, env = "WXA_GATEWAY_LOG_JSON")]
	pub log_json: bool,
}
impl GatewayConfig {
	/// Validated credentials, or the configuration error describing what is missing.
	pub fn credentials(&self) -> Result<Credentials, ConfigError> {
		Credentials::from_parts(self.app_id.as_deref(), self.app_secret.as_deref())
	}

	/// Presence of each credential, safe to expose.
	pub fn credential_status(&self) -> CredentialStatus {
		CredentialStatus {
			app_id_configured: is_present(self.app_id.as_deref()),
			app_secret_configured: is_present(self.app_secret.as_deref()),
		}
	}

	/// Token refresh margin as a [`Duration`].
	pub fn refresh_margin(&self) -> Duration {
		Duration::seconds(i64::from(self.token_refresh_margin_secs))
	}
}
impl Default for GatewayConfig {
	fn default() -> Self {
		Self {
			app_id: None,
			app_secret: None,
			bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
			upstream_base_url: Url::parse(DEFAULT_UPSTREAM_BASE_URL)
				.expect("Default upstream base URL is a valid URL."),
			environment: "development".into(),
			token_refresh_margin_secs: 300,
			timeouts: UpstreamTimeouts::default(),
			log_json: false,
		}
	}
}
impl Debug for GatewayConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatewayConfig")
			.field("app_id", &self.app_id)
			.field("app_secret_set", &is_present(self.app_secret.as_deref()))
			.field("bind", &self.bind)
			.field("upstream_base_url", &self.upstream_base_url.as_str())
			.field("environment", &self.environment)
			.field("token_refresh_margin_secs", &self.token_refresh_margin_secs)
			.field("timeouts", &self.timeouts)
			.field("log_json", &self.log_json)
			.finish()
	}
}

/// Deadline applied to each upstream operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Args)]
pub struct UpstreamTimeouts {
	/// Login-code exchange timeout, in seconds.
	#[arg(long = "login-timeout-secs", env = "WXA_LOGIN_TIMEOUT_SECS", default_value = "10", value_parser = parse_secs)]
	pub login: StdDuration,
	/// Access token issuance timeout, in seconds.
	#[arg(long = "token-timeout-secs", env = "WXA_TOKEN_TIMEOUT_SECS", default_value = "10", value_parser = parse_secs)]
	pub token: StdDuration,
	/// Text check timeout, in seconds.
	#[arg(long = "text-check-timeout-secs", env = "WXA_TEXT_CHECK_TIMEOUT_SECS", default_value = "15", value_parser = parse_secs)]
	pub text_check: StdDuration,
}
impl Default for UpstreamTimeouts {
	fn default() -> Self {
		Self {
			login: StdDuration::from_secs(10),
			token: StdDuration::from_secs(10),
			text_check: StdDuration::from_secs(15),
		}
	}
}

/// Which credentials are configured; never carries their values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
	/// App identifier present.
	pub app_id_configured: bool,
	/// App secret present.
	pub app_secret_configured: bool,
}
impl CredentialStatus {
	/// Returns `true` when both credentials are present.
	pub fn is_complete(&self) -> bool {
		self.app_id_configured && self.app_secret_configured
	}
}

fn is_present(value: Option<&str>) -> bool {
	value.is_some_and(|v| !v.trim().is_empty())
}

fn parse_secs(raw: &str) -> Result<StdDuration, String> {
	let secs = raw.trim().parse::<f64>().map_err(|e| format!("`{raw}` is not a number: {e}"))?;

	if !secs.is_finite() || secs <= 0. {
		return Err(format!("`{raw}` must be a positive number of seconds"));
	}

	StdDuration::try_from_secs_f64(secs).map_err(|e| format!("`{raw}` is out of range: {e}"))
}
