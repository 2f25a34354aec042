//! Route handlers.
//!
//! Each handler validates its input before looking at configuration, and looks at configuration
//! before touching the token cache or the upstream client.

// crates.io
use axum::{body::Bytes, extract::State};
use serde::{Deserializer, de::DeserializeOwned};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	api::{
		AppState,
		envelope::{ApiError, Success},
	},
	auth::OpenId,
	config::CredentialStatus,
	error::InputError,
	upstream::{self, LoginIdentity, Scene, Suggestion, TextCheckParams},
};

#[derive(Debug, Default, Deserialize)]
struct LoginExchangeRequest {
	#[serde(default)]
	code: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TextCheckRequest {
	#[serde(default)]
	content: Option<Value>,
	#[serde(default)]
	openid: Option<Value>,
	#[serde(default, deserialize_with = "present")]
	scene: Option<Value>,
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	nickname: Option<String>,
	#[serde(default)]
	signature: Option<String>,
}

/// `GET /token` payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
	token: String,
	expires_in_seconds: i64,
	from_cache: bool,
}

/// `POST /text-check` payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextCheckData {
	safe: bool,
	suggestion: Suggestion,
	label: i64,
	trace_id: Option<String>,
	detail: Value,
}

/// `GET /health` payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
	status: &'static str,
	#[serde(with = "time::serde::rfc3339")]
	timestamp: OffsetDateTime,
	version: &'static str,
	environment: String,
	config: CredentialStatus,
	token_cached: bool,
	endpoints: EndpointIndex,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointIndex {
	health: &'static str,
	login_exchange: &'static str,
	token: &'static str,
	text_check: &'static str,
}

pub(crate) async fn login_exchange(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Success<LoginIdentity>, ApiError> {
	let request = parse_body::<LoginExchangeRequest>(&body)?;
	let code = non_empty_string(request.code).ok_or(InputError::MissingCode)?;
	let credentials = state.config.credentials()?;
	let session = state.upstream.exchange_login_code(&credentials, &code).await?;

	tracing::info!(openid = %session.openid.masked(), "Login exchange succeeded.");

	Ok(Success::new(session.identity()).with_message("login succeeded"))
}

pub(crate) async fn token(State(state): State<AppState>) -> Result<Success<TokenData>, ApiError> {
	let credentials = state.config.credentials()?;
	let lease = state.cache.get_token(&state.upstream.issuer(&credentials)).await?;

	Ok(Success::new(TokenData {
		token: lease.token.expose().to_owned(),
		expires_in_seconds: lease.expires_in.whole_seconds(),
		from_cache: lease.from_cache,
	}))
}

pub(crate) async fn text_check(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Success<TextCheckData>, ApiError> {
	let request = parse_body::<TextCheckRequest>(&body)?;
	let content = non_empty_string(request.content).ok_or(InputError::InvalidContent)?;
	let openid = non_empty_string(request.openid).ok_or(InputError::MissingOpenid)?;
	let openid = OpenId::new(openid).map_err(|_| InputError::MissingOpenid)?;

	upstream::ensure_content_len(&content)?;

	let scene = parse_scene(request.scene)?;
	let params = TextCheckParams::new(content, openid, scene)?
		.with_title(request.title)
		.with_nickname(request.nickname)
		.with_signature(request.signature);
	let credentials = state.config.credentials()?;
	let lease = state.cache.get_token(&state.upstream.issuer(&credentials)).await?;
	let verdict = match state.upstream.check_text_content(&lease.token, &params).await {
		Ok(verdict) => verdict,
		Err(Error::Upstream(err)) if err.is_access_token_rejection() => {
			state.cache.invalidate(&lease.token);

			return Err(Error::Upstream(err).into());
		},
		Err(err) => return Err(err.into()),
	};

	Ok(Success::new(TextCheckData {
		safe: verdict.is_safe(),
		suggestion: verdict.suggestion,
		label: verdict.label,
		trace_id: verdict.trace_id,
		detail: verdict.detail,
	})
	.with_message(verdict.suggestion.message()))
}

pub(crate) async fn health(State(state): State<AppState>) -> Success<HealthData> {
	Success::new(HealthData {
		status: "healthy",
		timestamp: OffsetDateTime::now_utc(),
		version: env!("CARGO_PKG_VERSION"),
		environment: state.config.environment.clone(),
		config: state.config.credential_status(),
		token_cached: state.cache.peek().is_some(),
		endpoints: EndpointIndex {
			health: "/health",
			login_exchange: "/login-exchange",
			token: "/token",
			text_check: "/text-check",
		},
	})
	.with_message("Gateway is running.")
}

pub(crate) async fn preflight() {}

pub(crate) async fn method_not_allowed() -> ApiError {
	ApiError::MethodNotAllowed
}

pub(crate) async fn not_found() -> ApiError {
	ApiError::NotFound
}

fn parse_body<T>(body: &[u8]) -> Result<T, InputError>
where
	T: DeserializeOwned + Default,
{
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(T::default());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| InputError::MalformedBody { source })
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
	match value {
		Some(Value::String(value)) if !value.is_empty() => Some(value),
		_ => None,
	}
}

// An explicit `null` stays `Some(Value::Null)` so only an absent field takes the default.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
	D: Deserializer<'de>,
{
	Value::deserialize(deserializer).map(Some)
}

// Integral floats such as `2.0` name the same scene as `2`.
fn parse_scene(value: Option<Value>) -> Result<Scene, InputError> {
	let Some(value) = value else {
		return Ok(Scene::default());
	};

	value
		.as_i64()
		.or_else(|| value.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64))
		.ok_or(InputError::InvalidScene)
		.and_then(Scene::try_from)
}
