//! Client for the platform's login, token, and content-check endpoints.
//!
//! [`UpstreamClient`] turns each operation into an [`UpstreamRequest`], hands it to the
//! configured [`UpstreamHttpClient`], and classifies the answer: a non-zero `errcode` becomes an
//! [`UpstreamError`], a success payload missing required fields becomes a [`ContractError`], and
//! transport failures pass through untouched. Every operation runs inside an
//! [`OperationSpan`] and records attempt/success/failure outcomes.

pub mod errcode;

mod payload;

pub use payload::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, IssuedToken, OpenId, Secret, UnionId},
	cache::{IssueFuture, TokenIssuer},
	config::{GatewayConfig, UpstreamTimeouts},
	error::{ConfigError, ContractError, UpstreamError},
	http::{ReqwestHttpClient, UpstreamHttpClient, UpstreamRequest, UpstreamResponse},
	obs::{self, OperationKind, OperationSpan, Outcome},
};

const LOGIN_PATH: &str = "sns/jscode2session";
const TOKEN_PATH: &str = "cgi-bin/token";
const TEXT_CHECK_PATH: &str = "wxa/msg_sec_check";

/// Absolute URLs of the three upstream endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	/// Login-code exchange endpoint.
	pub login: Url,
	/// Access token issuance endpoint.
	pub token: Url,
	/// v2 text check endpoint.
	pub text_check: Url,
}
impl Endpoints {
	/// Derives every endpoint from `base`, keeping any path prefix it carries.
	pub fn new(mut base: Url) -> Result<Self, ConfigError> {
		if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
			return Err(ConfigError::InvalidEndpoint { url: base.to_string() });
		}
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		base.set_query(None);
		base.set_fragment(None);

		let join = |path: &str| base.join(path).map_err(|source| ConfigError::EndpointJoin { source });

		Ok(Self { login: join(LOGIN_PATH)?, token: join(TOKEN_PATH)?, text_check: join(TEXT_CHECK_PATH)? })
	}
}

/// Client for the platform API.
#[derive(Clone)]
pub struct UpstreamClient {
	http: Arc<dyn UpstreamHttpClient>,
	endpoints: Endpoints,
	timeouts: UpstreamTimeouts,
}
impl UpstreamClient {
	/// Creates a client over any transport.
	pub fn new(
		http: Arc<dyn UpstreamHttpClient>,
		endpoints: Endpoints,
		timeouts: UpstreamTimeouts,
	) -> Self {
		Self { http, endpoints, timeouts }
	}

	/// Creates a reqwest-backed client from process configuration.
	///
	/// Redirects are never followed; the platform answers every call directly.
	pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(ConfigError::http_client_build)?;
		let endpoints = Endpoints::new(config.upstream_base_url.clone())?;

		Ok(Self::new(Arc::new(ReqwestHttpClient::with_client(client)), endpoints, config.timeouts))
	}

	/// Endpoints this client talks to.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Exchanges a one-time login code for the user's identity and session key.
	pub async fn exchange_login_code(
		&self,
		credentials: &Credentials,
		code: &str,
	) -> Result<LoginSession> {
		const KIND: OperationKind = OperationKind::LoginExchange;

		run(KIND, "exchange_login_code", async move {
			let request =
				UpstreamRequest::get(KIND, self.endpoints.login.clone(), self.timeouts.login)
					.with_query("appid", credentials.app_id.to_string())
					.with_query("secret", credentials.app_secret.expose())
					.with_query("js_code", code)
					.with_query("grant_type", "authorization_code");
			let response = self.http.execute(request).await?;
			let payload = decode::<LoginPayload>(KIND, &response)?;

			check_status(KIND, &response, &payload.status)?;

			let openid = payload
				.openid
				.filter(|value| !value.is_empty())
				.ok_or(ContractError::MissingField { operation: KIND, field: "openid" })?;
			let openid = OpenId::new(openid).map_err(|source| ContractError::InvalidIdentifier {
				operation: KIND,
				field: "openid",
				source,
			})?;
			let unionid = payload
				.unionid
				.filter(|value| !value.is_empty())
				.map(UnionId::new)
				.transpose()
				.map_err(|source| ContractError::InvalidIdentifier {
					operation: KIND,
					field: "unionid",
					source,
				})?;

			Ok(LoginSession { openid, session_key: payload.session_key.map(Secret::new), unionid })
		})
		.await
	}

	/// Requests a new client-credential access token.
	pub async fn issue_access_token(&self, credentials: &Credentials) -> Result<IssuedToken> {
		const KIND: OperationKind = OperationKind::AccessToken;

		run(KIND, "issue_access_token", async move {
			let request =
				UpstreamRequest::get(KIND, self.endpoints.token.clone(), self.timeouts.token)
					.with_query("grant_type", "client_credential")
					.with_query("appid", credentials.app_id.to_string())
					.with_query("secret", credentials.app_secret.expose());
			let response = self.http.execute(request).await?;
			let payload = decode::<AccessTokenPayload>(KIND, &response)?;

			check_status(KIND, &response, &payload.status)?;

			let value = payload
				.access_token
				.filter(|value| !value.is_empty())
				.ok_or(ContractError::MissingField { operation: KIND, field: "access_token" })?;
			let expires_in = payload
				.expires_in
				.ok_or(ContractError::MissingField { operation: KIND, field: "expires_in" })?;

			if expires_in <= 0 {
				return Err(ContractError::NonPositiveLifetime.into());
			}
			if expires_in > Duration::MAX.whole_seconds() / 2 {
				return Err(ContractError::LifetimeOutOfRange.into());
			}

			Ok(IssuedToken { value: Secret::new(value), lifetime: Duration::seconds(expires_in) })
		})
		.await
	}

	/// Runs the v2 text content check on behalf of `params.openid`.
	pub async fn check_text_content(
		&self,
		access_token: &Secret,
		params: &TextCheckParams,
	) -> Result<TextCheckVerdict> {
		const KIND: OperationKind = OperationKind::TextCheck;

		run(KIND, "check_text_content", async move {
			let body = serde_json::to_vec(&params.wire_body())
				.map_err(|source| Error::Encode { operation: KIND, source })?;
			let request = UpstreamRequest::post_json(
				KIND,
				self.endpoints.text_check.clone(),
				body,
				self.timeouts.text_check,
			)
			.with_query("access_token", access_token.expose());
			let response = self.http.execute(request).await?;
			let payload = decode::<TextCheckPayload>(KIND, &response)?;

			check_status(KIND, &response, &payload.status)?;

			let result = payload
				.result
				.ok_or(ContractError::MissingField { operation: KIND, field: "result" })?;

			Ok(TextCheckVerdict {
				suggestion: result.suggest,
				label: result.label,
				trace_id: payload.trace_id,
				detail: payload.detail.unwrap_or(serde_json::Value::Null),
			})
		})
		.await
	}

	/// Adapter that lets a [`crate::cache::TokenCache`] issue tokens with `credentials`.
	pub fn issuer<'a>(&'a self, credentials: &'a Credentials) -> CredentialIssuer<'a> {
		CredentialIssuer { client: self, credentials }
	}
}
impl Debug for UpstreamClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UpstreamClient")
			.field("endpoints", &self.endpoints)
			.field("timeouts", &self.timeouts)
			.finish()
	}
}

/// [`TokenIssuer`] bound to one set of credentials.
#[derive(Debug)]
pub struct CredentialIssuer<'a> {
	client: &'a UpstreamClient,
	credentials: &'a Credentials,
}
impl TokenIssuer for CredentialIssuer<'_> {
	fn issue(&self) -> IssueFuture<'_> {
		Box::pin(self.client.issue_access_token(self.credentials))
	}
}

async fn run<T, F>(kind: OperationKind, stage: &'static str, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(kind, stage);

	obs::record_outcome(kind, Outcome::Attempt);

	let result = span.wrap(fut).await;

	match &result {
		Ok(_) => obs::record_outcome(kind, Outcome::Success),
		Err(err) => {
			tracing::warn!(operation = kind.as_str(), error = %err, "Upstream operation failed.");
			obs::record_outcome(kind, Outcome::Failure);
		},
	}

	result
}

fn decode<T>(operation: OperationKind, response: &UpstreamResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		if response.is_success() {
			ContractError::Parse { operation, status: response.status, source }.into()
		} else {
			ContractError::UnexpectedStatus { operation, status: response.status }.into()
		}
	})
}

fn check_status(
	operation: OperationKind,
	response: &UpstreamResponse,
	status: &PlatformStatus,
) -> Result<()> {
	match status.errcode {
		Some(errcode) if errcode != 0 => Err(UpstreamError {
			operation,
			errcode,
			errmsg: status.errmsg.clone().unwrap_or_default(),
		}
		.into()),
		_ if !response.is_success() =>
			Err(ContractError::UnexpectedStatus { operation, status: response.status }.into()),
		_ => Ok(()),
	}
}
