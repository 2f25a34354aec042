//! Transport primitives for upstream platform calls.
//!
//! The module exposes [`UpstreamHttpClient`] alongside [`UpstreamRequest`] and
//! [`UpstreamResponse`] so the upstream client stays independent of any particular HTTP stack.
//! Implementations classify failures into [`TransportError::Timeout`] or
//! [`TransportError::Network`]; every response that arrives, whatever its status, is handed back
//! for the upstream client to interpret.

// std
use std::{ops::Deref, time::Duration as StdDuration};
// self
use crate::{_prelude::*, error::TransportError, obs::OperationKind};

/// Boxed future returned by [`UpstreamHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<UpstreamResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing upstream platform calls.
///
/// The trait is the gateway's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a single transport can be shared behind `Arc<dyn _>` by every
/// handler, and the returned futures must be `Send` so axum can drive them on any worker.
pub trait UpstreamHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes `request`, honoring its timeout.
	fn execute(&self, request: UpstreamRequest) -> HttpFuture<'_>;
}

/// HTTP methods used by the upstream platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamMethod {
	/// Query-string only request.
	Get,
	/// JSON body request.
	Post,
}

/// Fully described outbound request.
#[derive(Clone)]
pub struct UpstreamRequest {
	/// Operation the request belongs to; used when classifying failures.
	pub operation: OperationKind,
	/// HTTP method.
	pub method: UpstreamMethod,
	/// Endpoint URL without the query string.
	pub url: Url,
	/// Query parameters; values may carry secrets.
	pub query: Vec<(&'static str, String)>,
	/// Serialized JSON body, if any.
	pub json_body: Option<Vec<u8>>,
	/// Deadline for the whole exchange, body included.
	pub timeout: StdDuration,
}
impl UpstreamRequest {
	/// Creates a `GET` request for `url`.
	pub fn get(operation: OperationKind, url: Url, timeout: StdDuration) -> Self {
		Self { operation, method: UpstreamMethod::Get, url, query: Vec::new(), json_body: None, timeout }
	}

	/// Creates a `POST` request for `url` carrying `body` as JSON.
	pub fn post_json(
		operation: OperationKind,
		url: Url,
		body: Vec<u8>,
		timeout: StdDuration,
	) -> Self {
		Self {
			operation,
			method: UpstreamMethod::Post,
			url,
			query: Vec::new(),
			json_body: Some(body),
			timeout,
		}
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
		self.query.push((key, value.into()));

		self
	}
}
impl Debug for UpstreamRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UpstreamRequest")
			.field("operation", &self.operation)
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("query_keys", &self.query.iter().map(|(key, _)| *key).collect::<Vec<_>>())
			.field("json_body_len", &self.json_body.as_ref().map(Vec::len))
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Raw upstream response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl UpstreamResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl UpstreamHttpClient for ReqwestHttpClient {
	fn execute(&self, request: UpstreamRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let operation = request.operation;
			let mut builder = match request.method {
				UpstreamMethod::Get => client.get(request.url),
				UpstreamMethod::Post => client.post(request.url),
			}
			.query(&request.query)
			.timeout(request.timeout);

			if let Some(body) = request.json_body {
				builder = builder.header(reqwest::header::CONTENT_TYPE, "application/json").body(body);
			}

			let response =
				builder.send().await.map_err(|err| map_reqwest_error(operation, err))?;
			let status = response.status().as_u16();
			let body =
				response.bytes().await.map_err(|err| map_reqwest_error(operation, err))?.to_vec();

			Ok(UpstreamResponse { status, body })
		})
	}
}

fn map_reqwest_error(operation: OperationKind, err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		return TransportError::Timeout { operation };
	}

	TransportError::network(operation, err)
}
