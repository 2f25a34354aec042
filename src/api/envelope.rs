//! JSON envelopes shared by every route.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, InputError, TransportError},
};

/// Successful response: `{"success": true, "data": ..., "message"?: ...}`.
#[derive(Clone, Debug, Serialize)]
pub struct Success<T> {
	success: bool,
	/// Payload.
	pub data: T,
	/// Optional human-readable note.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}
impl<T> Success<T> {
	/// Wraps `data` without a message.
	pub fn new(data: T) -> Self {
		Self { success: true, data, message: None }
	}

	/// Attaches a message.
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());

		self
	}
}
impl<T> IntoResponse for Success<T>
where
	T: Serialize,
{
	fn into_response(self) -> Response {
		(StatusCode::OK, Json(self)).into_response()
	}
}

/// Failure response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
	/// Always `false`.
	pub success: bool,
	/// Stable machine-readable code.
	pub code: String,
	/// Error category.
	pub error: String,
	/// Human-readable message.
	pub message: String,
	/// Upstream errcode, for rejected upstream calls.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub errcode: Option<i64>,
	/// Raw upstream errmsg, for rejected upstream calls.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub errmsg: Option<String>,
}

/// Broad error classes reported in the `error` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
	/// Caller input failed validation.
	InvalidInput,
	/// Route exists but not for this method.
	MethodNotAllowed,
	/// Gateway is missing configuration.
	Configuration,
	/// Upstream could not be reached in time.
	UpstreamUnavailable,
	/// Upstream answered with an errcode.
	UpstreamRejected,
	/// Upstream answered with something unusable.
	UpstreamContract,
	/// Unknown route.
	NotFound,
	/// Gateway failed on its own side.
	Internal,
}
impl Category {
	/// Wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Category::InvalidInput => "invalid_input",
			Category::MethodNotAllowed => "method_not_allowed",
			Category::Configuration => "configuration",
			Category::UpstreamUnavailable => "upstream_unavailable",
			Category::UpstreamRejected => "upstream_rejected",
			Category::UpstreamContract => "upstream_contract",
			Category::NotFound => "not_found",
			Category::Internal => "internal",
		}
	}
}

/// Handler-boundary error rendered as a [`Failure`] envelope.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// Any gateway error.
	#[error(transparent)]
	Gateway(#[from] Error),
	/// Route exists but does not accept the method.
	#[error("Method not allowed.")]
	MethodNotAllowed,
	/// No route matches the path.
	#[error("Resource not found.")]
	NotFound,
}
impl ApiError {
	/// HTTP status for this error.
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
			ApiError::NotFound => StatusCode::NOT_FOUND,
			ApiError::Gateway(err) => match err {
				Error::Input(_) | Error::Upstream(_) => StatusCode::BAD_REQUEST,
				Error::Config(_) | Error::Encode { .. } => StatusCode::INTERNAL_SERVER_ERROR,
				Error::Transport(TransportError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
				Error::Transport(_) | Error::Contract(_) => StatusCode::BAD_GATEWAY,
			},
		}
	}

	/// Stable machine-readable code.
	pub fn code(&self) -> &'static str {
		match self {
			ApiError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
			ApiError::NotFound => "NOT_FOUND",
			ApiError::Gateway(err) => match err {
				Error::Input(err) => err.code(),
				Error::Config(ConfigError::MissingCredentials { .. }) => "MISSING_CONFIGURATION",
				Error::Config(_) => "INVALID_CONFIGURATION",
				Error::Transport(TransportError::Timeout { .. }) => "UPSTREAM_TIMEOUT",
				Error::Transport(_) => "UPSTREAM_UNAVAILABLE",
				Error::Upstream(_) => "UPSTREAM_REJECTED",
				Error::Contract(_) => "INVALID_UPSTREAM_RESPONSE",
				Error::Encode { .. } => "INTERNAL_ERROR",
			},
		}
	}

	/// Error category.
	pub fn category(&self) -> Category {
		match self {
			ApiError::MethodNotAllowed => Category::MethodNotAllowed,
			ApiError::NotFound => Category::NotFound,
			ApiError::Gateway(err) => match err {
				Error::Input(_) => Category::InvalidInput,
				Error::Config(_) => Category::Configuration,
				Error::Transport(_) => Category::UpstreamUnavailable,
				Error::Upstream(_) => Category::UpstreamRejected,
				Error::Contract(_) => Category::UpstreamContract,
				Error::Encode { .. } => Category::Internal,
			},
		}
	}

	/// Renders the failure envelope.
	pub fn to_failure(&self) -> Failure {
		let (message, errcode, errmsg) = match self {
			ApiError::Gateway(Error::Upstream(err)) =>
				(err.friendly_message(), Some(err.errcode), Some(err.errmsg.clone())),
			_ => (self.to_string(), None, None),
		};

		Failure {
			success: false,
			code: self.code().into(),
			error: self.category().as_str().into(),
			message,
			errcode,
			errmsg,
		}
	}
}
impl From<InputError> for ApiError {
	fn from(err: InputError) -> Self {
		Self::Gateway(err.into())
	}
}
impl From<ConfigError> for ApiError {
	fn from(err: ConfigError) -> Self {
		Self::Gateway(err.into())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(code = self.code(), error = %self, "Request failed.");
		} else {
			tracing::debug!(code = self.code(), error = %self, "Request rejected.");
		}

		(status, Json(self.to_failure())).into_response()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::UpstreamError, obs::OperationKind};

	#[test]
	fn upstream_rejection_carries_errcode() {
		let err = ApiError::from(Error::from(UpstreamError {
			operation: OperationKind::LoginExchange,
			errcode: 40029,
			errmsg: "invalid code".into(),
		}));
		let failure = err.to_failure();

		assert_eq!(err.status(), StatusCode::BAD_REQUEST);
		assert_eq!(failure.code, "UPSTREAM_REJECTED");
		assert_eq!(failure.error, "upstream_rejected");
		assert_eq!(failure.message, "Login credential is invalid, please log in again.");
		assert_eq!(failure.errcode, Some(40029));
		assert_eq!(failure.errmsg.as_deref(), Some("invalid code"));
	}

	#[test]
	fn transport_failures_split_by_kind() {
		let timeout = ApiError::from(Error::from(TransportError::Timeout {
			operation: OperationKind::TextCheck,
		}));
		let network = ApiError::from(Error::from(TransportError::network(
			OperationKind::TextCheck,
			std::io::Error::other("reset"),
		)));

		assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
		assert_eq!(timeout.code(), "UPSTREAM_TIMEOUT");
		assert_eq!(network.status(), StatusCode::BAD_GATEWAY);
		assert_eq!(network.code(), "UPSTREAM_UNAVAILABLE");
		assert_eq!(network.category(), Category::UpstreamUnavailable);
	}

	#[test]
	fn encode_failures_are_internal() {
		let source = serde_json::from_str::<i32>("x").expect_err("Invalid JSON should fail.");
		let err = ApiError::from(Error::Encode { operation: OperationKind::TextCheck, source });

		assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(err.code(), "INTERNAL_ERROR");
		assert_eq!(err.category(), Category::Internal);
		assert_eq!(err.to_failure().error, "internal");
	}

	#[test]
	fn missing_credentials_are_configuration_errors() {
		let err = ApiError::from(ConfigError::MissingCredentials { app_id: true, app_secret: false });
		let failure = serde_json::to_value(err.to_failure()).expect("Failure should serialize.");

		assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(failure["code"], "MISSING_CONFIGURATION");
		assert_eq!(failure["error"], "configuration");
		assert!(failure.get("errcode").is_none());
	}

	#[test]
	fn success_omits_absent_message() {
		let body = serde_json::to_value(Success::new(serde_json::json!({"ok": 1})))
			.expect("Success should serialize.");

		assert_eq!(body, serde_json::json!({"success": true, "data": {"ok": 1}}));
	}
}
