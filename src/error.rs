//! Gateway-level error types shared across handlers, the token cache, and the upstream client.

// self
use crate::{_prelude::*, auth::IdentifierError, obs::OperationKind, upstream::errcode};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller supplied missing, malformed, or out-of-range parameters.
	#[error(transparent)]
	Input(#[from] InputError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (timeout, DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The upstream platform answered with a non-zero `errcode`.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// The upstream platform answered with a payload that breaks its documented contract.
	#[error(transparent)]
	Contract(#[from] ContractError),
	/// An outbound request body could not be encoded.
	#[error("Failed to encode the {operation} request body.")]
	Encode {
		/// Operation whose body failed to encode.
		operation: OperationKind,
		/// Serializer failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Inbound parameter validation failures.
#[derive(Debug, ThisError)]
pub enum InputError {
	/// Login exchange called without a usable `code`.
	#[error("Missing required parameter: code.")]
	MissingCode,
	/// Text check called without a string `content`.
	#[error("Parameter content is missing or is not a string.")]
	InvalidContent,
	/// Text check called without a usable `openid`.
	#[error("Parameter openid is missing; the v2 content check requires it.")]
	MissingOpenid,
	/// Text check content exceeds the platform limit.
	#[error("Content is {len} units long, exceeding the {max} unit limit.")]
	ContentTooLong {
		/// UTF-16 code unit count of the submitted content.
		len: usize,
		/// Maximum accepted code unit count.
		max: usize,
	},
	/// Text check called with a scene outside the supported set.
	#[error("Parameter scene must be 1 (profile), 2 (comment), 3 (forum), or 4 (social log).")]
	InvalidScene,
	/// Request body could not be decoded as the expected JSON object.
	#[error("Request body is not a valid JSON object.")]
	MalformedBody {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl InputError {
	/// Stable machine-readable code surfaced in error envelopes.
	pub const fn code(&self) -> &'static str {
		match self {
			Self::MissingCode => "MISSING_CODE",
			Self::InvalidContent => "INVALID_PARAMS",
			Self::MissingOpenid => "MISSING_OPENID",
			Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
			Self::InvalidScene => "INVALID_SCENE",
			Self::MalformedBody { .. } => "MALFORMED_BODY",
		}
	}
}

/// Configuration and construction failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// App identifier and/or secret are absent from the process configuration.
	#[error("Mini-program credentials are not configured (app id: {app_id}, app secret: {app_secret}).")]
	MissingCredentials {
		/// Whether the app identifier is present.
		app_id: bool,
		/// Whether the app secret is present.
		app_secret: bool,
	},
	/// Configured app identifier failed validation.
	#[error("Configured app id is invalid.")]
	InvalidAppId(#[source] IdentifierError),
	/// Upstream base URL uses an unsupported scheme or cannot carry paths.
	#[error("Upstream base URL `{url}` must be an absolute http(s) URL.")]
	InvalidEndpoint {
		/// Offending URL.
		url: String,
	},
	/// Upstream endpoint path could not be joined onto the base URL.
	#[error("Upstream endpoint URL could not be built.")]
	EndpointJoin {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, deadline).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The upstream did not answer within the operation's timeout.
	#[error("Request timed out while calling the {operation} endpoint.")]
	Timeout {
		/// Operation that timed out.
		operation: OperationKind,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {operation} endpoint.")]
	Network {
		/// Operation that failed.
		operation: OperationKind,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		operation: OperationKind,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { operation, source: Box::new(src) }
	}

	/// Returns `true` when the failure was a deadline expiry.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}

/// Structured error reported by the upstream platform.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Upstream rejected the {operation} call with errcode {errcode}: {errmsg}.")]
pub struct UpstreamError {
	/// Operation that was rejected.
	pub operation: OperationKind,
	/// Platform error code.
	pub errcode: i64,
	/// Raw platform error message.
	pub errmsg: String,
}
impl UpstreamError {
	/// Human-readable message looked up from the operation's errcode table.
	pub fn friendly_message(&self) -> String {
		errcode::friendly_message(self.operation, self.errcode, &self.errmsg)
	}

	/// Returns `true` when the platform reports that the access token is unusable.
	pub fn is_access_token_rejection(&self) -> bool {
		errcode::is_access_token_rejection(self.operation, self.errcode)
	}
}

/// Upstream responses that break the documented payload contract.
#[derive(Debug, ThisError)]
pub enum ContractError {
	/// A success payload omitted a required field.
	#[error("The {operation} response is missing the `{field}` field.")]
	MissingField {
		/// Operation whose payload was incomplete.
		operation: OperationKind,
		/// Missing field name.
		field: &'static str,
	},
	/// The issued token lifetime was zero or negative.
	#[error("The expires_in value must be positive.")]
	NonPositiveLifetime,
	/// The issued token lifetime does not fit the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	LifetimeOutOfRange,
	/// An identifier returned by the platform failed validation.
	#[error("The {operation} response carries an invalid `{field}`.")]
	InvalidIdentifier {
		/// Operation whose payload carried the identifier.
		operation: OperationKind,
		/// Field name.
		field: &'static str,
		/// Validation failure.
		#[source]
		source: IdentifierError,
	},
	/// The response body was not the JSON shape the operation expects.
	#[error("The {operation} endpoint returned malformed JSON (HTTP {status}).")]
	Parse {
		/// Operation whose payload failed to decode.
		operation: OperationKind,
		/// HTTP status of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The upstream answered with a non-success HTTP status and no structured error.
	#[error("The {operation} endpoint answered with unexpected HTTP status {status}.")]
	UnexpectedStatus {
		/// Operation that failed.
		operation: OperationKind,
		/// HTTP status of the response.
		status: u16,
	},
}
