//! Static errcode → message tables, one per upstream operation.

// self
use crate::obs::OperationKind;

/// Messages for the login-code exchange.
pub const LOGIN_MESSAGES: &[(i64, &str)] = &[
	(-1, "The platform is busy, please try again later."),
	(40029, "Login credential is invalid, please log in again."),
	(40163, "Login credential has already been used, please log in again."),
	(40226, "Login was blocked for a high-risk user."),
	(45011, "Too many login attempts, please try again later."),
];

/// Messages for access token issuance.
pub const ACCESS_TOKEN_MESSAGES: &[(i64, &str)] = &[
	(-1, "The platform is busy, please try again later."),
	(40001, "App secret is invalid."),
	(40002, "Grant type is invalid."),
	(40013, "App id is invalid."),
	(40125, "App secret is invalid."),
	(40164, "Caller IP address is not in the platform allowlist."),
	(41004, "App secret is missing."),
	(45009, "Daily access token quota exceeded."),
	(89503, "Caller IP address requires administrator confirmation."),
];

/// Messages for the v2 text content check.
pub const TEXT_CHECK_MESSAGES: &[(i64, &str)] = &[
	(-1, "The platform is busy, please try again later."),
	(40001, "Access token is invalid or expired."),
	(40003, "Openid is invalid."),
	(40014, "Access token is invalid."),
	(40129, "Scene value is invalid (supported: 1-4)."),
	(42001, "Access token has expired."),
	(43002, "The content check must be called with POST."),
	(43104, "App id and openid do not match."),
	(44002, "Request parameters are empty."),
	(44991, "Per-minute call limit exceeded."),
	(45009, "Daily call limit exceeded."),
	(47001, "Request parameters are malformed."),
	(61010, "User access record expired; the user must have opened the app within the last two hours."),
];

/// Table for `operation`.
pub const fn table(operation: OperationKind) -> &'static [(i64, &'static str)] {
	match operation {
		OperationKind::LoginExchange => LOGIN_MESSAGES,
		OperationKind::AccessToken => ACCESS_TOKEN_MESSAGES,
		OperationKind::TextCheck => TEXT_CHECK_MESSAGES,
	}
}

/// Looks up the mapped message for `errcode`.
pub fn lookup(operation: OperationKind, errcode: i64) -> Option<&'static str> {
	table(operation).iter().find(|(code, _)| *code == errcode).map(|(_, message)| *message)
}

/// Mapped message, or a generic one carrying the raw code and upstream message.
pub fn friendly_message(operation: OperationKind, errcode: i64, errmsg: &str) -> String {
	if let Some(message) = lookup(operation, errcode) {
		return message.to_owned();
	}

	let errmsg = errmsg.trim();

	if errmsg.is_empty() {
		format!("Upstream {operation} request failed with errcode {errcode}.")
	} else {
		format!("Upstream {operation} request failed with errcode {errcode}: {errmsg}.")
	}
}

/// Returns `true` for text check codes that mean the access token itself was refused.
pub fn is_access_token_rejection(operation: OperationKind, errcode: i64) -> bool {
	matches!(operation, OperationKind::TextCheck) && matches!(errcode, 40001 | 40014 | 42001)
}
