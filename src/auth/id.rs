//! Validated identifiers for the app and its users.
//!
//! Identifiers enter the gateway from three places: the app id from configuration, an openid
//! submitted with a text check, and the openid/unionid pair returned by a login exchange. All
//! three share one rule set and render to clients as plain strings.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_CHARS: usize = 128;
const MASK_VISIBLE_CHARS: usize = 8;

macro_rules! def_id {
	($(#[$meta:meta])* $name:ident => $kind:literal) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, Serialize)]
		#[serde(into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and wraps it.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				check($kind, &value)?;

				Ok(Self(value))
			}

			/// Prefix-only rendering for logs.
			pub fn masked(&self) -> String {
				let prefix = self.0.chars().take(MASK_VISIBLE_CHARS).collect::<String>();

				format!("{prefix}***")
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.debug_tuple($kind).field(&self.0).finish()
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

def_id! {
	/// Mini-program application identifier issued by the platform.
	AppId => "AppId"
}
def_id! {
	/// Per-app user identifier.
	OpenId => "OpenId"
}
def_id! {
	/// Cross-app user identifier, present when the app is bound to an open platform account.
	UnionId => "UnionId"
}

/// Reasons an identifier is refused.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// Nothing to identify with.
	#[error("{kind} cannot be empty.")]
	Empty {
		/// Identifier kind.
		kind: &'static str,
	},
	/// Whitespace anywhere, including Unicode spaces.
	#[error("{kind} contains whitespace.")]
	ContainsWhitespace {
		/// Identifier kind.
		kind: &'static str,
	},
	/// More than the allowed number of characters.
	#[error("{kind} exceeds {max} characters.")]
	TooLong {
		/// Identifier kind.
		kind: &'static str,
		/// Maximum character count.
		max: usize,
	},
}

fn check(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if value.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if value.chars().count() > IDENTIFIER_MAX_CHARS {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_CHARS });
	}

	Ok(())
}
