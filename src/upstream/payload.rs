//! Domain types for the upstream operations and their wire representations.

// self
use crate::{
	_prelude::*,
	auth::{OpenId, Secret, UnionId},
	error::InputError,
};

/// Maximum content length accepted by the v2 text check, in UTF-16 code units.
pub const MAX_CONTENT_UNITS: usize = 2500;

/// Identity returned by a successful login-code exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginSession {
	/// Per-app user identifier.
	pub openid: OpenId,
	/// Session key; must never be sent back to clients.
	pub session_key: Option<Secret>,
	/// Cross-app identifier, when the app is bound to an open platform account.
	pub unionid: Option<UnionId>,
}
impl LoginSession {
	/// Client-facing identity; the session key stays behind.
	pub fn identity(&self) -> LoginIdentity {
		LoginIdentity { openid: self.openid.clone(), unionid: self.unionid.clone() }
	}
}

/// Identity returned to clients after a login exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginIdentity {
	/// Per-app user identifier.
	pub openid: OpenId,
	/// Cross-app identifier, when available.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub unionid: Option<UnionId>,
}

/// Content-check scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Scene {
	/// User profile fields.
	Profile,
	/// Comments.
	#[default]
	Comment,
	/// Forum posts.
	Forum,
	/// Social log entries.
	SocialLog,
}
impl Scene {
	/// Wire value.
	pub const fn as_u8(self) -> u8 {
		match self {
			Scene::Profile => 1,
			Scene::Comment => 2,
			Scene::Forum => 3,
			Scene::SocialLog => 4,
		}
	}
}
impl From<Scene> for u8 {
	fn from(value: Scene) -> Self {
		value.as_u8()
	}
}
impl TryFrom<i64> for Scene {
	type Error = InputError;

	fn try_from(value: i64) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(Scene::Profile),
			2 => Ok(Scene::Comment),
			3 => Ok(Scene::Forum),
			4 => Ok(Scene::SocialLog),
			_ => Err(InputError::InvalidScene),
		}
	}
}

/// Moderation verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suggestion {
	/// Content may be published.
	Pass,
	/// Content needs human review.
	Review,
	/// Content violates the platform rules.
	Risky,
}
impl Suggestion {
	/// Wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Suggestion::Pass => "pass",
			Suggestion::Review => "review",
			Suggestion::Risky => "risky",
		}
	}

	/// Human-readable explanation for end users.
	pub const fn message(self) -> &'static str {
		match self {
			Suggestion::Pass => "Content is safe to publish.",
			Suggestion::Review => "Content needs manual review.",
			Suggestion::Risky => "Content contains violations and should not be published.",
		}
	}
}
impl Display for Suggestion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated text check parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextCheckParams {
	/// Text to check.
	pub content: String,
	/// User the content is attributed to.
	pub openid: OpenId,
	/// Scene the content appears in.
	pub scene: Scene,
	/// Optional title.
	pub title: Option<String>,
	/// Optional nickname.
	pub nickname: Option<String>,
	/// Optional signature; only meaningful for [`Scene::Profile`].
	pub signature: Option<String>,
}
impl TextCheckParams {
	/// Builds parameters, enforcing the content length limit.
	pub fn new(content: impl Into<String>, openid: OpenId, scene: Scene) -> Result<Self, InputError> {
		let content = content.into();

		ensure_content_len(&content)?;

		Ok(Self { content, openid, scene, title: None, nickname: None, signature: None })
	}

	/// Sets the title.
	pub fn with_title(mut self, title: Option<String>) -> Self {
		self.title = title;

		self
	}

	/// Sets the nickname.
	pub fn with_nickname(mut self, nickname: Option<String>) -> Self {
		self.nickname = nickname;

		self
	}

	/// Sets the signature.
	pub fn with_signature(mut self, signature: Option<String>) -> Self {
		self.signature = signature;

		self
	}

	pub(crate) fn wire_body(&self) -> TextCheckBody<'_> {
		TextCheckBody {
			version: 2,
			openid: &self.openid,
			scene: self.scene,
			content: &self.content,
			title: non_empty(self.title.as_deref()),
			nickname: non_empty(self.nickname.as_deref()),
			signature: if self.scene == Scene::Profile {
				non_empty(self.signature.as_deref())
			} else {
				None
			},
		}
	}
}

/// Moderation result.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCheckVerdict {
	/// Overall verdict.
	pub suggestion: Suggestion,
	/// Category label of the strongest hit (100 means normal).
	pub label: i64,
	/// Platform trace identifier.
	pub trace_id: Option<String>,
	/// Per-strategy details as returned by the platform.
	pub detail: serde_json::Value,
}
impl TextCheckVerdict {
	/// Returns `true` when the content may be published without review.
	pub fn is_safe(&self) -> bool {
		matches!(self.suggestion, Suggestion::Pass)
	}
}

/// Outbound v2 text check body.
#[derive(Debug, Serialize)]
pub(crate) struct TextCheckBody<'a> {
	pub(crate) version: u8,
	pub(crate) openid: &'a str,
	pub(crate) scene: Scene,
	pub(crate) content: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub(crate) title: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub(crate) nickname: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub(crate) signature: Option<&'a str>,
}

/// `errcode`/`errmsg` pair every platform response may carry.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct PlatformStatus {
	#[serde(default)]
	pub(crate) errcode: Option<i64>,
	#[serde(default)]
	pub(crate) errmsg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginPayload {
	#[serde(flatten)]
	pub(crate) status: PlatformStatus,
	#[serde(default)]
	pub(crate) openid: Option<String>,
	#[serde(default)]
	pub(crate) session_key: Option<String>,
	#[serde(default)]
	pub(crate) unionid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenPayload {
	#[serde(flatten)]
	pub(crate) status: PlatformStatus,
	#[serde(default)]
	pub(crate) access_token: Option<String>,
	#[serde(default)]
	pub(crate) expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextCheckPayload {
	#[serde(flatten)]
	pub(crate) status: PlatformStatus,
	#[serde(default)]
	pub(crate) trace_id: Option<String>,
	#[serde(default)]
	pub(crate) result: Option<TextCheckResultPayload>,
	#[serde(default)]
	pub(crate) detail: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextCheckResultPayload {
	pub(crate) suggest: Suggestion,
	pub(crate) label: i64,
}

/// Rejects content longer than [`MAX_CONTENT_UNITS`] UTF-16 code units.
///
/// Characters outside the Basic Multilingual Plane count twice.
pub fn ensure_content_len(content: &str) -> Result<(), InputError> {
	let len = content.encode_utf16().count();

	if len > MAX_CONTENT_UNITS {
		return Err(InputError::ContentTooLong { len, max: MAX_CONTENT_UNITS });
	}

	Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.is_empty())
}
