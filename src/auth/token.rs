//! Cached access token record and lifecycle helpers.

// self
use crate::{_prelude::*, auth::Secret};

/// Lifecycle status of a cached token relative to an instant and a refresh margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// Token can be handed out as-is.
	Usable,
	/// Token has not expired yet but sits inside the refresh margin.
	RefreshDue,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Access token as returned by the issuance endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
	/// Token value; callers must avoid logging it.
	pub value: Secret,
	/// Lifetime reported by the platform.
	pub lifetime: Duration,
}

/// Access token held by the process-wide cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedToken {
	/// Token value; callers must avoid logging it.
	pub value: Secret,
	/// Instant the issuance call was started.
	pub issued_at: OffsetDateTime,
	/// Absolute expiry instant (`issued_at + lifetime`).
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Stamps an issued token with the instant its issuance started.
	pub fn from_issued(issued: IssuedToken, issued_at: OffsetDateTime) -> Self {
		Self { value: issued.value, issued_at, expires_at: issued_at + issued.lifetime }
	}

	/// Computes the lifecycle status at `instant`, treating the last `margin` before expiry as
	/// due for refresh.
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> TokenStatus {
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}
		if instant >= self.expires_at - margin {
			return TokenStatus::RefreshDue;
		}

		TokenStatus::Usable
	}

	/// Returns `true` if the token may be handed out at `instant`.
	pub fn is_usable_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(instant, margin), TokenStatus::Usable)
	}

	/// Time left until `expires_at`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
