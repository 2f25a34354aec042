//! Process-lifetime access token cache with expiry-based refresh.
//!
//! [`TokenCache`] holds at most one [`CachedToken`]. A lookup hands the cached value out while
//! `now < expires_at - refresh_margin`; otherwise it asks a [`TokenIssuer`] for a fresh token
//! and stores it. The cell is locked only while reading or writing it, never across the
//! issuance call, so concurrent callers that miss at the same time each issue their own
//! request and the last write wins. A failed issuance leaves the cache untouched.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, IssuedToken, Secret},
};

/// Boxed future returned by [`TokenIssuer::issue`].
pub type IssueFuture<'a> = Pin<Box<dyn Future<Output = Result<IssuedToken>> + 'a + Send>>;

/// Source of wall-clock instants for expiry decisions.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Current instant.
	fn now(&self) -> OffsetDateTime;
}

/// [`Clock`] backed by the system UTC clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Anything able to mint a new access token.
pub trait TokenIssuer
where
	Self: Send + Sync,
{
	/// Requests a new token from the platform.
	fn issue(&self) -> IssueFuture<'_>;
}

/// Token handed to callers together with its freshness details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenLease {
	/// Token value; callers must avoid logging it.
	pub token: Secret,
	/// Time left until the token expires.
	pub expires_in: Duration,
	/// `true` when the value came from the cache without an issuance call.
	pub from_cache: bool,
}

/// Single-value access token cache.
pub struct TokenCache {
	slot: RwLock<Option<CachedToken>>,
	refresh_margin: Duration,
	clock: Arc<dyn Clock>,
}
impl TokenCache {
	/// Margin used when none is configured.
	pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::minutes(5);

	/// Creates an empty cache backed by the system clock.
	pub fn new(refresh_margin: Duration) -> Self {
		Self::with_clock(refresh_margin, Arc::new(SystemClock))
	}

	/// Creates an empty cache that reads time from `clock`.
	pub fn with_clock(refresh_margin: Duration, clock: Arc<dyn Clock>) -> Self {
		let refresh_margin =
			if refresh_margin.is_negative() { Duration::ZERO } else { refresh_margin };

		Self { slot: RwLock::new(None), refresh_margin, clock }
	}

	/// Margin before expiry inside which a cached token is no longer handed out.
	pub fn refresh_margin(&self) -> Duration {
		self.refresh_margin
	}

	/// Returns the cached token if it is still usable, without any I/O.
	pub fn peek(&self) -> Option<TokenLease> {
		self.lease_at(self.clock.now())
	}

	/// Returns a usable token, issuing a new one through `issuer` on miss or expiry.
	pub async fn get_token(&self, issuer: &dyn TokenIssuer) -> Result<TokenLease> {
		let now = self.clock.now();

		if let Some(lease) = self.lease_at(now) {
			tracing::debug!(expires_in = lease.expires_in.whole_seconds(), "Access token cache hit.");

			return Ok(lease);
		}

		tracing::debug!("Access token cache miss; issuing a new token.");

		let issued = issuer.issue().await?;
		let lease =
			TokenLease { token: issued.value.clone(), expires_in: issued.lifetime, from_cache: false };

		*self.slot.write() = Some(CachedToken::from_issued(issued, now));

		Ok(lease)
	}

	/// Drops the cached entry if it still holds `rejected`; returns whether it did.
	pub fn invalidate(&self, rejected: &Secret) -> bool {
		let mut slot = self.slot.write();

		if slot.as_ref().is_some_and(|cached| &cached.value == rejected) {
			*slot = None;

			tracing::info!("Dropped an access token the platform rejected.");

			return true;
		}

		false
	}

	fn lease_at(&self, now: OffsetDateTime) -> Option<TokenLease> {
		self.slot.read().as_ref().filter(|cached| cached.is_usable_at(now, self.refresh_margin)).map(
			|cached| TokenLease {
				token: cached.value.clone(),
				expires_in: cached.remaining_at(now),
				from_cache: true,
			},
		)
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("cached", &self.slot.read().as_ref().map(|cached| cached.expires_at))
			.field("refresh_margin", &self.refresh_margin)
			.finish()
	}
}
