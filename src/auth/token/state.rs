//! Session-owned token state, lifecycle checks, and the builder used by the token flows.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced by [`TokenStateBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenStateBuilderError {
	/// No access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// No expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// The token lifetime was zero or negative.
	#[error("Token lifetime must be positive.")]
	NonPositiveLifetime,
	/// The relative expiry lands outside the representable date range.
	#[error("Token lifetime overflows the supported date range.")]
	ExpiryOutOfRange,
}

/// Access/refresh token pair plus its expiry, as held in a caller's session.
///
/// Values are only produced by the token flows, so a `TokenState` is always complete:
/// there is no way to observe an access token without its expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
	/// Access token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token, if one has been issued.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the token response was received.
	#[serde(with = "time::serde::timestamp")]
	pub issued_at: OffsetDateTime,
	/// `issued_at` plus the server-reported `expires_in`.
	#[serde(with = "time::serde::timestamp")]
	pub expires_at: OffsetDateTime,
}
impl TokenState {
	/// Returns a builder for constructing token state.
	pub fn builder() -> TokenStateBuilder {
		TokenStateBuilder::default()
	}

	/// Expiry as whole seconds since the unix epoch.
	pub fn expires_at_unix(&self) -> i64 {
		self.expires_at.unix_timestamp()
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` when `instant + skew` reaches the expiry.
	pub fn needs_refresh_at(&self, instant: OffsetDateTime, skew: Duration) -> bool {
		instant + skew >= self.expires_at
	}

	/// Time left before expiry; negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}
}
impl Debug for TokenState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenState")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenState`].
#[derive(Clone, Debug, Default)]
pub struct TokenStateBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenStateBuilder {
	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry measured from the issued-at instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides an optional refresh token, keeping any previously set value on `None`.
	pub fn maybe_refresh_token(self, token: Option<TokenSecret>) -> Self {
		match token {
			Some(secret) => Self { refresh_token: Some(secret), ..self },
			None => self,
		}
	}

	/// Consumes the builder and produces a [`TokenState`].
	pub fn build(self) -> Result<TokenState, TokenStateBuilderError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.is_empty())
			.ok_or(TokenStateBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(TokenStateBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(TokenStateBuilderError::MissingExpiry),
		};

		if expires_at <= issued_at {
			return Err(TokenStateBuilderError::NonPositiveLifetime);
		}

		Ok(TokenState { access_token, refresh_token: self.refresh_token, issued_at, expires_at })
	}
}
