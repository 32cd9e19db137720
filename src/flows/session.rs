//! Binding between [`TokenState`] and a caller-owned [`SessionStore`].

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenState},
	flows::Marketplace,
	http::ApiHttpClient,
	store::{SessionStore, StoreError},
	transport::TransportErrorMapper,
};

/// Session key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Session key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Session key holding the absolute expiry in unix seconds.
pub const EXPIRE_IN_KEY: &str = "expire_in";
/// Session key holding the issue instant in unix seconds.
pub const ISSUED_AT_KEY: &str = "issued_at";

/// Loads the token state persisted in `store`.
///
/// Returns `Ok(None)` when the access token or the expiry is absent. A session without
/// `issued_at` reports the expiry as its issue instant.
pub async fn load_token_state<S>(store: &S) -> Result<Option<TokenState>>
where
	S: ?Sized + SessionStore,
{
	let Some(access_token) = store.get(ACCESS_TOKEN_KEY).await?.filter(|v| !v.is_empty()) else {
		return Ok(None);
	};
	let Some(expire_in) = store.get(EXPIRE_IN_KEY).await? else {
		return Ok(None);
	};
	let expires_at = parse_unix(EXPIRE_IN_KEY, &expire_in)?;
	let issued_at = match store.get(ISSUED_AT_KEY).await? {
		Some(raw) => parse_unix(ISSUED_AT_KEY, &raw)?,
		None => expires_at,
	};
	let refresh_token =
		store.get(REFRESH_TOKEN_KEY).await?.filter(|v| !v.is_empty()).map(TokenSecret::new);

	Ok(Some(TokenState {
		access_token: TokenSecret::new(access_token),
		refresh_token,
		issued_at,
		expires_at,
	}))
}

/// Writes every entry of `state` into `store`, removing a stale refresh token.
pub async fn save_token_state<S>(store: &S, state: &TokenState) -> Result<()>
where
	S: ?Sized + SessionStore,
{
	store.set(ACCESS_TOKEN_KEY, state.access_token.expose().to_owned()).await?;

	match &state.refresh_token {
		Some(token) => store.set(REFRESH_TOKEN_KEY, token.expose().to_owned()).await?,
		None => store.remove(REFRESH_TOKEN_KEY).await?,
	}

	store.set(EXPIRE_IN_KEY, state.expires_at_unix().to_string()).await?;
	store.set(ISSUED_AT_KEY, state.issued_at.unix_timestamp().to_string()).await?;

	Ok(())
}

/// Removes every token entry from `store`.
pub async fn clear_token_state<S>(store: &S) -> Result<()>
where
	S: ?Sized + SessionStore,
{
	for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRE_IN_KEY, ISSUED_AT_KEY] {
		store.remove(key).await?;
	}

	Ok(())
}

fn parse_unix(key: &str, raw: &str) -> Result<OffsetDateTime, StoreError> {
	raw.trim()
		.parse::<i64>()
		.ok()
		.and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok())
		.ok_or_else(|| StoreError::Serialization {
			message: format!("Session entry `{key}` is not a unix timestamp: {raw:?}"),
		})
}

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Runs the token gate against the state held in `store`.
	///
	/// A refreshed state is written back. When refreshing fails, or no refresh token is
	/// stored, the session's token entries are cleared before the error is returned.
	pub async fn authorize_session<S>(&self, store: &S) -> Result<TokenState>
	where
		S: ?Sized + SessionStore,
	{
		let current = load_token_state(store).await?;
		let before = current.clone();

		match self.ensure_valid_token(current).await {
			Ok(state) => {
				if before.as_ref() != Some(&state) {
					save_token_state(store, &state).await?;
				}

				Ok(state)
			},
			Err(err) => {
				if matches!(err, Error::RefreshFailed { .. } | Error::NoRefreshToken) {
					clear_token_state(store).await?;
				}

				Err(err)
			},
		}
	}

	/// Exchanges `code` and persists the resulting state in `store`.
	pub async fn complete_session_authorization<S>(
		&self,
		store: &S,
		code: Option<&str>,
	) -> Result<TokenState>
	where
		S: ?Sized + SessionStore,
	{
		let state = self.complete_authorization(code).await?;

		save_token_state(store, &state).await?;

		Ok(state)
	}
}
