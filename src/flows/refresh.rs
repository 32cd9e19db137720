//! Token gate and refresh-token renewal.
//!
//! [`Marketplace::ensure_valid_token`] is the single gate every business call passes
//! through: it returns the caller's state untouched while it is comfortably valid and
//! performs exactly one `/auth/token/refresh` call once the expiry falls inside the skew
//! window. Refresh failures are never retried; they surface as
//! [`Error::RefreshFailed`] so the caller restarts authorization.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::TokenState,
	flows::{
		Marketplace,
		common::{TOKEN_REFRESH_PATH, TokenResponse},
	},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	sign::SignedRequest,
	transport::TransportErrorMapper,
};

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a token state that stays valid for at least the skew window.
	pub async fn ensure_valid_token(&self, state: Option<TokenState>) -> Result<TokenState> {
		self.ensure_valid_token_at(state, OffsetDateTime::now_utc()).await
	}

	/// Same as [`Marketplace::ensure_valid_token`] with an explicit clock reading.
	pub async fn ensure_valid_token_at(
		&self,
		state: Option<TokenState>,
		now: OffsetDateTime,
	) -> Result<TokenState> {
		let state = state.ok_or(Error::Unauthenticated)?;

		if state.needs_refresh_at(now, self.skew) { self.refresh(&state).await } else { Ok(state) }
	}

	/// Renews the access token with the stored refresh token.
	///
	/// The previous refresh token is kept when the response omits a new one. Any failure
	/// after the request is built is wrapped in [`Error::RefreshFailed`].
	pub async fn refresh(&self, state: &TokenState) -> Result<TokenState> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let refresh_token = state.refresh_token.as_ref().ok_or(Error::NoRefreshToken)?;

				self.refresh_metrics.record_sent();

				let renewed: Result<TokenState> = async {
					let request = SignedRequest::rest(TOKEN_REFRESH_PATH)
						.param("refresh_token", refresh_token.expose())
						.sign(&self.credentials);
					let response = self.send_signed(&request).await?;
					let received_at = OffsetDateTime::now_utc();

					response.json::<TokenResponse>()?.into_state(received_at, Some(refresh_token))
				}
				.await;

				self.refresh_metrics.record_outcome(&renewed);

				renewed.map_err(|err| Error::RefreshFailed { source: Box::new(err) })
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
