//! Authorization-code flow: building the consent URL and exchanging the returned code.

// self
use crate::{
	_prelude::*,
	auth::TokenState,
	flows::{
		Marketplace,
		common::{TOKEN_CREATE_PATH, TokenResponse},
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
	/// Builds the consent URL the end user is redirected to.
	///
	/// Pure: no network call is made and no state is created.
	pub fn start_authorization(&self) -> Url {
		let mut url = self.descriptor.endpoints.authorization.clone();

		url.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("force_auth", "true")
			.append_pair("redirect_uri", self.descriptor.callback.as_str())
			.append_pair("client_id", &self.credentials.app_key);

		url
	}

	/// Exchanges the authorization code from the callback for a fresh [`TokenState`].
	///
	/// `None` or an empty code yields [`Error::MissingCode`] without touching the network.
	pub async fn complete_authorization(&self, code: Option<&str>) -> Result<TokenState> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "complete_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let code = code.filter(|code| !code.is_empty()).ok_or(Error::MissingCode)?;
				let request =
					SignedRequest::rest(TOKEN_CREATE_PATH).param("code", code).sign(&self.credentials);
				let response = self.send_signed(&request).await?;
				let received_at = OffsetDateTime::now_utc();

				response.json::<TokenResponse>()?.into_state(received_at, None)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
