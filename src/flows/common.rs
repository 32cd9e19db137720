//! Shared helpers for flow implementations (signed dispatch, token response parsing).

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenState},
	error::ConfigError,
	flows::Marketplace,
	http::ApiHttpClient,
	serde_util,
	sign::{ApiStyle, SignedRequest},
	transport::{FormResponse, TransportErrorMapper},
};

/// REST path exchanging an authorization code for a token triple.
pub const TOKEN_CREATE_PATH: &str = "/auth/token/create";
/// REST path renewing an access token from a refresh token.
pub const TOKEN_REFRESH_PATH: &str = "/auth/token/refresh";

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends a signed request to the endpoint family its name implies.
	pub(crate) async fn send_signed(&self, request: &SignedRequest) -> Result<FormResponse> {
		let endpoint = match request.style() {
			ApiStyle::Rest => self.descriptor.rest_url(&request.method_name)?,
			ApiStyle::Rpc => self.descriptor.endpoints.sync.clone(),
		};

		self.transport.post_form(&endpoint, request.form_pairs()).await
	}
}

/// Body of `/auth/token/create` and `/auth/token/refresh`.
///
/// Every field is optional at the decoding layer so a missing value surfaces as
/// [`Error::MalformedResponse`] rather than a decode failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<Value>,
	#[serde(default)]
	code: Option<Value>,
	#[serde(default)]
	message: Option<String>,
}
impl TokenResponse {
	/// Converts the response into a complete [`TokenState`].
	///
	/// A response without `refresh_token` keeps `previous_refresh`; when there is nothing to
	/// keep the response is malformed.
	pub(crate) fn into_state(
		self,
		received_at: OffsetDateTime,
		previous_refresh: Option<&TokenSecret>,
	) -> Result<TokenState> {
		let detail = self.detail();
		let malformed =
			|field: &str| Error::MalformedResponse { field: field.into(), detail: detail.clone() };
		let access_token =
			self.access_token.filter(|token| !token.is_empty()).ok_or_else(|| malformed("access_token"))?;
		let refresh_token = match self.refresh_token.filter(|token| !token.is_empty()) {
			Some(token) => TokenSecret::new(token),
			None => previous_refresh.cloned().ok_or_else(|| malformed("refresh_token"))?,
		};
		let lifetime = self
			.expires_in
			.as_ref()
			.and_then(serde_util::value_to_string)
			.and_then(|raw| raw.trim().parse::<i64>().ok())
			.filter(|seconds| *seconds > 0)
			.ok_or_else(|| malformed("expires_in"))?;
		let expires_at = received_at
			.checked_add(Duration::seconds(lifetime))
			.ok_or_else(|| malformed("expires_in"))?;

		TokenState::builder()
			.access_token(access_token)
			.maybe_refresh_token(Some(refresh_token))
			.issued_at(received_at)
			.expires_at(expires_at)
			.build()
			.map_err(|err| ConfigError::from(err).into())
	}

	fn detail(&self) -> Option<String> {
		let code = self.code.as_ref().and_then(serde_util::value_to_string);

		match (code, self.message.as_deref()) {
			(Some(code), Some(message)) => Some(format!("{code}: {message}")),
			(Some(code), None) => Some(code),
			(None, Some(message)) => Some(message.to_owned()),
			(None, None) => None,
		}
	}
}
