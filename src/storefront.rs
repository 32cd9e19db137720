//! Storefront admin OAuth handshake.
//!
//! The storefront side is a classic authorization-code exchange: the merchant is sent to
//! the shop's consent page, the platform redirects back with query parameters signed by an
//! HMAC over the sorted parameter set, and the code is traded for a permanent access token.

// crates.io
use hmac::{Hmac, Mac};
use rand::{Rng, distr::Alphanumeric};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{ShopDomain, TokenSecret},
	error::ConfigError,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::builder,
	transport::{FormTransport, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, transport::ReqwestTransportErrorMapper};

type HmacSha256 = Hmac<Sha256>;

const STATE_LEN: usize = 32;

/// Maximum age of a signed callback.
pub const CALLBACK_MAX_AGE: Duration = Duration::hours(24);

/// Storefront application registration.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorefrontApp {
	/// Public client identifier.
	pub client_id: String,
	/// Shared secret; keys callback HMACs and authenticates the token request.
	pub client_secret: TokenSecret,
	/// Admin API version sessions are pinned to, e.g. `2024-10`.
	pub api_version: String,
	/// Requested access scopes.
	pub scopes: Vec<String>,
	/// Callback URL registered with the application.
	pub redirect_uri: Url,
}
impl Debug for StorefrontApp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StorefrontApp")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("api_version", &self.api_version)
			.field("scopes", &self.scopes)
			.field("redirect_uri", &self.redirect_uri)
			.finish()
	}
}

/// Consent URL plus the state value that must come back on the callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorefrontAuthorization {
	/// Shop being installed.
	pub shop: ShopDomain,
	/// URL the merchant is redirected to.
	pub url: Url,
	/// Random nonce the caller keeps in its session.
	pub state: String,
}

/// Access granted by a shop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontSession {
	/// Shop the token belongs to.
	pub shop: ShopDomain,
	/// Permanent admin access token.
	pub access_token: TokenSecret,
	/// Scopes the merchant granted.
	pub scopes: Vec<String>,
	/// Admin API version the session is pinned to.
	pub api_version: String,
}
impl Debug for StorefrontSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StorefrontSession")
			.field("shop", &self.shop)
			.field("access_token", &"<redacted>")
			.field("scopes", &self.scopes)
			.field("api_version", &self.api_version)
			.finish()
	}
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	scope: Option<String>,
}

#[cfg(feature = "reqwest")]
/// Storefront client specialized for the crate's default reqwest transport stack.
pub type ReqwestStorefront = Storefront<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Storefront OAuth client.
pub struct Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Application registration.
	pub app: StorefrontApp,
	/// Transport used for the token request.
	pub transport: FormTransport<C, M>,
	admin_origin: Option<Url>,
}
impl<C, M> Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		app: StorefrontApp,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self { app, transport: FormTransport::new(http_client, mapper), admin_origin: None }
	}

	/// Sends admin requests to `origin` instead of `https://{shop}`.
	pub fn with_admin_origin(mut self, origin: Url) -> Result<Self> {
		builder::validate_endpoint("admin", &origin).map_err(ConfigError::from)?;

		self.admin_origin = Some(origin);

		Ok(self)
	}

	/// Builds the consent URL for `shop` with a fresh random state.
	pub fn authorization(&self, shop: &str) -> Result<StorefrontAuthorization> {
		let shop = ShopDomain::new(shop).map_err(ConfigError::from)?;
		let state = random_string(STATE_LEN);
		let mut url = self.admin_url(&shop, "/admin/oauth/authorize")?;

		url.query_pairs_mut()
			.append_pair("client_id", &self.app.client_id)
			.append_pair("scope", &self.app.scopes.join(","))
			.append_pair("redirect_uri", self.app.redirect_uri.as_str())
			.append_pair("state", &state);

		Ok(StorefrontAuthorization { shop, url, state })
	}

	/// Verifies a callback's HMAC, age, and state, returning the calling shop.
	pub fn verify_callback(
		&self,
		params: &BTreeMap<String, String>,
		expected_state: Option<&str>,
	) -> Result<ShopDomain> {
		self.verify_callback_at(params, expected_state, OffsetDateTime::now_utc())
	}

	/// Same as [`Storefront::verify_callback`] with an explicit clock reading.
	pub fn verify_callback_at(
		&self,
		params: &BTreeMap<String, String>,
		expected_state: Option<&str>,
		now: OffsetDateTime,
	) -> Result<ShopDomain> {
		let provided = params.get("hmac").ok_or_else(|| rejected("missing hmac"))?;
		let provided = hex::decode(provided).map_err(|_| rejected("hmac is not hex"))?;
		let mut mac = HmacSha256::new_from_slice(self.app.client_secret.expose().as_bytes())
			.unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));

		mac.update(callback_message(params).as_bytes());
		mac.verify_slice(&provided).map_err(|_| rejected("hmac mismatch"))?;

		let issued = params
			.get("timestamp")
			.and_then(|raw| raw.trim().parse::<i64>().ok())
			.and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok())
			.ok_or_else(|| rejected("missing or invalid timestamp"))?;

		if now - issued > CALLBACK_MAX_AGE {
			return Err(rejected("callback is older than 24 hours"));
		}
		if expected_state
			.is_some_and(|expected| params.get("state").map(String::as_str) != Some(expected))
		{
			return Err(rejected("state mismatch"));
		}

		let shop = params.get("shop").ok_or_else(|| rejected("missing shop"))?;

		ShopDomain::new(shop).map_err(|err| rejected(&err.to_string()))
	}

	/// Verifies the callback and exchanges its `code` for a [`StorefrontSession`].
	pub async fn request_token(
		&self,
		params: &BTreeMap<String, String>,
		expected_state: Option<&str>,
	) -> Result<StorefrontSession> {
		const KIND: FlowKind = FlowKind::Storefront;

		let span = FlowSpan::new(KIND, "request_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let shop = self.verify_callback(params, expected_state)?;
				let code = params
					.get("code")
					.map(String::as_str)
					.filter(|code| !code.is_empty())
					.ok_or(Error::MissingCode)?;
				let endpoint = self.admin_url(&shop, "/admin/oauth/access_token")?;
				let response = self
					.transport
					.post_form(
						&endpoint,
						[
							("client_id", self.app.client_id.as_str()),
							("client_secret", self.app.client_secret.expose()),
							("code", code),
						],
					)
					.await?;
				let body = response.json::<AccessTokenResponse>()?;
				let access_token = body
					.access_token
					.filter(|token| !token.is_empty())
					.ok_or_else(|| Error::malformed("access_token"))?;
				let scopes = match body.scope {
					Some(scope) => split_scopes(&scope),
					None => self.app.scopes.clone(),
				};

				Ok(StorefrontSession {
					shop,
					access_token: TokenSecret::new(access_token),
					scopes,
					api_version: self.app.api_version.clone(),
				})
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	fn admin_url(&self, shop: &ShopDomain, path: &str) -> Result<Url> {
		let raw = match &self.admin_origin {
			Some(origin) => format!("{}{path}", origin.as_str().trim_end_matches('/')),
			None => format!("https://{shop}{path}"),
		};

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source }.into())
	}
}
#[cfg(feature = "reqwest")]
impl Storefront<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by a fresh reqwest transport with the default timeout.
	pub fn new(app: StorefrontApp) -> Result<Self> {
		Ok(Self::with_http_client(app, ReqwestHttpClient::try_new()?, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Debug for Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Storefront")
			.field("app", &self.app)
			.field("admin_origin", &self.admin_origin)
			.finish()
	}
}

/// Message covered by the callback HMAC: sorted `key=value` pairs without `hmac` and
/// `signature`, joined by `&`.
pub fn callback_message(params: &BTreeMap<String, String>) -> String {
	params
		.iter()
		.filter(|(key, _)| !matches!(key.as_str(), "hmac" | "signature"))
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join("&")
}

fn split_scopes(raw: &str) -> Vec<String> {
	raw.split(',').map(str::trim).filter(|scope| !scope.is_empty()).map(str::to_owned).collect()
}

fn rejected(reason: &str) -> Error {
	Error::CallbackRejected { reason: reason.into() }
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
