//! Request signing for the marketplace open platform.
//!
//! [`sign`] is a pure function: parameters are sorted by key, concatenated as
//! `key + value`, optionally prefixed with a REST path, and authenticated with
//! HMAC-SHA256. [`SignedRequest`] stamps the mandatory system parameters (`app_key`,
//! `timestamp`, `sign_method`, and `method` for RPC calls) before computing `sign`.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::form_urlencoded;
// self
use crate::{_prelude::*, auth::TokenSecret};

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm advertised through the `sign_method` parameter.
pub const SIGN_METHOD: &str = "sha256";

/// Application key/secret pair registered with the marketplace.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
	/// Public application key, sent as `app_key`.
	pub app_key: String,
	/// Shared signing secret.
	pub app_secret: TokenSecret,
}
impl Credentials {
	/// Creates a credential pair.
	pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
		Self { app_key: app_key.into(), app_secret: TokenSecret::new(app_secret) }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("app_key", &self.app_key)
			.field("app_secret", &"<redacted>")
			.finish()
	}
}

/// Computes the upper-case hex HMAC-SHA256 signature for a parameter set.
///
/// `api_name` is prepended to the signed string only when it contains `/`, i.e. when it
/// names a REST path rather than an RPC method.
pub fn sign<K, V>(secret: &str, api_name: &str, parameters: &BTreeMap<K, V>) -> String
where
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
		.unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));

	if api_name.contains('/') {
		mac.update(api_name.as_bytes());
	}
	for (key, value) in parameters {
		mac.update(key.as_ref().as_bytes());
		mac.update(value.as_ref().as_bytes());
	}

	hex::encode_upper(mac.finalize().into_bytes())
}

/// Endpoint family a request is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiStyle {
	/// REST path such as `/auth/token/create`, sent to the REST base.
	Rest,
	/// Dotted RPC method such as `aliexpress.ds.product.get`, sent to the sync base.
	Rpc,
}
impl ApiStyle {
	/// Infers the style from the API name.
	pub fn of(api_name: &str) -> Self {
		if api_name.contains('/') { Self::Rest } else { Self::Rpc }
	}
}

/// Builder for a single signed call; consumed by [`SignedRequest::sign`].
#[derive(Clone, Debug)]
pub struct SignedRequestBuilder {
	api_name: String,
	parameters: BTreeMap<String, String>,
	timestamp: Option<OffsetDateTime>,
}
impl SignedRequestBuilder {
	/// Adds a parameter, coercing it to its canonical string form.
	pub fn param(mut self, key: impl Into<String>, value: impl Display) -> Self {
		self.parameters.insert(key.into(), value.to_string());

		self
	}

	/// Adds several pre-stringified parameters.
	pub fn params<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.parameters.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Pins the `timestamp` parameter instead of reading the clock.
	pub fn timestamp(mut self, instant: OffsetDateTime) -> Self {
		self.timestamp = Some(instant);

		self
	}

	/// Stamps system parameters and computes the signature.
	pub fn sign(self, credentials: &Credentials) -> SignedRequest {
		let Self { api_name, mut parameters, timestamp } = self;
		let instant = timestamp.unwrap_or_else(OffsetDateTime::now_utc);
		let millis = instant.unix_timestamp_nanos() / 1_000_000;

		parameters.insert("app_key".into(), credentials.app_key.clone());
		parameters.insert("timestamp".into(), millis.to_string());
		parameters.insert("sign_method".into(), SIGN_METHOD.into());

		if ApiStyle::of(&api_name) == ApiStyle::Rpc {
			parameters.insert("method".into(), api_name.clone());
		}

		parameters.remove("sign");

		let signature = sign(credentials.app_secret.expose(), &api_name, &parameters);

		SignedRequest { method_name: api_name, parameters, signature }
	}
}

/// Fully signed call, built fresh for each request and never reused.
#[derive(Clone)]
pub struct SignedRequest {
	/// REST path or RPC method name.
	pub method_name: String,
	/// Signed parameter set, excluding `sign`.
	pub parameters: BTreeMap<String, String>,
	/// Upper-case hex signature.
	pub signature: String,
}
impl SignedRequest {
	/// Starts a REST-style request (`api_name` should start with `/`).
	pub fn rest(path: impl Into<String>) -> SignedRequestBuilder {
		Self::builder(path.into())
	}

	/// Starts an RPC-style request addressed by dotted method name.
	pub fn rpc(method: impl Into<String>) -> SignedRequestBuilder {
		Self::builder(method.into())
	}

	fn builder(api_name: String) -> SignedRequestBuilder {
		SignedRequestBuilder { api_name, parameters: BTreeMap::new(), timestamp: None }
	}

	/// Endpoint family of this request.
	pub fn style(&self) -> ApiStyle {
		ApiStyle::of(&self.method_name)
	}

	/// Sorted parameter pairs followed by `sign`.
	pub fn form_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
		self.parameters
			.iter()
			.map(|(k, v)| (k.as_str(), v.as_str()))
			.chain([("sign", self.signature.as_str())])
	}

	/// Percent-encoded `application/x-www-form-urlencoded` body.
	pub fn form_body(&self) -> String {
		form_urlencoded::Serializer::new(String::new()).extend_pairs(self.form_pairs()).finish()
	}
}
impl Debug for SignedRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let redacted = self
			.parameters
			.iter()
			.map(|(k, v)| {
				let shown = if is_sensitive(k) { "<redacted>" } else { v.as_str() };

				(k.as_str(), shown)
			})
			.collect::<BTreeMap<_, _>>();

		f.debug_struct("SignedRequest")
			.field("method_name", &self.method_name)
			.field("parameters", &redacted)
			.field("signature", &self.signature)
			.finish()
	}
}

fn is_sensitive(key: &str) -> bool {
	matches!(key, "access_token" | "refresh_token" | "code")
}
