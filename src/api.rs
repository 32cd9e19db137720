//! Signed business calls against the marketplace sync endpoint.
//!
//! Every call goes through [`Marketplace::call`], which signs the parameters together with
//! the caller's access token, posts them to the sync base, and unwraps the
//! `<method>_response` envelope. The typed helpers in the submodules reshape the envelope
//! into the values a storefront needs. Callers pass a [`TokenState`] that already went
//! through [`Marketplace::ensure_valid_token`].

pub mod feed;
pub mod freight;
pub mod image;
pub mod product;
pub mod search;

pub use feed::*;
pub use freight::*;
pub use image::*;
pub use product::*;
pub use search::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenState,
	flows::Marketplace,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	serde_util,
	sign::SignedRequest,
	transport::TransportErrorMapper,
};

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Performs a signed RPC call and returns the method's response envelope.
	///
	/// An `error_response` body becomes [`Error::Api`]; a body without the
	/// `<method with dots replaced by underscores>_response` key is
	/// [`Error::MalformedResponse`].
	pub async fn call<I, K, V>(&self, token: &TokenState, method: &str, params: I) -> Result<Value>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		const KIND: FlowKind = FlowKind::ApiCall;

		let span = FlowSpan::new(KIND, "call");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let request = SignedRequest::rpc(method)
			.params(params)
			.param("access_token", token.access_token.expose())
			.sign(&self.credentials);
		let result = span
			.instrument(async move {
				let response = self.send_signed(&request).await?;

				unwrap_envelope(method, response.json()?)
			})
			.await;

		obs::record_result(KIND, &result);
		obs::record_api_call(
			method,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result
	}
}

/// Key of the success envelope for `method`.
pub fn response_key(method: &str) -> String {
	format!("{}_response", method.replace('.', "_"))
}

fn unwrap_envelope(method: &str, mut body: Value) -> Result<Value> {
	if let Some(error) = body.get("error_response") {
		return Err(api_error(method, error));
	}

	let key = response_key(method);

	body.get_mut(&key).map(Value::take).ok_or_else(|| Error::malformed(key))
}

/// Builds [`Error::Api`] from an object carrying `code` and `msg`/`message`.
pub(crate) fn api_error(method: &str, error: &Value) -> Error {
	let code = error
		.get("code")
		.or_else(|| error.get("rsp_code"))
		.and_then(serde_util::value_to_string)
		.unwrap_or_else(|| "unknown".into());
	let message = ["msg", "message", "rsp_msg"]
		.iter()
		.find_map(|key| error.get(key).and_then(serde_util::value_to_string))
		.unwrap_or_default();

	Error::Api { method: method.into(), code, message }
}

/// Decodes a JSON fragment, reporting the failing path.
pub(crate) fn decode<T>(value: Value) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(|source| Error::Decode { source, status: None })
}
