//! Form-POST transport shared by the marketplace and storefront clients.
//!
//! [`FormTransport`] turns a parameter set into a single
//! `application/x-www-form-urlencoded` POST, converts every failure into the crate error
//! taxonomy through a [`TransportErrorMapper`], and treats any non-2xx status as
//! [`TransportError::Status`]. Nothing is retried.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError,
	http::{Method, Request, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

/// Content type sent with every signed call.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

const BODY_PREVIEW_LIMIT: usize = 256;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted while calling `endpoint`.
	fn map_transport_error(
		&self,
		endpoint: &Url,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: &Url,
		_metadata: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Io(std::io::Error::other(message)).into(),
			_ => TransportError::Io(std::io::Error::other("unrecognized HTTP client failure")).into(),
		}
	}
}

/// Raw response of a successful (2xx) form POST.
#[derive(Clone, Debug)]
pub struct FormResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl FormResponse {
	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { source, status: Some(self.status) })
	}
}

/// HTTP client plus error mapper, shared by every flow.
pub struct FormTransport<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub error_mapper: Arc<M>,
}
impl<C, M> FormTransport<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a transport from a client and mapper.
	pub fn new(http_client: impl Into<Arc<C>>, error_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), error_mapper: error_mapper.into() }
	}

	/// POSTs `pairs` as a form body to `endpoint`.
	pub async fn post_form<'p, I>(&self, endpoint: &Url, pairs: I) -> Result<FormResponse>
	where
		I: IntoIterator<Item = (&'p str, &'p str)>,
	{
		let body = form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();
		let request = Request::builder()
			.method(Method::POST)
			.uri(endpoint.as_str())
			.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let response = handle.call(request).await.map_err(|err| {
			self.error_mapper.map_transport_error(endpoint, slot.take().as_ref(), err)
		})?;
		let status = response.status();

		if !status.is_success() {
			return Err(TransportError::Status {
				endpoint: endpoint.to_string(),
				status: status.as_u16(),
				body: preview(response.body()),
			}
			.into());
		}

		Ok(FormResponse { status: status.as_u16(), body: response.into_body() })
	}
}
impl<C, M> Clone for FormTransport<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { http_client: self.http_client.clone(), error_mapper: self.error_mapper.clone() }
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: &Url, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { endpoint: endpoint.to_string() }.into();
	}

	TransportError::network(endpoint.as_str(), err).into()
}

fn preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= BODY_PREVIEW_LIMIT {
		return text.into_owned();
	}

	let mut buf = text.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}
