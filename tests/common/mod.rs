//! Shared fixtures for integration tests: a scripted transport plus client builders.

#![allow(dead_code)]

// std
pub use std::{
	collections::{BTreeMap, VecDeque},
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};
// crates.io
pub use time::{Duration, OffsetDateTime};
pub use url::Url;
// self
pub use marketplace_bridge::{
	auth::TokenState,
	error::{Error, TransportError},
	flows::Marketplace,
	http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{StatusCode, header::CONTENT_TYPE},
	},
	provider::ProviderDescriptor,
	sign::Credentials,
	transport::TransportErrorMapper,
};

pub const APP_KEY: &str = "test-app-key";
pub const APP_SECRET: &str = "test-app-secret";
pub const REST_BASE: &str = "https://api.example.test/rest";
pub const SYNC_BASE: &str = "https://api.example.test/sync";

/// Failures the scripted transport can raise instead of answering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FakeTransportError {
	Unreachable,
	TimedOut,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Unreachable => write!(f, "Host unreachable."),
			Self::TimedOut => write!(f, "Request timed out."),
		}
	}
}
impl StdError for FakeTransportError {}

enum Scripted {
	Respond { status: u16, body: String },
	Fail(FakeTransportError),
}

/// Request observed by [`FakeHttpClient`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub uri: String,
	pub content_type: Option<String>,
	pub form: BTreeMap<String, String>,
}

#[derive(Default)]
struct FakeState {
	script: Mutex<VecDeque<Scripted>>,
	requests: Mutex<Vec<RecordedRequest>>,
}

/// Transport that answers from a script and records every request it sees.
#[derive(Clone, Default)]
pub struct FakeHttpClient(Arc<FakeState>);
impl FakeHttpClient {
	pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
		self.push(Scripted::Respond { status, body: body.into() })
	}

	pub fn fail(&self, error: FakeTransportError) -> &Self {
		self.push(Scripted::Fail(error))
	}

	pub fn calls(&self) -> usize {
		self.0.requests.lock().expect("Request log lock should not be poisoned.").len()
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.0.requests.lock().expect("Request log lock should not be poisoned.").clone()
	}

	pub fn last_request(&self) -> RecordedRequest {
		self.requests().pop().expect("At least one request should have been sent.")
	}

	fn push(&self, step: Scripted) -> &Self {
		self.0.script.lock().expect("Script lock should not be poisoned.").push_back(step);

		self
	}
}
impl ApiHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, state: self.0.clone() }
	}
}

pub struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	state: Arc<FakeState>,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let state = self.state.clone();

		Box::pin(async move {
			slot.take();

			let recorded = RecordedRequest {
				uri: request.uri().to_string(),
				content_type: request
					.headers()
					.get(CONTENT_TYPE)
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned),
				form: url::form_urlencoded::parse(request.body()).into_owned().collect(),
			};

			state.requests.lock().expect("Request log lock should not be poisoned.").push(recorded);

			let step = state
				.script
				.lock()
				.expect("Script lock should not be poisoned.")
				.pop_front()
				.unwrap_or(Scripted::Fail(FakeTransportError::Unreachable));

			match step {
				Scripted::Respond { status, body } => {
					slot.store(ResponseMetadata { status: Some(status) });

					let mut response = HttpResponse::new(body.into_bytes());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");

					Ok(response)
				},
				Scripted::Fail(error) => Err(HttpClientError::Reqwest(Box::new(error))),
			}
		})
	}
}

/// Maps scripted failures onto the crate's transport errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct FakeTransportErrorMapper;
impl TransportErrorMapper<FakeTransportError> for FakeTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: &Url,
		_metadata: Option<&ResponseMetadata>,
		error: HttpClientError<FakeTransportError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) => match *inner {
				FakeTransportError::TimedOut =>
					TransportError::Timeout { endpoint: endpoint.to_string() }.into(),
				other => TransportError::network(endpoint.as_str(), other).into(),
			},
			other => TransportError::Io(std::io::Error::other(other.to_string())).into(),
		}
	}
}

pub type FakeMarketplace = Marketplace<FakeHttpClient, FakeTransportErrorMapper>;

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("URL fixture should parse.")
}

pub fn fake_descriptor() -> ProviderDescriptor {
	ProviderDescriptor::builder()
		.rest_endpoint(url(REST_BASE))
		.sync_endpoint(url(SYNC_BASE))
		.callback(url("https://shop.example.test/aliexpress/callback/"))
		.build()
		.expect("Fake descriptor should build.")
}

pub fn fake_marketplace(client: &FakeHttpClient) -> FakeMarketplace {
	Marketplace::with_http_client(
		fake_descriptor(),
		Credentials::new(APP_KEY, APP_SECRET),
		client.clone(),
		FakeTransportErrorMapper,
	)
}

/// Token state issued five minutes ago that expires `expires_in` from now.
pub fn token_state(expires_in: Duration, refresh: Option<&str>) -> TokenState {
	let now = OffsetDateTime::now_utc();
	let builder = TokenState::builder()
		.access_token("access-current")
		.issued_at(now - Duration::minutes(5))
		.expires_at(now + expires_in);
	let builder = match refresh {
		Some(token) => builder.refresh_token(token),
		None => builder,
	};

	builder.build().expect("Token state fixture should build.")
}

/// Asserts the recorded request carries a valid signature over its other parameters.
pub fn assert_signed(request: &RecordedRequest, api_name: &str) {
	let mut params = request.form.clone();
	let signature = params.remove("sign").expect("Signed request should carry `sign`.");

	assert_eq!(params.get("app_key").map(String::as_str), Some(APP_KEY));
	assert_eq!(params.get("sign_method").map(String::as_str), Some("sha256"));
	assert!(params.get("timestamp").is_some_and(|ts| ts.parse::<i64>().is_ok()));
	assert_eq!(signature, marketplace_bridge::sign::sign(APP_SECRET, api_name, &params));
	assert_eq!(
		request.content_type.as_deref(),
		Some("application/x-www-form-urlencoded;charset=utf-8")
	);
}

#[cfg(feature = "reqwest")]
pub use marketplace_bridge::flows::ReqwestMarketplace;

#[cfg(feature = "reqwest")]
pub fn reqwest_descriptor(server: &httpmock::MockServer) -> ProviderDescriptor {
	ProviderDescriptor::builder()
		.authorization_endpoint(url(&server.url("/oauth/authorize")))
		.rest_endpoint(url(&server.url("/rest")))
		.sync_endpoint(url(&server.url("/sync")))
		.callback(url("http://localhost:8000/aliexpress/callback/"))
		.build()
		.expect("Mock descriptor should build.")
}

#[cfg(feature = "reqwest")]
pub fn reqwest_marketplace(server: &httpmock::MockServer) -> ReqwestMarketplace {
	ReqwestMarketplace::new(reqwest_descriptor(server), Credentials::new(APP_KEY, APP_SECRET))
		.expect("Reqwest-backed marketplace should build.")
}
