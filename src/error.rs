//! Crate-level error types shared across flows, stores, and the storefront handshake.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every remote failure is converted into one of these variants at the call boundary, so
/// callers never observe raw transport errors or partially populated token state.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Network, timeout, or non-success HTTP status.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Response body could not be parsed as the expected JSON structure.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The authorization callback did not carry a code.
	#[error("Authorization code is missing.")]
	MissingCode,
	/// Response parsed but lacks a documented success field.
	#[error("Response is missing or has an unusable `{field}` field.")]
	MalformedResponse {
		/// Offending field name.
		field: String,
		/// Provider-supplied code or message, when one was present.
		detail: Option<String>,
	},
	/// The stored token state has no refresh token.
	#[error("No refresh token is available.")]
	NoRefreshToken,
	/// The single refresh attempt failed; re-authorization is required.
	#[error("Token refresh failed; re-authorization is required.")]
	RefreshFailed {
		/// Underlying refresh failure.
		#[source]
		source: Box<Error>,
	},
	/// No token state exists for the session.
	#[error("Authentication is required.")]
	Unauthenticated,
	/// Marketplace business call returned an error envelope.
	#[error("Marketplace call `{method}` failed with {code}: {message}.")]
	Api {
		/// API method name.
		method: String,
		/// Provider error code.
		code: String,
		/// Provider error message.
		message: String,
	},
	/// Storefront callback parameters failed verification.
	#[error("Storefront callback rejected: {reason}.")]
	CallbackRejected {
		/// Human-readable rejection reason.
		reason: String,
	},
}
impl Error {
	/// Builds a [`Error::MalformedResponse`] without provider detail.
	pub fn malformed(field: impl Into<String>) -> Self {
		Self::MalformedResponse { field: field.into(), detail: None }
	}

	/// Returns `true` when the caller must restart the authorization flow.
	pub fn requires_reauthorization(&self) -> bool {
		matches!(self, Self::Unauthenticated | Self::NoRefreshToken | Self::RefreshFailed { .. })
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A URL derived from configuration cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Required setting is absent.
	#[error("Setting `{name}` is required.")]
	MissingSetting {
		/// Setting (environment variable) name.
		name: &'static str,
	},
	/// Setting is present but unusable.
	#[error("Setting `{name}` is invalid: {reason}.")]
	InvalidSetting {
		/// Setting (environment variable) name.
		name: &'static str,
		/// Validation failure.
		reason: String,
	},
	/// Provider descriptor validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Shop domain validation failed.
	#[error(transparent)]
	Shop(#[from] crate::auth::IdentifierError),
	/// Token state builder validation failed.
	#[error("Unable to build token state.")]
	TokenBuild(#[from] crate::auth::TokenStateBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Endpoint being called.
		endpoint: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
	/// The call exceeded the per-request timeout.
	#[error("Request to {endpoint} timed out.")]
	Timeout {
		/// Endpoint being called.
		endpoint: String,
	},
	/// Remote responded with a non-2xx status.
	#[error("Endpoint {endpoint} responded with HTTP {status}.")]
	Status {
		/// Endpoint being called.
		endpoint: String,
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint: endpoint.into(), source: Box::new(src) }
	}

	/// HTTP status carried by the failure, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
