//! Token lifecycle flows powered by the [`Marketplace`] facade.

pub mod authorize;
pub mod common;
pub mod refresh;
pub mod session;

pub use refresh::*;
pub use session::*;

// self
use crate::{
	_prelude::*,
	http::ApiHttpClient,
	provider::ProviderDescriptor,
	sign::Credentials,
	transport::{FormTransport, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, transport::ReqwestTransportErrorMapper};

/// Seconds before expiry at which a token is already treated as stale.
pub const SKEW_SECONDS: i64 = 60;

#[cfg(feature = "reqwest")]
/// Marketplace client specialized for the crate's default reqwest transport stack.
pub type ReqwestMarketplace = Marketplace<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Boot-time market parameters attached to business calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSettings {
	/// Currency prices are quoted in.
	pub target_currency: String,
	/// Destination country for shipping quotes.
	pub ship_to_country: String,
	/// Locale used for localized content.
	pub locale: String,
}
impl Default for MarketSettings {
	fn default() -> Self {
		Self { target_currency: "BRL".into(), ship_to_country: "BR".into(), locale: "pt_BR".into() }
	}
}

/// Signed client for the marketplace open platform.
///
/// The value owns the form transport, the endpoint descriptor, and the application
/// credentials. It holds no token state of its own: every flow receives the caller's
/// [`crate::auth::TokenState`] and returns a new one, so sessions stay caller-owned.
pub struct Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Transport used for every outbound call.
	pub transport: FormTransport<C, M>,
	/// Endpoint set and callback URL.
	pub descriptor: ProviderDescriptor,
	/// Application key and signing secret.
	pub credentials: Credentials,
	/// Market parameters for business calls.
	pub settings: MarketSettings,
	/// Early-refresh window applied by [`Marketplace::ensure_valid_token`].
	pub skew: Duration,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		credentials: Credentials,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			transport: FormTransport::new(http_client, mapper),
			descriptor,
			credentials,
			settings: MarketSettings::default(),
			skew: Duration::seconds(SKEW_SECONDS),
			refresh_metrics: Default::default(),
		}
	}

	/// Replaces the market parameters.
	pub fn with_settings(mut self, settings: MarketSettings) -> Self {
		self.settings = settings;

		self
	}
}
#[cfg(feature = "reqwest")]
impl Marketplace<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by a fresh reqwest transport with the default timeout.
	pub fn new(descriptor: ProviderDescriptor, credentials: Credentials) -> Result<Self> {
		Ok(Self::with_http_client(
			descriptor,
			credentials,
			ReqwestHttpClient::try_new()?,
			ReqwestTransportErrorMapper,
		))
	}
}
impl<C, M> Clone for Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			descriptor: self.descriptor.clone(),
			credentials: self.credentials.clone(),
			settings: self.settings.clone(),
			skew: self.skew,
			refresh_metrics: self.refresh_metrics.clone(),
		}
	}
}
impl<C, M> Debug for Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Marketplace")
			.field("descriptor", &self.descriptor)
			.field("credentials", &self.credentials)
			.field("settings", &self.settings)
			.field("skew", &self.skew)
			.finish()
	}
}
