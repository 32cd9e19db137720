//! Boot-time configuration for the marketplace and storefront clients.
//!
//! Both configs deserialize with serde, so they can be embedded in a larger settings file,
//! and can be read from the process environment with `from_env`. `from_lookup` takes any
//! key lookup, which keeps tests independent of the real environment.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	flows::MarketSettings,
	provider::ProviderDescriptor,
	sign::Credentials,
	storefront::StorefrontApp,
};
#[cfg(feature = "reqwest")]
use crate::{flows::ReqwestMarketplace, storefront::ReqwestStorefront};

/// Marketplace application settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketplaceConfig {
	/// Application key and signing secret.
	#[serde(flatten)]
	pub credentials: Credentials,
	/// Callback URL registered for the authorization redirect.
	pub callback_url: Url,
	/// Market parameters for business calls.
	#[serde(default)]
	pub settings: MarketSettings,
}
impl MarketplaceConfig {
	/// Reads `ALIEXPRESS_*` variables from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(env_lookup)
	}

	/// Reads settings through `lookup`, treating empty values as absent.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = non_empty(lookup);
		let defaults = MarketSettings::default();

		Ok(Self {
			credentials: Credentials::new(
				required(&lookup, "ALIEXPRESS_APP_KEY")?,
				required(&lookup, "ALIEXPRESS_APP_SECRET")?,
			),
			callback_url: url_setting(&lookup, "ALIEXPRESS_CALLBACK_URL")?,
			settings: MarketSettings {
				target_currency: lookup("ALIEXPRESS_TARGET_CURRENCY")
					.unwrap_or(defaults.target_currency),
				ship_to_country: lookup("ALIEXPRESS_SHIP_COUNTRY").unwrap_or(defaults.ship_to_country),
				locale: lookup("ALIEXPRESS_LOCALE").unwrap_or(defaults.locale),
			},
		})
	}

	/// Descriptor for the public marketplace endpoints with the configured callback.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		ProviderDescriptor::marketplace(self.callback_url.clone()).map_err(ConfigError::from)
	}

	/// Builds a reqwest-backed marketplace client.
	#[cfg(feature = "reqwest")]
	pub fn marketplace(&self) -> Result<ReqwestMarketplace> {
		Ok(ReqwestMarketplace::new(self.descriptor()?, self.credentials.clone())?
			.with_settings(self.settings.clone()))
	}
}

/// Storefront application settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorefrontConfig {
	/// Public client identifier.
	pub client_id: String,
	/// Shared client secret.
	pub client_secret: TokenSecret,
	/// Admin API version.
	pub api_version: String,
	/// Callback URL registered with the application.
	pub redirect_uri: Url,
	/// Requested access scopes.
	pub scopes: Vec<String>,
}
impl StorefrontConfig {
	/// Reads `SHOPIFY_*` variables from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(env_lookup)
	}

	/// Reads settings through `lookup`; `SHOPIFY_SCOPES` is comma-separated.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = non_empty(lookup);
		let scopes = required(&lookup, "SHOPIFY_SCOPES")?
			.split(',')
			.map(str::trim)
			.filter(|scope| !scope.is_empty())
			.map(str::to_owned)
			.collect::<Vec<_>>();

		if scopes.is_empty() {
			return Err(ConfigError::InvalidSetting {
				name: "SHOPIFY_SCOPES",
				reason: "at least one scope is required".into(),
			});
		}

		Ok(Self {
			client_id: required(&lookup, "SHOPIFY_CLIENT_ID")?,
			client_secret: TokenSecret::new(required(&lookup, "SHOPIFY_CLIENT_SECRET")?),
			api_version: required(&lookup, "SHOPIFY_API_VERSION")?,
			redirect_uri: url_setting(&lookup, "SHOPIFY_REDIRECT_URI")?,
			scopes,
		})
	}

	/// Application registration consumed by [`crate::storefront::Storefront`].
	pub fn app(&self) -> StorefrontApp {
		StorefrontApp {
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			api_version: self.api_version.clone(),
			scopes: self.scopes.clone(),
			redirect_uri: self.redirect_uri.clone(),
		}
	}

	/// Builds a reqwest-backed storefront client.
	#[cfg(feature = "reqwest")]
	pub fn storefront(&self) -> Result<ReqwestStorefront> {
		ReqwestStorefront::new(self.app())
	}
}

fn env_lookup(name: &str) -> Option<String> {
	std::env::var(name).ok()
}

fn non_empty<F>(lookup: F) -> impl Fn(&str) -> Option<String>
where
	F: Fn(&str) -> Option<String>,
{
	move |name: &str| lookup(name).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	lookup(name).ok_or(ConfigError::MissingSetting { name })
}

fn url_setting<F>(lookup: &F, name: &'static str) -> Result<Url, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let raw = required(lookup, name)?;

	Url::parse(&raw).map_err(|err| ConfigError::InvalidSetting { name, reason: err.to_string() })
}
