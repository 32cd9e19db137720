//! Provider descriptor data structures shared by all flows.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Default authorization page of the marketplace open platform.
pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://api-sg.aliexpress.com/oauth/authorize";
/// Default REST base used for token creation and refresh.
pub const DEFAULT_REST_ENDPOINT: &str = "https://api-sg.aliexpress.com/rest";
/// Default sync base used for signed business calls.
pub const DEFAULT_SYNC_ENDPOINT: &str = "https://api-sg.aliexpress.com/sync";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization page the end user is redirected to.
	pub authorization: Url,
	/// REST base; REST paths are appended verbatim.
	pub rest: Url,
	/// Sync base receiving RPC calls addressed by the `method` parameter.
	pub sync: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Callback URL registered for the authorization-code redirect.
	pub callback: Url,
}
impl ProviderDescriptor {
	/// Creates a new builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::default()
	}

	/// Descriptor for the public marketplace endpoints with the provided callback.
	pub fn marketplace(callback: Url) -> Result<Self, ProviderDescriptorError> {
		Self::builder().callback(callback).build()
	}

	/// Joins a REST path onto the REST base without dropping the base's own path.
	pub fn rest_url(&self, path: &str) -> Result<Url, ConfigError> {
		let raw = format!(
			"{}/{}",
			self.endpoints.rest.as_str().trim_end_matches('/'),
			path.trim_start_matches('/')
		);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source })
	}
}
