// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	provider::{
		DEFAULT_AUTHORIZATION_ENDPOINT, DEFAULT_REST_ENDPOINT, DEFAULT_SYNC_ENDPOINT,
		ProviderDescriptor, ProviderEndpoints,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Callback URL is mandatory.
	#[error("Missing callback URL.")]
	MissingCallback,
	/// A built-in default endpoint failed to parse.
	#[error("Default {endpoint} endpoint is invalid.")]
	InvalidDefault {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoints must not carry query strings; parameters are appended by the flows.
	#[error("The {endpoint} endpoint must not carry a query string.")]
	QueryNotAllowed {
		/// Which endpoint failed validation.
		endpoint: &'static str,
	},
}

/// Builder for [`ProviderDescriptor`] values.
///
/// Unset endpoints fall back to the public marketplace defaults.
#[derive(Debug, Default)]
pub struct ProviderDescriptorBuilder {
	/// Authorization page override.
	pub authorization_endpoint: Option<Url>,
	/// REST base override.
	pub rest_endpoint: Option<Url>,
	/// Sync base override.
	pub sync_endpoint: Option<Url>,
	/// Callback URL registered with the application.
	pub callback: Option<Url>,
}
impl ProviderDescriptorBuilder {
	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the REST base.
	pub fn rest_endpoint(mut self, url: Url) -> Self {
		self.rest_endpoint = Some(url);

		self
	}

	/// Sets the sync base.
	pub fn sync_endpoint(mut self, url: Url) -> Self {
		self.sync_endpoint = Some(url);

		self
	}

	/// Sets the callback URL.
	pub fn callback(mut self, url: Url) -> Self {
		self.callback = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let callback = self.callback.ok_or(ProviderDescriptorError::MissingCallback)?;
		let endpoints = ProviderEndpoints {
			authorization: or_default(
				self.authorization_endpoint,
				"authorization",
				DEFAULT_AUTHORIZATION_ENDPOINT,
			)?,
			rest: or_default(self.rest_endpoint, "rest", DEFAULT_REST_ENDPOINT)?,
			sync: or_default(self.sync_endpoint, "sync", DEFAULT_SYNC_ENDPOINT)?,
		};
		let descriptor = ProviderDescriptor { endpoints, callback };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("rest", &self.endpoints.rest)?;
		validate_endpoint("sync", &self.endpoints.sync)?;
		validate_endpoint("callback", &self.callback)?;

		for (name, url) in [
			("authorization", &self.endpoints.authorization),
			("rest", &self.endpoints.rest),
			("sync", &self.endpoints.sync),
		] {
			if url.query().is_some() {
				return Err(ProviderDescriptorError::QueryNotAllowed { endpoint: name });
			}
		}

		Ok(())
	}
}

fn or_default(
	value: Option<Url>,
	endpoint: &'static str,
	fallback: &str,
) -> Result<Url, ProviderDescriptorError> {
	match value {
		Some(url) => Ok(url),
		None => Url::parse(fallback).map_err(|_| ProviderDescriptorError::InvalidDefault { endpoint }),
	}
}

pub(crate) fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.map(|ip| ip.is_loopback())
			.unwrap_or(false),
		None => false,
	}
}
