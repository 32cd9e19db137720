//! Marketplace provider descriptors.
//!
//! [`ProviderDescriptor`] carries the validated endpoint set (authorization page, REST
//! base for token calls, sync base for business RPC calls) plus the fixed callback URL
//! registered with the marketplace application.

pub mod descriptor;

pub use descriptor::*;
