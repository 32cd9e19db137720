//! Auth-domain identifiers and token models.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{secret::*, state::*};
