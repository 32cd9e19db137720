//! Strongly typed identifiers validated at construction time.

// std
use std::{borrow::Borrow, ops::Deref, str::FromStr};
// self
use crate::_prelude::*;

const SHOP_DOMAIN_MAX_LEN: usize = 255;
const SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier.
		kind: &'static str,
	},
	/// The identifier contains characters outside the permitted set.
	#[error("{kind} identifier contains the invalid character {found:?}.")]
	InvalidCharacter {
		/// Kind of identifier.
		kind: &'static str,
		/// First rejected character.
		found: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier.
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The shop host is not a storefront-hosted domain.
	#[error("Shop domain must end with `{suffix}`.")]
	ForeignShopDomain {
		/// Required suffix.
		suffix: &'static str,
	},
}

/// Storefront shop host such as `acme.myshopify.com`.
///
/// Stored lowercase; only ASCII alphanumerics, `-`, and `.` are accepted, so the value
/// can be interpolated into admin URLs without escaping.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);
impl ShopDomain {
	/// Creates a shop domain after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let normalized = value.as_ref().to_ascii_lowercase();

		validate_shop(&normalized)?;

		Ok(Self(normalized))
	}

	/// Shop name without the hosting suffix.
	pub fn handle(&self) -> &str {
		self.0.strip_suffix(SHOP_DOMAIN_SUFFIX).unwrap_or(&self.0)
	}
}
impl Deref for ShopDomain {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ShopDomain {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ShopDomain {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<ShopDomain> for String {
	fn from(value: ShopDomain) -> Self {
		value.0
	}
}
impl TryFrom<String> for ShopDomain {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for ShopDomain {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for ShopDomain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Shop({})", self.0)
	}
}
impl Display for ShopDomain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_shop(view: &str) -> Result<(), IdentifierError> {
	const KIND: &str = "Shop";

	if view.is_empty() {
		return Err(IdentifierError::Empty { kind: KIND });
	}
	if view.len() > SHOP_DOMAIN_MAX_LEN {
		return Err(IdentifierError::TooLong { kind: KIND, max: SHOP_DOMAIN_MAX_LEN });
	}
	if let Some(found) = view.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
	{
		return Err(IdentifierError::InvalidCharacter { kind: KIND, found });
	}
	if !view.ends_with(SHOP_DOMAIN_SUFFIX) || view.len() == SHOP_DOMAIN_SUFFIX.len() {
		return Err(IdentifierError::ForeignShopDomain { suffix: SHOP_DOMAIN_SUFFIX });
	}

	Ok(())
}
