//! Lenient decoding helpers for marketplace payloads that mix numeric and string encodings.

// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

/// Integer that the marketplace may encode either as a JSON number or as a string.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum LenientInt {
	Number(i64),
	Text(String),
}
impl LenientInt {
	pub(crate) fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Number(value) => Some(*value),
			Self::Text(text) => text.trim().parse().ok(),
		}
	}
}

/// Deserializes an optional lenient integer, dropping values that fail to parse.
pub(crate) fn opt_lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<LenientInt>::deserialize(deserializer)?;

	Ok(raw.and_then(|value| value.as_i64()).and_then(|value| u64::try_from(value).ok()))
}

/// Reads a string-ish value, rendering numbers and booleans in their canonical form.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

/// Reads a marketplace list, which collapses to a bare object when it has one element.
pub(crate) fn list(value: Option<&Value>) -> Vec<Value> {
	match value {
		Some(Value::Array(items)) => items.clone(),
		Some(Value::Null) | None => Vec::new(),
		Some(item) => vec![item.clone()],
	}
}

/// Walks a chain of object keys.
pub(crate) fn pointer<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
	path.iter().try_fold(value, |node, key| node.get(key))
}
