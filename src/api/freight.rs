//! `aliexpress.ds.freight.query`: shipping quotes for one SKU.

// crates.io
use serde_json::Map;
// self
use crate::{
	_prelude::*,
	api,
	auth::TokenState,
	flows::Marketplace,
	http::ApiHttpClient,
	serde_util,
	transport::TransportErrorMapper,
};

/// RPC method returning delivery options.
pub const FREIGHT_QUERY_METHOD: &str = "aliexpress.ds.freight.query";
/// Locale the freight service expects for its own request handling.
pub const FREIGHT_SERVICE_LOCALE: &str = "zh_CN";

/// One shipping service offered for a SKU.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryOption(pub Map<String, Value>);
impl DeliveryOption {
	/// Service code, e.g. `CAINIAO_STANDARD`.
	pub fn code(&self) -> Option<String> {
		self.text("code")
	}

	/// Carrier display name.
	pub fn company(&self) -> Option<String> {
		self.text("company")
	}

	/// Shipping fee in cents together with its currency.
	pub fn shipping_fee(&self) -> Option<(String, Option<String>)> {
		Some((self.text("shipping_fee_cent")?, self.text("shipping_fee_currency")))
	}

	/// Whether shipping is free.
	pub fn free_shipping(&self) -> bool {
		match self.0.get("free_shipping") {
			Some(Value::Bool(flag)) => *flag,
			Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
			_ => false,
		}
	}

	/// Delivery window in days.
	pub fn delivery_days(&self) -> (Option<u64>, Option<u64>) {
		let days = |key: &str| self.text(key).and_then(|raw| raw.trim().parse().ok());

		(days("min_delivery_days"), days("max_delivery_days"))
	}

	/// Raw field lookup.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	fn text(&self, key: &str) -> Option<String> {
		self.0.get(key).and_then(serde_util::value_to_string)
	}
}

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Quotes shipping of one unit of `sku_id` to the configured country.
	///
	/// A result without `delivery_options` is reported as [`Error::Api`] with the result's
	/// own code and message.
	pub async fn freight(
		&self,
		token: &TokenState,
		product_id: &str,
		sku_id: &str,
	) -> Result<Vec<DeliveryOption>> {
		let query = serde_json::json!({
			"productId": product_id,
			"selectedSkuId": sku_id,
			"currency": self.settings.target_currency,
			"shipToCountry": self.settings.ship_to_country,
			"quantity": 1,
			"language": self.settings.locale,
			"locale": FREIGHT_SERVICE_LOCALE,
		});
		let envelope = self
			.call(token, FREIGHT_QUERY_METHOD, [("queryDeliveryReq", query.to_string())])
			.await?;
		let result = envelope.get("result").ok_or_else(|| Error::malformed("result"))?;
		let Some(options) = result.get("delivery_options").filter(|v| !v.is_null()) else {
			return Err(api::api_error(FREIGHT_QUERY_METHOD, result));
		};
		let options = match options.get("delivery_option_d_t_o") {
			Some(inner) => serde_util::list(Some(inner)),
			None => serde_util::list(Some(options)),
		};

		options.into_iter().map(api::decode).collect()
	}
}
