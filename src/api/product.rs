//! `aliexpress.ds.product.get`: product detail reshaped for republishing.

// self
use crate::{
	_prelude::*,
	auth::TokenState,
	flows::Marketplace,
	http::ApiHttpClient,
	serde_util,
	transport::TransportErrorMapper,
};

/// RPC method returning a product's detail.
pub const PRODUCT_GET_METHOD: &str = "aliexpress.ds.product.get";

/// Product detail with the fields a storefront listing needs lifted out of the raw result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
	/// Marketplace product identifier.
	pub product_id: String,
	/// Product title.
	pub subject: Option<String>,
	/// Description HTML.
	pub detail: Option<String>,
	/// Image URLs, split from the `;`-joined multimedia field.
	pub image_urls: Vec<String>,
	/// SKU identifiers in marketplace order.
	pub sku_ids: Vec<String>,
	/// Untouched `result` object.
	pub raw: Value,
}
impl ProductDetail {
	/// Reshapes the `result` object of a product response.
	pub fn from_result(product_id: impl Into<String>, raw: Value) -> Self {
		let base = raw.get("ae_item_base_info_dto");
		let text = |key: &str| base.and_then(|b| b.get(key)).and_then(serde_util::value_to_string);
		let image_urls = serde_util::pointer(&raw, &["ae_multimedia_info_dto", "image_urls"])
			.and_then(Value::as_str)
			.map(split_image_urls)
			.unwrap_or_default();
		let sku_ids = serde_util::list(serde_util::pointer(
			&raw,
			&["ae_item_sku_info_dtos", "ae_item_sku_info_d_t_o"],
		))
		.iter()
		.filter_map(|sku| sku.get("sku_id").and_then(serde_util::value_to_string))
		.collect();

		Self {
			product_id: product_id.into(),
			subject: text("subject"),
			detail: text("detail"),
			image_urls,
			sku_ids,
			raw,
		}
	}

	/// First SKU, the one freight quotes are requested for by default.
	pub fn primary_sku(&self) -> Option<&str> {
		self.sku_ids.first().map(String::as_str)
	}
}

fn split_image_urls(joined: &str) -> Vec<String> {
	joined.split(';').map(str::trim).filter(|url| !url.is_empty()).map(str::to_owned).collect()
}

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches a product priced in the configured currency for the configured country.
	pub async fn product(&self, token: &TokenState, product_id: &str) -> Result<ProductDetail> {
		let mut envelope = self
			.call(
				token,
				PRODUCT_GET_METHOD,
				[
					("product_id", product_id.to_owned()),
					("target_currency", self.settings.target_currency.clone()),
					("ship_to_country", self.settings.ship_to_country.clone()),
				],
			)
			.await?;
		let raw = envelope
			.get_mut("result")
			.filter(|result| result.is_object())
			.map(Value::take)
			.ok_or_else(|| Error::malformed("result"))?;

		Ok(ProductDetail::from_result(product_id, raw))
	}
}
