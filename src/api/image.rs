//! `aliexpress.ds.image.searchV2`: products visually similar to an uploaded picture.
//!
//! The image travels base64-encoded inside the JSON `param0` parameter. Shrinking and
//! re-encoding the picture is left to the caller.

// self
use crate::{
	_prelude::*,
	auth::TokenState,
	flows::Marketplace,
	http::ApiHttpClient,
	serde_util,
	transport::TransportErrorMapper,
};

/// RPC method performing an image search.
pub const IMAGE_SEARCH_METHOD: &str = "aliexpress.ds.image.searchV2";
/// Result language requested from the image search service.
pub const IMAGE_SEARCH_LANG: &str = "en";

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Searches by picture, cheapest first, shipping to the configured country.
	///
	/// `image_base64` is the encoded picture. An answer without `result.data.data` is an
	/// empty match list.
	pub async fn image_search(&self, token: &TokenState, image_base64: &str) -> Result<Vec<Value>> {
		let param0 = serde_json::json!({
			"sort_type": "price",
			"image_base64": image_base64,
			"lang": IMAGE_SEARCH_LANG,
			"sort_order": "asc",
			"ship_to": self.settings.ship_to_country,
		});
		let envelope =
			self.call(token, IMAGE_SEARCH_METHOD, [("param0", param0.to_string())]).await?;
		let result = envelope.get("result").ok_or_else(|| Error::malformed("result"))?;

		Ok(serde_util::list(serde_util::pointer(result, &["data", "data"])))
	}
}
