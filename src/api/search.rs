//! `aliexpress.ds.text.search`: keyword search.

// self
use crate::{
	_prelude::*,
	auth::TokenState,
	flows::Marketplace,
	http::ApiHttpClient,
	serde_util,
	transport::TransportErrorMapper,
};

/// RPC method performing a keyword search.
pub const TEXT_SEARCH_METHOD: &str = "aliexpress.ds.text.search";
/// Products requested per search page.
pub const SEARCH_PAGE_SIZE: u64 = 20;

/// One page of keyword search results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
	/// Matching products, as returned by the marketplace.
	pub products: Vec<Value>,
	/// Total matches across all pages.
	pub total_count: u64,
	/// 1-based index of this page.
	pub page_index: u64,
	/// Page count derived from the total and [`SEARCH_PAGE_SIZE`].
	pub total_pages: u64,
	/// Whether this is the last page.
	pub is_finished: bool,
}
impl SearchPage {
	fn from_data(data: &Value, page_index: u64) -> Self {
		let total_count = data
			.get("totalCount")
			.and_then(serde_util::value_to_string)
			.and_then(|raw| raw.trim().parse::<u64>().ok())
			.unwrap_or(0);
		let total_pages = total_count.div_ceil(SEARCH_PAGE_SIZE);

		Self {
			products: serde_util::list(serde_util::pointer(
				data,
				&["products", "selection_search_product"],
			)),
			total_count,
			page_index,
			total_pages,
			is_finished: page_index >= total_pages,
		}
	}
}

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Searches by keyword, cheapest first.
	pub async fn text_search(
		&self,
		token: &TokenState,
		keyword: &str,
		page_index: u64,
	) -> Result<SearchPage> {
		let page_index = page_index.max(1);
		let envelope = self
			.call(
				token,
				TEXT_SEARCH_METHOD,
				[
					("keyWord", keyword.to_owned()),
					("local", self.settings.locale.clone()),
					("countryCode", self.settings.ship_to_country.clone()),
					("sortBy", "min_price".to_owned()),
					("pageSize", SEARCH_PAGE_SIZE.to_string()),
					("pageIndex", page_index.to_string()),
					("currency", self.settings.target_currency.clone()),
				],
			)
			.await?;
		let data = envelope.get("data").ok_or_else(|| Error::malformed("data"))?;

		Ok(SearchPage::from_data(data, page_index))
	}
}
