//! Promotional feeds: feed names and the recommended products of one feed.

// self
use crate::{
	_prelude::*,
	api,
	auth::TokenState,
	flows::Marketplace,
	http::ApiHttpClient,
	serde_util::{self, opt_lenient_u64},
	transport::TransportErrorMapper,
};

/// RPC method listing promotional feeds.
pub const FEED_NAME_METHOD: &str = "aliexpress.ds.feedname.get";
/// RPC method listing products of one feed.
pub const RECOMMEND_FEED_METHOD: &str = "aliexpress.ds.recommend.feed.get";
/// Products requested per feed page.
pub const FEED_PAGE_SIZE: u64 = 50;

/// Promotional feed descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPromo {
	/// Feed name, used as `feed_name` when listing products.
	pub promo_name: String,
	/// Human-readable description.
	#[serde(default)]
	pub promo_desc: Option<String>,
	/// Number of products in the feed.
	#[serde(default, deserialize_with = "opt_lenient_u64")]
	pub product_num: Option<u64>,
}

/// One page of a recommended feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
	/// Products on this page, as returned by the marketplace.
	pub products: Vec<Value>,
	/// Total products in the feed.
	pub total_record_count: u64,
	/// Whether the marketplace reports the listing as complete.
	pub is_finished: bool,
	/// Page count derived from the total and [`FEED_PAGE_SIZE`].
	pub total_pages: u64,
}

impl<C, M> Marketplace<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists the promotional feeds available to the application.
	pub async fn feed_names(&self, token: &TokenState) -> Result<Vec<FeedPromo>> {
		let envelope =
			self.call(token, FEED_NAME_METHOD, std::iter::empty::<(String, String)>()).await?;
		let promos = serde_util::pointer(&envelope, &["resp_result", "result", "promos", "promo"])
			.ok_or_else(|| {
				let detail = envelope.get("resp_result").map(|resp| {
					let code = resp.get("resp_code").and_then(serde_util::value_to_string);
					let message = resp.get("resp_msg").and_then(serde_util::value_to_string);

					format!("{}: {}", code.unwrap_or_default(), message.unwrap_or_default())
				});

				Error::MalformedResponse { field: "resp_result.result.promos.promo".into(), detail }
			})?;

		serde_util::list(Some(promos)).into_iter().map(api::decode).collect()
	}

	/// Fetches page `page_no` (1-based) of a recommended feed.
	pub async fn recommend_feed(
		&self,
		token: &TokenState,
		feed_name: &str,
		page_no: u64,
	) -> Result<FeedPage> {
		let envelope = self
			.call(
				token,
				RECOMMEND_FEED_METHOD,
				[
					("country", self.settings.ship_to_country.clone()),
					("target_currency", self.settings.target_currency.clone()),
					("target_language", "EN".to_owned()),
					("page_size", FEED_PAGE_SIZE.to_string()),
					("sort", "volumeDesc".to_owned()),
					("page_no", page_no.max(1).to_string()),
					("feed_name", feed_name.to_owned()),
				],
			)
			.await?;
		let result = envelope.get("result").ok_or_else(|| Error::malformed("result"))?;

		Ok(FeedPage::from_result(result))
	}
}

impl FeedPage {
	fn from_result(result: &Value) -> Self {
		let products =
			serde_util::list(serde_util::pointer(result, &["products", "traffic_product_d_t_o"]));
		let total_record_count = result
			.get("total_record_count")
			.and_then(serde_util::value_to_string)
			.and_then(|raw| raw.trim().parse::<u64>().ok())
			.unwrap_or(0);
		let is_finished = match result.get("is_finished") {
			Some(Value::Bool(flag)) => *flag,
			Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
			_ => false,
		};

		Self {
			products,
			total_record_count,
			is_finished,
			total_pages: total_record_count.div_ceil(FEED_PAGE_SIZE),
		}
	}
}
