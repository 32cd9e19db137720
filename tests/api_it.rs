mod common;

// self
use common::*;
use marketplace_bridge::api::{
	FEED_NAME_METHOD, FREIGHT_QUERY_METHOD, IMAGE_SEARCH_METHOD, TEXT_SEARCH_METHOD,
};

fn token() -> TokenState {
	token_state(Duration::hours(1), Some("refresh-current"))
}

#[tokio::test]
async fn calls_sign_access_token_and_method() {
	let client = FakeHttpClient::default();

	client.respond(200, r#"{"aliexpress_ds_product_get_response":{"result":{}},"request_id":"r1"}"#);

	let marketplace = fake_marketplace(&client);
	let product = marketplace
		.product(&token(), "1005001234")
		.await
		.expect("Product call should succeed.");
	let request = client.last_request();

	assert_eq!(request.uri, SYNC_BASE);
	assert_eq!(request.form.get("method").map(String::as_str), Some("aliexpress.ds.product.get"));
	assert_eq!(request.form.get("access_token").map(String::as_str), Some("access-current"));
	assert_eq!(request.form.get("product_id").map(String::as_str), Some("1005001234"));
	assert_eq!(request.form.get("target_currency").map(String::as_str), Some("BRL"));
	assert_eq!(request.form.get("ship_to_country").map(String::as_str), Some("BR"));
	assert_signed(&request, "aliexpress.ds.product.get");
	assert_eq!(product.product_id, "1005001234");
}

#[tokio::test]
async fn error_envelopes_become_api_errors() {
	let client = FakeHttpClient::default();

	client.respond(
		200,
		r#"{"error_response":{"type":"ISP","code":"IllegalAccessToken","msg":"The specified access token is invalid or expired","request_id":"r2"}}"#,
	);

	let err = fake_marketplace(&client)
		.product(&token(), "1")
		.await
		.expect_err("Error envelope should fail the call.");

	assert!(matches!(err, Error::Api { ref code, .. } if code == "IllegalAccessToken"));
}

#[tokio::test]
async fn missing_result_is_malformed() {
	let client = FakeHttpClient::default();

	client.respond(200, r#"{"aliexpress_ds_product_get_response":{"rsp_code":"200"}}"#);

	let err = fake_marketplace(&client)
		.product(&token(), "1")
		.await
		.expect_err("Envelope without result should be malformed.");

	assert!(matches!(err, Error::MalformedResponse { ref field, .. } if field == "result"));
}

#[tokio::test]
async fn freight_query_carries_json_request() {
	let client = FakeHttpClient::default();

	client.respond(
		200,
		r#"{"aliexpress_ds_freight_query_response":{"result":{"code":200,"success":true,"delivery_options":{"delivery_option_d_t_o":[{"code":"CAINIAO_STANDARD","shipping_fee_cent":"0.00","free_shipping":true,"min_delivery_days":15,"max_delivery_days":25}]}}}}"#,
	);

	let options = fake_marketplace(&client)
		.freight(&token(), "1005001234", "12000001")
		.await
		.expect("Freight quote should succeed.");
	let request = client.last_request();
	let query: serde_json::Value = serde_json::from_str(
		request.form.get("queryDeliveryReq").expect("Freight request should carry its query."),
	)
	.expect("Query should be JSON.");

	assert_eq!(request.form.get("method").map(String::as_str), Some(FREIGHT_QUERY_METHOD));
	assert_eq!(
		query,
		serde_json::json!({
			"productId": "1005001234",
			"selectedSkuId": "12000001",
			"currency": "BRL",
			"shipToCountry": "BR",
			"quantity": 1,
			"language": "pt_BR",
			"locale": "zh_CN"
		})
	);
	assert_eq!(options.len(), 1);
	assert_eq!(options[0].code().as_deref(), Some("CAINIAO_STANDARD"));
	assert!(options[0].free_shipping());
	assert_eq!(options[0].delivery_days(), (Some(15), Some(25)));
}

#[tokio::test]
async fn freight_without_options_reports_the_result_code() {
	let client = FakeHttpClient::default();

	client.respond(
		200,
		r#"{"aliexpress_ds_freight_query_response":{"result":{"code":501,"msg":"no delivery to this country","success":false}}}"#,
	);

	let err = fake_marketplace(&client)
		.freight(&token(), "1", "2")
		.await
		.expect_err("Quote without options should fail.");

	match err {
		Error::Api { method, code, message } => {
			assert_eq!(method, FREIGHT_QUERY_METHOD);
			assert_eq!(code, "501");
			assert_eq!(message, "no delivery to this country");
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn feed_names_accept_single_promo_objects() {
	let client = FakeHttpClient::default();

	client.respond(
		200,
		r#"{"aliexpress_ds_feedname_get_response":{"resp_result":{"resp_code":200,"result":{"promos":{"promo":{"promo_name":"DS_Brazil_topsellers","promo_desc":"Top sellers","product_num":"850"}}}}}}"#,
	);

	let promos = fake_marketplace(&client).feed_names(&token()).await.expect("Feed names should load.");
	let request = client.last_request();

	assert_eq!(request.form.get("method").map(String::as_str), Some(FEED_NAME_METHOD));
	assert_eq!(promos.len(), 1);
	assert_eq!(promos[0].promo_name, "DS_Brazil_topsellers");
	assert_eq!(promos[0].product_num, Some(850));
}

#[tokio::test]
async fn feed_names_without_promos_are_malformed() {
	let client = FakeHttpClient::default();

	client.respond(
		200,
		r#"{"aliexpress_ds_feedname_get_response":{"resp_result":{"resp_code":405,"resp_msg":"no permission"}}}"#,
	);

	let err = fake_marketplace(&client)
		.feed_names(&token())
		.await
		.expect_err("Missing promos should fail.");

	assert!(matches!(
		err,
		Error::MalformedResponse { ref detail, .. } if detail.as_deref() == Some("405: no permission")
	));
}

#[tokio::test]
async fn recommended_feed_pages_are_counted() {
	let client = FakeHttpClient::default();

	client.respond(
		200,
		r#"{"aliexpress_ds_recommend_feed_get_response":{"result":{"current_record_count":2,"total_record_count":120,"is_finished":false,"products":{"traffic_product_d_t_o":[{"product_id":1},{"product_id":2}]}}}}"#,
	);

	let page = fake_marketplace(&client)
		.recommend_feed(&token(), "DS_Brazil topsellers", 2)
		.await
		.expect("Feed page should load.");
	let form = client.last_request().form;

	assert_eq!(form.get("feed_name").map(String::as_str), Some("DS_Brazil topsellers"));
	assert_eq!(form.get("page_no").map(String::as_str), Some("2"));
	assert_eq!(form.get("page_size").map(String::as_str), Some("50"));
	assert_eq!(form.get("sort").map(String::as_str), Some("volumeDesc"));
	assert_eq!(form.get("target_language").map(String::as_str), Some("EN"));
	assert_eq!(page.products.len(), 2);
	assert_eq!(page.total_pages, 3);
}

#[tokio::test]
async fn text_search_uses_market_settings() {
	let client = FakeHttpClient::default();

	client.respond(
		200,
		r#"{"aliexpress_ds_text_search_response":{"data":{"totalCount":41,"pageIndex":1,"products":{"selection_search_product":[{"itemId":"1005"}]}}}}"#,
	);

	let page = fake_marketplace(&client)
		.text_search(&token(), "lamp", 1)
		.await
		.expect("Search should succeed.");
	let request = client.last_request();

	assert_eq!(request.form.get("method").map(String::as_str), Some(TEXT_SEARCH_METHOD));
	assert_eq!(request.form.get("keyWord").map(String::as_str), Some("lamp"));
	assert_eq!(request.form.get("sortBy").map(String::as_str), Some("min_price"));
	assert_eq!(request.form.get("pageSize").map(String::as_str), Some("20"));
	assert_eq!(request.form.get("currency").map(String::as_str), Some("BRL"));
	assert_eq!(request.form.get("pageIndex").map(String::as_str), Some("1"));
	assert_eq!(page.total_count, 41);
	assert_eq!(page.total_pages, 3);
	assert!(!page.is_finished);
	assert_eq!(page.products.len(), 1);
}

#[tokio::test]
async fn image_search_signs_the_encoded_picture() {
	let client = FakeHttpClient::default();

	client.respond(
		200,
		r#"{"aliexpress_ds_image_searchV2_response":{"result":{"data":{"data":[{"product_id":"1005"},{"product_id":"1006"}]}}}}"#,
	);

	let products = fake_marketplace(&client)
		.image_search(&token(), "aGVsbG8=")
		.await
		.expect("Image search should succeed.");
	let request = client.last_request();
	let param0: serde_json::Value = serde_json::from_str(
		request.form.get("param0").expect("Image search should carry `param0`."),
	)
	.expect("`param0` should be JSON.");

	assert_eq!(request.uri, SYNC_BASE);
	assert_eq!(request.form.get("method").map(String::as_str), Some(IMAGE_SEARCH_METHOD));
	assert_signed(&request, IMAGE_SEARCH_METHOD);
	assert_eq!(
		param0,
		serde_json::json!({
			"sort_type": "price",
			"image_base64": "aGVsbG8=",
			"lang": "en",
			"sort_order": "asc",
			"ship_to": "BR"
		})
	);
	assert_eq!(products.len(), 2);
}

#[tokio::test]
async fn image_search_without_matches_is_empty() {
	let client = FakeHttpClient::default();

	client
		.respond(200, r#"{"aliexpress_ds_image_searchV2_response":{"result":{"data":{}}}}"#)
		.respond(200, r#"{"aliexpress_ds_image_searchV2_response":{"rsp_code":"500"}}"#);

	let marketplace = fake_marketplace(&client);
	let empty = marketplace
		.image_search(&token(), "aGVsbG8=")
		.await
		.expect("Empty match list should not fail.");
	let err = marketplace
		.image_search(&token(), "aGVsbG8=")
		.await
		.expect_err("Envelope without result should be malformed.");

	assert!(empty.is_empty());
	assert!(matches!(err, Error::MalformedResponse { ref field, .. } if field == "result"));
}

#[cfg(feature = "reqwest")]
mod over_http {
	// crates.io
	use httpmock::prelude::*;
	use marketplace_bridge::{http::ReqwestHttpClient, transport::ReqwestTransportErrorMapper};
	// self
	use super::*;

	#[tokio::test]
	async fn product_detail_round_trip() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/sync");
				then.status(200).header("content-type", "application/json").body(
					r#"{"aliexpress_ds_product_get_response":{"result":{"ae_item_base_info_dto":{"subject":"Lamp","detail":"<p>ok</p>"},"ae_multimedia_info_dto":{"image_urls":"https://img/1.jpg;https://img/2.jpg"},"ae_item_sku_info_dtos":{"ae_item_sku_info_d_t_o":[{"sku_id":12000001}]}}}}"#,
				);
			})
			.await;
		let product = reqwest_marketplace(&server)
			.product(&token(), "1005001234")
			.await
			.expect("Product call over HTTP should succeed.");

		mock.assert_async().await;

		assert_eq!(product.subject.as_deref(), Some("Lamp"));
		assert_eq!(product.image_urls.len(), 2);
		assert_eq!(product.primary_sku(), Some("12000001"));
	}

	#[tokio::test]
	async fn non_success_status_is_a_transport_error() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/sync");
				then.status(503).body("unavailable");
			})
			.await;
		let err = reqwest_marketplace(&server)
			.feed_names(&token())
			.await
			.expect_err("Unavailable upstream should fail.");

		mock.assert_async().await;

		assert!(matches!(err, Error::Transport(TransportError::Status { status: 503, .. })));
	}

	#[tokio::test]
	async fn slow_upstream_hits_the_request_timeout() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/sync");
				then.status(200)
					.delay(std::time::Duration::from_secs(2))
					.body(r#"{"aliexpress_ds_product_get_response":{"result":{}}}"#);
			})
			.await;
		let http_client = ReqwestHttpClient::try_new()
			.expect("Reqwest client should build.")
			.with_timeout(std::time::Duration::from_millis(200));
		let marketplace: ReqwestMarketplace = Marketplace::with_http_client(
			reqwest_descriptor(&server),
			Credentials::new(APP_KEY, APP_SECRET),
			http_client,
			ReqwestTransportErrorMapper,
		);
		let err = marketplace
			.product(&token(), "1005001234")
			.await
			.expect_err("Slow upstream should time out.");

		mock.assert_async().await;

		match err {
			Error::Transport(TransportError::Timeout { endpoint }) =>
				assert_eq!(endpoint, server.url("/sync")),
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
