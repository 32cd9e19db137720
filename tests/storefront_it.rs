mod common;

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use common::*;
use marketplace_bridge::{
	auth::TokenSecret,
	storefront::{CALLBACK_MAX_AGE, Storefront, StorefrontApp, callback_message},
};

const CLIENT_SECRET: &str = "hush";
const SHOP: &str = "acme.myshopify.com";

type FakeStorefront = Storefront<FakeHttpClient, FakeTransportErrorMapper>;

fn app() -> StorefrontApp {
	StorefrontApp {
		client_id: "storefront-client".into(),
		client_secret: TokenSecret::new(CLIENT_SECRET),
		api_version: "2024-10".into(),
		scopes: vec!["read_products".into(), "write_products".into()],
		redirect_uri: url("https://bridge.example.test/shopify/callback"),
	}
}

fn fake_storefront(client: &FakeHttpClient) -> FakeStorefront {
	Storefront::with_http_client(app(), client.clone(), FakeTransportErrorMapper)
}

fn signed_callback(pairs: &[(&str, &str)], issued: OffsetDateTime) -> BTreeMap<String, String> {
	let mut params = pairs
		.iter()
		.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
		.collect::<BTreeMap<_, _>>();

	params.insert("timestamp".into(), issued.unix_timestamp().to_string());

	let mut mac = Hmac::<Sha256>::new_from_slice(CLIENT_SECRET.as_bytes())
		.expect("HMAC should accept any key length.");

	mac.update(callback_message(&params).as_bytes());
	params.insert("hmac".into(), hex::encode(mac.finalize().into_bytes()));

	params
}

fn callback(code: Option<&str>, state: &str) -> BTreeMap<String, String> {
	let mut pairs = vec![("shop", SHOP), ("state", state)];

	if let Some(code) = code {
		pairs.push(("code", code));
	}

	signed_callback(&pairs, OffsetDateTime::now_utc())
}

#[test]
fn authorization_url_requests_configured_scopes() {
	let client = FakeHttpClient::default();
	let storefront = fake_storefront(&client);
	let first = storefront.authorization("ACME.myshopify.com").expect("Known shop should authorize.");
	let second = storefront.authorization(SHOP).expect("Known shop should authorize.");
	let query = first.url.query_pairs().into_owned().collect::<BTreeMap<_, _>>();

	assert_eq!(&*first.shop, SHOP);
	assert_eq!(first.url.host_str(), Some(SHOP));
	assert_eq!(first.url.path(), "/admin/oauth/authorize");
	assert_eq!(query.get("client_id").map(String::as_str), Some("storefront-client"));
	assert_eq!(query.get("scope").map(String::as_str), Some("read_products,write_products"));
	assert_eq!(
		query.get("redirect_uri").map(String::as_str),
		Some("https://bridge.example.test/shopify/callback")
	);
	assert_eq!(query.get("state"), Some(&first.state));
	assert_ne!(first.state, second.state);
	assert_eq!(client.calls(), 0);
}

#[test]
fn foreign_shops_cannot_start_authorization() {
	let err = fake_storefront(&FakeHttpClient::default())
		.authorization("evil.example.com")
		.expect_err("Foreign shop hosts should be refused.");

	assert!(matches!(err, Error::Config(_)));
}

#[test]
fn valid_callbacks_name_their_shop() {
	let storefront = fake_storefront(&FakeHttpClient::default());
	let params = callback(Some("c0de"), "nonce");
	let shop =
		storefront.verify_callback(&params, Some("nonce")).expect("Signed callback should verify.");

	assert_eq!(&*shop, SHOP);
	assert!(storefront.verify_callback(&params, None).is_ok());
}

#[test]
fn tampered_callbacks_are_rejected() {
	let storefront = fake_storefront(&FakeHttpClient::default());
	let mut params = callback(Some("c0de"), "nonce");

	params.insert("shop".into(), "other.myshopify.com".into());

	let err = storefront
		.verify_callback(&params, Some("nonce"))
		.expect_err("Tampered callback should fail verification.");

	assert!(matches!(err, Error::CallbackRejected { ref reason } if reason == "hmac mismatch"));

	params.remove("hmac");

	assert!(matches!(
		storefront.verify_callback(&params, None),
		Err(Error::CallbackRejected { .. })
	));
}

#[test]
fn stale_callbacks_are_rejected() {
	let storefront = fake_storefront(&FakeHttpClient::default());
	let now = OffsetDateTime::now_utc();
	let params = signed_callback(&[("shop", SHOP)], now - CALLBACK_MAX_AGE - Duration::minutes(1));
	let err = storefront
		.verify_callback_at(&params, None, now)
		.expect_err("Day-old callback should be rejected.");

	assert!(matches!(err, Error::CallbackRejected { .. }));
	assert!(
		storefront
			.verify_callback_at(&params, None, now - Duration::minutes(2))
			.is_ok()
	);
}

#[test]
fn state_mismatch_is_rejected() {
	let err = fake_storefront(&FakeHttpClient::default())
		.verify_callback(&callback(Some("c0de"), "nonce"), Some("different"))
		.expect_err("Unexpected state should be rejected.");

	assert!(matches!(err, Error::CallbackRejected { ref reason } if reason == "state mismatch"));
}

#[tokio::test]
async fn code_is_exchanged_for_a_session() {
	let client = FakeHttpClient::default();

	client.respond(200, r#"{"access_token":"shpat_123","scope":"read_products"}"#);

	let session = fake_storefront(&client)
		.request_token(&callback(Some("c0de"), "nonce"), Some("nonce"))
		.await
		.expect("Token request should succeed.");
	let request = client.last_request();

	assert_eq!(request.uri, "https://acme.myshopify.com/admin/oauth/access_token");
	assert_eq!(
		request.content_type.as_deref(),
		Some("application/x-www-form-urlencoded;charset=utf-8")
	);
	assert_eq!(request.form.get("client_id").map(String::as_str), Some("storefront-client"));
	assert_eq!(request.form.get("client_secret").map(String::as_str), Some(CLIENT_SECRET));
	assert_eq!(request.form.get("code").map(String::as_str), Some("c0de"));
	assert_eq!(session.access_token.expose(), "shpat_123");
	assert_eq!(session.scopes, ["read_products"]);
	assert_eq!(session.api_version, "2024-10");
	assert!(!format!("{session:?}").contains("shpat_123"));
}

#[tokio::test]
async fn missing_code_is_reported_without_a_request() {
	let client = FakeHttpClient::default();
	let err = fake_storefront(&client)
		.request_token(&callback(None, "nonce"), Some("nonce"))
		.await
		.expect_err("Callback without a code should fail.");

	assert!(matches!(err, Error::MissingCode));
	assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn unverified_callbacks_never_reach_the_shop() {
	let client = FakeHttpClient::default();
	let mut params = callback(Some("c0de"), "nonce");

	params.insert("code".into(), "swapped".into());

	let err = fake_storefront(&client)
		.request_token(&params, Some("nonce"))
		.await
		.expect_err("Tampered callback should fail.");

	assert!(matches!(err, Error::CallbackRejected { .. }));
	assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn token_response_without_access_token_is_malformed() {
	let client = FakeHttpClient::default();

	client.respond(200, r#"{"errors":"invalid_request"}"#);

	let err = fake_storefront(&client)
		.request_token(&callback(Some("c0de"), "nonce"), None)
		.await
		.expect_err("Missing access token should fail.");

	assert!(matches!(err, Error::MalformedResponse { ref field, .. } if field == "access_token"));
}

#[cfg(feature = "reqwest")]
mod over_http {
	// crates.io
	use httpmock::prelude::*;
	use marketplace_bridge::storefront::ReqwestStorefront;
	// self
	use super::*;

	#[tokio::test]
	async fn token_request_over_http_falls_back_to_requested_scopes() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST)
					.path("/admin/oauth/access_token")
					.header("content-type", "application/x-www-form-urlencoded;charset=utf-8");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"{"access_token":"shpat_456"}"#);
			})
			.await;
		let storefront = ReqwestStorefront::new(app())
			.expect("Reqwest-backed storefront should build.")
			.with_admin_origin(url(&server.url("/")))
			.expect("Loopback origin should be accepted.");
		let session = storefront
			.request_token(&callback(Some("c0de"), "nonce"), Some("nonce"))
			.await
			.expect("Token request over HTTP should succeed.");

		mock.assert_async().await;

		assert_eq!(session.access_token.expose(), "shpat_456");
		assert_eq!(session.scopes, ["read_products", "write_products"]);
	}

	#[test]
	fn plain_http_admin_origins_must_be_loopback() {
		let err = ReqwestStorefront::new(app())
			.expect("Reqwest-backed storefront should build.")
			.with_admin_origin(url("http://admin.example.com"))
			.expect_err("Remote plain HTTP origin should be refused.");

		assert!(matches!(err, Error::Config(_)));
	}
}
