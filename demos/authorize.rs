//! Walks through the marketplace token lifecycle against a local mock platform.
//!
//! 1. Build the consent URL the merchant is redirected to.
//! 2. Exchange the callback code and persist the token triple in a session store.
//! 3. Gate a product lookup through the session, refreshing only when needed.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use marketplace_bridge::{
	flows::ReqwestMarketplace,
	provider::ProviderDescriptor,
	sign::Credentials,
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/rest/auth/token/create");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"expires_in\":\"86400\",\"code\":\"0\"}",
			);
		})
		.await;
	let product_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/sync");
			then.status(200).header("content-type", "application/json").body(
				"{\"aliexpress_ds_product_get_response\":{\"result\":{\"ae_item_base_info_dto\":{\"subject\":\"Desk lamp\"},\"ae_multimedia_info_dto\":{\"image_urls\":\"https://img.example.com/1.jpg;https://img.example.com/2.jpg\"},\"ae_item_sku_info_dtos\":{\"ae_item_sku_info_d_t_o\":[{\"sku_id\":\"12000001\"}]}}}}",
			);
		})
		.await;
	let descriptor = ProviderDescriptor::builder()
		.authorization_endpoint(Url::parse(&server.url("/oauth/authorize"))?)
		.rest_endpoint(Url::parse(&server.url("/rest"))?)
		.sync_endpoint(Url::parse(&server.url("/sync"))?)
		.callback(Url::parse("http://localhost:8000/aliexpress/callback/")?)
		.build()?;
	let marketplace = ReqwestMarketplace::new(descriptor, Credentials::new("demo-key", "demo-secret"))?;
	let session = MemoryStore::default();

	println!("Send the merchant to: {}.", marketplace.start_authorization());

	let state = marketplace.complete_session_authorization(&session, Some("demo-code")).await?;

	println!("Token stored; it expires at unix {}.", state.expires_at_unix());

	let token = marketplace.authorize_session(&session).await?;
	let product = marketplace.product(&token, "1005001234").await?;

	println!(
		"{} with {} images and primary SKU {:?}.",
		product.subject.as_deref().unwrap_or("<untitled>"),
		product.image_urls.len(),
		product.primary_sku()
	);

	token_mock.assert_async().await;
	product_mock.assert_async().await;

	Ok(())
}
