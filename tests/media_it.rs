#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use oauth1_courier::{_preludet::*, http::ReqwestTransport, media::MediaFetcher};

#[tokio::test]
async fn recent_media_authenticates_through_the_query_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/users/self/media/recent")
				.query_param("access_token", "token-it")
				.header("accept", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "data": [{ "id": "media-1" }] }));
		})
		.await;
	let endpoint = Url::parse(&server.url("/v1/users/self/media/recent"))
		.expect("Mock endpoint should parse successfully.");
	let fetcher = MediaFetcher::new(ReqwestTransport::default(), endpoint, "token-it");
	let response = fetcher.recent_media().await.expect("Media fetch should succeed.");

	mock.assert_async().await;

	assert_eq!(response.status, 200);
	assert_eq!(
		response
			.json()
			.and_then(|json| json.pointer("/data/0/id"))
			.and_then(|id| id.as_str()),
		Some("media-1")
	);
}
