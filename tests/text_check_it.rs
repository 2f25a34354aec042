// std
use std::time::Duration as StdDuration;
// crates.io
use axum::{
	Router,
	body::{Body, to_bytes},
	http::{Method, Request, StatusCode},
};
use httpmock::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;
// self
use wxa_gateway::_preludet::*;

async fn post_json(app: &Router, path: &str, payload: Value) -> (StatusCode, Value) {
	let request = Request::builder()
		.method(Method::POST)
		.uri(path)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Test request should build.");
	let response = app.clone().oneshot(request).await.expect("Router should always answer.");
	let status = response.status();
	let bytes =
		to_bytes(response.into_body(), usize::MAX).await.expect("Response body should be readable.");

	(status, serde_json::from_slice(&bytes).expect("Response body should be JSON."))
}

async fn mock_token<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
	let body = json!({"access_token": token, "expires_in": 7200});

	server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200).header("content-type", "application/json").json_body(body.clone());
		})
		.await
}

fn pass_verdict() -> Value {
	json!({
		"errcode": 0,
		"errmsg": "ok",
		"trace_id": "trace-pass",
		"result": {"suggest": "pass", "label": 100},
		"detail": [{"strategy": "content_model", "errcode": 0, "suggest": "pass", "label": 100}]
	})
}

#[tokio::test]
async fn verdict_is_shaped_for_clients() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let token = mock_token(&server, "abc").await;
	let check = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/wxa/msg_sec_check")
				.query_param("access_token", "abc")
				.json_body(json!({
					"version": 2,
					"openid": "oUser-1",
					"scene": 2,
					"content": "hello there",
					"title": "greeting"
				}));
			then.status(200).header("content-type", "application/json").json_body(json!({
				"errcode": 0,
				"errmsg": "ok",
				"trace_id": "trace-risky",
				"result": {"suggest": "risky", "label": 20001},
				"detail": [{"strategy": "keyword", "errcode": 0, "suggest": "risky", "label": 20001, "keyword": "x"}]
			}));
		})
		.await;
	let (status, body) = post_json(
		&app,
		"/text-check",
		json!({"content": "hello there", "openid": "oUser-1", "title": "greeting", "signature": "ignored"}),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["safe"], false);
	assert_eq!(body["data"]["suggestion"], "risky");
	assert_eq!(body["data"]["label"], 20001);
	assert_eq!(body["data"]["traceId"], "trace-risky");
	assert_eq!(body["data"]["detail"][0]["strategy"], "keyword");
	assert_eq!(body["message"], "Content contains violations and should not be published.");

	token.assert_calls_async(1).await;
	check.assert_calls_async(1).await;
}

#[tokio::test]
async fn signature_is_forwarded_for_profile_scene() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let _token = mock_token(&server, "abc").await;
	let check = server
		.mock_async(|when, then| {
			when.method(POST).path("/wxa/msg_sec_check").json_body(json!({
				"version": 2,
				"openid": "oUser-1",
				"scene": 1,
				"content": "about me",
				"signature": "my bio"
			}));
			then.status(200).header("content-type", "application/json").json_body(pass_verdict());
		})
		.await;
	let (status, body) = post_json(
		&app,
		"/api/security/text-check",
		json!({"content": "about me", "openid": "oUser-1", "scene": 1, "signature": "my bio"}),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["safe"], true);
	assert_eq!(body["message"], "Content is safe to publish.");

	check.assert_calls_async(1).await;
}

#[tokio::test]
async fn invalid_input_never_reaches_upstream() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let token = mock_token(&server, "abc").await;
	let check = server
		.mock_async(|when, then| {
			when.path("/wxa/msg_sec_check");
			then.status(200).json_body(pass_verdict());
		})
		.await;
	let cases = [
		(json!({"openid": "oUser-1"}), "INVALID_PARAMS"),
		(json!({"content": 7, "openid": "oUser-1"}), "INVALID_PARAMS"),
		(json!({"content": "hi"}), "MISSING_OPENID"),
		(json!({"content": "hi", "openid": "has space"}), "MISSING_OPENID"),
		(json!({"content": "a".repeat(2600), "openid": "oUser-1"}), "CONTENT_TOO_LONG"),
		(json!({"content": "😀".repeat(1300), "openid": "oUser-1"}), "CONTENT_TOO_LONG"),
		(json!({"content": "hi", "openid": "oUser-1", "scene": 7}), "INVALID_SCENE"),
		(json!({"content": "hi", "openid": "oUser-1", "scene": "1"}), "INVALID_SCENE"),
		(json!({"content": "hi", "openid": "oUser-1", "scene": null}), "INVALID_SCENE"),
		(json!({"content": "hi", "openid": "oUser-1", "scene": 2.5}), "INVALID_SCENE"),
	];

	for (payload, code) in cases {
		let (status, body) = post_json(&app, "/text-check", payload.clone()).await;

		assert_eq!(status, StatusCode::BAD_REQUEST, "Payload {payload} should be rejected.");
		assert_eq!(body["code"], code, "Payload {payload} should map to {code}.");
		assert_eq!(body["error"], "invalid_input");
	}

	token.assert_calls_async(0).await;
	check.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_access_token_is_dropped_from_cache() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let token = mock_token(&server, "stale").await;
	let check = server
		.mock_async(|when, then| {
			when.method(POST).path("/wxa/msg_sec_check").query_param("access_token", "stale");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({"errcode": 40001, "errmsg": "invalid credential"}));
		})
		.await;
	let payload = json!({"content": "hello", "openid": "oUser-1"});

	for _ in 0..2 {
		let (status, body) = post_json(&app, "/text-check", payload.clone()).await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["code"], "UPSTREAM_REJECTED");
		assert_eq!(body["errcode"], 40001);
		assert_eq!(body["message"], "Access token is invalid or expired.");
	}

	token.assert_calls_async(2).await;
	check.assert_calls_async(2).await;
}

#[tokio::test]
async fn slow_upstream_maps_to_gateway_timeout() {
	let server = MockServer::start_async().await;
	let mut config = test_config(&server.base_url());

	config.timeouts.text_check = StdDuration::from_millis(200);

	let app = router(test_state(config, Arc::new(SystemClock)));
	let _token = mock_token(&server, "abc").await;
	let _check = server
		.mock_async(|when, then| {
			when.method(POST).path("/wxa/msg_sec_check");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(pass_verdict())
				.delay(StdDuration::from_secs(2));
		})
		.await;
	let (status, body) =
		post_json(&app, "/text-check", json!({"content": "hello", "openid": "oUser-1"})).await;

	assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
	assert_eq!(body["code"], "UPSTREAM_TIMEOUT");
	assert_eq!(body["error"], "upstream_unavailable");
}

#[tokio::test]
async fn unreachable_upstream_maps_to_bad_gateway() {
	let app = router(test_state(test_config("http://127.0.0.1:9"), Arc::new(SystemClock)));
	let (status, body) =
		post_json(&app, "/text-check", json!({"content": "hello", "openid": "oUser-1"})).await;

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
}
