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

async fn send(app: &Router, method: Method, path: &str, body: &str) -> (StatusCode, String) {
	let request = Request::builder()
		.method(method)
		.uri(path)
		.header("content-type", "application/json")
		.body(Body::from(body.to_owned()))
		.expect("Test request should build.");
	let response = app.clone().oneshot(request).await.expect("Router should always answer.");
	let status = response.status();
	let bytes =
		to_bytes(response.into_body(), usize::MAX).await.expect("Response body should be readable.");

	(status, String::from_utf8(bytes.to_vec()).expect("Response body should be UTF-8."))
}

fn parse(body: &str) -> Value {
	serde_json::from_str(body).expect("Response body should be JSON.")
}

#[tokio::test]
async fn login_exchange_returns_identity_without_session_key() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/sns/jscode2session")
				.query_param("appid", TEST_APP_ID)
				.query_param("secret", TEST_APP_SECRET)
				.query_param("js_code", "code-123")
				.query_param("grant_type", "authorization_code");
			then.status(200).header("content-type", "application/json").body(
				"{\"openid\":\"oUser-1234567\",\"session_key\":\"session-key-value\",\"unionid\":\"uUnion-1\"}",
			);
		})
		.await;
	let (status, body) =
		send(&app, Method::POST, "/login-exchange", "{\"code\":\"code-123\"}").await;

	assert_eq!(status, StatusCode::OK);
	assert!(!body.contains("session"), "Session key must never reach the client: {body}");
	assert_eq!(
		parse(&body),
		json!({
			"success": true,
			"data": {"openid": "oUser-1234567", "unionid": "uUnion-1"},
			"message": "login succeeded"
		})
	);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn legacy_alias_routes_to_login_exchange() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/sns/jscode2session");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"openid\":\"oUser-1\",\"session_key\":\"sk\"}");
		})
		.await;
	let (status, body) =
		send(&app, Method::POST, "/api/auth/code2session", "{\"code\":\"code-1\"}").await;
	let body = parse(&body);

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["openid"], "oUser-1");
	assert!(body["data"].get("unionid").is_none());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn invalid_login_code_maps_errcode_to_message() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/sns/jscode2session");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40029,\"errmsg\":\"invalid code\"}");
		})
		.await;
	let (status, body) = send(&app, Method::POST, "/login-exchange", "{\"code\":\"stale\"}").await;
	let body = parse(&body);

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["success"], false);
	assert_eq!(body["code"], "UPSTREAM_REJECTED");
	assert_eq!(body["error"], "upstream_rejected");
	assert_eq!(body["message"], "Login credential is invalid, please log in again.");
	assert_eq!(body["errcode"], 40029);
	assert_eq!(body["errmsg"], "invalid code");
	assert!(body.get("data").is_none());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_code_is_rejected_before_upstream() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.path("/sns/jscode2session");
			then.status(200).body("{}");
		})
		.await;

	for payload in ["", "{}", "{\"code\":\"\"}", "{\"code\":42}"] {
		let (status, body) = send(&app, Method::POST, "/login-exchange", payload).await;
		let body = parse(&body);

		assert_eq!(status, StatusCode::BAD_REQUEST, "Payload {payload:?} should be rejected.");
		assert_eq!(body["code"], "MISSING_CODE");
		assert_eq!(body["error"], "invalid_input");
	}

	let (status, body) = send(&app, Method::POST, "/login-exchange", "[1, 2").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(parse(&body)["code"], "MALFORMED_BODY");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn wrong_method_is_rejected_before_upstream() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.path("/sns/jscode2session");
			then.status(200).body("{}");
		})
		.await;
	let (status, body) = send(&app, Method::GET, "/login-exchange", "").await;
	let body = parse(&body);

	assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
	assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
	assert_eq!(body["error"], "method_not_allowed");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn missing_credentials_are_reported_after_validation() {
	let server = MockServer::start_async().await;
	let config = GatewayConfig { app_secret: None, ..test_config(&server.base_url()) };
	let app = router(test_state(config, Arc::new(SystemClock)));
	let mock = server
		.mock_async(|when, then| {
			when.path("/sns/jscode2session");
			then.status(200).body("{}");
		})
		.await;
	let (status, body) = send(&app, Method::POST, "/login-exchange", "{}").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(parse(&body)["code"], "MISSING_CODE");

	let (status, body) = send(&app, Method::POST, "/login-exchange", "{\"code\":\"c\"}").await;
	let body = parse(&body);

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["code"], "MISSING_CONFIGURATION");
	assert_eq!(body["error"], "configuration");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn upstream_html_error_is_a_contract_violation() {
	let server = MockServer::start_async().await;
	let (app, _clock) = test_router(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.path("/sns/jscode2session");
			then.status(503).header("content-type", "text/html").body("<html>down</html>");
		})
		.await;
	let (status, body) = send(&app, Method::POST, "/login-exchange", "{\"code\":\"c\"}").await;
	let body = parse(&body);

	assert_eq!(status, StatusCode::BAD_GATEWAY);
	assert_eq!(body["code"], "INVALID_UPSTREAM_RESPONSE");
	assert_eq!(body["error"], "upstream_contract");

	mock.assert_calls_async(1).await;
}
