#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use session_broker::{
	_preludet::*,
	codec::JsonModelParser,
	error::TransportError,
	pinning::TrustEvaluator,
	request::{CachePolicy, Headers, Method, Payload, Request},
	session::Session,
	transport::{ReqwestTransport, Transport, TransportRequest},
};

fn transport_request(url: Url, method: Method) -> TransportRequest {
	TransportRequest {
		url,
		method,
		headers: Headers::new(),
		body: None,
		timeout: Duration::seconds(5),
		cache_policy: CachePolicy::IgnoreCache,
		trust: TrustEvaluator::disabled(),
	}
}

#[tokio::test]
async fn round_trips_status_headers_and_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/ping");
			then.status(200).header("x-trace", "abc123").body("pong");
		})
		.await;
	let url = Url::parse(&server.url("/v1/ping")).expect("Mock URL should parse.");
	let output = ReqwestTransport::default()
		.execute(transport_request(url, Method::Get))
		.await
		.expect("Exchange against the mock server should succeed.");

	mock.assert_async().await;

	assert_eq!(output.metadata.status, Some(200));
	assert_eq!(output.metadata.headers.get("x-trace"), Some("abc123"));
	assert_eq!(output.body.as_deref(), Some(b"pong".as_slice()));
}

#[tokio::test]
async fn sends_method_headers_and_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/users")
				.header("content-type", "application/json")
				.header("x-request-id", "it-42")
				.body("{\"name\":\"ada\"}");
			then.status(204);
		})
		.await;
	let url = Url::parse(&server.url("/v1/users")).expect("Mock URL should parse.");
	let mut request = transport_request(url, Method::Post);

	request.headers.insert("Content-Type", "application/json");
	request.headers.insert("X-Request-Id", "it-42");
	request.body = Some(b"{\"name\":\"ada\"}".to_vec());

	let output = ReqwestTransport::default()
		.execute(request)
		.await
		.expect("POST against the mock server should succeed.");

	mock.assert_async().await;

	assert_eq!(output.metadata.status, Some(204));
	assert_eq!(output.body, None);
}

#[tokio::test]
async fn connection_failures_surface_as_network_errors() {
	// Nothing listens on port 1.
	let url = Url::parse("http://127.0.0.1:1/v1/ping").expect("Test URL should parse.");
	let error = ReqwestTransport::default()
		.execute(transport_request(url, Method::Get))
		.await
		.expect_err("Connecting to a closed port should fail.");

	assert!(matches!(error, TransportError::Network { .. }));
}

#[derive(Debug, PartialEq, Deserialize)]
struct Pong {
	ok: bool,
}

#[tokio::test]
async fn session_drives_the_reqwest_transport_end_to_end() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/echo").header("content-type", "application/json");
			then.status(200).header("content-type", "application/json").body("{\"ok\":true}");
		})
		.await;
	let session = Session::builder(Arc::new(ReqwestTransport::default())).build();
	let url = Url::parse(&server.url("/v1/echo")).expect("Mock URL should parse.");
	let request = Request::builder(Method::Post, url)
		.payload(Payload::form([("k", "v")]))
		.header("Content-Type", "application/json")
		.model_parser(Arc::new(JsonModelParser::<Pong>::new()))
		.build();
	let response = session.execute(request).await.expect("End-to-end exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(response.raw.status, Some(200));
	assert_eq!(response.model_as::<Pong>(), Some(&Pong { ok: true }));
}
