// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use vote_broker::{
	_preludet::*,
	config::Config,
	error::{ContractError, ErrorKind, TransportError},
	flows::TokenAcquirer,
	http::ReqwestHttpClient,
	obs::Hop,
};

fn build_acquirer(
	server: &MockServer,
	timeout: Duration,
) -> (TokenAcquirer<ReqwestHttpClient>, Config) {
	let config =
		test_config(&server.url("/token"), &server.url("/vote")).with_upstream_timeout(timeout);
	let http_client = ReqwestHttpClient::with_timeout(timeout)
		.expect("Failed to build reqwest client for token tests.");

	(TokenAcquirer::new(&config, http_client), config)
}

#[tokio::test]
async fn acquire_token_returns_the_issued_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/json")
				.json_body(json!({
					"client_id": TEST_CLIENT_ID,
					"client_secret": TEST_CLIENT_SECRET,
				}));
			then.status(200).json_body(json!({ "data": { "access_token": "issued-token" } }));
		})
		.await;
	let (acquirer, config) = build_acquirer(&server, Duration::from_secs(5));
	let token = acquirer
		.acquire_token(&config.credentials)
		.await
		.expect("Token endpoint success should yield a token.");

	assert_eq!(token.expose(), "issued-token");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn acquire_token_forwards_rejections_verbatim() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401).json_body(json!({ "error": "invalid_client", "hint": "rotate" }));
		})
		.await;
	let (acquirer, config) = build_acquirer(&server, Duration::from_secs(5));
	let err = acquirer
		.acquire_token(&config.credentials)
		.await
		.expect_err("A 401 should surface as a rejection.");

	match &err {
		Error::UpstreamRejected { hop, status, body } => {
			assert_eq!(*hop, Hop::Token);
			assert_eq!(*status, 401);
			assert_eq!(body, &json!({ "error": "invalid_client", "hint": "rotate" }));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert_eq!(err.envelope().message, "invalid_client");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn acquire_token_flags_missing_token_field() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).json_body(json!({ "data": { "token": "wrong-field" } }));
		})
		.await;
	let (acquirer, config) = build_acquirer(&server, Duration::from_secs(5));
	let err = acquirer
		.acquire_token(&config.credentials)
		.await
		.expect_err("A body without access_token should violate the contract.");

	assert_eq!(err.kind(), ErrorKind::UpstreamContractError);
	assert!(matches!(
		err,
		Error::UpstreamContract { hop: Hop::Token, source: ContractError::Shape(_) }
	));
}

#[tokio::test]
async fn acquire_token_flags_empty_and_non_json_bodies() {
	let server = MockServer::start_async().await;
	let mut empty = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).json_body(json!({ "data": { "access_token": "" } }));
		})
		.await;
	let (acquirer, config) = build_acquirer(&server, Duration::from_secs(5));
	let err = acquirer
		.acquire_token(&config.credentials)
		.await
		.expect_err("An empty token should violate the contract.");

	assert!(matches!(
		err,
		Error::UpstreamContract {
			source: ContractError::EmptyField { path: "data.access_token" },
			..
		}
	));

	empty.delete_async().await;

	let _html = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "text/html").body("<html>ok</html>");
		})
		.await;
	let err = acquirer
		.acquire_token(&config.credentials)
		.await
		.expect_err("HTML should violate the contract.");

	assert_eq!(err.kind(), ErrorKind::UpstreamContractError);
}

#[tokio::test]
async fn acquire_token_times_out_as_network_error() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.delay(Duration::from_millis(1_500))
				.json_body(json!({ "data": { "access_token": "too-late" } }));
		})
		.await;
	let (acquirer, config) = build_acquirer(&server, Duration::from_millis(100));
	let err = acquirer
		.acquire_token(&config.credentials)
		.await
		.expect_err("A slow token endpoint should time out.");

	assert_eq!(err.kind(), ErrorKind::NetworkError);
	assert_eq!(err.hop(), Some(Hop::Token));
}

#[tokio::test]
async fn acquire_token_reports_refused_connections() {
	let port = {
		let listener =
			std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to reserve a local port.");

		listener.local_addr().expect("Reserved port should have an address.").port()
	};
	let config = test_config(
		&format!("http://127.0.0.1:{port}/token"),
		&format!("http://127.0.0.1:{port}/vote"),
	);
	let http_client = ReqwestHttpClient::with_timeout(Duration::from_secs(2))
		.expect("Failed to build reqwest client for refused connection test.");
	let acquirer: TokenAcquirer<ReqwestHttpClient> = TokenAcquirer::new(&config, http_client);
	let err = acquirer
		.acquire_token(&config.credentials)
		.await
		.expect_err("Nothing listens on the reserved port.");

	assert!(matches!(
		err,
		Error::Network { hop: Hop::Token, source: TransportError::Network { .. } }
	));

	let envelope = err.envelope();

	assert_eq!(envelope.kind, ErrorKind::NetworkError);
	assert!(envelope.detail.is_some_and(|detail| detail.is_string()));
}
