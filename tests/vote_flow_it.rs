// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
// self
use vote_broker::{
	_preludet::*,
	auth::AccessToken,
	config::{Config, VotePayload},
	envelope::{self, WireBody},
	error::ErrorKind,
	flows::{ReqwestVoteBroker, VoteBroker, VoteOrchestrator},
	http::ReqwestHttpClient,
	obs::Hop,
};

fn build_config(server: &MockServer) -> Config {
	test_config(&server.url("/token"), &server.url("/vote"))
		.with_payload(
			VotePayload::new("voter@example.com", "event-42")
				.expect("Test vote payload should be valid."),
		)
		.with_upstream_timeout(Duration::from_secs(2))
}

fn build_broker(config: &Config) -> ReqwestVoteBroker {
	VoteBroker::new(config).expect("Broker should build for vote flow tests.")
}

#[tokio::test]
async fn request_vote_url_sends_bearer_and_payload() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/vote")
				.header("authorization", "Bearer direct-token")
				.header("content-type", "application/json")
				.json_body(json!({ "email": "voter@example.com", "eventId": "event-42" }));
			then.status(200).json_body(json!({ "data": { "url": "https://vote.example/direct" } }));
		})
		.await;
	let config = build_config(&server);
	let http_client = ReqwestHttpClient::with_timeout(config.upstream_timeout)
		.expect("Failed to build reqwest client for orchestrator test.");
	let orchestrator: VoteOrchestrator<ReqwestHttpClient> =
		VoteOrchestrator::new(&config, http_client);
	let result = orchestrator
		.request_vote_url(AccessToken::new("direct-token"), &config.payload)
		.await
		.expect("Data endpoint success should yield a URL.");

	assert_eq!(result.url, "https://vote.example/direct");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn both_hops_succeed_and_the_url_is_returned_exactly() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).json_body(json!({ "data": { "access_token": "flow-token" } }));
		})
		.await;
	let vote = server
		.mock_async(|when, then| {
			when.method(POST).path("/vote").header("authorization", "Bearer flow-token");
			then.status(200).json_body(
				json!({ "data": { "url": "https://vote.example/ballot?once=7f3a&lang=en" } }),
			);
		})
		.await;
	let broker = build_broker(&build_config(&server));
	let outcome = broker.initiate_vote().await;
	let response = envelope::build_response(outcome, OffsetDateTime::now_utc());

	assert_eq!(response.status.as_u16(), 200);

	match response.body {
		WireBody::Success(body) => {
			assert!(body.success);
			assert_eq!(body.url, "https://vote.example/ballot?once=7f3a&lang=en");
			assert!(!body.message.is_empty());
			assert!(
				OffsetDateTime::parse(&body.timestamp, &Rfc3339).is_ok(),
				"Timestamp `{}` should be ISO-8601.",
				body.timestamp
			);
		},
		other => panic!("Unexpected body: {other:?}."),
	}

	token.assert_calls_async(1).await;
	vote.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_rejection_short_circuits_the_vote_hop() {
	for status in [400_u16, 401, 403, 429, 502] {
		let server = MockServer::start_async().await;
		let token = server
			.mock_async(|when, then| {
				when.method(POST).path("/token");
				then.status(status).json_body(json!({ "message": "credentials refused" }));
			})
			.await;
		let vote = server
			.mock_async(|when, then| {
				when.method(POST).path("/vote");
				then.status(200).json_body(json!({ "data": { "url": "https://never" } }));
			})
			.await;
		let broker = build_broker(&build_config(&server));
		let err = broker.initiate_vote().await.expect_err("Token rejection should fail the vote.");
		let failure = err.envelope();

		assert_eq!(failure.kind, ErrorKind::UpstreamRejected);
		assert_eq!(failure.upstream_status, Some(status));
		assert_eq!(failure.message, "credentials refused");
		assert_eq!(err.hop(), Some(Hop::Token));

		let response = envelope::build_failure(failure, OffsetDateTime::now_utc());

		assert_eq!(response.status.as_u16(), status);
		assert!(matches!(response.body, WireBody::Failure(ref body) if !body.success));

		token.assert_calls_async(1).await;
		vote.assert_calls_async(0).await;
	}
}

#[tokio::test]
async fn token_timeout_is_a_network_error_and_skips_the_vote_hop() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.delay(Duration::from_millis(1_500))
				.json_body(json!({ "data": { "access_token": "late" } }));
		})
		.await;
	let vote = server
		.mock_async(|when, then| {
			when.method(POST).path("/vote");
			then.status(200).json_body(json!({ "data": { "url": "https://never" } }));
		})
		.await;
	let config = build_config(&server).with_upstream_timeout(Duration::from_millis(200));
	let broker = build_broker(&config);
	let response = envelope::build_response(broker.initiate_vote().await, OffsetDateTime::now_utc());

	assert_eq!(response.status.as_u16(), 500);

	match response.body {
		WireBody::Failure(body) => {
			assert!(!body.success);
			assert_eq!(body.message, vote_broker::error::NETWORK_ERROR_MESSAGE);
		},
		other => panic!("Unexpected body: {other:?}."),
	}

	token.assert_calls_async(1).await;
	vote.assert_calls_async(0).await;
}

#[tokio::test]
async fn vote_response_without_url_is_a_contract_error() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).json_body(json!({ "data": { "access_token": "contract-token" } }));
		})
		.await;
	let vote = server
		.mock_async(|when, then| {
			when.method(POST).path("/vote");
			then.status(200).json_body(json!({ "data": { "link": "https://elsewhere" } }));
		})
		.await;
	let broker = build_broker(&build_config(&server));
	let err = broker.initiate_vote().await.expect_err("Missing url should fail the vote.");

	assert_eq!(err.kind(), ErrorKind::UpstreamContractError);
	assert_eq!(err.hop(), Some(Hop::Vote));
	assert_eq!(
		envelope::status_for(&err.envelope()).as_u16(),
		500,
		"Contract violations should map to 500."
	);

	vote.assert_calls_async(1).await;
}

#[tokio::test]
async fn vote_rejection_forwards_the_data_endpoint_status() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).json_body(json!({ "data": { "access_token": "reject-token" } }));
		})
		.await;
	let _vote = server
		.mock_async(|when, then| {
			when.method(POST).path("/vote");
			then.status(409).body("Vote already cast");
		})
		.await;
	let broker = build_broker(&build_config(&server));
	let err = broker.initiate_vote().await.expect_err("Data endpoint conflict should fail.");
	let failure = err.envelope();

	assert_eq!(failure.kind, ErrorKind::UpstreamRejected);
	assert_eq!(failure.upstream_status, Some(409));
	assert_eq!(failure.message, vote_broker::error::UNKNOWN_API_ERROR);
	assert_eq!(failure.detail, Some(json!("Vote already cast")));
	assert_eq!(err.hop(), Some(Hop::Vote));
}

#[tokio::test]
async fn each_traversal_fetches_a_fresh_token() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).json_body(json!({ "data": { "access_token": "fresh" } }));
		})
		.await;
	let _vote = server
		.mock_async(|when, then| {
			when.method(POST).path("/vote");
			then.status(200).json_body(json!({ "data": { "url": "https://vote.example/f" } }));
		})
		.await;
	let broker = build_broker(&build_config(&server));

	for _ in 0..3 {
		broker.initiate_vote().await.expect("Every traversal should succeed.");
	}

	token.assert_calls_async(3).await;
}
