//! Two-hop vote initiation service—exchange client credentials for a bearer token, trade it for
//! a single-use vote URL, and hand that URL back behind a uniform response envelope.

#![deny(clippy::all, missing_docs)]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod server;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fakes shared by unit and integration tests; enabled via
	//! `cfg(test)` or the `test` feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		config::{Config, Credentials},
		flows::VoteBroker,
		http::{UpstreamFuture, UpstreamHttpClient, UpstreamRequest, UpstreamResponse},
	};

	/// Client identifier used by test configurations.
	pub const TEST_CLIENT_ID: &str = "vote-client";
	/// Client secret used by test configurations.
	pub const TEST_CLIENT_SECRET: &str = "vote-secret";

	/// Builds a configuration pointing at the given endpoints with test credentials.
	pub fn test_config(token_endpoint: &str, data_endpoint: &str) -> Config {
		Config::new(
			Url::parse(token_endpoint).expect("Failed to parse test token endpoint."),
			Url::parse(data_endpoint).expect("Failed to parse test data endpoint."),
			Credentials::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
				.expect("Failed to build test credentials."),
		)
	}

	/// Transport failure raised by [`ScriptedHttpClient`].
	#[derive(Debug)]
	pub enum FakeTransportError {
		/// Simulated refused connection.
		ConnectionRefused,
	}
	impl Display for FakeTransportError {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			match self {
				Self::ConnectionRefused => write!(f, "Connection refused."),
			}
		}
	}
	impl StdError for FakeTransportError {}

	type Responder =
		dyn Fn(&UpstreamRequest) -> Result<UpstreamResponse, FakeTransportError> + Send + Sync;

	/// In-memory transport that answers through a closure and records every request.
	pub struct ScriptedHttpClient {
		responder: Box<Responder>,
		delay: Option<Duration>,
		requests: Mutex<Vec<UpstreamRequest>>,
	}
	impl ScriptedHttpClient {
		/// Creates a transport answering through `responder`.
		pub fn new<F>(responder: F) -> Self
		where
			F: 'static
				+ Send
				+ Sync
				+ Fn(&UpstreamRequest) -> Result<UpstreamResponse, FakeTransportError>,
		{
			Self { responder: Box::new(responder), delay: None, requests: Mutex::new(Vec::new()) }
		}

		/// Delays every response by `delay`.
		pub fn with_delay(mut self, delay: Duration) -> Self {
			self.delay = Some(delay);

			self
		}

		/// Requests received so far.
		pub fn requests(&self) -> Vec<UpstreamRequest> {
			self.requests.lock().clone()
		}

		/// Number of requests whose URL path equals `path`.
		pub fn calls_to(&self, path: &str) -> usize {
			self.requests.lock().iter().filter(|request| request.url.path() == path).count()
		}
	}
	impl UpstreamHttpClient for ScriptedHttpClient {
		type TransportError = FakeTransportError;

		fn execute(&self, request: UpstreamRequest) -> UpstreamFuture<'_, Self::TransportError> {
			Box::pin(async move {
				self.requests.lock().push(request.clone());

				if let Some(delay) = self.delay {
					tokio::time::sleep(delay).await;
				}

				(self.responder)(&request)
			})
		}
	}

	/// Upstream pair that issues `token-<n>` on `/token` and echoes the bearer into the URL
	/// returned by `/vote`, so every result can be traced back to the token it was minted for.
	pub fn echo_upstream() -> ScriptedHttpClient {
		let issued = AtomicUsize::new(0);

		ScriptedHttpClient::new(move |request| match request.url.path() {
			"/token" => {
				let n = issued.fetch_add(1, Ordering::SeqCst);

				Ok(UpstreamResponse::new(
					200,
					format!(r#"{{"data":{{"access_token":"token-{n}"}}}}"#),
				))
			},
			"/vote" => match &request.bearer {
				Some(token) => Ok(UpstreamResponse::new(
					200,
					format!(r#"{{"data":{{"url":"https://vote.example/{}"}}}}"#, token.expose()),
				)),
				None => Ok(UpstreamResponse::new(401, r#"{"error":"missing bearer"}"#)),
			},
			_ => Ok(UpstreamResponse::new(404, "")),
		})
	}

	/// Broker wired to `http_client` with endpoints `https://upstream.test/{token,vote}`.
	pub fn scripted_broker(
		http_client: Arc<ScriptedHttpClient>,
	) -> VoteBroker<ScriptedHttpClient> {
		let config = test_config("https://upstream.test/token", "https://upstream.test/vote");

		VoteBroker::with_http_client(&config, http_client)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
// Used by the binary.
use color_eyre as _;
