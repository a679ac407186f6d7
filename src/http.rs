//! Transport primitives for the two outbound hops.
//!
//! The module exposes [`UpstreamHttpClient`] alongside [`UpstreamRequest`] and
//! [`UpstreamResponse`] so tests and downstream crates can swap the HTTP stack without touching
//! the hop logic. Implementations only move bytes: status classification and body decoding live
//! in the flows, and deadlines are enforced around the returned future.

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	header::{ACCEPT, CONTENT_TYPE},
	redirect::Policy,
};
// self
use crate::{_prelude::*, auth::AccessToken, error::ConfigError};

/// Boxed future returned by [`UpstreamHttpClient::execute`].
pub type UpstreamFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<UpstreamResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of posting JSON to the upstream services.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared across
/// concurrent requests behind an `Arc`, and the futures they return must be `Send` so handlers
/// can run on a multi-threaded executor.
pub trait UpstreamHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted when no response was received.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves once the full response body is available.
	///
	/// Any received status, successful or not, is an `Ok` response; `Err` is reserved for
	/// failures where the upstream never answered.
	fn execute(&self, request: UpstreamRequest) -> UpstreamFuture<'_, Self::TransportError>;
}

/// JSON `POST` aimed at an upstream service.
#[derive(Clone, Debug)]
pub struct UpstreamRequest {
	/// Target endpoint.
	pub url: Url,
	/// Bearer credential attached as `Authorization: Bearer <token>`.
	pub bearer: Option<AccessToken>,
	/// Serialized JSON body.
	pub body: Vec<u8>,
}
impl UpstreamRequest {
	/// Serializes `body` as JSON for `url`.
	pub fn json<T>(url: Url, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(body).map_err(Error::internal)?;

		Ok(Self { url, bearer: None, body })
	}

	/// Attaches a bearer token.
	pub fn with_bearer(mut self, token: AccessToken) -> Self {
		self.bearer = Some(token);

		self
	}
}

/// Status and raw body returned by an upstream service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl UpstreamResponse {
	/// Builds a response from a status code and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Upstream calls should not follow redirects; a redirect is reported as the status it carries.
/// Configure any custom [`ReqwestClient`] passed to [`ReqwestHttpClient::with_client`] the same
/// way.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with redirects disabled and the given request timeout.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).timeout(timeout).build()?;

		Ok(Self(client))
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl UpstreamHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: UpstreamRequest) -> UpstreamFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let mut builder = self
				.0
				.post(request.url)
				.header(CONTENT_TYPE, "application/json")
				.header(ACCEPT, "application/json")
				.body(request.body);

			if let Some(token) = &request.bearer {
				builder = builder.bearer_auth(token.expose());
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok::<_, ReqwestError>(UpstreamResponse { status, body })
		})
	}
}
