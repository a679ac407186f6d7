//! Shared hop plumbing: deadline, status classification, and `{ "data": ... }` decoding.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ContractError, TransportError},
	http::{UpstreamHttpClient, UpstreamRequest},
	obs::Hop,
};

/// `{ "data": T }` wrapper returned by both upstream services.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
	pub(crate) data: T,
}

/// Sends one hop and decodes the `data` member of a successful response.
///
/// No response within `timeout` and transport failures are [`Error::Network`]; a non-2xx status
/// is [`Error::UpstreamRejected`] carrying the body verbatim; an undecodable success body is
/// [`Error::UpstreamContract`].
pub(crate) async fn send_hop<C, T>(
	http_client: &C,
	hop: Hop,
	timeout: Duration,
	request: UpstreamRequest,
) -> Result<T>
where
	C: UpstreamHttpClient,
	T: DeserializeOwned,
{
	let response = match tokio::time::timeout(timeout, http_client.execute(request)).await {
		Ok(Ok(response)) => response,
		Ok(Err(e)) => return Err(Error::Network { hop, source: TransportError::network(e) }),
		Err(_) =>
			return Err(Error::Network { hop, source: TransportError::Timeout { after: timeout } }),
	};

	if !response.is_success() {
		return Err(Error::UpstreamRejected {
			hop,
			status: response.status,
			body: forwarded_body(&response.body),
		});
	}

	decode_data(hop, &response.body)
}

/// Decodes `{ "data": T }`, keeping the path of the first offending field.
pub(crate) fn decode_data<T>(hop: Hop, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let envelope: DataEnvelope<T> = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| Error::UpstreamContract { hop, source: ContractError::from(e) })?;

	Ok(envelope.data)
}

/// Rejects an empty required string field.
pub(crate) fn require_non_empty(hop: Hop, path: &'static str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(Error::UpstreamContract { hop, source: ContractError::EmptyField { path } });
	}

	Ok(())
}

/// Upstream body as JSON when it parses, otherwise as a JSON string.
pub(crate) fn forwarded_body(body: &[u8]) -> serde_json::Value {
	serde_json::from_slice(body)
		.unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(body).into_owned()))
}
