//! Vote Orchestrator: trades a bearer token for a single-use vote URL.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	config::{Config, VotePayload},
	flows::common,
	http::{UpstreamHttpClient, UpstreamRequest},
	obs::{self, Hop, HopOutcome, HopSpan},
};

#[derive(Deserialize)]
struct VoteData {
	url: String,
}

/// Single-use action link produced by the data endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoteResult {
	/// Action URL, exactly as returned upstream.
	pub url: String,
}

/// Performs the second hop against the data endpoint.
pub struct VoteOrchestrator<C>
where
	C: UpstreamHttpClient,
{
	http_client: Arc<C>,
	endpoint: Url,
	timeout: Duration,
}
impl<C> VoteOrchestrator<C>
where
	C: UpstreamHttpClient,
{
	/// Creates an orchestrator targeting the configured data endpoint.
	pub fn new(config: &Config, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			endpoint: config.data_endpoint.clone(),
			timeout: config.upstream_timeout,
		}
	}

	/// Posts `payload` with `token` as the bearer credential and returns the vote URL.
	pub async fn request_vote_url(
		&self,
		token: AccessToken,
		payload: &VotePayload,
	) -> Result<VoteResult> {
		const HOP: Hop = Hop::Vote;

		let span = HopSpan::new(HOP, "request_vote_url");

		obs::record_hop_outcome(HOP, HopOutcome::Attempt);

		let result = span
			.instrument(async {
				let request =
					UpstreamRequest::json(self.endpoint.clone(), payload)?.with_bearer(token);
				let data: VoteData =
					common::send_hop(self.http_client.as_ref(), HOP, self.timeout, request).await?;

				common::require_non_empty(HOP, "data.url", &data.url)?;

				Ok::<_, Error>(VoteResult { url: data.url })
			})
			.await;

		match &result {
			Ok(_) => obs::record_hop_outcome(HOP, HopOutcome::Success),
			Err(_) => obs::record_hop_outcome(HOP, HopOutcome::Failure),
		}

		result
	}
}
impl<C> Debug for VoteOrchestrator<C>
where
	C: UpstreamHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("VoteOrchestrator")
			.field("endpoint", &self.endpoint.as_str())
			.field("timeout", &self.timeout)
			.finish()
	}
}
