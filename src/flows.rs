//! Vote initiation: the token hop, the vote hop, and the sequencer that chains them.

mod common;
mod token;
mod vote;

pub use token::*;
pub use vote::*;

// self
use crate::{
	_prelude::*,
	config::{Config, Credentials, VotePayload},
	error::{ConfigError, display_chain},
	http::{ReqwestHttpClient, UpstreamHttpClient},
	obs::VoteStage,
};

/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestVoteBroker = VoteBroker<ReqwestHttpClient>;

/// Runs one vote traversal per call: token hop, then vote hop.
///
/// The broker only holds immutable configuration and the shared transport, so a single instance
/// can serve any number of concurrent traversals. Each traversal obtains its own token; nothing
/// from one call is visible to another.
pub struct VoteBroker<C>
where
	C: UpstreamHttpClient,
{
	/// First hop.
	pub tokens: TokenAcquirer<C>,
	/// Second hop.
	pub votes: VoteOrchestrator<C>,
	/// Credentials presented on the first hop.
	pub credentials: Credentials,
	/// Payload forwarded on the second hop.
	pub payload: VotePayload,
}
impl<C> VoteBroker<C>
where
	C: UpstreamHttpClient,
{
	/// Creates a broker that shares the caller-provided transport between both hops.
	pub fn with_http_client(config: &Config, http_client: impl Into<Arc<C>>) -> Self {
		let http_client = http_client.into();

		Self {
			tokens: TokenAcquirer::new(config, Arc::clone(&http_client)),
			votes: VoteOrchestrator::new(config, http_client),
			credentials: config.credentials.clone(),
			payload: config.payload.clone(),
		}
	}

	/// Acquires a token, then exchanges it for a vote URL.
	///
	/// The first failure short-circuits: if the token hop fails the data endpoint is never
	/// called, and the failure is returned unchanged. Dropping the returned future aborts
	/// whichever hop is in flight.
	pub async fn initiate_vote(&self) -> Result<VoteResult> {
		tracing::debug!(stage = %VoteStage::TokenPending, "Requesting access token.");

		let token = self
			.tokens
			.acquire_token(&self.credentials)
			.await
			.inspect_err(|e| log_failure(VoteStage::TokenFailed, e))?;

		tracing::debug!(stage = %VoteStage::TokenAcquired, "Access token acquired.");
		tracing::debug!(stage = %VoteStage::VotePending, "Requesting vote URL.");

		let result = self
			.votes
			.request_vote_url(token, &self.payload)
			.await
			.inspect_err(|e| log_failure(VoteStage::VoteFailed, e))?;

		tracing::info!(stage = %VoteStage::VoteSucceeded, "Vote process completed.");

		Ok(result)
	}
}
impl VoteBroker<ReqwestHttpClient> {
	/// Creates a broker with its own reqwest transport bounded by the configured timeout.
	pub fn new(config: &Config) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(config.upstream_timeout)?;

		Ok(Self::with_http_client(config, http_client))
	}
}
impl<C> Debug for VoteBroker<C>
where
	C: UpstreamHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("VoteBroker")
			.field("tokens", &self.tokens)
			.field("votes", &self.votes)
			.field("client_id", &self.credentials.client_id)
			.field("payload", &self.payload)
			.finish()
	}
}

fn log_failure(stage: VoteStage, err: &Error) {
	tracing::error!(
		stage = %stage,
		hop = err.hop().map(|hop| hop.as_str()),
		kind = %err.kind(),
		upstream_status = err.upstream_status(),
		error = %display_chain(err),
		"Vote process failed."
	);
}
