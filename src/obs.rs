//! Observability helpers for the vote hops.
//!
//! # Feature Flags
//!
//! - Spans named `vote_broker.hop` carry the `hop` (token/vote) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `vote_broker_hop_total` counter for every
//!   attempt/success/failure, labeled by `hop` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outbound calls performed while initiating a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hop {
	/// Client credentials exchanged for a bearer token.
	Token,
	/// Bearer token exchanged for a single-use vote URL.
	Vote,
}
impl Hop {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Hop::Token => "token",
			Hop::Vote => "vote",
		}
	}
}
impl Display for Hop {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each hop attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HopOutcome {
	/// Entry to a hop.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl HopOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			HopOutcome::Attempt => "attempt",
			HopOutcome::Success => "success",
			HopOutcome::Failure => "failure",
		}
	}
}
impl Display for HopOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// States of one vote traversal.
///
/// `TokenFailed` and `VoteFailed` are terminal failures; `VoteSucceeded` is the only success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteStage {
	/// Traversal created.
	Start,
	/// Token hop in flight.
	TokenPending,
	/// Token hop produced a bearer token.
	TokenAcquired,
	/// Token hop failed.
	TokenFailed,
	/// Vote hop in flight.
	VotePending,
	/// Vote hop produced a URL.
	VoteSucceeded,
	/// Vote hop failed.
	VoteFailed,
}
impl VoteStage {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			VoteStage::Start => "start",
			VoteStage::TokenPending => "token_pending",
			VoteStage::TokenAcquired => "token_acquired",
			VoteStage::TokenFailed => "token_failed",
			VoteStage::VotePending => "vote_pending",
			VoteStage::VoteSucceeded => "vote_succeeded",
			VoteStage::VoteFailed => "vote_failed",
		}
	}

	/// Whether the traversal ends in this stage.
	pub const fn is_terminal(self) -> bool {
		matches!(self, VoteStage::TokenFailed | VoteStage::VoteSucceeded | VoteStage::VoteFailed)
	}
}
impl Display for VoteStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn only_outcome_stages_are_terminal() {
		let terminal = [
			VoteStage::Start,
			VoteStage::TokenPending,
			VoteStage::TokenAcquired,
			VoteStage::TokenFailed,
			VoteStage::VotePending,
			VoteStage::VoteSucceeded,
			VoteStage::VoteFailed,
		]
		.into_iter()
		.filter(|stage| stage.is_terminal())
		.map(VoteStage::as_str)
		.collect::<Vec<_>>();

		assert_eq!(terminal, ["token_failed", "vote_succeeded", "vote_failed"]);
	}
}
