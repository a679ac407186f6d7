// self
use crate::obs::{Hop, HopOutcome};

/// Records a hop outcome via the global metrics recorder (when enabled).
pub fn record_hop_outcome(hop: Hop, outcome: HopOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"vote_broker_hop_total",
			"hop" => hop.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (hop, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_hop_outcome_noop_without_metrics() {
		record_hop_outcome(Hop::Vote, HopOutcome::Failure);
	}
}
