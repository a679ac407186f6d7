// crates.io
use tracing::instrument::Instrumented;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::{_prelude::*, obs::Hop};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "vote_broker=info,tower_http=info";

/// A span builder used by the vote hops.
#[derive(Clone, Debug)]
pub struct HopSpan {
	span: tracing::Span,
}
impl HopSpan {
	/// Creates a new span tagged with the provided hop + stage.
	pub fn new(hop: Hop, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("vote_broker.hop", hop = hop.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

/// Installs the global `fmt` subscriber honoring `RUST_LOG`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing() -> bool {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer())
		.try_init()
		.is_ok()
}
