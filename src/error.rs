//! Broker-level error taxonomy shared by the hops, the sequencer, and the envelope builder.

// self
use crate::{_prelude::*, obs::Hop};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message reported when an upstream rejection carries no usable text.
pub const UNKNOWN_API_ERROR: &str = "Unknown API error";
/// Message reported when an upstream could not be reached.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error - unable to reach external services";
/// Message reported when an upstream answered with an unusable body.
pub const CONTRACT_ERROR_MESSAGE: &str = "Upstream response is missing required data";
/// Message reported for faults that are not attributable to an upstream.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No response was received from an upstream (DNS, TCP, TLS, timeout).
	#[error("The {hop} call could not reach the upstream service.")]
	Network {
		/// Hop that failed.
		hop: Hop,
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// An upstream answered with a non-success status.
	#[error("The {hop} call was rejected with HTTP {status}.")]
	UpstreamRejected {
		/// Hop that failed.
		hop: Hop,
		/// Status code returned by the upstream.
		status: u16,
		/// Upstream body, forwarded verbatim (JSON when parseable, otherwise a JSON string).
		body: serde_json::Value,
	},
	/// An upstream answered successfully but its body lacked the required field.
	#[error("The {hop} response violated the upstream contract.")]
	UpstreamContract {
		/// Hop that failed.
		hop: Hop,
		/// Decoding failure.
		#[source]
		source: ContractError,
	},
	/// Fault not attributable to an upstream call.
	#[error("Internal fault: {message}.")]
	Internal {
		/// Diagnostic message.
		message: String,
	},
}
impl Error {
	/// Builds an [`Error::Internal`] from any displayable fault.
	pub fn internal(message: impl Display) -> Self {
		Self::Internal { message: message.to_string() }
	}

	/// Returns the taxonomy bucket for this failure.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Network { .. } => ErrorKind::NetworkError,
			Self::UpstreamRejected { .. } => ErrorKind::UpstreamRejected,
			Self::UpstreamContract { .. } => ErrorKind::UpstreamContractError,
			Self::Internal { .. } => ErrorKind::InternalError,
		}
	}

	/// Returns the hop that failed, when the failure came from an upstream call.
	pub fn hop(&self) -> Option<Hop> {
		match self {
			Self::Network { hop, .. }
			| Self::UpstreamRejected { hop, .. }
			| Self::UpstreamContract { hop, .. } => Some(*hop),
			Self::Internal { .. } => None,
		}
	}

	/// Returns the upstream status code, when one was received.
	pub fn upstream_status(&self) -> Option<u16> {
		match self {
			Self::UpstreamRejected { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Converts the failure into its uniform [`FailureEnvelope`].
	pub fn envelope(&self) -> FailureEnvelope {
		FailureEnvelope::from(self)
	}
}

/// Taxonomy of non-success outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	/// No response from an external call.
	NetworkError,
	/// External call returned a non-success status.
	UpstreamRejected,
	/// External call succeeded but the response shape lacked the required field.
	UpstreamContractError,
	/// Any fault not attributable to an external call.
	InternalError,
}
impl ErrorKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::NetworkError => "NetworkError",
			ErrorKind::UpstreamRejected => "UpstreamRejected",
			ErrorKind::UpstreamContractError => "UpstreamContractError",
			ErrorKind::InternalError => "InternalError",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Uniform shape for every non-success outcome.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailureEnvelope {
	/// Taxonomy bucket.
	pub kind: ErrorKind,
	/// Human-readable message for the caller.
	pub message: String,
	/// Diagnostic payload echoed to the caller.
	pub detail: Option<serde_json::Value>,
	/// Status returned by the upstream for [`ErrorKind::UpstreamRejected`].
	pub upstream_status: Option<u16>,
}
impl From<&Error> for FailureEnvelope {
	fn from(err: &Error) -> Self {
		let kind = err.kind();
		let upstream_status = err.upstream_status();
		let (message, detail) = match err {
			Error::Network { source, .. } =>
				(NETWORK_ERROR_MESSAGE.to_owned(), Some(display_chain(source).into())),
			Error::UpstreamRejected { body, .. } => (rejection_message(body), Some(body.clone())),
			Error::UpstreamContract { source, .. } =>
				(CONTRACT_ERROR_MESSAGE.to_owned(), Some(source.to_string().into())),
			Error::Internal { message } =>
				(INTERNAL_ERROR_MESSAGE.to_owned(), Some(message.clone().into())),
		};

		Self { kind, message, detail, upstream_status }
	}
}

/// Renders an error and its sources as `outer: inner: root`.
pub fn display_chain(err: &dyn StdError) -> String {
	let mut rendered = err.to_string();
	let mut current = err.source();

	while let Some(source) = current {
		let message = source.to_string();

		if !rendered.ends_with(&message) {
			rendered.push_str(": ");
			rendered.push_str(&message);
		}

		current = source.source();
	}

	rendered
}

/// Picks the caller-facing message out of an upstream rejection body.
///
/// Prefers the upstream's `error` string, then its `message` string. Anything else, including a
/// non-JSON body, yields [`UNKNOWN_API_ERROR`]; the raw body still travels as the detail.
pub fn rejection_message(body: &serde_json::Value) -> String {
	["error", "message"]
		.into_iter()
		.find_map(|field| body.get(field).and_then(serde_json::Value::as_str))
		.map(str::trim)
		.filter(|message| !message.is_empty())
		.unwrap_or(UNKNOWN_API_ERROR)
		.to_owned()
}

/// Configuration and validation failures raised at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Required variable is unset or blank.
	#[error("Environment variable `{key}` is required.")]
	Missing {
		/// Variable name.
		key: &'static str,
	},
	/// Endpoint variable does not hold a valid URL.
	#[error("Environment variable `{key}` is not a valid URL.")]
	InvalidUrl {
		/// Variable name.
		key: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint URL uses a scheme other than http/https.
	#[error("Environment variable `{key}` must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Variable name.
		key: &'static str,
		/// Offending scheme.
		scheme: String,
	},
	/// Numeric variable could not be parsed.
	#[error("Environment variable `{key}` must be a number.")]
	InvalidNumber {
		/// Variable name.
		key: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: std::num::ParseIntError,
	},
	/// Upstream timeout is zero.
	#[error("Environment variable `UPSTREAM_TIMEOUT_MS` must be positive.")]
	NonPositiveTimeout,
	/// Vote email is malformed.
	#[error("Vote email `{0}` is not a valid address.")]
	InvalidEmail(String),
	/// Listen address could not be parsed.
	#[error("Listen address `{0}` is invalid.")]
	InvalidListenAddr(String),
	/// `.env` file exists but could not be read or parsed.
	#[error("Environment file could not be loaded.")]
	Dotenv {
		/// Underlying loader failure.
		#[source]
		source: dotenvy::Error,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, deadline).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Transport failure")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The hop did not complete before its deadline.
	#[error("Request timed out after {}ms.", after.as_millis())]
	Timeout {
		/// Deadline that elapsed.
		after: Duration,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Reasons an upstream success body is unusable.
#[derive(Debug, ThisError)]
pub enum ContractError {
	/// Body is not JSON or does not have the expected shape.
	#[error("{0}")]
	Shape(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Required field is present but empty.
	#[error("{path}: field is empty")]
	EmptyField {
		/// Dotted path of the offending field.
		path: &'static str,
	},
}
