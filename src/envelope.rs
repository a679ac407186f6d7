//! Response Envelope Builder: the single translation point from outcomes to wire responses.
//!
//! Every builder takes the instant to stamp explicitly, so given the same outcome and instant
//! the output is identical.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use time::{UtcOffset, macros::format_description};
// self
use crate::{
	_prelude::*,
	error::{ErrorKind, FailureEnvelope, INTERNAL_ERROR_MESSAGE},
	flows::VoteResult,
};

/// Confirmation message attached to a successful vote.
pub const VOTE_SUCCESS_MESSAGE: &str = "Vote process completed successfully";
/// Message attached to the health body.
pub const HEALTH_MESSAGE: &str = "Vote broker is running";
/// Message attached to unmatched routes.
pub const NOT_FOUND_MESSAGE: &str = "Endpoint not found";

/// Status code plus JSON body, ready to hand to the HTTP layer.
#[derive(Clone, Debug, PartialEq)]
pub struct WireResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// JSON body.
	pub body: WireBody,
}
impl IntoResponse for WireResponse {
	fn into_response(self) -> Response {
		(self.status, Json(self.body)).into_response()
	}
}

/// Every JSON body the service emits.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireBody {
	/// `GET /health`.
	Health(HealthBody),
	/// Successful vote.
	Success(SuccessBody),
	/// Any failure.
	Failure(FailureBody),
}

/// `{ status, message, timestamp }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthBody {
	/// Always `"OK"`.
	pub status: &'static str,
	/// Human-readable liveness message.
	pub message: String,
	/// ISO-8601 instant.
	pub timestamp: String,
}

/// `{ success: true, message, url, timestamp }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SuccessBody {
	/// Always `true`.
	pub success: bool,
	/// Confirmation message.
	pub message: String,
	/// Vote URL.
	pub url: String,
	/// ISO-8601 instant.
	pub timestamp: String,
}

/// `{ success: false, message, error?, timestamp }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailureBody {
	/// Always `false`.
	pub success: bool,
	/// Caller-facing message.
	pub message: String,
	/// Diagnostic detail; omitted for unmatched routes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<serde_json::Value>,
	/// ISO-8601 instant.
	pub timestamp: String,
}

/// Converts a vote outcome into its wire response.
pub fn build_response(outcome: Result<VoteResult>, now: OffsetDateTime) -> WireResponse {
	match outcome {
		Ok(result) => WireResponse {
			status: StatusCode::OK,
			body: WireBody::Success(SuccessBody {
				success: true,
				message: VOTE_SUCCESS_MESSAGE.into(),
				url: result.url,
				timestamp: format_timestamp(now),
			}),
		},
		Err(err) => build_failure(err.envelope(), now),
	}
}

/// Converts a classified failure into its wire response.
pub fn build_failure(envelope: FailureEnvelope, now: OffsetDateTime) -> WireResponse {
	WireResponse {
		status: status_for(&envelope),
		body: WireBody::Failure(FailureBody {
			success: false,
			message: envelope.message,
			error: envelope.detail,
			timestamp: format_timestamp(now),
		}),
	}
}

/// Maps a failure to its HTTP status.
///
/// Upstream rejections forward the upstream status; a status that cannot describe a failure
/// (missing, or below 300) falls back to 500 like every other kind.
pub fn status_for(envelope: &FailureEnvelope) -> StatusCode {
	match envelope.kind {
		ErrorKind::UpstreamRejected => envelope
			.upstream_status
			.filter(|status| *status >= 300)
			.and_then(|status| StatusCode::from_u16(status).ok())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
		ErrorKind::NetworkError | ErrorKind::UpstreamContractError | ErrorKind::InternalError =>
			StatusCode::INTERNAL_SERVER_ERROR,
	}
}

/// Liveness response; never touches an upstream.
pub fn health(now: OffsetDateTime) -> WireResponse {
	WireResponse {
		status: StatusCode::OK,
		body: WireBody::Health(HealthBody {
			status: "OK",
			message: HEALTH_MESSAGE.into(),
			timestamp: format_timestamp(now),
		}),
	}
}

/// Response for unmatched routes.
pub fn not_found(now: OffsetDateTime) -> WireResponse {
	WireResponse {
		status: StatusCode::NOT_FOUND,
		body: WireBody::Failure(FailureBody {
			success: false,
			message: NOT_FOUND_MESSAGE.into(),
			error: None,
			timestamp: format_timestamp(now),
		}),
	}
}

/// Response for faults raised outside the vote flow (e.g. a handler panic).
pub fn internal_fault(message: impl Into<String>, now: OffsetDateTime) -> WireResponse {
	WireResponse {
		status: StatusCode::INTERNAL_SERVER_ERROR,
		body: WireBody::Failure(FailureBody {
			success: false,
			message: INTERNAL_ERROR_MESSAGE.into(),
			error: Some(serde_json::Value::String(message.into())),
			timestamp: format_timestamp(now),
		}),
	}
}

/// Renders `at` in UTC as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_timestamp(at: OffsetDateTime) -> String {
	let utc = at.to_offset(UtcOffset::UTC);

	utc.format(format_description!(
		"[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
	))
	.unwrap_or_else(|_| utc.to_string())
}
