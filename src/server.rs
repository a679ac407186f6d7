//! Inbound HTTP surface: `GET /health`, `POST /vote`, and the 404/500 envelopes.

// std
use std::any::Any;
// crates.io
use axum::{
	Router,
	extract::State,
	http::{
		HeaderValue, Method,
		header::{AUTHORIZATION, CONTENT_TYPE},
	},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
	catch_panic::CatchPanicLayer,
	cors::{Any as AnyOrigin, CorsLayer},
	trace::TraceLayer,
};
// self
use crate::{
	_prelude::*,
	config::CorsOrigins,
	envelope::{self, WireResponse},
	flows::VoteBroker,
	http::UpstreamHttpClient,
};

/// Routes plus panic recovery, without transport-level layers.
///
/// Unmatched paths and unmatched methods on known paths both answer with the 404 envelope.
pub fn router<C>(broker: Arc<VoteBroker<C>>) -> Router
where
	C: UpstreamHttpClient,
{
	Router::new()
		.route("/health", get(health))
		.route("/vote", post(vote::<C>))
		.fallback(not_found)
		.method_not_allowed_fallback(not_found)
		.layer(CatchPanicLayer::custom(panic_response))
		.with_state(broker)
}

/// Full application: [`router`] wrapped in request tracing and CORS.
pub fn app<C>(broker: Arc<VoteBroker<C>>, cors: &CorsOrigins) -> Router
where
	C: UpstreamHttpClient,
{
	router(broker).layer(TraceLayer::new_for_http()).layer(cors_layer(cors))
}

/// Serves `app` on `listener` until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await
}

/// Builds the CORS layer for the configured allow-list.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
	let cors = CorsLayer::new()
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([CONTENT_TYPE, AUTHORIZATION]);

	match origins {
		CorsOrigins::Any => cors.allow_origin(AnyOrigin),
		CorsOrigins::List(list) => {
			let origins = list
				.iter()
				.filter_map(|origin| match HeaderValue::from_str(origin) {
					Ok(value) => Some(value),
					Err(_) => {
						tracing::warn!(origin = %origin, "Ignoring invalid CORS origin.");

						None
					},
				})
				.collect::<Vec<_>>();

			cors.allow_origin(origins)
		},
	}
}

async fn health() -> WireResponse {
	envelope::health(OffsetDateTime::now_utc())
}

async fn vote<C>(State(broker): State<Arc<VoteBroker<C>>>) -> WireResponse
where
	C: UpstreamHttpClient,
{
	let outcome = broker.initiate_vote().await;

	envelope::build_response(outcome, OffsetDateTime::now_utc())
}

async fn not_found() -> WireResponse {
	envelope::not_found(OffsetDateTime::now_utc())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
	let message = if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else if let Some(message) = panic.downcast_ref::<&str>() {
		(*message).to_owned()
	} else {
		"Handler panicked".to_owned()
	};

	tracing::error!(panic = %message, "Unhandled fault while serving request.");

	envelope::internal_fault(message, OffsetDateTime::now_utc()).into_response()
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::warn!(error = %e, "Failed to listen for Ctrl-C.");
			std::future::pending::<()>().await;
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			},
			Err(e) => {
				tracing::warn!(error = %e, "Failed to listen for SIGTERM.");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}

	tracing::info!("Shutdown signal received, draining connections.");
}
