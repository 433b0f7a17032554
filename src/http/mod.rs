//! HTTP entry point.
//!
//! - `GET /health` - liveness and version
//! - `GET /handlers` - registered handlers
//! - `POST /dispatch` - dispatch one envelope, reply with a `DispatchResponse`

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, ErrorKind, Result};
use crate::transport::{DispatchEnvelope, DispatchResponse};

/// HTTP server state.
#[derive(Clone)]
pub struct HttpState {
    dispatcher: Dispatcher,
}

/// Build the application router.
pub fn router(dispatcher: Dispatcher, max_concurrent_requests: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/handlers", get(list_handlers))
        .route("/dispatch", post(dispatch))
        .layer(ConcurrencyLimitLayer::new(max_concurrent_requests))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(HttpState { dispatcher })
}

/// Start the HTTP server; returns after Ctrl-C.
pub async fn start_server(config: &Config, dispatcher: Dispatcher) -> Result<()> {
    let app = router(dispatcher, config.max_concurrent_requests);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down HTTP server");
        })
        .await
        .map_err(|e| Error::HttpServer(e.to_string()))?;

    Ok(())
}

/// Status code for a failed dispatch, based on the underlying error.
fn status_for(error: &Error) -> StatusCode {
    match error.root_cause().kind() {
        ErrorKind::InvalidQuery | ErrorKind::UnsupportedFormat | ErrorKind::InvalidArguments => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::UnknownHandler => StatusCode::NOT_FOUND,
        ErrorKind::ScanUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::HandlerFailure | ErrorKind::Cancelled | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// List handlers endpoint.
async fn list_handlers(State(state): State<HttpState>) -> impl IntoResponse {
    Json(state.dispatcher.handlers())
}

/// Dispatch endpoint.
async fn dispatch(
    State(state): State<HttpState>,
    payload: std::result::Result<Json<DispatchEnvelope>, JsonRejection>,
) -> impl IntoResponse {
    let envelope = match payload {
        Ok(Json(envelope)) => envelope,
        Err(rejection) => {
            let error = Error::InvalidArguments(rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(DispatchResponse::failure(None, &error)));
        }
    };

    let format = match envelope.format_kind() {
        Ok(format) => format,
        Err(e) => {
            return (status_for(&e), Json(DispatchResponse::failure(envelope.id, &e)));
        }
    };

    let (id, request) = envelope.into_request();
    match state.dispatcher.dispatch(request, format).await {
        Ok(output) => (StatusCode::OK, Json(DispatchResponse::success(id, output))),
        Err(e) => (status_for(&e), Json(DispatchResponse::failure(id, &e))),
    }
}
