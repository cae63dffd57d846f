//! # HTTP Handler
//!
//! Routes:
//! - `POST /api/genai`: solve a snapshot
//! - `GET /health`: liveness
//!
//! Every response body is an envelope: the success envelope with status 200,
//! or `{error, code}` with status 500. Clients tell failures apart by `code`.

use crate::error::{Error, ErrorKind, Result};
use crate::provider::VisionModel;
use crate::schema::{ErrorResponse, SolveRequest, SolveResponse, GENERIC_FAILURE};
use crate::solver::Solver;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const SOLVE_PATH: &str = "/api/genai";

/// Build the gateway router around a shared solver
pub fn router<M: VisionModel + 'static>(solver: Arc<Solver<M>>) -> Router {
    Router::new()
        .route(SOLVE_PATH, post(solve::<M>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(solver)
}

/// Serve until ctrl-c
pub async fn serve<M: VisionModel + 'static>(
    listener: tokio::net::TcpListener,
    solver: Arc<Solver<M>>,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, provider = solver.model().name(), model = solver.model().default_model(), "gateway listening");

    axum::serve(listener, router(solver))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::from(e).with_operation("handler::serve"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn solve<M: VisionModel + 'static>(
    State(solver): State<Arc<Solver<M>>>,
    payload: std::result::Result<Json<SolveRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(
                Error::invalid_input(rejection.body_text()).with_operation("handler::solve"),
            )
        }
    };

    match solver.solve(request).await {
        Ok(records) => {
            let data = solver.config().echo_mode.apply(records);
            (StatusCode::OK, Json(SolveResponse::success(data))).into_response()
        }
        Err(err) => error_response(err.with_operation("handler::solve")),
    }
}

/// Convert any failure into a 500 error envelope.
///
/// Invalid input keeps its message so the caller can see what was wrong;
/// anything else gets the generic message and is logged in full.
pub fn error_response(err: Error) -> Response {
    let message = match err.kind() {
        ErrorKind::InvalidInput => {
            tracing::warn!(error = %err, "rejected solve request");
            err.message().to_string()
        }
        _ => {
            tracing::error!(error = %err, "solve request failed");
            GENERIC_FAILURE.to_string()
        }
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message, err.code())),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_input_keeps_message() {
        let response = error_response(Error::invalid_input("request is missing an image payload"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "request is missing an image payload");
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_server_failures_are_generic() {
        let response = error_response(Error::parse_failed("reply was 'The answer is four.'"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], GENERIC_FAILURE);
        assert_eq!(body["code"], "PARSE_ERROR");
    }
}
