// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge HTTP server — the one channel a worker subprocess has back to the
//! orchestrator: `POST /v1/report`, `POST /v1/message`, `GET /v1/inbox`
//! (spec §4.4).

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{header, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use orch_wire::{ErrorBody, InboxQuery, MessageRequest, ReportRequest};

use crate::service::OrchestratorService;

/// Request bodies larger than this are rejected with 413 before they reach
/// a handler (spec §4.4 "oversized payloads").
const MAX_BODY_BYTES: usize = 1_000_000;

#[derive(Clone)]
struct AppState {
    service: Arc<OrchestratorService>,
}

/// Build the Bridge router, wired to `service` and protected by
/// `Authorization: Bearer <token>`.
pub fn router(service: Arc<OrchestratorService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/v1/report", post(report_handler))
        .route("/v1/message", post(message_handler))
        .route("/v1/inbox", get(inbox_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer_token))
        .layer(middleware::from_fn(normalize_errors))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn require_bearer_token(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let expected = state.service.bridge_token();
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false);

    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(ErrorBody::unauthorized())).into_response();
    }
    next.run(req).await
}

/// Axum's built-in 404/405/413 responses carry a plain-text body; rewrite
/// them to the bridge's `{"error": "<kind>"}` shape.
async fn normalize_errors(req: Request<Body>, next: Next) -> Response {
    let resp = next.run(req).await;
    let body = match resp.status() {
        StatusCode::NOT_FOUND => Some(ErrorBody::not_found()),
        StatusCode::METHOD_NOT_ALLOWED => Some(ErrorBody::method_not_allowed()),
        StatusCode::PAYLOAD_TOO_LARGE => Some(ErrorBody { error: "payload_too_large".to_string() }),
        _ => None,
    };
    match body {
        Some(body) => (resp.status(), Json(body)).into_response(),
        None => resp,
    }
}

async fn report_handler(State(state): State<AppState>, Json(req): Json<ReportRequest>) -> impl IntoResponse {
    if req.worker_id.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorBody::missing_field("workerId"))).into_response();
    }
    (StatusCode::OK, Json(state.service.handle_report(req))).into_response()
}

async fn message_handler(State(state): State<AppState>, Json(req): Json<MessageRequest>) -> impl IntoResponse {
    if req.from.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorBody::missing_field("from"))).into_response();
    }
    if req.to.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorBody::missing_field("to"))).into_response();
    }
    (StatusCode::OK, Json(state.service.handle_message(req))).into_response()
}

async fn inbox_handler(State(state): State<AppState>, Query(query): Query<InboxQuery>) -> impl IntoResponse {
    if query.to.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ErrorBody::missing_field("to"))).into_response();
    }
    (StatusCode::OK, Json(state.service.handle_inbox(query))).into_response()
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
