//! Root and connectivity check handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bookshelf_persistence::Database;
use serde_json::json;
use tracing::{debug, warn};

use crate::state::AppState;

/// `GET [base]/`
pub async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "I am root" }))
}

/// Reports connectivity of every storage tier.
///
/// # HTTP Request
///
/// `GET [base]/ping`
///
/// # Response
///
/// - `200 OK` - the primary tier is reachable
/// - `503 Service Unavailable` - the primary tier is unreachable
///
/// The body carries the full status report in both cases. A check never
/// fails the request itself.
pub async fn ping_handler<S>(State(state): State<AppState<S>>) -> Response
where
    S: Database + 'static,
{
    debug!("Processing ping request");

    let report = state.storage().status(&state.op_context()).await;
    let status = if report.overall_ok {
        StatusCode::OK
    } else {
        warn!(report = %report, "Primary storage tier is unreachable");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(json!({ "data": report }))).into_response()
}
