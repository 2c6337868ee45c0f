//! HTTP request handlers.

use super::types::{ChildResponse, HealthResponse, LookupQuery};
use super::AppState;
use crate::error::ServiceError;
use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Look up the minor children of the person given by `?cpr=`.
///
/// A missing parameter is treated like an invalid CPR number.
pub async fn cpr_lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Vec<ChildResponse>>, ServiceError> {
    let cpr = query.cpr.unwrap_or_default();

    let children = state
        .lookup
        .minor_children(&cpr, state.reference_date())
        .await?;

    debug!(count = children.len(), "Returning children");

    Ok(Json(children.into_iter().map(ChildResponse::from).collect()))
}
