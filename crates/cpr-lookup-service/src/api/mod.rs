//! HTTP API for the lookup service.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{enforce_lookup_quota, logging_middleware, LookupQuota};
pub use types::*;

use axum::{
    extract::Request, middleware as axum_middleware, routing::get, Router,
};
use chrono::{Local, NaiveDate};
use cpr_client::FamilyLookup;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info_span;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Registry lookup, shared read-only across requests
    pub lookup: Arc<FamilyLookup>,
    /// Fixed date to compute ages against; today when unset
    pub fixed_date: Option<NaiveDate>,
}

impl AppState {
    /// Create new application state.
    pub fn new(lookup: FamilyLookup) -> Self {
        Self {
            lookup: Arc::new(lookup),
            fixed_date: None,
        }
    }

    /// Compute ages against `date` instead of the current date.
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.fixed_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Create the API router.
///
/// With a quota, lookups beyond it get 429. Health checks are never limited.
pub fn create_router(state: AppState, quota: Option<LookupQuota>) -> Router {
    let mut lookup_routes = Router::new().route("/api/CPRLookup", get(handlers::cpr_lookup));

    if let Some(quota) = quota {
        lookup_routes = lookup_routes.layer(axum_middleware::from_fn_with_state(
            quota,
            enforce_lookup_quota,
        ));
    }

    Router::new()
        .route("/health", get(handlers::health))
        .merge(lookup_routes)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(
            // Default spans record the full URI, which includes the CPR number
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .with_state(state)
}
