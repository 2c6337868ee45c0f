//! Lookup quota and request logging.

use crate::error::ServiceError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, warn};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Cap on registry lookups per minute, shared by every caller.
///
/// Clones draw from the same budget.
#[derive(Clone)]
pub struct LookupQuota {
    limiter: Arc<DirectLimiter>,
    per_minute: NonZeroU32,
}

impl LookupQuota {
    pub fn per_minute(lookups: NonZeroU32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(lookups))),
            per_minute: lookups,
        }
    }

    /// Take one lookup from the budget. False once it is spent.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn limit(&self) -> NonZeroU32 {
        self.per_minute
    }
}

impl std::fmt::Debug for LookupQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupQuota")
            .field("per_minute", &self.per_minute)
            .finish_non_exhaustive()
    }
}

/// Rejects a lookup with 429 before it reaches the registry.
pub async fn enforce_lookup_quota(
    State(quota): State<LookupQuota>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if !quota.try_acquire() {
        warn!(limit = quota.limit().get(), "Lookup quota exhausted");
        return Err(ServiceError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Logs method, path, status and latency.
///
/// The query string is never logged; it carries the CPR number.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed = start.elapsed();

    if status.is_success() {
        debug!(%method, %path, %status, ?elapsed, "Request served");
    } else {
        warn!(%method, %path, %status, ?elapsed, "Request failed");
    }

    response
}
