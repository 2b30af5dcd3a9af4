//! Rate limiting middleware using token bucket algorithm
//!
//! Applied to the model-backed routes only; every call through them costs
//! provider quota.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use docintel_common::{config::RateLimitConfig, errors::AppError};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Limiter plus the configured rate, for error reporting
#[derive(Clone)]
pub struct ModelRateLimit {
    limiter: Arc<GlobalRateLimiter>,
    requests_per_second: u32,
}

impl ModelRateLimit {
    /// Build from configuration; zero rates are rejected
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, AppError> {
        let per_second = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| AppError::configuration("rate_limit.requests_per_second must be positive"))?;
        let burst = NonZeroU32::new(config.burst)
            .ok_or_else(|| AppError::configuration("rate_limit.burst must be positive"))?;

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst))),
            requests_per_second: config.requests_per_second,
        })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limit): State<ModelRateLimit>,
    request: Request,
    next: Next,
) -> Response {
    match limit.limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            AppError::RateLimited {
                limit: limit.requests_per_second,
            }
            .into_response()
        }
    }
}
