//! Rate limiting configuration for the public signup endpoints.
//!
//! Rate limits are applied per-IP address. Both signup routes call
//! external APIs (Stripe, the auth provider), so they sit in the
//! strict/standard tiers; /health is unlimited.
//!
//! Configure via environment variables:
//! - RATE_LIMIT_STRICT_RPM (default: 10) - /signup/checkout
//! - RATE_LIMIT_STANDARD_RPM (default: 30) - /signup/verify-payment

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::{GovernorError, GovernorLayer};

/// Rate limiter layer type alias using governor types directly
pub type RateLimitLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Creates a rate limiter layer with the specified requests per minute.
fn create_layer(requests_per_minute: u32) -> RateLimitLayer {
    assert!(requests_per_minute > 0, "Rate limit must be greater than 0");

    let period_secs = 60 / requests_per_minute as u64;
    let config = GovernorConfigBuilder::default()
        .period(Duration::from_secs(period_secs.max(1)))
        .burst_size(requests_per_minute)
        .finish()
        .expect("Failed to build rate limiter config");

    GovernorLayer::new(Arc::new(config)).error_handler(|e| match e {
            GovernorError::TooManyRequests { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "Too many requests" })),
            )
                .into_response(),
            GovernorError::UnableToExtractKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
            GovernorError::Other { code, .. } => {
                (code, Json(json!({ "error": "Internal server error" }))).into_response()
            }
        })
}

/// Strict tier: endpoints that create resources at external APIs.
pub fn strict_layer(requests_per_minute: u32) -> RateLimitLayer {
    create_layer(requests_per_minute)
}

/// Standard tier: endpoints doing lookups plus DB work.
pub fn standard_layer(requests_per_minute: u32) -> RateLimitLayer {
    create_layer(requests_per_minute)
}
