//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Mapping of domain errors to JSON responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use comptrack_core::commission::CommissionCalculator;
use comptrack_core::workflow::ApprovalPolicy;
use comptrack_shared::{CommissionConfig, JwtService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Commission rounding and approval settings.
    pub commission: CommissionConfig,
}

impl AppState {
    /// Calculator configured with the commission rounding scale.
    #[must_use]
    pub const fn calculator(&self) -> CommissionCalculator {
        CommissionCalculator::new(self.commission.scale)
    }

    /// Approval policy from configuration.
    #[must_use]
    pub const fn policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::new(self.commission.allow_self_approval)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
