//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for approval rules, requests, and gated documents
//! - Authentication middleware
//! - Request extractors

pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use fabriq_db::ServiceRoleHandle;
use fabriq_shared::{JwtService, NotificationClient};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Caller-scoped connection pool; per-request company RLS context is
    /// set on top of it.
    pub db: Arc<DatabaseConnection>,
    /// Elevated handle the approval stores run under.
    pub service_role: ServiceRoleHandle,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Notification webhook client.
    pub notifier: Arc<NotificationClient>,
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
