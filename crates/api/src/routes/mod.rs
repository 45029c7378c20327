//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod approval_requests;
pub mod approval_rules;
pub mod groups;
pub mod health;
pub mod purchase_orders;
pub mod quality_documents;
pub mod trigger;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(approval_rules::routes())
        .merge(approval_requests::routes())
        .merge(quality_documents::routes())
        .merge(purchase_orders::routes())
        .merge(groups::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new().merge(health::routes()).merge(protected_routes)
}
