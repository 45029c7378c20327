//! Purchase order routes.
//!
//! Submitting a draft order for review is the gated transition; the
//! approval gate bands on the order total, so only orders that land in a
//! configured amount band trigger a request.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::{error, info};
use uuid::Uuid;

use crate::routes::approval_rules::check_company_scope;
use crate::routes::quality_documents::{document_error_response, internal_error};
use crate::routes::trigger::{TriggerOutcome, blocked_response, run_activation_trigger};
use crate::{AppState, middleware::AuthUser};
use fabriq_core::approvals::ApprovalDocumentType;
use fabriq_db::CompanyScopeExt;
use fabriq_db::entities::purchase_orders::{self, Model as PurchaseOrderModel};
use fabriq_db::repositories::document::{
    DocumentRepository, DocumentStatus, PurchaseOrderStatus,
};

/// Creates the purchase order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/companies/{company_id}/purchase-orders",
            post(create_purchase_order),
        )
        .route(
            "/companies/{company_id}/purchase-orders/{order_id}",
            get(get_purchase_order),
        )
        .route(
            "/companies/{company_id}/purchase-orders/{order_id}/status",
            patch(update_status),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a purchase order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderRequest {
    /// Order reference, unique per company.
    pub reference: String,
    /// Order total as a decimal string.
    pub total_amount: String,
    /// ISO 4217 currency code; defaults to USD.
    pub currency_code: Option<String>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Target status: "draft", "toReview", "approved", or "rejected".
    pub status: String,
}

/// Response for a purchase order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderResponse {
    /// Order ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// Order reference.
    pub reference: String,
    /// Current status.
    pub status: String,
    /// Order total.
    pub total_amount: String,
    /// Currency code.
    pub currency_code: String,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/companies/{company_id}/purchase-orders` - Create a draft order.
async fn create_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:purchasing") {
        return response;
    }

    if payload.reference.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "reference_required",
                "message": "Reference is required"
            })),
        )
            .into_response();
    }

    let total_amount = match Decimal::from_str(&payload.total_amount) {
        Ok(amount) if amount >= Decimal::ZERO => amount,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_amount",
                    "message": "Total amount must be a non-negative decimal"
                })),
            )
                .into_response();
        }
    };

    let conn = match state.db.with_company(company_id).await {
        Ok(conn) => conn,
        Err(e) => {
            error!(error = %e, "Failed to open company-scoped connection");
            return internal_error();
        }
    };

    let now = Utc::now();
    let order = purchase_orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        reference: Set(payload.reference),
        status: Set(PurchaseOrderStatus::Draft.as_str().to_string()),
        total_amount: Set(total_amount),
        currency_code: Set(payload.currency_code.unwrap_or_else(|| "USD".to_string())),
        created_by: Set(auth.user_id()),
        created_at: Set(now.into()),
        updated_by: Set(None),
        updated_at: Set(now.into()),
    };

    let inserted = match order.insert(conn.transaction()).await {
        Ok(model) => model,
        Err(e) => {
            error!(error = %e, "Failed to create purchase order");
            return internal_error();
        }
    };

    if let Err(e) = conn.commit().await {
        error!(error = %e, "Failed to commit purchase order creation");
        return internal_error();
    }

    info!(order_id = %inserted.id, "Purchase order created");
    (StatusCode::CREATED, Json(order_to_response(inserted))).into_response()
}

/// GET `/companies/{company_id}/purchase-orders/{order_id}` - Get one.
async fn get_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, order_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "view:purchasing") {
        return response;
    }

    let conn = match state.db.with_company(company_id).await {
        Ok(conn) => conn,
        Err(e) => {
            error!(error = %e, "Failed to open company-scoped connection");
            return internal_error();
        }
    };

    let repo = DocumentRepository::new(&conn);
    match repo.get_purchase_order(company_id, order_id).await {
        Ok(order) => (StatusCode::OK, Json(order_to_response(order))).into_response(),
        Err(e) => document_error_response(&e),
    }
}

/// PATCH `/companies/{company_id}/purchase-orders/{order_id}/status` -
/// Change status; Draft→To Review runs the approval gate with the order
/// total as the banded amount.
async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, order_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:purchasing") {
        return response;
    }

    let Some(target) = DocumentStatus::parse(ApprovalDocumentType::PurchaseOrder, &payload.status)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_status",
                "message": format!("Invalid purchase order status: {}", payload.status)
            })),
        )
            .into_response();
    };

    let conn = match state.db.with_company(company_id).await {
        Ok(conn) => conn,
        Err(e) => {
            error!(error = %e, "Failed to open company-scoped connection");
            return internal_error();
        }
    };

    let repo = DocumentRepository::new(&conn);
    let document = match repo
        .get_gated(company_id, ApprovalDocumentType::PurchaseOrder, order_id)
        .await
    {
        Ok(document) => document,
        Err(e) => return document_error_response(&e),
    };

    // Only a draft entering review passes through the approval gate.
    if document.status.transition_is_gated(target) {
        match run_activation_trigger(&state, &auth, &document).await {
            Ok(TriggerOutcome::Proceed(_)) => {}
            Ok(TriggerOutcome::Blocked(request)) => {
                let _ = conn.rollback().await;
                return blocked_response(&request);
            }
            Err(response) => return response,
        }
    }

    if let Err(e) = repo
        .update_status(company_id, order_id, target, auth.user_id())
        .await
    {
        return document_error_response(&e);
    }

    if let Err(e) = conn.commit().await {
        error!(error = %e, "Failed to commit status update");
        return internal_error();
    }

    info!(order_id = %order_id, status = %target.as_str(), "Purchase order status updated");
    (
        StatusCode::OK,
        Json(json!({ "id": order_id, "status": target.as_str() })),
    )
        .into_response()
}

// ============================================================================
// Helper Functions
// ============================================================================

fn order_to_response(order: PurchaseOrderModel) -> PurchaseOrderResponse {
    PurchaseOrderResponse {
        id: order.id,
        company_id: order.company_id,
        reference: order.reference,
        status: order.status,
        total_amount: order.total_amount.to_string(),
        currency_code: order.currency_code,
        created_at: order.created_at.to_rfc3339(),
        updated_at: order.updated_at.to_rfc3339(),
    }
}
