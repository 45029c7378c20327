//! Approval request routes.
//!
//! Inbox listing, decisions, and cancellation. Creation is not exposed
//! here: requests are created by the document status triggers in
//! `quality_documents` and `purchase_orders`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::approval_rules::check_company_scope};
use fabriq_core::approvals::{ApprovalDecision, ApprovalDocumentType, ApprovalError, ApprovalStatus};
use fabriq_db::entities::approval_requests::Model as ApprovalRequestModel;
use fabriq_db::repositories::approval_request::{ApprovalRequestRepository, RequestFilter};
use fabriq_shared::notify::{NotificationEvent, NotifyPayload, NotifyRecipient};
use fabriq_shared::NotificationClient;

/// Creates the approval requests routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/companies/{company_id}/approval-requests",
            get(list_approval_requests),
        )
        .route(
            "/companies/{company_id}/approval-requests/{request_id}",
            get(get_approval_request),
        )
        .route(
            "/companies/{company_id}/approval-requests/{request_id}/decision",
            post(decide_approval_request),
        )
        .route(
            "/companies/{company_id}/approval-requests/{request_id}/cancel",
            post(cancel_approval_request),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing approval requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsQuery {
    /// Restrict to one document type.
    pub document_type: Option<String>,
    /// Restrict to one status.
    pub status: Option<String>,
    /// Requests created at or after this instant.
    pub date_from: Option<DateTime<Utc>>,
    /// Requests created before this instant.
    pub date_to: Option<DateTime<Utc>>,
}

/// Request body for a decision.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// "approved" or "rejected".
    pub decision: String,
    /// Optional notes from the decider.
    pub notes: Option<String>,
}

/// Response for an approval request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequestResponse {
    /// Request ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// Document type.
    pub document_type: String,
    /// The gated document.
    pub document_id: Uuid,
    /// Current status.
    pub status: String,
    /// The user whose status change triggered the request.
    pub requested_by: Uuid,
    /// Snapshot of approver groups at trigger time.
    pub approver_group_ids: Vec<Uuid>,
    /// Snapshot of the single-user fallback.
    pub approver_id: Option<Uuid>,
    /// Decision notes.
    pub decision_notes: Option<String>,
    /// When the decision was made.
    pub decided_at: Option<String>,
    /// Who decided.
    pub decided_by: Option<Uuid>,
    /// Created at timestamp.
    pub created_at: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/companies/{company_id}/approval-requests` - List with filters.
async fn list_approval_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
    Query(query): Query<ListRequestsQuery>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "view:approvals") {
        return response;
    }

    let filter = match build_filter(&query) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let repo = ApprovalRequestRepository::new(&state.service_role);

    match repo.list(company_id, &filter).await {
        Ok(requests) => {
            let items: Vec<ApprovalRequestResponse> =
                requests.into_iter().map(request_to_response).collect();

            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list approval requests");
            approval_error_response(&e)
        }
    }
}

/// GET `/companies/{company_id}/approval-requests/{request_id}` - Get one.
async fn get_approval_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, request_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "view:approvals") {
        return response;
    }

    let repo = ApprovalRequestRepository::new(&state.service_role);

    match repo.get_request(company_id, request_id).await {
        Ok(request) => (StatusCode::OK, Json(request_to_response(request))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get approval request");
            approval_error_response(&e)
        }
    }
}

/// POST `/companies/{company_id}/approval-requests/{request_id}/decision` -
/// Approve or reject a pending request.
async fn decide_approval_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, request_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DecisionRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:approvals") {
        return response;
    }

    let Some(decision) = ApprovalDecision::parse(&payload.decision) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_decision",
                "message": "Decision must be 'approved' or 'rejected'"
            })),
        )
            .into_response();
    };

    let repo = ApprovalRequestRepository::new(&state.service_role);

    match repo
        .decide(company_id, request_id, decision, auth.user_id(), payload.notes)
        .await
    {
        Ok(request) => {
            // The requester learns the outcome; delivery is best-effort.
            dispatch_notification(
                &state.notifier,
                NotifyPayload {
                    event: NotificationEvent::ApprovalDecided,
                    company_id,
                    document_id: request.id,
                    recipient: NotifyRecipient::User {
                        user_id: request.requested_by,
                    },
                    from: auth.user_id(),
                },
            );

            (StatusCode::OK, Json(request_to_response(request))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to decide approval request");
            approval_error_response(&e)
        }
    }
}

/// POST `/companies/{company_id}/approval-requests/{request_id}/cancel` -
/// Withdraw a pending request.
async fn cancel_approval_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, request_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:approvals") {
        return response;
    }

    let repo = ApprovalRequestRepository::new(&state.service_role);

    match repo.cancel(company_id, request_id, auth.user_id()).await {
        Ok(request) => {
            info!(request_id = %request_id, "Approval request cancelled");
            (StatusCode::OK, Json(request_to_response(request))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to cancel approval request");
            approval_error_response(&e)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Posts a notification without tying the handler's fate to delivery.
pub(crate) fn dispatch_notification(notifier: &Arc<NotificationClient>, payload: NotifyPayload) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&payload).await {
            error!(error = %e, event = ?payload.event, "Notification dispatch failed");
        }
    });
}

#[allow(clippy::result_large_err)]
fn build_filter(query: &ListRequestsQuery) -> Result<RequestFilter, axum::response::Response> {
    let document_type = match query.document_type.as_deref() {
        Some(s) => Some(ApprovalDocumentType::parse(s).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_document_type",
                    "message": format!("Invalid document type: {s}")
                })),
            )
                .into_response()
        })?),
        None => None,
    };

    let status = match query.status.as_deref() {
        Some(s) => Some(ApprovalStatus::parse(s).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_status",
                    "message": format!("Invalid status: {s}")
                })),
            )
                .into_response()
        })?),
        None => None,
    };

    Ok(RequestFilter {
        document_type,
        status,
        date_from: query.date_from,
        date_to: query.date_to,
    })
}

pub(crate) fn request_to_response(request: ApprovalRequestModel) -> ApprovalRequestResponse {
    ApprovalRequestResponse {
        id: request.id,
        company_id: request.company_id,
        document_type: request.document_type,
        document_id: request.document_id,
        status: request.status,
        requested_by: request.requested_by,
        approver_group_ids: request.approver_group_ids,
        approver_id: request.approver_id,
        decision_notes: request.decision_notes,
        decided_at: request.decided_at.map(|t| t.to_rfc3339()),
        decided_by: request.decided_by,
        created_at: request.created_at.to_rfc3339(),
    }
}

pub(crate) fn approval_error_response(e: &ApprovalError) -> axum::response::Response {
    match e {
        ApprovalError::RequestNotFound(_) | ApprovalError::RuleNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": e.to_string()
            })),
        )
            .into_response(),
        ApprovalError::IllegalTransition { from, to } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "illegal_transition",
                "message": format!("Cannot move request from {from} to {to}")
            })),
        )
            .into_response(),
        ApprovalError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": msg
            })),
        )
            .into_response(),
        ApprovalError::InvalidAmountRange { .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount_range",
                "message": e.to_string()
            })),
        )
            .into_response(),
        ApprovalError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}
