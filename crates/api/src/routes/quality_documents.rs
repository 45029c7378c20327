//! Quality document routes.
//!
//! Draft→Active is the gated transition: the activation trigger runs the
//! approval gate before the status write, and a blocking rule can hold
//! activation until the request is approved.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::routes::approval_rules::check_company_scope;
use crate::routes::trigger::{TriggerOutcome, blocked_response, run_activation_trigger};
use crate::{AppState, middleware::AuthUser};
use fabriq_core::approvals::ApprovalDocumentType;
use fabriq_db::CompanyScopeExt;
use fabriq_db::entities::quality_documents::{self, Model as QualityDocumentModel};
use fabriq_db::repositories::document::{
    DocumentError, DocumentRepository, DocumentStatus, QualityDocumentStatus,
};

/// Creates the quality document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/companies/{company_id}/quality-documents",
            post(create_quality_document),
        )
        .route(
            "/companies/{company_id}/quality-documents/{document_id}",
            get(get_quality_document),
        )
        .route(
            "/companies/{company_id}/quality-documents/{document_id}/status",
            patch(update_status),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a quality document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQualityDocumentRequest {
    /// Document name.
    pub name: String,
    /// Optional content body.
    pub content: Option<String>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Target status: "draft", "active", or "archived".
    pub status: String,
}

/// Response for a quality document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityDocumentResponse {
    /// Document ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// Document name.
    pub name: String,
    /// Current status.
    pub status: String,
    /// Document version.
    pub version: i32,
    /// Content body.
    pub content: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/companies/{company_id}/quality-documents` - Create a draft.
async fn create_quality_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CreateQualityDocumentRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:quality") {
        return response;
    }

    if payload.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "name_required",
                "message": "Name is required"
            })),
        )
            .into_response();
    }

    let conn = match state.db.with_company(company_id).await {
        Ok(conn) => conn,
        Err(e) => {
            error!(error = %e, "Failed to open company-scoped connection");
            return internal_error();
        }
    };

    let now = Utc::now();
    let document = quality_documents::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(company_id),
        name: Set(payload.name),
        status: Set(QualityDocumentStatus::Draft.as_str().to_string()),
        version: Set(1),
        content: Set(payload.content),
        created_by: Set(auth.user_id()),
        created_at: Set(now.into()),
        updated_by: Set(None),
        updated_at: Set(now.into()),
    };

    let inserted = match document.insert(conn.transaction()).await {
        Ok(model) => model,
        Err(e) => {
            error!(error = %e, "Failed to create quality document");
            return internal_error();
        }
    };

    if let Err(e) = conn.commit().await {
        error!(error = %e, "Failed to commit quality document creation");
        return internal_error();
    }

    info!(document_id = %inserted.id, "Quality document created");
    (StatusCode::CREATED, Json(document_to_response(inserted))).into_response()
}

/// GET `/companies/{company_id}/quality-documents/{document_id}` - Get one.
async fn get_quality_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, document_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "view:quality") {
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
    match repo.get_quality_document(company_id, document_id).await {
        Ok(document) => (StatusCode::OK, Json(document_to_response(document))).into_response(),
        Err(e) => document_error_response(&e),
    }
}

/// PATCH `/companies/{company_id}/quality-documents/{document_id}/status` -
/// Change status; Draft→Active runs the approval gate.
async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, document_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:quality") {
        return response;
    }

    let Some(target) =
        DocumentStatus::parse(ApprovalDocumentType::QualityDocument, &payload.status)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_status",
                "message": format!("Invalid quality document status: {}", payload.status)
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
        .get_gated(company_id, ApprovalDocumentType::QualityDocument, document_id)
        .await
    {
        Ok(document) => document,
        Err(e) => return document_error_response(&e),
    };

    // Only a draft entering activation passes through the approval gate.
    if document.status.transition_is_gated(target) {
        match run_activation_trigger(&state, &auth, &document).await {
            Ok(TriggerOutcome::Proceed(_)) => {}
            Ok(TriggerOutcome::Blocked(request)) => {
                // Leave the document untouched.
                let _ = conn.rollback().await;
                return blocked_response(&request);
            }
            Err(response) => return response,
        }
    }

    if let Err(e) = repo
        .update_status(company_id, document_id, target, auth.user_id())
        .await
    {
        return document_error_response(&e);
    }

    if let Err(e) = conn.commit().await {
        error!(error = %e, "Failed to commit status update");
        return internal_error();
    }

    info!(document_id = %document_id, status = %target.as_str(), "Quality document status updated");
    (
        StatusCode::OK,
        Json(json!({ "id": document_id, "status": target.as_str() })),
    )
        .into_response()
}

// ============================================================================
// Helper Functions
// ============================================================================

fn document_to_response(document: QualityDocumentModel) -> QualityDocumentResponse {
    QualityDocumentResponse {
        id: document.id,
        company_id: document.company_id,
        name: document.name,
        status: document.status,
        version: document.version,
        content: document.content,
        created_at: document.created_at.to_rfc3339(),
        updated_at: document.updated_at.to_rfc3339(),
    }
}

pub(crate) fn document_error_response(e: &DocumentError) -> axum::response::Response {
    match e {
        DocumentError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Document not found"
            })),
        )
            .into_response(),
        DocumentError::InvalidStatus { status, .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_status",
                "message": format!("Invalid status: {status}")
            })),
        )
            .into_response(),
        DocumentError::Database(e) => {
            error!(error = %e, "Document operation failed");
            internal_error()
        }
    }
}

pub(crate) fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}
