//! Approval rule management routes.
//!
//! The settings surface for the approval workflow: per-company,
//! per-document-type rules with optional amount bands.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use fabriq_core::approvals::ApprovalDocumentType;
use fabriq_db::entities::approval_rules::Model as ApprovalRuleModel;
use fabriq_db::repositories::approval_rule::{
    ApprovalRuleError, ApprovalRuleRepository, UpsertApprovalRuleInput,
};

/// Creates the approval rules routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/companies/{company_id}/approval-rules",
            get(list_approval_rules),
        )
        .route(
            "/companies/{company_id}/approval-rules",
            post(upsert_approval_rule),
        )
        .route(
            "/companies/{company_id}/approval-rules/{rule_id}",
            get(get_approval_rule),
        )
        .route(
            "/companies/{company_id}/approval-rules/{rule_id}",
            patch(update_approval_rule),
        )
        .route(
            "/companies/{company_id}/approval-rules/{rule_id}",
            delete(delete_approval_rule),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating or updating an approval rule.
///
/// With `id` set, POST behaves as an update; the settings UI submits the
/// whole form either way.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertApprovalRuleRequest {
    /// Existing rule to update, or absent to create.
    pub id: Option<Uuid>,
    /// Document type the rule applies to.
    pub document_type: String,
    /// Whether the rule participates in resolution.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Approver groups.
    #[serde(default)]
    pub approver_group_ids: Vec<Uuid>,
    /// Single-user fallback recipient.
    pub default_approver_id: Option<Uuid>,
    /// Inclusive lower bound of the amount band; defaults to 0.
    pub lower_bound_amount: Option<String>,
    /// Exclusive upper bound; absent = unbounded above.
    pub upper_bound_amount: Option<String>,
    /// Days until auto-escalation.
    pub escalation_days: Option<i32>,
    /// Hold activation until the request is approved.
    #[serde(default)]
    pub blocking: bool,
}

const fn default_enabled() -> bool {
    true
}

/// Response for an approval rule.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRuleResponse {
    /// Rule ID.
    pub id: Uuid,
    /// Company ID.
    pub company_id: Uuid,
    /// Document type.
    pub document_type: String,
    /// Enabled status.
    pub enabled: bool,
    /// Approver groups.
    pub approver_group_ids: Vec<Uuid>,
    /// Single-user fallback recipient.
    pub default_approver_id: Option<Uuid>,
    /// Inclusive lower bound.
    pub lower_bound_amount: String,
    /// Exclusive upper bound, absent = unbounded.
    pub upper_bound_amount: Option<String>,
    /// Days until auto-escalation.
    pub escalation_days: Option<i32>,
    /// Blocking flag.
    pub blocking: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/companies/{company_id}/approval-rules` - List approval rules.
async fn list_approval_rules(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "view:settings") {
        return response;
    }

    let repo = ApprovalRuleRepository::new(&state.service_role);

    match repo.list_rules(company_id).await {
        Ok(rules) => {
            let items: Vec<ApprovalRuleResponse> =
                rules.into_iter().map(rule_to_response).collect();

            (StatusCode::OK, Json(json!({ "data": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list approval rules");
            approval_rule_error_response(&e)
        }
    }
}

/// POST `/companies/{company_id}/approval-rules` - Create or update.
async fn upsert_approval_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<UpsertApprovalRuleRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:settings") {
        return response;
    }

    let input = match build_input(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };

    let created = input.id.is_none();
    let repo = ApprovalRuleRepository::new(&state.service_role);

    match repo.upsert_rule(company_id, auth.user_id(), input).await {
        Ok(rule) => {
            info!(company_id = %company_id, rule_id = %rule.id, "Approval rule upserted");

            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(rule_to_response(rule))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to upsert approval rule");
            approval_rule_error_response(&e)
        }
    }
}

/// GET `/companies/{company_id}/approval-rules/{rule_id}` - Get one rule.
async fn get_approval_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, rule_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "view:settings") {
        return response;
    }

    let repo = ApprovalRuleRepository::new(&state.service_role);

    match repo.get_rule(company_id, rule_id).await {
        Ok(rule) => (StatusCode::OK, Json(rule_to_response(rule))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to get approval rule");
            approval_rule_error_response(&e)
        }
    }
}

/// PATCH `/companies/{company_id}/approval-rules/{rule_id}` - Update.
async fn update_approval_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, rule_id)): Path<(Uuid, Uuid)>,
    Json(mut payload): Json<UpsertApprovalRuleRequest>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:settings") {
        return response;
    }

    payload.id = Some(rule_id);
    let input = match build_input(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };

    let repo = ApprovalRuleRepository::new(&state.service_role);

    match repo.upsert_rule(company_id, auth.user_id(), input).await {
        Ok(rule) => {
            info!(company_id = %company_id, rule_id = %rule_id, "Approval rule updated");
            (StatusCode::OK, Json(rule_to_response(rule))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to update approval rule");
            approval_rule_error_response(&e)
        }
    }
}

/// DELETE `/companies/{company_id}/approval-rules/{rule_id}` - Disable.
async fn delete_approval_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, rule_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = check_company_scope(&auth, company_id, "update:settings") {
        return response;
    }

    let repo = ApprovalRuleRepository::new(&state.service_role);

    match repo.delete_rule(company_id, rule_id, auth.user_id()).await {
        Ok(()) => {
            info!(company_id = %company_id, rule_id = %rule_id, "Approval rule disabled");
            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to delete approval rule");
            approval_rule_error_response(&e)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

#[allow(clippy::result_large_err)]
fn build_input(
    payload: UpsertApprovalRuleRequest,
) -> Result<UpsertApprovalRuleInput, axum::response::Response> {
    let Some(document_type) = ApprovalDocumentType::parse(&payload.document_type) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_document_type",
                "message": format!("Invalid document type: {}", payload.document_type)
            })),
        )
            .into_response());
    };

    let lower_bound_amount = match payload.lower_bound_amount.as_deref() {
        Some(s) => parse_amount(s)?,
        None => Decimal::ZERO,
    };

    let upper_bound_amount = match payload.upper_bound_amount.as_deref() {
        Some(s) if !s.is_empty() => Some(parse_amount(s)?),
        _ => None,
    };

    Ok(UpsertApprovalRuleInput {
        id: payload.id,
        document_type,
        enabled: payload.enabled,
        approver_group_ids: payload.approver_group_ids,
        default_approver_id: payload.default_approver_id,
        lower_bound_amount,
        upper_bound_amount,
        escalation_days: payload.escalation_days,
        blocking: payload.blocking,
    })
}

#[allow(clippy::result_large_err)]
fn parse_amount(s: &str) -> Result<Decimal, axum::response::Response> {
    Decimal::from_str(s).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount",
                "message": "Invalid amount format"
            })),
        )
            .into_response()
    })
}

fn rule_to_response(rule: ApprovalRuleModel) -> ApprovalRuleResponse {
    ApprovalRuleResponse {
        id: rule.id,
        company_id: rule.company_id,
        document_type: rule.document_type,
        enabled: rule.enabled,
        approver_group_ids: rule.approver_group_ids,
        default_approver_id: rule.default_approver_id,
        lower_bound_amount: rule.lower_bound_amount.to_string(),
        upper_bound_amount: rule.upper_bound_amount.map(|a| a.to_string()),
        escalation_days: rule.escalation_days,
        blocking: rule.blocking,
        created_at: rule.created_at.to_rfc3339(),
        updated_at: rule.updated_at.to_rfc3339(),
    }
}

#[allow(clippy::result_large_err)]
pub(crate) fn check_company_scope(
    auth: &AuthUser,
    company_id: Uuid,
    capability: &str,
) -> Result<(), axum::response::Response> {
    if auth.company_id() != company_id {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Token is not scoped to this company"
            })),
        )
            .into_response());
    }

    if !auth.has_permission(capability) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "permission_required",
                "message": format!("Missing required permission: {capability}")
            })),
        )
            .into_response());
    }

    Ok(())
}

fn approval_rule_error_response(e: &ApprovalRuleError) -> axum::response::Response {
    match e {
        ApprovalRuleError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Approval rule not found"
            })),
        )
            .into_response(),
        ApprovalRuleError::InvalidAmountRange { lower, upper } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount_range",
                "message": format!("Lower bound {lower} must be below upper bound {upper}")
            })),
        )
            .into_response(),
        ApprovalRuleError::NegativeLowerBound(lower) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount_range",
                "message": format!("Lower bound {lower} must be non-negative")
            })),
        )
            .into_response(),
        ApprovalRuleError::InvalidEscalationDays(days) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_escalation_days",
                "message": format!("Escalation days {days} must be positive")
            })),
        )
            .into_response(),
        ApprovalRuleError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}
