//! Document activation trigger.
//!
//! Shared orchestration for the status transitions that can require
//! approval: gate check, rule resolution, conditional request creation,
//! and best-effort notification. Both gated document routes go through
//! here so the two surfaces cannot drift apart.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::{error, info};

use crate::middleware::AuthUser;
use crate::routes::approval_requests::dispatch_notification;
use crate::AppState;
use fabriq_core::approvals::{resolve_recipient, ApprovalStatus, RuleResolver};
use fabriq_db::entities::approval_requests::Model as ApprovalRequestModel;
use fabriq_db::repositories::approval_request::{
    ApprovalRequestRepository, CreateApprovalRequestInput,
};
use fabriq_db::repositories::approval_rule::ApprovalRuleRepository;
use fabriq_db::repositories::document::GatedDocument;
use fabriq_shared::notify::{NotificationEvent, NotifyPayload};

/// What the trigger decided about the status transition.
pub enum TriggerOutcome {
    /// The transition may proceed. Carries the request this call created,
    /// if any; a non-blocking rule creates one and lets the write through.
    Proceed(Option<ApprovalRequestModel>),
    /// A blocking rule holds the transition until the request is approved.
    Blocked(ApprovalRequestModel),
}

/// Runs the approval gate for a document moving into a gated status.
///
/// No matching rule means no workflow is configured and the transition
/// proceeds untouched. Otherwise a pending request is created unless one
/// already exists; a fresh request notifies the rule's recipients. Only a
/// rule with `blocking` set can refuse the transition, and only until the
/// latest request for the document is approved.
#[allow(clippy::result_large_err)]
pub async fn run_activation_trigger(
    state: &AppState,
    auth: &AuthUser,
    document: &GatedDocument,
) -> Result<TriggerOutcome, axum::response::Response> {
    let company_id = auth.company_id();

    let rule_repo = ApprovalRuleRepository::new(&state.service_role);
    let rules = rule_repo
        .list_enabled(company_id, document.document_type)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load approval rules for trigger");
            internal_error()
        })?;

    let Some(rule) = RuleResolver::select_rule(&rules, document.document_type, document.amount)
    else {
        return Ok(TriggerOutcome::Proceed(None));
    };

    let request_repo = ApprovalRequestRepository::new(&state.service_role);

    if rule.blocking {
        let latest = request_repo
            .latest_for_document(company_id, document.document_type, document.id)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load approval state for trigger");
                internal_error()
            })?;

        if blocking_gate_is_open(latest.as_ref()) {
            return Ok(TriggerOutcome::Proceed(None));
        }
    }

    let outcome = request_repo
        .create_if_absent(
            company_id,
            CreateApprovalRequestInput {
                document_type: document.document_type,
                document_id: document.id,
                requested_by: auth.user_id(),
                created_by: auth.user_id(),
                approver_group_ids: rule.approver_group_ids.clone(),
                approver_id: rule.default_approver_id,
            },
        )
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create approval request");
            internal_error()
        })?;

    if outcome.is_created() {
        info!(
            request_id = %outcome.request().id,
            document_type = %document.document_type,
            document_id = %document.id,
            "Approval workflow triggered"
        );

        if let Some(recipient) = resolve_recipient(rule) {
            dispatch_notification(
                &state.notifier,
                NotifyPayload {
                    event: NotificationEvent::ApprovalRequested,
                    company_id,
                    document_id: outcome.request().id,
                    recipient,
                    from: auth.user_id(),
                },
            );
        }
    }

    let request = outcome.request().clone();
    if rule.blocking {
        Ok(TriggerOutcome::Blocked(request))
    } else {
        Ok(TriggerOutcome::Proceed(Some(request)))
    }
}

/// The 409 returned when a blocking rule refuses a transition.
pub fn blocked_response(request: &ApprovalRequestModel) -> axum::response::Response {
    (
        StatusCode::CONFLICT,
        Json(json!({
            "error": "approval_required",
            "message": "Status change is held until the approval request is approved",
            "approvalRequestId": request.id,
            "approvalStatus": request.status,
        })),
    )
        .into_response()
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}

/// A blocking rule releases the gate only once the latest request for
/// the document has been approved. Pending, rejected, and cancelled
/// requests all keep it closed, as does the absence of any request.
fn blocking_gate_is_open(latest: Option<&ApprovalRequestModel>) -> bool {
    latest.is_some_and(|r| r.status == ApprovalStatus::Approved.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn request_with_status(status: ApprovalStatus) -> ApprovalRequestModel {
        let now = Utc::now();
        ApprovalRequestModel {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            document_type: "purchaseOrder".to_string(),
            document_id: Uuid::new_v4(),
            status: status.as_str().to_string(),
            requested_by: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            approver_group_ids: vec![],
            approver_id: None,
            decision_notes: None,
            decided_at: None,
            decided_by: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_blocking_gate_opens_only_on_approval() {
        assert!(blocking_gate_is_open(Some(&request_with_status(
            ApprovalStatus::Approved
        ))));

        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Rejected,
            ApprovalStatus::Cancelled,
        ] {
            assert!(!blocking_gate_is_open(Some(&request_with_status(status))));
        }

        // No request on file yet: the first transition attempt must
        // create one instead of passing through.
        assert!(!blocking_gate_is_open(None));
    }
}
