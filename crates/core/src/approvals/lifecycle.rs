//! Approval request state machine.
//!
//! This module implements the transition logic for approval requests.
//! Validation is pure; the persistence layer applies the returned actions.

use chrono::Utc;
use uuid::Uuid;

use crate::approvals::error::ApprovalError;
use crate::approvals::types::{ApprovalDecision, ApprovalStatus, DecisionAction};

/// Stateless service validating approval request transitions.
pub struct ApprovalLifecycle;

impl ApprovalLifecycle {
    /// Applies a decision to a request in the given status.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::IllegalTransition` unless the request is
    /// Pending. A terminal request is left untouched by callers.
    pub fn decide(
        current_status: ApprovalStatus,
        decision: ApprovalDecision,
        decided_by: Uuid,
        decision_notes: Option<String>,
    ) -> Result<DecisionAction, ApprovalError> {
        match current_status {
            ApprovalStatus::Pending => Ok(DecisionAction {
                new_status: decision.as_status(),
                decided_by,
                decided_at: Utc::now(),
                decision_notes,
            }),
            _ => Err(ApprovalError::IllegalTransition {
                from: current_status,
                to: decision.as_status(),
            }),
        }
    }

    /// Cancels a pending request.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::IllegalTransition` unless the request is
    /// Pending.
    pub fn cancel(current_status: ApprovalStatus) -> Result<ApprovalStatus, ApprovalError> {
        match current_status {
            ApprovalStatus::Pending => Ok(ApprovalStatus::Cancelled),
            _ => Err(ApprovalError::IllegalTransition {
                from: current_status,
                to: ApprovalStatus::Cancelled,
            }),
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved (approve)
    /// - Pending → Rejected (reject)
    /// - Pending → Cancelled (cancel)
    #[must_use]
    pub fn is_valid_transition(from: ApprovalStatus, to: ApprovalStatus) -> bool {
        matches!(
            (from, to),
            (
                ApprovalStatus::Pending,
                ApprovalStatus::Approved | ApprovalStatus::Rejected | ApprovalStatus::Cancelled
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_from_pending() {
        let user_id = Uuid::new_v4();
        let action = ApprovalLifecycle::decide(
            ApprovalStatus::Pending,
            ApprovalDecision::Approved,
            user_id,
            Some("looks good".to_string()),
        )
        .unwrap();

        assert_eq!(action.new_status, ApprovalStatus::Approved);
        assert_eq!(action.decided_by, user_id);
        assert_eq!(action.decision_notes.as_deref(), Some("looks good"));
    }

    #[test]
    fn test_reject_from_pending() {
        let action = ApprovalLifecycle::decide(
            ApprovalStatus::Pending,
            ApprovalDecision::Rejected,
            Uuid::new_v4(),
            None,
        )
        .unwrap();

        assert_eq!(action.new_status, ApprovalStatus::Rejected);
        assert!(action.decision_notes.is_none());
    }

    #[test]
    fn test_decide_on_terminal_fails() {
        for terminal in [
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
            ApprovalStatus::Cancelled,
        ] {
            let result = ApprovalLifecycle::decide(
                terminal,
                ApprovalDecision::Approved,
                Uuid::new_v4(),
                None,
            );
            assert!(matches!(
                result,
                Err(ApprovalError::IllegalTransition { .. })
            ));
        }
    }

    #[test]
    fn test_cancel_from_pending() {
        assert_eq!(
            ApprovalLifecycle::cancel(ApprovalStatus::Pending).unwrap(),
            ApprovalStatus::Cancelled
        );
    }

    #[test]
    fn test_cancel_terminal_fails() {
        let result = ApprovalLifecycle::cancel(ApprovalStatus::Approved);
        assert!(matches!(
            result,
            Err(ApprovalError::IllegalTransition {
                from: ApprovalStatus::Approved,
                to: ApprovalStatus::Cancelled,
            })
        ));
    }

    #[test]
    fn test_is_valid_transition() {
        assert!(ApprovalLifecycle::is_valid_transition(
            ApprovalStatus::Pending,
            ApprovalStatus::Approved
        ));
        assert!(ApprovalLifecycle::is_valid_transition(
            ApprovalStatus::Pending,
            ApprovalStatus::Rejected
        ));
        assert!(ApprovalLifecycle::is_valid_transition(
            ApprovalStatus::Pending,
            ApprovalStatus::Cancelled
        ));

        assert!(!ApprovalLifecycle::is_valid_transition(
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected
        ));
        assert!(!ApprovalLifecycle::is_valid_transition(
            ApprovalStatus::Cancelled,
            ApprovalStatus::Pending
        ));
        assert!(!ApprovalLifecycle::is_valid_transition(
            ApprovalStatus::Pending,
            ApprovalStatus::Pending
        ));
    }
}
