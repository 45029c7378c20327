//! Property-based tests for the approval request state machine.

use proptest::prelude::*;
use uuid::Uuid;

use crate::approvals::error::ApprovalError;
use crate::approvals::lifecycle::ApprovalLifecycle;
use crate::approvals::types::{ApprovalDecision, ApprovalStatus};

fn arb_status() -> impl Strategy<Value = ApprovalStatus> {
    prop_oneof![
        Just(ApprovalStatus::Pending),
        Just(ApprovalStatus::Approved),
        Just(ApprovalStatus::Rejected),
        Just(ApprovalStatus::Cancelled),
    ]
}

fn arb_decision() -> impl Strategy<Value = ApprovalDecision> {
    prop_oneof![
        Just(ApprovalDecision::Approved),
        Just(ApprovalDecision::Rejected),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A decision succeeds exactly from Pending, and the resulting status
    /// always matches the decision.
    #[test]
    fn prop_decide_only_from_pending(
        status in arb_status(),
        decision in arb_decision(),
    ) {
        let result = ApprovalLifecycle::decide(status, decision, Uuid::new_v4(), None);

        match status {
            ApprovalStatus::Pending => {
                let action = result.unwrap();
                prop_assert_eq!(action.new_status, decision.as_status());
            }
            _ => {
                let illegal = matches!(result, Err(ApprovalError::IllegalTransition { .. }));
                prop_assert!(illegal, "expected IllegalTransition from {:?}", status);
            }
        }
    }

    /// Terminal states have no outgoing transitions at all.
    #[test]
    fn prop_terminal_states_are_closed(
        from in arb_status(),
        to in arb_status(),
    ) {
        if from.is_terminal() {
            prop_assert!(!ApprovalLifecycle::is_valid_transition(from, to));
        }
    }

    /// `is_valid_transition` agrees with decide/cancel outcomes.
    #[test]
    fn prop_transition_table_consistent(
        status in arb_status(),
        decision in arb_decision(),
    ) {
        let target = decision.as_status();
        let decide_ok =
            ApprovalLifecycle::decide(status, decision, Uuid::new_v4(), None).is_ok();
        prop_assert_eq!(decide_ok, ApprovalLifecycle::is_valid_transition(status, target));

        let cancel_ok = ApprovalLifecycle::cancel(status).is_ok();
        prop_assert_eq!(
            cancel_ok,
            ApprovalLifecycle::is_valid_transition(status, ApprovalStatus::Cancelled)
        );
    }
}
