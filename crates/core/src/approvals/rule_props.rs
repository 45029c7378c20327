//! Property-based tests for rule resolution.
//!
//! These validate the band containment and tie-break contracts of the
//! rule resolver across randomized inputs.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::approvals::rule::{ApprovalGate, ApprovalRule, RuleResolver};
use crate::approvals::types::ApprovalDocumentType;

/// Strategy for generating random non-negative Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn po_rule(lower: Decimal, upper: Option<Decimal>) -> ApprovalRule {
    ApprovalRule {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        document_type: ApprovalDocumentType::PurchaseOrder,
        enabled: true,
        approver_group_ids: vec![],
        default_approver_id: None,
        lower_bound_amount: lower,
        upper_bound_amount: upper,
        escalation_days: None,
        blocking: false,
        created_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A selected rule's band always contains the amount.
    #[test]
    fn prop_selected_rule_contains_amount(
        amount in arb_amount(),
        lower in arb_amount(),
        width in arb_amount(),
    ) {
        let rules = vec![po_rule(lower, Some(lower + width))];
        let selected = RuleResolver::select_rule(
            &rules,
            ApprovalDocumentType::PurchaseOrder,
            Some(amount),
        );

        if let Some(rule) = selected {
            prop_assert!(amount >= rule.lower_bound_amount);
            prop_assert!(amount < rule.upper_bound_amount.unwrap());
        } else {
            prop_assert!(amount < lower || amount >= lower + width);
        }
    }

    /// The gate agrees with the resolver everywhere.
    #[test]
    fn prop_gate_matches_resolver(
        amount in arb_amount(),
        lower in arb_amount(),
    ) {
        let rules = vec![po_rule(lower, None)];
        let required = ApprovalGate::is_approval_required(
            &rules,
            ApprovalDocumentType::PurchaseOrder,
            Some(amount),
        );
        let selected = RuleResolver::select_rule(
            &rules,
            ApprovalDocumentType::PurchaseOrder,
            Some(amount),
        );
        prop_assert_eq!(required, selected.is_some());
    }

    /// Disabled rules never win, whatever their band.
    #[test]
    fn prop_disabled_rules_never_selected(
        amount in arb_amount(),
    ) {
        let mut disabled = po_rule(Decimal::ZERO, None);
        disabled.enabled = false;
        let rules = vec![disabled];

        prop_assert!(RuleResolver::select_rule(
            &rules,
            ApprovalDocumentType::PurchaseOrder,
            Some(amount),
        ).is_none());
    }

    /// When a bounded and an unbounded band both contain the amount,
    /// the bounded (narrower) band wins.
    #[test]
    fn prop_bounded_band_beats_unbounded(
        amount in arb_amount(),
        width in arb_amount(),
    ) {
        let bounded = po_rule(Decimal::ZERO, Some(amount + width + Decimal::ONE));
        let bounded_id = bounded.id;
        let unbounded = po_rule(Decimal::ZERO, None);

        let rules = vec![unbounded, bounded];
        let selected = RuleResolver::select_rule(
            &rules,
            ApprovalDocumentType::PurchaseOrder,
            Some(amount),
        ).unwrap();
        prop_assert_eq!(selected.id, bounded_id);
    }

    /// Quality document resolution is amount-independent.
    #[test]
    fn prop_quality_document_amount_independent(
        amount in arb_amount(),
        lower in arb_amount(),
    ) {
        let mut rule = po_rule(lower, Some(lower + Decimal::ONE));
        rule.document_type = ApprovalDocumentType::QualityDocument;
        let rules = vec![rule];

        let with_amount = RuleResolver::select_rule(
            &rules,
            ApprovalDocumentType::QualityDocument,
            Some(amount),
        ).is_some();
        let without_amount = RuleResolver::select_rule(
            &rules,
            ApprovalDocumentType::QualityDocument,
            None,
        ).is_some();
        prop_assert!(with_amount);
        prop_assert!(without_amount);
    }
}
