//! Approval rule resolution.
//!
//! This module implements the amount-band matching that decides whether a
//! document needs approval and which configured rule applies to it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fabriq_shared::notify::NotifyRecipient;

use crate::approvals::types::ApprovalDocumentType;

/// A stored approval policy for one document type and, for purchase orders,
/// one amount band `[lower_bound_amount, upper_bound_amount)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: Uuid,
    /// Company the rule is scoped to.
    pub company_id: Uuid,
    /// Document type this rule applies to.
    pub document_type: ApprovalDocumentType,
    /// Disabled rules are never candidates (soft delete).
    pub enabled: bool,
    /// Approver groups notified and authorized to decide.
    pub approver_group_ids: Vec<Uuid>,
    /// Single-user fallback recipient when no groups are configured.
    pub default_approver_id: Option<Uuid>,
    /// Inclusive lower bound of the amount band.
    pub lower_bound_amount: Decimal,
    /// Exclusive upper bound of the amount band; None = unbounded above.
    pub upper_bound_amount: Option<Decimal>,
    /// Days until auto-escalation; persisted only, enforced by an external
    /// scheduler.
    pub escalation_days: Option<i32>,
    /// When true, document activation is held until the request is Approved.
    pub blocking: bool,
    /// Creation time, used as the final tie-break.
    pub created_at: DateTime<Utc>,
}

impl ApprovalRule {
    /// Returns the band width, or None for an unbounded band.
    #[must_use]
    fn band_width(&self) -> Option<Decimal> {
        self.upper_bound_amount
            .map(|upper| upper - self.lower_bound_amount)
    }

    /// Returns true if this rule's band contains the given amount.
    ///
    /// For document types without an amount dimension the band is ignored
    /// and every enabled rule matches. For purchase orders a missing amount
    /// matches no band.
    #[must_use]
    pub fn matches(&self, document_type: ApprovalDocumentType, amount: Option<Decimal>) -> bool {
        if !self.enabled || self.document_type != document_type {
            return false;
        }

        if !document_type.has_amount_dimension() {
            return true;
        }

        let Some(amount) = amount else {
            return false;
        };

        amount >= self.lower_bound_amount
            && self.upper_bound_amount.is_none_or(|upper| amount < upper)
    }
}

/// Stateless resolver that selects the single applicable rule.
pub struct RuleResolver;

impl RuleResolver {
    /// Selects the applicable rule for a document type and optional amount.
    ///
    /// Candidates are the enabled rules of the document type whose band
    /// contains the amount (amount bands are meaningless for quality
    /// documents). When multiple candidates match the tie-break is
    /// deterministic: narrowest band first (unbounded counts as infinitely
    /// wide), then the most recently created rule.
    ///
    /// Returns None when nothing matches; callers treat that as "no
    /// approval workflow configured", not an error.
    #[must_use]
    pub fn select_rule(
        rules: &[ApprovalRule],
        document_type: ApprovalDocumentType,
        amount: Option<Decimal>,
    ) -> Option<&ApprovalRule> {
        rules
            .iter()
            .filter(|r| r.matches(document_type, amount))
            .min_by(|a, b| {
                match (a.band_width(), b.band_width()) {
                    (Some(wa), Some(wb)) if wa != wb => wa.cmp(&wb),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    // Equal widths (or both unbounded): newest wins.
                    _ => b.created_at.cmp(&a.created_at),
                }
            })
    }
}

/// Approval gate: decides whether an approval workflow applies at all.
pub struct ApprovalGate;

impl ApprovalGate {
    /// Returns true if any enabled rule applies to this document and amount.
    ///
    /// A false result is the normal "workflow not configured" outcome,
    /// never an error.
    #[must_use]
    pub fn is_approval_required(
        rules: &[ApprovalRule],
        document_type: ApprovalDocumentType,
        amount: Option<Decimal>,
    ) -> bool {
        RuleResolver::select_rule(rules, document_type, amount).is_some()
    }
}

/// Resolves the notification recipient set for a rule.
///
/// Groups take precedence over the default approver; a rule with neither
/// configured yields None and nothing is dispatched.
#[must_use]
pub fn resolve_recipient(rule: &ApprovalRule) -> Option<NotifyRecipient> {
    if !rule.approver_group_ids.is_empty() {
        return Some(NotifyRecipient::Group {
            group_ids: rule.approver_group_ids.clone(),
        });
    }

    rule.default_approver_id
        .map(|user_id| NotifyRecipient::User { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rule(
        document_type: ApprovalDocumentType,
        enabled: bool,
        lower: Decimal,
        upper: Option<Decimal>,
    ) -> ApprovalRule {
        ApprovalRule {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            document_type,
            enabled,
            approver_group_ids: vec![],
            default_approver_id: None,
            lower_bound_amount: lower,
            upper_bound_amount: upper,
            escalation_days: None,
            blocking: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_band_boundaries_inclusive_exclusive() {
        let rules = vec![
            rule(ApprovalDocumentType::PurchaseOrder, true, dec!(10), Some(dec!(50))),
            rule(ApprovalDocumentType::PurchaseOrder, true, dec!(50), None),
        ];

        // 49.99 falls in [10, 50)
        let selected =
            RuleResolver::select_rule(&rules, ApprovalDocumentType::PurchaseOrder, Some(dec!(49.99)))
                .unwrap();
        assert_eq!(selected.id, rules[0].id);

        // 50 is in [50, inf) - upper bound is exclusive
        let selected =
            RuleResolver::select_rule(&rules, ApprovalDocumentType::PurchaseOrder, Some(dec!(50)))
                .unwrap();
        assert_eq!(selected.id, rules[1].id);

        // 9.99 matches neither
        assert!(
            RuleResolver::select_rule(&rules, ApprovalDocumentType::PurchaseOrder, Some(dec!(9.99)))
                .is_none()
        );
    }

    #[test]
    fn test_disabled_rules_ignored() {
        let rules = vec![
            rule(ApprovalDocumentType::PurchaseOrder, false, dec!(0), Some(dec!(10000))),
            rule(ApprovalDocumentType::PurchaseOrder, true, dec!(50000), None),
        ];

        let selected =
            RuleResolver::select_rule(&rules, ApprovalDocumentType::PurchaseOrder, Some(dec!(75000)))
                .unwrap();
        assert_eq!(selected.id, rules[1].id);

        assert!(
            RuleResolver::select_rule(&rules, ApprovalDocumentType::PurchaseOrder, Some(dec!(100)))
                .is_none()
        );
    }

    #[test]
    fn test_quality_document_ignores_amount() {
        let rules = vec![rule(
            ApprovalDocumentType::QualityDocument,
            true,
            dec!(0),
            Some(dec!(1)),
        )];

        // Band is meaningless for quality documents: matches with any or no amount.
        assert!(
            RuleResolver::select_rule(&rules, ApprovalDocumentType::QualityDocument, None).is_some()
        );
        assert!(
            RuleResolver::select_rule(
                &rules,
                ApprovalDocumentType::QualityDocument,
                Some(dec!(99999))
            )
            .is_some()
        );
    }

    #[test]
    fn test_missing_amount_matches_no_purchase_order_band() {
        let rules = vec![rule(ApprovalDocumentType::PurchaseOrder, true, dec!(0), None)];
        assert!(
            RuleResolver::select_rule(&rules, ApprovalDocumentType::PurchaseOrder, None).is_none()
        );
        assert!(!ApprovalGate::is_approval_required(
            &rules,
            ApprovalDocumentType::PurchaseOrder,
            None
        ));
    }

    #[test]
    fn test_tie_break_narrowest_band_wins() {
        let wide = rule(ApprovalDocumentType::PurchaseOrder, true, dec!(0), Some(dec!(100000)));
        let narrow = rule(ApprovalDocumentType::PurchaseOrder, true, dec!(40), Some(dec!(60)));
        let unbounded = rule(ApprovalDocumentType::PurchaseOrder, true, dec!(0), None);

        let rules = vec![wide, unbounded, narrow.clone()];
        let selected =
            RuleResolver::select_rule(&rules, ApprovalDocumentType::PurchaseOrder, Some(dec!(50)))
                .unwrap();
        assert_eq!(selected.id, narrow.id);
    }

    #[test]
    fn test_tie_break_newest_on_equal_width() {
        let mut older = rule(ApprovalDocumentType::PurchaseOrder, true, dec!(0), Some(dec!(100)));
        older.created_at = Utc::now() - chrono::Duration::days(2);
        let newer = rule(ApprovalDocumentType::PurchaseOrder, true, dec!(0), Some(dec!(100)));

        let rules = vec![older, newer.clone()];
        let selected =
            RuleResolver::select_rule(&rules, ApprovalDocumentType::PurchaseOrder, Some(dec!(10)))
                .unwrap();
        assert_eq!(selected.id, newer.id);
    }

    #[test]
    fn test_gate_false_with_no_rules() {
        assert!(!ApprovalGate::is_approval_required(
            &[],
            ApprovalDocumentType::QualityDocument,
            None
        ));
    }

    #[test]
    fn test_recipient_groups_take_precedence() {
        let mut r = rule(ApprovalDocumentType::QualityDocument, true, dec!(0), None);
        let g1 = Uuid::new_v4();
        let g2 = Uuid::new_v4();
        r.approver_group_ids = vec![g1, g2];
        r.default_approver_id = Some(Uuid::new_v4());

        assert_eq!(
            resolve_recipient(&r),
            Some(NotifyRecipient::Group {
                group_ids: vec![g1, g2]
            })
        );
    }

    #[test]
    fn test_recipient_falls_back_to_default_approver() {
        let mut r = rule(ApprovalDocumentType::QualityDocument, true, dec!(0), None);
        let user = Uuid::new_v4();
        r.default_approver_id = Some(user);

        assert_eq!(
            resolve_recipient(&r),
            Some(NotifyRecipient::User { user_id: user })
        );
    }

    #[test]
    fn test_recipient_none_when_unconfigured() {
        let r = rule(ApprovalDocumentType::QualityDocument, true, dec!(0), None);
        assert_eq!(resolve_recipient(&r), None);
    }
}
