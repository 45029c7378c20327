//! Approval rule repository.
//!
//! Persists approval configurations keyed by (company, document type,
//! amount band). Rules are soft-deleted by flipping `enabled` off; the
//! resolver reads current state on every resolution, so no configuration
//! caching happens here.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use thiserror::Error;
use uuid::Uuid;

use fabriq_core::approvals::{ApprovalDocumentType, ApprovalRule};

use crate::entities::approval_rules::{
    self, ActiveModel, Entity as ApprovalRuleEntity, Model as ApprovalRuleModel,
};
use crate::service_role::ServiceRoleHandle;

/// Errors that can occur during approval rule operations.
#[derive(Debug, Error)]
pub enum ApprovalRuleError {
    /// Approval rule not found.
    #[error("Approval rule {0} not found")]
    NotFound(Uuid),

    /// Lower bound must sit below the upper bound.
    #[error("Invalid amount range: {lower} must be below {upper}")]
    InvalidAmountRange {
        /// Inclusive lower bound.
        lower: Decimal,
        /// Exclusive upper bound.
        upper: Decimal,
    },

    /// Lower bound must be non-negative.
    #[error("Invalid lower bound: {0} is negative")]
    NegativeLowerBound(Decimal),

    /// Escalation delay must be at least one day when set.
    #[error("Invalid escalation days: {0} must be positive")]
    InvalidEscalationDays(i32),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Input for creating or updating an approval rule.
///
/// With `id` set the call updates the existing rule; otherwise a new rule
/// is inserted. This is the settings-UI upsert surface.
#[derive(Debug, Clone)]
pub struct UpsertApprovalRuleInput {
    /// Existing rule to update, or None to create.
    pub id: Option<Uuid>,
    /// Document type the rule applies to.
    pub document_type: ApprovalDocumentType,
    /// Whether the rule participates in resolution.
    pub enabled: bool,
    /// Approver groups (take precedence over the default approver).
    pub approver_group_ids: Vec<Uuid>,
    /// Single-user fallback recipient.
    pub default_approver_id: Option<Uuid>,
    /// Inclusive lower bound of the amount band.
    pub lower_bound_amount: Decimal,
    /// Exclusive upper bound; None = unbounded above.
    pub upper_bound_amount: Option<Decimal>,
    /// Days until auto-escalation (persisted only).
    pub escalation_days: Option<i32>,
    /// Hold document activation until the request is approved.
    pub blocking: bool,
}

/// Repository for approval rule operations.
///
/// Runs under the service role: rule resolution must see the company's
/// configuration regardless of the caller's row-level scope.
pub struct ApprovalRuleRepository<'a> {
    handle: &'a ServiceRoleHandle,
}

impl<'a> ApprovalRuleRepository<'a> {
    /// Creates a new repository over the service-role handle.
    #[must_use]
    pub const fn new(handle: &'a ServiceRoleHandle) -> Self {
        Self { handle }
    }

    /// Creates or updates an approval rule.
    pub async fn upsert_rule(
        &self,
        company_id: Uuid,
        actor_id: Uuid,
        input: UpsertApprovalRuleInput,
    ) -> Result<ApprovalRuleModel, ApprovalRuleError> {
        validate_bounds(input.lower_bound_amount, input.upper_bound_amount)?;
        validate_escalation(input.escalation_days)?;

        let now = Utc::now();

        if let Some(rule_id) = input.id {
            let existing = self.get_rule(company_id, rule_id).await?;

            let mut rule: ActiveModel = existing.into();
            rule.document_type = Set(input.document_type.as_str().to_string());
            rule.enabled = Set(input.enabled);
            rule.approver_group_ids = Set(input.approver_group_ids);
            rule.default_approver_id = Set(input.default_approver_id);
            rule.lower_bound_amount = Set(input.lower_bound_amount);
            rule.upper_bound_amount = Set(input.upper_bound_amount);
            rule.escalation_days = Set(input.escalation_days);
            rule.blocking = Set(input.blocking);
            rule.updated_by = Set(Some(actor_id));
            rule.updated_at = Set(now.into());

            Ok(rule.update(self.handle.connection()).await?)
        } else {
            let rule = ActiveModel {
                id: Set(Uuid::new_v4()),
                company_id: Set(company_id),
                document_type: Set(input.document_type.as_str().to_string()),
                enabled: Set(input.enabled),
                approver_group_ids: Set(input.approver_group_ids),
                default_approver_id: Set(input.default_approver_id),
                lower_bound_amount: Set(input.lower_bound_amount),
                upper_bound_amount: Set(input.upper_bound_amount),
                escalation_days: Set(input.escalation_days),
                blocking: Set(input.blocking),
                created_by: Set(actor_id),
                created_at: Set(now.into()),
                updated_by: Set(None),
                updated_at: Set(now.into()),
            };

            Ok(rule.insert(self.handle.connection()).await?)
        }
    }

    /// Lists all rules for a company, newest first. Used by the settings
    /// surface; disabled rules are included.
    pub async fn list_rules(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<ApprovalRuleModel>, ApprovalRuleError> {
        let rules = ApprovalRuleEntity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .order_by_desc(approval_rules::Column::CreatedAt)
            .all(self.handle.connection())
            .await?;

        Ok(rules)
    }

    /// Lists the enabled rules for a document type, converted for the core
    /// resolver. Always reads current state; configurations can change
    /// between requests.
    pub async fn list_enabled(
        &self,
        company_id: Uuid,
        document_type: ApprovalDocumentType,
    ) -> Result<Vec<ApprovalRule>, ApprovalRuleError> {
        let rules = ApprovalRuleEntity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .filter(approval_rules::Column::DocumentType.eq(document_type.as_str()))
            .filter(approval_rules::Column::Enabled.eq(true))
            .all(self.handle.connection())
            .await?;

        Ok(rules.into_iter().filter_map(model_to_core).collect())
    }

    /// Gets a specific approval rule by ID.
    pub async fn get_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
    ) -> Result<ApprovalRuleModel, ApprovalRuleError> {
        let rule = ApprovalRuleEntity::find_by_id(rule_id)
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .one(self.handle.connection())
            .await?
            .ok_or(ApprovalRuleError::NotFound(rule_id))?;

        Ok(rule)
    }

    /// Soft deletes an approval rule by disabling it.
    pub async fn delete_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), ApprovalRuleError> {
        let existing = self.get_rule(company_id, rule_id).await?;

        let mut rule: ActiveModel = existing.into();
        rule.enabled = Set(false);
        rule.updated_by = Set(Some(actor_id));
        rule.updated_at = Set(Utc::now().into());

        rule.update(self.handle.connection()).await?;
        Ok(())
    }
}

fn validate_bounds(lower: Decimal, upper: Option<Decimal>) -> Result<(), ApprovalRuleError> {
    if lower < Decimal::ZERO {
        return Err(ApprovalRuleError::NegativeLowerBound(lower));
    }
    if let Some(upper) = upper
        && lower >= upper
    {
        return Err(ApprovalRuleError::InvalidAmountRange { lower, upper });
    }
    Ok(())
}

fn validate_escalation(days: Option<i32>) -> Result<(), ApprovalRuleError> {
    if let Some(days) = days
        && days <= 0
    {
        return Err(ApprovalRuleError::InvalidEscalationDays(days));
    }
    Ok(())
}

/// Converts a stored rule to the core resolver's type. Rows with an
/// unknown document type (from a newer schema) are skipped.
fn model_to_core(model: ApprovalRuleModel) -> Option<ApprovalRule> {
    let document_type = ApprovalDocumentType::parse(&model.document_type)?;
    Some(ApprovalRule {
        id: model.id,
        company_id: model.company_id,
        document_type,
        enabled: model.enabled,
        approver_group_ids: model.approver_group_ids,
        default_approver_id: model.default_approver_id,
        lower_bound_amount: model.lower_bound_amount,
        upper_bound_amount: model.upper_bound_amount,
        escalation_days: model.escalation_days,
        blocking: model.blocking,
        created_at: model.created_at.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_bounds_accepts_open_band() {
        assert!(validate_bounds(dec!(0), None).is_ok());
        assert!(validate_bounds(dec!(100), Some(dec!(200))).is_ok());
    }

    #[test]
    fn test_validate_bounds_rejects_inverted_band() {
        assert!(matches!(
            validate_bounds(dec!(200), Some(dec!(100))),
            Err(ApprovalRuleError::InvalidAmountRange { .. })
        ));
        // Degenerate [x, x) band is empty, also rejected.
        assert!(matches!(
            validate_bounds(dec!(100), Some(dec!(100))),
            Err(ApprovalRuleError::InvalidAmountRange { .. })
        ));
    }

    #[test]
    fn test_validate_bounds_rejects_negative_lower() {
        assert!(matches!(
            validate_bounds(dec!(-1), None),
            Err(ApprovalRuleError::NegativeLowerBound(_))
        ));
    }

    #[test]
    fn test_validate_escalation_requires_positive_days() {
        assert!(validate_escalation(None).is_ok());
        assert!(validate_escalation(Some(1)).is_ok());
        assert!(matches!(
            validate_escalation(Some(0)),
            Err(ApprovalRuleError::InvalidEscalationDays(0))
        ));
        assert!(matches!(
            validate_escalation(Some(-3)),
            Err(ApprovalRuleError::InvalidEscalationDays(-3))
        ));
    }

    #[test]
    fn test_model_to_core_skips_unknown_document_type() {
        let now = Utc::now();
        let model = ApprovalRuleModel {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            document_type: "salesOrder".to_string(),
            enabled: true,
            approver_group_ids: vec![],
            default_approver_id: None,
            lower_bound_amount: dec!(0),
            upper_bound_amount: None,
            escalation_days: None,
            blocking: false,
            created_by: Uuid::new_v4(),
            created_at: now.into(),
            updated_by: None,
            updated_at: now.into(),
        };
        assert!(model_to_core(model).is_none());
    }

    #[test]
    fn test_model_to_core_maps_fields() {
        let now = Utc::now();
        let group = Uuid::new_v4();
        let model = ApprovalRuleModel {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            document_type: "purchaseOrder".to_string(),
            enabled: true,
            approver_group_ids: vec![group],
            default_approver_id: None,
            lower_bound_amount: dec!(50),
            upper_bound_amount: Some(dec!(500)),
            escalation_days: Some(3),
            blocking: true,
            created_by: Uuid::new_v4(),
            created_at: now.into(),
            updated_by: None,
            updated_at: now.into(),
        };

        let core = model_to_core(model).unwrap();
        assert_eq!(core.document_type, ApprovalDocumentType::PurchaseOrder);
        assert_eq!(core.approver_group_ids, vec![group]);
        assert_eq!(core.lower_bound_amount, dec!(50));
        assert_eq!(core.upper_bound_amount, Some(dec!(500)));
        assert!(core.blocking);
    }
}
