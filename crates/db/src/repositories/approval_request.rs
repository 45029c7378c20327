//! Approval request repository.
//!
//! Persists the approval state machine. Creation is a conditional insert
//! backed by a partial unique index on pending rows, so two concurrent
//! triggers for the same document converge on a single pending request
//! without advisory locks. Decisions validate the transition through the
//! core lifecycle, then apply it.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::info;
use uuid::Uuid;

use fabriq_core::approvals::{
    ApprovalDecision, ApprovalDocumentType, ApprovalError, ApprovalLifecycle, ApprovalStatus,
};

use crate::entities::approval_requests::{
    self, ActiveModel, Entity as ApprovalRequestEntity, Model as ApprovalRequestModel,
};
use crate::service_role::ServiceRoleHandle;

/// Input for creating an approval request.
///
/// The recipient fields are a snapshot of the matched rule at trigger
/// time; they are stored on the request and never re-read from the rule.
#[derive(Debug, Clone)]
pub struct CreateApprovalRequestInput {
    /// Document type the request gates.
    pub document_type: ApprovalDocumentType,
    /// The gated document.
    pub document_id: Uuid,
    /// The user whose status change triggered the request.
    pub requested_by: Uuid,
    /// The record author. Usually the same user, but automation may
    /// file a request on someone else's behalf.
    pub created_by: Uuid,
    /// Snapshot: approver groups from the matched rule.
    pub approver_group_ids: Vec<Uuid>,
    /// Snapshot: single-user fallback from the matched rule.
    pub approver_id: Option<Uuid>,
}

/// Outcome of a conditional request creation.
#[derive(Debug)]
pub enum CreateOutcome {
    /// A new pending request was inserted.
    Created(ApprovalRequestModel),
    /// A pending request already existed for this document; nothing was
    /// inserted and no notification should be sent.
    AlreadyPending(ApprovalRequestModel),
}

impl CreateOutcome {
    /// The request row, whichever way creation went.
    #[must_use]
    pub const fn request(&self) -> &ApprovalRequestModel {
        match self {
            Self::Created(model) | Self::AlreadyPending(model) => model,
        }
    }

    /// True when this call inserted the row.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Filters for listing approval requests.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    /// Restrict to one document type.
    pub document_type: Option<ApprovalDocumentType>,
    /// Restrict to one status.
    pub status: Option<ApprovalStatus>,
    /// Requests created at or after this instant.
    pub date_from: Option<DateTime<Utc>>,
    /// Requests created before this instant.
    pub date_to: Option<DateTime<Utc>>,
}

/// Repository for approval request operations.
///
/// Runs under the service role: requests are visible to their recipients
/// regardless of which company scope created the gated document, and the
/// engine must read pending state across caller boundaries.
pub struct ApprovalRequestRepository<'a> {
    handle: &'a ServiceRoleHandle,
}

impl<'a> ApprovalRequestRepository<'a> {
    /// Creates a new repository over the service-role handle.
    #[must_use]
    pub const fn new(handle: &'a ServiceRoleHandle) -> Self {
        Self { handle }
    }

    /// Returns true if a pending request exists for the document.
    pub async fn has_pending_approval(
        &self,
        company_id: Uuid,
        document_type: ApprovalDocumentType,
        document_id: Uuid,
    ) -> Result<bool, ApprovalError> {
        let pending = self
            .find_pending(company_id, document_type, document_id)
            .await?;
        Ok(pending.is_some())
    }

    /// Creates a pending request for a document unless one already exists.
    ///
    /// Relies on the partial unique index over pending rows: a concurrent
    /// insert loses with a unique violation, which is mapped to the benign
    /// [`CreateOutcome::AlreadyPending`] holding the row that won.
    pub async fn create_if_absent(
        &self,
        company_id: Uuid,
        input: CreateApprovalRequestInput,
    ) -> Result<CreateOutcome, ApprovalError> {
        if let Some(existing) = self
            .find_pending(company_id, input.document_type, input.document_id)
            .await?
        {
            return Ok(CreateOutcome::AlreadyPending(existing));
        }

        let now = Utc::now();
        let request = ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            document_type: Set(input.document_type.as_str().to_string()),
            document_id: Set(input.document_id),
            status: Set(ApprovalStatus::Pending.as_str().to_string()),
            requested_by: Set(input.requested_by),
            created_by: Set(input.created_by),
            approver_group_ids: Set(input.approver_group_ids),
            approver_id: Set(input.approver_id),
            decision_notes: Set(None),
            decided_at: Set(None),
            decided_by: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match request.insert(self.handle.connection()).await {
            Ok(model) => {
                info!(
                    request_id = %model.id,
                    document_type = %model.document_type,
                    document_id = %model.document_id,
                    "Approval request created"
                );
                Ok(CreateOutcome::Created(model))
            }
            // Lost the race against a concurrent trigger; the other
            // insert's pending row is the canonical one.
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                let existing = self
                    .find_pending(company_id, input.document_type, input.document_id)
                    .await?
                    .ok_or_else(|| ApprovalError::Database(err.to_string()))?;
                Ok(CreateOutcome::AlreadyPending(existing))
            }
            Err(err) => Err(ApprovalError::Database(err.to_string())),
        }
    }

    /// Applies an approve/reject decision to a pending request.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::IllegalTransition` if the request is
    /// already terminal, `RequestNotFound` if it does not exist.
    pub async fn decide(
        &self,
        company_id: Uuid,
        request_id: Uuid,
        decision: ApprovalDecision,
        decided_by: Uuid,
        decision_notes: Option<String>,
    ) -> Result<ApprovalRequestModel, ApprovalError> {
        let existing = self.get_request(company_id, request_id).await?;
        let current = parse_status(&existing.status)?;

        let action = ApprovalLifecycle::decide(current, decision, decided_by, decision_notes)?;

        let mut request: ActiveModel = existing.into();
        request.status = Set(action.new_status.as_str().to_string());
        request.decided_by = Set(Some(action.decided_by));
        request.decided_at = Set(Some(action.decided_at.into()));
        request.decision_notes = Set(action.decision_notes);
        request.updated_at = Set(Utc::now().into());

        let updated = request
            .update(self.handle.connection())
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        info!(
            request_id = %updated.id,
            status = %updated.status,
            decided_by = %decided_by,
            "Approval request decided"
        );

        Ok(updated)
    }

    /// Cancels a pending request, e.g. when the gated document is deleted
    /// or withdrawn before a decision.
    pub async fn cancel(
        &self,
        company_id: Uuid,
        request_id: Uuid,
        cancelled_by: Uuid,
    ) -> Result<ApprovalRequestModel, ApprovalError> {
        let existing = self.get_request(company_id, request_id).await?;
        let current = parse_status(&existing.status)?;

        let new_status = ApprovalLifecycle::cancel(current)?;

        let mut request: ActiveModel = existing.into();
        request.status = Set(new_status.as_str().to_string());
        request.decided_by = Set(Some(cancelled_by));
        request.decided_at = Set(Some(Utc::now().into()));
        request.updated_at = Set(Utc::now().into());

        let updated = request
            .update(self.handle.connection())
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?;

        info!(request_id = %updated.id, "Approval request cancelled");

        Ok(updated)
    }

    /// Gets a specific approval request by ID.
    pub async fn get_request(
        &self,
        company_id: Uuid,
        request_id: Uuid,
    ) -> Result<ApprovalRequestModel, ApprovalError> {
        ApprovalRequestEntity::find_by_id(request_id)
            .filter(approval_requests::Column::CompanyId.eq(company_id))
            .one(self.handle.connection())
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))?
            .ok_or(ApprovalError::RequestNotFound(request_id))
    }

    /// Lists approval requests for a company, newest first.
    pub async fn list(
        &self,
        company_id: Uuid,
        filter: &RequestFilter,
    ) -> Result<Vec<ApprovalRequestModel>, ApprovalError> {
        let mut query = ApprovalRequestEntity::find()
            .filter(approval_requests::Column::CompanyId.eq(company_id));

        if let Some(document_type) = filter.document_type {
            query = query
                .filter(approval_requests::Column::DocumentType.eq(document_type.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(approval_requests::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(approval_requests::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(approval_requests::Column::CreatedAt.lt(to));
        }

        query
            .order_by_desc(approval_requests::Column::CreatedAt)
            .all(self.handle.connection())
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))
    }

    /// Returns the most recent request for a document, regardless of
    /// status. The activation trigger uses this to honor blocking rules:
    /// a blocking gate only opens once the latest request is Approved.
    pub async fn latest_for_document(
        &self,
        company_id: Uuid,
        document_type: ApprovalDocumentType,
        document_id: Uuid,
    ) -> Result<Option<ApprovalRequestModel>, ApprovalError> {
        ApprovalRequestEntity::find()
            .filter(approval_requests::Column::CompanyId.eq(company_id))
            .filter(approval_requests::Column::DocumentType.eq(document_type.as_str()))
            .filter(approval_requests::Column::DocumentId.eq(document_id))
            .order_by_desc(approval_requests::Column::CreatedAt)
            .one(self.handle.connection())
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))
    }

    async fn find_pending(
        &self,
        company_id: Uuid,
        document_type: ApprovalDocumentType,
        document_id: Uuid,
    ) -> Result<Option<ApprovalRequestModel>, ApprovalError> {
        ApprovalRequestEntity::find()
            .filter(approval_requests::Column::CompanyId.eq(company_id))
            .filter(approval_requests::Column::DocumentType.eq(document_type.as_str()))
            .filter(approval_requests::Column::DocumentId.eq(document_id))
            .filter(approval_requests::Column::Status.eq(ApprovalStatus::Pending.as_str()))
            .one(self.handle.connection())
            .await
            .map_err(|e| ApprovalError::Database(e.to_string()))
    }
}

fn parse_status(raw: &str) -> Result<ApprovalStatus, ApprovalError> {
    ApprovalStatus::parse(raw)
        .ok_or_else(|| ApprovalError::Validation(format!("Unknown approval status: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_known_and_unknown() {
        assert_eq!(parse_status("pending").unwrap(), ApprovalStatus::Pending);
        assert!(matches!(
            parse_status("archived"),
            Err(ApprovalError::Validation(_))
        ));
    }

    #[test]
    fn test_create_outcome_accessors() {
        let now = Utc::now();
        let model = ApprovalRequestModel {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            document_type: "qualityDocument".to_string(),
            document_id: Uuid::new_v4(),
            status: "pending".to_string(),
            requested_by: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            approver_group_ids: vec![],
            approver_id: None,
            decision_notes: None,
            decided_at: None,
            decided_by: None,
            created_at: now.into(),
            updated_at: now.into(),
        };

        let created = CreateOutcome::Created(model.clone());
        assert!(created.is_created());
        assert_eq!(created.request().id, model.id);

        let dup = CreateOutcome::AlreadyPending(model.clone());
        assert!(!dup.is_created());
        assert_eq!(dup.request().id, model.id);
    }

    #[test]
    fn test_default_filter_is_unrestricted() {
        let filter = RequestFilter::default();
        assert!(filter.document_type.is_none());
        assert!(filter.status.is_none());
        assert!(filter.date_from.is_none());
        assert!(filter.date_to.is_none());
    }
}
