//! Gated document repository.
//!
//! Reads and writes the two document types whose status transitions the
//! approval engine gates. Unlike the approval stores, this repository runs
//! inside the caller's company-scoped transaction: a user can only touch
//! documents their row-level scope exposes.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use fabriq_core::approvals::ApprovalDocumentType;

use crate::entities::purchase_orders::{
    self, Entity as PurchaseOrderEntity, Model as PurchaseOrderModel,
};
use crate::entities::quality_documents::{
    self, Entity as QualityDocumentEntity, Model as QualityDocumentModel,
};
use crate::service_role::CompanyConnection;

/// Errors that can occur during document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document not found (or outside the caller's scope).
    #[error("Document {0} not found")]
    NotFound(Uuid),

    /// A stored or requested status string is not valid for the type.
    #[error("Invalid status '{status}' for {document_type}")]
    InvalidStatus {
        /// The offending status string.
        status: String,
        /// The document type it was used with.
        document_type: ApprovalDocumentType,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Lifecycle states of a quality document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityDocumentStatus {
    /// Being edited, not yet in force.
    Draft,
    /// In force.
    Active,
    /// Superseded or retired.
    Archived,
}

impl QualityDocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// True when moving into this status requires an approval check.
    /// Activation is the gated transition; archiving is not.
    #[must_use]
    pub const fn is_gated_target(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// True for the editable pre-activation state.
    #[must_use]
    pub const fn is_draft(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for QualityDocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle states of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOrderStatus {
    /// Being assembled.
    Draft,
    /// Submitted, awaiting review or approval.
    ToReview,
    /// Released for ordering.
    Approved,
    /// Sent back to the requester.
    Rejected,
}

impl PurchaseOrderStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ToReview => "toReview",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "toReview" => Some(Self::ToReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// True when moving into this status requires an approval check.
    /// Submission for review is the gated transition.
    #[must_use]
    pub const fn is_gated_target(&self) -> bool {
        matches!(self, Self::ToReview)
    }

    /// True for the editable pre-submission state.
    #[must_use]
    pub const fn is_draft(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document status for either gated type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Quality document status.
    QualityDocument(QualityDocumentStatus),
    /// Purchase order status.
    PurchaseOrder(PurchaseOrderStatus),
}

impl DocumentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::QualityDocument(s) => s.as_str(),
            Self::PurchaseOrder(s) => s.as_str(),
        }
    }

    /// Parses a status string for the given document type.
    pub fn parse(document_type: ApprovalDocumentType, s: &str) -> Option<Self> {
        match document_type {
            ApprovalDocumentType::QualityDocument => {
                QualityDocumentStatus::parse(s).map(Self::QualityDocument)
            }
            ApprovalDocumentType::PurchaseOrder => {
                PurchaseOrderStatus::parse(s).map(Self::PurchaseOrder)
            }
        }
    }

    /// True when moving into this status requires an approval check.
    #[must_use]
    pub const fn is_gated_target(&self) -> bool {
        match self {
            Self::QualityDocument(s) => s.is_gated_target(),
            Self::PurchaseOrder(s) => s.is_gated_target(),
        }
    }

    /// True for the editable pre-activation state.
    #[must_use]
    pub const fn is_draft(&self) -> bool {
        match self {
            Self::QualityDocument(s) => s.is_draft(),
            Self::PurchaseOrder(s) => s.is_draft(),
        }
    }

    /// True when moving from this status into `target` must pass the
    /// approval gate. Only draft documents are gated; re-saving an
    /// already active document never re-opens an approval request.
    #[must_use]
    pub const fn transition_is_gated(&self, target: Self) -> bool {
        self.is_draft() && target.is_gated_target()
    }
}

/// A gated document's fields the approval engine cares about,
/// independent of which table it lives in.
#[derive(Debug, Clone)]
pub struct GatedDocument {
    /// The document's ID.
    pub id: Uuid,
    /// Which table it came from.
    pub document_type: ApprovalDocumentType,
    /// Current lifecycle status.
    pub status: DocumentStatus,
    /// Order total for purchase orders, None for quality documents.
    pub amount: Option<Decimal>,
}

/// Repository for the documents whose transitions the engine gates.
pub struct DocumentRepository<'a> {
    conn: &'a CompanyConnection,
}

impl<'a> DocumentRepository<'a> {
    /// Creates a new repository over a company-scoped connection.
    #[must_use]
    pub const fn new(conn: &'a CompanyConnection) -> Self {
        Self { conn }
    }

    /// Fetches the gate-relevant view of a document.
    pub async fn get_gated(
        &self,
        company_id: Uuid,
        document_type: ApprovalDocumentType,
        document_id: Uuid,
    ) -> Result<GatedDocument, DocumentError> {
        match document_type {
            ApprovalDocumentType::QualityDocument => {
                let doc = self.get_quality_document(company_id, document_id).await?;
                let status = QualityDocumentStatus::parse(&doc.status).ok_or_else(|| {
                    DocumentError::InvalidStatus {
                        status: doc.status.clone(),
                        document_type,
                    }
                })?;
                Ok(GatedDocument {
                    id: doc.id,
                    document_type,
                    status: DocumentStatus::QualityDocument(status),
                    amount: None,
                })
            }
            ApprovalDocumentType::PurchaseOrder => {
                let po = self.get_purchase_order(company_id, document_id).await?;
                let status = PurchaseOrderStatus::parse(&po.status).ok_or_else(|| {
                    DocumentError::InvalidStatus {
                        status: po.status.clone(),
                        document_type,
                    }
                })?;
                Ok(GatedDocument {
                    id: po.id,
                    document_type,
                    status: DocumentStatus::PurchaseOrder(status),
                    amount: Some(po.total_amount),
                })
            }
        }
    }

    /// Gets a quality document by ID.
    pub async fn get_quality_document(
        &self,
        company_id: Uuid,
        document_id: Uuid,
    ) -> Result<QualityDocumentModel, DocumentError> {
        QualityDocumentEntity::find_by_id(document_id)
            .filter(quality_documents::Column::CompanyId.eq(company_id))
            .one(self.conn.transaction())
            .await?
            .ok_or(DocumentError::NotFound(document_id))
    }

    /// Gets a purchase order by ID.
    pub async fn get_purchase_order(
        &self,
        company_id: Uuid,
        document_id: Uuid,
    ) -> Result<PurchaseOrderModel, DocumentError> {
        PurchaseOrderEntity::find_by_id(document_id)
            .filter(purchase_orders::Column::CompanyId.eq(company_id))
            .one(self.conn.transaction())
            .await?
            .ok_or(DocumentError::NotFound(document_id))
    }

    /// Writes a new status onto a document of either type.
    pub async fn update_status(
        &self,
        company_id: Uuid,
        document_id: Uuid,
        status: DocumentStatus,
        actor_id: Uuid,
    ) -> Result<(), DocumentError> {
        let now = Utc::now();
        match status {
            DocumentStatus::QualityDocument(s) => {
                let doc = self.get_quality_document(company_id, document_id).await?;
                let mut active: quality_documents::ActiveModel = doc.into();
                active.status = Set(s.as_str().to_string());
                active.updated_by = Set(Some(actor_id));
                active.updated_at = Set(now.into());
                active.update(self.conn.transaction()).await?;
            }
            DocumentStatus::PurchaseOrder(s) => {
                let po = self.get_purchase_order(company_id, document_id).await?;
                let mut active: purchase_orders::ActiveModel = po.into();
                active.status = Set(s.as_str().to_string());
                active.updated_by = Set(Some(actor_id));
                active.updated_at = Set(now.into());
                active.update(self.conn.transaction()).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_document_status_round_trip() {
        for status in [
            QualityDocumentStatus::Draft,
            QualityDocumentStatus::Active,
            QualityDocumentStatus::Archived,
        ] {
            assert_eq!(QualityDocumentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QualityDocumentStatus::parse("pending"), None);
    }

    #[test]
    fn test_purchase_order_status_round_trip() {
        for status in [
            PurchaseOrderStatus::Draft,
            PurchaseOrderStatus::ToReview,
            PurchaseOrderStatus::Approved,
            PurchaseOrderStatus::Rejected,
        ] {
            assert_eq!(PurchaseOrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PurchaseOrderStatus::parse("active"), None);
    }

    #[test]
    fn test_gated_targets() {
        assert!(QualityDocumentStatus::Active.is_gated_target());
        assert!(!QualityDocumentStatus::Draft.is_gated_target());
        assert!(!QualityDocumentStatus::Archived.is_gated_target());

        assert!(PurchaseOrderStatus::ToReview.is_gated_target());
        assert!(!PurchaseOrderStatus::Draft.is_gated_target());
        assert!(!PurchaseOrderStatus::Approved.is_gated_target());
        assert!(!PurchaseOrderStatus::Rejected.is_gated_target());
    }

    #[test]
    fn test_document_status_parse_is_type_aware() {
        assert_eq!(
            DocumentStatus::parse(ApprovalDocumentType::QualityDocument, "active"),
            Some(DocumentStatus::QualityDocument(QualityDocumentStatus::Active))
        );
        // "toReview" belongs to purchase orders only.
        assert_eq!(
            DocumentStatus::parse(ApprovalDocumentType::QualityDocument, "toReview"),
            None
        );
        assert_eq!(
            DocumentStatus::parse(ApprovalDocumentType::PurchaseOrder, "toReview"),
            Some(DocumentStatus::PurchaseOrder(PurchaseOrderStatus::ToReview))
        );
    }

    #[test]
    fn test_only_draft_documents_are_gated() {
        let qd = DocumentStatus::QualityDocument;
        let po = DocumentStatus::PurchaseOrder;

        // Activation from draft passes through the gate.
        assert!(qd(QualityDocumentStatus::Draft).transition_is_gated(qd(QualityDocumentStatus::Active)));
        assert!(po(PurchaseOrderStatus::Draft).transition_is_gated(po(PurchaseOrderStatus::ToReview)));

        // Re-saving an already active/in-review document must not gate.
        assert!(!qd(QualityDocumentStatus::Active).transition_is_gated(qd(QualityDocumentStatus::Active)));
        assert!(!po(PurchaseOrderStatus::ToReview).transition_is_gated(po(PurchaseOrderStatus::ToReview)));
        assert!(!po(PurchaseOrderStatus::Approved).transition_is_gated(po(PurchaseOrderStatus::ToReview)));

        // Non-gated targets never gate, even from draft.
        assert!(!qd(QualityDocumentStatus::Draft).transition_is_gated(qd(QualityDocumentStatus::Archived)));
        assert!(!qd(QualityDocumentStatus::Archived).transition_is_gated(qd(QualityDocumentStatus::Active)));
    }
}
