//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Approval stores take a [`crate::ServiceRoleHandle`];
//! caller-scoped reads and document writes go through a
//! [`crate::CompanyConnection`].

pub mod approval_request;
pub mod approval_rule;
pub mod document;
pub mod group;

pub use approval_request::{
    ApprovalRequestRepository, CreateApprovalRequestInput, CreateOutcome, RequestFilter,
};
pub use approval_rule::{ApprovalRuleError, ApprovalRuleRepository, UpsertApprovalRuleInput};
pub use document::{
    DocumentError, DocumentRepository, DocumentStatus, GatedDocument, PurchaseOrderStatus,
    QualityDocumentStatus,
};
pub use group::GroupRepository;
