//! Approval domain types.
//!
//! This module defines the core types used for managing approval request
//! status transitions and the documents that can require approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Status of an approval request.
///
/// A request starts Pending and moves exactly once:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
/// - Pending → Cancelled (cancel)
///
/// Approved, Rejected, and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting a decision.
    Pending,
    /// Decided: approved.
    Approved,
    /// Decided: rejected.
    Rejected,
    /// Withdrawn before a decision was made.
    Cancelled,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The category of business record that can require approval.
///
/// Only purchase orders carry a monetary amount dimension; quality document
/// rules ignore amount bands entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalDocumentType {
    /// Purchase order, banded by order total.
    PurchaseOrder,
    /// Quality document, no amount dimension.
    QualityDocument,
}

impl ApprovalDocumentType {
    /// Returns the string representation of the document type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseOrder => "purchaseOrder",
            Self::QualityDocument => "qualityDocument",
        }
    }

    /// Parses a document type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchaseOrder" => Some(Self::PurchaseOrder),
            "qualityDocument" => Some(Self::QualityDocument),
            _ => None,
        }
    }

    /// Returns true if rules for this document type match on amount bands.
    #[must_use]
    pub const fn has_amount_dimension(&self) -> bool {
        matches!(self, Self::PurchaseOrder)
    }
}

impl fmt::Display for ApprovalDocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decision on a pending approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    /// Approve the request.
    Approved,
    /// Reject the request.
    Rejected,
}

impl ApprovalDecision {
    /// Returns the status a request moves to under this decision.
    #[must_use]
    pub const fn as_status(&self) -> ApprovalStatus {
        match self {
            Self::Approved => ApprovalStatus::Approved,
            Self::Rejected => ApprovalStatus::Rejected,
        }
    }

    /// Parses a decision from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A validated decision transition with audit data.
///
/// Captures the resulting status and the audit trail (who, when, notes)
/// for the persistence layer to apply.
#[derive(Debug, Clone)]
pub struct DecisionAction {
    /// The new status after the decision.
    pub new_status: ApprovalStatus,
    /// The user who decided.
    pub decided_by: Uuid,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
    /// Optional notes from the decider.
    pub decision_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(ApprovalStatus::Pending.as_str(), "pending");
        assert_eq!(ApprovalStatus::Approved.as_str(), "approved");
        assert_eq!(ApprovalStatus::Rejected.as_str(), "rejected");
        assert_eq!(ApprovalStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ApprovalStatus::parse("pending"), Some(ApprovalStatus::Pending));
        assert_eq!(ApprovalStatus::parse("APPROVED"), Some(ApprovalStatus::Approved));
        assert_eq!(ApprovalStatus::parse("Rejected"), Some(ApprovalStatus::Rejected));
        assert_eq!(ApprovalStatus::parse("cancelled"), Some(ApprovalStatus::Cancelled));
        assert_eq!(ApprovalStatus::parse("invalid"), None);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
        assert!(ApprovalStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_document_type_round_trip() {
        assert_eq!(
            ApprovalDocumentType::parse("purchaseOrder"),
            Some(ApprovalDocumentType::PurchaseOrder)
        );
        assert_eq!(
            ApprovalDocumentType::parse("qualityDocument"),
            Some(ApprovalDocumentType::QualityDocument)
        );
        assert_eq!(ApprovalDocumentType::parse("invoice"), None);
        assert_eq!(ApprovalDocumentType::PurchaseOrder.as_str(), "purchaseOrder");
    }

    #[test]
    fn test_amount_dimension_policy() {
        assert!(ApprovalDocumentType::PurchaseOrder.has_amount_dimension());
        assert!(!ApprovalDocumentType::QualityDocument.has_amount_dimension());
    }

    #[test]
    fn test_decision_to_status() {
        assert_eq!(ApprovalDecision::Approved.as_status(), ApprovalStatus::Approved);
        assert_eq!(ApprovalDecision::Rejected.as_status(), ApprovalStatus::Rejected);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", ApprovalStatus::Pending), "pending");
        assert_eq!(format!("{}", ApprovalDocumentType::QualityDocument), "qualityDocument");
    }
}
