//! Approval error types.
//!
//! Expected negative outcomes (no matching rule, no pending request,
//! duplicate pending request) are NOT errors; they are represented as
//! `None` / `false` / benign no-op results by the callers.

use thiserror::Error;
use uuid::Uuid;

use crate::approvals::types::ApprovalStatus;

/// Errors that can occur during approval operations.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Attempted an illegal status transition (e.g. deciding a request
    /// that is already terminal).
    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition {
        /// The current status.
        from: ApprovalStatus,
        /// The attempted target status.
        to: ApprovalStatus,
    },

    /// Approval request not found.
    #[error("Approval request {0} not found")]
    RequestNotFound(Uuid),

    /// Approval rule not found.
    #[error("Approval rule {0} not found")]
    RuleNotFound(Uuid),

    /// Malformed input to a rule or request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rule bounds do not form a valid band.
    #[error("Invalid amount range: lower bound {lower} must be below upper bound {upper}")]
    InvalidAmountRange {
        /// Inclusive lower bound.
        lower: rust_decimal::Decimal,
        /// Exclusive upper bound.
        upper: rust_decimal::Decimal,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::IllegalTransition { .. }
            | Self::Validation(_)
            | Self::InvalidAmountRange { .. } => 400,
            Self::RequestNotFound(_) | Self::RuleNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidAmountRange { .. } => "INVALID_AMOUNT_RANGE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_illegal_transition_error() {
        let err = ApprovalError::IllegalTransition {
            from: ApprovalStatus::Approved,
            to: ApprovalStatus::Rejected,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "ILLEGAL_TRANSITION");
        assert!(err.to_string().contains("approved"));
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn test_not_found_errors() {
        let err = ApprovalError::RequestNotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "REQUEST_NOT_FOUND");

        let err = ApprovalError::RuleNotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "RULE_NOT_FOUND");
    }

    #[test]
    fn test_invalid_amount_range_error() {
        let err = ApprovalError::InvalidAmountRange {
            lower: dec!(100),
            upper: dec!(50),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_AMOUNT_RANGE");
    }

    #[test]
    fn test_database_error() {
        let err = ApprovalError::Database("connection reset".to_string());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
