//! Approval workflow engine for Fabriq.
//!
//! This module implements the rule-driven, amount-banded approval workflow
//! that gates status transitions on business documents.
//!
//! # Modules
//!
//! - `types` - Domain types (ApprovalStatus, ApprovalDocumentType, decisions)
//! - `error` - Approval-specific error types
//! - `rule` - Rule resolution and the approval gate
//! - `lifecycle` - Request state transition logic

pub mod error;
pub mod lifecycle;
pub mod rule;
pub mod types;

#[cfg(test)]
mod lifecycle_props;
#[cfg(test)]
mod rule_props;

pub use error::ApprovalError;
pub use lifecycle::ApprovalLifecycle;
pub use rule::{ApprovalGate, ApprovalRule, RuleResolver, resolve_recipient};
pub use types::{ApprovalDecision, ApprovalDocumentType, ApprovalStatus, DecisionAction};
