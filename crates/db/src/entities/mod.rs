//! `SeaORM` entity definitions.

pub mod approval_requests;
pub mod approval_rules;
pub mod groups;
pub mod purchase_orders;
pub mod quality_documents;
