//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - Company-scoped and service-role connection handles

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod service_role;

pub use repositories::{
    ApprovalRequestRepository, ApprovalRuleRepository, DocumentRepository, GroupRepository,
};
pub use service_role::{CompanyConnection, CompanyScopeExt, ServiceRoleHandle};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
