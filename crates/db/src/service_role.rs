//! Connection handles for the two trust levels the engine deals with.
//!
//! Company-scoped access runs caller queries under a `PostgreSQL` RLS
//! context (`app.current_company_id`), while the approval engine's stores
//! run under the service role, which the RLS policies exempt. The two are
//! separate types so an elevated handle can never be passed where a
//! caller-scoped one is expected, and vice versa.

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use uuid::Uuid;

/// A transaction scoped to one company via the RLS session variable.
///
/// Queries executed through [`CompanyConnection::transaction`] are subject
/// to the row-level security policies for the company set at creation.
pub struct CompanyConnection {
    txn: DatabaseTransaction,
}

impl CompanyConnection {
    /// Begins a transaction and sets `app.current_company_id` with
    /// `SET LOCAL`, scoping the RLS context to this transaction only.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn new(db: &DatabaseConnection, company_id: Uuid) -> Result<Self, DbErr> {
        let txn = db.begin().await?;

        // Uuid formats to a fixed hyphenated form, safe to inline.
        let sql = format!("SET LOCAL app.current_company_id = '{company_id}'");
        txn.execute_unprepared(&sql).await?;

        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for `DatabaseConnection` to create company-scoped
/// connections.
#[async_trait::async_trait]
pub trait CompanyScopeExt {
    /// Creates a company-scoped connection with the given RLS context.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be created.
    async fn with_company(&self, company_id: Uuid) -> Result<CompanyConnection, DbErr>;
}

#[async_trait::async_trait]
impl CompanyScopeExt for DatabaseConnection {
    async fn with_company(&self, company_id: Uuid) -> Result<CompanyConnection, DbErr> {
        CompanyConnection::new(self, company_id).await
    }
}

/// The elevated credential the approval engine's stores run under.
///
/// Wraps the pooled connection authenticated as the service role, which
/// the RLS policies exempt. Repositories that must read or write approval
/// state across the caller's row-level boundary take this handle
/// explicitly; they never accept a plain `DatabaseConnection`.
#[derive(Debug, Clone)]
pub struct ServiceRoleHandle {
    db: DatabaseConnection,
}

impl ServiceRoleHandle {
    /// Wraps a connection authenticated as the service role.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rls_context_sql_format() {
        let company_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let sql = format!("SET LOCAL app.current_company_id = '{company_id}'");
        assert_eq!(
            sql,
            "SET LOCAL app.current_company_id = '550e8400-e29b-41d4-a716-446655440000'"
        );
    }
}
