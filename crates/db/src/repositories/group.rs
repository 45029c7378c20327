//! Group repository.
//!
//! Serves the approver directory used by the settings surface when
//! picking approver groups for a rule. Customer and supplier org-linked
//! groups mirror external parties and never appear in the directory.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::groups::{self, Entity as GroupEntity, Model as GroupModel};
use crate::service_role::CompanyConnection;

/// Repository for group lookups.
pub struct GroupRepository<'a> {
    conn: &'a CompanyConnection,
}

impl<'a> GroupRepository<'a> {
    /// Creates a new repository over a company-scoped connection.
    #[must_use]
    pub const fn new(conn: &'a CompanyConnection) -> Self {
        Self { conn }
    }

    /// Lists the company's internal groups, alphabetically.
    pub async fn list_approver_groups(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<GroupModel>, sea_orm::DbErr> {
        GroupEntity::find()
            .filter(groups::Column::CompanyId.eq(company_id))
            .filter(groups::Column::IsCustomerOrgGroup.eq(false))
            .filter(groups::Column::IsSupplierOrgGroup.eq(false))
            .order_by_asc(groups::Column::Name)
            .all(self.conn.transaction())
            .await
    }
}
