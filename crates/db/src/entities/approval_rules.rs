//! `SeaORM` Entity for the approval_rules table.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub document_type: String,
    pub enabled: bool,
    pub approver_group_ids: Vec<Uuid>,
    pub default_approver_id: Option<Uuid>,
    pub lower_bound_amount: Decimal,
    pub upper_bound_amount: Option<Decimal>,
    pub escalation_days: Option<i32>,
    pub blocking: bool,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
