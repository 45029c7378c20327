//! `SeaORM` Entity for the approval_requests table.
//!
//! The recipient set (`approver_group_ids` / `approver_id`) is a snapshot
//! taken at creation time; later rule edits never change who can decide an
//! already-created request.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub document_type: String,
    pub document_id: Uuid,
    pub status: String,
    pub requested_by: Uuid,
    pub created_by: Uuid,
    pub approver_group_ids: Vec<Uuid>,
    pub approver_id: Option<Uuid>,
    pub decision_notes: Option<String>,
    pub decided_at: Option<DateTimeWithTimeZone>,
    pub decided_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
