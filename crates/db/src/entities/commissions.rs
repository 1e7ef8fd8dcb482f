//! `SeaORM` Entity for commissions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CommissionStatus, PeriodType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub deal_id: Uuid,
    pub target_id: Option<Uuid>,
    pub deal_amount: Decimal,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub close_date: Date,
    pub period_type: PeriodType,
    pub period_start: Date,
    pub period_end: Date,
    pub status: CommissionStatus,
    pub calculated_at: DateTimeWithTimeZone,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deals::Entity",
        from = "Column::DealId",
        to = "super::deals::Column::Id"
    )]
    Deals,
    #[sea_orm(has_many = "super::commission_approvals::Entity")]
    CommissionApprovals,
}

impl Related<super::deals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deals.def()
    }
}

impl Related<super::commission_approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommissionApprovals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
