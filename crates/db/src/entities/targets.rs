//! `SeaORM` Entity for targets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use comptrack_core::period::Period;
use comptrack_core::target::Target;

use super::sea_orm_active_enums::PeriodType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "targets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    pub role: Option<String>,
    pub period_type: PeriodType,
    pub period_start: Date,
    pub period_end: Date,
    pub quota_amount: Decimal,
    pub commission_rate: Decimal,
    pub is_active: bool,
    pub parent_target_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentTargetId",
        to = "Column::Id"
    )]
    Parent,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Target {
    fn from(m: Model) -> Self {
        Self {
            id: m.id.into(),
            company_id: m.company_id.into(),
            user_id: m.user_id.map(Into::into),
            role: m.role,
            period: Period {
                period_type: m.period_type.into(),
                start: m.period_start,
                end: m.period_end,
            },
            quota_amount: m.quota_amount,
            commission_rate: m.commission_rate,
            is_active: m.is_active,
            parent_target_id: m.parent_target_id.map(Into::into),
        }
    }
}
