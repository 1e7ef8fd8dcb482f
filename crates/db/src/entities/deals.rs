//! `SeaORM` Entity for deals table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use comptrack_core::deal::Deal;

use super::sea_orm_active_enums::{DealStatus, ForecastCategory};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub crm_id: Option<String>,
    pub name: String,
    pub amount: Decimal,
    pub close_date: Option<Date>,
    pub status: DealStatus,
    pub forecast_category: Option<ForecastCategory>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_one = "super::commissions::Entity")]
    Commissions,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::commissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Deal {
    fn from(m: Model) -> Self {
        Self {
            id: m.id.into(),
            company_id: m.company_id.into(),
            user_id: m.user_id.into(),
            crm_id: m.crm_id,
            name: m.name,
            amount: m.amount,
            close_date: m.close_date,
            status: m.status.into(),
            forecast_category: m.forecast_category.map(Into::into),
        }
    }
}
