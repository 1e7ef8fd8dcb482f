//! `SeaORM` entities.

pub mod commission_approvals;
pub mod commission_periods;
pub mod commissions;
pub mod companies;
pub mod deals;
pub mod sea_orm_active_enums;
pub mod targets;
pub mod users;
