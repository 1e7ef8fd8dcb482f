//! Postgres enum types and their conversions to the core domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use comptrack_core::auth::SalesRole;
use comptrack_core::commission::CommissionKind as CoreCommissionKind;
use comptrack_core::deal::{DealStatus as CoreDealStatus, ForecastCategory as CoreForecastCategory};
use comptrack_core::period::PeriodType as CorePeriodType;
use comptrack_core::workflow::{
    ApprovalAction as CoreApprovalAction, CommissionStatus as CoreCommissionStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "sales_rep")]
    SalesRep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_type")]
pub enum PeriodType {
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "annual")]
    Annual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "deal_status")]
pub enum DealStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed_won")]
    ClosedWon,
    #[sea_orm(string_value = "closed_lost")]
    ClosedLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "forecast_category")]
pub enum ForecastCategory {
    #[sea_orm(string_value = "pipeline")]
    Pipeline,
    #[sea_orm(string_value = "best_case")]
    BestCase,
    #[sea_orm(string_value = "commit")]
    Commit,
    #[sea_orm(string_value = "omitted")]
    Omitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "commission_status")]
pub enum CommissionStatus {
    #[sea_orm(string_value = "calculated")]
    Calculated,
    #[sea_orm(string_value = "pending_review")]
    PendingReview,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "commission_kind")]
pub enum CommissionKind {
    #[sea_orm(string_value = "actual")]
    Actual,
    #[sea_orm(string_value = "projected")]
    Projected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_action")]
pub enum ApprovalAction {
    #[sea_orm(string_value = "calculate")]
    Calculate,
    #[sea_orm(string_value = "recalculate")]
    Recalculate,
    #[sea_orm(string_value = "submit")]
    Submit,
    #[sea_orm(string_value = "approve")]
    Approve,
    #[sea_orm(string_value = "reject")]
    Reject,
    #[sea_orm(string_value = "adjust")]
    Adjust,
    #[sea_orm(string_value = "mark_paid")]
    MarkPaid,
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Generates `From` impls in both directions between a db enum and its
/// core counterpart with identically named variants.
macro_rules! mirror_enum {
    ($db:ident, $core:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $(<$core>::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(UserRole, SalesRole, [Admin, Manager, SalesRep]);
mirror_enum!(PeriodType, CorePeriodType, [Monthly, Quarterly, Annual]);
mirror_enum!(DealStatus, CoreDealStatus, [Open, ClosedWon, ClosedLost]);
mirror_enum!(
    ForecastCategory,
    CoreForecastCategory,
    [Pipeline, BestCase, Commit, Omitted]
);
mirror_enum!(
    CommissionStatus,
    CoreCommissionStatus,
    [Calculated, PendingReview, Approved, Rejected, Paid]
);
mirror_enum!(CommissionKind, CoreCommissionKind, [Actual, Projected]);
mirror_enum!(
    ApprovalAction,
    CoreApprovalAction,
    [Calculate, Recalculate, Submit, Approve, Reject, Adjust, MarkPaid]
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_status_round_trip() {
        for status in CoreCommissionStatus::ALL {
            let db: CommissionStatus = status.into();
            assert_eq!(CoreCommissionStatus::from(db), status);
        }
    }

    #[test]
    fn test_string_values_match_core() {
        assert_eq!(
            CommissionStatus::PendingReview.to_value(),
            CoreCommissionStatus::PendingReview.as_str()
        );
        assert_eq!(
            ForecastCategory::BestCase.to_value(),
            CoreForecastCategory::BestCase.as_str()
        );
        assert_eq!(ApprovalAction::MarkPaid.to_value(), "mark_paid");
        assert_eq!(UserRole::SalesRep.to_value(), SalesRole::SalesRep.as_str());
    }
}
