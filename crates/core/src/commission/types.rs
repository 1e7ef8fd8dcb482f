//! Commission value types.

use chrono::NaiveDate;
use comptrack_shared::types::{CommissionId, CompanyId, DealId, TargetId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::Period;

/// Which aggregate row a period summary represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionKind {
    /// Built from closed-won deals.
    Actual,
    /// Built from open deals weighted by forecast category.
    Projected,
}

impl CommissionKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Actual => "actual",
            Self::Projected => "projected",
        }
    }
}

/// Commission owed on one closed-won deal, snapshotting the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCommission {
    /// Deal the commission is for.
    pub deal_id: DealId,
    /// Deal owner and payee.
    pub user_id: UserId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Target whose rate was applied.
    pub target_id: TargetId,
    /// Deal amount at calculation time.
    pub deal_amount: Decimal,
    /// Rate at calculation time.
    pub commission_rate: Decimal,
    /// Rounded payout.
    pub commission_amount: Decimal,
    /// Close date the target was resolved for.
    pub close_date: NaiveDate,
    /// Period of the applied target.
    pub period: Period,
}

/// Why no commission was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No active target covers the close date for this user or their role.
    NoTarget {
        /// Deal owner.
        user_id: UserId,
        /// Close date that was looked up.
        date: NaiveDate,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTarget { user_id, date } => {
                write!(f, "no active target for user {user_id} on {date}")
            }
        }
    }
}

/// Result of trying to calculate a deal's commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CalculationOutcome {
    /// A commission was computed.
    Calculated(DealCommission),
    /// Nothing to pay, with the reason.
    Skipped {
        /// Why the deal was skipped.
        reason: SkipReason,
    },
    /// The deal's amount, owner, and close date match the stored commission,
    /// so the stored amount (including any adjustment) was kept.
    Unchanged {
        /// The stored commission.
        commission_id: CommissionId,
        /// Its current amount.
        commission_amount: Decimal,
    },
}

impl CalculationOutcome {
    /// Returns the commission if one was calculated.
    #[must_use]
    pub fn commission(&self) -> Option<&DealCommission> {
        match self {
            Self::Calculated(c) => Some(c),
            Self::Skipped { .. } | Self::Unchanged { .. } => None,
        }
    }
}
