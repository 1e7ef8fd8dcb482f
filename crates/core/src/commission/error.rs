//! Commission calculation errors.

use comptrack_shared::types::{CommissionId, DealId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::deal::DealStatus;
use crate::workflow::CommissionStatus;

/// Errors raised while calculating or recalculating commissions.
#[derive(Debug, Error)]
pub enum CommissionError {
    /// Only closed-won deals earn commission.
    #[error("Deal {deal_id} is {status}, only closed-won deals earn commission")]
    DealNotWon {
        /// The deal.
        deal_id: DealId,
        /// Its current status.
        status: DealStatus,
    },

    /// A closed-won deal without a close date.
    #[error("Deal {0} has no close date")]
    MissingCloseDate(DealId),

    /// Deal amount is negative.
    #[error("Deal amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    /// Commission rate is outside `[0, 1]`.
    #[error("Commission rate must be between 0 and 1, got {0}")]
    InvalidRate(Decimal),

    /// Deal not found.
    #[error("Deal not found: {0}")]
    DealNotFound(DealId),

    /// Commission not found.
    #[error("Commission not found: {0}")]
    NotFound(CommissionId),

    /// The user does not exist in the company.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// The commission has left the editable states.
    #[error("Commission {id} is {status} and can no longer be recalculated")]
    NotEditable {
        /// The commission.
        id: CommissionId,
        /// Its current status.
        status: CommissionStatus,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl CommissionError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NegativeAmount(_) | Self::InvalidRate(_) => 400,
            Self::DealNotFound(_) | Self::NotFound(_) | Self::UserNotFound(_) => 404,
            Self::NotEditable { .. } => 409,
            Self::DealNotWon { .. } | Self::MissingCloseDate(_) => 422,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DealNotWon { .. } => "DEAL_NOT_CLOSED_WON",
            Self::MissingCloseDate(_) => "MISSING_CLOSE_DATE",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::InvalidRate(_) => "INVALID_COMMISSION_RATE",
            Self::DealNotFound(_) => "DEAL_NOT_FOUND",
            Self::NotFound(_) => "COMMISSION_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::NotEditable { .. } => "COMMISSION_NOT_EDITABLE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
