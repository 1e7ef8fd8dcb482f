//! Target error types.

use comptrack_shared::types::{TargetId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while creating, splitting, or deactivating targets.
#[derive(Debug, Error)]
pub enum TargetError {
    /// Target not found.
    #[error("Target not found: {0}")]
    NotFound(TargetId),

    /// The target's user does not exist in the company.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Neither a user nor a role was given.
    #[error("A target needs a user or a role")]
    MissingScope,

    /// Period end precedes its start, or the dates cannot be represented.
    #[error("Invalid target period")]
    InvalidPeriod,

    /// Quota is negative.
    #[error("Quota amount cannot be negative: {0}")]
    NegativeQuota(Decimal),

    /// Commission rate is outside `[0, 1]`.
    #[error("Commission rate must be between 0 and 1, got {0}")]
    InvalidRate(Decimal),

    /// An active target of the same type already covers part of the period.
    #[error("Overlaps active target {existing}")]
    Overlap {
        /// The target already covering the period.
        existing: TargetId,
    },

    /// Only annual targets can be split into quarters.
    #[error("Only annual targets can be split, target {0} is not annual")]
    NotAnnual(TargetId),

    /// The target has already been split.
    #[error("Target {0} already has active children")]
    AlreadySplit(TargetId),

    /// Operation needs an active target.
    #[error("Target {0} is inactive")]
    Inactive(TargetId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl TargetError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingScope
            | Self::InvalidPeriod
            | Self::NegativeQuota(_)
            | Self::InvalidRate(_) => 400,
            Self::NotFound(_) | Self::UserNotFound(_) => 404,
            Self::Overlap { .. } | Self::AlreadySplit(_) => 409,
            Self::NotAnnual(_) | Self::Inactive(_) => 422,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "TARGET_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::MissingScope => "TARGET_SCOPE_REQUIRED",
            Self::InvalidPeriod => "INVALID_PERIOD",
            Self::NegativeQuota(_) => "NEGATIVE_QUOTA",
            Self::InvalidRate(_) => "INVALID_COMMISSION_RATE",
            Self::Overlap { .. } => "TARGET_OVERLAP",
            Self::NotAnnual(_) => "TARGET_NOT_ANNUAL",
            Self::AlreadySplit(_) => "TARGET_ALREADY_SPLIT",
            Self::Inactive(_) => "TARGET_INACTIVE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_conflict() {
        let err = TargetError::Overlap {
            existing: TargetId::new(),
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "TARGET_OVERLAP");
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let err = TargetError::UserNotFound(UserId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "USER_NOT_FOUND");
    }

    #[test]
    fn test_invalid_rate_message() {
        let err = TargetError::InvalidRate(Decimal::new(15, 1));
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("1.5"));
    }
}
