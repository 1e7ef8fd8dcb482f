//! Workflow error types for the commission lifecycle.

use comptrack_shared::types::{CommissionId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::workflow::types::{ApprovalAction, CommissionStatus};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: CommissionStatus,
        /// The attempted target status.
        to: CommissionStatus,
    },

    /// Attempted to modify a paid commission.
    #[error("Cannot modify paid commission")]
    CannotModifyPaid,

    /// The user may not perform this action on this commission.
    #[error("User {user_id} is not authorized to {action} this commission")]
    NotAuthorized {
        /// The user who attempted the action.
        user_id: UserId,
        /// The attempted action.
        action: ApprovalAction,
    },

    /// Reviewer and commission owner are the same person.
    #[error("Cannot review your own commission")]
    SelfApproval,

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Adjustment reason is required but not provided.
    #[error("Adjustment reason is required")]
    AdjustmentReasonRequired,

    /// Adjusted amount is negative.
    #[error("Adjusted amount cannot be negative: {0}")]
    NegativeAdjustment(Decimal),

    /// Commission not found.
    #[error("Commission {0} not found")]
    CommissionNotFound(CommissionId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::CannotModifyPaid
            | Self::RejectionReasonRequired
            | Self::AdjustmentReasonRequired
            | Self::NegativeAdjustment(_) => 400,

            Self::NotAuthorized { .. } | Self::SelfApproval => 403,

            Self::CommissionNotFound(_) => 404,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::CannotModifyPaid => "CANNOT_MODIFY_PAID",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::SelfApproval => "SELF_APPROVAL_FORBIDDEN",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::AdjustmentReasonRequired => "ADJUSTMENT_REASON_REQUIRED",
            Self::NegativeAdjustment(_) => "NEGATIVE_ADJUSTMENT",
            Self::CommissionNotFound(_) => "COMMISSION_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = WorkflowError::InvalidTransition {
            from: CommissionStatus::Calculated,
            to: CommissionStatus::Paid,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("calculated"));
        assert!(err.to_string().contains("paid"));
    }

    #[test]
    fn test_not_authorized_error() {
        let err = WorkflowError::NotAuthorized {
            user_id: UserId::new(),
            action: ApprovalAction::Approve,
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "NOT_AUTHORIZED");
        assert!(err.to_string().contains("approve"));
    }

    #[test]
    fn test_self_approval_error() {
        assert_eq!(WorkflowError::SelfApproval.status_code(), 403);
        assert_eq!(
            WorkflowError::SelfApproval.error_code(),
            "SELF_APPROVAL_FORBIDDEN"
        );
    }

    #[test]
    fn test_not_found_error() {
        let err = WorkflowError::CommissionNotFound(CommissionId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "COMMISSION_NOT_FOUND");
    }
}
