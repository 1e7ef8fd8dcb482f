//! State machine for commission workflow transitions.

use chrono::Utc;
use comptrack_shared::types::UserId;
use rust_decimal::Decimal;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{CommissionStatus, WorkflowAction};

/// Stateless service for managing commission workflow transitions.
///
/// All methods are associated functions that validate a transition and
/// return the `WorkflowAction` holding the audit trail information.
/// Authorization is checked separately by
/// [`ApprovalPolicy`](crate::workflow::ApprovalPolicy).
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a calculated commission for review.
    pub fn submit(
        current_status: CommissionStatus,
        submitted_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            CommissionStatus::Calculated => Ok(WorkflowAction::Submit {
                new_status: CommissionStatus::PendingReview,
                submitted_by,
                submitted_at: Utc::now(),
            }),
            other => Err(invalid(other, CommissionStatus::PendingReview)),
        }
    }

    /// Approve a commission under review.
    pub fn approve(
        current_status: CommissionStatus,
        approved_by: UserId,
        approval_notes: Option<String>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            CommissionStatus::PendingReview => Ok(WorkflowAction::Approve {
                new_status: CommissionStatus::Approved,
                approved_by,
                approved_at: Utc::now(),
                approval_notes,
            }),
            other => Err(invalid(other, CommissionStatus::Approved)),
        }
    }

    /// Reject a commission under review.
    ///
    /// # Errors
    ///
    /// `RejectionReasonRequired` if `rejection_reason` is blank, checked
    /// before the status.
    pub fn reject(
        current_status: CommissionStatus,
        rejected_by: UserId,
        rejection_reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if rejection_reason.trim().is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }

        match current_status {
            CommissionStatus::PendingReview => Ok(WorkflowAction::Reject {
                new_status: CommissionStatus::Rejected,
                rejected_by,
                rejected_at: Utc::now(),
                rejection_reason,
            }),
            other => Err(invalid(other, CommissionStatus::Rejected)),
        }
    }

    /// Change the amount of a calculated or rejected commission. The
    /// commission returns to `Calculated` and must be submitted again.
    pub fn adjust(
        current_status: CommissionStatus,
        adjusted_by: UserId,
        previous_amount: Decimal,
        new_amount: Decimal,
        reason: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::AdjustmentReasonRequired);
        }
        if new_amount < Decimal::ZERO {
            return Err(WorkflowError::NegativeAdjustment(new_amount));
        }

        if current_status.is_editable() {
            Ok(WorkflowAction::Adjust {
                new_status: CommissionStatus::Calculated,
                adjusted_by,
                adjusted_at: Utc::now(),
                previous_amount,
                new_amount,
                reason,
            })
        } else {
            Err(invalid(current_status, CommissionStatus::Calculated))
        }
    }

    /// Record payout of an approved commission.
    pub fn mark_paid(
        current_status: CommissionStatus,
        paid_by: UserId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            CommissionStatus::Approved => Ok(WorkflowAction::MarkPaid {
                new_status: CommissionStatus::Paid,
                paid_by,
                paid_at: Utc::now(),
            }),
            other => Err(invalid(other, CommissionStatus::Paid)),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: CommissionStatus, to: CommissionStatus) -> bool {
        matches!(
            (from, to),
            (
                CommissionStatus::Calculated,
                CommissionStatus::PendingReview | CommissionStatus::Calculated
            ) | (
                CommissionStatus::PendingReview,
                CommissionStatus::Approved | CommissionStatus::Rejected
            ) | (CommissionStatus::Rejected, CommissionStatus::Calculated)
                | (CommissionStatus::Approved, CommissionStatus::Paid)
        )
    }
}

fn invalid(from: CommissionStatus, to: CommissionStatus) -> WorkflowError {
    if from.is_immutable() {
        WorkflowError::CannotModifyPaid
    } else {
        WorkflowError::InvalidTransition { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_happy_path() {
        let rep = UserId::new();
        let manager = UserId::new();
        let admin = UserId::new();

        let submitted = WorkflowService::submit(CommissionStatus::Calculated, rep).unwrap();
        assert_eq!(submitted.new_status(), CommissionStatus::PendingReview);

        let approved =
            WorkflowService::approve(submitted.new_status(), manager, Some("ok".into())).unwrap();
        assert_eq!(approved.new_status(), CommissionStatus::Approved);
        assert_eq!(approved.performed_by(), manager);

        let paid = WorkflowService::mark_paid(approved.new_status(), admin).unwrap();
        assert_eq!(paid.new_status(), CommissionStatus::Paid);
    }

    #[test]
    fn test_reject_then_adjust_then_resubmit() {
        let user = UserId::new();
        let rejected = WorkflowService::reject(
            CommissionStatus::PendingReview,
            user,
            "wrong rate".to_string(),
        )
        .unwrap();
        assert_eq!(rejected.new_status(), CommissionStatus::Rejected);

        let adjusted = WorkflowService::adjust(
            rejected.new_status(),
            user,
            dec!(800),
            dec!(600),
            "rate corrected".to_string(),
        )
        .unwrap();
        assert_eq!(adjusted.new_status(), CommissionStatus::Calculated);

        assert!(WorkflowService::submit(adjusted.new_status(), user).is_ok());
    }

    #[test]
    fn test_reject_empty_reason_fails() {
        let result =
            WorkflowService::reject(CommissionStatus::PendingReview, UserId::new(), "  ".into());
        assert!(matches!(result, Err(WorkflowError::RejectionReasonRequired)));
    }

    #[test]
    fn test_adjust_validation() {
        let user = UserId::new();
        assert!(matches!(
            WorkflowService::adjust(CommissionStatus::Calculated, user, dec!(1), dec!(2), String::new()),
            Err(WorkflowError::AdjustmentReasonRequired)
        ));
        assert!(matches!(
            WorkflowService::adjust(CommissionStatus::Calculated, user, dec!(1), dec!(-2), "x".into()),
            Err(WorkflowError::NegativeAdjustment(_))
        ));
        assert!(matches!(
            WorkflowService::adjust(CommissionStatus::Approved, user, dec!(1), dec!(2), "x".into()),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_paid_is_immutable() {
        let user = UserId::new();
        assert!(matches!(
            WorkflowService::mark_paid(CommissionStatus::Paid, user),
            Err(WorkflowError::CannotModifyPaid)
        ));
        assert!(matches!(
            WorkflowService::adjust(CommissionStatus::Paid, user, dec!(1), dec!(0), "x".into()),
            Err(WorkflowError::CannotModifyPaid)
        ));
        assert!(matches!(
            WorkflowService::submit(CommissionStatus::Paid, user),
            Err(WorkflowError::CannotModifyPaid)
        ));
    }

    #[test]
    fn test_is_valid_transition() {
        assert!(WorkflowService::is_valid_transition(
            CommissionStatus::Calculated,
            CommissionStatus::PendingReview
        ));
        assert!(WorkflowService::is_valid_transition(
            CommissionStatus::Rejected,
            CommissionStatus::Calculated
        ));
        assert!(!WorkflowService::is_valid_transition(
            CommissionStatus::Calculated,
            CommissionStatus::Approved
        ));
        assert!(!WorkflowService::is_valid_transition(
            CommissionStatus::Paid,
            CommissionStatus::Calculated
        ));
    }
}
