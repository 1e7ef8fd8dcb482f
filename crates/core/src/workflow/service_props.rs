//! Property-based tests for WorkflowService.

use comptrack_shared::types::UserId;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{CommissionStatus, WorkflowAction};

fn arb_status() -> impl Strategy<Value = CommissionStatus> {
    prop::sample::select(CommissionStatus::ALL.to_vec())
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from(Uuid::from_u128(n)))
}

fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 ]{0,80}"
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Every failed transition is either `CannotModifyPaid` (from paid) or an
/// `InvalidTransition` naming the attempted edge.
fn assert_refused(
    result: Result<WorkflowAction, WorkflowError>,
    from: CommissionStatus,
    to: CommissionStatus,
) -> Result<(), TestCaseError> {
    match result {
        Err(WorkflowError::CannotModifyPaid) => prop_assert_eq!(from, CommissionStatus::Paid),
        Err(WorkflowError::InvalidTransition { from: f, to: t }) => {
            prop_assert_eq!(f, from);
            prop_assert_eq!(t, to);
        }
        other => prop_assert!(false, "expected refusal, got {:?}", other),
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Submit succeeds exactly from `Calculated`.
    #[test]
    fn prop_submit(status in arb_status(), user in arb_user()) {
        let result = WorkflowService::submit(status, user);
        if status == CommissionStatus::Calculated {
            let action = result.unwrap();
            prop_assert_eq!(action.new_status(), CommissionStatus::PendingReview);
            prop_assert_eq!(action.performed_by(), user);
        } else {
            assert_refused(result, status, CommissionStatus::PendingReview)?;
        }
    }

    /// Approve and reject succeed exactly from `PendingReview`.
    #[test]
    fn prop_review(status in arb_status(), user in arb_user(), reason in arb_reason()) {
        let approve = WorkflowService::approve(status, user, None);
        let reject = WorkflowService::reject(status, user, reason.clone());

        if status == CommissionStatus::PendingReview {
            prop_assert_eq!(approve.unwrap().new_status(), CommissionStatus::Approved);
            let rejected = reject.unwrap();
            prop_assert_eq!(rejected.new_status(), CommissionStatus::Rejected);
            prop_assert_eq!(rejected.notes(), Some(reason));
        } else {
            assert_refused(approve, status, CommissionStatus::Approved)?;
            assert_refused(reject, status, CommissionStatus::Rejected)?;
        }
    }

    /// Adjust succeeds exactly from the editable states and keeps both amounts.
    #[test]
    fn prop_adjust(
        status in arb_status(),
        user in arb_user(),
        previous in arb_amount(),
        new_amount in arb_amount(),
        reason in arb_reason(),
    ) {
        let result = WorkflowService::adjust(status, user, previous, new_amount, reason);
        if status.is_editable() {
            match result.unwrap() {
                WorkflowAction::Adjust { new_status, previous_amount, new_amount: after, .. } => {
                    prop_assert_eq!(new_status, CommissionStatus::Calculated);
                    prop_assert_eq!(previous_amount, previous);
                    prop_assert_eq!(after, new_amount);
                }
                other => prop_assert!(false, "expected Adjust, got {:?}", other),
            }
        } else {
            assert_refused(result, status, CommissionStatus::Calculated)?;
        }
    }

    /// Mark paid succeeds exactly from `Approved`.
    #[test]
    fn prop_mark_paid(status in arb_status(), user in arb_user()) {
        let result = WorkflowService::mark_paid(status, user);
        if status == CommissionStatus::Approved {
            prop_assert_eq!(result.unwrap().new_status(), CommissionStatus::Paid);
        } else {
            assert_refused(result, status, CommissionStatus::Paid)?;
        }
    }

    /// Nothing leaves `Paid`.
    #[test]
    fn prop_paid_is_terminal(to in arb_status()) {
        prop_assert!(!WorkflowService::is_valid_transition(CommissionStatus::Paid, to));
    }

    /// Every action that succeeds produces an edge `is_valid_transition` accepts.
    #[test]
    fn prop_actions_agree_with_transition_table(
        status in arb_status(),
        user in arb_user(),
        amount in arb_amount(),
        reason in arb_reason(),
    ) {
        let attempts = [
            WorkflowService::submit(status, user),
            WorkflowService::approve(status, user, None),
            WorkflowService::reject(status, user, reason.clone()),
            WorkflowService::adjust(status, user, amount, amount, reason.clone()),
            WorkflowService::mark_paid(status, user),
        ];
        for action in attempts.into_iter().flatten() {
            prop_assert!(WorkflowService::is_valid_transition(status, action.new_status()));
        }
    }
}

#[cfg(test)]
mod edge_case_tests {
    use super::*;

    #[test]
    fn test_transition_table_size() {
        let valid = CommissionStatus::ALL
            .iter()
            .flat_map(|from| CommissionStatus::ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| WorkflowService::is_valid_transition(*from, *to))
            .count();
        // submit, approve, reject, adjust x2, mark paid
        assert_eq!(valid, 6);
    }

    #[test]
    fn test_reject_tab_only_reason_fails() {
        let result =
            WorkflowService::reject(CommissionStatus::PendingReview, UserId::new(), "\t\t".into());
        assert!(matches!(result, Err(WorkflowError::RejectionReasonRequired)));
    }
}
