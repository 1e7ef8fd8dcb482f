//! Commission workflow states, actions, and audit records.

use chrono::{DateTime, Utc};
use comptrack_shared::types::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Commission status in the approval workflow.
///
/// Valid transitions:
/// - Calculated → PendingReview (submit)
/// - PendingReview → Approved (approve)
/// - PendingReview → Rejected (reject)
/// - Calculated | Rejected → Calculated (adjust)
/// - Approved → Paid (mark paid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// Freshly calculated; may be recalculated or adjusted.
    Calculated,
    /// Submitted and waiting for a reviewer.
    PendingReview,
    /// Approved for payout.
    Approved,
    /// Sent back by a reviewer; may be adjusted.
    Rejected,
    /// Paid out (immutable).
    Paid,
}

impl CommissionStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 5] = [
        Self::Calculated,
        Self::PendingReview,
        Self::Approved,
        Self::Rejected,
        Self::Paid,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Calculated => "calculated",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "calculated" => Some(Self::Calculated),
            "pending_review" | "pending" => Some(Self::PendingReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Returns true if the amounts may still change (recalculate or adjust).
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Calculated | Self::Rejected)
    }

    /// Returns true once the commission can never change again.
    #[must_use]
    pub const fn is_immutable(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// First calculation.
    Calculate,
    /// Amounts refreshed from the deal and target.
    Recalculate,
    /// Sent for review.
    Submit,
    /// Approved.
    Approve,
    /// Rejected.
    Reject,
    /// Amount changed by hand.
    Adjust,
    /// Paid out.
    MarkPaid,
}

impl ApprovalAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Calculate => "calculate",
            Self::Recalculate => "recalculate",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Adjust => "adjust",
            Self::MarkPaid => "mark_paid",
        }
    }

    /// Parses an action from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "calculate" => Some(Self::Calculate),
            "recalculate" => Some(Self::Recalculate),
            "submit" => Some(Self::Submit),
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            "adjust" => Some(Self::Adjust),
            "mark_paid" | "pay" => Some(Self::MarkPaid),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated state transition carrying its audit data (who, when, why).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Submit a calculated commission for review.
    Submit {
        /// The new status after submission.
        new_status: CommissionStatus,
        /// Who submitted.
        submitted_by: UserId,
        /// When.
        submitted_at: DateTime<Utc>,
    },
    /// Approve a commission under review.
    Approve {
        /// The new status after approval.
        new_status: CommissionStatus,
        /// Who approved.
        approved_by: UserId,
        /// When. Also stamped as the review time.
        approved_at: DateTime<Utc>,
        /// Optional notes from the approver.
        approval_notes: Option<String>,
    },
    /// Reject a commission under review.
    Reject {
        /// The new status after rejection.
        new_status: CommissionStatus,
        /// Who rejected.
        rejected_by: UserId,
        /// When. Stamped as the review time.
        rejected_at: DateTime<Utc>,
        /// The reason for rejection.
        rejection_reason: String,
    },
    /// Change the amount of an editable commission.
    Adjust {
        /// The new status after adjustment.
        new_status: CommissionStatus,
        /// Who adjusted.
        adjusted_by: UserId,
        /// When.
        adjusted_at: DateTime<Utc>,
        /// Amount before the adjustment.
        previous_amount: Decimal,
        /// Amount after the adjustment.
        new_amount: Decimal,
        /// The reason for adjusting.
        reason: String,
    },
    /// Record payout of an approved commission.
    MarkPaid {
        /// The new status after payout.
        new_status: CommissionStatus,
        /// Who recorded the payout.
        paid_by: UserId,
        /// When.
        paid_at: DateTime<Utc>,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> CommissionStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Adjust { new_status, .. }
            | Self::MarkPaid { new_status, .. } => *new_status,
        }
    }

    /// Returns the audit action name.
    #[must_use]
    pub const fn action(&self) -> ApprovalAction {
        match self {
            Self::Submit { .. } => ApprovalAction::Submit,
            Self::Approve { .. } => ApprovalAction::Approve,
            Self::Reject { .. } => ApprovalAction::Reject,
            Self::Adjust { .. } => ApprovalAction::Adjust,
            Self::MarkPaid { .. } => ApprovalAction::MarkPaid,
        }
    }

    /// Returns who performed the action.
    #[must_use]
    pub fn performed_by(&self) -> UserId {
        match self {
            Self::Submit { submitted_by: by, .. }
            | Self::Approve { approved_by: by, .. }
            | Self::Reject { rejected_by: by, .. }
            | Self::Adjust { adjusted_by: by, .. }
            | Self::MarkPaid { paid_by: by, .. } => *by,
        }
    }

    /// Returns when the action was performed.
    #[must_use]
    pub fn performed_at(&self) -> DateTime<Utc> {
        match self {
            Self::Submit { submitted_at: at, .. }
            | Self::Approve { approved_at: at, .. }
            | Self::Reject { rejected_at: at, .. }
            | Self::Adjust { adjusted_at: at, .. }
            | Self::MarkPaid { paid_at: at, .. } => *at,
        }
    }

    /// Free-text notes for the audit row.
    #[must_use]
    pub fn notes(&self) -> Option<String> {
        match self {
            Self::Approve { approval_notes, .. } => approval_notes.clone(),
            Self::Reject {
                rejection_reason, ..
            } => Some(rejection_reason.clone()),
            Self::Adjust {
                previous_amount,
                new_amount,
                reason,
                ..
            } => Some(format!("{previous_amount} -> {new_amount}: {reason}")),
            Self::Submit { .. } | Self::MarkPaid { .. } => None,
        }
    }

    /// Builds the append-only audit row for this transition.
    #[must_use]
    pub fn audit_record(&self, previous_status: CommissionStatus) -> AuditRecord {
        AuditRecord {
            action: self.action(),
            performed_by: self.performed_by(),
            previous_status: Some(previous_status),
            new_status: self.new_status(),
            notes: self.notes(),
            performed_at: self.performed_at(),
        }
    }
}

/// One row of a commission's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// What happened.
    pub action: ApprovalAction,
    /// Who did it.
    pub performed_by: UserId,
    /// Status before; `None` for the first calculation.
    pub previous_status: Option<CommissionStatus>,
    /// Status after.
    pub new_status: CommissionStatus,
    /// Reason or notes.
    pub notes: Option<String>,
    /// When.
    pub performed_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Audit row for a (re)calculation by `performed_by`.
    #[must_use]
    pub fn calculation(
        performed_by: UserId,
        previous_status: Option<CommissionStatus>,
        notes: Option<String>,
    ) -> Self {
        Self {
            action: if previous_status.is_some() {
                ApprovalAction::Recalculate
            } else {
                ApprovalAction::Calculate
            },
            performed_by,
            previous_status,
            new_status: CommissionStatus::Calculated,
            notes,
            performed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_round_trip() {
        for status in CommissionStatus::ALL {
            assert_eq!(CommissionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            CommissionStatus::parse("PENDING"),
            Some(CommissionStatus::PendingReview)
        );
        assert_eq!(CommissionStatus::parse("void"), None);
    }

    #[test]
    fn test_status_editable() {
        assert!(CommissionStatus::Calculated.is_editable());
        assert!(CommissionStatus::Rejected.is_editable());
        assert!(!CommissionStatus::PendingReview.is_editable());
        assert!(!CommissionStatus::Approved.is_editable());
        assert!(!CommissionStatus::Paid.is_editable());
        assert!(CommissionStatus::Paid.is_immutable());
        assert!(!CommissionStatus::Approved.is_immutable());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(CommissionStatus::PendingReview.to_string(), "pending_review");
        assert_eq!(ApprovalAction::MarkPaid.to_string(), "mark_paid");
    }

    #[test]
    fn test_adjust_audit_record() {
        let user = UserId::new();
        let action = WorkflowAction::Adjust {
            new_status: CommissionStatus::Calculated,
            adjusted_by: user,
            adjusted_at: Utc::now(),
            previous_amount: dec!(500.00),
            new_amount: dec!(450.00),
            reason: "split with SDR".into(),
        };

        let record = action.audit_record(CommissionStatus::Rejected);
        assert_eq!(record.action, ApprovalAction::Adjust);
        assert_eq!(record.performed_by, user);
        assert_eq!(record.previous_status, Some(CommissionStatus::Rejected));
        assert_eq!(record.new_status, CommissionStatus::Calculated);
        assert_eq!(record.notes.as_deref(), Some("500.00 -> 450.00: split with SDR"));
    }

    #[test]
    fn test_calculation_record() {
        let user = UserId::new();
        let first = AuditRecord::calculation(user, None, None);
        assert_eq!(first.action, ApprovalAction::Calculate);

        let again = AuditRecord::calculation(user, Some(CommissionStatus::Rejected), None);
        assert_eq!(again.action, ApprovalAction::Recalculate);
        assert_eq!(again.new_status, CommissionStatus::Calculated);
    }
}
