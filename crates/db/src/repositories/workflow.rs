//! Workflow repository for commission status transitions.
//!
//! Each transition loads the commission, checks the actor's authority
//! against the reporting tree, applies the core state machine, and writes
//! the audit row, all in one transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use comptrack_core::commission::CommissionCalculator;
use comptrack_core::period::Period;
use comptrack_core::workflow::{
    Actor, ApprovalAction, ApprovalPolicy, CommissionStatus as CoreStatus, WorkflowAction,
    WorkflowError, WorkflowService,
};
use comptrack_shared::types::CommissionId;

use super::commission::{insert_audit, refresh_periods};
use super::user::load_reporting_tree;
use crate::entities::commissions;

/// Result of a bulk approval operation.
#[derive(Debug, Clone)]
pub struct BulkApproveResult {
    /// Results for each commission.
    pub results: Vec<BulkApproveItemResult>,
    /// Number of successful approvals.
    pub success_count: usize,
    /// Number of failed approvals.
    pub failure_count: usize,
}

/// Result for a single commission in bulk approval.
#[derive(Debug, Clone)]
pub struct BulkApproveItemResult {
    /// Commission ID.
    pub commission_id: Uuid,
    /// Whether the approval succeeded.
    pub success: bool,
    /// Machine-readable error code if failed.
    pub error_code: Option<&'static str>,
    /// Error message if failed.
    pub error: Option<String>,
}

/// Workflow repository for commission state transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
    policy: ApprovalPolicy,
    calculator: CommissionCalculator,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        policy: ApprovalPolicy,
        calculator: CommissionCalculator,
    ) -> Self {
        Self {
            db,
            policy,
            calculator,
        }
    }

    /// Submits a calculated commission for review.
    ///
    /// # Errors
    ///
    /// Returns `CommissionNotFound`, `InvalidTransition`, `CannotModifyPaid`,
    /// `NotAuthorized`, or `Database`.
    pub async fn submit(
        &self,
        company_id: Uuid,
        commission_id: Uuid,
        actor: Actor,
    ) -> Result<commissions::Model, WorkflowError> {
        self.transition(company_id, commission_id, actor, ApprovalAction::Submit, |c| {
            WorkflowService::submit(c.status.into(), actor.user_id)
        })
        .await
    }

    /// Approves a commission under review.
    ///
    /// # Errors
    ///
    /// Returns `CommissionNotFound`, `InvalidTransition`, `CannotModifyPaid`,
    /// `SelfApproval`, `NotAuthorized`, or `Database`.
    pub async fn approve(
        &self,
        company_id: Uuid,
        commission_id: Uuid,
        actor: Actor,
        notes: Option<String>,
    ) -> Result<commissions::Model, WorkflowError> {
        self.transition(company_id, commission_id, actor, ApprovalAction::Approve, |c| {
            WorkflowService::approve(c.status.into(), actor.user_id, notes)
        })
        .await
    }

    /// Rejects a commission under review. A reason is required.
    ///
    /// # Errors
    ///
    /// Returns `RejectionReasonRequired` plus the errors of [`Self::approve`].
    pub async fn reject(
        &self,
        company_id: Uuid,
        commission_id: Uuid,
        actor: Actor,
        reason: String,
    ) -> Result<commissions::Model, WorkflowError> {
        self.transition(company_id, commission_id, actor, ApprovalAction::Reject, |c| {
            WorkflowService::reject(c.status.into(), actor.user_id, reason)
        })
        .await
    }

    /// Overrides the amount of a calculated or rejected commission and
    /// refreshes its period rows.
    ///
    /// # Errors
    ///
    /// Returns `AdjustmentReasonRequired`, `NegativeAdjustment`,
    /// `InvalidTransition`, `CannotModifyPaid`, `NotAuthorized`, or `Database`.
    pub async fn adjust(
        &self,
        company_id: Uuid,
        commission_id: Uuid,
        actor: Actor,
        new_amount: Decimal,
        reason: String,
    ) -> Result<commissions::Model, WorkflowError> {
        self.transition(company_id, commission_id, actor, ApprovalAction::Adjust, |c| {
            WorkflowService::adjust(
                c.status.into(),
                actor.user_id,
                c.commission_amount,
                new_amount,
                reason,
            )
        })
        .await
    }

    /// Records payout of an approved commission. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `CommissionNotFound`, `InvalidTransition`, `CannotModifyPaid`,
    /// `NotAuthorized`, or `Database`.
    pub async fn mark_paid(
        &self,
        company_id: Uuid,
        commission_id: Uuid,
        actor: Actor,
    ) -> Result<commissions::Model, WorkflowError> {
        self.transition(company_id, commission_id, actor, ApprovalAction::MarkPaid, |c| {
            WorkflowService::mark_paid(c.status.into(), actor.user_id)
        })
        .await
    }

    /// Approves several commissions, each in its own transaction, and
    /// reports per-item success or failure.
    ///
    /// # Errors
    ///
    /// Never fails as a whole; individual failures are reported in the result.
    pub async fn bulk_approve(
        &self,
        company_id: Uuid,
        commission_ids: Vec<Uuid>,
        actor: Actor,
        notes: Option<String>,
    ) -> Result<BulkApproveResult, WorkflowError> {
        let mut results = Vec::with_capacity(commission_ids.len());
        let mut success_count = 0;
        let mut failure_count = 0;

        for commission_id in commission_ids {
            match self
                .approve(company_id, commission_id, actor, notes.clone())
                .await
            {
                Ok(_) => {
                    success_count += 1;
                    results.push(BulkApproveItemResult {
                        commission_id,
                        success: true,
                        error_code: None,
                        error: None,
                    });
                }
                Err(e) => {
                    failure_count += 1;
                    results.push(BulkApproveItemResult {
                        commission_id,
                        success: false,
                        error_code: Some(e.error_code()),
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(success_count, failure_count, "bulk approval finished");
        Ok(BulkApproveResult {
            results,
            success_count,
            failure_count,
        })
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    async fn transition<F>(
        &self,
        company_id: Uuid,
        commission_id: Uuid,
        actor: Actor,
        kind: ApprovalAction,
        build: F,
    ) -> Result<commissions::Model, WorkflowError>
    where
        F: FnOnce(&commissions::Model) -> Result<WorkflowAction, WorkflowError>,
    {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let commission = commissions::Entity::find_by_id(commission_id)
            .filter(commissions::Column::CompanyId.eq(company_id))
            .one(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or_else(|| WorkflowError::CommissionNotFound(CommissionId::from(commission_id)))?;

        let action = build(&commission)?;

        let tree = load_reporting_tree(&txn, company_id)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        self.policy
            .authorize(kind, actor, commission.user_id.into(), &tree)?;

        let previous = CoreStatus::from(commission.status);
        let updated = self.apply(&txn, commission, &action).await?;

        insert_audit(&txn, updated.id, &action.audit_record(previous))
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        info!(
            %commission_id,
            action = %kind,
            from = %previous,
            to = %action.new_status(),
            performed_by = %actor.user_id,
            "commission status changed"
        );
        Ok(updated)
    }

    /// Writes the new status and the timestamps the action stamps.
    async fn apply(
        &self,
        txn: &DatabaseTransaction,
        commission: commissions::Model,
        action: &WorkflowAction,
    ) -> Result<commissions::Model, WorkflowError> {
        let now = Utc::now();
        let period = Period {
            period_type: commission.period_type.into(),
            start: commission.period_start,
            end: commission.period_end,
        };
        let owner = commission.user_id;
        let company_id = commission.company_id;

        let mut active: commissions::ActiveModel = commission.into();
        active.status = Set(action.new_status().into());
        active.updated_at = Set(now.into());

        match action {
            WorkflowAction::Approve { approved_at, .. } => {
                active.reviewed_at = Set(Some((*approved_at).into()));
                active.approved_at = Set(Some((*approved_at).into()));
            }
            WorkflowAction::Reject { rejected_at, .. } => {
                active.reviewed_at = Set(Some((*rejected_at).into()));
            }
            WorkflowAction::MarkPaid { paid_at, .. } => {
                active.paid_at = Set(Some((*paid_at).into()));
            }
            WorkflowAction::Adjust {
                new_amount,
                adjusted_at,
                ..
            } => {
                active.commission_amount = Set(*new_amount);
                active.calculated_at = Set((*adjusted_at).into());
                active.reviewed_at = Set(None);
            }
            WorkflowAction::Submit { .. } => {}
        }

        let updated = active
            .update(txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        if matches!(action, WorkflowAction::Adjust { .. }) {
            refresh_periods(txn, company_id, owner, period, self.calculator)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?;
        }

        Ok(updated)
    }
}
