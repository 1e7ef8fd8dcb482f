//! Commission repository plus the calculation and period-refresh steps
//! shared by the deal and workflow repositories.
//!
//! The free functions take any `ConnectionTrait` so they run inside the
//! caller's transaction.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use comptrack_core::commission::{
    ActualLine, CalculationOutcome, CommissionCalculator, CommissionError, PeriodAggregator,
    PeriodCommissions, PeriodSummary,
};
use comptrack_core::deal::Deal;
use comptrack_core::period::Period;
use comptrack_core::target::TargetResolver;
use comptrack_core::workflow::{AuditRecord, CommissionStatus as CoreStatus};
use comptrack_shared::types::{CommissionId, PageRequest, UserId};

use super::target::candidate_targets;
use super::user::is_company_user;
use crate::entities::sea_orm_active_enums::{
    CommissionKind, CommissionStatus, DealStatus, PeriodType,
};
use crate::entities::{commission_approvals, commission_periods, commissions, deals, users};

/// Filter for listing commissions.
#[derive(Debug, Clone, Default)]
pub struct CommissionFilter {
    /// Restrict to these owners. `None` lists the whole company.
    pub user_ids: Option<Vec<Uuid>>,
    /// Restrict to one workflow status.
    pub status: Option<CommissionStatus>,
}

/// Commission repository for reads and period recalculation.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    db: DatabaseConnection,
    calculator: CommissionCalculator,
}

impl CommissionRepository {
    /// Creates a new commission repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, calculator: CommissionCalculator) -> Self {
        Self { db, calculator }
    }

    /// Finds a commission by ID within a company.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::NotFound` if it does not exist.
    pub async fn find(
        &self,
        company_id: Uuid,
        commission_id: Uuid,
    ) -> Result<commissions::Model, CommissionError> {
        commissions::Entity::find_by_id(commission_id)
            .filter(commissions::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CommissionError::NotFound(CommissionId::from(commission_id)))
    }

    /// Lists commissions newest close date first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Database` if a query fails.
    pub async fn list(
        &self,
        company_id: Uuid,
        filter: &CommissionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<commissions::Model>, u64), CommissionError> {
        let mut query =
            commissions::Entity::find().filter(commissions::Column::CompanyId.eq(company_id));

        if let Some(user_ids) = &filter.user_ids {
            query = query.filter(commissions::Column::UserId.is_in(user_ids.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(commissions::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(commissions::Column::CloseDate)
            .order_by_desc(commissions::Column::Id)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await.map_err(db_err)?;
        let items = paginator
            .fetch_page(u64::from(page.normalized().page - 1))
            .await
            .map_err(db_err)?;

        Ok((items, total))
    }

    /// Returns the audit trail of a commission, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::NotFound` if the commission does not exist
    /// in the company.
    pub async fn approvals(
        &self,
        company_id: Uuid,
        commission_id: Uuid,
    ) -> Result<Vec<commission_approvals::Model>, CommissionError> {
        self.find(company_id, commission_id).await?;

        commission_approvals::Entity::find()
            .filter(commission_approvals::Column::CommissionId.eq(commission_id))
            .order_by_asc(commission_approvals::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists the actual and projected period rows of a user, latest first.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Database` if the query fails.
    pub async fn list_periods(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<commission_periods::Model>, CommissionError> {
        commission_periods::Entity::find()
            .filter(commission_periods::Column::CompanyId.eq(company_id))
            .filter(commission_periods::Column::UserId.eq(user_id))
            .order_by_desc(commission_periods::Column::PeriodStart)
            .order_by_asc(commission_periods::Column::Kind)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Rebuilds both period rows for a user and period in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::UserNotFound` if the user is not in the
    /// company, or `CommissionError::Database` if a query fails.
    pub async fn recalculate_periods(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        period: Period,
    ) -> Result<PeriodCommissions, CommissionError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        if !is_company_user(&txn, company_id, user_id).await.map_err(db_err)? {
            return Err(CommissionError::UserNotFound(UserId::from(user_id)));
        }
        let summary = refresh_periods(&txn, company_id, user_id, period, self.calculator)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(
            %user_id,
            period_start = %period.start,
            period_end = %period.end,
            attainment = %summary.actual.attainment_percent,
            "commission periods recalculated"
        );
        Ok(summary)
    }
}

pub(crate) fn db_err(e: DbErr) -> CommissionError {
    CommissionError::Database(e.to_string())
}

/// Calculates (or recalculates) the commission for a closed-won deal and
/// writes its audit row.
///
/// - no commission yet: insert it with a `calculate` audit row
/// - amount, owner, and close date unchanged: keep the stored commission,
///   including any manual adjustment, and report `Unchanged`
/// - editable commission of a changed deal: overwrite the snapshot with a
///   `recalculate` row
/// - reviewed or paid commission of a changed deal: `NotEditable`
///
/// A deal with no applicable target is logged and reported as skipped; an
/// editable commission left over from earlier inputs is deleted.
pub(crate) async fn calculate_for_deal<C: ConnectionTrait>(
    conn: &C,
    deal: &Deal,
    calculator: CommissionCalculator,
    performed_by: Uuid,
) -> Result<CalculationOutcome, CommissionError> {
    let owner = deal.user_id.into_inner();
    let company_id = deal.company_id.into_inner();
    let close_date = deal
        .close_date
        .ok_or(CommissionError::MissingCloseDate(deal.id))?;

    let existing = commissions::Entity::find()
        .filter(commissions::Column::DealId.eq(deal.id.into_inner()))
        .one(conn)
        .await
        .map_err(db_err)?;

    if let Some(model) = &existing {
        if model.deal_amount == deal.amount
            && model.user_id == owner
            && model.close_date == close_date
        {
            debug!(commission_id = %model.id, "deal unchanged, commission kept");
            return Ok(CalculationOutcome::Unchanged {
                commission_id: model.id.into(),
                commission_amount: model.commission_amount,
            });
        }
        let status = CoreStatus::from(model.status);
        if !status.is_editable() {
            return Err(CommissionError::NotEditable {
                id: model.id.into(),
                status,
            });
        }
    }

    let role = user_role(conn, owner).await.map_err(db_err)?;
    let targets = candidate_targets(conn, company_id, owner, close_date, close_date)
        .await
        .map_err(db_err)?;

    let outcome = calculator.for_deal(deal, &targets, role.as_deref())?;
    let commission = match &outcome {
        CalculationOutcome::Calculated(commission) => commission,
        CalculationOutcome::Skipped { reason } => {
            warn!(deal_id = %deal.id, %reason, "commission skipped");
            // A stale snapshot would still pay out for the old inputs.
            if let Some(stale) = existing {
                let stale_id = stale.id;
                stale.delete(conn).await.map_err(db_err)?;
                info!(deal_id = %deal.id, commission_id = %stale_id, "stale commission removed");
            }
            return Ok(outcome);
        }
        CalculationOutcome::Unchanged { .. } => return Ok(outcome),
    };

    let now = Utc::now();

    let (commission_id, previous) = match existing {
        None => {
            let id = Uuid::now_v7();
            commissions::ActiveModel {
                id: Set(id),
                company_id: Set(company_id),
                user_id: Set(owner),
                deal_id: Set(deal.id.into_inner()),
                target_id: Set(Some(commission.target_id.into_inner())),
                deal_amount: Set(commission.deal_amount),
                commission_rate: Set(commission.commission_rate),
                commission_amount: Set(commission.commission_amount),
                close_date: Set(commission.close_date),
                period_type: Set(PeriodType::from(commission.period.period_type)),
                period_start: Set(commission.period.start),
                period_end: Set(commission.period.end),
                status: Set(CommissionStatus::Calculated),
                calculated_at: Set(now.into()),
                reviewed_at: Set(None),
                approved_at: Set(None),
                paid_at: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(conn)
            .await
            .map_err(db_err)?;
            (id, None)
        }
        Some(model) => {
            let id = model.id;
            let status = CoreStatus::from(model.status);
            let mut active: commissions::ActiveModel = model.into();
            active.user_id = Set(owner);
            active.target_id = Set(Some(commission.target_id.into_inner()));
            active.deal_amount = Set(commission.deal_amount);
            active.commission_rate = Set(commission.commission_rate);
            active.commission_amount = Set(commission.commission_amount);
            active.close_date = Set(commission.close_date);
            active.period_type = Set(PeriodType::from(commission.period.period_type));
            active.period_start = Set(commission.period.start);
            active.period_end = Set(commission.period.end);
            active.status = Set(CommissionStatus::Calculated);
            active.calculated_at = Set(now.into());
            active.reviewed_at = Set(None);
            active.updated_at = Set(now.into());
            active.update(conn).await.map_err(db_err)?;
            (id, Some(status))
        }
    };

    let record = AuditRecord::calculation(
        UserId::from(performed_by),
        previous,
        Some(format!(
            "{} x {} = {}",
            commission.deal_amount, commission.commission_rate, commission.commission_amount
        )),
    );
    insert_audit(conn, commission_id, &record).await.map_err(db_err)?;

    info!(
        deal_id = %deal.id,
        %commission_id,
        amount = %commission.commission_amount,
        "commission calculated"
    );
    Ok(outcome)
}

/// Refreshes the period rows around `date` for a user. The period is the
/// one of the target resolved for that date; without a target nothing is
/// written and `None` is returned.
pub(crate) async fn refresh_for_date<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    calculator: CommissionCalculator,
) -> Result<Option<PeriodCommissions>, DbErr> {
    let role = user_role(conn, user_id).await?;
    let targets = candidate_targets(conn, company_id, user_id, date, date).await?;
    let Some(target) = TargetResolver::resolve(&targets, user_id.into(), role.as_deref(), date)
    else {
        debug!(%user_id, %date, "no target, period rows not refreshed");
        return Ok(None);
    };

    refresh_periods(conn, company_id, user_id, target.period, calculator)
        .await
        .map(Some)
}

/// Rebuilds the actual and projected rows of one period from the recorded
/// commissions and the open pipeline, and upserts both.
pub(crate) async fn refresh_periods<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    user_id: Uuid,
    period: Period,
    calculator: CommissionCalculator,
) -> Result<PeriodCommissions, DbErr> {
    let role = user_role(conn, user_id).await?;
    let targets = candidate_targets(conn, company_id, user_id, period.start, period.end).await?;
    let target = TargetResolver::resolve_for_period(&targets, user_id.into(), role.as_deref(), &period);

    let lines: Vec<ActualLine> = commissions::Entity::find()
        .filter(commissions::Column::CompanyId.eq(company_id))
        .filter(commissions::Column::UserId.eq(user_id))
        .filter(commissions::Column::CloseDate.between(period.start, period.end))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| ActualLine {
            deal_amount: c.deal_amount,
            commission_amount: c.commission_amount,
        })
        .collect();

    let open_deals: Vec<Deal> = deals::Entity::find()
        .filter(deals::Column::CompanyId.eq(company_id))
        .filter(deals::Column::UserId.eq(user_id))
        .filter(deals::Column::Status.eq(DealStatus::Open))
        .filter(deals::Column::CloseDate.between(period.start, period.end))
        .all(conn)
        .await?
        .into_iter()
        .map(Deal::from)
        .collect();

    let summary = PeriodAggregator::summarize(period, target, &lines, &open_deals, calculator);
    upsert_period_row(conn, company_id, user_id, &summary.actual).await?;
    upsert_period_row(conn, company_id, user_id, &summary.projected).await?;

    Ok(summary)
}

async fn upsert_period_row<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    user_id: Uuid,
    row: &PeriodSummary,
) -> Result<(), DbErr> {
    let model = commission_periods::ActiveModel {
        id: Set(Uuid::now_v7()),
        company_id: Set(company_id),
        user_id: Set(user_id),
        kind: Set(CommissionKind::from(row.kind)),
        period_type: Set(PeriodType::from(row.period.period_type)),
        period_start: Set(row.period.start),
        period_end: Set(row.period.end),
        quota_amount: Set(row.quota_amount),
        total_amount: Set(row.total_amount),
        commission_amount: Set(row.commission_amount),
        attainment_percent: Set(row.attainment_percent),
        target_id: Set(row.target_id.map(|t| t.into_inner())),
        calculated_at: Set(Utc::now().into()),
    };

    commission_periods::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([
                commission_periods::Column::UserId,
                commission_periods::Column::Kind,
                commission_periods::Column::PeriodStart,
                commission_periods::Column::PeriodEnd,
            ])
            .update_columns([
                commission_periods::Column::PeriodType,
                commission_periods::Column::QuotaAmount,
                commission_periods::Column::TotalAmount,
                commission_periods::Column::CommissionAmount,
                commission_periods::Column::AttainmentPercent,
                commission_periods::Column::TargetId,
                commission_periods::Column::CalculatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Appends one audit row.
pub(crate) async fn insert_audit<C: ConnectionTrait>(
    conn: &C,
    commission_id: Uuid,
    record: &AuditRecord,
) -> Result<(), DbErr> {
    commission_approvals::ActiveModel {
        id: Set(Uuid::now_v7()),
        commission_id: Set(commission_id),
        action: Set(record.action.into()),
        performed_by: Set(record.performed_by.into_inner()),
        previous_status: Set(record.previous_status.map(Into::into)),
        new_status: Set(record.new_status.into()),
        notes: Set(record.notes.clone()),
        created_at: Set(record.performed_at.into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Role name of a user as stored on role-wide targets.
async fn user_role<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> Result<Option<String>, DbErr> {
    let user = users::Entity::find_by_id(user_id).one(conn).await?;
    Ok(user.map(|u| comptrack_core::auth::SalesRole::from(u.role).as_str().to_string()))
}
