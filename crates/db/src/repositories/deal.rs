//! Deal repository: CRM sync and closing deals.
//!
//! Closing a deal as won calculates its commission and refreshes the
//! affected period rows in the same transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use comptrack_core::commission::{
    CalculationOutcome, CommissionCalculator, CommissionError, PeriodCommissions,
};
use comptrack_core::deal::Deal;
use comptrack_core::workflow::CommissionStatus as CoreStatus;
use comptrack_shared::types::{DealId, UserId};

use super::commission::{calculate_for_deal, db_err, refresh_for_date};
use super::user::is_company_user;
use crate::entities::sea_orm_active_enums::{DealStatus, ForecastCategory};
use crate::entities::{commissions, deals};

/// A deal as pushed by the CRM.
#[derive(Debug, Clone)]
pub struct SyncDealInput {
    /// Owning company.
    pub company_id: Uuid,
    /// Deal owner.
    pub user_id: Uuid,
    /// CRM identifier, unique per company.
    pub crm_id: String,
    /// Deal name.
    pub name: String,
    /// Deal amount.
    pub amount: Decimal,
    /// Expected or actual close date.
    pub close_date: Option<NaiveDate>,
    /// Deal status.
    pub status: DealStatus,
    /// Forecast bucket.
    pub forecast_category: Option<ForecastCategory>,
}

/// Filter for listing deals.
#[derive(Debug, Clone, Default)]
pub struct DealFilter {
    /// Restrict to these owners. `None` lists the whole company.
    pub user_ids: Option<Vec<Uuid>>,
    /// Restrict to one status.
    pub status: Option<DealStatus>,
    /// Earliest close date (inclusive).
    pub from: Option<NaiveDate>,
    /// Latest close date (inclusive).
    pub to: Option<NaiveDate>,
}

/// Result of syncing or closing a deal.
#[derive(Debug, Clone)]
pub struct DealUpdate {
    /// The stored deal.
    pub deal: deals::Model,
    /// True if the deal was inserted rather than updated.
    pub created: bool,
    /// Commission outcome for closed-won deals.
    pub outcome: Option<CalculationOutcome>,
    /// Period rows refreshed for the close date, if a target applied.
    pub periods: Option<PeriodCommissions>,
}

/// Deal repository.
#[derive(Debug, Clone)]
pub struct DealRepository {
    db: DatabaseConnection,
    calculator: CommissionCalculator,
}

impl DealRepository {
    /// Creates a new deal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, calculator: CommissionCalculator) -> Self {
        Self { db, calculator }
    }

    /// Finds a deal by ID within a company.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::DealNotFound` if it does not exist.
    pub async fn find(&self, company_id: Uuid, deal_id: Uuid) -> Result<deals::Model, CommissionError> {
        find_deal(&self.db, company_id, deal_id).await
    }

    /// Finds a deal by its CRM identifier within a company.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Database` if the query fails.
    pub async fn find_by_crm_id(
        &self,
        company_id: Uuid,
        crm_id: &str,
    ) -> Result<Option<deals::Model>, CommissionError> {
        deals::Entity::find()
            .filter(deals::Column::CrmId.eq(crm_id))
            .filter(deals::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists deals by close date, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Database` if the query fails.
    pub async fn list(
        &self,
        company_id: Uuid,
        filter: &DealFilter,
    ) -> Result<Vec<deals::Model>, CommissionError> {
        let mut query = deals::Entity::find().filter(deals::Column::CompanyId.eq(company_id));

        if let Some(user_ids) = &filter.user_ids {
            query = query.filter(deals::Column::UserId.is_in(user_ids.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(deals::Column::Status.eq(status));
        }
        if let Some(from) = filter.from {
            query = query.filter(deals::Column::CloseDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(deals::Column::CloseDate.lte(to));
        }

        query
            .order_by_desc(deals::Column::CloseDate)
            .order_by_asc(deals::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Inserts or updates a deal by `(crm_id, company_id)`.
    ///
    /// A closed-won deal without a close date is closed today and its
    /// commission calculated. A deal that is no longer won loses any
    /// still-editable commission. Period rows for the old and new close
    /// dates are refreshed.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount`, `UserNotFound` when the owner is not in the
    /// company, `NotEditable` when the deal changed (or changed owner) after
    /// its commission was reviewed, or `Database`.
    pub async fn sync_deal(
        &self,
        input: SyncDealInput,
        performed_by: Uuid,
    ) -> Result<DealUpdate, CommissionError> {
        if input.amount < Decimal::ZERO {
            return Err(CommissionError::NegativeAmount(input.amount));
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        if !is_company_user(&txn, input.company_id, input.user_id)
            .await
            .map_err(db_err)?
        {
            return Err(CommissionError::UserNotFound(UserId::from(input.user_id)));
        }

        let existing = deals::Entity::find()
            .filter(deals::Column::CrmId.eq(input.crm_id.as_str()))
            .filter(deals::Column::CompanyId.eq(input.company_id))
            .one(&txn)
            .await
            .map_err(db_err)?;

        if let Some(model) = existing.as_ref().filter(|d| d.user_id != input.user_id) {
            ensure_commission_editable(&txn, model.id).await?;
        }

        let close_date = match input.status {
            DealStatus::ClosedWon => Some(input.close_date.unwrap_or_else(today)),
            _ => input.close_date,
        };
        let now = Utc::now();
        let created = existing.is_none();
        let previous_close = existing.as_ref().and_then(|d| d.close_date);
        let previous_owner = existing.as_ref().map(|d| d.user_id);

        let deal = match existing {
            Some(model) => {
                let mut active: deals::ActiveModel = model.into();
                active.user_id = Set(input.user_id);
                active.name = Set(input.name);
                active.amount = Set(input.amount);
                active.close_date = Set(close_date);
                active.status = Set(input.status);
                active.forecast_category = Set(input.forecast_category);
                active.updated_at = Set(now.into());
                active.update(&txn).await.map_err(db_err)?
            }
            None => deals::ActiveModel {
                id: Set(Uuid::now_v7()),
                company_id: Set(input.company_id),
                user_id: Set(input.user_id),
                crm_id: Set(Some(input.crm_id)),
                name: Set(input.name),
                amount: Set(input.amount),
                close_date: Set(close_date),
                status: Set(input.status),
                forecast_category: Set(input.forecast_category),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?,
        };

        let outcome = self.settle_commission(&txn, &deal, performed_by).await?;

        // The deal may have moved out of a period or to another owner.
        if let (Some(date), Some(owner)) = (previous_close, previous_owner) {
            if previous_close != deal.close_date || owner != deal.user_id {
                refresh_for_date(&txn, deal.company_id, owner, date, self.calculator)
                    .await
                    .map_err(db_err)?;
            }
        }
        let periods = match deal.close_date {
            Some(date) => refresh_for_date(&txn, deal.company_id, deal.user_id, date, self.calculator)
                .await
                .map_err(db_err)?,
            None => None,
        };

        txn.commit().await.map_err(db_err)?;

        info!(deal_id = %deal.id, created, status = ?deal.status, "deal synced");
        Ok(DealUpdate {
            deal,
            created,
            outcome,
            periods,
        })
    }

    /// Marks a deal closed-won, calculates its commission, and refreshes the
    /// period rows, all in one transaction. `close_date` defaults to today.
    ///
    /// # Errors
    ///
    /// Returns `DealNotFound`, a calculation error, or `Database`. A missing
    /// target is not an error; see [`CalculationOutcome::Skipped`].
    pub async fn close_won(
        &self,
        company_id: Uuid,
        deal_id: Uuid,
        close_date: Option<NaiveDate>,
        performed_by: Uuid,
    ) -> Result<DealUpdate, CommissionError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = find_deal(&txn, company_id, deal_id).await?;
        let previous_close = model.close_date;
        let close_date = close_date.or(previous_close).unwrap_or_else(today);

        let mut active: deals::ActiveModel = model.into();
        active.status = Set(DealStatus::ClosedWon);
        active.close_date = Set(Some(close_date));
        active.updated_at = Set(Utc::now().into());
        let deal = active.update(&txn).await.map_err(db_err)?;

        let outcome = calculate_for_deal(&txn, &Deal::from(deal.clone()), self.calculator, performed_by)
            .await?;
        // An open deal counted in the projected row of its expected period.
        if let Some(previous) = previous_close.filter(|d| *d != close_date) {
            refresh_for_date(&txn, company_id, deal.user_id, previous, self.calculator)
                .await
                .map_err(db_err)?;
        }
        let periods = refresh_for_date(&txn, company_id, deal.user_id, close_date, self.calculator)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(%deal_id, %close_date, "deal closed won");
        Ok(DealUpdate {
            deal,
            created: false,
            outcome: Some(outcome),
            periods,
        })
    }

    /// Marks a deal closed-lost and removes any still-editable commission.
    ///
    /// # Errors
    ///
    /// Returns `DealNotFound`, `NotEditable` if the commission was already
    /// reviewed, or `Database`.
    pub async fn close_lost(
        &self,
        company_id: Uuid,
        deal_id: Uuid,
    ) -> Result<DealUpdate, CommissionError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = find_deal(&txn, company_id, deal_id).await?;
        let close_date = model.close_date;

        let mut active: deals::ActiveModel = model.into();
        active.status = Set(DealStatus::ClosedLost);
        active.updated_at = Set(Utc::now().into());
        let deal = active.update(&txn).await.map_err(db_err)?;

        remove_commission(&txn, deal.id, true).await?;
        let periods = match close_date {
            Some(date) => refresh_for_date(&txn, company_id, deal.user_id, date, self.calculator)
                .await
                .map_err(db_err)?,
            None => None,
        };

        txn.commit().await.map_err(db_err)?;

        info!(%deal_id, "deal closed lost");
        Ok(DealUpdate {
            deal,
            created: false,
            outcome: None,
            periods,
        })
    }

    /// Brings the commission in line with a synced deal's status.
    async fn settle_commission<C: ConnectionTrait>(
        &self,
        conn: &C,
        deal: &deals::Model,
        performed_by: Uuid,
    ) -> Result<Option<CalculationOutcome>, CommissionError> {
        if deal.status == DealStatus::ClosedWon {
            let outcome =
                calculate_for_deal(conn, &Deal::from(deal.clone()), self.calculator, performed_by)
                    .await?;
            return Ok(Some(outcome));
        }
        remove_commission(conn, deal.id, false).await?;
        Ok(None)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn find_deal<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    deal_id: Uuid,
) -> Result<deals::Model, CommissionError> {
    deals::Entity::find_by_id(deal_id)
        .filter(deals::Column::CompanyId.eq(company_id))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CommissionError::DealNotFound(DealId::from(deal_id)))
}

/// Fails with `NotEditable` if the deal has a reviewed or paid commission.
async fn ensure_commission_editable<C: ConnectionTrait>(
    conn: &C,
    deal_id: Uuid,
) -> Result<(), CommissionError> {
    let commission = commissions::Entity::find()
        .filter(commissions::Column::DealId.eq(deal_id))
        .one(conn)
        .await
        .map_err(db_err)?;

    match commission {
        Some(c) if !CoreStatus::from(c.status).is_editable() => Err(CommissionError::NotEditable {
            id: c.id.into(),
            status: CoreStatus::from(c.status),
        }),
        _ => Ok(()),
    }
}

/// Deletes the deal's commission while it is still editable. A reviewed
/// commission is an error when `strict`, otherwise it is kept and logged.
async fn remove_commission<C: ConnectionTrait>(
    conn: &C,
    deal_id: Uuid,
    strict: bool,
) -> Result<(), CommissionError> {
    let Some(commission) = commissions::Entity::find()
        .filter(commissions::Column::DealId.eq(deal_id))
        .one(conn)
        .await
        .map_err(db_err)?
    else {
        return Ok(());
    };

    let status = CoreStatus::from(commission.status);
    if !status.is_editable() {
        if strict {
            return Err(CommissionError::NotEditable {
                id: commission.id.into(),
                status,
            });
        }
        warn!(%deal_id, commission_id = %commission.id, %status, "deal no longer won but commission kept");
        return Ok(());
    }

    let commission_id = commission.id;
    commission.delete(conn).await.map_err(db_err)?;
    info!(%deal_id, %commission_id, "commission removed");
    Ok(())
}
