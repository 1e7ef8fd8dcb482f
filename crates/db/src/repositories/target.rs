//! Target repository: creation, annual splits, deactivation, and orphan repair.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use comptrack_core::target::{NewTarget, Target, TargetError, TargetHierarchy};

use super::user::is_company_user;
use crate::entities::{sea_orm_active_enums::PeriodType, targets};

/// Filter for listing targets.
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
    /// Restrict to these users. `None` lists the whole company.
    pub user_ids: Option<Vec<Uuid>>,
    /// Include role-wide targets.
    pub include_role_targets: bool,
    /// Only targets whose period contains this date.
    pub on_date: Option<NaiveDate>,
}

/// Target repository.
#[derive(Debug, Clone)]
pub struct TargetRepository {
    db: DatabaseConnection,
}

impl TargetRepository {
    /// Creates a new target repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists active targets ordered by period start.
    ///
    /// # Errors
    ///
    /// Returns `TargetError::Database` if the query fails.
    pub async fn list_active(
        &self,
        company_id: Uuid,
        filter: &TargetFilter,
    ) -> Result<Vec<targets::Model>, TargetError> {
        let mut query = targets::Entity::find()
            .filter(targets::Column::CompanyId.eq(company_id))
            .filter(targets::Column::IsActive.eq(true));

        if let Some(user_ids) = &filter.user_ids {
            let mut scope = Condition::any().add(targets::Column::UserId.is_in(user_ids.clone()));
            if filter.include_role_targets {
                scope = scope.add(targets::Column::UserId.is_null());
            }
            query = query.filter(scope);
        }
        if let Some(date) = filter.on_date {
            query = query
                .filter(targets::Column::PeriodStart.lte(date))
                .filter(targets::Column::PeriodEnd.gte(date));
        }

        query
            .order_by_asc(targets::Column::PeriodStart)
            .all(&self.db)
            .await
            .map_err(|e| TargetError::Database(e.to_string()))
    }

    /// Finds a target by ID.
    ///
    /// # Errors
    ///
    /// Returns `TargetError::NotFound` if no such target exists in the company.
    pub async fn find_by_id(
        &self,
        company_id: Uuid,
        target_id: Uuid,
    ) -> Result<targets::Model, TargetError> {
        find_target(&self.db, company_id, target_id).await
    }

    /// Creates a target after validating it and checking for overlaps.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`NewTarget::validate`],
    /// `TargetError::UserNotFound` if the user is not in the company,
    /// `TargetError::Overlap` if an active target of the same type already
    /// covers the period, or `TargetError::Database`.
    pub async fn create(&self, input: NewTarget) -> Result<targets::Model, TargetError> {
        input.validate()?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TargetError::Database(e.to_string()))?;

        if let Some(user_id) = input.user_id {
            let member = is_company_user(&txn, input.company_id.into_inner(), user_id.into_inner())
                .await
                .map_err(|e| TargetError::Database(e.to_string()))?;
            if !member {
                return Err(TargetError::UserNotFound(user_id));
            }
        }

        if let Some(parent_id) = input.parent_target_id {
            let parent = find_target(&txn, input.company_id.into_inner(), parent_id.into_inner()).await?;
            if !parent.is_active {
                return Err(TargetError::Inactive(parent_id));
            }
        }

        let existing = company_targets(&txn, input.company_id.into_inner()).await?;
        TargetHierarchy::check_overlap(&existing, &input)?;

        let created = insert_target(&txn, input).await?;

        txn.commit()
            .await
            .map_err(|e| TargetError::Database(e.to_string()))?;

        info!(target_id = %created.id, company_id = %created.company_id, "target created");
        Ok(created)
    }

    /// Splits an annual target into four quarterly children in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotAnnual`, `Inactive`, `AlreadySplit`,
    /// `Overlap` if a quarterly target already exists for the owner, or
    /// `Database`.
    pub async fn split_annual(
        &self,
        company_id: Uuid,
        target_id: Uuid,
    ) -> Result<Vec<targets::Model>, TargetError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TargetError::Database(e.to_string()))?;

        let parent: Target = find_target(&txn, company_id, target_id).await?.into();
        let existing = company_targets(&txn, company_id).await?;
        let children = TargetHierarchy::split_annual(&parent, &existing)?;

        let mut created = Vec::with_capacity(children.len());
        for child in children {
            TargetHierarchy::check_overlap(&existing, &child)?;
            created.push(insert_target(&txn, child).await?);
        }

        txn.commit()
            .await
            .map_err(|e| TargetError::Database(e.to_string()))?;

        info!(%target_id, children = created.len(), "annual target split into quarters");
        Ok(created)
    }

    /// Deactivates a target and every descendant in one transaction.
    /// Returns the IDs deactivated, the target itself first.
    ///
    /// # Errors
    ///
    /// Returns `TargetError::NotFound` or `TargetError::Database`.
    pub async fn deactivate(
        &self,
        company_id: Uuid,
        target_id: Uuid,
    ) -> Result<Vec<Uuid>, TargetError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TargetError::Database(e.to_string()))?;

        let root = find_target(&txn, company_id, target_id).await?;
        let all = company_targets(&txn, company_id).await?;

        let mut ids = vec![root.id];
        ids.extend(
            TargetHierarchy::descendants(&all, root.id.into())
                .into_iter()
                .map(|id| id.into_inner()),
        );

        deactivate_ids(&txn, &ids).await?;

        txn.commit()
            .await
            .map_err(|e| TargetError::Database(e.to_string()))?;

        info!(%target_id, count = ids.len(), "target deactivated with descendants");
        Ok(ids)
    }

    /// Deactivates every active child whose parent is missing or inactive,
    /// in one transaction. Returns the repaired IDs.
    ///
    /// # Errors
    ///
    /// Returns `TargetError::Database` if a query fails.
    pub async fn repair_orphans(&self, company_id: Uuid) -> Result<Vec<Uuid>, TargetError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TargetError::Database(e.to_string()))?;

        let all = company_targets(&txn, company_id).await?;
        let mut repaired: Vec<Uuid> = TargetHierarchy::orphaned_children(&all)
            .into_iter()
            .map(|id| id.into_inner())
            .collect();

        // Children of orphans are orphaned in turn once their parent goes.
        let mut cascade = Vec::new();
        for id in &repaired {
            cascade.extend(
                TargetHierarchy::descendants(&all, (*id).into())
                    .into_iter()
                    .map(|d| d.into_inner()),
            );
        }
        for id in cascade {
            if !repaired.contains(&id) {
                repaired.push(id);
            }
        }

        if !repaired.is_empty() {
            deactivate_ids(&txn, &repaired).await?;
            warn!(%company_id, count = repaired.len(), "deactivated orphaned targets");
        }

        txn.commit()
            .await
            .map_err(|e| TargetError::Database(e.to_string()))?;

        Ok(repaired)
    }
}

// ============================================================================
// Helpers shared with the commission repositories
// ============================================================================

async fn find_target<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    target_id: Uuid,
) -> Result<targets::Model, TargetError> {
    targets::Entity::find_by_id(target_id)
        .filter(targets::Column::CompanyId.eq(company_id))
        .one(conn)
        .await
        .map_err(|e| TargetError::Database(e.to_string()))?
        .ok_or_else(|| TargetError::NotFound(target_id.into()))
}

/// Every target of a company, active or not, as core targets.
async fn company_targets<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
) -> Result<Vec<Target>, TargetError> {
    let rows = targets::Entity::find()
        .filter(targets::Column::CompanyId.eq(company_id))
        .all(conn)
        .await
        .map_err(|e| TargetError::Database(e.to_string()))?;
    Ok(rows.into_iter().map(Target::from).collect())
}

async fn insert_target<C: ConnectionTrait>(
    conn: &C,
    input: NewTarget,
) -> Result<targets::Model, TargetError> {
    let now = Utc::now().into();
    let model = targets::ActiveModel {
        id: Set(Uuid::now_v7()),
        company_id: Set(input.company_id.into_inner()),
        user_id: Set(input.user_id.map(|u| u.into_inner())),
        role: Set(input.role),
        period_type: Set(PeriodType::from(input.period.period_type)),
        period_start: Set(input.period.start),
        period_end: Set(input.period.end),
        quota_amount: Set(input.quota_amount),
        commission_rate: Set(input.commission_rate),
        is_active: Set(true),
        parent_target_id: Set(input.parent_target_id.map(|p| p.into_inner())),
        created_at: Set(now),
        updated_at: Set(now),
    };
    model
        .insert(conn)
        .await
        .map_err(|e| TargetError::Database(e.to_string()))
}

async fn deactivate_ids<C: ConnectionTrait>(conn: &C, ids: &[Uuid]) -> Result<(), TargetError> {
    targets::Entity::update_many()
        .col_expr(targets::Column::IsActive, Expr::value(false))
        .col_expr(targets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(targets::Column::Id.is_in(ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| TargetError::Database(e.to_string()))?;
    Ok(())
}

/// Active targets of `user_id` or role-wide targets covering `[from, to]`.
/// Role matching is left to the resolver.
pub(crate) async fn candidate_targets<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Target>, sea_orm::DbErr> {
    let rows = targets::Entity::find()
        .filter(targets::Column::CompanyId.eq(company_id))
        .filter(targets::Column::IsActive.eq(true))
        .filter(targets::Column::PeriodStart.lte(from))
        .filter(targets::Column::PeriodEnd.gte(to))
        .filter(
            Condition::any()
                .add(targets::Column::UserId.eq(user_id))
                .add(targets::Column::UserId.is_null()),
        )
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(Target::from).collect())
}
