//! Quota target routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{require_admin, scope_to_user};
use crate::{
    AppState,
    error::{app_error, target_error, validation_error},
    middleware::AuthUser,
};
use comptrack_core::period::{Period, PeriodType};
use comptrack_core::target::NewTarget;
use comptrack_db::{
    TargetRepository,
    entities::targets,
    repositories::TargetFilter,
};
use comptrack_shared::AppError;

/// Creates the target routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/targets", get(list_targets).post(create_target))
        .route("/targets/repair-orphans", post(repair_orphans))
        .route("/targets/{target_id}/split", post(split_target))
        .route("/targets/{target_id}/deactivate", post(deactivate_target))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing targets.
#[derive(Debug, Deserialize)]
pub struct ListTargetsQuery {
    /// Only this user's targets (plus role-wide ones).
    pub user_id: Option<Uuid>,
    /// Only targets whose period contains this date.
    pub on_date: Option<NaiveDate>,
}

/// Request body for creating a target.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTargetRequest {
    /// Owner; omit for a role-wide target.
    pub user_id: Option<Uuid>,
    /// Role for role-wide targets.
    #[validate(length(min = 1, max = 50))]
    pub role: Option<String>,
    /// "monthly", "quarterly" or "annual".
    pub period_type: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day; defaults to the end of a full period from `period_start`.
    pub period_end: Option<NaiveDate>,
    /// Quota for the period.
    pub quota_amount: Decimal,
    /// Fraction paid out, 0 to 1.
    pub commission_rate: Decimal,
    /// Parent target.
    pub parent_target_id: Option<Uuid>,
}

/// Response for a target.
#[derive(Debug, Serialize)]
pub struct TargetResponse {
    /// Target ID.
    pub id: Uuid,
    /// Owner.
    pub user_id: Option<Uuid>,
    /// Role for role-wide targets.
    pub role: Option<String>,
    /// Period type.
    pub period_type: &'static str,
    /// First day.
    pub period_start: NaiveDate,
    /// Last day.
    pub period_end: NaiveDate,
    /// Quota.
    pub quota_amount: Decimal,
    /// Commission rate.
    pub commission_rate: Decimal,
    /// Active flag.
    pub is_active: bool,
    /// Parent target.
    pub parent_target_id: Option<Uuid>,
}

impl From<targets::Model> for TargetResponse {
    fn from(m: targets::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            role: m.role,
            period_type: PeriodType::from(m.period_type).as_str(),
            period_start: m.period_start,
            period_end: m.period_end,
            quota_amount: m.quota_amount,
            commission_rate: m.commission_rate,
            is_active: m.is_active,
            parent_target_id: m.parent_target_id,
        }
    }
}

impl CreateTargetRequest {
    fn into_new_target(self, company_id: Uuid) -> Result<NewTarget, AppError> {
        let period_type = PeriodType::parse(&self.period_type).ok_or_else(|| {
            AppError::Validation(format!("Unknown period type: {}", self.period_type))
        })?;
        let period = match self.period_end {
            Some(end) => Period::new(period_type, self.period_start, end),
            None => Period::starting_at(self.period_start, period_type),
        }
        .ok_or_else(|| AppError::Validation("period_end must not precede period_start".into()))?;

        Ok(NewTarget {
            company_id: company_id.into(),
            user_id: self.user_id.map(Into::into),
            role: self.role,
            period,
            quota_amount: self.quota_amount,
            commission_rate: self.commission_rate,
            parent_target_id: self.parent_target_id.map(Into::into),
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /targets - Active targets visible to the caller.
async fn list_targets(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTargetsQuery>,
) -> Response {
    let user_ids = match scope_to_user(&state, &auth, query.user_id).await {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    let filter = TargetFilter {
        user_ids,
        include_role_targets: true,
        on_date: query.on_date,
    };
    match TargetRepository::new((*state.db).clone())
        .list_active(auth.company_id(), &filter)
        .await
    {
        Ok(rows) => {
            let data: Vec<TargetResponse> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => target_error(&e),
    }
}

/// POST /targets - Create a target (admin).
async fn create_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTargetRequest>,
) -> Response {
    if let Err(response) = require_admin(&auth) {
        return response;
    }
    if let Err(e) = payload.validate() {
        return validation_error(&e);
    }
    let input = match payload.into_new_target(auth.company_id()) {
        Ok(input) => input,
        Err(e) => return app_error(&e),
    };

    match TargetRepository::new((*state.db).clone()).create(input).await {
        Ok(target) => {
            info!(target_id = %target.id, created_by = %auth.user_id(), "Target created");
            (StatusCode::CREATED, Json(TargetResponse::from(target))).into_response()
        }
        Err(e) => target_error(&e),
    }
}

/// POST /targets/{target_id}/split - Split an annual target into quarters (admin).
async fn split_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    match TargetRepository::new((*state.db).clone())
        .split_annual(auth.company_id(), target_id)
        .await
    {
        Ok(children) => {
            let data: Vec<TargetResponse> = children.into_iter().map(Into::into).collect();
            (StatusCode::CREATED, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => target_error(&e),
    }
}

/// POST /targets/{target_id}/deactivate - Deactivate with descendants (admin).
async fn deactivate_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    match TargetRepository::new((*state.db).clone())
        .deactivate(auth.company_id(), target_id)
        .await
    {
        Ok(ids) => (StatusCode::OK, Json(json!({ "deactivated": ids }))).into_response(),
        Err(e) => target_error(&e),
    }
}

/// POST /targets/repair-orphans - Deactivate orphaned children (admin).
async fn repair_orphans(State(state): State<AppState>, auth: AuthUser) -> Response {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    match TargetRepository::new((*state.db).clone())
        .repair_orphans(auth.company_id())
        .await
    {
        Ok(ids) => (StatusCode::OK, Json(json!({ "repaired": ids }))).into_response(),
        Err(e) => target_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(period_end: Option<NaiveDate>) -> CreateTargetRequest {
        CreateTargetRequest {
            user_id: Some(Uuid::new_v4()),
            role: None,
            period_type: "quarterly".to_string(),
            period_start: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            period_end,
            quota_amount: dec!(30000),
            commission_rate: dec!(0.08),
            parent_target_id: None,
        }
    }

    #[test]
    fn test_period_end_defaults_to_full_period() {
        let target = request(None).into_new_target(Uuid::new_v4()).unwrap();
        assert_eq!(target.period.end, NaiveDate::from_ymd_opt(2026, 6, 30).unwrap());
    }

    #[test]
    fn test_inverted_period_rejected() {
        let end = NaiveDate::from_ymd_opt(2026, 3, 1);
        let err = request(end).into_new_target(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_unknown_period_type_rejected() {
        let mut req = request(None);
        req.period_type = "weekly".to_string();
        assert!(req.into_new_target(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_blank_role_fails_validation() {
        let mut req = request(None);
        req.role = Some(String::new());
        assert!(req.validate().is_err());
    }
}
