//! Deal routes: CRM sync and closing deals.

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
use uuid::Uuid;
use validator::Validate;

use super::scope_to_user;
use crate::{
    AppState,
    error::{app_error, commission_error, db_error, validation_error, workflow_error},
    middleware::AuthUser,
};
use comptrack_core::commission::{CalculationOutcome, PeriodCommissions};
use comptrack_core::deal::{DealStatus, ForecastCategory};
use comptrack_core::workflow::ApprovalAction;
use comptrack_db::{
    DealRepository, UserRepository,
    entities::deals,
    repositories::{DealFilter, DealUpdate, SyncDealInput},
};
use comptrack_shared::AppError;

/// Creates the deal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list_deals))
        .route("/deals/sync", post(sync_deal))
        .route("/deals/{deal_id}/close-won", post(close_won))
        .route("/deals/{deal_id}/close-lost", post(close_lost))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing deals.
#[derive(Debug, Deserialize)]
pub struct ListDealsQuery {
    /// Only this user's deals.
    pub user_id: Option<Uuid>,
    /// Filter by status.
    pub status: Option<String>,
    /// Close date range start (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Close date range end (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

/// Request body for syncing a CRM deal.
#[derive(Debug, Deserialize, Validate)]
pub struct SyncDealRequest {
    /// CRM identifier.
    #[validate(length(min = 1, max = 100))]
    pub crm_id: String,
    /// Deal name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Owner; defaults to the caller.
    pub user_id: Option<Uuid>,
    /// Deal amount.
    pub amount: Decimal,
    /// Close date.
    pub close_date: Option<NaiveDate>,
    /// "open", "closed_won"/"closedwon", "closed_lost"/"closedlost".
    pub status: String,
    /// "pipeline", "best_case", "commit" or "omitted".
    pub forecast_category: Option<String>,
}

/// Request body for closing a deal as won.
#[derive(Debug, Default, Deserialize)]
pub struct CloseWonRequest {
    /// Close date; defaults to the deal's date, then today.
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
}

/// Response for a deal.
#[derive(Debug, Serialize)]
pub struct DealResponse {
    /// Deal ID.
    pub id: Uuid,
    /// Owner.
    pub user_id: Uuid,
    /// CRM identifier.
    pub crm_id: Option<String>,
    /// Name.
    pub name: String,
    /// Amount.
    pub amount: Decimal,
    /// Close date.
    pub close_date: Option<NaiveDate>,
    /// Status.
    pub status: &'static str,
    /// Forecast category.
    pub forecast_category: Option<&'static str>,
}

impl From<deals::Model> for DealResponse {
    fn from(m: deals::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            crm_id: m.crm_id,
            name: m.name,
            amount: m.amount,
            close_date: m.close_date,
            status: DealStatus::from(m.status).as_str(),
            forecast_category: m
                .forecast_category
                .map(|c| ForecastCategory::from(c).as_str()),
        }
    }
}

/// Response after a deal changed.
#[derive(Debug, Serialize)]
pub struct DealUpdateResponse {
    /// The deal.
    pub deal: DealResponse,
    /// True when the sync inserted the deal.
    pub created: bool,
    /// Commission outcome for won deals.
    pub commission: Option<CalculationOutcome>,
    /// Refreshed period rows.
    pub periods: Option<PeriodCommissions>,
}

impl From<DealUpdate> for DealUpdateResponse {
    fn from(u: DealUpdate) -> Self {
        Self {
            deal: u.deal.into(),
            created: u.created,
            commission: u.outcome,
            periods: u.periods,
        }
    }
}

fn parse_status(s: &str) -> Result<DealStatus, AppError> {
    DealStatus::parse(s).ok_or_else(|| AppError::Validation(format!("Unknown deal status: {s}")))
}

fn parse_category(s: Option<&str>) -> Result<Option<ForecastCategory>, AppError> {
    s.map(|c| {
        ForecastCategory::parse(c)
            .ok_or_else(|| AppError::Validation(format!("Unknown forecast category: {c}")))
    })
    .transpose()
}

/// Owner, a manager above the owner, or an admin may act on a deal.
async fn authorize_owner(state: &AppState, auth: &AuthUser, owner: Uuid) -> Result<(), Response> {
    if auth.is_admin() || auth.user_id() == owner {
        return Ok(());
    }
    let tree = UserRepository::new((*state.db).clone())
        .reporting_tree(auth.company_id())
        .await
        .map_err(|e| db_error(&e))?;
    state
        .policy()
        .authorize(ApprovalAction::Calculate, auth.actor(), owner.into(), &tree)
        .map_err(|e| workflow_error(&e))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /deals - Deals visible to the caller.
async fn list_deals(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListDealsQuery>,
) -> Response {
    let user_ids = match scope_to_user(&state, &auth, query.user_id).await {
        Ok(ids) => ids,
        Err(response) => return response,
    };
    let status = match query.status.as_deref().map(parse_status).transpose() {
        Ok(status) => status.map(Into::into),
        Err(e) => return app_error(&e),
    };

    let filter = DealFilter {
        user_ids,
        status,
        from: query.from,
        to: query.to,
    };
    match DealRepository::new((*state.db).clone(), state.calculator())
        .list(auth.company_id(), &filter)
        .await
    {
        Ok(rows) => {
            let data: Vec<DealResponse> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => commission_error(&e),
    }
}

/// POST /deals/sync - Insert or update a deal by CRM id.
async fn sync_deal(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SyncDealRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(&e);
    }
    let owner = payload.user_id.unwrap_or_else(|| auth.user_id());
    if let Err(response) = authorize_owner(&state, &auth, owner).await {
        return response;
    }

    let repo = DealRepository::new((*state.db).clone(), state.calculator());
    // Syncing an existing deal also needs authority over its current owner.
    match repo.find_by_crm_id(auth.company_id(), &payload.crm_id).await {
        Ok(Some(existing)) if existing.user_id != owner => {
            if let Err(response) = authorize_owner(&state, &auth, existing.user_id).await {
                return response;
            }
        }
        Ok(_) => {}
        Err(e) => return commission_error(&e),
    }

    let status = match parse_status(&payload.status) {
        Ok(s) => s,
        Err(e) => return app_error(&e),
    };
    let forecast_category = match parse_category(payload.forecast_category.as_deref()) {
        Ok(c) => c,
        Err(e) => return app_error(&e),
    };

    let input = SyncDealInput {
        company_id: auth.company_id(),
        user_id: owner,
        crm_id: payload.crm_id,
        name: payload.name,
        amount: payload.amount,
        close_date: payload.close_date,
        status: status.into(),
        forecast_category: forecast_category.map(Into::into),
    };

    match repo.sync_deal(input, auth.user_id()).await {
        Ok(update) => {
            let code = if update.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (code, Json(DealUpdateResponse::from(update))).into_response()
        }
        Err(e) => commission_error(&e),
    }
}

/// POST /deals/{deal_id}/close-won - Close, calculate, and refresh periods.
async fn close_won(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(deal_id): Path<Uuid>,
    Json(payload): Json<CloseWonRequest>,
) -> Response {
    let repo = DealRepository::new((*state.db).clone(), state.calculator());
    let deal = match repo.find(auth.company_id(), deal_id).await {
        Ok(d) => d,
        Err(e) => return commission_error(&e),
    };
    if let Err(response) = authorize_owner(&state, &auth, deal.user_id).await {
        return response;
    }

    match repo
        .close_won(auth.company_id(), deal_id, payload.close_date, auth.user_id())
        .await
    {
        Ok(update) => (StatusCode::OK, Json(DealUpdateResponse::from(update))).into_response(),
        Err(e) => commission_error(&e),
    }
}

/// POST /deals/{deal_id}/close-lost - Close lost and drop an editable commission.
async fn close_lost(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(deal_id): Path<Uuid>,
) -> Response {
    let repo = DealRepository::new((*state.db).clone(), state.calculator());
    let deal = match repo.find(auth.company_id(), deal_id).await {
        Ok(d) => d,
        Err(e) => return commission_error(&e),
    };
    if let Err(response) = authorize_owner(&state, &auth, deal.user_id).await {
        return response;
    }

    match repo.close_lost(auth.company_id(), deal_id).await {
        Ok(update) => (StatusCode::OK, Json(DealUpdateResponse::from(update))).into_response(),
        Err(e) => commission_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_status_accepts_crm_spelling() {
        assert_eq!(parse_status("closedwon").unwrap(), DealStatus::ClosedWon);
        assert!(parse_status("stalled").is_err());
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(
            parse_category(Some("best_case")).unwrap(),
            Some(ForecastCategory::BestCase)
        );
        assert_eq!(parse_category(None).unwrap(), None);
        assert!(parse_category(Some("maybe")).is_err());
    }

    #[test]
    fn test_sync_request_validation() {
        let request = SyncDealRequest {
            crm_id: String::new(),
            name: "Acme".to_string(),
            user_id: None,
            amount: dec!(100),
            close_date: None,
            status: "open".to_string(),
            forecast_category: None,
        };
        assert!(request.validate().is_err());
    }
}
