//! Commission routes: listing, audit trail, workflow, and period rows.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{ensure_can_view, scope_to_user};
use crate::{
    AppState,
    error::{app_error, commission_error, validation_error, workflow_error},
    middleware::AuthUser,
};
use comptrack_core::commission::CommissionKind;
use comptrack_core::period::{Period, PeriodType};
use comptrack_core::workflow::{ApprovalAction, CommissionStatus};
use comptrack_db::{
    CommissionRepository, WorkflowRepository,
    entities::{commission_approvals, commission_periods, commissions},
    repositories::CommissionFilter,
};
use comptrack_shared::AppError;
use comptrack_shared::types::{PageRequest, PageResponse};

/// Creates the commission routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/commissions", get(list_commissions))
        .route("/commissions/bulk-approve", post(bulk_approve))
        .route("/commissions/periods", get(list_periods))
        .route("/commissions/periods/recalculate", post(recalculate_periods))
        .route("/commissions/{commission_id}", get(get_commission))
        .route("/commissions/{commission_id}/approvals", get(list_approvals))
        .route("/commissions/{commission_id}/submit", post(submit))
        .route("/commissions/{commission_id}/approve", post(approve))
        .route("/commissions/{commission_id}/reject", post(reject))
        .route("/commissions/{commission_id}/adjust", post(adjust))
        .route("/commissions/{commission_id}/pay", post(mark_paid))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing commissions.
#[derive(Debug, Deserialize)]
pub struct ListCommissionsQuery {
    /// Only this user's commissions.
    pub user_id: Option<Uuid>,
    /// Filter by workflow status.
    pub status: Option<String>,
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size (max 100).
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    PageRequest::default().page
}

fn default_per_page() -> u32 {
    PageRequest::default().per_page
}

/// Query parameters for period rows.
#[derive(Debug, Deserialize)]
pub struct PeriodsQuery {
    /// Defaults to the caller.
    pub user_id: Option<Uuid>,
}

/// Request body for recalculating period rows.
#[derive(Debug, Deserialize)]
pub struct RecalculateRequest {
    /// Defaults to the caller.
    pub user_id: Option<Uuid>,
    /// "monthly", "quarterly" or "annual".
    pub period_type: String,
    /// First day of the period.
    pub period_start: NaiveDate,
}

/// Request body for approving.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApproveRequest {
    /// Optional notes.
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for rejecting.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    /// Why the commission was rejected.
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

/// Request body for adjusting the amount.
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustRequest {
    /// New commission amount.
    pub amount: Decimal,
    /// Why the amount changed.
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

/// Request body for bulk approval.
#[derive(Debug, Deserialize, Validate)]
pub struct BulkApproveRequest {
    /// Commissions to approve.
    #[validate(length(min = 1, max = 100))]
    pub commission_ids: Vec<Uuid>,
    /// Notes applied to every approval.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Response for a commission.
#[derive(Debug, Serialize)]
pub struct CommissionResponse {
    /// Commission ID.
    pub id: Uuid,
    /// Owner.
    pub user_id: Uuid,
    /// Deal.
    pub deal_id: Uuid,
    /// Target used.
    pub target_id: Option<Uuid>,
    /// Deal amount at calculation time.
    pub deal_amount: Decimal,
    /// Rate at calculation time.
    pub commission_rate: Decimal,
    /// Payout.
    pub commission_amount: Decimal,
    /// Deal close date.
    pub close_date: NaiveDate,
    /// Period type of the target.
    pub period_type: &'static str,
    /// Period start.
    pub period_start: NaiveDate,
    /// Period end.
    pub period_end: NaiveDate,
    /// Workflow status.
    pub status: &'static str,
    /// Calculated or last adjusted.
    pub calculated_at: DateTime<FixedOffset>,
    /// Approved or rejected.
    pub reviewed_at: Option<DateTime<FixedOffset>>,
    /// Approved.
    pub approved_at: Option<DateTime<FixedOffset>>,
    /// Paid.
    pub paid_at: Option<DateTime<FixedOffset>>,
}

impl From<commissions::Model> for CommissionResponse {
    fn from(m: commissions::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            deal_id: m.deal_id,
            target_id: m.target_id,
            deal_amount: m.deal_amount,
            commission_rate: m.commission_rate,
            commission_amount: m.commission_amount,
            close_date: m.close_date,
            period_type: PeriodType::from(m.period_type).as_str(),
            period_start: m.period_start,
            period_end: m.period_end,
            status: CommissionStatus::from(m.status).as_str(),
            calculated_at: m.calculated_at,
            reviewed_at: m.reviewed_at,
            approved_at: m.approved_at,
            paid_at: m.paid_at,
        }
    }
}

/// Response for one audit row.
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    /// Row ID.
    pub id: Uuid,
    /// Action taken.
    pub action: &'static str,
    /// Who.
    pub performed_by: Uuid,
    /// Status before.
    pub previous_status: Option<&'static str>,
    /// Status after.
    pub new_status: &'static str,
    /// Notes or reason.
    pub notes: Option<String>,
    /// When.
    pub created_at: DateTime<FixedOffset>,
}

impl From<commission_approvals::Model> for ApprovalResponse {
    fn from(m: commission_approvals::Model) -> Self {
        Self {
            id: m.id,
            action: ApprovalAction::from(m.action).as_str(),
            performed_by: m.performed_by,
            previous_status: m.previous_status.map(|s| CommissionStatus::from(s).as_str()),
            new_status: CommissionStatus::from(m.new_status).as_str(),
            notes: m.notes,
            created_at: m.created_at,
        }
    }
}

/// Response for one period row.
#[derive(Debug, Serialize)]
pub struct PeriodResponse {
    /// "actual" or "projected".
    pub kind: &'static str,
    /// Period type.
    pub period_type: &'static str,
    /// Period start.
    pub period_start: NaiveDate,
    /// Period end.
    pub period_end: NaiveDate,
    /// Prorated quota.
    pub quota_amount: Decimal,
    /// Won or weighted amount.
    pub total_amount: Decimal,
    /// Commission.
    pub commission_amount: Decimal,
    /// Percent of quota.
    pub attainment_percent: Decimal,
    /// Target used.
    pub target_id: Option<Uuid>,
    /// Last refresh.
    pub calculated_at: DateTime<FixedOffset>,
}

impl From<commission_periods::Model> for PeriodResponse {
    fn from(m: commission_periods::Model) -> Self {
        Self {
            kind: CommissionKind::from(m.kind).as_str(),
            period_type: PeriodType::from(m.period_type).as_str(),
            period_start: m.period_start,
            period_end: m.period_end,
            quota_amount: m.quota_amount,
            total_amount: m.total_amount,
            commission_amount: m.commission_amount,
            attainment_percent: m.attainment_percent,
            target_id: m.target_id,
            calculated_at: m.calculated_at,
        }
    }
}

fn workflow_repo(state: &AppState) -> WorkflowRepository {
    WorkflowRepository::new((*state.db).clone(), state.policy(), state.calculator())
}

fn commission_repo(state: &AppState) -> CommissionRepository {
    CommissionRepository::new((*state.db).clone(), state.calculator())
}

fn transitioned(
    result: Result<commissions::Model, comptrack_core::workflow::WorkflowError>,
) -> Response {
    match result {
        Ok(model) => (StatusCode::OK, Json(CommissionResponse::from(model))).into_response(),
        Err(e) => workflow_error(&e),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /commissions - Paginated list, filtered by user and status.
async fn list_commissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListCommissionsQuery>,
) -> Response {
    let user_ids = match scope_to_user(&state, &auth, query.user_id).await {
        Ok(ids) => ids,
        Err(response) => return response,
    };
    let status = match query.status.as_deref() {
        None => None,
        Some(s) => match CommissionStatus::parse(s) {
            Some(status) => Some(status.into()),
            None => {
                return app_error(&AppError::Validation(format!(
                    "Unknown commission status: {s}"
                )));
            }
        },
    };

    let page = PageRequest {
        page: query.page,
        per_page: query.per_page,
    };
    let filter = CommissionFilter { user_ids, status };

    match commission_repo(&state)
        .list(auth.company_id(), &filter, &page)
        .await
    {
        Ok((rows, total)) => {
            let data: Vec<CommissionResponse> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(PageResponse::new(data, &page, total))).into_response()
        }
        Err(e) => commission_error(&e),
    }
}

/// GET /commissions/{commission_id}
async fn get_commission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(commission_id): Path<Uuid>,
) -> Response {
    let commission = match commission_repo(&state)
        .find(auth.company_id(), commission_id)
        .await
    {
        Ok(c) => c,
        Err(e) => return commission_error(&e),
    };
    if let Err(response) = ensure_can_view(&state, &auth, commission.user_id).await {
        return response;
    }

    (StatusCode::OK, Json(CommissionResponse::from(commission))).into_response()
}

/// GET /commissions/{commission_id}/approvals - Audit trail, oldest first.
async fn list_approvals(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(commission_id): Path<Uuid>,
) -> Response {
    let repo = commission_repo(&state);
    let commission = match repo.find(auth.company_id(), commission_id).await {
        Ok(c) => c,
        Err(e) => return commission_error(&e),
    };
    if let Err(response) = ensure_can_view(&state, &auth, commission.user_id).await {
        return response;
    }

    match repo.approvals(auth.company_id(), commission_id).await {
        Ok(rows) => {
            let data: Vec<ApprovalResponse> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => commission_error(&e),
    }
}

/// POST /commissions/{commission_id}/submit
async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(commission_id): Path<Uuid>,
) -> Response {
    transitioned(
        workflow_repo(&state)
            .submit(auth.company_id(), commission_id, auth.actor())
            .await,
    )
}

/// POST /commissions/{commission_id}/approve
async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(commission_id): Path<Uuid>,
    Json(payload): Json<ApproveRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(&e);
    }
    transitioned(
        workflow_repo(&state)
            .approve(auth.company_id(), commission_id, auth.actor(), payload.notes)
            .await,
    )
}

/// POST /commissions/{commission_id}/reject
async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(commission_id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(&e);
    }
    transitioned(
        workflow_repo(&state)
            .reject(auth.company_id(), commission_id, auth.actor(), payload.reason)
            .await,
    )
}

/// POST /commissions/{commission_id}/adjust
async fn adjust(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(commission_id): Path<Uuid>,
    Json(payload): Json<AdjustRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(&e);
    }
    transitioned(
        workflow_repo(&state)
            .adjust(
                auth.company_id(),
                commission_id,
                auth.actor(),
                payload.amount,
                payload.reason,
            )
            .await,
    )
}

/// POST /commissions/{commission_id}/pay
async fn mark_paid(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(commission_id): Path<Uuid>,
) -> Response {
    transitioned(
        workflow_repo(&state)
            .mark_paid(auth.company_id(), commission_id, auth.actor())
            .await,
    )
}

/// POST /commissions/bulk-approve - Per-item results.
async fn bulk_approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<BulkApproveRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(&e);
    }

    match workflow_repo(&state)
        .bulk_approve(
            auth.company_id(),
            payload.commission_ids,
            auth.actor(),
            payload.notes,
        )
        .await
    {
        Ok(result) => {
            let results: Vec<_> = result
                .results
                .into_iter()
                .map(|r| {
                    json!({
                        "commission_id": r.commission_id,
                        "success": r.success,
                        "error_code": r.error_code,
                        "error": r.error,
                    })
                })
                .collect();
            (
                StatusCode::OK,
                Json(json!({
                    "results": results,
                    "success_count": result.success_count,
                    "failure_count": result.failure_count,
                })),
            )
                .into_response()
        }
        Err(e) => workflow_error(&e),
    }
}

/// GET /commissions/periods - Actual and projected rows for a user.
async fn list_periods(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PeriodsQuery>,
) -> Response {
    let user_id = query.user_id.unwrap_or_else(|| auth.user_id());
    if let Err(response) = ensure_can_view(&state, &auth, user_id).await {
        return response;
    }

    match commission_repo(&state)
        .list_periods(auth.company_id(), user_id)
        .await
    {
        Ok(rows) => {
            let data: Vec<PeriodResponse> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => commission_error(&e),
    }
}

/// POST /commissions/periods/recalculate - Rebuild both rows for a period.
async fn recalculate_periods(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RecalculateRequest>,
) -> Response {
    let user_id = payload.user_id.unwrap_or_else(|| auth.user_id());
    if let Err(response) = ensure_can_view(&state, &auth, user_id).await {
        return response;
    }

    let Some(period_type) = PeriodType::parse(&payload.period_type) else {
        return app_error(&AppError::Validation(format!(
            "Unknown period type: {}",
            payload.period_type
        )));
    };
    let Some(period) = Period::starting_at(payload.period_start, period_type) else {
        return app_error(&AppError::Validation("Period out of range".into()));
    };

    match commission_repo(&state)
        .recalculate_periods(auth.company_id(), user_id, period)
        .await
    {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => commission_error(&e),
    }
}
