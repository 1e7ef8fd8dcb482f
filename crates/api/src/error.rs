//! Mapping of domain errors to `{"error": CODE, "message": text}` responses.
//!
//! Database failures are logged and replaced by a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

use comptrack_core::commission::CommissionError;
use comptrack_core::target::TargetError;
use comptrack_core::workflow::WorkflowError;
use comptrack_shared::AppError;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Builds a JSON error response.
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn from_parts(status: u16, code: &str, message: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(code, error = %message, "request failed");
        return error_response(status, code, INTERNAL_MESSAGE);
    }
    error_response(status, code, message)
}

/// Maps an application error.
pub fn app_error(e: &AppError) -> Response {
    if e.status_code() >= 500 {
        error!(error = %e, "request failed");
    }
    let body = e.to_body();
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

/// Maps a target error.
pub fn target_error(e: &TargetError) -> Response {
    from_parts(e.status_code(), e.error_code(), e.to_string())
}

/// Maps a commission error.
pub fn commission_error(e: &CommissionError) -> Response {
    from_parts(e.status_code(), e.error_code(), e.to_string())
}

/// Maps a workflow error.
pub fn workflow_error(e: &WorkflowError) -> Response {
    from_parts(e.status_code(), e.error_code(), e.to_string())
}

/// Maps a raw database error.
pub fn db_error(e: &sea_orm::DbErr) -> Response {
    app_error(&AppError::Database(e.to_string()))
}

/// Maps request body validation failures.
pub fn validation_error(e: &ValidationErrors) -> Response {
    app_error(&AppError::Validation(e.to_string()))
}

/// 403 with a message.
pub fn forbidden(message: &str) -> Response {
    app_error(&AppError::Forbidden(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptrack_shared::types::{CommissionId, TargetId, UserId};
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(target_error(&TargetError::Overlap { existing: TargetId::new() }), StatusCode::CONFLICT)]
    #[case(target_error(&TargetError::MissingScope), StatusCode::BAD_REQUEST)]
    #[case(commission_error(&CommissionError::NotFound(CommissionId::new())), StatusCode::NOT_FOUND)]
    #[case(commission_error(&CommissionError::UserNotFound(UserId::new())), StatusCode::NOT_FOUND)]
    #[case(target_error(&TargetError::UserNotFound(UserId::new())), StatusCode::NOT_FOUND)]
    #[case(workflow_error(&WorkflowError::CannotModifyPaid), StatusCode::BAD_REQUEST)]
    #[case(workflow_error(&WorkflowError::SelfApproval), StatusCode::FORBIDDEN)]
    #[case(forbidden("admins only"), StatusCode::FORBIDDEN)]
    fn test_status_mapping(#[case] response: Response, #[case] status: StatusCode) {
        assert_eq!(response.status(), status);
    }

    #[tokio::test]
    async fn test_database_details_hidden() {
        let response = workflow_error(&WorkflowError::Database("deadlock detected".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_client_error_keeps_message() {
        let body = body_json(workflow_error(&WorkflowError::RejectionReasonRequired)).await;
        assert_eq!(body["message"], "Rejection reason is required");
    }
}
