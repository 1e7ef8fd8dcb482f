//! Authentication routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use comptrack_core::auth::{SalesRole, verify_password};
use comptrack_db::UserRepository;
use comptrack_shared::TokenSubject;
use comptrack_shared::auth::{LoginRequest, LoginResponse, UserInfo};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

fn invalid_credentials() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_credentials",
            "message": "Invalid email or password"
        })),
    )
        .into_response()
}

fn login_failed() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred during login"
        })),
    )
        .into_response()
}

/// POST /auth/login - Authenticate user and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return invalid_credentials();
    }

    let user_repo = UserRepository::new((*state.db).clone());

    // Inactive users are filtered out by the lookup.
    let user = match user_repo.find_by_email(payload.email.trim()).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for unknown or inactive user");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return login_failed();
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return login_failed();
        }
    }

    let role = SalesRole::from(user.role);
    let access_token = match state.jwt_service.generate_access_token(TokenSubject {
        user_id: user.id,
        company_id: user.company_id,
        role: role.as_str(),
        is_admin: user.is_admin,
        is_manager: user.is_manager,
    }) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return login_failed();
        }
    };

    info!(user_id = %user.id, "User logged in successfully");

    let response = LoginResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            company_id: user.company_id,
            role: role.as_str().to_string(),
            sub_role: user.sub_role,
            is_admin: user.is_admin,
            is_manager: user.is_manager,
        },
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
