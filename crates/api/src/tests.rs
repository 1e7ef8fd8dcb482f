//! Router tests that need no database.

use axum::{
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use super::{AppState, create_router};
use comptrack_shared::{CommissionConfig, JwtConfig, JwtService, TokenSubject};

fn state(secret: &str) -> AppState {
    AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: Arc::new(JwtService::new(JwtConfig {
            secret: secret.to_string(),
            access_token_expires_secs: 900,
        })),
        commission: CommissionConfig::default(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = create_router(state("secret"))
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let response = create_router(state("secret"))
        .oneshot(Request::get("/api/v1/commissions").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_token");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let response = create_router(state("secret"))
        .oneshot(
            Request::post("/api/v1/targets/repair-orphans")
                .header(AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let foreign = JwtService::new(JwtConfig {
        secret: "someone-else".to_string(),
        access_token_expires_secs: 900,
    });
    let token = foreign
        .generate_access_token(TokenSubject {
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            role: "admin",
            is_admin: true,
            is_manager: false,
        })
        .unwrap();

    let response = create_router(state("secret"))
        .oneshot(
            Request::get("/api/v1/deals")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_cannot_repair_orphans() {
    let state = state("secret");
    let token = state
        .jwt_service
        .generate_access_token(TokenSubject {
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            role: "sales_rep",
            is_admin: false,
            is_manager: false,
        })
        .unwrap();

    let response = create_router(state)
        .oneshot(
            Request::post("/api/v1/targets/repair-orphans")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "FORBIDDEN");
}
