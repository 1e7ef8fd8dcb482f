//! API route definitions.

use axum::{Router, http::StatusCode, middleware, response::Response};
use uuid::Uuid;

use crate::{
    AppState,
    error::{db_error, error_response, forbidden},
    middleware::{AuthUser, auth_middleware},
};
use comptrack_db::UserRepository;

pub mod auth;
pub mod commissions;
pub mod deals;
pub mod health;
pub mod targets;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(targets::routes())
        .merge(deals::routes())
        .merge(commissions::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

// ============================================================================
// Visibility helpers
// ============================================================================

/// Users whose records the caller may see: `None` (everyone) for admins,
/// otherwise the caller plus all direct and indirect reports.
pub(crate) async fn visible_user_ids(
    state: &AppState,
    auth: &AuthUser,
) -> Result<Option<Vec<Uuid>>, Response> {
    if auth.is_admin() {
        return Ok(None);
    }

    let tree = UserRepository::new((*state.db).clone())
        .reporting_tree(auth.company_id())
        .await
        .map_err(|e| db_error(&e))?;

    let mut ids = vec![auth.user_id()];
    ids.extend(
        tree.subordinates(auth.user_id().into())
            .into_iter()
            .map(|id| id.into_inner()),
    );
    Ok(Some(ids))
}

/// Narrows the visible set to one requested user. Fails with 403 outside
/// the caller's team, or 404 when an admin names a user of another company.
pub(crate) async fn scope_to_user(
    state: &AppState,
    auth: &AuthUser,
    requested: Option<Uuid>,
) -> Result<Option<Vec<Uuid>>, Response> {
    let visible = visible_user_ids(state, auth).await?;
    match (requested, visible) {
        (None, visible) => Ok(visible),
        (Some(user_id), None) => {
            let member = UserRepository::new((*state.db).clone())
                .find_by_id(auth.company_id(), user_id)
                .await
                .map_err(|e| db_error(&e))?;
            if member.is_none() {
                return Err(error_response(
                    StatusCode::NOT_FOUND,
                    "USER_NOT_FOUND",
                    format!("User not found: {user_id}"),
                ));
            }
            Ok(Some(vec![user_id]))
        }
        (Some(user_id), Some(ids)) if ids.contains(&user_id) => Ok(Some(vec![user_id])),
        (Some(_), Some(_)) => Err(forbidden("You cannot view this user's records")),
    }
}

/// Fails with 403 unless the caller may see `user_id`'s records.
pub(crate) async fn ensure_can_view(
    state: &AppState,
    auth: &AuthUser,
    user_id: Uuid,
) -> Result<(), Response> {
    scope_to_user(state, auth, Some(user_id)).await.map(|_| ())
}

/// Fails with 403 unless the caller is a company admin.
pub(crate) fn require_admin(auth: &AuthUser) -> Result<(), Response> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(forbidden("Administrator access required"))
    }
}
