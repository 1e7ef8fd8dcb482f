//! Access token claims and login payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Company the user belongs to.
    pub company: Uuid,
    /// User's role (`admin`, `manager`, `sales_rep`).
    pub role: String,
    /// Admin flag at token issue time.
    #[serde(default)]
    pub is_admin: bool,
    /// Manager flag at token issue time.
    #[serde(default)]
    pub is_manager: bool,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        company_id: Uuid,
        role: &str,
        flags: (bool, bool),
        expires_at: DateTime<Utc>,
    ) -> Self {
        let (is_admin, is_manager) = flags;
        Self {
            sub: user_id,
            company: company_id,
            role: role.to_string(),
            is_admin,
            is_manager,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the company ID from claims.
    #[must_use]
    pub const fn company_id(&self) -> Uuid {
        self.company
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Access token.
    pub access_token: String,
    /// Token expiration in seconds.
    pub expires_in: i64,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// User email.
    pub email: String,
    /// User full name.
    pub full_name: String,
    /// Company ID.
    pub company_id: Uuid,
    /// Role name.
    pub role: String,
    /// Optional sub-role (e.g. "ae", "sdr").
    pub sub_role: Option<String>,
    /// Admin flag.
    pub is_admin: bool,
    /// Manager flag.
    pub is_manager: bool,
}
