//! Authentication: password hashing and sales roles.

mod password;

pub use password::{PasswordError, hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// A user's role within a company.
///
/// The `is_admin`/`is_manager` flags on a user can widen what the role allows;
/// see [`crate::workflow::Actor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesRole {
    /// Company administrator.
    Admin,
    /// Sales manager with a team of reports.
    Manager,
    /// Individual contributor carrying a quota.
    SalesRep,
}

impl SalesRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::SalesRep => "sales_rep",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "sales_rep" | "rep" => Some(Self::SalesRep),
            _ => None,
        }
    }

    /// Returns true if this role manages targets for the whole company.
    #[must_use]
    pub const fn can_manage_targets(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for SalesRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
