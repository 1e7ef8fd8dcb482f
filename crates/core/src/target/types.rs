//! Target data types.

use comptrack_shared::types::{CompanyId, TargetId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::TargetError;
use crate::period::Period;

/// A quota target for a user, or for every user holding a role when
/// `user_id` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Target ID.
    pub id: TargetId,
    /// Owning company.
    pub company_id: CompanyId,
    /// User the quota belongs to.
    pub user_id: Option<UserId>,
    /// Role the quota applies to when no user is set.
    pub role: Option<String>,
    /// Period covered by the quota.
    pub period: Period,
    /// Quota for the whole period.
    pub quota_amount: Decimal,
    /// Fraction of deal amount paid out, in `[0, 1]`.
    pub commission_rate: Decimal,
    /// Inactive targets are ignored by lookups.
    pub is_active: bool,
    /// Parent target (an annual target for quarterly children).
    pub parent_target_id: Option<TargetId>,
}

impl Target {
    /// Returns true if the target is scoped to this specific user.
    #[must_use]
    pub fn is_for_user(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }

    /// Returns true if the target is a role-wide target for `role`.
    #[must_use]
    pub fn is_for_role(&self, role: &str) -> bool {
        self.user_id.is_none()
            && self
                .role
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Input for creating a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTarget {
    /// Owning company.
    pub company_id: CompanyId,
    /// User the quota belongs to.
    pub user_id: Option<UserId>,
    /// Role the quota applies to when no user is set.
    pub role: Option<String>,
    /// Period covered by the quota.
    pub period: Period,
    /// Quota for the whole period.
    pub quota_amount: Decimal,
    /// Fraction of deal amount paid out.
    pub commission_rate: Decimal,
    /// Parent target, if any.
    pub parent_target_id: Option<TargetId>,
}

impl NewTarget {
    /// Checks the field-level rules for a target.
    ///
    /// # Errors
    ///
    /// - `MissingScope` when neither a user nor a role is given
    /// - `NegativeQuota` when `quota_amount < 0`
    /// - `InvalidRate` when the rate is outside `[0, 1]`
    pub fn validate(&self) -> Result<(), TargetError> {
        let has_role = self.role.as_deref().is_some_and(|r| !r.trim().is_empty());
        if self.user_id.is_none() && !has_role {
            return Err(TargetError::MissingScope);
        }
        if self.quota_amount < Decimal::ZERO {
            return Err(TargetError::NegativeQuota(self.quota_amount));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate > Decimal::ONE {
            return Err(TargetError::InvalidRate(self.commission_rate));
        }
        Ok(())
    }

    /// Materializes the input into an active target with a fresh ID.
    #[must_use]
    pub fn into_target(self) -> Target {
        Target {
            id: TargetId::new(),
            company_id: self.company_id,
            user_id: self.user_id,
            role: self.role,
            period: self.period,
            quota_amount: self.quota_amount,
            commission_rate: self.commission_rate,
            is_active: true,
            parent_target_id: self.parent_target_id,
        }
    }
}
