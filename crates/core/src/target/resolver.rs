//! Picks the target that applies to a deal.

use std::cmp::Reverse;

use chrono::NaiveDate;
use comptrack_shared::types::UserId;

use super::types::Target;

/// Stateless lookup of the applicable target for a user on a date.
pub struct TargetResolver;

impl TargetResolver {
    /// Finds the active target whose period contains `date`.
    ///
    /// Precedence, highest first:
    /// 1. a target assigned to the user beats a role-wide target
    /// 2. the narrowest period wins (monthly, then quarterly, then annual)
    /// 3. the latest `period.start` wins
    ///
    /// Returns `None` when nothing matches.
    #[must_use]
    pub fn resolve<'a>(
        targets: &'a [Target],
        user_id: UserId,
        role: Option<&str>,
        date: NaiveDate,
    ) -> Option<&'a Target> {
        targets
            .iter()
            .filter(|t| t.is_active && t.period.contains(date))
            .filter(|t| t.is_for_user(user_id) || role.is_some_and(|r| t.is_for_role(r)))
            .min_by_key(|t| {
                (
                    !t.is_for_user(user_id),
                    t.period.period_type.months(),
                    Reverse(t.period.start),
                )
            })
    }

    /// Finds the target governing a whole period: same period type, fully
    /// covering `[start, end]`, falling back to the narrowest wider target.
    #[must_use]
    pub fn resolve_for_period<'a>(
        targets: &'a [Target],
        user_id: UserId,
        role: Option<&str>,
        period: &crate::period::Period,
    ) -> Option<&'a Target> {
        targets
            .iter()
            .filter(|t| t.is_active)
            .filter(|t| t.period.start <= period.start && t.period.end >= period.end)
            .filter(|t| t.period.period_type.months() >= period.period_type.months())
            .filter(|t| t.is_for_user(user_id) || role.is_some_and(|r| t.is_for_role(r)))
            .min_by_key(|t| {
                (
                    !t.is_for_user(user_id),
                    t.period.period_type.months(),
                    Reverse(t.period.start),
                )
            })
    }
}
