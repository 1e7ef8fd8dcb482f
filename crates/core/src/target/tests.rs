//! Property tests for target proration, splitting, and resolution.

use chrono::NaiveDate;
use comptrack_shared::types::{CompanyId, TargetId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::hierarchy::TargetHierarchy;
use super::proration::prorate_quota;
use super::resolver::TargetResolver;
use super::types::Target;
use crate::period::{Period, PeriodType};

/// Quota between 0.00 and 10,000,000.00.
fn arb_quota() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_period_type() -> impl Strategy<Value = PeriodType> {
    prop_oneof![
        Just(PeriodType::Monthly),
        Just(PeriodType::Quarterly),
        Just(PeriodType::Annual),
    ]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2035, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn user_target(user_id: UserId, period: Period) -> Target {
    Target {
        id: TargetId::new(),
        company_id: CompanyId::new(),
        user_id: Some(user_id),
        role: None,
        period,
        quota_amount: Decimal::new(100_000, 0),
        commission_rate: Decimal::new(1, 1),
        is_active: true,
        parent_target_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Converting there and back returns the original amount.
    #[test]
    fn prop_proration_round_trips(
        amount in arb_quota(),
        from in arb_period_type(),
        to in arb_period_type(),
    ) {
        let there = prorate_quota(amount, from, to);
        let back = prorate_quota(there, to, from);
        prop_assert_eq!(back.round_dp(2), amount);
    }

    /// Splitting an annual target never loses or invents quota.
    #[test]
    fn prop_split_preserves_total(quota in arb_quota(), date in arb_date()) {
        let mut parent = user_target(UserId::new(), Period::containing(date, PeriodType::Annual).unwrap());
        parent.quota_amount = quota;

        let children = TargetHierarchy::split_annual(&parent, &[]).unwrap();
        let total: Decimal = children.iter().map(|c| c.quota_amount).sum();
        prop_assert_eq!(total, quota);

        // Children tile the parent's year without gaps.
        prop_assert_eq!(children[0].period.start, parent.period.start);
        prop_assert_eq!(children[3].period.end, parent.period.end);
        for pair in children.windows(2) {
            prop_assert_eq!(pair[0].period.end.succ_opt().unwrap(), pair[1].period.start);
        }
    }

    /// When a user has targets of every length, the monthly one wins.
    #[test]
    fn prop_resolver_picks_narrowest(date in arb_date()) {
        let user = UserId::new();
        let targets: Vec<Target> = [PeriodType::Annual, PeriodType::Quarterly, PeriodType::Monthly]
            .into_iter()
            .map(|pt| user_target(user, Period::containing(date, pt).unwrap()))
            .collect();

        let found = TargetResolver::resolve(&targets, user, None, date).unwrap();
        prop_assert_eq!(found.period.period_type, PeriodType::Monthly);
        prop_assert!(found.period.contains(date));
    }
}
