//! Per-period actual and projected commission rows.

use comptrack_shared::types::TargetId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculator::CommissionCalculator;
use super::types::CommissionKind;
use crate::deal::{Deal, DealStatus};
use crate::period::Period;
use crate::target::{Target, quota_for_period};

/// One closed-won deal's contribution to the actual row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualLine {
    /// Deal amount.
    pub deal_amount: Decimal,
    /// Commission recorded for the deal.
    pub commission_amount: Decimal,
}

/// One aggregate row for a user and payout period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Actual or projected.
    pub kind: CommissionKind,
    /// Payout period.
    pub period: Period,
    /// Quota prorated to the payout period.
    pub quota_amount: Decimal,
    /// Won amount for actual rows, weighted open amount for projected rows.
    pub total_amount: Decimal,
    /// Commission for `total_amount`.
    pub commission_amount: Decimal,
    /// Percentage of quota reached (projected rows include won deals).
    pub attainment_percent: Decimal,
    /// Target that supplied quota and rate.
    pub target_id: Option<TargetId>,
}

/// The pair of rows kept per user and payout period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCommissions {
    /// From closed-won deals.
    pub actual: PeriodSummary,
    /// From open deals weighted by forecast category.
    pub projected: PeriodSummary,
}

/// Builds aggregate rows.
pub struct PeriodAggregator;

impl PeriodAggregator {
    /// Summarizes a payout period.
    ///
    /// `actual` holds the per-deal commissions already recorded for deals
    /// closed in the period. `open_deals` may contain anything; only open
    /// deals whose close date falls in the period are weighted.
    /// Without a target the quota and projected commission are zero.
    #[must_use]
    pub fn summarize(
        period: Period,
        target: Option<&Target>,
        actual: &[ActualLine],
        open_deals: &[Deal],
        calculator: CommissionCalculator,
    ) -> PeriodCommissions {
        let quota = target.map_or(Decimal::ZERO, |t| {
            quota_for_period(t, period.period_type, calculator.scale())
        });
        let rate = target.map_or(Decimal::ZERO, |t| t.commission_rate);
        let target_id = target.map(|t| t.id);

        let won: Decimal = actual.iter().map(|l| l.deal_amount).sum();
        let earned: Decimal = actual.iter().map(|l| l.commission_amount).sum();

        let weighted: Decimal = open_deals
            .iter()
            .filter(|d| d.status == DealStatus::Open)
            .filter(|d| d.close_date.is_some_and(|date| period.contains(date)))
            .map(Deal::weighted_amount)
            .sum();
        let weighted = calculator.round(weighted);

        PeriodCommissions {
            actual: PeriodSummary {
                kind: CommissionKind::Actual,
                period,
                quota_amount: quota,
                total_amount: won,
                commission_amount: earned,
                attainment_percent: attainment(won, quota),
                target_id,
            },
            projected: PeriodSummary {
                kind: CommissionKind::Projected,
                period,
                quota_amount: quota,
                total_amount: weighted,
                commission_amount: calculator.round(weighted * rate),
                attainment_percent: attainment(won + weighted, quota),
                target_id,
            },
        }
    }
}

/// `amount / quota` as a percentage with two decimals. Zero quota gives zero.
#[must_use]
pub fn attainment(amount: Decimal, quota: Decimal) -> Decimal {
    if quota.is_zero() {
        return Decimal::ZERO;
    }
    (amount / quota * Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::ForecastCategory;
    use crate::period::PeriodType;
    use chrono::NaiveDate;
    use comptrack_shared::types::{CompanyId, DealId, UserId};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn annual_target(quota: Decimal) -> Target {
        Target {
            id: TargetId::new(),
            company_id: CompanyId::new(),
            user_id: Some(UserId::new()),
            role: None,
            period: Period::containing(date(2026, 1, 1), PeriodType::Annual).unwrap(),
            quota_amount: quota,
            commission_rate: dec!(0.10),
            is_active: true,
            parent_target_id: None,
        }
    }

    fn open_deal(amount: Decimal, close: NaiveDate, category: ForecastCategory) -> Deal {
        Deal {
            id: DealId::new(),
            company_id: CompanyId::new(),
            user_id: UserId::new(),
            crm_id: None,
            name: "open".into(),
            amount,
            close_date: Some(close),
            status: DealStatus::Open,
            forecast_category: Some(category),
        }
    }

    #[test]
    fn test_quarter_of_annual_target() {
        let target = annual_target(dec!(400000));
        let q2 = Period::containing(date(2026, 4, 1), PeriodType::Quarterly).unwrap();
        let actual = [
            ActualLine {
                deal_amount: dec!(50000),
                commission_amount: dec!(5000),
            },
            ActualLine {
                deal_amount: dec!(30000),
                commission_amount: dec!(3000),
            },
        ];
        let open = [
            open_deal(dec!(40000), date(2026, 5, 1), ForecastCategory::Commit),
            open_deal(dec!(10000), date(2026, 6, 30), ForecastCategory::Pipeline),
            // Outside the quarter.
            open_deal(dec!(99999), date(2026, 7, 1), ForecastCategory::Commit),
        ];

        let rows = PeriodAggregator::summarize(
            q2,
            Some(&target),
            &actual,
            &open,
            CommissionCalculator::default(),
        );

        assert_eq!(rows.actual.quota_amount, dec!(100000));
        assert_eq!(rows.actual.total_amount, dec!(80000));
        assert_eq!(rows.actual.commission_amount, dec!(8000));
        assert_eq!(rows.actual.attainment_percent, dec!(80.00));

        // 40000 x 0.75 + 10000 x 0.10
        assert_eq!(rows.projected.total_amount, dec!(31000));
        assert_eq!(rows.projected.commission_amount, dec!(3100));
        assert_eq!(rows.projected.attainment_percent, dec!(111.00));
        assert_eq!(rows.projected.target_id, Some(target.id));
    }

    #[test]
    fn test_without_target() {
        let month = Period::containing(date(2026, 2, 1), PeriodType::Monthly).unwrap();
        let actual = [ActualLine {
            deal_amount: dec!(1000),
            commission_amount: dec!(100),
        }];
        let open = [open_deal(dec!(2000), date(2026, 2, 10), ForecastCategory::BestCase)];

        let rows =
            PeriodAggregator::summarize(month, None, &actual, &open, CommissionCalculator::default());

        assert_eq!(rows.actual.quota_amount, Decimal::ZERO);
        assert_eq!(rows.actual.attainment_percent, Decimal::ZERO);
        assert_eq!(rows.projected.total_amount, dec!(500));
        assert_eq!(rows.projected.commission_amount, Decimal::ZERO);
        assert_eq!(rows.projected.target_id, None);
    }

    #[test]
    fn test_attainment() {
        assert_eq!(attainment(dec!(50), dec!(200)), dec!(25.00));
        assert_eq!(attainment(dec!(1), dec!(3)), dec!(33.33));
        assert_eq!(attainment(dec!(10), Decimal::ZERO), Decimal::ZERO);
    }
}
