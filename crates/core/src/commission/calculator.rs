//! Deal commission calculation.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::CommissionError;
use super::types::{CalculationOutcome, DealCommission, SkipReason};
use crate::deal::{Deal, DealStatus};
use crate::target::{Target, TargetResolver};

/// Computes `deal.amount x target.commission_rate`, rounded to a fixed
/// number of decimal places with midpoints rounded away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionCalculator {
    scale: u32,
}

impl Default for CommissionCalculator {
    fn default() -> Self {
        Self::new(2)
    }
}

impl CommissionCalculator {
    /// Creates a calculator rounding to `scale` decimal places.
    #[must_use]
    pub const fn new(scale: u32) -> Self {
        Self { scale }
    }

    /// Rounding scale in use.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Rounds a money amount the way payouts are rounded.
    #[must_use]
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.scale, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Calculates the commission for a closed-won deal against `target`.
    ///
    /// # Errors
    ///
    /// - `DealNotWon` if the deal is not closed-won
    /// - `MissingCloseDate` if the deal has no close date
    /// - `NegativeAmount` if the deal amount is below zero
    /// - `InvalidRate` if the target's rate is outside `[0, 1]`
    pub fn calculate(&self, deal: &Deal, target: &Target) -> Result<DealCommission, CommissionError> {
        if deal.status != DealStatus::ClosedWon {
            return Err(CommissionError::DealNotWon {
                deal_id: deal.id,
                status: deal.status,
            });
        }
        let close_date = deal
            .close_date
            .ok_or(CommissionError::MissingCloseDate(deal.id))?;
        if deal.amount < Decimal::ZERO {
            return Err(CommissionError::NegativeAmount(deal.amount));
        }
        let rate = target.commission_rate;
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(CommissionError::InvalidRate(rate));
        }

        Ok(DealCommission {
            deal_id: deal.id,
            user_id: deal.user_id,
            company_id: deal.company_id,
            target_id: target.id,
            deal_amount: deal.amount,
            commission_rate: rate,
            commission_amount: self.round(deal.amount * rate),
            close_date,
            period: target.period,
        })
    }

    /// Resolves the applicable target for the deal's owner and close date,
    /// then calculates. A missing target is not an error: it yields
    /// `CalculationOutcome::Skipped`.
    pub fn for_deal(
        &self,
        deal: &Deal,
        targets: &[Target],
        role: Option<&str>,
    ) -> Result<CalculationOutcome, CommissionError> {
        if deal.status != DealStatus::ClosedWon {
            return Err(CommissionError::DealNotWon {
                deal_id: deal.id,
                status: deal.status,
            });
        }
        let close_date = deal
            .close_date
            .ok_or(CommissionError::MissingCloseDate(deal.id))?;

        match TargetResolver::resolve(targets, deal.user_id, role, close_date) {
            Some(target) => self.calculate(deal, target).map(CalculationOutcome::Calculated),
            None => Ok(CalculationOutcome::Skipped {
                reason: SkipReason::NoTarget {
                    user_id: deal.user_id,
                    date: close_date,
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{Period, PeriodType};
    use chrono::NaiveDate;
    use comptrack_shared::types::{CompanyId, DealId, TargetId, UserId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn won_deal(amount: Decimal) -> Deal {
        Deal {
            id: DealId::new(),
            company_id: CompanyId::new(),
            user_id: UserId::new(),
            crm_id: None,
            name: "Globex expansion".into(),
            amount,
            close_date: Some(date(2026, 5, 20)),
            status: DealStatus::ClosedWon,
            forecast_category: None,
        }
    }

    fn target_for(deal: &Deal, rate: Decimal) -> Target {
        Target {
            id: TargetId::new(),
            company_id: deal.company_id,
            user_id: Some(deal.user_id),
            role: None,
            period: Period::containing(date(2026, 1, 1), PeriodType::Annual).unwrap(),
            quota_amount: dec!(500000),
            commission_rate: rate,
            is_active: true,
            parent_target_id: None,
        }
    }

    #[rstest]
    #[case(dec!(50000), dec!(0.10), dec!(5000.00))]
    #[case(dec!(1234.56), dec!(0.075), dec!(92.59))]
    #[case(dec!(0.50), dec!(0.01), dec!(0.01))]
    #[case(dec!(0), dec!(0.10), dec!(0))]
    #[case(dec!(99999), dec!(1), dec!(99999))]
    fn test_calculate(#[case] amount: Decimal, #[case] rate: Decimal, #[case] expected: Decimal) {
        let deal = won_deal(amount);
        let target = target_for(&deal, rate);
        let commission = CommissionCalculator::default().calculate(&deal, &target).unwrap();

        assert_eq!(commission.commission_amount, expected);
        assert_eq!(commission.deal_amount, amount);
        assert_eq!(commission.commission_rate, rate);
        assert_eq!(commission.target_id, target.id);
        assert_eq!(commission.period, target.period);
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        // 0.05 x 0.5 = 0.025
        let deal = won_deal(dec!(0.05));
        let target = target_for(&deal, dec!(0.5));
        let commission = CommissionCalculator::new(2).calculate(&deal, &target).unwrap();
        assert_eq!(commission.commission_amount, dec!(0.03));
    }

    #[test]
    fn test_custom_scale() {
        let deal = won_deal(dec!(1234.56));
        let target = target_for(&deal, dec!(0.075));
        let commission = CommissionCalculator::new(4).calculate(&deal, &target).unwrap();
        assert_eq!(commission.commission_amount, dec!(92.5920));
    }

    #[rstest]
    #[case(DealStatus::Open)]
    #[case(DealStatus::ClosedLost)]
    fn test_rejects_deals_not_won(#[case] status: DealStatus) {
        let mut deal = won_deal(dec!(100));
        deal.status = status;
        let target = target_for(&deal, dec!(0.1));
        assert!(matches!(
            CommissionCalculator::default().calculate(&deal, &target),
            Err(CommissionError::DealNotWon { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let calc = CommissionCalculator::default();

        let deal = won_deal(dec!(-1));
        let target = target_for(&deal, dec!(0.1));
        assert!(matches!(
            calc.calculate(&deal, &target),
            Err(CommissionError::NegativeAmount(_))
        ));

        let deal = won_deal(dec!(100));
        let target = target_for(&deal, dec!(1.01));
        assert!(matches!(
            calc.calculate(&deal, &target),
            Err(CommissionError::InvalidRate(_))
        ));

        let mut deal = won_deal(dec!(100));
        deal.close_date = None;
        let target = target_for(&deal, dec!(0.1));
        assert!(matches!(
            calc.calculate(&deal, &target),
            Err(CommissionError::MissingCloseDate(_))
        ));
    }

    #[test]
    fn test_for_deal_without_target_is_skipped() {
        let deal = won_deal(dec!(100));
        let outcome = CommissionCalculator::default()
            .for_deal(&deal, &[], Some("sales_rep"))
            .unwrap();

        assert_eq!(
            outcome,
            CalculationOutcome::Skipped {
                reason: SkipReason::NoTarget {
                    user_id: deal.user_id,
                    date: date(2026, 5, 20),
                },
            }
        );
        assert!(outcome.commission().is_none());
    }

    #[test]
    fn test_for_deal_uses_resolved_target() {
        let deal = won_deal(dec!(20000));
        let annual = target_for(&deal, dec!(0.05));
        let mut quarterly = target_for(&deal, dec!(0.08));
        quarterly.period = Period::containing(date(2026, 5, 1), PeriodType::Quarterly).unwrap();

        let outcome = CommissionCalculator::default()
            .for_deal(&deal, &[annual, quarterly.clone()], None)
            .unwrap();
        let commission = outcome.commission().unwrap();
        assert_eq!(commission.target_id, quarterly.id);
        assert_eq!(commission.commission_amount, dec!(1600.00));
    }
}
