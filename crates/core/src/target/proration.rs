//! Quota proration between period lengths.

use rust_decimal::Decimal;

use super::types::Target;
use crate::period::PeriodType;

/// Converts a quota for one period length into the equivalent for another.
///
/// Annual -> quarterly divides by 4, annual -> monthly by 12, quarterly ->
/// monthly by 3. Converting to a longer period multiplies.
#[must_use]
pub fn prorate_quota(amount: Decimal, from: PeriodType, to: PeriodType) -> Decimal {
    if from == to {
        return amount;
    }
    amount * Decimal::from(to.months()) / Decimal::from(from.months())
}

/// Quota a target contributes to a payout period of `payout` length,
/// rounded to `scale` decimal places.
#[must_use]
pub fn quota_for_period(target: &Target, payout: PeriodType, scale: u32) -> Decimal {
    prorate_quota(target.quota_amount, target.period.period_type, payout).round_dp(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(120000), PeriodType::Annual, PeriodType::Monthly, dec!(10000))]
    #[case(dec!(120000), PeriodType::Annual, PeriodType::Quarterly, dec!(30000))]
    #[case(dec!(30000), PeriodType::Quarterly, PeriodType::Monthly, dec!(10000))]
    #[case(dec!(30000), PeriodType::Quarterly, PeriodType::Annual, dec!(120000))]
    #[case(dec!(10000), PeriodType::Monthly, PeriodType::Quarterly, dec!(30000))]
    #[case(dec!(10000), PeriodType::Monthly, PeriodType::Annual, dec!(120000))]
    #[case(dec!(5000), PeriodType::Monthly, PeriodType::Monthly, dec!(5000))]
    fn test_prorate_quota(
        #[case] amount: Decimal,
        #[case] from: PeriodType,
        #[case] to: PeriodType,
        #[case] expected: Decimal,
    ) {
        assert_eq!(prorate_quota(amount, from, to), expected);
    }

    #[test]
    fn test_uneven_split_keeps_precision_until_rounded() {
        let monthly = prorate_quota(dec!(100000), PeriodType::Annual, PeriodType::Monthly);
        assert_eq!(monthly.round_dp(2), dec!(8333.33));
    }
}
