//! Quota periods: calendar months, quarters, and years.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Length of a quota period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// One calendar month.
    Monthly,
    /// Three calendar months.
    Quarterly,
    /// Twelve calendar months.
    Annual,
}

impl PeriodType {
    /// Returns the string representation of the period type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }

    /// Parses a period type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Some(Self::Monthly),
            "quarterly" | "quarter" => Some(Self::Quarterly),
            "annual" | "annually" | "yearly" | "year" => Some(Self::Annual),
            _ => None,
        }
    }

    /// Number of calendar months the period spans.
    #[must_use]
    pub const fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Annual => 12,
        }
    }
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive date range tagged with its period type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Period length.
    pub period_type: PeriodType,
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
}

impl Period {
    /// Creates a period, returning `None` when `end` precedes `start`.
    #[must_use]
    pub fn new(period_type: PeriodType, start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self {
            period_type,
            start,
            end,
        })
    }

    /// Returns the calendar month, quarter, or year that contains `date`.
    ///
    /// Returns `None` only at the edges of chrono's representable range.
    #[must_use]
    pub fn containing(date: NaiveDate, period_type: PeriodType) -> Option<Self> {
        let first_month = match period_type {
            PeriodType::Monthly => date.month(),
            PeriodType::Quarterly => (date.month0() / 3) * 3 + 1,
            PeriodType::Annual => 1,
        };
        let start = NaiveDate::from_ymd_opt(date.year(), first_month, 1)?;
        Self::starting_at(start, period_type)
    }

    /// Returns the period of the given type beginning on `start`.
    #[must_use]
    pub fn starting_at(start: NaiveDate, period_type: PeriodType) -> Option<Self> {
        let next = start.checked_add_months(Months::new(period_type.months()))?;
        let end = next.pred_opt()?;
        Some(Self {
            period_type,
            start,
            end,
        })
    }

    /// Returns true if `date` falls within this period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns true if the two periods share at least one day.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of days in the period, inclusive of both ends.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2026, 2, 14), PeriodType::Monthly, date(2026, 2, 1), date(2026, 2, 28))]
    #[case(date(2028, 2, 14), PeriodType::Monthly, date(2028, 2, 1), date(2028, 2, 29))]
    #[case(date(2026, 5, 31), PeriodType::Quarterly, date(2026, 4, 1), date(2026, 6, 30))]
    #[case(date(2026, 12, 1), PeriodType::Quarterly, date(2026, 10, 1), date(2026, 12, 31))]
    #[case(date(2026, 7, 4), PeriodType::Annual, date(2026, 1, 1), date(2026, 12, 31))]
    fn test_containing(
        #[case] day: NaiveDate,
        #[case] period_type: PeriodType,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let period = Period::containing(day, period_type).unwrap();
        assert_eq!(period.start, start);
        assert_eq!(period.end, end);
        assert!(period.contains(day));
    }

    #[test]
    fn test_starting_at_offset_fiscal_year() {
        let period = Period::starting_at(date(2026, 2, 1), PeriodType::Annual).unwrap();
        assert_eq!(period.end, date(2027, 1, 31));
        assert_eq!(period.days(), 365);
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        assert!(Period::new(PeriodType::Monthly, date(2026, 3, 1), date(2026, 2, 1)).is_none());
        assert!(Period::new(PeriodType::Monthly, date(2026, 3, 1), date(2026, 3, 1)).is_some());
    }

    #[test]
    fn test_overlaps_is_inclusive() {
        let q1 = Period::containing(date(2026, 1, 1), PeriodType::Quarterly).unwrap();
        let q2 = Period::containing(date(2026, 4, 1), PeriodType::Quarterly).unwrap();
        let year = Period::containing(date(2026, 1, 1), PeriodType::Annual).unwrap();
        let touching = Period::new(PeriodType::Monthly, date(2026, 3, 31), date(2026, 4, 30)).unwrap();

        assert!(!q1.overlaps(&q2));
        assert!(q1.overlaps(&year));
        assert!(q2.overlaps(&year));
        assert!(touching.overlaps(&q1));
        assert!(touching.overlaps(&q2));
    }

    #[test]
    fn test_period_type_parse() {
        assert_eq!(PeriodType::parse("Quarterly"), Some(PeriodType::Quarterly));
        assert_eq!(PeriodType::parse("yearly"), Some(PeriodType::Annual));
        assert_eq!(PeriodType::parse("weekly"), None);
        assert_eq!(PeriodType::Annual.months(), 12);
    }
}
