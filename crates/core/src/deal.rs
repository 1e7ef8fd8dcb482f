//! Deals and forecast weighting.

use chrono::NaiveDate;
use comptrack_shared::types::{CompanyId, DealId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Deal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    /// Still being worked.
    Open,
    /// Won. Drives commissions.
    ClosedWon,
    /// Lost.
    ClosedLost,
}

impl DealStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::ClosedWon => "closed_won",
            Self::ClosedLost => "closed_lost",
        }
    }

    /// Parses a status, accepting the CRM's `closedwon`/`closedlost` spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed_won" | "closedwon" | "won" => Some(Self::ClosedWon),
            "closed_lost" | "closedlost" | "lost" => Some(Self::ClosedLost),
            _ => None,
        }
    }

    /// Returns true for either closed state.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The CRM's confidence bucket for an open deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastCategory {
    /// Early stage.
    Pipeline,
    /// Possible this period.
    BestCase,
    /// Expected to close.
    Commit,
    /// Excluded from the forecast.
    Omitted,
}

impl ForecastCategory {
    /// Returns the string representation of the category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::BestCase => "best_case",
            Self::Commit => "commit",
            Self::Omitted => "omitted",
        }
    }

    /// Parses a category from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pipeline" => Some(Self::Pipeline),
            "best_case" | "bestcase" => Some(Self::BestCase),
            "commit" => Some(Self::Commit),
            "omitted" => Some(Self::Omitted),
            _ => None,
        }
    }

    /// Probability used to weight an open deal in projections.
    #[must_use]
    pub fn probability(&self) -> Decimal {
        match self {
            Self::Pipeline => Decimal::new(10, 2),
            Self::BestCase => Decimal::new(25, 2),
            Self::Commit => Decimal::new(75, 2),
            Self::Omitted => Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for ForecastCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deal owned by a sales user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Deal ID.
    pub id: DealId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Deal owner.
    pub user_id: UserId,
    /// External CRM identifier.
    pub crm_id: Option<String>,
    /// Display name.
    pub name: String,
    /// Deal value.
    pub amount: Decimal,
    /// Actual or expected close date.
    pub close_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: DealStatus,
    /// Forecast bucket, when the CRM provides one.
    pub forecast_category: Option<ForecastCategory>,
}

impl Deal {
    /// Amount weighted by forecast probability. Only open deals carry
    /// weight; a missing category counts as omitted.
    #[must_use]
    pub fn weighted_amount(&self) -> Decimal {
        if self.status != DealStatus::Open {
            return Decimal::ZERO;
        }
        let probability = self
            .forecast_category
            .map_or(Decimal::ZERO, |c| c.probability());
        self.amount * probability
    }

    /// Returns true if the deal is closed-won.
    #[must_use]
    pub fn is_won(&self) -> bool {
        self.status == DealStatus::ClosedWon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn deal(status: DealStatus, category: Option<ForecastCategory>) -> Deal {
        Deal {
            id: DealId::new(),
            company_id: CompanyId::new(),
            user_id: UserId::new(),
            crm_id: Some("hs-1001".into()),
            name: "Acme renewal".into(),
            amount: dec!(40000),
            close_date: None,
            status,
            forecast_category: category,
        }
    }

    #[rstest]
    #[case(Some(ForecastCategory::Pipeline), dec!(4000))]
    #[case(Some(ForecastCategory::BestCase), dec!(10000))]
    #[case(Some(ForecastCategory::Commit), dec!(30000))]
    #[case(Some(ForecastCategory::Omitted), dec!(0))]
    #[case(None, dec!(0))]
    fn test_weighted_amount(#[case] category: Option<ForecastCategory>, #[case] expected: Decimal) {
        assert_eq!(deal(DealStatus::Open, category).weighted_amount(), expected);
    }

    #[test]
    fn test_closed_deals_carry_no_weight() {
        let won = deal(DealStatus::ClosedWon, Some(ForecastCategory::Commit));
        assert_eq!(won.weighted_amount(), Decimal::ZERO);
        assert!(won.is_won());
    }

    #[test]
    fn test_parse_crm_spellings() {
        assert_eq!(DealStatus::parse("closedwon"), Some(DealStatus::ClosedWon));
        assert_eq!(DealStatus::parse("Closed_Lost"), Some(DealStatus::ClosedLost));
        assert_eq!(DealStatus::parse("appointmentscheduled"), None);
        assert_eq!(ForecastCategory::parse("bestcase"), Some(ForecastCategory::BestCase));
        assert!(DealStatus::ClosedLost.is_closed());
        assert!(!DealStatus::Open.is_closed());
    }
}
