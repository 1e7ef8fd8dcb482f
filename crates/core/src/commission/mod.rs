//! Commission calculation and per-period aggregation.
//!
//! - `calculator` - deal amount x target rate, with rounding
//! - `aggregate` - actual and projected rows for a payout period
//! - `types` - per-deal commission snapshots and calculation outcomes
//! - `error` - calculation errors

pub mod aggregate;
pub mod calculator;
pub mod error;
pub mod types;


pub use aggregate::{ActualLine, PeriodAggregator, PeriodCommissions, PeriodSummary, attainment};
pub use calculator::CommissionCalculator;
pub use error::CommissionError;
pub use types::{CalculationOutcome, CommissionKind, DealCommission, SkipReason};
