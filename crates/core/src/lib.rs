//! Core business logic for Comptrack.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Quota periods, target lookup, commission math, and the approval state
//! machine all live here.
//!
//! # Modules
//!
//! - `period` - Calendar months, quarters, and years
//! - `target` - Quota targets: resolution, proration, hierarchy
//! - `deal` - Deals and forecast weighting
//! - `commission` - Commission calculation and period aggregation
//! - `workflow` - Approval state machine and authority rules
//! - `team` - Reporting lines
//! - `auth` - Password hashing and roles

pub mod auth;
pub mod commission;
pub mod deal;
pub mod period;
pub mod target;
pub mod team;
pub mod workflow;
