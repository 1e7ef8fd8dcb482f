//! Quota targets: lookup, proration, and the annual -> quarterly hierarchy.

pub mod error;
pub mod hierarchy;
pub mod proration;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::TargetError;
pub use hierarchy::TargetHierarchy;
pub use proration::{prorate_quota, quota_for_period};
pub use resolver::TargetResolver;
pub use types::{NewTarget, Target};
