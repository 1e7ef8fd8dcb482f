//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod commission;
pub mod deal;
pub mod target;
pub mod user;
pub mod workflow;

pub use commission::{CommissionFilter, CommissionRepository};
pub use deal::{DealFilter, DealRepository, DealUpdate, SyncDealInput};
pub use target::{TargetFilter, TargetRepository};
pub use user::{CreateUserInput, UserRepository};
pub use workflow::{BulkApproveItemResult, BulkApproveResult, WorkflowRepository};
