//! Commission approval workflow.
//!
//! # Modules
//!
//! - `types` - statuses, actions, and audit records
//! - `error` - workflow-specific error types
//! - `service` - state transition logic
//! - `authority` - who may perform which action

pub mod authority;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use authority::{Actor, ApprovalPolicy};
pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{ApprovalAction, AuditRecord, CommissionStatus, WorkflowAction};
