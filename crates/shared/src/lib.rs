//! Shared types, errors, and configuration for Comptrack.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - Access token claims and JWT handling

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, CommissionConfig};
pub use error::{AppError, AppResult, ErrorBody};
pub use jwt::{JwtConfig, JwtError, JwtService, TokenSubject};
