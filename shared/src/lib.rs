//! Shared types and business rules for the Retail Inventory Management Platform
//!
//! This crate contains the domain enums, lifecycle rules, and ledger/money
//! arithmetic shared between the backend and other components of the system.
//! It has no I/O dependencies, so every rule here is directly testable.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
