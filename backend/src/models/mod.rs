//! Database models for the Retail Inventory Management Platform
//!
//! Re-exports domain models from the shared crate

pub use shared::models::*;
