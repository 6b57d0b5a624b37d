//! AWS-oriented adapters and handlers for budget quarantine.
//!
//! This crate owns runtime integration details (the Lambda entry point, STS,
//! Organizations, EventBridge and SNS adapters) on top of the contract,
//! resolution and dispatch primitives in `budget_guard_core`.

pub mod adapters;
pub mod handlers;
