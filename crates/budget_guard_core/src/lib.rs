//! Shared budget guardrail domain primitives.
//!
//! This crate owns the quarantine event contract, configuration, the error
//! taxonomy, OU resolution and rule-based dispatch. It intentionally excludes
//! AWS SDK and Lambda runtime concerns; those live in `budget_guard_lambda`.

pub mod arn;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod resolver;
pub mod signal;
