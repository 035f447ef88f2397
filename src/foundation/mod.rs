//! Errors, configuration, diagnostics and shared value types.

/// Cooperative cancellation.
pub mod abort;
/// Environment-driven runtime configuration.
pub mod config;
/// Extents, stamps and other shared value types.
pub mod core;
pub mod diagnostics;
/// Crate-wide error type.
pub mod error;
/// Fixed-point helpers.
pub mod math;
