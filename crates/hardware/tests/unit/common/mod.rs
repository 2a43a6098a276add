//! Unit tests for common types.

/// Physical address alignment and range membership.
pub mod address_arithmetic;

/// Error display and fatality.
pub mod error;
