//! Unit tests for execution resources.

/// Cache model and replacement policies.
pub mod cache;
