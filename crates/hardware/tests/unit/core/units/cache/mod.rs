//! Cache tests.


/// Victim selection in isolation.
pub mod policies;
