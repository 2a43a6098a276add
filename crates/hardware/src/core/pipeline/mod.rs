//! Per-core pipeline bookkeeping.
//!
//! The core's pipeline is event driven: each stage is an event handler on
//! `Core`. This module holds the state those handlers share, the bounded
//! in-flight window and the instruction lifecycle.

/// In-flight instruction window and lifecycle states.
pub mod rob;

pub use rob::{InFlightWindow, InstState, WindowEntry};
