//! Main memory.
//!
//! Memory contents are not modelled; only access timing is. The controller
//! serves the single physical range and converts bus transactions into
//! completion events.

/// Memory controller and DRAM timing models.
pub mod controller;

pub use controller::{ControllerStats, DramTiming, MemoryController, SimpleTiming, TimingModel};
