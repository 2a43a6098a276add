//! Execution units and functional components.
//!
//! This module contains the per-core hardware resources the timing model
//! reserves: the typed functional-unit pool and the private L1 caches.

/// Set-associative L1 cache model with LRU and FIFO replacement.
pub mod cache;

/// Functional-unit pool (IntAlu, IntMultDiv, MemRead, MemWrite, FloatSimd).
pub mod fu;
