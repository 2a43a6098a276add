//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! This policy evicts the line that was filled earliest, regardless of how
//! recently it was hit. Fill order is read from each line's `fill_tick`; lines
//! filled in the same tick are ordered by address.
//!
//! # Performance
//!
//! - **Time Complexity:** `get_victim()`: O(W) where W is the number of ways
//! - **Best Case:** Streaming accesses where every line has equal importance
//! - **Worst Case:** Workloads with strong temporal locality (hot lines age out)

use super::ReplacementPolicy;
use crate::core::units::cache::CacheLine;

/// FIFO policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct FifoPolicy;

impl ReplacementPolicy for FifoPolicy {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn get_victim(&self, set: &[CacheLine]) -> usize {
        set.iter()
            .enumerate()
            .min_by_key(|(_, line)| (line.fill_tick, line.address))
            .map_or(0, |(way, _)| way)
    }
}
