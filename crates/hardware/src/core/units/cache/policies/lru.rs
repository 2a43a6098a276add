//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the line whose last access is oldest. Each line carries
//! the tick of its most recent hit or fill, so the victim is simply the minimum
//! of `(last_access_tick, address)` over the set. Two lines touched in the same
//! tick are ordered by address, which keeps eviction deterministic.
//!
//! # Performance
//!
//! - **Time Complexity:** `get_victim()`: O(W) where W is the number of ways
//! - **Space Complexity:** None beyond the per-line tick already stored by the cache
//! - **Best Case:** Workloads with strong temporal locality
//! - **Worst Case:** Cyclic scans one line larger than the set (thrashing)

use super::ReplacementPolicy;
use crate::core::units::cache::CacheLine;

/// LRU policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct LruPolicy;

impl ReplacementPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "LRU"
    }

    /// Returns the way with the smallest `(last_access_tick, address)`.
    fn get_victim(&self, set: &[CacheLine]) -> usize {
        set.iter()
            .enumerate()
            .min_by_key(|(_, line)| (line.last_access_tick, line.address))
            .map_or(0, |(way, _)| way)
    }
}
