//! Cache Replacement Policies.
//!
//! Implements the algorithms for selecting victim lines in a full cache set.
//! Invalid ways are always filled first by the cache itself; a policy is only
//! consulted once every way of the set holds a valid line.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used, ties broken by the lowest line address.
//! - `Fifo`: First-In, First-Out by fill tick, ties broken by the lowest line address.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;

use super::CacheLine;

/// Trait for cache replacement policies.
///
/// Policies are stateless: the recency and fill information they rank by is
/// carried on each `CacheLine`, so selection is a pure function of the set.
pub trait ReplacementPolicy: Send + Sync + std::fmt::Debug {
    /// Short policy name for diagnostics.
    fn name(&self) -> &'static str;

    /// Selects a victim line to evict from a full set.
    ///
    /// # Arguments
    ///
    /// * `set` - The valid lines of one set, indexed by way.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn get_victim(&self, set: &[CacheLine]) -> usize;
}
