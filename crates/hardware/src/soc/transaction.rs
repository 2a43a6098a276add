//! Memory bus transactions.
//!
//! This module defines the request that travels from a core's cache, through the
//! bus, to the memory controller and back. It provides:
//! 1. **Identity:** `TxnId`, unique for the lifetime of one simulation.
//! 2. **Timing:** Issue tick set by the cache, completion tick set by the controller.
//! 3. **Wire form:** A fixed 40-byte little-endian frame for logging and replay.
//!
//! # Frame layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0  | 4 | magic `"MCTX"` |
//! | 4  | 1 | access kind tag |
//! | 5  | 1 | cache port tag |
//! | 6  | 2 | source core |
//! | 8  | 8 | transaction id |
//! | 16 | 8 | address |
//! | 24 | 8 | issue tick |
//! | 32 | 8 | completion tick, `u64::MAX` while pending |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::constants::PENDING_TICK;
use crate::common::{AccessType, CachePort, CoreId, PhysAddr, Tick, WireError};

/// Frame magic, ASCII `"MCTX"` read little-endian.
const FRAME_MAGIC: u32 = u32::from_le_bytes(*b"MCTX");

/// Size of an encoded transaction in bytes.
pub const FRAME_BYTES: usize = 40;

/// Unique transaction identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(pub u64);

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn#{}", self.0)
    }
}

/// A cache-line request from one core to memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusTransaction {
    /// Unique id.
    pub id: TxnId,
    /// Issuing core.
    pub source: CoreId,
    /// Cache that issued the request.
    pub port: CachePort,
    /// Line-aligned address.
    pub address: PhysAddr,
    /// Fill (read) or write-back (write).
    pub kind: AccessType,
    /// Tick the cache handed the request to the bus.
    pub issue_tick: Tick,
    /// Tick the controller finished servicing it; `None` while in flight.
    pub completion_tick: Option<Tick>,
}

impl BusTransaction {
    /// Creates a pending transaction.
    pub const fn new(
        id: TxnId,
        source: CoreId,
        port: CachePort,
        address: PhysAddr,
        kind: AccessType,
        issue_tick: Tick,
    ) -> Self {
        Self {
            id,
            source,
            port,
            address,
            kind,
            issue_tick,
            completion_tick: None,
        }
    }

    /// Ticks from issue to completion, once completed.
    pub fn latency(&self) -> Option<Tick> {
        self.completion_tick
            .map(|done| done.saturating_sub(self.issue_tick))
    }

    /// Encodes the transaction into its 40-byte frame.
    pub fn to_bytes(&self) -> [u8; FRAME_BYTES] {
        let mut buf = [0u8; FRAME_BYTES];
        buf[0..4].copy_from_slice(&FRAME_MAGIC.to_le_bytes());
        buf[4] = self.kind.wire_tag();
        buf[5] = self.port.wire_tag();
        buf[6..8].copy_from_slice(&(self.source as u16).to_le_bytes());
        buf[8..16].copy_from_slice(&self.id.0.to_le_bytes());
        buf[16..24].copy_from_slice(&self.address.val().to_le_bytes());
        buf[24..32].copy_from_slice(&self.issue_tick.to_le_bytes());
        let done = self.completion_tick.unwrap_or(PENDING_TICK);
        buf[32..40].copy_from_slice(&done.to_le_bytes());
        buf
    }

    /// Decodes a frame produced by [`BusTransaction::to_bytes`].
    ///
    /// Bytes past the first frame are ignored.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < FRAME_BYTES {
            return Err(WireError::Truncated {
                len: buf.len(),
                expected: FRAME_BYTES,
            });
        }
        let mut word = [0u8; 4];
        word.copy_from_slice(&buf[0..4]);
        let magic = u32::from_le_bytes(word);
        if magic != FRAME_MAGIC {
            return Err(WireError::BadMagic(magic));
        }
        let kind = AccessType::from_wire_tag(buf[4]).ok_or(WireError::BadKind(buf[4]))?;
        let port = CachePort::from_wire_tag(buf[5]).ok_or(WireError::BadPort(buf[5]))?;
        let source = u16::from_le_bytes([buf[6], buf[7]]) as CoreId;
        let done = read_u64(buf, 32);
        Ok(Self {
            id: TxnId(read_u64(buf, 8)),
            source,
            port,
            address: PhysAddr::new(read_u64(buf, 16)),
            kind,
            issue_tick: read_u64(buf, 24),
            completion_tick: (done != PENDING_TICK).then_some(done),
        })
    }
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

impl fmt::Display for BusTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} core{} {} {} {} @{}",
            self.id, self.source, self.port, self.kind, self.address, self.issue_tick
        )
    }
}
