// ABOUTME: Reassembles concatenated SMS segments arriving in any order into complete messages
// ABOUTME: Buffers segments per reference, total and originator, with optional eviction of stale buffers

use crate::pdu::error::{PduError, PduResult};
use crate::pdu::tpdu::Tpdu;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Identifies the concatenated message a segment belongs to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReassemblyKey {
    pub reference: u16,
    pub total: u8,
    pub originator: String,
}

#[derive(Debug)]
struct Pending {
    segments: Vec<Option<Tpdu>>,
    received: usize,
    started: Instant,
}

/// Collects the segments of concatenated messages
///
/// Each completed message is returned exactly once; its buffer is dropped on
/// completion so a late duplicate starts a new, never-completing buffer
/// rather than re-emitting the message.
#[derive(Debug, Default)]
pub struct Collector {
    pending: HashMap<ReassemblyKey, Pending>,
    timeout: Option<Duration>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict partially received messages older than `timeout` on `expire`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            timeout: Some(timeout),
        }
    }

    /// Number of messages awaiting segments
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Adds a segment, returning every segment of its message in sequence
    /// order once the last one arrives
    ///
    /// A TPDU without a concatenation header completes immediately.
    pub fn collect(&mut self, tpdu: Tpdu) -> PduResult<Option<Vec<Tpdu>>> {
        self.collect_at(tpdu, Instant::now())
    }

    pub fn collect_at(&mut self, tpdu: Tpdu, now: Instant) -> PduResult<Option<Vec<Tpdu>>> {
        let Some(info) = tpdu.concat_info() else {
            return Ok(Some(vec![tpdu]));
        };
        if info.sequence == 0 || info.sequence > info.total {
            return Err(PduError::InvalidSegment {
                sequence: info.sequence,
                total: info.total,
            });
        }
        if info.total == 1 {
            return Ok(Some(vec![tpdu]));
        }

        let key = ReassemblyKey {
            reference: info.reference,
            total: info.total,
            originator: tpdu.address.to_string(),
        };
        let pending = self.pending.entry(key.clone()).or_insert_with(|| Pending {
            segments: vec![None; info.total as usize],
            received: 0,
            started: now,
        });
        let slot = &mut pending.segments[info.sequence as usize - 1];
        if slot.is_some() {
            return Err(PduError::DuplicateSegment {
                reference: info.reference,
                sequence: info.sequence,
            });
        }
        *slot = Some(tpdu);
        pending.received += 1;
        if pending.received < info.total as usize {
            return Ok(None);
        }

        debug!(reference = key.reference, total = key.total, "Concatenated message complete");
        Ok(self
            .pending
            .remove(&key)
            .map(|p| p.segments.into_iter().flatten().collect()))
    }

    /// Drops buffers older than the configured timeout, reporting each one
    pub fn expire(&mut self, now: Instant) -> Vec<PduError> {
        let Some(timeout) = self.timeout else {
            return Vec::new();
        };
        let mut expired = Vec::new();
        self.pending.retain(|key, pending| {
            if now.saturating_duration_since(pending.started) < timeout {
                return true;
            }
            debug!(reference = key.reference, originator = %key.originator, "Evicting stale concatenated message");
            expired.push(PduError::ReassemblyTimeout {
                reference: key.reference,
                received: pending.received,
                total: key.total,
            });
            false
        });
        expired
    }
}
