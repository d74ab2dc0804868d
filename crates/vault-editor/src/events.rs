//! Editor Events
//!
//! Events are recorded while a session runs and feed the debug report.
//! Changes are identified by a SHA-256 fingerprint over their borsh
//! encoding, so two structurally equal changes share a fingerprint.

use core::fmt;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use nau_common::{Decimal, NauError, NauResult};

use crate::change::{ChangeKind, TroveChange};

// ============ Fingerprint ============

/// SHA-256 of a change's borsh encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl fmt::Display for Fingerprint {
    /// First 8 bytes in hex
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Fingerprint a change
pub fn fingerprint(change: &TroveChange) -> NauResult<Fingerprint> {
    let bytes = borsh::to_vec(change).map_err(|e| NauError::Encoding {
        reason: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    Ok(Fingerprint(digest))
}

// ============ Events ============

/// Event types for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    // Chain Events (0x01 - 0x0F)
    SnapshotApplied = 0x01,
    EditsRebased = 0x02,

    // Validation Events (0x10 - 0x1F)
    ChangeValidated = 0x10,
    ChangeRejected = 0x11,
    StableChangeReplaced = 0x12,

    // Transaction Events (0x20 - 0x2F)
    ChangePinned = 0x20,
    PinReleased = 0x21,

    // Session Events (0x30 - 0x3F)
    SessionReset = 0x30,
}

/// Something that happened in an editing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorEvent {
    /// A new block's snapshot was applied
    SnapshotApplied { block: u64, recovery_mode: bool },

    /// Unsaved edits were carried over to a moved trove
    EditsRebased {
        block: u64,
        collateral: Decimal,
        net_debt: Decimal,
    },

    /// An edit passed every rule
    ChangeValidated { kind: ChangeKind, fingerprint: Fingerprint },

    /// An edit was rejected
    ChangeRejected { code: String },

    /// The stable change was replaced
    StableChangeReplaced { generation: u64 },

    /// The stable change was pinned for a transaction
    ChangePinned {
        transaction_id: String,
        fingerprint: Fingerprint,
    },

    /// The pinned transaction settled
    PinReleased { transaction_id: String, confirmed: bool },

    /// Local edits were discarded
    SessionReset,
}

impl EditorEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::SnapshotApplied { .. } => EventType::SnapshotApplied,
            Self::EditsRebased { .. } => EventType::EditsRebased,
            Self::ChangeValidated { .. } => EventType::ChangeValidated,
            Self::ChangeRejected { .. } => EventType::ChangeRejected,
            Self::StableChangeReplaced { .. } => EventType::StableChangeReplaced,
            Self::ChangePinned { .. } => EventType::ChangePinned,
            Self::PinReleased { .. } => EventType::PinReleased,
            Self::SessionReset => EventType::SessionReset,
        }
    }
}

/// Bounded event history; the oldest events are dropped first
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<EditorEvent>,
    capacity: usize,
}

impl EventLog {
    /// Create an empty log keeping at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: EditorEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &EditorEvent> {
        self.events.iter()
    }

    /// Copy of all retained events, oldest first
    pub fn to_vec(&self) -> Vec<EditorEvent> {
        self.events.iter().cloned().collect()
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&EditorEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::detect;
    use nau_common::Trove;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_fingerprint_is_structural() {
        let original = Trove::new(d("10"), d("2020"));
        let a = detect(&original, &Trove::new(d("11"), d("2020")), d("0.005")).unwrap();
        let b = detect(&original, &Trove::new(d("11"), d("2020")), d("0.005")).unwrap();
        let c = detect(&original, &Trove::new(d("12"), d("2020")), d("0.005")).unwrap();

        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&c).unwrap());
        assert_eq!(fingerprint(&a).unwrap().to_string().len(), 16);
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = EventLog::new(2);
        log.emit(EditorEvent::SessionReset);
        log.emit(EditorEvent::StableChangeReplaced { generation: 1 });
        log.emit(EditorEvent::StableChangeReplaced { generation: 2 });

        assert_eq!(log.len(), 2);
        assert_eq!(log.filter_by_type(EventType::SessionReset).len(), 0);
        assert_eq!(
            log.to_vec()[0],
            EditorEvent::StableChangeReplaced { generation: 1 }
        );

        let mut off = EventLog::new(0);
        off.emit(EditorEvent::SessionReset);
        assert!(off.is_empty());
    }
}
