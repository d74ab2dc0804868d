//! Debug Introspection
//!
//! Sessions always log their events through `log`. When
//! `debug.introspection` is enabled they also keep a bounded history and can
//! produce a [`DebugReport`] of their internal state.

use log::debug;
use serde::{Deserialize, Serialize};

use nau_common::{NauError, NauResult, Trove};

use crate::change::TroveChange;
use crate::config::DebugConfig;
use crate::events::{EditorEvent, EventLog, Fingerprint};
use crate::stabilize::TransactionState;

/// Snapshot of a session's internals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugReport {
    pub transaction_id: String,
    pub baseline: Trove,
    pub edited: Trove,
    pub stable_change: Option<TroveChange>,
    pub stable_fingerprint: Option<Fingerprint>,
    pub generation: u64,
    pub transaction_state: TransactionState,
    pub events: Vec<EditorEvent>,
}

/// Records events and gates access to them
#[derive(Debug, Clone)]
pub struct Introspector {
    enabled: bool,
    log: EventLog,
}

impl Introspector {
    pub fn new(config: &DebugConfig) -> Self {
        let depth = if config.introspection {
            config.history_depth
        } else {
            0
        };
        Self {
            enabled: config.introspection,
            log: EventLog::new(depth),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, event: EditorEvent) {
        debug!("event: {event:?}");
        self.log.emit(event);
    }

    /// Retained events
    ///
    /// # Errors
    /// `IntrospectionDisabled` unless enabled in the configuration.
    pub fn events(&self) -> NauResult<&EventLog> {
        if !self.enabled {
            return Err(NauError::IntrospectionDisabled);
        }
        Ok(&self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;

    #[test]
    fn test_disabled_keeps_nothing() {
        let mut introspector = Introspector::new(&DebugConfig::default());
        introspector.record(EditorEvent::SessionReset);

        assert!(!introspector.is_enabled());
        assert_eq!(introspector.events().unwrap_err(), NauError::IntrospectionDisabled);
    }

    #[test]
    fn test_enabled_keeps_history() {
        let mut introspector = Introspector::new(&DebugConfig {
            introspection: true,
            history_depth: 4,
        });
        introspector.record(EditorEvent::SessionReset);
        introspector.record(EditorEvent::StableChangeReplaced { generation: 1 });

        let events = introspector.events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events.filter_by_type(EventType::SessionReset).len(), 1);
    }
}
