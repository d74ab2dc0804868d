//! Transaction Staging
//!
//! Each new block re-runs validation and produces a fresh change value.
//! The stabilizer keeps one stable change: it is only replaced when the
//! fresh one differs structurally, and it is pinned while a transaction
//! built from it is awaiting approval or confirmation.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use nau_common::{NauError, NauResult};

use crate::change::TroveChange;

/// Lifecycle of a submitted transaction, as reported by the wallet tracker
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionState {
    #[default]
    Idle,
    WaitingForApproval,
    WaitingForConfirmation,
    Confirmed,
    Failed { reason: String },
    Cancelled,
}

impl TransactionState {
    /// True while the transaction may still land
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::WaitingForApproval | Self::WaitingForConfirmation)
    }
}

/// Result of offering a fresh change to a stable one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stabilized {
    /// Keep the current stable change
    Kept,
    /// Replace the stable change
    Replaced(Option<TroveChange>),
}

/// Decide whether `fresh` replaces `stable`
///
/// A pinned change is never replaced. Otherwise the stable change is kept
/// when `fresh` is structurally equal to it.
pub fn stabilize(stable: Option<&TroveChange>, fresh: Option<&TroveChange>, pinned: bool) -> Stabilized {
    if pinned || stable == fresh {
        Stabilized::Kept
    } else {
        Stabilized::Replaced(fresh.copied())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    transaction_id: String,
    state: TransactionState,
}

/// Holds the stable change across re-validations
#[derive(Debug, Clone, Default)]
pub struct ChangeStabilizer {
    stable: Option<TroveChange>,
    /// Bumped on every replacement
    generation: u64,
    in_flight: Option<InFlight>,
}

impl ChangeStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a freshly validated change; returns the stable one
    pub fn offer(&mut self, fresh: Option<&TroveChange>) -> Option<&TroveChange> {
        match stabilize(self.stable.as_ref(), fresh, self.is_pinned()) {
            Stabilized::Kept => {}
            Stabilized::Replaced(change) => {
                self.stable = change;
                self.generation += 1;
                debug!(
                    "stable change replaced (generation {}): {}",
                    self.generation,
                    change.map_or("none", |c| c.kind().as_str())
                );
            }
        }
        self.stable.as_ref()
    }

    pub fn current(&self) -> Option<&TroveChange> {
        self.stable.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pinned(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.transaction_id.as_str())
    }

    pub fn transaction_state(&self) -> TransactionState {
        self.in_flight
            .as_ref()
            .map(|f| f.state.clone())
            .unwrap_or_default()
    }

    /// Pin the stable change for a transaction about to be sent
    ///
    /// # Errors
    /// `SubmissionInFlight` if another transaction is pending,
    /// `NothingToSubmit` if there is no valid change.
    pub fn pin_for_submission(&mut self, transaction_id: &str) -> NauResult<TroveChange> {
        if let Some(in_flight) = &self.in_flight {
            return Err(NauError::SubmissionInFlight {
                transaction_id: in_flight.transaction_id.clone(),
            });
        }
        let change = self.stable.ok_or(NauError::NothingToSubmit)?;

        self.in_flight = Some(InFlight {
            transaction_id: transaction_id.to_string(),
            state: TransactionState::WaitingForApproval,
        });
        info!("{transaction_id}: pinned {} for submission", change.kind().as_str());
        Ok(change)
    }

    /// Feed a tracker update for the pinned transaction
    ///
    /// Returns true when the update released the pin. Only `Confirmed`,
    /// `Failed` and `Cancelled` release it; `Idle` is ignored while pinned.
    pub fn on_transaction_state(&mut self, state: TransactionState) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            if state.is_pending() {
                warn!("transaction update {state:?} with nothing pinned");
            }
            return false;
        };

        if state.is_pending() {
            in_flight.state = state;
            return false;
        }

        match &state {
            TransactionState::Idle => {
                warn!("{}: ignoring idle update while in flight", in_flight.transaction_id);
                return false;
            }
            TransactionState::Failed { reason } => {
                warn!("{}: transaction failed: {reason}", in_flight.transaction_id)
            }
            other => info!("{}: transaction settled: {other:?}", in_flight.transaction_id),
        }
        self.in_flight = None;
        true
    }
}
