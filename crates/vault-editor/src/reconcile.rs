//! Staging Reconciliation
//!
//! While the user edits a trove, new blocks may change it underneath them
//! (interest, redemptions, another tab). Unsaved edits are kept as a delta
//! against the trove they were made on and re-applied to the new on-chain
//! values.

use log::trace;
use serde::{Deserialize, Serialize};

use nau_common::{Decimal, Difference, Sign, Trove};

/// Locally edited values of a trove form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalEdits {
    pub collateral: Decimal,
    /// Net debt before any new borrowing fee
    pub net_debt: Decimal,
}

impl LocalEdits {
    /// Edits equal to `trove`, i.e. nothing changed yet
    pub fn of(trove: &Trove) -> Self {
        Self {
            collateral: trove.collateral,
            net_debt: trove.net_debt(),
        }
    }
}

/// Carry unsaved edits from `previous` over to `new`
///
/// For each field, the unsaved delta `local - previous` is re-applied to the
/// new value. Increases are added; decreases are subtracted only while they
/// leave something positive, otherwise the field falls back to the new
/// on-chain value. Fields whose on-chain value did not move keep the local
/// value untouched.
pub fn reconcile(previous: &Trove, new: &Trove, local: LocalEdits) -> LocalEdits {
    LocalEdits {
        collateral: rebase(previous.collateral, new.collateral, local.collateral),
        net_debt: rebase(previous.net_debt(), new.net_debt(), local.net_debt),
    }
}

fn rebase(previous: Decimal, current: Decimal, local: Decimal) -> Decimal {
    if previous == current {
        return local;
    }

    let unsaved = Difference::between(local, previous);
    let rebased = match unsaved.sign() {
        Sign::Positive => current.checked_add(unsaved.absolute_value()).unwrap_or(current),
        Sign::Negative if unsaved.absolute_value() < current => {
            current.saturating_sub(unsaved.absolute_value())
        }
        Sign::Negative | Sign::Zero => current,
    };

    trace!("rebase: {previous} -> {current}, unsaved {unsaved}, local {local} -> {rebased}");
    rebased
}

/// Edits staged against a baseline trove
///
/// The baseline follows the chain; the local values follow the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedEdit {
    baseline: Trove,
    local: LocalEdits,
}

impl StagedEdit {
    pub fn new(baseline: Trove) -> Self {
        Self {
            baseline,
            local: LocalEdits::of(&baseline),
        }
    }

    pub fn baseline(&self) -> &Trove {
        &self.baseline
    }

    pub fn local(&self) -> LocalEdits {
        self.local
    }

    pub fn collateral(&self) -> Decimal {
        self.local.collateral
    }

    pub fn net_debt(&self) -> Decimal {
        self.local.net_debt
    }

    pub fn set_collateral(&mut self, collateral: Decimal) {
        self.local.collateral = collateral;
    }

    pub fn set_net_debt(&mut self, net_debt: Decimal) {
        self.local.net_debt = net_debt;
    }

    /// True when the local values differ from the baseline
    pub fn is_dirty(&self) -> bool {
        self.local != LocalEdits::of(&self.baseline)
    }

    /// Discard local edits
    pub fn reset(&mut self) {
        self.local = LocalEdits::of(&self.baseline);
    }

    /// Move the baseline to `trove`, rebasing local edits
    ///
    /// Returns true when the baseline actually moved.
    pub fn apply_snapshot(&mut self, trove: Trove) -> bool {
        if self.baseline == trove {
            return false;
        }

        self.local = reconcile(&self.baseline, &trove, self.local);
        self.baseline = trove;
        true
    }
}
