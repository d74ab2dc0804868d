//! Change Detection
//!
//! Classifies the difference between an original trove and an edited one
//! as a creation, closure, adjustment or invalid creation, and splits any
//! net-debt increase into the borrowed principal and the fee.

use borsh::{BorshDeserialize, BorshSerialize};
use log::trace;
use serde::{Deserialize, Serialize};

use nau_common::{
    constants::limits,
    math::unapply_fee,
    Decimal, Difference, NauResult, Trove,
};

// ============ Delta ============

/// Per-field difference between two troves
///
/// `net_debt` includes the borrowing fee; `borrow` and `fee` are its two
/// parts when it increases, `repay` its magnitude when it decreases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct TroveDelta {
    pub collateral: Difference,
    pub net_debt: Difference,
    pub debt: Difference,
    pub liquidation_reserve: Difference,
    pub borrow: Decimal,
    pub fee: Decimal,
    pub repay: Decimal,
}

impl TroveDelta {
    /// Computes `updated - original` field by field
    pub fn between(original: &Trove, updated: &Trove, borrowing_rate: Decimal) -> NauResult<Self> {
        let net_debt = Difference::between(updated.net_debt(), original.net_debt());
        let (borrow, fee) = if net_debt.is_positive() {
            unapply_fee(net_debt.increase(), borrowing_rate)?
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        Ok(Self {
            collateral: Difference::between(updated.collateral, original.collateral),
            net_debt,
            debt: Difference::between(updated.debt, original.debt),
            liquidation_reserve: Difference::between(reserve_of(updated), reserve_of(original)),
            borrow,
            fee,
            repay: net_debt.decrease(),
        })
    }

    pub fn deposit_collateral(&self) -> Decimal {
        self.collateral.increase()
    }

    pub fn withdraw_collateral(&self) -> Decimal {
        self.collateral.decrease()
    }

    pub fn is_debt_increase(&self) -> bool {
        self.net_debt.is_positive()
    }

    /// True when neither collateral nor debt moves
    pub fn is_zero(&self) -> bool {
        self.collateral.is_zero() && self.debt.is_zero()
    }
}

/// The part of a trove's debt held as liquidation reserve
fn reserve_of(trove: &Trove) -> Decimal {
    trove.debt.min(limits::LIQUIDATION_RESERVE)
}

// ============ Change ============

/// Why a creation attempt is not a valid creation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum InvalidCreationReason {
    /// Debt does not even cover the liquidation reserve
    MissingLiquidationReserve,
    /// Net debt is below `MINIMUM_NET_DEBT`
    NetDebtBelowMinimum,
}

/// Discriminant of a [`TroveChange`], used in logs and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Creation,
    Closure,
    Adjustment,
    InvalidCreation,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Closure => "closure",
            Self::Adjustment => "adjustment",
            Self::InvalidCreation => "invalidCreation",
        }
    }
}

/// Classified difference between two troves
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TroveChange {
    /// Empty trove becomes a trove with debt
    Creation(TroveDelta),
    /// Open trove becomes empty
    Closure(TroveDelta),
    /// Open trove changes collateral and/or debt
    Adjustment(TroveDelta),
    /// Creation attempt that cannot be submitted
    InvalidCreation {
        delta: TroveDelta,
        reason: InvalidCreationReason,
        /// Net debt still missing to reach the minimum
        shortfall: Decimal,
    },
}

impl TroveChange {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Creation(_) => ChangeKind::Creation,
            Self::Closure(_) => ChangeKind::Closure,
            Self::Adjustment(_) => ChangeKind::Adjustment,
            Self::InvalidCreation { .. } => ChangeKind::InvalidCreation,
        }
    }

    pub fn delta(&self) -> &TroveDelta {
        match self {
            Self::Creation(delta) | Self::Closure(delta) | Self::Adjustment(delta) => delta,
            Self::InvalidCreation { delta, .. } => delta,
        }
    }

    pub fn is_creation(&self) -> bool {
        matches!(self, Self::Creation(_))
    }

    pub fn is_closure(&self) -> bool {
        matches!(self, Self::Closure(_))
    }

    pub fn is_debt_increase(&self) -> bool {
        self.delta().is_debt_increase()
    }

    /// Replays the change on `original`
    pub fn apply_to(&self, original: &Trove) -> NauResult<Trove> {
        let delta = self.delta();
        Ok(Trove::new(
            delta.collateral.apply_to(original.collateral)?,
            delta.debt.apply_to(original.debt)?,
        ))
    }
}

// ============ Detection ============

/// Classify `updated` relative to `original`
///
/// Identical positions yield an `Adjustment` with all-zero deltas; callers
/// that need to tell a no-op apart should compare positions first. A trove
/// without debt that gains collateral or debt is a creation attempt, valid
/// only once its net debt reaches `MINIMUM_NET_DEBT`.
pub fn detect(original: &Trove, updated: &Trove, borrowing_rate: Decimal) -> NauResult<TroveChange> {
    let delta = TroveDelta::between(original, updated, borrowing_rate)?;

    let change = if original.same_position(updated) {
        TroveChange::Adjustment(delta)
    } else if original.debt.is_zero() && !updated.is_empty() {
        detect_creation(updated, delta)
    } else if updated.is_empty() {
        TroveChange::Closure(delta)
    } else {
        TroveChange::Adjustment(delta)
    };

    trace!(
        "detect: {} coll {} net debt {} (borrow {}, fee {})",
        change.kind().as_str(),
        delta.collateral,
        delta.net_debt,
        delta.borrow,
        delta.fee
    );
    Ok(change)
}

fn detect_creation(updated: &Trove, delta: TroveDelta) -> TroveChange {
    let net_debt = updated.net_debt();
    let shortfall = limits::MINIMUM_NET_DEBT.saturating_sub(net_debt);

    if updated.debt < limits::LIQUIDATION_RESERVE {
        TroveChange::InvalidCreation {
            delta,
            reason: InvalidCreationReason::MissingLiquidationReserve,
            shortfall,
        }
    } else if net_debt < limits::MINIMUM_NET_DEBT {
        TroveChange::InvalidCreation {
            delta,
            reason: InvalidCreationReason::NetDebtBelowMinimum,
            shortfall,
        }
    } else {
        TroveChange::Creation(delta)
    }
}
