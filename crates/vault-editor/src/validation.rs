//! Change Validation
//!
//! `validate` detects the change between two troves and runs it through an
//! ordered list of rules. The first rule that fails decides the rejection
//! shown to the user; later rules are not evaluated.
//!
//! ## Rule Order
//!
//! 1. `CollateralBalance` - edited collateral within what the account holds
//! 2. `MinimumNetDebt` - net debt at or above `MINIMUM_NET_DEBT`
//! 3. `CollateralRatio` - MCR, or CCR when borrowing in Recovery Mode
//! 4. `RecoveryModeBorrowing` - no borrowing that lowers the TCR in Recovery Mode
//! 5. `RecoveryModeTrigger` - no change that pushes the TCR below CCR
//! 6. `RecoveryModeWithdrawal` - no collateral withdrawal in Recovery Mode
//! 7. `Closure` - not the last trove, not in Recovery Mode
//! 8. `DebtTokenBalance` - repayment covered by the GiB balance

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use nau_common::{
    constants::{limits, ratios},
    math, Decimal, NauResult, Trove,
};

use crate::change::{detect, TroveChange};
use crate::context::ValidationContext;
use crate::rejection::Rejection;

// ============ Rules ============

/// One validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    CollateralBalance,
    MinimumNetDebt,
    CollateralRatio,
    RecoveryModeBorrowing,
    RecoveryModeTrigger,
    RecoveryModeWithdrawal,
    Closure,
    DebtTokenBalance,
}

/// Rules in evaluation order
pub const VALIDATION_RULES: [Rule; 8] = [
    Rule::CollateralBalance,
    Rule::MinimumNetDebt,
    Rule::CollateralRatio,
    Rule::RecoveryModeBorrowing,
    Rule::RecoveryModeTrigger,
    Rule::RecoveryModeWithdrawal,
    Rule::Closure,
    Rule::DebtTokenBalance,
];

impl Rule {
    /// Returns the rejection if `proposal` breaks this rule
    pub fn check(self, proposal: &ProposedChange<'_>) -> Option<Rejection> {
        match self {
            Self::CollateralBalance => check_collateral_balance(proposal),
            Self::MinimumNetDebt => check_minimum_net_debt(proposal),
            Self::CollateralRatio => check_collateral_ratio(proposal),
            Self::RecoveryModeBorrowing => check_recovery_mode_borrowing(proposal),
            Self::RecoveryModeTrigger => check_recovery_mode_trigger(proposal),
            Self::RecoveryModeWithdrawal => check_recovery_mode_withdrawal(proposal),
            Self::Closure => check_closure(proposal),
            Self::DebtTokenBalance => check_debt_token_balance(proposal),
        }
    }
}

/// A detected change together with every derived number the rules read
#[derive(Debug, Clone)]
pub struct ProposedChange<'a> {
    pub original: &'a Trove,
    pub updated: &'a Trove,
    pub change: &'a TroveChange,
    pub context: &'a ValidationContext,
    /// Upper bound for the edited collateral
    pub max_collateral: Decimal,
    pub recovery_mode: bool,
    pub total_collateral_ratio: Decimal,
    /// TCR after replacing `original` with `updated` in the totals
    pub resulting_total_collateral_ratio: Decimal,
    /// Collateral ratio of `updated`
    pub resulting_ratio: Decimal,
}

impl<'a> ProposedChange<'a> {
    pub fn new(
        original: &'a Trove,
        updated: &'a Trove,
        change: &'a TroveChange,
        context: &'a ValidationContext,
        max_collateral: Decimal,
    ) -> NauResult<Self> {
        let total_collateral_ratio = context.total_collateral_ratio()?;
        let resulting_total = context.total.subtract(original)?.add(updated)?;

        Ok(Self {
            original,
            updated,
            change,
            context,
            max_collateral,
            recovery_mode: math::is_recovery_mode(total_collateral_ratio),
            total_collateral_ratio,
            resulting_total_collateral_ratio: resulting_total.collateral_ratio(context.price)?,
            resulting_ratio: updated.collateral_ratio(context.price)?,
        })
    }
}

fn check_collateral_balance(p: &ProposedChange<'_>) -> Option<Rejection> {
    let requested = p.updated.collateral;
    (requested > p.max_collateral).then(|| Rejection::InsufficientCollateralBalance {
        requested,
        available: p.max_collateral,
        shortfall: requested.saturating_sub(p.max_collateral),
    })
}

fn check_minimum_net_debt(p: &ProposedChange<'_>) -> Option<Rejection> {
    let net_debt = p.updated.net_debt();
    let below = match p.change {
        TroveChange::InvalidCreation { .. } => true,
        TroveChange::Adjustment(_) => !p.updated.is_empty() && net_debt < limits::MINIMUM_NET_DEBT,
        TroveChange::Creation(_) | TroveChange::Closure(_) => false,
    };

    below.then(|| Rejection::NetDebtBelowMinimum {
        net_debt,
        minimum: limits::MINIMUM_NET_DEBT,
        shortfall: limits::MINIMUM_NET_DEBT.saturating_sub(net_debt),
    })
}

fn check_collateral_ratio(p: &ProposedChange<'_>) -> Option<Rejection> {
    if !matches!(p.change, TroveChange::Creation(_) | TroveChange::Adjustment(_)) {
        return None;
    }

    let borrowing = p.change.is_creation() || p.change.is_debt_increase();
    if p.recovery_mode && borrowing && math::is_below_critical(p.resulting_ratio) {
        return Some(Rejection::WouldLeaveTroveUndercollateralizedInRecoveryMode {
            ratio: p.resulting_ratio,
            critical: ratios::CCR,
        });
    }

    math::is_below_minimum(p.resulting_ratio).then_some(Rejection::CollateralRatioTooLow {
        ratio: p.resulting_ratio,
        minimum: ratios::MCR,
    })
}

fn check_recovery_mode_borrowing(p: &ProposedChange<'_>) -> Option<Rejection> {
    let restricted = p.recovery_mode
        && p.change.is_debt_increase()
        && p.resulting_total_collateral_ratio < p.total_collateral_ratio;

    restricted.then_some(Rejection::RecoveryModeBorrowingRestricted {
        total_collateral_ratio: p.total_collateral_ratio,
        resulting_total_collateral_ratio: p.resulting_total_collateral_ratio,
    })
}

fn check_recovery_mode_trigger(p: &ProposedChange<'_>) -> Option<Rejection> {
    let triggers = !p.recovery_mode && math::is_recovery_mode(p.resulting_total_collateral_ratio);

    triggers.then_some(Rejection::WouldTriggerRecoveryMode {
        resulting_total_collateral_ratio: p.resulting_total_collateral_ratio,
        critical: ratios::CCR,
    })
}

fn check_recovery_mode_withdrawal(p: &ProposedChange<'_>) -> Option<Rejection> {
    let amount = p.change.delta().withdraw_collateral();
    let forbidden = p.recovery_mode && !p.change.is_closure() && !amount.is_zero();

    forbidden.then_some(Rejection::CollateralWithdrawalInRecoveryMode { amount })
}

fn check_closure(p: &ProposedChange<'_>) -> Option<Rejection> {
    if !p.change.is_closure() {
        return None;
    }
    if p.context.number_of_troves <= 1 {
        return Some(Rejection::CannotCloseLastTrove);
    }
    p.recovery_mode.then_some(Rejection::ClosureInRecoveryMode)
}

fn check_debt_token_balance(p: &ProposedChange<'_>) -> Option<Rejection> {
    let required = p.change.delta().repay;
    let available = p.context.debt_token_balance;

    (required > available).then(|| Rejection::InsufficientDebtTokenBalance {
        required,
        available,
        shortfall: required.saturating_sub(available),
    })
}

// ============ Validation ============

/// Outcome of validating an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validated {
    /// Edited trove is the original position; nothing to do
    Unchanged,
    /// Change passed every rule
    Ready(TroveChange),
    /// First rule that failed
    Rejected(Rejection),
}

impl Validated {
    /// `(change, rejection)`; at most one is `Some`
    pub fn into_parts(self) -> (Option<TroveChange>, Option<Rejection>) {
        match self {
            Self::Unchanged => (None, None),
            Self::Ready(change) => (Some(change), None),
            Self::Rejected(rejection) => (None, Some(rejection)),
        }
    }

    pub fn change(&self) -> Option<&TroveChange> {
        match self {
            Self::Ready(change) => Some(change),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Validate the change from `original` to `updated`
///
/// # Arguments
/// * `original` - Trove as currently on-chain (`Trove::EMPTY` when opening)
/// * `updated` - Trove as edited, fee already folded into its debt
/// * `borrowing_rate` - Rate used to split a debt increase into borrow and fee
/// * `context` - Price, totals and balances
/// * `max_collateral` - Upper bound for `updated.collateral`
///
/// # Errors
/// Only arithmetic failures on inconsistent totals; ratios saturate at
/// `Decimal::INFINITY` and rule violations come back as `Validated::Rejected`.
pub fn validate(
    original: &Trove,
    updated: &Trove,
    borrowing_rate: Decimal,
    context: &ValidationContext,
    max_collateral: Decimal,
) -> NauResult<Validated> {
    if original.same_position(updated) {
        trace!("validate: no change");
        return Ok(Validated::Unchanged);
    }

    let change = detect(original, updated, borrowing_rate)?;
    let proposal = ProposedChange::new(original, updated, &change, context, max_collateral)?;

    for rule in VALIDATION_RULES {
        if let Some(rejection) = rule.check(&proposal) {
            debug!(
                "validate: {} rejected by {:?}: {}",
                change.kind().as_str(),
                rule,
                rejection.code()
            );
            return Ok(Validated::Rejected(rejection));
        }
    }

    debug!(
        "validate: {} ready (coll {}, net debt {}, ratio {})",
        change.kind().as_str(),
        change.delta().collateral,
        change.delta().net_debt,
        proposal.resulting_ratio
    );
    Ok(Validated::Ready(change))
}

/// Submit-time check of the caller's fee tolerance against the quoted rate
pub fn check_borrowing_rate_tolerance(quoted: Decimal, max_borrowing_rate: Decimal) -> Result<(), Rejection> {
    if quoted > max_borrowing_rate {
        return Err(Rejection::BorrowingRateExceedsTolerance {
            quoted,
            max_borrowing_rate,
        });
    }
    Ok(())
}
