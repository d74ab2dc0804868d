//! Validation Context
//!
//! A [`StoreSnapshot`] is what the client reads from the chain at one block.
//! [`ValidationContext`] is the checked, derived view of it the validator
//! works against: price, system totals, the quoted borrowing rate and the
//! account's balances.

use log::warn;
use serde::{Deserialize, Serialize};

use nau_common::{
    check,
    constants::limits,
    guards::{require_at_most, require_positive},
    math, Decimal, Fees, NauError, NauResult, Trove,
};

/// Chain state observed at one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Block the snapshot was read at
    #[serde(default)]
    pub block: u64,
    /// The account's own trove
    #[serde(default)]
    pub trove: Trove,
    #[serde(default)]
    pub fees: Fees,
    /// AR price in GiB
    pub price: Decimal,
    /// Sum of all open troves
    pub total: Trove,
    /// Number of open troves
    pub number_of_troves: u64,
    /// AR held by the account
    #[serde(default)]
    pub account_balance: Decimal,
    /// GiB held by the account
    #[serde(default)]
    pub debt_token_balance: Decimal,
    /// GiB deposited in the stability pool
    #[serde(default)]
    pub stability_pool_balance: Decimal,
    /// AR left over after the account's trove was liquidated or redeemed
    #[serde(default)]
    pub collateral_surplus_balance: Decimal,
    /// Recovery-mode flag as reported by the chain, if any
    #[serde(default)]
    pub recovery_mode: Option<bool>,
}

/// Everything the validator needs besides the two troves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub price: Decimal,
    pub total: Trove,
    /// Borrowing rate currently quoted by the fee schedule
    pub borrowing_rate: Decimal,
    pub account_balance: Decimal,
    pub debt_token_balance: Decimal,
    pub number_of_troves: u64,
    pub stability_pool_balance: Decimal,
    pub collateral_surplus_balance: Decimal,
}

impl ValidationContext {
    /// Creates a context with zero balances and a single trove in the system
    pub fn new(price: Decimal, total: Trove, borrowing_rate: Decimal) -> Self {
        Self {
            price,
            total,
            borrowing_rate,
            account_balance: Decimal::ZERO,
            debt_token_balance: Decimal::ZERO,
            number_of_troves: 1,
            stability_pool_balance: Decimal::ZERO,
            collateral_surplus_balance: Decimal::ZERO,
        }
    }

    pub fn with_account_balance(mut self, balance: Decimal) -> Self {
        self.account_balance = balance;
        self
    }

    pub fn with_debt_token_balance(mut self, balance: Decimal) -> Self {
        self.debt_token_balance = balance;
        self
    }

    pub fn with_number_of_troves(mut self, count: u64) -> Self {
        self.number_of_troves = count;
        self
    }

    /// Checks a snapshot and derives a context from it
    ///
    /// # Errors
    /// `MalformedSnapshot` when the price is zero, an open trove carries no
    /// debt, the trove is not part of the totals, or the reported
    /// recovery-mode flag disagrees with the total collateral ratio.
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> NauResult<Self> {
        require_positive(snapshot.price, "price must be positive")?;

        let trove = &snapshot.trove;
        check!(
            !trove.is_open() || !trove.debt.is_zero(),
            NauError::MalformedSnapshot {
                reason: "open trove without debt"
            }
        );
        if trove.is_open() {
            require_at_most(trove.collateral, snapshot.total.collateral, "trove collateral exceeds total")?;
            require_at_most(trove.debt, snapshot.total.debt, "trove debt exceeds total")?;
            check!(
                snapshot.number_of_troves > 0,
                NauError::MalformedSnapshot {
                    reason: "open trove but no troves counted"
                }
            );
        }

        let context = Self {
            price: snapshot.price,
            total: snapshot.total,
            borrowing_rate: snapshot.fees.borrowing_rate()?,
            account_balance: snapshot.account_balance,
            debt_token_balance: snapshot.debt_token_balance,
            number_of_troves: snapshot.number_of_troves,
            stability_pool_balance: snapshot.stability_pool_balance,
            collateral_surplus_balance: snapshot.collateral_surplus_balance,
        };

        let recovery_mode = context.is_recovery_mode()?;
        if let Some(reported) = snapshot.recovery_mode {
            if reported != recovery_mode {
                warn!(
                    "block {}: chain reports recovery mode {} but TCR {} says {}",
                    snapshot.block,
                    reported,
                    context.total_collateral_ratio()?,
                    recovery_mode
                );
                return Err(NauError::MalformedSnapshot {
                    reason: "recovery mode flag disagrees with total collateral ratio",
                });
            }
        }

        Ok(context)
    }

    /// System-wide collateral ratio at the current price
    pub fn total_collateral_ratio(&self) -> NauResult<Decimal> {
        self.total.collateral_ratio(self.price)
    }

    /// True while the total collateral ratio is below CCR
    pub fn is_recovery_mode(&self) -> NauResult<bool> {
        Ok(math::is_recovery_mode(self.total_collateral_ratio()?))
    }

    /// Ratio of `trove` at the current price
    pub fn collateral_ratio(&self, trove: &Trove) -> NauResult<Decimal> {
        trove.collateral_ratio(self.price)
    }

    pub fn minimum_net_debt(&self) -> Decimal {
        limits::MINIMUM_NET_DEBT
    }

    pub fn liquidation_reserve(&self) -> Decimal {
        limits::LIQUIDATION_RESERVE
    }
}
