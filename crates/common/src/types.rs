//! Core Types for the NAU Vault Editor
//!
//! Troves (borrower positions) and the fee schedule, as read from the
//! protocol's contracts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{fees, limits};
use crate::decimal::Decimal;
use crate::errors::NauResult;
use crate::math;

// ============ Trove Types ============

/// On-chain status of a trove
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TroveStatus {
    /// The account never opened a trove (or it was fully reset)
    #[default]
    NonExistent,
    /// Trove is active
    Open,
    /// Owner repaid and closed the trove
    ClosedByOwner,
    /// Trove was liquidated
    ClosedByLiquidation,
    /// Trove was fully redeemed against
    ClosedByRedemption,
}

/// A borrower position: collateral in AR, debt in GiB
///
/// Debt includes the liquidation reserve and any borrowed fees. Two troves
/// describe the same position when collateral and debt match; the status
/// only tells how an empty trove came to be empty.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct Trove {
    /// Collateral amount in AR
    pub collateral: Decimal,
    /// Total debt in GiB (net debt + liquidation reserve)
    pub debt: Decimal,
    /// On-chain status
    #[serde(default)]
    pub status: TroveStatus,
}

impl Trove {
    /// The empty position a new trove is created from
    pub const EMPTY: Self = Self {
        collateral: Decimal::ZERO,
        debt: Decimal::ZERO,
        status: TroveStatus::NonExistent,
    };

    /// Creates a candidate trove; empty positions are `NonExistent`, others `Open`
    pub fn new(collateral: Decimal, debt: Decimal) -> Self {
        let status = if collateral.is_zero() && debt.is_zero() {
            TroveStatus::NonExistent
        } else {
            TroveStatus::Open
        };
        Self {
            collateral,
            debt,
            status,
        }
    }

    /// Same position with an explicit status
    pub fn with_status(self, status: TroveStatus) -> Self {
        Self { status, ..self }
    }

    /// Returns true if the trove is open on-chain
    pub fn is_open(&self) -> bool {
        self.status == TroveStatus::Open
    }

    /// Returns true if both collateral and debt are zero
    pub fn is_empty(&self) -> bool {
        self.collateral.is_zero() && self.debt.is_zero()
    }

    /// Returns net debt (total debt minus liquidation reserve)
    pub fn net_debt(&self) -> Decimal {
        self.debt.saturating_sub(limits::LIQUIDATION_RESERVE)
    }

    /// Compares collateral and debt, ignoring status
    pub fn same_position(&self, other: &Self) -> bool {
        self.collateral == other.collateral && self.debt == other.debt
    }

    /// Collateral ratio at `price`; `Decimal::INFINITY` when debt is zero
    pub fn collateral_ratio(&self, price: Decimal) -> NauResult<Decimal> {
        math::collateral_ratio(self.collateral, self.debt, price)
    }

    /// Component-wise sum, used to fold a trove into the system total
    pub fn add(&self, other: &Self) -> NauResult<Self> {
        Ok(Self::new(
            self.collateral.checked_add(other.collateral)?,
            self.debt.checked_add(other.debt)?,
        ))
    }

    /// Component-wise difference, used to take a trove out of the system total
    pub fn subtract(&self, other: &Self) -> NauResult<Self> {
        Ok(Self::new(
            self.collateral.checked_sub(other.collateral)?,
            self.debt.checked_sub(other.debt)?,
        ))
    }
}

// ============ Fee Types ============

/// Borrowing fee schedule
///
/// The base rate jumps on redemptions and decays by `MINUTE_DECAY_FACTOR`
/// every minute afterwards. The borrowing rate is the base rate on top of
/// the 0.5% floor, capped at 5%, and zero while the system is in Recovery
/// Mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct Fees {
    /// Base rate as of the last fee operation
    pub base_rate_without_decay: Decimal,
    /// Unix time (seconds) of the last fee operation
    pub last_fee_operation: u64,
    /// Unix time (seconds) of the latest block
    pub time_of_latest_block: u64,
    /// Whether the system is in Recovery Mode
    pub recovery_mode: bool,
}

impl Fees {
    /// Creates a fee schedule
    pub fn new(
        base_rate_without_decay: Decimal,
        last_fee_operation: u64,
        time_of_latest_block: u64,
        recovery_mode: bool,
    ) -> Self {
        Self {
            base_rate_without_decay,
            last_fee_operation,
            time_of_latest_block,
            recovery_mode,
        }
    }

    /// Base rate decayed up to `when` (unix seconds)
    pub fn base_rate_at(&self, when: u64) -> NauResult<Decimal> {
        let minutes = when.saturating_sub(self.last_fee_operation) / fees::SECONDS_PER_MINUTE;
        math::decay_base_rate(self.base_rate_without_decay, minutes)
    }

    /// Borrowing rate at `when` (unix seconds)
    pub fn borrowing_rate_at(&self, when: u64) -> NauResult<Decimal> {
        if self.recovery_mode {
            return Ok(Decimal::ZERO);
        }

        let rate = fees::MINIMUM_BORROWING_RATE.checked_add(self.base_rate_at(when)?)?;
        Ok(math::clamp_borrowing_rate(rate))
    }

    /// Borrowing rate as of the latest block
    pub fn borrowing_rate(&self) -> NauResult<Decimal> {
        self.borrowing_rate_at(self.time_of_latest_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_net_debt_subtracts_reserve() {
        let debt = d("500").checked_add(limits::LIQUIDATION_RESERVE).unwrap();
        let trove = Trove::new(d("10"), debt);
        assert_eq!(trove.net_debt(), d("500"));

        // Never negative
        assert_eq!(Trove::new(d("10"), d("1")).net_debt(), Decimal::ZERO);
    }

    #[test]
    fn test_new_trove_status() {
        assert_eq!(Trove::new(Decimal::ZERO, Decimal::ZERO).status, TroveStatus::NonExistent);
        assert_eq!(Trove::new(d("1"), d("100")).status, TroveStatus::Open);
        assert!(Trove::EMPTY.is_empty());
    }

    #[test]
    fn test_same_position_ignores_status() {
        let open = Trove::new(d("1"), d("100"));
        let closed = open.with_status(TroveStatus::ClosedByOwner);
        assert!(open.same_position(&closed));
        assert_ne!(open, closed);
    }

    #[test]
    fn test_collateral_ratio() {
        // 11 AR at 10 GiB against 100 GiB = 110%
        let trove = Trove::new(d("11"), d("100"));
        assert_eq!(trove.collateral_ratio(d("10")).unwrap(), d("1.1"));
        assert_eq!(Trove::EMPTY.collateral_ratio(d("10")).unwrap(), Decimal::INFINITY);
    }

    #[test]
    fn test_add_subtract_round_trip() {
        let total = Trove::new(d("1000"), d("50000"));
        let trove = Trove::new(d("10"), d("2000"));
        let without = total.subtract(&trove).unwrap();
        assert_eq!(without.add(&trove).unwrap(), total);
        assert!(trove.subtract(&total).is_err());
    }

    #[test]
    fn test_borrowing_rate_floor_and_cap() {
        let fees = Fees::new(Decimal::ZERO, 0, 0, false);
        assert_eq!(fees.borrowing_rate().unwrap(), d("0.005"));

        let fees = Fees::new(d("0.2"), 0, 0, false);
        assert_eq!(fees.borrowing_rate().unwrap(), d("0.05"));
    }

    #[test]
    fn test_borrowing_rate_decays() {
        let fees = Fees::new(d("0.01"), 0, 0, false);
        let later = fees.borrowing_rate_at(12 * 60 * 60).unwrap();
        assert!(later < fees.borrowing_rate().unwrap());
        assert!(later > d("0.0099") && later < d("0.0101"), "got {later}");
    }

    #[test]
    fn test_borrowing_rate_zero_in_recovery_mode() {
        let fees = Fees::new(d("0.01"), 0, 0, true);
        assert_eq!(fees.borrowing_rate().unwrap(), Decimal::ZERO);
    }
}
