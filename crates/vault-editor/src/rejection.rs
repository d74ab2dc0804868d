//! Rejection Reasons
//!
//! A rejection is an expected outcome of validating a staged change, not an
//! error: the user sees it next to the form and keeps editing. Every reason
//! carries the numbers needed to explain it.

use core::fmt;

use serde::{Deserialize, Serialize};

use nau_common::{
    constants::token::{COIN, COLLATERAL},
    Decimal, Percent,
};

/// Why a staged trove change cannot be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum Rejection {
    /// Edited collateral exceeds what the account can put in
    InsufficientCollateralBalance {
        requested: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    /// Net debt would end up below `MINIMUM_NET_DEBT`
    NetDebtBelowMinimum {
        net_debt: Decimal,
        minimum: Decimal,
        shortfall: Decimal,
    },

    /// Resulting collateral ratio is below MCR
    CollateralRatioTooLow { ratio: Decimal, minimum: Decimal },

    /// Borrowing in Recovery Mode must leave the trove at or above CCR
    WouldLeaveTroveUndercollateralizedInRecoveryMode { ratio: Decimal, critical: Decimal },

    /// Borrowing in Recovery Mode must not lower the total collateral ratio
    RecoveryModeBorrowingRestricted {
        total_collateral_ratio: Decimal,
        resulting_total_collateral_ratio: Decimal,
    },

    /// The change would push the system into Recovery Mode
    WouldTriggerRecoveryMode {
        resulting_total_collateral_ratio: Decimal,
        critical: Decimal,
    },

    /// Collateral cannot be withdrawn during Recovery Mode
    CollateralWithdrawalInRecoveryMode { amount: Decimal },

    /// The only remaining trove in the system cannot be closed
    CannotCloseLastTrove,

    /// Troves cannot be closed during Recovery Mode
    ClosureInRecoveryMode,

    /// Repayment exceeds the account's GiB balance
    InsufficientDebtTokenBalance {
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    /// The caller's fee tolerance is below the currently quoted rate
    BorrowingRateExceedsTolerance {
        quoted: Decimal,
        max_borrowing_rate: Decimal,
    },
}

impl Rejection {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientCollateralBalance { .. } => "InsufficientCollateralBalance",
            Self::NetDebtBelowMinimum { .. } => "NetDebtBelowMinimum",
            Self::CollateralRatioTooLow { .. } => "CollateralRatioTooLow",
            Self::WouldLeaveTroveUndercollateralizedInRecoveryMode { .. } => {
                "WouldLeaveTroveUndercollateralizedInRecoveryMode"
            }
            Self::RecoveryModeBorrowingRestricted { .. } => "RecoveryModeBorrowingRestricted",
            Self::WouldTriggerRecoveryMode { .. } => "WouldTriggerRecoveryMode",
            Self::CollateralWithdrawalInRecoveryMode { .. } => "CollateralWithdrawalInRecoveryMode",
            Self::CannotCloseLastTrove => "CannotCloseLastTrove",
            Self::ClosureInRecoveryMode => "ClosureInRecoveryMode",
            Self::InsufficientDebtTokenBalance { .. } => "InsufficientDebtTokenBalance",
            Self::BorrowingRateExceedsTolerance { .. } => "BorrowingRateExceedsTolerance",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientCollateralBalance { shortfall, .. } => write!(
                f,
                "The amount you're trying to deposit exceeds your balance by {shortfall} {COLLATERAL}."
            ),
            Self::NetDebtBelowMinimum { minimum, shortfall, .. } => write!(
                f,
                "Net debt must be at least {minimum} {COIN}; borrow {shortfall} {COIN} more."
            ),
            Self::CollateralRatioTooLow { ratio, minimum } => write!(
                f,
                "Collateral ratio must be at least {}; this change leaves it at {}.",
                Percent(*minimum),
                Percent(*ratio)
            ),
            Self::WouldLeaveTroveUndercollateralizedInRecoveryMode { ratio, critical } => write!(
                f,
                "In Recovery Mode your collateral ratio must stay at or above {}; this change leaves it at {}.",
                Percent(*critical),
                Percent(*ratio)
            ),
            Self::RecoveryModeBorrowingRestricted {
                total_collateral_ratio,
                resulting_total_collateral_ratio,
            } => write!(
                f,
                "In Recovery Mode you can't borrow in a way that lowers the total collateral ratio ({} to {}).",
                Percent(*total_collateral_ratio),
                Percent(*resulting_total_collateral_ratio)
            ),
            Self::WouldTriggerRecoveryMode {
                resulting_total_collateral_ratio,
                critical,
            } => write!(
                f,
                "This change would lower the total collateral ratio to {}, below {}, and trigger Recovery Mode.",
                Percent(*resulting_total_collateral_ratio),
                Percent(*critical)
            ),
            Self::CollateralWithdrawalInRecoveryMode { amount } => write!(
                f,
                "You can't withdraw {amount} {COLLATERAL} while the system is in Recovery Mode."
            ),
            Self::CannotCloseLastTrove => {
                f.write_str("You can't close the only remaining Trove in the system.")
            }
            Self::ClosureInRecoveryMode => {
                f.write_str("You can't close your Trove while the system is in Recovery Mode.")
            }
            Self::InsufficientDebtTokenBalance { shortfall, .. } => write!(
                f,
                "You need {shortfall} {COIN} more to make this repayment."
            ),
            Self::BorrowingRateExceedsTolerance {
                quoted,
                max_borrowing_rate,
            } => write!(
                f,
                "The borrowing rate rose to {}, above your maximum of {}.",
                Percent(*quoted),
                Percent(*max_borrowing_rate)
            ),
        }
    }
}
