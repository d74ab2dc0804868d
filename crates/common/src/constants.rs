//! Protocol Constants
//!
//! Network parameters of the NAU deployment. Values follow Liquity's
//! parameters; the debt floor and liquidation reserve are lowered on the
//! default (test) network so positions can be opened with faucet AR.
//!
//! # Network Configuration
//!
//! - `mainnet` - Production values
//! - Default (no feature) - Testnet values
//!
//! ```toml
//! nau-common = { path = "...", features = ["mainnet"] }
//! ```

/// Precision constants
pub mod precision {
    /// Decimal places of every fixed-point amount
    pub const DECIMALS: u32 = 18;

    /// Scale of one whole unit (1e18)
    pub const DECIMAL_PRECISION: u128 = 1_000_000_000_000_000_000;
}

/// Token Metadata
pub mod token {
    /// Debt token symbol
    pub const COIN: &str = "GiB";
    /// Collateral token symbol (ERC20, not the native coin)
    pub const COLLATERAL: &str = "AR";
}

/// Collateralization Ratios
pub mod ratios {
    use crate::decimal::Decimal;

    /// Minimum Collateral Ratio (110%)
    pub const MCR: Decimal = Decimal::from_parts(110, 2);

    /// Critical Collateral Ratio (150%) - the system is in Recovery Mode below this
    pub const CCR: Decimal = Decimal::from_parts(150, 2);
}

/// Fee Configuration
pub mod fees {
    use crate::decimal::Decimal;

    /// Borrowing rate floor (0.5%)
    pub const MINIMUM_BORROWING_RATE: Decimal = Decimal::from_parts(5, 3);

    /// Borrowing rate ceiling (5%)
    pub const MAXIMUM_BORROWING_RATE: Decimal = Decimal::from_parts(5, 2);

    /// Added on top of the quoted rate to form the submission tolerance (0.5%)
    pub const BORROWING_RATE_SLIPPAGE: Decimal = Decimal::from_parts(5, 3);

    /// How long a quoted fee may decay before a change counts as expensive
    pub const FEE_DECAY_TOLERANCE_MINUTES: u64 = 60;

    /// Per-minute decay of the base rate (half-life of 12 hours)
    pub const MINUTE_DECAY_FACTOR: Decimal = Decimal::from_parts(999_037_758_833_783_000, 18);

    /// Seconds per minute, for decay calculations on unix timestamps
    pub const SECONDS_PER_MINUTE: u64 = 60;
}

/// Debt Limits
///
/// Values differ between mainnet and testnet to allow easier testing.
pub mod limits {
    use crate::decimal::Decimal;

    /// Liquidation reserve - added to every trove's debt, refunded on closure
    /// - Mainnet: 200 GiB
    /// - Testnet: 20 GiB
    #[cfg(feature = "mainnet")]
    pub const LIQUIDATION_RESERVE: Decimal = Decimal::from_int(200);
    #[cfg(not(feature = "mainnet"))]
    pub const LIQUIDATION_RESERVE: Decimal = Decimal::from_int(20);

    /// Minimum net debt of an open trove
    /// - Mainnet: 1,800 GiB
    /// - Testnet: 200 GiB
    #[cfg(feature = "mainnet")]
    pub const MINIMUM_NET_DEBT: Decimal = Decimal::from_int(1_800);
    #[cfg(not(feature = "mainnet"))]
    pub const MINIMUM_NET_DEBT: Decimal = Decimal::from_int(200);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal;

    #[test]
    fn test_debt_floor_exceeds_reserve() {
        assert!(limits::LIQUIDATION_RESERVE < limits::MINIMUM_NET_DEBT);
    }

    #[test]
    fn test_ratio_ordering() {
        assert!(ratios::MCR < ratios::CCR);
        assert!(Decimal::ONE < ratios::MCR);
    }

    #[test]
    fn test_fee_bounds() {
        assert!(fees::MINIMUM_BORROWING_RATE < fees::MAXIMUM_BORROWING_RATE);
        assert!(fees::MINUTE_DECAY_FACTOR < Decimal::ONE);
        assert_eq!(fees::MINIMUM_BORROWING_RATE.to_string(), "0.005");
    }
}
