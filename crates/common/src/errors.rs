//! Error Types for the NAU Vault Editor
//!
//! Expected rejections of a proposed trove change are *not* errors; they are
//! ordinary return values of the validator. `NauError` covers bad user input
//! (an amount that does not parse), malformed snapshots, misuse of the
//! staging API, and arithmetic failures.

use thiserror::Error;

use crate::decimal::Decimal;
use crate::types::TroveStatus;

/// Result type alias for NAU operations
pub type NauResult<T> = Result<T, NauError>;

/// Main error enum for the editor core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NauError {
    // ============ Input Errors ============
    /// Edited text is not a non-negative fixed-point amount
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: AmountErrorReason },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    // ============ Snapshot Errors ============
    /// Store snapshot violates a basic protocol invariant
    #[error("malformed snapshot: {reason}")]
    MalformedSnapshot { reason: &'static str },

    // ============ Staging Errors ============
    /// A transaction for this change is already awaiting approval or confirmation
    #[error("transaction {transaction_id} is already in flight")]
    SubmissionInFlight { transaction_id: String },

    /// Submission requested with no valid staged change
    #[error("nothing to submit")]
    NothingToSubmit,

    /// Adjusting requires an open trove
    #[error("trove is not open (status {status:?})")]
    TroveNotOpen { status: TroveStatus },

    /// A new trove cannot be opened before the previous one's surplus is claimed
    #[error("{surplus} collateral surplus must be claimed first")]
    SurplusCollateralUnclaimed { surplus: Decimal },

    // ============ Configuration Errors ============
    /// Configuration file could not be read or is invalid
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Debug introspection was requested while disabled in the configuration
    #[error("debug introspection is disabled")]
    IntrospectionDisabled,

    // ============ Encoding Errors ============
    /// Binary encoding of a value failed
    #[error("encoding failed: {reason}")]
    Encoding { reason: String },
}

/// Reasons an amount failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountErrorReason {
    #[error("empty input")]
    Empty,
    #[error("amounts cannot be negative")]
    Negative,
    #[error("not a number")]
    NotANumber,
    #[error("more than 18 decimals")]
    TooManyDecimals,
    #[error("amount too large")]
    TooLarge,
}

impl NauError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "E001_INVALID_AMOUNT",
            Self::Overflow => "E010_OVERFLOW",
            Self::Underflow => "E011_UNDERFLOW",
            Self::DivisionByZero => "E012_DIV_ZERO",
            Self::MalformedSnapshot { .. } => "E020_MALFORMED_SNAPSHOT",
            Self::SubmissionInFlight { .. } => "E030_SUBMISSION_IN_FLIGHT",
            Self::NothingToSubmit => "E031_NOTHING_TO_SUBMIT",
            Self::SurplusCollateralUnclaimed { .. } => "E032_SURPLUS_UNCLAIMED",
            Self::TroveNotOpen { .. } => "E033_TROVE_NOT_OPEN",
            Self::Config { .. } => "E040_CONFIG",
            Self::IntrospectionDisabled => "E041_INTROSPECTION_DISABLED",
            Self::Encoding { .. } => "E050_ENCODING",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            NauError::InvalidAmount {
                input: "x".into(),
                reason: AmountErrorReason::NotANumber,
            },
            NauError::Overflow,
            NauError::Underflow,
            NauError::DivisionByZero,
            NauError::MalformedSnapshot { reason: "zero price" },
            NauError::SubmissionInFlight {
                transaction_id: "trove-adjustment".into(),
            },
            NauError::NothingToSubmit,
            NauError::SurplusCollateralUnclaimed { surplus: Decimal::ONE },
            NauError::TroveNotOpen {
                status: TroveStatus::ClosedByLiquidation,
            },
            NauError::Config { reason: "bad".into() },
            NauError::IntrospectionDisabled,
            NauError::Encoding { reason: "io".into() },
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_display_carries_input() {
        let err = NauError::InvalidAmount {
            input: "12x".into(),
            reason: AmountErrorReason::NotANumber,
        };
        assert_eq!(err.to_string(), "invalid amount \"12x\": not a number");
    }
}
