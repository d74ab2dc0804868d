//! Guard Helpers
//!
//! The `check!` macro and small `require_*` helpers used where snapshots
//! and configuration enter the editor.
//!
//! ```rust,ignore
//! use nau_common::check;
//!
//! check!(!price.is_zero(), NauError::MalformedSnapshot { reason: "zero price" });
//! ```

use crate::decimal::Decimal;
use crate::errors::{NauError, NauResult};

/// Check a condition and return an error if it fails.
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use check;

/// Require a snapshot amount to be strictly positive.
pub fn require_positive(value: Decimal, reason: &'static str) -> NauResult<()> {
    check!(!value.is_zero(), NauError::MalformedSnapshot { reason });
    Ok(())
}

/// Require a snapshot amount to not exceed a bound.
pub fn require_at_most(value: Decimal, bound: Decimal, reason: &'static str) -> NauResult<()> {
    check!(value <= bound, NauError::MalformedSnapshot { reason });
    Ok(())
}

/// Require a configuration value to hold.
pub fn require_config(condition: bool, reason: &str) -> NauResult<()> {
    check!(
        condition,
        NauError::Config {
            reason: reason.to_string()
        }
    );
    Ok(())
}
