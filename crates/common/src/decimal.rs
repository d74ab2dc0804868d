//! Fixed-Point Amounts
//!
//! Every collateral, debt, price and rate value handled by the editor is a
//! [`Decimal`]: a non-negative integer scaled by 1e18, the precision the
//! contracts use for AR and GiB amounts. [`Difference`] is the signed delta
//! between two decimals.
//!
//! Arithmetic is checked. Multiplication and division round toward zero and
//! never go through an intermediate wider than `u128`: operands are split
//! into integer and fractional parts so `price * collateral` stays exact for
//! any result that fits.

use core::fmt;
use core::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::precision::{DECIMALS, DECIMAL_PRECISION};
use crate::errors::{AmountErrorReason, NauError, NauResult};

/// Non-negative fixed-point number with 18 decimals
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    BorshSerialize, BorshDeserialize,
)]
pub struct Decimal(u128);

impl Decimal {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(DECIMAL_PRECISION);
    /// Stand-in for an unbounded value, e.g. the collateral ratio of a debt-free trove
    pub const INFINITY: Self = Self(u128::MAX);

    /// Wraps a raw value already scaled by 1e18
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole number of units
    pub const fn from_int(units: u64) -> Self {
        Self(units as u128 * DECIMAL_PRECISION)
    }

    /// `mantissa / 10^scale`, e.g. `from_parts(5, 3)` is 0.005
    ///
    /// `scale` must not exceed 18.
    pub const fn from_parts(mantissa: u128, scale: u32) -> Self {
        Self(mantissa * 10u128.pow(DECIMALS - scale))
    }

    /// Raw value scaled by 1e18
    pub const fn raw(self) -> u128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_infinite(self) -> bool {
        self == Self::INFINITY
    }

    pub fn checked_add(self, other: Self) -> NauResult<Self> {
        self.0.checked_add(other.0).map(Self).ok_or(NauError::Overflow)
    }

    pub fn checked_sub(self, other: Self) -> NauResult<Self> {
        self.0.checked_sub(other.0).map(Self).ok_or(NauError::Underflow)
    }

    /// Subtraction clamped at zero
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Product, rounded toward zero
    pub fn checked_mul(self, other: Self) -> NauResult<Self> {
        let (a_int, a_frac) = (self.0 / DECIMAL_PRECISION, self.0 % DECIMAL_PRECISION);
        let (b_int, b_frac) = (other.0 / DECIMAL_PRECISION, other.0 % DECIMAL_PRECISION);

        // (ai*S + af)(bi*S + bf)/S = ai*bi*S + ai*bf + af*bi + af*bf/S
        let whole = a_int
            .checked_mul(b_int)
            .and_then(|v| v.checked_mul(DECIMAL_PRECISION))
            .ok_or(NauError::Overflow)?;
        let cross_a = a_int.checked_mul(b_frac).ok_or(NauError::Overflow)?;
        let cross_b = a_frac.checked_mul(b_int).ok_or(NauError::Overflow)?;
        let fractional = a_frac * b_frac / DECIMAL_PRECISION;

        whole
            .checked_add(cross_a)
            .and_then(|v| v.checked_add(cross_b))
            .and_then(|v| v.checked_add(fractional))
            .map(Self)
            .ok_or(NauError::Overflow)
    }

    /// Quotient, rounded toward zero
    pub fn checked_div(self, other: Self) -> NauResult<Self> {
        if other.0 == 0 {
            return Err(NauError::DivisionByZero);
        }

        let quotient = self.0 / other.0;
        let mut remainder = self.0 % other.0;

        // Long division for the 18 fractional digits keeps every step below 10 * divisor.
        let mut fractional: u128 = 0;
        for _ in 0..DECIMALS {
            remainder = remainder.checked_mul(10).ok_or(NauError::Overflow)?;
            fractional = fractional * 10 + remainder / other.0;
            remainder %= other.0;
        }

        quotient
            .checked_mul(DECIMAL_PRECISION)
            .and_then(|v| v.checked_add(fractional))
            .map(Self)
            .ok_or(NauError::Overflow)
    }

    /// Integer power by repeated squaring
    pub fn pow(self, mut exponent: u64) -> NauResult<Self> {
        let mut base = self;
        let mut result = Self::ONE;

        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result.checked_mul(base)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.checked_mul(base)?;
            }
        }

        Ok(result)
    }

    /// Formats with exactly `places` decimals, truncating the rest
    pub fn to_string_fixed(self, places: u32) -> String {
        if self.is_infinite() {
            return "∞".to_string();
        }

        let places = places.min(DECIMALS);
        let int_part = self.0 / DECIMAL_PRECISION;
        if places == 0 {
            return int_part.to_string();
        }

        let frac = (self.0 % DECIMAL_PRECISION) / 10u128.pow(DECIMALS - places);
        format!("{int_part}.{frac:0width$}", width = places as usize)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            return f.write_str("∞");
        }

        let int_part = self.0 / DECIMAL_PRECISION;
        let frac_part = self.0 % DECIMAL_PRECISION;
        if frac_part == 0 {
            return write!(f, "{int_part}");
        }

        let digits = format!("{frac_part:018}");
        write!(f, "{int_part}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Decimal {
    type Err = NauError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| NauError::InvalidAmount {
            input: input.to_string(),
            reason,
        };

        let text = input.trim();
        if text.is_empty() {
            return Err(invalid(AmountErrorReason::Empty));
        }
        if text.starts_with('-') {
            return Err(invalid(AmountErrorReason::Negative));
        }

        let (int_text, frac_text) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        if int_text.is_empty() && frac_text.is_empty() {
            return Err(invalid(AmountErrorReason::NotANumber));
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_text) || !all_digits(frac_text) {
            return Err(invalid(AmountErrorReason::NotANumber));
        }
        if frac_text.len() > DECIMALS as usize {
            return Err(invalid(AmountErrorReason::TooManyDecimals));
        }

        let int_value: u128 = if int_text.is_empty() {
            0
        } else {
            int_text
                .parse()
                .map_err(|_| invalid(AmountErrorReason::TooLarge))?
        };
        let frac_value: u128 = if frac_text.is_empty() {
            0
        } else {
            // at most 18 digits, always fits
            let padded = format!("{frac_text:0<18}");
            padded
                .parse()
                .map_err(|_| invalid(AmountErrorReason::NotANumber))?
        };

        int_value
            .checked_mul(DECIMAL_PRECISION)
            .and_then(|v| v.checked_add(frac_value))
            .map(Self)
            .ok_or_else(|| invalid(AmountErrorReason::TooLarge))
    }
}

impl From<u64> for Decimal {
    fn from(units: u64) -> Self {
        Self::from_int(units)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal amount")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from_int(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        u64::try_from(v)
            .map(Decimal::from_int)
            .map_err(|_| E::custom("amount must not be negative"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        // Shortest round-trip representation, so 0.005 parses as 0.005.
        v.to_string().parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

// ============ Difference ============

/// Sign of a [`Difference`]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub enum Sign {
    Positive,
    Negative,
    #[default]
    Zero,
}

/// Signed delta between two decimals
///
/// `Difference::between(a, b)` is `a - b`; applying it to `b` gives back `a`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct Difference {
    sign: Sign,
    absolute_value: Decimal,
}

impl Difference {
    pub const ZERO: Self = Self {
        sign: Sign::Zero,
        absolute_value: Decimal::ZERO,
    };

    /// `a - b`
    pub fn between(a: Decimal, b: Decimal) -> Self {
        if a > b {
            Self::positive(a.saturating_sub(b))
        } else {
            Self::negative(b.saturating_sub(a))
        }
    }

    pub fn positive(value: Decimal) -> Self {
        if value.is_zero() {
            return Self::ZERO;
        }
        Self {
            sign: Sign::Positive,
            absolute_value: value,
        }
    }

    pub fn negative(value: Decimal) -> Self {
        if value.is_zero() {
            return Self::ZERO;
        }
        Self {
            sign: Sign::Negative,
            absolute_value: value,
        }
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn absolute_value(&self) -> Decimal {
        self.absolute_value
    }

    pub fn is_positive(&self) -> bool {
        self.sign == Sign::Positive
    }

    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Negative
    }

    pub fn is_zero(&self) -> bool {
        self.sign == Sign::Zero
    }

    /// Magnitude when positive, zero otherwise
    pub fn increase(&self) -> Decimal {
        if self.is_positive() {
            self.absolute_value
        } else {
            Decimal::ZERO
        }
    }

    /// Magnitude when negative, zero otherwise
    pub fn decrease(&self) -> Decimal {
        if self.is_negative() {
            self.absolute_value
        } else {
            Decimal::ZERO
        }
    }

    /// `base + self`; fails if the result would be negative
    pub fn apply_to(&self, base: Decimal) -> NauResult<Decimal> {
        match self.sign {
            Sign::Positive => base.checked_add(self.absolute_value),
            Sign::Negative => base.checked_sub(self.absolute_value),
            Sign::Zero => Ok(base),
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sign {
            Sign::Positive => write!(f, "+{}", self.absolute_value),
            Sign::Negative => write!(f, "-{}", self.absolute_value),
            Sign::Zero => f.write_str("0"),
        }
    }
}

// ============ Percent ============

/// Display wrapper rendering a fraction as a percentage with two decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percent(pub Decimal);

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_infinite() {
            return f.write_str("∞");
        }
        match self.0.checked_mul(Decimal::from_int(100)) {
            Ok(pct) => write!(f, "{}%", pct.to_string_fixed(2)),
            Err(_) => f.write_str("∞"),
        }
    }
}
