//! # Amounts: Checked 256-bit Value Arithmetic
//!
//! Asset and native amounts are `U256`, matching the width of the token
//! ledgers the oracle escrows against. Every operation that can overflow is
//! checked and reports the failing operation by name.
//!
//! Prices are fixed-point with [`PRICE_SCALE`] (1e18): `price = amount1 *
//! PRICE_SCALE / amount2`. Fee and protocol rates are parts per
//! [`RATE_PRECISION`] (1e7).

use alloy_primitives::U256;

use crate::error::{ArithmeticError, CoreError};

/// A 256-bit unsigned amount.
pub type Amount = U256;

/// Fixed-point scale for prices (1e18).
pub const PRICE_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Denominator for fee and protocol-fee rates (1e7).
pub const RATE_PRECISION: U256 = U256::from_limbs([10_000_000, 0, 0, 0]);

/// Compute `floor(a * b / denom)` with overflow and zero-divisor checks.
pub fn mul_div_floor(
    a: U256,
    b: U256,
    denom: U256,
    operation: &'static str,
) -> Result<U256, ArithmeticError> {
    if denom.is_zero() {
        return Err(ArithmeticError::DivisionByZero { operation });
    }
    let product = a
        .checked_mul(b)
        .ok_or(ArithmeticError::Overflow { operation })?;
    Ok(product / denom)
}

/// Checked addition.
pub fn checked_add(a: U256, b: U256, operation: &'static str) -> Result<U256, ArithmeticError> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow { operation })
}

/// Checked subtraction.
pub fn checked_sub(a: U256, b: U256, operation: &'static str) -> Result<U256, ArithmeticError> {
    a.checked_sub(b).ok_or(ArithmeticError::Underflow { operation })
}

/// Sum a sequence of amounts with overflow checking.
pub fn checked_sum<I>(items: I, operation: &'static str) -> Result<U256, ArithmeticError>
where
    I: IntoIterator<Item = U256>,
{
    items
        .into_iter()
        .try_fold(U256::ZERO, |acc, x| checked_add(acc, x, operation))
}

/// Parse a human-entered amount.
///
/// Accepts plain decimal integers (`"2000"`), hex (`"0x7d0"`), and
/// scientific notation whose result is integral (`"1.1e18"`, `"2000e18"`).
/// Underscores are ignored as digit separators.
///
/// # Errors
///
/// Returns [`CoreError::InvalidAmount`] for malformed input, fractional
/// results, or values that exceed 256 bits.
pub fn parse_amount(input: &str) -> Result<U256, CoreError> {
    let invalid = || CoreError::InvalidAmount(input.to_string());
    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();

    if let Some(hex) = cleaned.strip_prefix("0x") {
        return U256::from_str_radix(hex, 16).map_err(|_| invalid());
    }

    let (mantissa, exponent) = match cleaned.split_once(|c: char| c == 'e' || c == 'E') {
        Some((m, e)) => (m, e.parse::<u32>().map_err(|_| invalid())?),
        None => (cleaned.as_str(), 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }

    let frac_len = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
    let shift = exponent.checked_sub(frac_len).ok_or_else(invalid)?;

    let digits = format!("{int_part}{frac_part}");
    let base = U256::from_str_radix(&digits, 10).map_err(|_| invalid())?;
    let multiplier = U256::from(10u8)
        .checked_pow(U256::from(shift))
        .ok_or_else(invalid)?;
    base.checked_mul(multiplier).ok_or_else(invalid)
}
