//! Exact conversion between human-readable amounts and smallest units.
//!
//! Amounts are scaled digit by digit in 256-bit integers. Nothing here
//! goes through floating point, and input with more precision than the
//! unit supports is rejected rather than truncated.

use alloy::primitives::U256;

use crate::error::AmountError;

/// Decimals of an EVM native asset (wei per ether is 10^18).
pub const NATIVE_DECIMALS: u8 = 18;

/// Parse a positive decimal amount such as `"0.001"` into smallest units.
///
/// Surrounding whitespace is ignored. Signs other than a leading `-`,
/// exponents, and digit separators are rejected as malformed.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }

    let (negative, magnitude) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (int_part, frac_part) = magnitude.split_once('.').unwrap_or((magnitude, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AmountError::Malformed);
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Malformed);
    }

    // Trailing zeros carry no precision.
    let frac_part = frac_part.trim_end_matches('0');
    let scale = usize::from(decimals);
    if frac_part.len() > scale {
        return Err(AmountError::TooPrecise { decimals });
    }

    let mut value = U256::ZERO;
    for digit in int_part.bytes().chain(frac_part.bytes()) {
        value = value
            .checked_mul(U256::from(10u8))
            .and_then(|v| v.checked_add(U256::from(digit - b'0')))
            .ok_or(AmountError::Overflow)?;
    }
    value = value
        .checked_mul(pow10(scale - frac_part.len()).ok_or(AmountError::Overflow)?)
        .ok_or(AmountError::Overflow)?;

    if value.is_zero() {
        return Err(AmountError::Zero);
    }
    if negative {
        return Err(AmountError::Negative);
    }
    Ok(value)
}

/// Render smallest units as an exact decimal string without trailing zeros.
#[must_use]
pub fn format_amount(value: U256, decimals: u8) -> String {
    let (int_part, frac_part) = split_units(value, decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// Render smallest units with exactly `places` fractional digits.
///
/// Extra digits are truncated, so a displayed balance never overstates
/// what the account holds.
#[must_use]
pub fn format_amount_fixed(value: U256, decimals: u8, places: usize) -> String {
    let (int_part, mut frac_part) = split_units(value, decimals);
    if places == 0 {
        return int_part;
    }
    frac_part.truncate(places);
    while frac_part.len() < places {
        frac_part.push('0');
    }
    format!("{int_part}.{frac_part}")
}

/// Split a value into its integer digits and zero-padded fractional digits.
fn split_units(value: U256, decimals: u8) -> (String, String) {
    let scale = usize::from(decimals);
    let digits = value.to_string();
    if scale == 0 {
        return (digits, String::new());
    }
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    (int_part.to_string(), frac_part.to_string())
}

fn pow10(exp: usize) -> Option<U256> {
    (0..exp).try_fold(U256::from(1u8), |acc, _| acc.checked_mul(U256::from(10u8)))
}
