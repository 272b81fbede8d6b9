//! Decimal amount conversion between display units and base units

use thiserror::Error;

/// Decimals of the native currency on every supported network
pub const NATIVE_DECIMALS: u8 = 18;

/// Decimals of the simulated USDT token used by the mock ledger
pub const MOCK_DECIMALS: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid number: {0}")]
    Invalid(String),
    #[error("too many decimal places (at most {0})")]
    TooPrecise(u8),
    #[error("amount is too large")]
    Overflow,
}

/// Parse a display amount like "1.5" into base units
pub fn parse_units(value: &str, decimals: u8) -> Result<u128, UnitError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UnitError::Empty);
    }

    let (integer_part, decimal_part) = match value.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (value, ""),
    };

    if integer_part.is_empty() && decimal_part.is_empty() {
        return Err(UnitError::Invalid(value.to_string()));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(integer_part) || !all_digits(decimal_part) {
        return Err(UnitError::Invalid(value.to_string()));
    }

    let decimals_usize = decimals as usize;
    if decimal_part.len() > decimals_usize {
        return Err(UnitError::TooPrecise(decimals));
    }

    let multiplier = 10u128
        .checked_pow(decimals as u32)
        .ok_or(UnitError::Overflow)?;

    let integer: u128 = if integer_part.is_empty() {
        0
    } else {
        integer_part.parse().map_err(|_| UnitError::Overflow)?
    };

    let fraction: u128 = if decimal_part.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", decimal_part, width = decimals_usize);
        padded.parse().map_err(|_| UnitError::Overflow)?
    };

    integer
        .checked_mul(multiplier)
        .and_then(|v| v.checked_add(fraction))
        .ok_or(UnitError::Overflow)
}

/// Format base units given as a decimal digit string (e.g. `U256::to_string`)
pub fn format_units(digits: &str, decimals: u8) -> String {
    let digits = digits.trim_start_matches('0');
    let decimals = decimals as usize;

    if decimals == 0 {
        return if digits.is_empty() { "0".into() } else { digits.into() };
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');

    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}
