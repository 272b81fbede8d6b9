//! Input checks shared by mock and chain transfers. All of them run
//! before any I/O.

use thiserror::Error;

use super::units::{parse_units, UnitError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("recipient address must start with 0x")]
    MissingHexPrefix,
    #[error("invalid address '{0}' (expected 0x followed by 40 hex characters)")]
    MalformedAddress(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] UnitError),
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("cannot send to your own address")]
    SelfTransfer,
}

/// Require a non-blank value
pub fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(trimmed)
    }
}

/// Check the `0x` prefix and 40 hex digit body of an address.
///
/// The prefix is reported separately so users get a format-specific hint.
pub fn check_address(value: &str) -> Result<(), ValidationError> {
    let Some(body) = value.strip_prefix("0x") else {
        return Err(ValidationError::MissingHexPrefix);
    };
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::MalformedAddress(value.to_string()));
    }
    Ok(())
}

/// Parse a strictly positive amount into base units
pub fn positive_amount(value: &str, decimals: u8) -> Result<u128, ValidationError> {
    let units = parse_units(value, decimals)?;
    if units == 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(units)
}
