//! Fixed-point display of token amounts
//!
//! The ledger stores integer base units; one whole token is `10^DECIMALS`
//! base units.

use thiserror::Error;

/// Decimal places of the token
pub const DECIMALS: u8 = 6;

/// Base units per whole token
pub const BASE_UNITS_PER_TOKEN: u128 = 1_000_000;

/// Errors when parsing a display amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Empty amount")]
    Empty,
    #[error("Malformed amount: {0}")]
    Malformed(String),
    #[error("Too many decimal places: at most {max}")]
    TooPrecise { max: u8 },
    #[error("Amount too large")]
    Overflow,
}

/// Format base units as a 6-decimal string (`1500000` -> `"1.500000"`)
pub fn format_amount(base_units: u128) -> String {
    let whole = base_units / BASE_UNITS_PER_TOKEN;
    let frac = base_units % BASE_UNITS_PER_TOKEN;
    format!("{}.{:0width$}", whole, frac, width = DECIMALS as usize)
}

/// Parse a display amount into base units (`"1.5"` -> `1500000`)
pub fn parse_amount(input: &str) -> Result<u128, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Malformed(input.to_string()));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::Malformed(input.to_string()));
    }
    if frac.len() > DECIMALS as usize {
        return Err(AmountError::TooPrecise { max: DECIMALS });
    }

    let whole_units: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };

    // Right-pad the fraction to exactly DECIMALS digits
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        format!("{:0<width$}", frac, width = DECIMALS as usize)
            .parse()
            .map_err(|_| AmountError::Malformed(input.to_string()))?
    };

    whole_units
        .checked_mul(BASE_UNITS_PER_TOKEN)
        .and_then(|units| units.checked_add(frac_units))
        .ok_or(AmountError::Overflow)
}
