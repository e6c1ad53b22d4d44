//! Conversion between smallest-unit integers (wei) and decimal display strings.

use thiserror::Error;

pub const ETHER_DECIMALS: u8 = 18;
pub const DISPLAY_FRACTION_DIGITS: u8 = 4;
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("amount '{0}' is not a plain decimal number")]
    InvalidNumber(String),
    #[error("amount '{amount}' has more than {decimals} fractional digits")]
    TooPrecise { amount: String, decimals: u8 },
    #[error("amount '{0}' overflows the smallest-unit integer")]
    Overflow(String),
    #[error("{0} decimals cannot be represented")]
    UnsupportedDecimals(u8),
}

fn pow10(exp: u8) -> Result<u128, UnitsError> {
    10u128
        .checked_pow(u32::from(exp))
        .ok_or(UnitsError::UnsupportedDecimals(exp))
}

/// Renders `value` smallest units as a decimal with exactly
/// `fraction_digits` digits after the point, rounding half up.
pub fn format_units(value: u128, decimals: u8, fraction_digits: u8) -> Result<String, UnitsError> {
    let scale = pow10(decimals)?;
    let fraction_scale = pow10(fraction_digits)?;
    Ok(format_scaled(value, scale, fraction_scale, fraction_digits))
}

pub fn format_ether(wei: u128) -> String {
    format_scaled(
        wei,
        WEI_PER_ETHER,
        10u128.pow(u32::from(DISPLAY_FRACTION_DIGITS)),
        DISPLAY_FRACTION_DIGITS,
    )
}

fn format_scaled(value: u128, scale: u128, fraction_scale: u128, fraction_digits: u8) -> String {
    let rounded = if fraction_scale <= scale {
        let step = scale / fraction_scale;
        let truncated = value / step;
        if value % step >= step.div_ceil(2) && step > 1 {
            truncated.saturating_add(1)
        } else {
            truncated
        }
    } else {
        value.saturating_mul(fraction_scale / scale)
    };

    let whole = rounded / fraction_scale;
    if fraction_digits == 0 {
        return whole.to_string();
    }
    let fraction = rounded % fraction_scale;
    format!(
        "{whole}.{fraction:0width$}",
        width = usize::from(fraction_digits)
    )
}

/// Parses a plain decimal amount (`"0.01"`) into smallest units.
pub fn parse_units(amount: &str, decimals: u8) -> Result<u128, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::InvalidNumber(amount.to_string()));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::InvalidNumber(amount.to_string()));
    }
    if fraction.len() > usize::from(decimals) {
        return Err(UnitsError::TooPrecise {
            amount: amount.to_string(),
            decimals,
        });
    }

    let scale = pow10(decimals)?;
    let overflow = || UnitsError::Overflow(amount.to_string());

    let whole_value = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| overflow())?
    };
    let fraction_value = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{fraction:0<width$}", width = usize::from(decimals));
        padded.parse::<u128>().map_err(|_| overflow())?
    };

    whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_ether_displays_with_four_digits() {
        assert_eq!(format_ether(1_000_000_000_000_000_000), "1.0000");
        assert_eq!(format_ether(0), "0.0000");
    }

    #[test]
    fn display_rounds_half_up() {
        assert_eq!(format_ether(12_345_000_000_000_000), "0.0123");
        assert_eq!(format_ether(12_350_000_000_000_000), "0.0124");
        assert_eq!(format_ether(99_999_000_000_000_000), "0.1000");
    }

    #[test]
    fn formats_other_precisions() {
        assert_eq!(format_units(1_500_000, 6, 2), Ok("1.50".to_string()));
        assert_eq!(format_units(15, 1, 3), Ok("1.500".to_string()));
        assert_eq!(format_units(7, 0, 0), Ok("7".to_string()));
        assert_eq!(
            format_units(1, 40, 4),
            Err(UnitsError::UnsupportedDecimals(40))
        );
    }

    #[test]
    fn parses_mint_price() {
        assert_eq!(parse_units("0.01", 18), Ok(10_000_000_000_000_000));
        assert_eq!(parse_units("2", 18), Ok(2 * WEI_PER_ETHER));
        assert_eq!(parse_units(".5", 1), Ok(5));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert_eq!(parse_units("", 18), Err(UnitsError::Empty));
        assert_eq!(
            parse_units("-1", 18),
            Err(UnitsError::InvalidNumber("-1".into()))
        );
        assert_eq!(
            parse_units(".", 18),
            Err(UnitsError::InvalidNumber(".".into()))
        );
        assert_eq!(
            parse_units("0.001", 2),
            Err(UnitsError::TooPrecise {
                amount: "0.001".into(),
                decimals: 2
            })
        );
        assert!(matches!(
            parse_units("999999999999999999999999", 18),
            Err(UnitsError::Overflow(_))
        ));
    }
}
