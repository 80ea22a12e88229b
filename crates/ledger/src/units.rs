//! Decimal formatting and parsing of on-chain integer amounts.

use alloy_primitives::U256;
use alloy_primitives::utils::{self, ParseUnits};

use crate::LedgerError;

pub const ETHER_DECIMALS: u8 = 18;
pub const GWEI_DECIMALS: u8 = 9;

/// Format an integer amount with `decimals` fractional digits, trimming
/// trailing zeros (`1500000000000000000` wei → `1.5`).
pub fn format_units(value: U256, decimals: u8) -> Result<String, LedgerError> {
    let formatted = utils::format_units(value, decimals)
        .map_err(|e| LedgerError::InvalidInput(format!("cannot format {value}: {e}")))?;
    Ok(match formatted.split_once('.') {
        Some((integer, fraction)) => match fraction.trim_end_matches('0') {
            "" => integer.to_string(),
            fraction => format!("{integer}.{fraction}"),
        },
        None => formatted,
    })
}

pub fn format_ether(wei: U256) -> Result<String, LedgerError> {
    format_units(wei, ETHER_DECIMALS)
}

pub fn format_gwei(wei: U256) -> Result<String, LedgerError> {
    format_units(wei, GWEI_DECIMALS)
}

/// Parse a non-negative decimal ether amount into wei.
pub fn parse_ether(value: &str) -> Result<U256, LedgerError> {
    let value = value.trim();
    match utils::parse_units(value, ETHER_DECIMALS) {
        Ok(ParseUnits::U256(wei)) => Ok(wei),
        Ok(ParseUnits::I256(_)) => Err(LedgerError::InvalidInput(format!(
            "invalid amount `{value}`: must not be negative"
        ))),
        Err(e) => Err(LedgerError::InvalidInput(format!("invalid amount `{value}`: {e}"))),
    }
}

/// Whether a string is a decimal number strictly greater than zero.
pub fn is_positive_amount(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .is_ok_and(|amount| amount.is_finite() && amount > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18))
    }

    #[test]
    fn formats_whole_and_fractional_ether() {
        assert_eq!(format_ether(ether(1000)).unwrap(), "1000");
        assert_eq!(format_ether(ether(1) / U256::from(2)).unwrap(), "0.5");
        assert_eq!(format_ether(U256::from(1)).unwrap(), "0.000000000000000001");
        assert_eq!(format_ether(U256::ZERO).unwrap(), "0");
    }

    #[test]
    fn formats_amounts_beyond_u128() {
        let huge = ether(1) * U256::from(u128::MAX);
        assert_eq!(format_ether(huge).unwrap(), u128::MAX.to_string());
    }

    #[test]
    fn formats_gwei() {
        assert_eq!(format_gwei(U256::from(12_340_000_000u64)).unwrap(), "12.34");
        assert_eq!(format_gwei(U256::from(1)).unwrap(), "0.000000001");
    }

    #[test]
    fn parses_ether_amounts() {
        assert_eq!(parse_ether("1").unwrap(), ether(1));
        assert_eq!(parse_ether("0.5").unwrap(), ether(1) / U256::from(2));
        assert_eq!(parse_ether(" 2 ").unwrap(), ether(2));
        assert!(parse_ether("-1").is_err());
        assert!(parse_ether("abc").is_err());
    }

    #[test]
    fn positive_amounts() {
        assert!(is_positive_amount("0.01"));
        assert!(is_positive_amount("3"));
        assert!(!is_positive_amount("0"));
        assert!(!is_positive_amount("-2"));
        assert!(!is_positive_amount("ten"));
        assert!(!is_positive_amount("inf"));
    }
}
