//! Money input parsing, cent rounding and formatting
//!
//! Amounts are `rust_decimal::Decimal` values. User input is checked against a
//! deliberately permissive pattern: optional leading `$`, optional thousands
//! separators, optional one or two decimal places.
//!
//! Documents store amounts as JSON numbers, so accepted input is capped at
//! `MAX_AMOUNT`: twelve integer digits plus cents always survive the trip
//! through an `f64` unchanged.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept when accumulating totals
pub const CENT_DIGITS: u32 = 2;

/// Most integer digits an entered amount may have
pub const AMOUNT_INTEGER_DIGITS: usize = 12;

/// Largest amount accepted from input: 999,999,999,999.99
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

fn money_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\$?(([1-9]\d{0,2}(,\d{3})*)|\d+)?(\.\d{1,2})?$")
            .expect("money pattern is a valid regex")
    })
}

/// Check whether a string is an accepted money amount
pub fn is_valid_money(input: &str) -> bool {
    let input = input.trim();
    input.chars().any(|c| c.is_ascii_digit()) && money_pattern().is_match(input)
}

/// Parse an accepted money string such as `"$1,234.50"`, `"50"` or `".5"`
///
/// Values above `MAX_AMOUNT` are rejected like any other malformed input.
pub fn parse_money(input: &str) -> Result<Decimal, MoneyParseError> {
    if !is_valid_money(input) {
        return Err(MoneyParseError::InvalidFormat(input.to_string()));
    }

    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    let cleaned = if cleaned.starts_with('.') {
        format!("0{}", cleaned)
    } else {
        cleaned
    };

    match cleaned.parse::<Decimal>() {
        Ok(value) if value <= MAX_AMOUNT => Ok(value),
        _ => Err(MoneyParseError::InvalidFormat(input.to_string())),
    }
}

/// Add without panicking, pinning at `Decimal::MAX`/`Decimal::MIN` on overflow
pub fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(if b.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Round to cents (half away from zero) when more than two fractional digits are present
pub fn round_cents(value: Decimal) -> Decimal {
    if value.scale() > CENT_DIGITS {
        value.round_dp_with_strategy(CENT_DIGITS, RoundingStrategy::MidpointAwayFromZero)
    } else {
        value
    }
}

/// Format a number the way ledger narratives show it: no trailing zeros
pub fn format_number(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Format with a currency symbol, sign in front: `-$5.25`
pub fn format_with_symbol(value: Decimal, symbol: &str) -> String {
    if value.is_sign_negative() && !value.is_zero() {
        format!("-{}{}", symbol, format_number(value.abs()))
    } else {
        format!("{}{}", symbol, format_number(value.abs()))
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accepted_formats() {
        assert_eq!(parse_money("50").unwrap(), dec!(50));
        assert_eq!(parse_money("$50").unwrap(), dec!(50));
        assert_eq!(parse_money("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_money("$1,234").unwrap(), dec!(1234));
        assert_eq!(parse_money("1234.5").unwrap(), dec!(1234.5));
        assert_eq!(parse_money(".75").unwrap(), dec!(0.75));
        assert_eq!(parse_money("0").unwrap(), dec!(0));
    }

    #[test]
    fn test_rejected_formats() {
        assert!(parse_money("").is_err());
        assert!(parse_money("$").is_err());
        assert!(parse_money(".").is_err());
        assert!(parse_money("12.345").is_err());
        assert!(parse_money("-5").is_err());
        assert!(parse_money("1,23").is_err());
        assert!(parse_money("01,234").is_err());
        assert!(parse_money("abc").is_err());
        assert!(parse_money("5.").is_err());
    }

    #[test]
    fn test_amount_cap() {
        assert_eq!(MAX_AMOUNT, dec!(999999999999.99));
        assert_eq!(
            parse_money("$999,999,999,999.99").unwrap(),
            dec!(999999999999.99)
        );
        assert!(parse_money("1,000,000,000,000").is_err());
        assert!(parse_money("1000000000000.00").is_err());
        assert!(parse_money("79228162514264337593543950335").is_err());
        assert!(parse_money("792281625142643375935439503350").is_err());
    }

    #[test]
    fn test_capped_amounts_survive_json_numbers() {
        for value in [MAX_AMOUNT, dec!(123456789012.34), dec!(0.01), dec!(100.1)] {
            let json = serde_json::to_string(&value).unwrap();
            assert!(!json.starts_with('"'));
            let back: Decimal = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_saturating_add() {
        assert_eq!(saturating_add(dec!(1.5), dec!(2)), dec!(3.5));
        assert_eq!(saturating_add(Decimal::MAX, dec!(1)), Decimal::MAX);
        assert_eq!(saturating_add(Decimal::MIN, dec!(-1)), Decimal::MIN);
        assert_eq!(saturating_add(Decimal::MAX, dec!(-1)), Decimal::MAX - dec!(1));
    }

    #[test]
    fn test_round_cents_half_away_from_zero() {
        assert_eq!(round_cents(dec!(2.345)), dec!(2.35));
        assert_eq!(round_cents(dec!(2.344)), dec!(2.34));
        assert_eq!(round_cents(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_cents(dec!(0.005)), dec!(0.01));
    }

    #[test]
    fn test_round_cents_leaves_short_values() {
        assert_eq!(round_cents(dec!(10.5)), dec!(10.5));
        assert_eq!(round_cents(dec!(10.5)).scale(), 1);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(dec!(95)), "95");
        assert_eq!(format_number(dec!(95.50)), "95.5");
        assert_eq!(format_number(dec!(0.05)), "0.05");
    }

    #[test]
    fn test_format_with_symbol() {
        assert_eq!(format_with_symbol(dec!(110), "$"), "$110");
        assert_eq!(format_with_symbol(dec!(-5.25), "$"), "-$5.25");
        assert_eq!(format_with_symbol(dec!(0), "€"), "€0");
    }
}
