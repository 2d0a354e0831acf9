use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Characters accepted as thousands separators: the ASCII apostrophe and the
/// typographic one (U+2019) that Swiss keyboards and word processors produce.
pub const THOUSANDS_SEPARATORS: [char; 2] = ['\'', '\u{2019}'];

/// Number of decimal places for CHF amounts.
pub const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// Parse a Swiss-formatted amount such as `1'500.00` or `12'345'678.9`.
///
/// Every thousands separator is stripped before parsing. The remainder must be
/// a plain decimal: optional sign, digits, at most one `.` decimal point.
pub fn parse_swiss(text: &str) -> Result<Decimal, MoneyError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::Empty);
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !THOUSANDS_SEPARATORS.contains(c))
        .collect();

    let normalized =
        normalize_plain_decimal(&cleaned).ok_or_else(|| MoneyError::Invalid(text.to_string()))?;

    Decimal::from_str(&normalized).map_err(|_| MoneyError::Invalid(text.to_string()))
}

/// Like [`parse_swiss`], but malformed or empty input is zero.
pub fn parse_swiss_or_zero(text: &str) -> Decimal {
    parse_swiss(text).unwrap_or(Decimal::ZERO)
}

/// `-.5` -> `-0.5`, `5.` -> `5`; `None` unless the input is sign, digits and at
/// most one decimal point.
fn normalize_plain_decimal(s: &str) -> Option<String> {
    let (sign, unsigned) = match s.chars().next() {
        Some('-') => ("-", &s[1..]),
        Some('+') => ("", &s[1..]),
        _ => ("", s),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    if frac_part.is_empty() {
        Some(format!("{}{}", sign, int_part))
    } else {
        Some(format!("{}{}.{}", sign, int_part, frac_part))
    }
}

/// Round to two decimals (half away from zero) and render with apostrophe
/// thousands separators: `2400` -> `2'400.00`.
pub fn format_swiss(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let mut rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    rounded.rescale(MONEY_SCALE);

    let fixed = rounded.to_string();
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    format!("{}{}.{}", sign, group_thousands(int_part), frac_part)
}

fn group_thousands(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('\'');
        }
        out.push(ch);
    }
    out
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `percent` % of `amount`; `None` when the result leaves the `Decimal` range.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    percent
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|rate| amount.checked_mul(rate))
}

/// Best-effort conversion of a loosely typed JSON value into an amount.
/// Numbers and numeric strings convert; everything else is zero.
pub fn coerce_amount(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .unwrap_or(Decimal::ZERO)
        }
        serde_json::Value::String(s) => parse_swiss_or_zero(s),
        _ => Decimal::ZERO,
    }
}

/// Serde helper for amounts that may arrive as numbers, numeric strings,
/// Swiss-formatted strings or garbage (which becomes zero).
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_amount(&value))
}

/// [`lenient_amount`] clamped at zero, for base prices.
pub fn lenient_non_negative<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_amount(deserializer).map(|amount| amount.max(Decimal::ZERO))
}

/// Optional variant: `null` stays `None`, anything else is coerced.
pub fn lenient_amount_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| coerce_amount(&v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_swiss_amounts() {
        assert_eq!(parse_swiss("1'500.00").unwrap(), dec("1500.00"));
        assert_eq!(parse_swiss("  900 ").unwrap(), dec("900"));
        assert_eq!(parse_swiss("0.5").unwrap(), dec("0.5"));
        assert_eq!(parse_swiss(".5").unwrap(), dec("0.5"));
        assert_eq!(parse_swiss("1\u{2019}250.50").unwrap(), dec("1250.50"));
    }

    #[test]
    fn strips_every_separator() {
        assert_eq!(parse_swiss("1'234'567.89").unwrap(), dec("1234567.89"));
        assert_eq!(parse_swiss("12'345'678").unwrap(), dec("12345678"));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_swiss(""), Err(MoneyError::Empty));
        assert_eq!(parse_swiss("   "), Err(MoneyError::Empty));
        assert!(parse_swiss("abc").is_err());
        assert!(parse_swiss("1,500.00").is_err());
        assert!(parse_swiss("1.2.3").is_err());
        assert!(parse_swiss("12abc").is_err());
        assert!(parse_swiss("1e3").is_err());
        assert!(parse_swiss(".").is_err());
        assert_eq!(parse_swiss_or_zero("abc"), Decimal::ZERO);
        assert_eq!(parse_swiss_or_zero(""), Decimal::ZERO);
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_swiss(dec("0")), "0.00");
        assert_eq!(format_swiss(dec("999.9")), "999.90");
        assert_eq!(format_swiss(dec("2400")), "2'400.00");
        assert_eq!(format_swiss(dec("123456.789")), "123'456.79");
        assert_eq!(format_swiss(dec("1234567.891")), "1'234'567.89");
        assert_eq!(format_swiss(dec("-1500")), "-1'500.00");
        assert_eq!(format_swiss(dec("-0.001")), "0.00");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_swiss(dec("10.005")), "10.01");
        assert_eq!(format_swiss(dec("10.004")), "10.00");
    }

    #[test]
    fn format_after_parse_normalizes() {
        for (input, expected) in [
            ("1'500.00", "1'500.00"),
            ("1500", "1'500.00"),
            ("0.00", "0.00"),
            ("1'000'000.5", "1'000'000.50"),
        ] {
            assert_eq!(format_swiss(parse_swiss(input).unwrap()), expected);
        }
    }

    #[test]
    fn percentages() {
        assert_eq!(percent_of(dec("2400"), dec("10")), Some(dec("240")));
        assert_eq!(percent_of(dec("2160"), dec("7.7")).map(round_money), Some(dec("166.32")));
        assert_eq!(percent_of(Decimal::MAX, dec("200")), None);
    }

    #[test]
    fn coerces_json_values() {
        use serde_json::json;
        assert_eq!(coerce_amount(&json!(900.0)), dec("900"));
        assert_eq!(coerce_amount(&json!(250)), dec("250"));
        assert_eq!(coerce_amount(&json!("1'200.50")), dec("1200.50"));
        assert_eq!(coerce_amount(&json!("abc")), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!(null)), Decimal::ZERO);
        assert_eq!(coerce_amount(&json!(true)), Decimal::ZERO);
    }

    #[test]
    fn lenient_deserializers() {
        #[derive(serde::Deserialize)]
        struct Row {
            #[serde(deserialize_with = "lenient_amount")]
            price: Decimal,
            #[serde(deserialize_with = "lenient_non_negative")]
            base: Decimal,
            #[serde(default, deserialize_with = "lenient_amount_opt")]
            rate: Option<Decimal>,
        }

        let row: Row = serde_json::from_str(r#"{"price": "x", "base": -20}"#).unwrap();
        assert_eq!(row.price, Decimal::ZERO);
        assert_eq!(row.base, Decimal::ZERO);
        assert_eq!(row.rate, None);

        let row: Row = serde_json::from_str(r#"{"price": "45.50", "base": "1'000", "rate": 80}"#).unwrap();
        assert_eq!(row.price, dec("45.50"));
        assert_eq!(row.base, dec("1000"));
        assert_eq!(row.rate, Some(dec("80")));
    }
}
