use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a value typed into an assumption cell.
///
/// Thousands separators, a trailing `%` and surrounding whitespace are
/// stripped. Anything that still fails to parse, including an empty cell,
/// becomes zero.
pub fn parse_assumption_value(raw: &str) -> Decimal {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    match Decimal::from_str(&cleaned).or_else(|_| Decimal::from_scientific(&cleaned)) {
        Ok(value) => value,
        Err(_) => {
            log::warn!("assumption value '{raw}' is not a number; using 0");
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decorations_are_stripped() {
        assert_eq!(parse_assumption_value(" 1,250.5 "), dec!(1250.5));
        assert_eq!(parse_assumption_value("30%"), dec!(30));
        assert_eq!(parse_assumption_value("-12"), dec!(-12));
    }

    #[test]
    fn test_garbage_becomes_zero() {
        assert_eq!(parse_assumption_value(""), Decimal::ZERO);
        assert_eq!(parse_assumption_value("n/a"), Decimal::ZERO);
        assert_eq!(parse_assumption_value("%"), Decimal::ZERO);
    }
}
