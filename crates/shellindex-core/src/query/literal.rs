use super::ast::TypedValue;
use super::locale::Locale;
use crate::errors::{ParseError, ParseErrorKind};

const RANGE_SEPARATOR: &str = "...";

/// Types a raw literal. `offset` is the character position of `text` inside
/// the whole query and is only used for error reporting.
///
/// Precedence: quoted text, boolean, then number, big integer (`123n`) and
/// date. `a...b` is a range whose bounds must both parse as the same kind.
pub fn parse_value(text: &str, locale: &Locale, offset: usize) -> Result<TypedValue, ParseError> {
    let text = text.trim();
    let error = |kind| ParseError::new(kind, offset, text.chars().next());

    if let Some(quote) = text.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let inner = &text[quote.len_utf8()..];
        return match inner.strip_suffix(quote) {
            Some(inner) => Ok(TypedValue::Str(inner.to_string())),
            None => Err(ParseError::new(
                ParseErrorKind::EndOfTextNotFound,
                offset + text.chars().count(),
                None,
            )),
        };
    }

    if text.eq_ignore_ascii_case("true") {
        return Ok(TypedValue::Bool(true));
    }
    if text.eq_ignore_ascii_case("false") {
        return Ok(TypedValue::Bool(false));
    }

    let parts: Vec<&str> = text.split(RANGE_SEPARATOR).map(str::trim).collect();
    match parts.as_slice() {
        [single] => parse_scalar(single, locale)
            .ok_or_else(|| error(ParseErrorKind::InvalidDateExpression)),
        [min, max] => {
            parse_range(min, max, locale).ok_or_else(|| error(ParseErrorKind::InvalidRangeExpression))
        }
        _ => Err(error(ParseErrorKind::InvalidRangeExpression)),
    }
}

fn parse_scalar(text: &str, locale: &Locale) -> Option<TypedValue> {
    if let Some(n) = locale.parse_number(text) {
        return Some(TypedValue::Num(n));
    }
    if let Some(n) = parse_bigint(text) {
        return Some(TypedValue::BigInt(n));
    }
    locale.parse_date(text).map(TypedValue::Date)
}

fn parse_range(min: &str, max: &str, locale: &Locale) -> Option<TypedValue> {
    if let (Some(a), Some(b)) = (locale.parse_number(min), locale.parse_number(max)) {
        return Some(TypedValue::NumRange(a, b));
    }
    if let (Some(a), Some(b)) = (parse_bigint(min), parse_bigint(max)) {
        return Some(TypedValue::BigIntRange(a, b));
    }
    if let (Some(a), Some(b)) = (locale.parse_date(min), locale.parse_date(max)) {
        return Some(TypedValue::DateRange(a, b));
    }
    None
}

/// `1234567890123n`: an optionally signed integer with an `n` suffix.
pub fn parse_bigint(text: &str) -> Option<i128> {
    let digits = text.trim().strip_suffix('n')?;
    let unsigned = digits.strip_prefix(['-', '+']).unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i128>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn en(text: &str) -> Result<TypedValue, ParseError> {
        parse_value(text, &Locale::EN, 0)
    }

    #[test]
    fn quoted_text_wins_over_other_types() {
        assert_eq!(en("'42'").unwrap(), TypedValue::Str("42".into()));
        assert_eq!(en("\"true\"").unwrap(), TypedValue::Str("true".into()));
        let err = en("'open").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EndOfTextNotFound);
        assert_eq!(err.position, 5);
        assert_eq!(en("\"mixed'").unwrap_err().kind, ParseErrorKind::EndOfTextNotFound);
    }

    #[test]
    fn scalars_in_precedence_order() {
        assert_eq!(en("TRUE").unwrap(), TypedValue::Bool(true));
        assert_eq!(en("5000").unwrap(), TypedValue::Num(5000.0));
        assert_eq!(en("1234567890123456789012n").unwrap(), TypedValue::BigInt(1234567890123456789012));
        assert_eq!(
            en("2024-05-01").unwrap(),
            TypedValue::Date(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_value("1,5", &Locale::DE, 0).unwrap(),
            TypedValue::Num(1.5)
        );
    }

    #[test]
    fn unknown_scalar_is_rejected() {
        let err = parse_value("pump", &Locale::EN, 7).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidDateExpression);
        assert_eq!(err.position, 7);
        assert_eq!(err.character, Some('p'));
    }

    #[test]
    fn ranges_need_matching_kinds() {
        assert_eq!(en("1...5").unwrap(), TypedValue::NumRange(1.0, 5.0));
        assert_eq!(en("1n...5n").unwrap(), TypedValue::BigIntRange(1, 5));
        assert_eq!(
            en("2024-01-01...2024-12-31").unwrap(),
            TypedValue::DateRange(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()
            )
        );
        assert_eq!(en("1...5n").unwrap_err().kind, ParseErrorKind::InvalidRangeExpression);
        assert_eq!(en("1...").unwrap_err().kind, ParseErrorKind::InvalidRangeExpression);
        assert_eq!(en("1...2...3").unwrap_err().kind, ParseErrorKind::InvalidRangeExpression);
    }

    #[test]
    fn bigint_requires_suffix_and_digits() {
        assert_eq!(parse_bigint("-17n"), Some(-17));
        assert_eq!(parse_bigint("17"), None);
        assert_eq!(parse_bigint("n"), None);
        assert_eq!(parse_bigint("1.5n"), None);
    }
}
