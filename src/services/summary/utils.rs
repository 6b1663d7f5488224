use crate::models::CellValue;

/// Converts a cell to a finite number, tolerating thousands separators.
///
/// Every `,` is dropped before parsing, so `"1,234.5"` reads as `1234.5`.
/// Returns `None` for anything that does not end up a finite number.
pub fn parse_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::Text(s) => parse_numeric_text(&s.replace(',', "")),
        CellValue::Empty => None,
    }
}

pub fn is_numeric(value: &CellValue) -> bool {
    parse_number(value).is_some()
}

/// Numeric literal rules of a loosely typed host: whitespace is ignored,
/// blank text is zero, and radix-prefixed integers are accepted.
fn parse_numeric_text(text: &str) -> Option<f64> {
    let s = text.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    if let Some(n) = parse_radix_literal(s) {
        return Some(n);
    }

    // f64's parser also takes "inf"/"nan" spellings which are not numbers here
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }

    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_radix_literal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'0' {
        return None;
    }
    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };

    s[2..].chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
    })
    .filter(|n| n.is_finite())
}

/// The trimmed text form used as a category key.
pub fn category_key(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Rounds to `places` decimal places, halves away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::text(s)
    }

    #[test]
    fn parses_thousands_separators() {
        assert_eq!(parse_number(&text("1,234.5")), Some(1234.5));
        assert_eq!(parse_number(&text("1,000")), Some(1000.0));
        assert_eq!(parse_number(&text("  -2,500 ")), Some(-2500.0));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse_number(&text("abc")), None);
        assert_eq!(parse_number(&text("12abc")), None);
        assert_eq!(parse_number(&text("$12")), None);
        assert_eq!(parse_number(&text("Infinity")), None);
        assert_eq!(parse_number(&text("inf")), None);
        assert_eq!(parse_number(&text("NaN")), None);
        assert_eq!(parse_number(&text("1e400")), None);
        assert_eq!(parse_number(&text(".")), None);
        assert_eq!(parse_number(&text("0x")), None);
        assert_eq!(parse_number(&CellValue::Empty), None);
        assert_eq!(parse_number(&CellValue::Number(f64::NAN)), None);
        assert_eq!(parse_number(&CellValue::Number(f64::INFINITY)), None);
    }

    #[test]
    fn accepts_literal_forms() {
        assert_eq!(parse_number(&text("1e3")), Some(1000.0));
        assert_eq!(parse_number(&text(".5")), Some(0.5));
        assert_eq!(parse_number(&text("5.")), Some(5.0));
        assert_eq!(parse_number(&text("+7")), Some(7.0));
        assert_eq!(parse_number(&text("0x1F")), Some(31.0));
        assert_eq!(parse_number(&text("0b101")), Some(5.0));
        assert_eq!(parse_number(&text("0o17")), Some(15.0));
        assert_eq!(parse_number(&CellValue::Number(3.25)), Some(3.25));
    }

    #[test]
    fn separator_only_text_reads_as_zero() {
        assert_eq!(parse_number(&text(",")), Some(0.0));
        assert_eq!(parse_number(&text("1,,2")), Some(12.0));
    }

    #[test]
    fn category_keys_are_trimmed() {
        assert_eq!(category_key(&text("  NY ")), "NY");
        assert_eq!(category_key(&CellValue::Number(42.0)), "42");
        assert_eq!(category_key(&CellValue::Number(0.5)), "0.5");
    }

    #[test]
    fn rounds_to_four_places() {
        assert_eq!(round_to(27.5, 4), 27.5);
        assert_eq!(round_to(1.0 / 3.0, 4), 0.3333);
        assert_eq!(round_to(2.0 / 3.0, 4), 0.6667);
        assert_eq!(round_to(-1.23456, 4), -1.2346);
    }
}
