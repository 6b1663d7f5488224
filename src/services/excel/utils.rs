use std::collections::HashSet;
use calamine::Data;
use chrono::{Duration, NaiveDate};
use crate::models::CellValue;

const EMPTY_HEADER: &str = "__EMPTY";

/// Names a header cell, keeping names unique within the sheet.
///
/// Blank headers become `__EMPTY`, repeats get a `_1`, `_2`, ... suffix.
pub fn header_name(cell: &Data, existing_names: &mut HashSet<String>) -> String {
    let raw = cell_to_value(cell).to_string();
    let base_name = match raw.trim() {
        "" => EMPTY_HEADER.to_string(),
        name => name.to_string(),
    };

    // If the name already exists, add a numeric suffix
    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    cleaned
}

pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::text(""),
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::from(*b),
        Data::DateTime(d) => CellValue::Text(excel_serial_to_iso(d.as_f64())),
        Data::DateTimeIso(s) => CellValue::text(s.as_str()),
        Data::DurationIso(s) => CellValue::text(s.as_str()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Renders an Excel serial date (1900 system) as ISO-8601 text.
pub fn excel_serial_to_iso(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return serial.to_string();
    };
    if !serial.is_finite() {
        return serial.to_string();
    }
    // the cast saturates, out-of-range offsets are rejected below
    let millis = (serial * 86_400_000.0).round() as i64;
    match Duration::try_milliseconds(millis).and_then(|offset| epoch.checked_add_signed(offset)) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        None => serial.to_string(),
    }
}

pub fn row_is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_are_unique() {
        let mut seen = HashSet::new();
        let names: Vec<String> = [
            Data::String("Name".into()),
            Data::String("Name".into()),
            Data::Empty,
            Data::Empty,
            Data::Float(2024.0),
            Data::String(" Name ".into()),
        ]
        .iter()
        .map(|cell| header_name(cell, &mut seen))
        .collect();

        assert_eq!(names, vec!["Name", "Name_1", "__EMPTY", "__EMPTY_1", "2024", "Name_2"]);
    }

    #[test]
    fn converts_cells() {
        assert_eq!(cell_to_value(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_to_value(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(cell_to_value(&Data::Bool(true)), CellValue::text("true"));
        assert_eq!(cell_to_value(&Data::Empty), CellValue::text(""));
        assert_eq!(cell_to_value(&Data::String("x".into())), CellValue::text("x"));
    }

    #[test]
    fn serial_dates_render_as_iso() {
        assert_eq!(excel_serial_to_iso(45292.0), "2024-01-01T00:00:00.000Z");
        assert_eq!(excel_serial_to_iso(45292.5), "2024-01-01T12:00:00.000Z");
    }

    #[test]
    fn out_of_range_serials_fall_back_to_the_number() {
        assert_eq!(excel_serial_to_iso(-1e300), (-1e300f64).to_string());
        assert_eq!(excel_serial_to_iso(1e300), 1e300f64.to_string());
        assert_eq!(excel_serial_to_iso(1e15), 1e15f64.to_string());
        assert_eq!(excel_serial_to_iso(f64::NAN), "NaN");
    }

    #[test]
    fn blank_rows() {
        assert!(row_is_blank(&[Data::Empty, Data::String("  ".into())]));
        assert!(!row_is_blank(&[Data::Empty, Data::Int(0)]));
    }
}
