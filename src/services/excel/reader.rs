use super::utils::*;
use std::collections::HashSet;
use std::io::Cursor;
use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use crate::error::AppError;
use crate::models::RowRecord;

/// Decodes the first sheet of an `.xls`/`.xlsx` workbook into row records.
///
/// The first row supplies the column names; every later row gets a value for
/// each name, blank cells default to empty text. Fully blank rows are dropped.
pub fn read_first_sheet(file_data: Bytes) -> Result<Vec<RowRecord>, AppError> {
    let start = std::time::Instant::now();
    let cursor = Cursor::new(file_data);

    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| {
            tracing::error!("Failed to open workbook: {}", e);
            AppError::FileProcessingError(format!("Failed to open workbook: {}", e))
        })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names.first()
        .ok_or_else(|| AppError::InvalidInput("No sheets found in workbook".to_string()))?;
    if sheet_names.len() > 1 {
        tracing::info!("Workbook has {} sheets, reading only {}", sheet_names.len(), sheet_name);
    }

    let range = workbook.worksheet_range(sheet_name)
        .map_err(|e| AppError::FileProcessingError(format!("Failed to read worksheet {}: {}", sheet_name, e)))?;

    let rows = rows_to_records(range.rows());
    tracing::info!("Read {} rows from sheet {} in {:?}", rows.len(), sheet_name, start.elapsed());

    Ok(rows)
}

/// Turns raw sheet rows (header first) into records.
pub fn rows_to_records<'a, I>(mut rows: I) -> Vec<RowRecord>
where
    I: Iterator<Item = &'a [Data]>,
{
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };

    let mut existing_names = HashSet::new();
    let headers: Vec<String> = header_row.iter()
        .map(|cell| header_name(cell, &mut existing_names))
        .collect();

    let mut skipped = 0usize;
    let records: Vec<RowRecord> = rows
        .filter(|row| {
            let blank = row_is_blank(row);
            if blank {
                skipped += 1;
            }
            !blank
        })
        .map(|row| {
            // header names are already unique
            let mut record = RowRecord::with_capacity(headers.len());
            for (idx, header) in headers.iter().enumerate() {
                let value = row.get(idx).map(cell_to_value).unwrap_or_else(|| "".into());
                record.push(header.clone(), value);
            }
            record
        })
        .collect();

    if skipped > 0 {
        tracing::warn!("Skipped {} blank rows", skipped);
    }

    records
}
