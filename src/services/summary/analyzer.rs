use super::types::*;
use super::utils::*;
use crate::models::{CellValue, RowRecord};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;

// Below this many columns the rayon fan-out costs more than it saves.
const PARALLEL_COLUMN_THRESHOLD: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Categorical,
}

/// Builds bounded per-column digests from loosely typed rows.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    config: SummaryConfig,
}

impl Summarizer {
    pub fn new(config: SummaryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    pub fn summarize(&self, rows: &[RowRecord]) -> DatasetSummary {
        if rows.is_empty() {
            return DatasetSummary::default();
        }

        let data = &rows[..rows.len().min(self.config.sample_size)];
        let headers: Vec<&str> = data.first().map(|r| r.keys().collect()).unwrap_or_default();

        tracing::debug!(
            "Summarizing {} of {} rows across {} columns",
            data.len(),
            rows.len(),
            headers.len()
        );

        let values_by_column = collect_columns(data, &headers);
        let summarize_header = |(header, values): (&&str, &Vec<&CellValue>)| {
            self.summarize_column(header, values)
                .map(|summary| (header.to_string(), summary))
        };

        let columns: Vec<(String, ColumnSummary)> = if headers.len() >= PARALLEL_COLUMN_THRESHOLD {
            headers.par_iter().zip(values_by_column.par_iter()).filter_map(summarize_header).collect()
        } else {
            headers.iter().zip(values_by_column.iter()).filter_map(summarize_header).collect()
        };

        DatasetSummary {
            rows: rows.len(),
            sampled_rows: Some(data.len()),
            columns: columns.into(),
        }
    }

    fn summarize_column(&self, header: &str, values: &[&CellValue]) -> Option<ColumnSummary> {
        if values.is_empty() {
            tracing::debug!("Column {} has no usable values, skipping", header);
            return None;
        }

        match self.detect_column_type(values) {
            ColumnKind::Numeric => {
                let summary = numeric_summary(values);
                if summary.is_none() {
                    tracing::debug!("Column {} looked numeric but nothing parsed, skipping", header);
                }
                summary.map(ColumnSummary::Numeric)
            }
            ColumnKind::Categorical => Some(ColumnSummary::Categorical(categorical_summary(
                values,
                self.config.top_k,
            ))),
        }
    }

    /// Votes over the leading values only; later values never change the outcome.
    fn detect_column_type(&self, values: &[&CellValue]) -> ColumnKind {
        let sample = &values[..values.len().min(self.config.type_sample_size)];
        if sample.is_empty() {
            return ColumnKind::Categorical;
        }

        let numeric_votes = sample.iter().filter(|v| is_numeric(v)).count();
        if numeric_votes as f64 / sample.len() as f64 >= self.config.numeric_threshold {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }
}

/// Gathers the non-blank values of every header in one pass over the rows.
///
/// Keys missing from `headers` are ignored; the result is indexed like `headers`.
fn collect_columns<'a>(data: &'a [RowRecord], headers: &[&str]) -> Vec<Vec<&'a CellValue>> {
    let positions: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (*header, idx))
        .collect();

    let mut columns: Vec<Vec<&CellValue>> = vec![Vec::new(); headers.len()];
    for row in data {
        for (key, value) in row.iter() {
            if value.is_blank() {
                continue;
            }
            if let Some(&idx) = positions.get(key) {
                columns[idx].push(value);
            }
        }
    }
    columns
}

/// Summarizes `rows` with the default configuration.
pub fn summarize(rows: &[RowRecord]) -> DatasetSummary {
    Summarizer::default().summarize(rows)
}

fn numeric_summary(values: &[&CellValue]) -> Option<NumericSummary> {
    let nums: Vec<f64> = values.iter().filter_map(|v| parse_number(v)).collect();
    if nums.is_empty() {
        return None;
    }

    let count = nums.len();
    let (min, max) = nums
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &n| (lo.min(n), hi.max(n)));
    let mean = nums.iter().sum::<f64>() / count as f64;

    let sample_std = if count > 1 {
        let squared: f64 = nums.iter().map(|x| (x - mean).powi(2)).sum();
        (squared / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    Some(NumericSummary {
        count,
        min,
        max,
        // rounding may step past an extreme when all values are close together
        mean: round_to(mean, 4).clamp(min, max),
        sample_std,
    })
}

fn categorical_summary(values: &[&CellValue], top_k: usize) -> CategoricalSummary {
    let (_, counts) = values.iter().fold(
        (HashMap::<String, usize>::new(), Vec::<TopValue>::new()),
        |(mut index, mut counts), value| {
            let key = category_key(value);
            match index.get(&key) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    index.insert(key.clone(), counts.len());
                    counts.push((key, 1));
                }
            }
            (index, counts)
        },
    );

    let distinct = counts.len();
    let mut ranked = counts;
    // stable: ties stay in first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(top_k);

    CategoricalSummary {
        count: values.len(),
        distinct,
        top_values: SmallVec::from_vec(ranked),
    }
}
