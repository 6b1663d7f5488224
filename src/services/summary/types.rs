use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use smallvec::SmallVec;

pub const DEFAULT_SAMPLE_SIZE: usize = 1000;
pub const DEFAULT_TYPE_SAMPLE_SIZE: usize = 25;
pub const DEFAULT_NUMERIC_THRESHOLD: f64 = 0.7;
pub const DEFAULT_TOP_K: usize = 5;

/// Tuning knobs for the summarizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    /// Maximum number of leading rows analysed (default: 1000)
    pub sample_size: usize,
    /// Number of leading non-empty values used to decide a column's type (default: 25)
    pub type_sample_size: usize,
    /// Share of numeric values in the type sub-sample needed to call a column numeric (default: 0.7)
    pub numeric_threshold: f64,
    /// Number of most frequent categories reported (default: 5)
    pub top_k: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            type_sample_size: DEFAULT_TYPE_SAMPLE_SIZE,
            numeric_threshold: DEFAULT_NUMERIC_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

pub type TopValue = (String, usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sample_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalSummary {
    pub count: usize,
    pub distinct: usize,
    pub top_values: SmallVec<[TopValue; DEFAULT_TOP_K]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

impl ColumnSummary {
    pub fn count(&self) -> usize {
        match self {
            ColumnSummary::Numeric(s) => s.count,
            ColumnSummary::Categorical(s) => s.count,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericSummary> {
        match self {
            ColumnSummary::Numeric(s) => Some(s),
            ColumnSummary::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&CategoricalSummary> {
        match self {
            ColumnSummary::Categorical(s) => Some(s),
            ColumnSummary::Numeric(_) => None,
        }
    }
}

/// Per-column summaries in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSummaries(Vec<(String, ColumnSummary)>);

impl ColumnSummaries {
    pub fn get(&self, name: &str) -> Option<&ColumnSummary> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnSummary)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, ColumnSummary)>> for ColumnSummaries {
    fn from(columns: Vec<(String, ColumnSummary)>) -> Self {
        Self(columns)
    }
}

impl Serialize for ColumnSummaries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, summary) in &self.0 {
            map.serialize_entry(name, summary)?;
        }
        map.end()
    }
}

/// Compact digest of a whole dataset.
///
/// `sampled_rows` is absent only for empty input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampled_rows: Option<usize>,
    pub columns: ColumnSummaries,
}
