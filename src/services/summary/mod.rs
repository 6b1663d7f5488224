pub mod analyzer;
pub mod types;
pub mod utils;

pub use analyzer::{summarize, Summarizer};
pub use types::{
    CategoricalSummary, ColumnSummaries, ColumnSummary, DatasetSummary, NumericSummary,
    SummaryConfig, TopValue,
};
pub use utils::parse_number;
