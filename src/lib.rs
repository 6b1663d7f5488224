//! Spreadsheet summaries and LLM insights.
//!
//! The heart of the crate is [`services::summary`], which turns loosely typed
//! rows into a bounded per-column digest. Around it sit a workbook decoder,
//! an insight prompt builder and a small axum service.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

pub use models::{CellValue, RowRecord};
pub use services::summary::{summarize, ColumnSummary, DatasetSummary, Summarizer, SummaryConfig};

use services::insights::{ChatInsightProvider, InsightProvider};

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub summarizer: Summarizer,
    pub insights: Option<Arc<dyn InsightProvider>>,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let insights = match ChatInsightProvider::new(&config.llm) {
            Ok(provider) => Some(Arc::new(provider) as Arc<dyn InsightProvider>),
            Err(e) => {
                tracing::warn!("Insights disabled: {}", e);
                None
            }
        };
        Self::with_provider(config, insights)
    }

    pub fn with_provider(config: config::Config, insights: Option<Arc<dyn InsightProvider>>) -> Self {
        Self {
            summarizer: Summarizer::new(config.summary.clone()),
            config,
            insights,
        }
    }
}
