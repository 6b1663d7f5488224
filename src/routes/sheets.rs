use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Router,
    Json,
    http::Method,
};
use serde::Deserialize;
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    models::RowRecord,
    services::{
        file_processor::{self, AnalyzeResponse, UploadedFile},
        insights::ChartContext,
        summary::DatasetSummary,
    },
};
use tower_http::cors::{CorsLayer, Any};

// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/api/summarize", post(summarize_rows))
        .route("/api/analyze-ai", post(analyze_sheet))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD_BYTES))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    rows: Vec<RowRecord>,
}

async fn summarize_rows(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<DatasetSummary>, AppError> {
    let start = std::time::Instant::now();
    let row_count = request.rows.len();

    let summary = file_processor::summarize_rows(state.summarizer.clone(), request.rows).await?;
    tracing::info!(
        "Summarized {} rows into {} columns in {:?}",
        row_count,
        summary.columns.len(),
        start.elapsed()
    );

    Ok(Json(summary))
}

#[axum::debug_handler]
async fn analyze_sheet(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut chart = ChartContext::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                file = Some(UploadedFile { file_name, content_type, data });
            }
            "xAxis" => chart.x_axis = Some(field.text().await?),
            "yAxis" => chart.y_axis = Some(field.text().await?),
            "chartType" => chart.chart_type = Some(field.text().await?),
            other => tracing::debug!("Ignoring form field {}", other),
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidInput("No file uploaded".to_string()))?;
    file_processor::validate_upload(&file, state.config.max_upload_bytes)?;

    let provider = state.insights.clone()
        .ok_or_else(|| AppError::Config("Insight generation is not configured".to_string()))?;

    let response = file_processor::analyze_workbook(
        file,
        &chart,
        state.summarizer.clone(),
        provider.as_ref(),
    )
    .await
    .map_err(|e| {
        tracing::error!("AI analyze error: {}", e);
        e
    })?;

    Ok(Json(response))
}
