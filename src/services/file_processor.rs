use bytes::Bytes;
use serde::Serialize;
use crate::error::AppError;
use crate::models::RowRecord;
use crate::services::excel::read_first_sheet;
use crate::services::insights::{build_prompt, ChartContext, InsightProvider};
use crate::services::summary::{DatasetSummary, Summarizer};

const ACCEPTED_CONTENT_TYPES: [&str; 3] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    // some browsers send this for spreadsheets
    "application/octet-stream",
];

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub summary: DatasetSummary,
    pub insights: String,
}

/// Accepts `.xls`/`.xlsx` uploads with a spreadsheet-ish content type.
pub fn validate_upload(file: &UploadedFile, max_upload_bytes: usize) -> Result<(), AppError> {
    let lower = file.file_name.to_lowercase();
    let ok_name = lower.ends_with(".xlsx") || lower.ends_with(".xls");
    let ok_type = file.content_type.as_deref()
        .is_some_and(|ct| ACCEPTED_CONTENT_TYPES.contains(&ct));

    if !(ok_name && ok_type) {
        tracing::warn!(
            "Rejected upload {} with content type {:?}",
            file.file_name,
            file.content_type
        );
        return Err(AppError::InvalidInput("Only .xls/.xlsx files are allowed".to_string()));
    }

    if file.data.len() > max_upload_bytes {
        return Err(AppError::InvalidInput(format!(
            "File exceeds the {} byte upload limit",
            max_upload_bytes
        )));
    }

    Ok(())
}

/// Summarizes rows off the async executor.
pub async fn summarize_rows(summarizer: Summarizer, rows: Vec<RowRecord>) -> Result<DatasetSummary, AppError> {
    let summary = tokio::task::spawn_blocking(move || summarizer.summarize(&rows)).await?;
    Ok(summary)
}

/// Full upload pipeline: decode the first sheet, summarize, ask for insights.
pub async fn analyze_workbook(
    file: UploadedFile,
    chart: &ChartContext,
    summarizer: Summarizer,
    provider: &dyn InsightProvider,
) -> Result<AnalyzeResponse, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Starting AI analysis for file: {}", file.file_name);

    let data = file.data;
    let rows = tokio::task::spawn_blocking(move || read_first_sheet(data)).await??;
    tracing::info!("Workbook parsed, rows: {}", rows.len());

    let summary = summarize_rows(summarizer, rows).await?;
    tracing::info!(
        "Summary generated with {} columns in {:?}",
        summary.columns.len(),
        start.elapsed()
    );

    let prompt = build_prompt(&summary, chart)?;
    let insights = provider.generate(&prompt).await?;
    tracing::info!("Analysis completed in {:?}", start.elapsed());

    Ok(AnalyzeResponse { summary, insights })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: Option<&str>, size: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            data: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn accepts_spreadsheet_uploads() {
        let xlsx = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
        assert!(validate_upload(&upload("report.xlsx", Some(xlsx), 10), 100).is_ok());
        assert!(validate_upload(&upload("OLD.XLS", Some("application/vnd.ms-excel"), 10), 100).is_ok());
        assert!(validate_upload(&upload("a.xlsx", Some("application/octet-stream"), 10), 100).is_ok());
    }

    #[test]
    fn rejects_other_uploads() {
        assert!(validate_upload(&upload("data.csv", Some("text/csv"), 10), 100).is_err());
        assert!(validate_upload(&upload("data.xlsx", Some("text/csv"), 10), 100).is_err());
        assert!(validate_upload(&upload("data.xlsx", None, 10), 100).is_err());
        assert!(validate_upload(&upload("data.xlsx.exe", Some("application/octet-stream"), 10), 100).is_err());
    }

    #[test]
    fn summarizes_off_the_executor() {
        let rows: Vec<RowRecord> = vec![
            [("score", "5")].into_iter().collect(),
            [("score", "7")].into_iter().collect(),
        ];

        let summary = tokio_test::block_on(summarize_rows(Summarizer::default(), rows)).unwrap();

        assert_eq!(summary.sampled_rows, Some(2));
        let score = summary.columns.get("score").and_then(|c| c.as_numeric()).unwrap();
        assert_eq!(score.mean, 6.0);
    }

    #[test]
    fn enforces_size_limit() {
        let err = validate_upload(&upload("big.xlsx", Some("application/octet-stream"), 101), 100)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
