//! Upload pipeline tests over workbooks generated in memory.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use rust_xlsxwriter::Workbook;
use sheet_insights::error::AppError;
use sheet_insights::services::excel::read_first_sheet;
use sheet_insights::services::file_processor::{analyze_workbook, UploadedFile};
use sheet_insights::services::insights::{ChartContext, InsightProvider};
use sheet_insights::{CellValue, ColumnSummary, Summarizer};

/// Records the prompt it was given and answers with a canned reply.
#[derive(Default)]
struct RecordingProvider {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl InsightProvider for RecordingProvider {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("- revenue grows month over month".to_string())
    }
}

struct FailingProvider;

#[async_trait]
impl InsightProvider for FailingProvider {
    async fn generate(&self, _prompt: &str) -> Result<String, AppError> {
        Err(AppError::LlmError("upstream unavailable".to_string()))
    }
}

fn sales_workbook() -> Bytes {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 0, "month").unwrap();
    sheet.write_string(0, 1, "revenue").unwrap();
    sheet.write_string(0, 2, "region").unwrap();
    sheet.write_string(0, 3, "notes").unwrap();

    let data = [
        ("Jan", 1200.0, "north"),
        ("Feb", 1450.5, "south"),
        ("Mar", 980.0, "north"),
        ("Apr", 1610.0, "north"),
    ];
    for (i, (month, revenue, region)) in data.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *month).unwrap();
        sheet.write_number(row, 1, *revenue).unwrap();
        sheet.write_string(row, 2, *region).unwrap();
    }
    // a text revenue with separators on a row of its own
    sheet.write_string(5, 0, "May").unwrap();
    sheet.write_string(5, 1, "2,000").unwrap();
    sheet.write_string(5, 2, "south").unwrap();

    // a second sheet is never read
    let other = workbook.add_worksheet();
    other.write_string(0, 0, "ignored").unwrap();

    Bytes::from(workbook.save_to_buffer().unwrap())
}

fn upload(data: Bytes) -> UploadedFile {
    UploadedFile {
        file_name: "sales.xlsx".to_string(),
        content_type: Some("application/octet-stream".to_string()),
        data,
    }
}

#[test]
fn test_reads_first_sheet_with_header_row() {
    let rows = read_first_sheet(sales_workbook()).unwrap();

    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["month", "revenue", "region", "notes"]);
    assert_eq!(rows[0].get("revenue"), Some(&CellValue::Number(1200.0)));
    assert_eq!(rows[0].get("notes"), Some(&CellValue::text("")));
    assert_eq!(rows[4].get("revenue"), Some(&CellValue::text("2,000")));
}

#[tokio::test]
async fn test_analyze_workbook_summarizes_and_prompts() {
    let provider = RecordingProvider::default();
    let chart = ChartContext {
        x_axis: Some("month".to_string()),
        y_axis: Some("revenue".to_string()),
        chart_type: Some("line chart".to_string()),
    };

    let response = analyze_workbook(upload(sales_workbook()), &chart, Summarizer::default(), &provider)
        .await
        .unwrap();

    assert_eq!(response.insights, "- revenue grows month over month");
    assert_eq!(response.summary.rows, 5);
    assert_eq!(response.summary.sampled_rows, Some(5));
    assert!(!response.summary.columns.contains("notes"));

    let revenue = response
        .summary
        .columns
        .get("revenue")
        .and_then(ColumnSummary::as_numeric)
        .unwrap();
    assert_eq!(revenue.count, 5);
    assert_eq!(revenue.min, 980.0);
    assert_eq!(revenue.max, 2000.0);
    assert_eq!(revenue.mean, 1448.1);

    let region = response
        .summary
        .columns
        .get("region")
        .and_then(ColumnSummary::as_categorical)
        .unwrap();
    assert_eq!(region.top_values[0], ("north".to_string(), 3));

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"month\" on the X-axis and \"revenue\" on the Y-axis"));
    assert!(prompts[0].contains("\"type\": \"categorical\""));
}

#[tokio::test]
async fn test_provider_failure_propagates() {
    let err = analyze_workbook(
        upload(sales_workbook()),
        &ChartContext::default(),
        Summarizer::default(),
        &FailingProvider,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::LlmError(_)));
}

#[tokio::test]
async fn test_unreadable_upload_is_rejected_before_prompting() {
    let provider = RecordingProvider::default();
    let err = analyze_workbook(
        upload(Bytes::from_static(b"PK\x03\x04 definitely not a workbook")),
        &ChartContext::default(),
        Summarizer::default(),
        &provider,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::FileProcessingError(_)));
    assert!(provider.prompts.lock().unwrap().is_empty());
}
