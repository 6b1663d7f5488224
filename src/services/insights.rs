use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, Role, CreateChatCompletionRequest,
        ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::LlmConfig;
use crate::error::AppError;
use crate::services::summary::DatasetSummary;

/// Optional chart the user is looking at; narrows the prompt to two columns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartContext {
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub chart_type: Option<String>,
}

impl ChartContext {
    fn chart_type(&self) -> &str {
        self.chart_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("graph")
    }

    /// Both axes, when the user picked them.
    fn axes(&self) -> Option<(&str, &str)> {
        fn pick(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        Some((pick(&self.x_axis)?, pick(&self.y_axis)?))
    }
}

/// Anything that can turn a prompt into prose.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

/// Builds the analyst prompt for a dataset summary.
pub fn build_prompt(summary: &DatasetSummary, chart: &ChartContext) -> Result<String, AppError> {
    let chart_type = chart.chart_type();
    let (focus, extra_context) = match chart.axes() {
        Some((x, y)) => (
            format!(
                "A detailed description of the relationship between \"{}\" and \"{}\" in the context of a {}",
                x, y, chart_type
            ),
            format!(
                "\nThe user is currently looking at a {chart_type} with \"{x}\" on the X-axis and \"{y}\" on the Y-axis. \
                 Please specifically describe the relationship and trends between these two columns as they would appear in a {chart_type}."
            ),
        ),
        None => ("3–6 key trends or patterns".to_string(), String::new()),
    };

    let summary_json = serde_json::to_string_pretty(summary)?;

    let prompt = format!(
        r#"
You are a senior data analyst.
Analyze the following dataset summary and produce:
1) {focus}
2) any anomalies/outliers
3) 2–4 suggested chart types (and which columns to use)
{extra_context}
Be concise, bullet-pointed, and avoid jargon. If data looks insufficient, say so.

Dataset summary (JSON):
{summary_json}"#
    );

    Ok(prompt.trim().to_string())
}

/// Talks to an OpenAI-compatible chat completion endpoint (Groq by default).
pub struct ChatInsightProvider {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl ChatInsightProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, AppError> {
        let api_key = config.api_key.as_deref()
            .ok_or_else(|| AppError::Config("GROQ_API_KEY is not set".to_string()))?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.api_base);

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl InsightProvider for ChatInsightProvider {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let messages = vec![
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                    name: None,
                    role: Role::User,
                }
            ),
        ];

        let request = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            ..Default::default()
        };

        let start = std::time::Instant::now();
        tracing::info!("Requesting insights from {}", self.model);
        let response = self.client
            .chat()
            .create(request)
            .await
            .map_err(|e| {
                tracing::error!("Chat completion failed: {}", e);
                AppError::LlmError(e.to_string())
            })?;
        tracing::info!("Insights received in {:?}", start.elapsed());

        let content = response.choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}
