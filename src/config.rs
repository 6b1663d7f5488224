use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::services::summary::SummaryConfig;

fn default_max_upload_bytes() -> usize {
    // 8 MB in bytes
    8 * 1024 * 1024
}

pub const DEFAULT_LLM_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_LLM_API_BASE.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_LLM_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub llm: LlmConfig,
    pub summary: SummaryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_upload_bytes: default_max_upload_bytes(),
            llm: LlmConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for unset keys. Set but malformed values are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let summary = SummaryConfig {
            sample_size: parse_or(&get, "SUMMARY_SAMPLE_SIZE", defaults.summary.sample_size)?,
            type_sample_size: parse_or(
                &get,
                "SUMMARY_TYPE_SAMPLE_SIZE",
                defaults.summary.type_sample_size,
            )?,
            numeric_threshold: parse_or(
                &get,
                "SUMMARY_NUMERIC_THRESHOLD",
                defaults.summary.numeric_threshold,
            )?,
            top_k: parse_or(&get, "SUMMARY_TOP_K", defaults.summary.top_k)?,
        };

        if summary.sample_size == 0 || summary.type_sample_size == 0 {
            anyhow::bail!("SUMMARY_SAMPLE_SIZE and SUMMARY_TYPE_SAMPLE_SIZE must be positive");
        }
        if !(0.0..=1.0).contains(&summary.numeric_threshold) {
            anyhow::bail!(
                "SUMMARY_NUMERIC_THRESHOLD must be within 0..=1, got {}",
                summary.numeric_threshold
            );
        }

        let llm = LlmConfig {
            api_key: get("GROQ_API_KEY"),
            api_base: get("LLM_API_BASE").unwrap_or(defaults.llm.api_base),
            model: get("LLM_MODEL").unwrap_or(defaults.llm.model),
            temperature: parse_or(&get, "LLM_TEMPERATURE", defaults.llm.temperature)?,
        };

        Ok(Config {
            bind_addr: parse_or(&get, "BIND_ADDR", defaults.bind_addr)?,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            llm,
            summary,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        None => Ok(default),
    }
}

pub fn load_config() -> Result<Config> {
    Config::from_env()
}
