use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, Provider};
use crate::config::AnalyzerConfig;
use crate::meal_analysis::JournalError;

#[derive(Debug, thiserror::Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("Model returned no structured nutrition data: {0}")]
    NoStructuredOutput(String),
    #[error("Model returned an unusable meal analysis: {0}")]
    InvalidAnalysis(#[from] JournalError),
    #[error("Failed to read image '{}': {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Provider {
    pub fn open_ai_compatible(api_key_env_var_name: &str, base_url: &str) -> Self {
        dotenv().ok();
        Self::OpenAiCompatible {
            api_key: api_key_env_var_name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::open_ai_compatible(&config.api_key_env_var, &config.base_url)
    }

    pub fn completions_url(&self) -> String {
        match self {
            Provider::OpenAiCompatible { base_url, .. } => {
                format!("{}/chat/completions", base_url)
            }
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenAiCompatible {
                api_key: api_key_env_var_name,
                ..
            } => {
                dotenv().ok();
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let url = self.completions_url();
                debug!(url = %url, model = %request.model, "Sending chat completion request");

                let response = Client::new()
                    .post(&url)
                    .bearer_auth(actual_api_key)
                    .header("Content-Type", "application/json")
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    debug!(
                        id = %chat_response.id,
                        choices = chat_response.choices.len(),
                        "Received chat completion"
                    );
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    warn!(%status, "Chat completion request rejected");
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}
