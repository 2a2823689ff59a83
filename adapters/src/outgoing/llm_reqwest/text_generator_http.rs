use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use credit_ledger_application::{
    error::{AppError, AppResult},
    infrastructure_config::GenerationConfig,
    ports::outgoing::text_generator::TextGeneratorPort,
};
use domain::metering::MeteredOperation;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn instructions(operation: MeteredOperation) -> &'static str {
    match operation {
        MeteredOperation::BlogOutline => {
            "Write a structured blog post outline with headings and short bullet points."
        }
        MeteredOperation::BlogPost => {
            "Write a complete, well-structured blog post in Markdown."
        }
        MeteredOperation::SocialGenerate => {
            "Write an engaging social media post. Keep it concise and include relevant hashtags."
        }
        MeteredOperation::SocialOptimize => {
            "Rewrite the given social media post to improve clarity and engagement. Return only the rewritten post."
        }
        MeteredOperation::EmailGenerate => {
            "Write a clear, friendly email with a subject line followed by the body."
        }
    }
}

fn generation_failed(message: String) -> AppError {
    AppError::GenerationFailed { message }
}

/// Text generation against an OpenAI-compatible chat completions endpoint.
pub struct HttpTextGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
    max_tokens: u32,
}

impl HttpTextGenerator {
    pub fn new(config: &GenerationConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError {
                message: format!("Failed to create generation HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait::async_trait]
impl TextGeneratorPort for HttpTextGenerator {
    #[instrument(skip(self, prompt), fields(operation = %operation))]
    async fn generate(&self, operation: MeteredOperation, prompt: &str) -> AppResult<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instructions(operation),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| generation_failed(format!("Generator request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(generation_failed(format!("Generator responded with {}", status)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| generation_failed(format!("Unreadable generator response: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| generation_failed("Generator returned no content".to_string()))?;

        debug!("Generated {} characters", text.len());
        Ok(text)
    }
}
