use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::prompt::build_prompt;
use super::{failure_payload, parse_completion, ExtractionError, SubmissionExtractor};
use crate::config::ExtractionConfig;
use crate::workflows::underwriting::schema::Schema;

const SYSTEM_PROMPT: &str =
    "You extract commercial property risk data from submissions and answer only with JSON.";
const TEMPERATURE: f32 = 0.0;
const MAX_TOKENS: u32 = 1000;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    client: Client,
    config: ExtractionConfig,
}

impl OpenAiExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn request_fields(&self, text: &str, schema: &Schema) -> Result<Value, ExtractionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ExtractionError::MissingApiKey)?;

        let prompt = build_prompt(text, schema);
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.config.model, prompt_chars = prompt.len(), "requesting extraction");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ExtractionError::EmptyCompletion)?;

        parse_completion(&content).map(Value::Object)
    }
}

impl SubmissionExtractor for OpenAiExtractor {
    async fn extract(&self, text: &str, schema: &Schema) -> Value {
        match self.request_fields(text, schema).await {
            Ok(fields) => {
                let mapped = fields.as_object().map(|fields| fields.len()).unwrap_or(0);
                info!(model = %self.config.model, fields = mapped, "submission text extracted");
                fields
            }
            Err(error) => {
                warn!(model = %self.config.model, %error, "submission text extraction failed");
                failure_payload(&error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::underwriting::extraction::failure_message;

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let extractor = OpenAiExtractor::new(ExtractionConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..ExtractionConfig::default()
        })
        .expect("client builds");

        assert_eq!(
            extractor.endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn missing_key_yields_error_payload_without_network() {
        let extractor = OpenAiExtractor::new(ExtractionConfig::default()).expect("client builds");

        let payload = extractor
            .extract("Warehouse in Zone AE", &Schema::default())
            .await;

        let message = failure_message(&payload).expect("error payload");
        assert!(message.starts_with("LLM extraction failed:"));
        assert!(message.contains("OPENAI_API_KEY"));
    }
}
