use std::time::Duration;

use reqwest::Client;

use super::parse::{extract_responses_text, parse_augmented, sanitize_for_sheet};
use super::types::{
    AugmentedAnswer, ChatMessage, ChatRequest, ChatResponse, ResponsesRequest, ResponsesResponse,
    Tool, web_answer_format,
};
use crate::error::{RemoteError, RetryError};
use crate::retry::{self, RetryPolicy};
use crate::urls;

const API_URL: &str = "https://api.openai.com";
const CHAT_TEMPERATURE: f32 = 0.2;

/// Instruction block appended to the prompt for the augmented call.
const SOURCES_INSTRUCTION: &str = "Return JSON with keys \"answer\" and \"sources\".\n\
    \"sources\" must be 3 to 5 items actually used. Each item is { \"url\": \"...\", \"title\": \"...\" }.";

pub struct OpenAiClient {
    api_key: String,
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, API_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy: RetryPolicy::default(),
        }
    }

    /// Single-shot generation: the prompt at low temperature, plain text back.
    /// Sanitized for sheet use. Retried on transient failures.
    pub async fn chat(&self, model: &str, prompt: &str) -> Result<String, RetryError> {
        let req = ChatRequest {
            model: model.to_string(),
            temperature: CHAT_TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: "Answer concisely. Plain text only.".into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt.to_string(),
                },
            ],
        };
        let req = &req;
        let text = retry::run(&self.policy, move || self.chat_once(req)).await?;
        Ok(sanitize_for_sheet(&text))
    }

    /// Web-search-augmented generation: asks for an `{answer, sources}`
    /// object under a strict schema, recovers and interprets the text,
    /// and returns sanitized text plus normalized source URLs.
    pub async fn augmented(&self, model: &str, prompt: &str) -> Result<AugmentedAnswer, RetryError> {
        let req = ResponsesRequest {
            model: model.to_string(),
            input: format!("{prompt}\n\n{SOURCES_INSTRUCTION}"),
            temperature: CHAT_TEMPERATURE,
            tools: vec![Tool {
                tool_type: "web_search".into(),
            }],
            tool_choice: "auto".into(),
            text: web_answer_format(),
        };
        let req = &req;
        let raw = retry::run(&self.policy, move || self.augmented_once(req)).await?;

        let parsed = parse_augmented(&raw);
        Ok(AugmentedAnswer {
            text: sanitize_for_sheet(&parsed.answer),
            sources: urls::dedupe_and_normalize(parsed.raw_sources),
        })
    }

    async fn chat_once(&self, req: &ChatRequest) -> Result<String, RemoteError> {
        let resp: ChatResponse = self
            .post_json("/v1/chat/completions", req)
            .await?;
        Ok(resp.first_text().unwrap_or_default().to_string())
    }

    async fn augmented_once(&self, req: &ResponsesRequest) -> Result<String, RemoteError> {
        let resp: ResponsesResponse = self.post_json("/v1/responses", req).await?;
        Ok(extract_responses_text(&resp))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, RemoteError>
    where
        B: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}
