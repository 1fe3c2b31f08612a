//! Wire types for the two OpenAI call shapes.
//!
//! `ChatRequest`/`ChatResponse` cover `/v1/chat/completions`;
//! `ResponsesRequest`/`ResponsesResponse` cover `/v1/responses` with the
//! web-search tool and a strict JSON schema for the sources contract.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Request body for `/v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

/// A single chat message ("system", "user" or "assistant").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatResponse {
    /// Content of the first choice, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// Request body for `/v1/responses`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: String,
    pub temperature: f32,
    pub tools: Vec<Tool>,
    pub tool_choice: String,
    pub text: TextFormatWrapper,
}

/// A tool enabled on the remote side, e.g. `{"type": "web_search"}`.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextFormatWrapper {
    pub format: TextFormat,
}

/// Output format constraint. `name` is required at this level.
#[derive(Debug, Clone, Serialize)]
pub struct TextFormat {
    pub name: String,
    #[serde(rename = "type")]
    pub format_type: String,
    pub json_schema: JsonSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchema {
    /// Strict mode makes the model obey the schema.
    pub strict: bool,
    pub schema: Value,
}

/// Schema constraint for the augmented answer: an `answer` string plus
/// 1..=5 `sources` of `{url, title?}`.
pub fn web_answer_format() -> TextFormatWrapper {
    TextFormatWrapper {
        format: TextFormat {
            name: "WebAnswer".to_string(),
            format_type: "json_schema".to_string(),
            json_schema: JsonSchema {
                strict: true,
                schema: json!({
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["answer", "sources"],
                    "properties": {
                        "answer": { "type": "string" },
                        "sources": {
                            "type": "array",
                            "minItems": 1,
                            "maxItems": 5,
                            "items": {
                                "type": "object",
                                "additionalProperties": false,
                                "required": ["url"],
                                "properties": {
                                    "url": { "type": "string", "format": "uri" },
                                    "title": { "type": "string" }
                                }
                            }
                        }
                    }
                }),
            },
        },
    }
}

/// Response body for `/v1/responses`. Only the fields the text-recovery
/// tiers look at; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    /// Canonical flattened output, when the service provides it.
    #[serde(default)]
    pub output_text: Option<String>,
    /// Generic output items, used to reassemble text when `output_text`
    /// is absent.
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub content: Vec<OutputContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputContent {
    #[serde(rename = "type", default)]
    pub content_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// The structured JSON object the augmented call asks the model for.
#[derive(Debug, Clone, Deserialize)]
pub struct WebAnswer {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Vec<WebSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSource {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// The augmented call's final product: sanitized answer text plus
/// normalized, deduplicated source URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedAnswer {
    pub text: String,
    pub sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_expected_fields() {
        let req = ChatRequest {
            model: "gpt-4o".into(),
            temperature: 0.2,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
        };
        let v: Value = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "gpt-4o");
        assert_eq!(v["messages"][0]["role"], "user");
    }

    #[test]
    fn chat_response_first_text() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Hi"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text(), Some("Hi"));

        let empty: ChatResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_text(), None);
    }

    #[test]
    fn tool_type_field_renames_correctly() {
        let tool = Tool {
            tool_type: "web_search".into(),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert_eq!(json, r#"{"type":"web_search"}"#);
    }

    #[test]
    fn web_answer_format_is_strict_json_schema() {
        let wrapper = web_answer_format();
        let v = serde_json::to_value(&wrapper).unwrap();
        assert_eq!(v["format"]["name"], "WebAnswer");
        assert_eq!(v["format"]["type"], "json_schema");
        assert_eq!(v["format"]["json_schema"]["strict"], true);
        assert_eq!(
            v["format"]["json_schema"]["schema"]["properties"]["sources"]["maxItems"],
            5
        );
    }

    #[test]
    fn responses_response_tolerates_missing_fields() {
        let resp: ResponsesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.output_text.is_none());
        assert!(resp.output.is_empty());
    }

    #[test]
    fn responses_response_parses_output_items() {
        let json = r#"{
            "output": [
                {"type": "message", "content": [{"type": "output_text", "text": "part"}]}
            ]
        }"#;
        let resp: ResponsesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.output[0].item_type, "message");
        assert_eq!(resp.output[0].content[0].text.as_deref(), Some("part"));
    }
}
