use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

const REQUEST_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;

const SYSTEM_PROMPT: &str = "You are the built-in assistant of a collaborative \
whiteboard app. Users draw together on a shared board with pen, eraser, \
rectangle, circle, text, and bucket-fill tools, and can save or load their \
board as a file. Answer questions about using the board or whatever else the \
user asks. Keep replies short and plain-text; the chat panel renders no \
markdown.";

/// Body of `POST /api/chat`.
#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no api key configured")]
    Unconfigured,
    #[error("failed to build http client: {0}")]
    HttpClientBuild(String),
    #[error("chat request failed: {0}")]
    ApiRequest(String),
    #[error("chat api returned status {status}: {body}")]
    ApiResponse { status: u16, body: String },
    #[error("chat api response malformed: {0}")]
    ApiParse(String),
}

/// Proxy to an OpenAI-compatible chat-completions endpoint (Groq by default).
/// Built once at startup; usable without a key, in which case every request
/// fails with `Unconfigured`.
pub struct ChatClient {
    http: reqwest::Client,
    api_key: Option<String>,
    url: String,
    model: String,
}

impl ChatClient {
    pub fn new(
        api_key: Option<String>,
        url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChatError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            url: url.unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn reply(&self, message: &str) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::Unconfigured)?;
        let body = CompletionsRequest {
            model: &self.model,
            messages: [
                WireMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                WireMessage {
                    role: "user",
                    content: message,
                },
            ],
        };
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ChatError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(ChatError::ApiResponse { status, body: text });
        }
        parse_chat_response(&text)
    }
}

#[derive(Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

fn parse_chat_response(json_text: &str) -> Result<String, ChatError> {
    let root: Value =
        serde_json::from_str(json_text).map_err(|e| ChatError::ApiParse(e.to_string()))?;
    let content = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| ChatError::ApiParse("missing choices[0].message.content".to_string()))?;
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_first_choice_content() {
        let json = serde_json::json!({
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Hello!" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 4 }
        })
        .to_string();
        assert_eq!(parse_chat_response(&json).unwrap(), "Hello!");
    }

    #[test]
    fn parse_rejects_missing_choices() {
        let json = serde_json::json!({ "model": "llama-3.3-70b-versatile", "choices": [] })
            .to_string();
        assert!(matches!(
            parse_chat_response(&json),
            Err(ChatError::ApiParse(_))
        ));
    }

    #[test]
    fn parse_rejects_null_content() {
        let json = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        })
        .to_string();
        assert!(parse_chat_response(&json).is_err());
    }

    #[test]
    fn request_body_deserializes() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"message":"how do I fill a shape?"}"#).unwrap();
        assert_eq!(request.message, "how do I fill a shape?");
    }

    #[test]
    fn reply_body_wire_form() {
        let value = serde_json::to_value(ChatReply {
            reply: "Click it with the bucket tool.".into(),
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "reply": "Click it with the bucket tool." })
        );
    }

    #[tokio::test]
    async fn reply_without_key_is_unconfigured() {
        let client = ChatClient::new(None, None, None).expect("chat client should build");
        assert!(!client.is_configured());
        assert!(matches!(
            client.reply("hi").await,
            Err(ChatError::Unconfigured)
        ));
    }
}
