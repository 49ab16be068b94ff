//! Wire types and helpers shared by the chat-completion driver and the
//! function invocation client.

pub mod balance;
pub mod functions;
pub mod stream;

use color_eyre::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::store::{Message, MessageRole};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

/// The shortest credential the hosted API could plausibly accept.
/// Anything below this fails before a network call is made.
pub const MIN_CREDENTIAL_LEN: usize = 30;

const CHAT_MODEL: &str = "deepseek-chat";
const CODER_MODEL: &str = "deepseek-coder";
const REASONER_MODEL: &str = "deepseek-reasoner";

/// Maps a settings-level model selector to the wire model name.
/// Unknown selectors fall back to the chat model rather than failing --
/// lenient on model, strict on credential.
#[must_use]
pub fn resolve_model(selector: &str) -> &'static str {
    match selector.trim().to_ascii_lowercase().as_str() {
        "chat" | "deepseek-chat" => CHAT_MODEL,
        "coder" | "deepseek-coder" => CODER_MODEL,
        "reasoner" | "deepseek-reasoner" => REASONER_MODEL,
        _ => CHAT_MODEL,
    }
}

/// Returns true if the selector resolves to the reasoning model.
/// The reasoning model does not accept tool declarations.
#[must_use]
pub fn is_reasoner_model(selector: &str) -> bool {
    resolve_model(selector) == REASONER_MODEL
}

// -- Tool calling types --

/// A tool declaration sent in the request to enable native function calling
#[derive(Debug, Clone, Serialize)]
pub struct ToolDeclaration {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionSpec,
}

/// The function schema within a tool declaration
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: JsonValue,
}

/// A completed tool call echoed back to the API in the second request leg
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCallPayload,
}

/// The function name and JSON-encoded arguments within a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallPayload {
    pub name: String,
    pub arguments: String,
}

// -- Request types --

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDeclaration>>,
    pub stream: bool,
}

/// A message as it goes over the wire. Local-only fields (timestamps,
/// reasoning content) are never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn assistant_with_tool_call(content: impl Into<String>, call: ToolCallPayload) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            tool_calls: Some(vec![call]),
            tool_call_id: None,
        }
    }

    /// A tool-result message answering a specific tool call
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Converts stored messages to wire messages, keeping only role and content
#[must_use]
pub fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::Tool => "tool",
            };
            WireMessage::plain(role, msg.content.clone())
        })
        .collect()
}

/// Builds a `reqwest::blocking::Client` for bounded (non-streaming) requests
pub fn build_client() -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(60))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_known() {
        assert_eq!(resolve_model("chat"), "deepseek-chat");
        assert_eq!(resolve_model("coder"), "deepseek-coder");
        assert_eq!(resolve_model("reasoner"), "deepseek-reasoner");
    }

    #[test]
    fn test_resolve_model_falls_back() {
        assert_eq!(resolve_model("invalid_value"), "deepseek-chat");
        assert_eq!(resolve_model(""), "deepseek-chat");
        assert_eq!(resolve_model("  Reasoner "), "deepseek-reasoner");
    }

    #[test]
    fn test_is_reasoner_model() {
        assert!(is_reasoner_model("reasoner"));
        assert!(!is_reasoner_model("chat"));
        assert!(!is_reasoner_model("garbage"));
    }

    #[test]
    fn test_wire_message_skips_local_fields() {
        let wire = convert_messages(&[Message::user("hello", 1)]);
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json[0]["role"], "user");
        assert_eq!(json[0]["content"], "hello");
        assert!(json[0].get("timestamp").is_none());
        assert!(json[0].get("reasoning_content").is_none());
        assert!(json[0].get("tool_calls").is_none());
    }
}
