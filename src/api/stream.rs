//! Streaming protocol driver: one logical chat exchange over a chunked
//! event stream, including the nested tool round trip.
//!
//! An exchange demultiplexes the stream into two text channels (answer and
//! reasoning) and an accumulating tool-call descriptor. When a tool call
//! completes, the primary stream is drained, the described HTTP call runs,
//! and a second stream feeds the same two channels so both legs read as one
//! logical response.

use reqwest::blocking::{Client, Response};
use serde_json::Value as JsonValue;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

use super::{
    ChatRequest, FunctionCallPayload, FunctionSpec, MIN_CREDENTIAL_LEN, ToolCallPayload,
    ToolDeclaration, WireMessage, convert_messages, functions, is_reasoner_model, resolve_model,
};
use crate::store::{ChatSettings, Message};

/// Cooperative cancellation signal shared with the UI thread. Cancelling
/// makes the driver fail fast at its next read step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("API credential is missing or too short; set it in the configuration")]
    InvalidCredential,
    #[error("invalid chat settings: {0}")]
    InvalidSettings(String),
    #[error("chat request failed ({status}): {body}")]
    UpstreamHttp { status: u16, body: String },
    #[error("exchange cancelled")]
    StreamAborted,
    #[error("no function named '{name}' is configured")]
    ToolNotFound { name: String },
    #[error(transparent)]
    Tool(#[from] functions::FunctionError),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("stream read error: {0}")]
    Read(#[from] std::io::Error),
}

/// Both text channels accumulated across all legs of one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    pub content: String,
    pub reasoning_content: String,
}

/// Transient state of one exchange; discarded on completion, cancellation,
/// or error.
#[derive(Debug, Default)]
struct ExchangeState {
    answer: String,
    reasoning: String,
    pending_tool_call: PendingToolCall,
}

/// A tool call being reassembled from fragments. The id and name each
/// arrive once; the arguments arrive as a fragmented JSON string that is
/// concatenated in arrival order.
#[derive(Debug, Default)]
struct PendingToolCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// A fully assembled tool call ready to dispatch
#[derive(Debug, Clone, PartialEq)]
struct CompletedToolCall {
    id: String,
    name: String,
    arguments: JsonValue,
}

impl PendingToolCall {
    fn absorb(&mut self, delta: &JsonValue) {
        if self.id.is_none() {
            if let Some(id) = delta.get("id").and_then(JsonValue::as_str) {
                if !id.is_empty() {
                    self.id = Some(id.to_string());
                }
            }
        }
        if self.name.is_none() {
            if let Some(name) = delta.pointer("/function/name").and_then(JsonValue::as_str) {
                if !name.is_empty() {
                    self.name = Some(name.to_string());
                }
            }
        }
        if let Some(fragment) = delta.pointer("/function/arguments").and_then(JsonValue::as_str) {
            self.arguments.push_str(fragment);
        }
    }

    /// Complete once the id and name are resolved and the accumulated
    /// arguments parse as JSON
    fn completed(&self) -> Option<CompletedToolCall> {
        let id = self.id.clone()?;
        let name = self.name.clone()?;
        let arguments = serde_json::from_str(&self.arguments).ok()?;
        Some(CompletedToolCall { id, name, arguments })
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One line of the event stream, classified
#[derive(Debug, PartialEq, Eq)]
enum StreamLine<'a> {
    Skip,
    Done,
    Frame(&'a str),
}

fn classify_line(line: &str) -> StreamLine<'_> {
    if line.trim().is_empty() || line.starts_with(':') {
        return StreamLine::Skip;
    }
    let Some(data) = line.strip_prefix("data: ") else {
        return StreamLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        StreamLine::Done
    } else {
        StreamLine::Frame(data)
    }
}

impl ExchangeState {
    /// Applies one parsed frame to the channels. Deltas are appended
    /// verbatim, byte for byte. Returns the tool call if this frame
    /// finished assembling one.
    fn apply_frame(
        &mut self,
        frame: &JsonValue,
        allow_tool_calls: bool,
        on_answer: &mut dyn FnMut(&str),
        on_reasoning: &mut dyn FnMut(&str),
    ) -> Option<CompletedToolCall> {
        let Some(delta) = frame.pointer("/choices/0/delta") else {
            return None;
        };
        if let Some(content) = delta.get("content").and_then(JsonValue::as_str) {
            if !content.is_empty() {
                self.answer.push_str(content);
                on_answer(content);
            }
        }
        if let Some(content) = delta.get("reasoning_content").and_then(JsonValue::as_str) {
            if !content.is_empty() {
                self.reasoning.push_str(content);
                on_reasoning(content);
            }
        }
        if let Some(tool_delta) = delta.pointer("/tool_calls/0") {
            if allow_tool_calls {
                self.pending_tool_call.absorb(tool_delta);
                return self.pending_tool_call.completed();
            }
            // Upstream anomaly: a tool frame from a model that was never
            // offered tools. Treated like any other malformed event.
            log::warn!("ignoring tool-call frame from a model without tool support");
        }
        None
    }
}

fn validate_settings(settings: &ChatSettings) -> Result<(), ExchangeError> {
    if !(0.0..=2.0).contains(&settings.temperature) {
        return Err(ExchangeError::InvalidSettings(format!(
            "temperature {} is outside [0, 2]",
            settings.temperature
        )));
    }
    Ok(())
}

/// Tool declarations derived from the window's functions. The reasoning
/// model does not support tool calls, so it is never offered any.
fn tool_declarations(settings: &ChatSettings) -> Option<Vec<ToolDeclaration>> {
    if is_reasoner_model(&settings.model) || settings.functions.is_empty() {
        return None;
    }
    Some(
        settings
            .functions
            .iter()
            .map(|def| ToolDeclaration {
                tool_type: "function".to_string(),
                function: FunctionSpec {
                    name: def.name.clone(),
                    description: def.description.clone(),
                    parameters: def.parameters.clone(),
                },
            })
            .collect(),
    )
}

/// Runs one full exchange against the chat-completion endpoint.
///
/// The history must already end with the user's new message; only roles and
/// contents go over the wire. Frame-level failures are logged and skipped;
/// tool-step failures degrade to the answer streamed so far; cancellation
/// surfaces as [`ExchangeError::StreamAborted`].
pub fn run_exchange(
    base_url: &str,
    credential: &str,
    settings: &ChatSettings,
    history: &[Message],
    mut on_answer: impl FnMut(&str),
    mut on_reasoning: impl FnMut(&str),
    cancel: &CancelToken,
) -> Result<ExchangeOutcome, ExchangeError> {
    validate_settings(settings)?;
    if credential.len() < MIN_CREDENTIAL_LEN {
        return Err(ExchangeError::InvalidCredential);
    }

    let model = resolve_model(&settings.model).to_string();
    let tools = tool_declarations(settings);
    let allow_tools = tools.is_some();

    let mut outgoing = Vec::new();
    if !settings.system_prompt.trim().is_empty() {
        outgoing.push(WireMessage::system(settings.system_prompt.clone()));
    }
    outgoing.extend(convert_messages(history));

    // Only the connect phase is bounded; the stream itself runs until the
    // server closes it or the token cancels the exchange.
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let request = ChatRequest {
        model: model.clone(),
        messages: outgoing.clone(),
        temperature: settings.temperature,
        tools,
        stream: true,
    };

    let response = open_stream(&client, base_url, credential, &request)?;
    let mut state = ExchangeState::default();
    let tool_call = read_stream(
        response,
        &mut state,
        allow_tools,
        &mut on_answer,
        &mut on_reasoning,
        cancel,
    )?;

    if let Some(call) = tool_call {
        let leg = tool_leg(
            &client,
            base_url,
            credential,
            settings,
            &outgoing,
            &model,
            call,
            &mut state,
            &mut on_answer,
            &mut on_reasoning,
            cancel,
        );
        match leg {
            Ok(()) => {}
            Err(ExchangeError::StreamAborted) => return Err(ExchangeError::StreamAborted),
            // The streamed answer so far stays valid; the tool step is
            // abandoned rather than failing the exchange.
            Err(error) => log::warn!("tool step failed, keeping streamed answer: {error}"),
        }
    }

    Ok(ExchangeOutcome {
        content: state.answer,
        reasoning_content: state.reasoning,
    })
}

fn open_stream(
    client: &Client,
    base_url: &str,
    credential: &str,
    request: &ChatRequest,
) -> Result<Response, ExchangeError> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let response = client
        .post(url)
        .bearer_auth(credential)
        .header("Accept", "text/event-stream")
        .json(request)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        if status.as_u16() == 401 || functions::looks_like_auth_failure(&body) {
            return Err(ExchangeError::InvalidCredential);
        }
        return Err(ExchangeError::UpstreamHttp {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Reads frames until the stream ends or `[DONE]`. Returns the tool call if
/// one completed during this leg; further tool frames after that are
/// ignored (one tool call per exchange).
fn read_stream(
    response: Response,
    state: &mut ExchangeState,
    allow_tool_calls: bool,
    on_answer: &mut dyn FnMut(&str),
    on_reasoning: &mut dyn FnMut(&str),
    cancel: &CancelToken,
) -> Result<Option<CompletedToolCall>, ExchangeError> {
    let mut completed = None;
    let reader = BufReader::new(response);
    for line in reader.lines() {
        if cancel.is_cancelled() {
            return Err(ExchangeError::StreamAborted);
        }
        let line = line?;
        match classify_line(&line) {
            StreamLine::Skip => {}
            StreamLine::Done => break,
            StreamLine::Frame(data) => match serde_json::from_str::<JsonValue>(data) {
                Ok(frame) => {
                    let allow = allow_tool_calls && completed.is_none();
                    if let Some(call) = state.apply_frame(&frame, allow, on_answer, on_reasoning)
                    {
                        completed = Some(call);
                        state.pending_tool_call.reset();
                    }
                }
                Err(error) => log::warn!("skipping malformed stream event: {error}"),
            },
        }
    }
    Ok(completed)
}

/// The nested round trip: resolve and invoke the function, then stream the
/// follow-up completion into the same channels. The second request carries
/// no tool declarations.
#[allow(clippy::too_many_arguments)]
fn tool_leg(
    client: &Client,
    base_url: &str,
    credential: &str,
    settings: &ChatSettings,
    outgoing: &[WireMessage],
    model: &str,
    call: CompletedToolCall,
    state: &mut ExchangeState,
    on_answer: &mut dyn FnMut(&str),
    on_reasoning: &mut dyn FnMut(&str),
    cancel: &CancelToken,
) -> Result<(), ExchangeError> {
    let def = settings
        .functions
        .iter()
        .find(|def| def.name == call.name)
        .ok_or_else(|| ExchangeError::ToolNotFound {
            name: call.name.clone(),
        })?;

    let result = functions::invoke(def, &call.arguments)?;
    let shaped = functions::shape_body(&call.arguments, &def.parameters);

    let mut messages = outgoing.to_vec();
    messages.push(WireMessage::assistant_with_tool_call(
        state.answer.clone(),
        ToolCallPayload {
            id: call.id.clone(),
            call_type: "function".to_string(),
            function: FunctionCallPayload {
                name: call.name.clone(),
                arguments: serde_json::to_string_pretty(&shaped).unwrap_or_default(),
            },
        },
    ));
    messages.push(WireMessage::tool_result(
        call.id,
        serde_json::to_string_pretty(&result).unwrap_or_default(),
    ));

    let request = ChatRequest {
        model: model.to_string(),
        messages,
        temperature: settings.temperature,
        tools: None,
        stream: true,
    };
    let response = open_stream(client, base_url, credential, &request)?;
    read_stream(response, state, false, on_answer, on_reasoning, cancel)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(
        state: &mut ExchangeState,
        frame: JsonValue,
        allow_tools: bool,
        answers: &mut Vec<String>,
        reasonings: &mut Vec<String>,
    ) -> Option<CompletedToolCall> {
        state.apply_frame(
            &frame,
            allow_tools,
            &mut |delta| answers.push(delta.to_string()),
            &mut |delta| reasonings.push(delta.to_string()),
        )
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line(""), StreamLine::Skip);
        assert_eq!(classify_line("   "), StreamLine::Skip);
        assert_eq!(classify_line(": keep-alive"), StreamLine::Skip);
        assert_eq!(classify_line("event: ping"), StreamLine::Skip);
        assert_eq!(classify_line("data: [DONE]"), StreamLine::Done);
        assert_eq!(classify_line("data: {\"a\":1}"), StreamLine::Frame("{\"a\":1}"));
    }

    #[test]
    fn test_content_deltas_concatenate_verbatim() {
        let mut state = ExchangeState::default();
        let mut answers = Vec::new();
        let mut reasonings = Vec::new();

        for chunk in ["Hel", "lo"] {
            apply(
                &mut state,
                json!({"choices": [{"delta": {"content": chunk}}]}),
                true,
                &mut answers,
                &mut reasonings,
            );
        }

        assert_eq!(state.answer, "Hello");
        assert_eq!(answers.concat(), state.answer);
        assert!(state.reasoning.is_empty());
    }

    #[test]
    fn test_whitespace_in_deltas_is_preserved() {
        let mut state = ExchangeState::default();
        let mut answers = Vec::new();
        let mut reasonings = Vec::new();

        for chunk in ["  two", " spaces \n", "\tkept"] {
            apply(
                &mut state,
                json!({"choices": [{"delta": {"content": chunk}}]}),
                true,
                &mut answers,
                &mut reasonings,
            );
        }

        assert_eq!(state.answer, "  two spaces \n\tkept");
    }

    #[test]
    fn test_reasoning_channel_is_independent() {
        let mut state = ExchangeState::default();
        let mut answers = Vec::new();
        let mut reasonings = Vec::new();

        apply(
            &mut state,
            json!({"choices": [{"delta": {"reasoning_content": "thinking"}}]}),
            true,
            &mut answers,
            &mut reasonings,
        );
        apply(
            &mut state,
            json!({"choices": [{"delta": {"content": "answer", "reasoning_content": " more"}}]}),
            true,
            &mut answers,
            &mut reasonings,
        );

        assert_eq!(state.answer, "answer");
        assert_eq!(state.reasoning, "thinking more");
        assert_eq!(reasonings.concat(), state.reasoning);
    }

    #[test]
    fn test_tool_call_assembles_from_fragments() {
        let mut state = ExchangeState::default();
        let mut answers = Vec::new();
        let mut reasonings = Vec::new();

        let frames = [
            json!({"choices": [{"delta": {"tool_calls": [{"id": "call_1", "function": {"name": "get_weather"}}]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [{"function": {"arguments": "{\"loca"}}]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [{"function": {"arguments": "tion\":\"Prague\"}"}}]}}]}),
        ];

        let mut completed = None;
        for frame in frames {
            completed = apply(&mut state, frame, true, &mut answers, &mut reasonings);
        }

        let call = completed.expect("tool call should complete on the final fragment");
        assert_eq!(call.id, "call_1");
        assert_eq!(call.name, "get_weather");
        assert_eq!(call.arguments, json!({"location": "Prague"}));
    }

    #[test]
    fn test_tool_call_incomplete_until_arguments_parse() {
        let mut state = ExchangeState::default();
        let mut answers = Vec::new();
        let mut reasonings = Vec::new();

        let completed = apply(
            &mut state,
            json!({"choices": [{"delta": {"tool_calls": [{"id": "call_1", "function": {"name": "f", "arguments": "{\"q\":"}}]}}]}),
            true,
            &mut answers,
            &mut reasonings,
        );
        assert!(completed.is_none());
    }

    #[test]
    fn test_tool_call_id_and_name_are_set_once() {
        let mut pending = PendingToolCall::default();
        pending.absorb(&json!({"id": "call_1", "function": {"name": "first"}}));
        pending.absorb(&json!({"id": "call_2", "function": {"name": "second", "arguments": "{}"}}));

        let call = pending.completed().expect("complete");
        assert_eq!(call.id, "call_1");
        assert_eq!(call.name, "first");
    }

    #[test]
    fn test_tool_frames_ignored_without_tool_support() {
        let mut state = ExchangeState::default();
        let mut answers = Vec::new();
        let mut reasonings = Vec::new();

        let completed = apply(
            &mut state,
            json!({"choices": [{"delta": {"tool_calls": [{"id": "call_1", "function": {"name": "f", "arguments": "{}"}}]}}]}),
            false,
            &mut answers,
            &mut reasonings,
        );

        assert!(completed.is_none());
        assert!(state.pending_tool_call.id.is_none());
    }

    #[test]
    fn test_frames_without_delta_are_inert() {
        let mut state = ExchangeState::default();
        let mut answers = Vec::new();
        let mut reasonings = Vec::new();

        apply(&mut state, json!({"model": "deepseek-chat"}), true, &mut answers, &mut reasonings);
        apply(&mut state, json!({"choices": []}), true, &mut answers, &mut reasonings);

        assert!(state.answer.is_empty());
        assert!(answers.is_empty());
    }

    #[test]
    fn test_temperature_out_of_range_is_rejected() {
        let mut settings = ChatSettings::default();
        settings.temperature = 2.5;
        assert!(matches!(
            validate_settings(&settings),
            Err(ExchangeError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_empty_credential_fails_before_any_network_call() {
        let settings = ChatSettings::default();
        let result = run_exchange(
            "http://127.0.0.1:1",
            "",
            &settings,
            &[Message::user("hi", 1)],
            |_| {},
            |_| {},
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(ExchangeError::InvalidCredential)));
    }

    #[test]
    fn test_short_credential_rejected() {
        let settings = ChatSettings::default();
        let result = run_exchange(
            "http://127.0.0.1:1",
            "sk-short",
            &settings,
            &[],
            |_| {},
            |_| {},
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(ExchangeError::InvalidCredential)));
    }

    #[test]
    fn test_unknown_tool_name_reports_tool_not_found() {
        // Resolution happens before any network use, so the answer streamed
        // so far survives and run_exchange only logs the failure.
        let client = Client::builder().build().unwrap();
        let settings = ChatSettings::default();
        let mut state = ExchangeState::default();
        state.answer.push_str("partial answer");

        let call = CompletedToolCall {
            id: "call_1".to_string(),
            name: "missing_function".to_string(),
            arguments: json!({}),
        };
        let result = tool_leg(
            &client,
            "http://127.0.0.1:1",
            "sk-0000000000000000000000000000",
            &settings,
            &[],
            "deepseek-chat",
            call,
            &mut state,
            &mut |_| {},
            &mut |_| {},
            &CancelToken::new(),
        );

        assert!(matches!(
            result,
            Err(ExchangeError::ToolNotFound { name }) if name == "missing_function"
        ));
        assert_eq!(state.answer, "partial answer");
    }

    #[test]
    fn test_reasoner_model_is_never_offered_tools() {
        let mut settings = ChatSettings::default();
        settings.functions.push(crate::store::FunctionDefinition {
            id: "f".to_string(),
            name: "f".to_string(),
            description: String::new(),
            parameters: json!({"type": "object"}),
            url: "https://example.com".to_string(),
            method: crate::store::HttpMethod::Get,
            headers: Default::default(),
        });

        settings.model = "reasoner".to_string();
        assert!(tool_declarations(&settings).is_none());

        settings.model = "chat".to_string();
        let declared = tool_declarations(&settings).expect("chat model gets tools");
        assert_eq!(declared.len(), 1);
        assert_eq!(declared[0].function.name, "f");
    }
}
