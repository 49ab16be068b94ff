//! Conversation windows: message history, per-window settings, recency
//! ordering, and the persisted snapshot.

pub mod repair;

use chrono::{Datelike, Local};
use color_eyre::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Windows beyond this count are evicted, least recently active first
pub const MAX_WINDOWS: usize = 20;

const DEFAULT_TITLE_PREFIX: &str = "New chat";
const TITLE_SNIPPET_CHARS: usize = 24;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
}

/// A chat message. Immutable once appended, except through
/// [`ConversationStore::append_to_last_message`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Milliseconds since the epoch; serves as a render key within a window
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self::plain(MessageRole::User, content, timestamp)
    }

    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self::plain(MessageRole::Assistant, content, timestamp)
    }

    /// An assistant message carrying the secondary reasoning channel
    pub fn assistant_with_reasoning(
        content: impl Into<String>,
        reasoning: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        let reasoning = reasoning.into();
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp,
            reasoning_content: if reasoning.is_empty() {
                None
            } else {
                Some(reasoning)
            },
        }
    }

    fn plain(role: MessageRole, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
            reasoning_content: None,
        }
    }
}

/// Current time in epoch milliseconds
#[must_use]
pub fn now_ms() -> i64 {
    Local::now().timestamp_millis()
}

/// HTTP method of a function definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
}

/// A user-defined function the model may call. An immutable template:
/// argument substitution happens per invocation and never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub id: String,
    /// Dispatch key; unique within one settings value
    pub name: String,
    pub description: String,
    /// JSON-Schema-like description of the arguments
    pub parameters: JsonValue,
    /// May contain `{param}` placeholders
    pub url: String,
    pub method: HttpMethod,
    /// Header values may also contain `{param}` placeholders
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Per-window chat settings. A global default is cloned into each new window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_length: u32,
    pub system_prompt: String,
    /// Model selector ("chat", "coder", "reasoner"); resolved leniently
    pub model: String,
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            max_length: 2000,
            system_prompt: String::new(),
            model: "chat".to_string(),
            functions: Vec::new(),
        }
    }
}

/// Partial settings update, merged field-by-field into one window only
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_length: Option<u32>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub functions: Option<Vec<FunctionDefinition>>,
}

/// One independent conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationWindow {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub settings: ChatSettings,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_active_at: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an exchange is already in flight")]
    ExchangeInFlight,
    #[error("no conversation window is selected")]
    NoCurrentWindow,
    #[error("unknown window id: {0}")]
    WindowNotFound(String),
}

/// What gets persisted. Transient streaming state is not part of this type,
/// so a reload always starts neutral.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    windows: Vec<ConversationWindow>,
    current_id: Option<String>,
}

/// Holds the ordered window list and the transient state of the one
/// exchange that may be in flight.
pub struct ConversationStore {
    windows: Vec<ConversationWindow>,
    current_id: Option<String>,
    default_settings: ChatSettings,
    /// One exchange at a time, enforced here rather than by the UI
    is_sending: bool,
    streaming_answer: Option<String>,
    streaming_reasoning: Option<String>,
}

/// Window ids combine creation millis with a process-wide counter so that
/// windows created within the same millisecond cannot collide.
fn next_window_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("{}-{}", now_ms(), COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Parses the counter out of an auto-assigned title like "New chat 3.14(7)"
fn default_title_counter(title: &str) -> Option<u64> {
    let rest = title.strip_prefix(DEFAULT_TITLE_PREFIX)?;
    let open = rest.rfind('(')?;
    let close = rest.rfind(')')?;
    if close < open {
        return None;
    }
    rest.get(open + 1..close)?.parse().ok()
}

fn title_snippet(content: &str) -> String {
    content
        .trim()
        .chars()
        .take(TITLE_SNIPPET_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

impl ConversationStore {
    /// Creates an empty store with the given default settings
    #[must_use]
    pub fn new(default_settings: ChatSettings) -> Self {
        Self {
            windows: Vec::new(),
            current_id: None,
            default_settings,
            is_sending: false,
            streaming_answer: None,
            streaming_reasoning: None,
        }
    }

    #[must_use]
    pub fn windows(&self) -> &[ConversationWindow] {
        &self.windows
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    #[must_use]
    pub fn current_window(&self) -> Option<&ConversationWindow> {
        let id = self.current_id.as_deref()?;
        self.windows.iter().find(|window| window.id == id)
    }

    fn current_window_mut(&mut self) -> Result<&mut ConversationWindow, StoreError> {
        let id = self
            .current_id
            .clone()
            .ok_or(StoreError::NoCurrentWindow)?;
        self.windows
            .iter_mut()
            .find(|window| window.id == id)
            .ok_or(StoreError::NoCurrentWindow)
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    #[must_use]
    pub fn streaming_answer(&self) -> Option<&str> {
        self.streaming_answer.as_deref()
    }

    #[must_use]
    pub fn streaming_reasoning(&self) -> Option<&str> {
        self.streaming_reasoning.as_deref()
    }

    /// Creates a window at the front of the list and selects it.
    /// Evicts least-recently-active windows beyond [`MAX_WINDOWS`].
    pub fn create_window(&mut self, title: Option<String>) -> String {
        let now = now_ms();
        let title = match title {
            Some(title) if !title.trim().is_empty() => title,
            _ => self.next_default_title(),
        };
        let window = ConversationWindow {
            id: next_window_id(),
            title,
            messages: Vec::new(),
            settings: self.default_settings.clone(),
            created_at: now,
            updated_at: now,
            last_active_at: now,
        };
        let id = window.id.clone();
        self.current_id = Some(id.clone());
        self.windows.insert(0, window);
        self.evict_overflow();
        id
    }

    fn next_default_title(&self) -> String {
        let max = self
            .windows
            .iter()
            .filter_map(|window| default_title_counter(&window.title))
            .max()
            .unwrap_or(0);
        let today = Local::now();
        format!(
            "{} {}.{}({})",
            DEFAULT_TITLE_PREFIX,
            today.month(),
            today.day(),
            max + 1
        )
    }

    fn evict_overflow(&mut self) {
        while self.windows.len() > MAX_WINDOWS {
            let Some(pos) = self
                .windows
                .iter()
                .enumerate()
                .min_by_key(|(_, window)| window.last_active_at)
                .map(|(pos, _)| pos)
            else {
                return;
            };
            let removed = self.windows.remove(pos);
            if self.current_id.as_deref() == Some(removed.id.as_str()) {
                self.current_id = self.windows.first().map(|window| window.id.clone());
            }
        }
    }

    /// Removes a window unconditionally. If it was current, the first
    /// remaining window becomes current. All transient state is cleared.
    pub fn delete_window(&mut self, id: &str) -> Result<(), StoreError> {
        let pos = self
            .windows
            .iter()
            .position(|window| window.id == id)
            .ok_or_else(|| StoreError::WindowNotFound(id.to_string()))?;
        self.windows.remove(pos);
        if self.current_id.as_deref() == Some(id) {
            self.current_id = self.windows.first().map(|window| window.id.clone());
        }
        self.is_sending = false;
        self.streaming_answer = None;
        self.streaming_reasoning = None;
        Ok(())
    }

    /// Changes only the current pointer. Selecting is not using: neither
    /// list order nor any `last_active_at` moves.
    pub fn select_window(&mut self, id: &str) -> Result<(), StoreError> {
        if self.windows.iter().any(|window| window.id == id) {
            self.current_id = Some(id.to_string());
            Ok(())
        } else {
            Err(StoreError::WindowNotFound(id.to_string()))
        }
    }

    /// Sets a window's title; empty titles are ignored
    pub fn rename_window(&mut self, id: &str, title: &str) -> Result<(), StoreError> {
        let trimmed = title.trim();
        let window = self
            .windows
            .iter_mut()
            .find(|window| window.id == id)
            .ok_or_else(|| StoreError::WindowNotFound(id.to_string()))?;
        if !trimmed.is_empty() {
            window.title = trimmed.to_string();
        }
        Ok(())
    }

    /// Appends to the current window, bumps its recency, and moves it to
    /// the front of the list. Rejected while an exchange is in flight.
    pub fn append_message(&mut self, message: Message) -> Result<(), StoreError> {
        if self.is_sending {
            return Err(StoreError::ExchangeInFlight);
        }
        self.append_message_unchecked(message)
    }

    /// Append path used when an exchange finishes: the final assistant
    /// message lands after `finish_exchange` has already run, so the guard
    /// above does not apply.
    pub fn append_message_unchecked(&mut self, message: Message) -> Result<(), StoreError> {
        let id = self
            .current_id
            .clone()
            .ok_or(StoreError::NoCurrentWindow)?;
        let pos = self
            .windows
            .iter()
            .position(|window| window.id == id)
            .ok_or(StoreError::NoCurrentWindow)?;
        let mut window = self.windows.remove(pos);

        if message.role == MessageRole::User
            && default_title_counter(&window.title).is_some()
            && !window
                .messages
                .iter()
                .any(|existing| existing.role == MessageRole::User)
        {
            let snippet = title_snippet(&message.content);
            if !snippet.is_empty() {
                window.title = snippet;
            }
        }

        window.messages.push(message);
        let now = now_ms();
        window.updated_at = now;
        window.last_active_at = now;
        self.windows.insert(0, window);
        self.streaming_answer = None;
        self.streaming_reasoning = None;
        Ok(())
    }

    /// Empties the current window's message list with the same recency bump
    pub fn clear_messages(&mut self) -> Result<(), StoreError> {
        let now = now_ms();
        let window = self.current_window_mut()?;
        window.messages.clear();
        window.updated_at = now;
        window.last_active_at = now;
        self.streaming_answer = None;
        self.streaming_reasoning = None;
        Ok(())
    }

    /// Removes the last message of the current window (retry flow)
    pub fn delete_last_message(&mut self) -> Result<(), StoreError> {
        let window = self.current_window_mut()?;
        window.messages.pop();
        Ok(())
    }

    /// Non-streaming incremental append: mutates the final assistant
    /// message's content in place. No-op if the last message is not an
    /// assistant turn.
    pub fn append_to_last_message(&mut self, content: &str) -> Result<(), StoreError> {
        let window = self.current_window_mut()?;
        if let Some(last) = window.messages.last_mut() {
            if last.role == MessageRole::Assistant {
                last.content.push_str(content);
            }
        }
        Ok(())
    }

    /// Shallow-merges a patch into the current window's settings only.
    /// Other windows keep their own settings untouched.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<(), StoreError> {
        let now = now_ms();
        let window = self.current_window_mut()?;
        let settings = &mut window.settings;
        if let Some(temperature) = patch.temperature {
            settings.temperature = temperature;
        }
        if let Some(top_p) = patch.top_p {
            settings.top_p = top_p;
        }
        if let Some(top_k) = patch.top_k {
            settings.top_k = top_k;
        }
        if let Some(max_length) = patch.max_length {
            settings.max_length = max_length;
        }
        if let Some(system_prompt) = patch.system_prompt {
            settings.system_prompt = system_prompt;
        }
        if let Some(model) = patch.model {
            settings.model = model;
        }
        if let Some(functions) = patch.functions {
            settings.functions = functions;
        }
        window.updated_at = now;
        window.last_active_at = now;
        Ok(())
    }

    /// Marks the current window as streaming. At most one exchange may be
    /// in flight process-wide.
    pub fn begin_exchange(&mut self) -> Result<(), StoreError> {
        if self.is_sending {
            return Err(StoreError::ExchangeInFlight);
        }
        if self.current_window().is_none() {
            return Err(StoreError::NoCurrentWindow);
        }
        self.is_sending = true;
        Ok(())
    }

    /// Clears the sending flag. Streaming buffers are cleared by the
    /// subsequent message append.
    pub fn finish_exchange(&mut self) {
        self.is_sending = false;
    }

    /// Cancellation path: drops all partial buffers without committing them
    pub fn abort_exchange(&mut self) {
        self.is_sending = false;
        self.streaming_answer = None;
        self.streaming_reasoning = None;
    }

    pub fn push_answer_delta(&mut self, delta: &str) {
        self.streaming_answer
            .get_or_insert_with(String::new)
            .push_str(delta);
    }

    pub fn push_reasoning_delta(&mut self, delta: &str) {
        self.streaming_reasoning
            .get_or_insert_with(String::new)
            .push_str(delta);
    }

    // -- Snapshot persistence --

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            windows: self.windows.clone(),
            current_id: self.current_id.clone(),
        }
    }

    /// Load pipeline: snapshot -> alternation repair -> neutral transients
    fn from_snapshot(snapshot: Snapshot, default_settings: ChatSettings) -> Self {
        let mut windows = snapshot.windows;
        for window in &mut windows {
            window.messages = repair::repair(&window.messages);
        }
        let current_id = snapshot
            .current_id
            .filter(|id| windows.iter().any(|window| &window.id == id))
            .or_else(|| windows.first().map(|window| window.id.clone()));
        Self {
            windows,
            current_id,
            default_settings,
            is_sending: false,
            streaming_answer: None,
            streaming_reasoning: None,
        }
    }

    /// Loads the persisted snapshot, or an empty store if none exists or
    /// it cannot be read
    #[must_use]
    pub fn load(default_settings: ChatSettings) -> Self {
        match Self::try_load(default_settings.clone()) {
            Ok(Some(store)) => store,
            Ok(None) => Self::new(default_settings),
            Err(error) => {
                log::warn!("discarding unreadable conversation snapshot: {error}");
                Self::new(default_settings)
            }
        }
    }

    fn try_load(default_settings: ChatSettings) -> Result<Option<Self>> {
        let path = Self::snapshot_path()?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        Ok(Some(Self::from_snapshot(snapshot, default_settings)))
    }

    /// Saves the window list and current-window id to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::snapshot_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&self.to_snapshot())?)?;
        Ok(())
    }

    fn snapshot_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "quill")
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine data directory"))?;
        Ok(proj_dirs.data_dir().join("windows.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConversationStore {
        ConversationStore::new(ChatSettings::default())
    }

    #[test]
    fn test_create_window_selects_and_fronts() {
        let mut store = store();
        let first = store.create_window(None);
        let second = store.create_window(None);
        assert_eq!(store.current_id(), Some(second.as_str()));
        assert_eq!(store.windows()[0].id, second);
        assert_eq!(store.windows()[1].id, first);
    }

    #[test]
    fn test_window_ids_unique_within_same_millisecond() {
        let mut store = store();
        let mut ids: Vec<String> = Vec::new();
        for _ in 0..50 {
            ids.push(store.create_window(None));
        }
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_eviction_keeps_most_recently_active() {
        let mut store = store();
        for _ in 0..MAX_WINDOWS {
            store.create_window(None);
        }
        // Spread activity times so the ranking is unambiguous
        for (rank, window) in store.windows.iter_mut().enumerate() {
            window.last_active_at = 1_000 + rank as i64;
        }
        let stale_id = store
            .windows
            .iter()
            .min_by_key(|window| window.last_active_at)
            .map(|window| window.id.clone())
            .unwrap();

        store.create_window(None);

        assert_eq!(store.windows().len(), MAX_WINDOWS);
        assert!(store.windows().iter().all(|window| window.id != stale_id));
    }

    #[test]
    fn test_select_window_changes_only_the_pointer() {
        let mut store = store();
        let first = store.create_window(None);
        let _second = store.create_window(None);
        let order: Vec<String> = store.windows().iter().map(|w| w.id.clone()).collect();
        let activity: Vec<i64> = store.windows().iter().map(|w| w.last_active_at).collect();

        store.select_window(&first).unwrap();

        assert_eq!(store.current_id(), Some(first.as_str()));
        let order_after: Vec<String> = store.windows().iter().map(|w| w.id.clone()).collect();
        let activity_after: Vec<i64> = store.windows().iter().map(|w| w.last_active_at).collect();
        assert_eq!(order, order_after);
        assert_eq!(activity, activity_after);
    }

    #[test]
    fn test_append_moves_window_to_front_and_isolates_others() {
        let mut store = store();
        let first = store.create_window(None);
        let second = store.create_window(None);

        store.select_window(&first).unwrap();
        store
            .append_message(Message::user("hello there", now_ms()))
            .unwrap();

        assert_eq!(store.windows()[0].id, first);
        assert_eq!(store.windows()[0].messages.len(), 1);
        let other = store.windows().iter().find(|w| w.id == second).unwrap();
        assert!(other.messages.is_empty());
    }

    #[test]
    fn test_append_rewrites_default_title_from_first_user_message() {
        let mut store = store();
        store.create_window(None);
        store
            .append_message(Message::user("plan a trip to the northern coast", now_ms()))
            .unwrap();
        assert_eq!(store.current_window().unwrap().title, "plan a trip to the north");

        // A custom title is left alone
        let id = store.create_window(Some("budget review".to_string()));
        store.select_window(&id).unwrap();
        store
            .append_message(Message::user("first message", now_ms()))
            .unwrap();
        assert_eq!(store.current_window().unwrap().title, "budget review");
    }

    #[test]
    fn test_default_titles_count_upward() {
        let mut store = store();
        store.create_window(None);
        store.create_window(None);
        let counters: Vec<u64> = store
            .windows()
            .iter()
            .filter_map(|window| default_title_counter(&window.title))
            .collect();
        assert_eq!(counters.len(), 2);
        assert!(counters[0] > counters[1]);
    }

    #[test]
    fn test_settings_update_is_per_window() {
        let mut store = store();
        let first = store.create_window(None);
        let second = store.create_window(None);

        store.select_window(&first).unwrap();
        store
            .update_settings(SettingsPatch {
                temperature: Some(1.5),
                model: Some("reasoner".to_string()),
                ..SettingsPatch::default()
            })
            .unwrap();

        let first_window = store.windows().iter().find(|w| w.id == first).unwrap();
        let second_window = store.windows().iter().find(|w| w.id == second).unwrap();
        assert_eq!(first_window.settings.temperature, 1.5);
        assert_eq!(first_window.settings.model, "reasoner");
        assert_eq!(second_window.settings.temperature, 0.7);
        assert_eq!(second_window.settings.model, "chat");
    }

    #[test]
    fn test_single_flight_guard() {
        let mut store = store();
        store.create_window(None);
        store.begin_exchange().unwrap();

        assert!(matches!(
            store.begin_exchange(),
            Err(StoreError::ExchangeInFlight)
        ));
        assert!(matches!(
            store.append_message(Message::user("mid-stream", now_ms())),
            Err(StoreError::ExchangeInFlight)
        ));

        store.finish_exchange();
        assert!(store.begin_exchange().is_ok());
    }

    #[test]
    fn test_abort_discards_partial_buffers() {
        let mut store = store();
        store.create_window(None);
        store.begin_exchange().unwrap();
        store.push_answer_delta("partial ans");
        store.push_reasoning_delta("partial think");

        store.abort_exchange();

        assert!(!store.is_sending());
        assert!(store.streaming_answer().is_none());
        assert!(store.streaming_reasoning().is_none());
        assert!(store.current_window().unwrap().messages.is_empty());
    }

    #[test]
    fn test_delete_window_reassigns_current() {
        let mut store = store();
        let first = store.create_window(None);
        let second = store.create_window(None);

        store.delete_window(&second).unwrap();
        assert_eq!(store.current_id(), Some(first.as_str()));

        store.delete_window(&first).unwrap();
        assert!(store.current_id().is_none());
        assert!(store.windows().is_empty());
    }

    #[test]
    fn test_append_to_last_message_touches_only_assistant_tail() {
        let mut store = store();
        store.create_window(None);
        store
            .append_message(Message::user("question", 1))
            .unwrap();
        store.append_to_last_message(" ignored").unwrap();
        assert_eq!(store.current_window().unwrap().messages[0].content, "question");

        store
            .append_message(Message::assistant("answer", 2))
            .unwrap();
        store.append_to_last_message(", extended").unwrap();
        assert_eq!(
            store.current_window().unwrap().messages[1].content,
            "answer, extended"
        );
    }

    #[test]
    fn test_snapshot_excludes_transient_state() {
        let mut store = store();
        store.create_window(None);
        store.begin_exchange().unwrap();
        store.push_answer_delta("half an answer");

        let json = serde_json::to_string(&store.to_snapshot()).unwrap();
        assert!(!json.contains("half an answer"));

        let restored = ConversationStore::from_snapshot(
            serde_json::from_str(&json).unwrap(),
            ChatSettings::default(),
        );
        assert!(!restored.is_sending());
        assert!(restored.streaming_answer().is_none());
        assert!(restored.streaming_reasoning().is_none());
    }

    #[test]
    fn test_snapshot_load_repairs_alternation() {
        let mut store = store();
        store.create_window(None);
        store.append_message(Message::user("one", 1_000)).unwrap();
        store.append_message(Message::user("two", 2_000)).unwrap();

        let json = serde_json::to_string(&store.to_snapshot()).unwrap();
        let restored = ConversationStore::from_snapshot(
            serde_json::from_str(&json).unwrap(),
            ChatSettings::default(),
        );

        let messages = &restored.current_window().unwrap().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }
}
