mod chat;
mod navigation;
mod settings;
mod text_input;
mod windows;

pub use navigation::Navigable;
pub use settings::{SETTINGS_FIELDS, SettingsField};
pub use text_input::TextInput;

use crate::api::balance::{BalanceCache, BalanceResponse};
use crate::api::stream::CancelToken;
use crate::config::Config;
use crate::store::ConversationStore;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

/// Application mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Chat,
    Windows,
    Settings,
    Help,
}

/// Events from the exchange worker thread
pub enum ExchangeEvent {
    AnswerDelta(String),
    ReasoningDelta(String),
    Completed {
        content: String,
        reasoning_content: String,
    },
    Failed(String),
    Aborted,
    BalanceFetched(Option<BalanceResponse>),
}

#[derive(Debug, Clone)]
pub struct StatusToast {
    pub message: String,
    pub created_at: std::time::Instant,
}

impl StatusToast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self, duration: Duration) -> bool {
        self.created_at.elapsed() >= duration
    }
}

/// Main application state
pub struct App {
    pub mode: AppMode,
    pub should_quit: bool,
    pub store: ConversationStore,
    pub api_key: String,
    pub base_url: String,

    // Chat fields
    pub chat_input: TextInput,
    pub chat_scroll_offset: usize,
    pub chat_auto_scroll: bool,
    pub loading_frame: u8,
    pub last_loading_tick: Option<std::time::Instant>,

    // Exchange worker channel and cancellation
    pub exchange_tx: Sender<ExchangeEvent>,
    pub exchange_rx: Receiver<ExchangeEvent>,
    pub cancel_token: Option<CancelToken>,

    // Window list fields
    pub windows_selected_index: usize,
    pub window_rename_input: Option<TextInput>,

    // Settings fields
    pub settings_selected_index: usize,
    pub settings_edit_input: Option<TextInput>,

    pub balance: BalanceCache,
    pub status_toast: Option<StatusToast>,
}

impl App {
    /// Creates the application, loading the persisted window snapshot
    pub fn new(config: &Config) -> Self {
        let (exchange_tx, exchange_rx) = channel();
        let mut store = ConversationStore::load(config.defaults.clone());
        if store.windows().is_empty() {
            store.create_window(None);
        }

        Self {
            mode: AppMode::Chat,
            should_quit: false,
            store,
            api_key: config.api.key.clone(),
            base_url: config.api.base_url.clone(),
            chat_input: TextInput::new(),
            chat_scroll_offset: 0,
            chat_auto_scroll: true,
            loading_frame: 0,
            last_loading_tick: None,
            exchange_tx,
            exchange_rx,
            cancel_token: None,
            windows_selected_index: 0,
            window_rename_input: None,
            settings_selected_index: 0,
            settings_edit_input: None,
            balance: BalanceCache::new(),
            status_toast: None,
        }
    }

    pub fn show_status_toast(&mut self, message: impl Into<String>) {
        self.status_toast = Some(StatusToast::new(message));
    }

    pub fn clear_expired_status_toast(&mut self) {
        let should_clear = self
            .status_toast
            .as_ref()
            .is_some_and(|toast| toast.is_expired(Duration::from_secs(3)));
        if should_clear {
            self.status_toast = None;
        }
    }

    #[must_use]
    pub fn status_toast_message(&self) -> Option<&str> {
        self.status_toast.as_ref().map(|toast| toast.message.as_str())
    }

    /// Persists the window snapshot, surfacing failures as a toast
    pub fn save_store(&mut self) {
        if let Err(error) = self.store.save() {
            log::warn!("failed to save conversation snapshot: {error}");
            self.show_status_toast("SAVE FAILED");
        }
    }

    pub fn reset_chat_scroll(&mut self) {
        self.chat_scroll_offset = 0;
        self.chat_auto_scroll = true;
    }
}
