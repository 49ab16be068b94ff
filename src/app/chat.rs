use super::{App, ExchangeEvent};
use crate::api::{balance, stream};
use crate::store::{Message, MessageRole, StoreError, now_ms};

impl App {
    /// Appends the typed message to the current window and starts an
    /// exchange. The store rejects both steps while one is in flight.
    pub fn send_chat_message(&mut self) {
        if self.chat_input.is_empty() {
            return;
        }
        if self.store.current_window().is_none() {
            self.store.create_window(None);
        }

        let content = self.chat_input.content().to_string();
        match self.store.append_message(Message::user(content, now_ms())) {
            Ok(()) => {}
            Err(StoreError::ExchangeInFlight) => {
                self.show_status_toast("WAIT FOR THE CURRENT REPLY");
                return;
            }
            Err(error) => {
                self.show_status_toast(format!("SEND FAILED: {error}"));
                return;
            }
        }
        self.chat_input.clear();
        self.reset_chat_scroll();
        self.start_exchange();
    }

    /// Removes a trailing assistant turn and replays the history, so a
    /// failed or unsatisfying reply can be retried
    pub fn retry_last_exchange(&mut self) {
        if self.store.is_sending() {
            return;
        }
        let Some(window) = self.store.current_window() else {
            return;
        };
        let ends_with_assistant = window
            .messages
            .last()
            .is_some_and(|message| message.role == MessageRole::Assistant);
        if ends_with_assistant {
            let _ = self.store.delete_last_message();
        }
        let ends_with_user = self
            .store
            .current_window()
            .and_then(|window| window.messages.last())
            .is_some_and(|message| message.role == MessageRole::User);
        if !ends_with_user {
            self.show_status_toast("NOTHING TO RETRY");
            return;
        }
        self.start_exchange();
    }

    /// Spawns the worker thread that drives one exchange and reports back
    /// through the event channel
    fn start_exchange(&mut self) {
        if let Err(error) = self.store.begin_exchange() {
            self.show_status_toast(format!("{error}"));
            return;
        }
        let Some(window) = self.store.current_window() else {
            self.store.finish_exchange();
            return;
        };

        let settings = window.settings.clone();
        let history = window.messages.clone();
        let api_key = self.api_key.clone();
        let base_url = self.base_url.clone();
        let cancel = stream::CancelToken::new();
        self.cancel_token = Some(cancel.clone());
        let tx = self.exchange_tx.clone();

        std::thread::spawn(move || {
            let answer_tx = tx.clone();
            let reasoning_tx = tx.clone();
            let result = stream::run_exchange(
                &base_url,
                &api_key,
                &settings,
                &history,
                |delta| {
                    let _ = answer_tx.send(ExchangeEvent::AnswerDelta(delta.to_string()));
                },
                |delta| {
                    let _ = reasoning_tx.send(ExchangeEvent::ReasoningDelta(delta.to_string()));
                },
                &cancel,
            );
            let event = match result {
                Ok(outcome) => ExchangeEvent::Completed {
                    content: outcome.content,
                    reasoning_content: outcome.reasoning_content,
                },
                Err(stream::ExchangeError::StreamAborted) => ExchangeEvent::Aborted,
                Err(error) => ExchangeEvent::Failed(error.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    /// Signals the in-flight exchange to stop at its next read
    pub fn cancel_exchange(&mut self) {
        if let Some(token) = &self.cancel_token {
            token.cancel();
        }
    }

    /// Drains worker events. Deltas feed the transient streaming buffers;
    /// only a completed exchange lands in the message history.
    pub fn check_exchange_events(&mut self) {
        while let Ok(event) = self.exchange_rx.try_recv() {
            match event {
                ExchangeEvent::AnswerDelta(delta) => {
                    self.store.push_answer_delta(&delta);
                    if self.chat_auto_scroll {
                        self.chat_scroll_offset = 0;
                    }
                }
                ExchangeEvent::ReasoningDelta(delta) => {
                    self.store.push_reasoning_delta(&delta);
                    if self.chat_auto_scroll {
                        self.chat_scroll_offset = 0;
                    }
                }
                ExchangeEvent::Completed {
                    content,
                    reasoning_content,
                } => {
                    self.store.finish_exchange();
                    self.cancel_token = None;
                    let message =
                        Message::assistant_with_reasoning(content, reasoning_content, now_ms());
                    if let Err(error) = self.store.append_message_unchecked(message) {
                        self.show_status_toast(format!("{error}"));
                    }
                    self.save_store();
                }
                ExchangeEvent::Failed(detail) => {
                    // A genuine failure stays visible as a turn in the
                    // history; cancellation below does not.
                    self.store.finish_exchange();
                    self.cancel_token = None;
                    let placeholder =
                        Message::assistant(format!("[request failed] {detail}"), now_ms());
                    let _ = self.store.append_message_unchecked(placeholder);
                    self.save_store();
                    self.show_status_toast("REQUEST FAILED");
                }
                ExchangeEvent::Aborted => {
                    self.store.abort_exchange();
                    self.cancel_token = None;
                    self.show_status_toast("CANCELLED");
                }
                ExchangeEvent::BalanceFetched(result) => match result {
                    Some(response) => self.balance.store(response),
                    None => self.balance.refresh_failed(),
                },
            }
        }
    }

    /// Empties the current window's history
    pub fn clear_chat(&mut self) {
        if self.store.is_sending() {
            self.show_status_toast("WAIT FOR THE CURRENT REPLY");
            return;
        }
        if self.store.clear_messages().is_ok() {
            self.save_store();
            self.show_status_toast("CHAT CLEARED");
        }
        self.reset_chat_scroll();
    }

    /// Kicks off a background balance fetch when the cache has gone stale
    pub fn refresh_balance(&mut self) {
        if self.api_key.is_empty() || !self.balance.needs_refresh() {
            return;
        }
        self.balance.begin_refresh();
        let base_url = self.base_url.clone();
        let api_key = self.api_key.clone();
        let tx = self.exchange_tx.clone();
        std::thread::spawn(move || {
            let result = balance::fetch_balance(&base_url, &api_key).ok();
            let _ = tx.send(ExchangeEvent::BalanceFetched(result));
        });
    }

    pub fn add_chat_input_char(&mut self, character: char) {
        self.chat_input.add_char(character);
    }

    pub fn remove_chat_input_char(&mut self) {
        self.chat_input.remove_char();
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll_offset = self.chat_scroll_offset.saturating_add(1);
        self.chat_auto_scroll = false;
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll_offset = self.chat_scroll_offset.saturating_sub(1);
        if self.chat_scroll_offset == 0 {
            self.chat_auto_scroll = true;
        }
    }
}
