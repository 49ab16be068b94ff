use super::{App, AppMode, Navigable, TextInput};

impl App {
    pub fn open_windows(&mut self) {
        self.mode = AppMode::Windows;
        self.window_rename_input = None;
        // Put the cursor on the current window
        self.windows_selected_index = self
            .store
            .current_id()
            .and_then(|id| {
                self.store
                    .windows()
                    .iter()
                    .position(|window| window.id == id)
            })
            .unwrap_or(0);
    }

    pub fn close_windows(&mut self) {
        self.mode = AppMode::Chat;
        self.window_rename_input = None;
    }

    /// Creates a fresh window and drops straight into it
    pub fn new_window(&mut self) {
        self.store.create_window(None);
        self.save_store();
        self.reset_chat_scroll();
        self.mode = AppMode::Chat;
    }

    pub fn select_window_under_cursor(&mut self) {
        let Some(id) = self.window_id_under_cursor() else {
            return;
        };
        if self.store.select_window(&id).is_ok() {
            self.save_store();
            self.reset_chat_scroll();
            self.mode = AppMode::Chat;
        }
    }

    pub fn delete_window_under_cursor(&mut self) {
        let Some(id) = self.window_id_under_cursor() else {
            return;
        };
        // A reply still streaming has nowhere to land once its window is
        // gone; stop the worker before dropping the window.
        if self.store.is_sending() {
            self.cancel_exchange();
        }
        if let Err(error) = self.store.delete_window(&id) {
            self.show_status_toast(format!("{error}"));
            return;
        }
        self.cancel_token = None;
        if self.windows_selected_index >= self.store.windows().len()
            && self.windows_selected_index > 0
        {
            self.windows_selected_index -= 1;
        }
        self.save_store();
    }

    pub fn start_window_rename(&mut self) {
        let Some(id) = self.window_id_under_cursor() else {
            return;
        };
        let title = self
            .store
            .windows()
            .iter()
            .find(|window| window.id == id)
            .map(|window| window.title.clone())
            .unwrap_or_default();
        self.window_rename_input = Some(TextInput::with_content(title));
    }

    pub fn commit_window_rename(&mut self) {
        let Some(input) = self.window_rename_input.take() else {
            return;
        };
        let Some(id) = self.window_id_under_cursor() else {
            return;
        };
        if self.store.rename_window(&id, input.content()).is_ok() {
            self.save_store();
        }
    }

    pub fn cancel_window_rename(&mut self) {
        self.window_rename_input = None;
    }

    fn window_id_under_cursor(&self) -> Option<String> {
        self.store
            .windows()
            .get(self.windows_selected_index)
            .map(|window| window.id.clone())
    }
}

// Navigation over the window list
struct WindowsNavigable<'a> {
    app: &'a mut App,
}

impl Navigable for WindowsNavigable<'_> {
    fn get_item_count(&self) -> usize {
        self.app.store.windows().len()
    }

    fn get_selected_index(&self) -> usize {
        self.app.windows_selected_index
    }

    fn set_selected_index(&mut self, index: usize) {
        self.app.windows_selected_index = index;
    }
}

impl App {
    pub fn next_window_item(&mut self) {
        WindowsNavigable { app: self }.next_item();
    }

    pub fn previous_window_item(&mut self) {
        WindowsNavigable { app: self }.previous_item();
    }
}
