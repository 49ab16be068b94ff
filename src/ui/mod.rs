mod chat;
mod components;
mod help;
mod settings;
mod windows;

use crate::app::{App, AppMode};
use ratatui::Frame;

pub fn render(f: &mut Frame, app: &App) {
    match app.mode {
        AppMode::Chat => chat::render_chat_view(f, app),
        AppMode::Windows => windows::render_windows_view(f, app),
        AppMode::Settings => {
            // Chat stays visible behind the settings panel
            chat::render_chat_view(f, app);
            settings::render_settings_view(f, app);
        }
        AppMode::Help => help::render_help_view(f),
    }

    components::render_status_toast(f, app);
}
