use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
};

use super::components;
use crate::app::{App, SETTINGS_FIELDS};

/// Per-window settings panel over the chat view
pub fn render_settings_view(f: &mut Frame, app: &App) {
    let Some(window) = app.store.current_window() else {
        return;
    };

    let area = components::centered_rect(60, 60, f.area());
    let area = Rect {
        height: (SETTINGS_FIELDS.len() as u16 + 3).min(area.height),
        ..area
    };
    f.render_widget(Clear, area);

    let items: Vec<ListItem> = SETTINGS_FIELDS
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let selected = index == app.settings_selected_index;
            let label_style = if selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let value = field.current_value(&window.settings);
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {:<14}", field.label()), label_style),
                Span::styled(format!(" {value}"), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let functions_note = format!(" {} function(s) configured ", window.settings.functions.len());
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Settings (this conversation) ")
            .title_bottom(functions_note),
    );
    f.render_widget(list, area);

    if let Some(input) = &app.settings_edit_input {
        components::render_edit_overlay(f, "Edit value", input);
    }
}
