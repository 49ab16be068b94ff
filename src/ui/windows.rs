use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::components;
use crate::app::App;
use crate::store::MAX_WINDOWS;

/// Conversation window list: select, create, rename, delete
pub fn render_windows_view(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let &[list_area, footer] = &chunks[..] else {
        return;
    };

    let items: Vec<ListItem> = app
        .store
        .windows()
        .iter()
        .enumerate()
        .map(|(index, window)| {
            let selected = index == app.windows_selected_index;
            let current = app.store.current_id() == Some(window.id.as_str());
            let marker = if current { "● " } else { "  " };
            let style = if selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let meta = format!("  {} messages", window.messages.len());
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Magenta)),
                Span::styled(window.title.clone(), style),
                Span::styled(meta, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let title = format!(" Conversations ({}/{MAX_WINDOWS}) ", app.store.windows().len());
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title),
    );
    f.render_widget(list, list_area);

    f.render_widget(
        Paragraph::new(Span::styled(
            " Enter open · n new · r rename · d delete · Esc back",
            Style::default().fg(Color::DarkGray),
        )),
        footer,
    );

    if let Some(input) = &app.window_rename_input {
        components::render_edit_overlay(f, "Rename conversation", input);
    }
}
