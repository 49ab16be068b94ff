use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, TextInput};

/// Creates a centered rectangle within the given area
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let percent_x = percent_x.min(100);
    let percent_y = percent_y.min(100);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let middle = vertical.get(1).copied().unwrap_or(r);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(middle);
    horizontal.get(1).copied().unwrap_or(middle)
}

/// Small bordered overlay with a single editable line
pub fn render_edit_overlay(f: &mut Frame, title: &str, input: &TextInput) {
    let area = centered_rect(60, 20, f.area());
    let area = Rect {
        height: 3.min(area.height),
        ..area
    };
    f.render_widget(Clear, area);

    let text = format!("{}█", input.content());
    let paragraph = Paragraph::new(Line::from(vec![Span::raw(" "), Span::raw(text)])).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {title} ")),
    );
    f.render_widget(paragraph, area);
}

/// Short-lived status toast in the bottom-right corner
pub fn render_status_toast(f: &mut Frame, app: &App) {
    let Some(message) = app.status_toast_message() else {
        return;
    };
    let width = (message.width() as u16).saturating_add(4);
    let screen = f.area();
    if screen.width < width + 2 || screen.height < 4 {
        return;
    }
    let area = Rect {
        x: screen.width - width - 1,
        y: screen.height - 3,
        width,
        height: 1,
    };
    f.render_widget(Clear, area);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!("  {message}  "),
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}
