use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthChar;

use crate::app::App;
use crate::store::{Message, MessageRole};

const LOADING_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Primary chat view with header, messages, input, and footer
pub fn render_chat_view(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Chat history
            Constraint::Length(3), // Input
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    if let [header, history, input, footer] = &chunks[..] {
        render_chat_header(f, app, *header);
        render_chat_history(f, app, *history);
        render_chat_input(f, app, *input);
        render_chat_footer(f, app, *footer);
    }
}

fn render_chat_header(f: &mut Frame, app: &App, area: Rect) {
    let window_title = app
        .store
        .current_window()
        .map(|window| window.title.clone())
        .unwrap_or_else(|| "no conversation".to_string());
    let model = app
        .store
        .current_window()
        .map(|window| window.settings.model.clone())
        .unwrap_or_default();

    let mut title_spans = vec![
        Span::raw(" "),
        Span::styled(
            "Quill",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(window_title, Style::default().fg(Color::Cyan)),
    ];
    if let Some(balance) = app.balance.value() {
        title_spans.push(Span::styled(
            format!("  {}", balance.summary()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    f.render_widget(
        Paragraph::new(Line::from(title_spans)).alignment(Alignment::Left),
        inner,
    );
    if !model.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("{model} "),
                Style::default().fg(Color::White),
            )))
            .alignment(Alignment::Right),
            inner,
        );
    }
}

/// Styles for rendering different message types
struct MessageStyles {
    prefix: &'static str,
    prefix_style: Style,
    content_style: Style,
}

impl MessageStyles {
    fn for_role(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Self {
                prefix: "You",
                prefix_style: Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                content_style: Style::default().fg(Color::White),
            },
            MessageRole::Assistant => Self {
                prefix: "Assistant",
                prefix_style: Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
                content_style: Style::default().fg(Color::White),
            },
            MessageRole::System | MessageRole::Tool => Self {
                prefix: "",
                prefix_style: Style::default().fg(Color::DarkGray),
                content_style: Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            },
        }
    }
}

fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|utc| {
            utc.with_timezone(&chrono::Local)
                .format("%H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}

fn message_lines(message: &Message, max_width: usize) -> Vec<Line<'static>> {
    let styles = MessageStyles::for_role(message.role);
    let mut lines = Vec::new();

    if !styles.prefix.is_empty() {
        lines.push(Line::from(vec![
            Span::styled(styles.prefix, styles.prefix_style),
            Span::styled(
                format!("  {}", format_timestamp(message.timestamp)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    if let Some(reasoning) = &message.reasoning_content {
        let reasoning_style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
        for wrapped in wrap_text(reasoning, max_width) {
            lines.push(Line::from(Span::styled(format!("  {wrapped}"), reasoning_style)));
        }
    }

    for wrapped in wrap_text(&message.content, max_width) {
        lines.push(Line::from(Span::styled(
            format!("  {wrapped}"),
            styles.content_style,
        )));
    }
    lines.push(Line::from(""));
    lines
}

fn render_chat_history(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let max_width = inner.width.saturating_sub(4) as usize;
    let mut lines: Vec<Line> = Vec::new();

    if let Some(window) = app.store.current_window() {
        for message in &window.messages {
            lines.extend(message_lines(message, max_width));
        }
    }

    // Live buffers of the in-flight exchange
    if let Some(reasoning) = app.store.streaming_reasoning() {
        let style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
        for wrapped in wrap_text(reasoning, max_width) {
            lines.push(Line::from(Span::styled(format!("  {wrapped}"), style)));
        }
    }
    if let Some(answer) = app.store.streaming_answer() {
        lines.push(Line::from(Span::styled(
            "Assistant",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )));
        for wrapped in wrap_text(answer, max_width) {
            lines.push(Line::from(Span::styled(
                format!("  {wrapped}"),
                Style::default().fg(Color::White),
            )));
        }
    }
    if app.store.is_sending() {
        let frame = LOADING_FRAMES
            .get(app.loading_frame as usize % LOADING_FRAMES.len())
            .copied()
            .unwrap_or("|");
        lines.push(Line::from(Span::styled(
            format!("  {frame} waiting for the model"),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let height = inner.height as usize;
    let start = lines
        .len()
        .saturating_sub(height + app.chat_scroll_offset);
    let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();
    f.render_widget(Paragraph::new(visible), inner);
}

fn render_chat_input(f: &mut Frame, app: &App, area: Rect) {
    let text = format!(" {}█", app.chat_input.content());
    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Message "),
    );
    f.render_widget(paragraph, area);
}

fn render_chat_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints = if app.store.is_sending() {
        " Esc cancel · ^C quit"
    } else {
        " Enter send · Esc windows · ^N new · ^S settings · ^R retry · ^L clear · F1 help"
    };
    f.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(Color::DarkGray))),
        area,
    );
}

/// Width-aware wrapping, splitting long words when they exceed the width
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }
    let mut result = Vec::new();
    for source_line in text.lines() {
        let mut current = String::new();
        let mut current_width = 0;
        for ch in source_line.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if current_width + ch_width > max_width && !current.is_empty() {
                result.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(ch);
            current_width += ch_width;
        }
        result.push(current);
    }
    if result.is_empty() {
        result.push(String::new());
    }
    result
}
