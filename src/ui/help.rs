use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::components;

const BINDINGS: [(&str, &str); 12] = [
    ("Enter", "send message"),
    ("Esc", "cancel streaming / open conversations"),
    ("Ctrl+N", "new conversation"),
    ("Ctrl+S", "conversation settings"),
    ("Ctrl+R", "retry last reply"),
    ("Ctrl+L", "clear conversation"),
    ("Up/Down", "scroll history"),
    ("F1", "this help"),
    ("Ctrl+C", "quit"),
    ("n / r / d", "new / rename / delete (in list)"),
    ("", ""),
    ("quill balance", "print account balance and exit"),
];

pub fn render_help_view(f: &mut Frame) {
    let area = components::centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let lines: Vec<Line> = BINDINGS
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(
                    format!(" {key:<14}"),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(*action, Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help "),
    );
    f.render_widget(paragraph, area);
}
