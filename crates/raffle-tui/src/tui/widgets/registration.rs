// Registration kiosk screen: a name field and a running count.

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::{message_line, ViewState};

/// Render the kiosk screen into `area`.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let [title_area, _, field_area, message_area, _, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let (title, registered) = state
        .snapshot
        .as_ref()
        .map(|s| (s.title.clone(), s.roster.len()))
        .unwrap_or_default();

    let heading = Paragraph::new(vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("{registered} registered so far")),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(heading, title_area);

    let field = Paragraph::new(Line::from(vec![
        Span::raw(state.input_text.clone()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Type your name and press Enter "),
    );
    frame.render_widget(field, field_area);

    frame.render_widget(
        Paragraph::new(message_line(state.message.as_ref())).alignment(Alignment::Center),
        message_area,
    );

    let footer = Paragraph::new(" esc:Quit")
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(footer, footer_area);
}
