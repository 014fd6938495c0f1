// Stage widget: the big draw display.
//
// Idle: the tier about to be drawn (and the last winner, if any).
// Rolling: names cycling once per frame.
// Awaiting confirmation: the drawn name, waiting for the operator.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use raffle_core::draw::DrawPhase;

use crate::tui::ViewState;

/// Render the stage into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let tier = state
        .snapshot
        .as_ref()
        .map(|s| s.active_tier_name.clone())
        .unwrap_or_default();

    let (border, lines) = match state.phase() {
        DrawPhase::Idle => (Color::Gray, idle_lines(state, &tier)),
        DrawPhase::Rolling => {
            let name = state.spinning_name().unwrap_or("...").to_string();
            (
                Color::Magenta,
                vec![
                    Line::from(Span::styled(
                        name,
                        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        "press space to stop",
                        Style::default().fg(Color::DarkGray),
                    )),
                ],
            )
        }
        DrawPhase::AwaitingConfirmation(winner) => (
            Color::Green,
            vec![
                Line::from(Span::styled(
                    winner.name,
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("wins {}", winner.prize_name)),
                Line::from(Span::styled(
                    "press enter to confirm",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
        ),
    };

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(format!(" {tier} ")),
        );
    frame.render_widget(paragraph, area);
}

fn idle_lines(state: &ViewState, tier: &str) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        format!("Next draw: {tier}"),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))];
    if let Some(winner) = &state.last_winner {
        lines.push(Line::from(format!(
            "Last winner: {} ({})",
            winner.name, winner.prize_name
        )));
    }
    lines.push(Line::from(Span::styled(
        "press space to draw",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}
