// List panels: remaining roster, prize pool and winner history.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use raffle_core::model::{PrizeTier, Winner};

use crate::tui::ViewState;

fn empty_panel(frame: &mut Frame, area: Rect, title: String, text: &'static str) {
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn list_panel(frame: &mut Frame, area: Rect, title: String, items: Vec<ListItem>) {
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

/// Render the participants still eligible to win.
pub fn render_roster(frame: &mut Frame, area: Rect, state: &ViewState) {
    let roster = state
        .snapshot
        .as_ref()
        .map(|s| s.roster.as_slice())
        .unwrap_or_default();
    let title = format!("Pool ({})", roster.len());
    if roster.is_empty() {
        return empty_panel(frame, area, title, "  Nobody registered.");
    }
    let items = roster
        .iter()
        .map(|p| ListItem::new(format!(" {}", p.name)))
        .collect();
    list_panel(frame, area, title, items);
}

/// Render the prize pool, highlighting the active tier.
pub fn render_prizes(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(snapshot) = state.snapshot.as_ref() else {
        return empty_panel(frame, area, "Prizes".into(), "");
    };
    if snapshot.prizes.is_empty() {
        return empty_panel(frame, area, "Prizes".into(), "  No tiers yet (p to add).");
    }
    let items = snapshot
        .prizes
        .iter()
        .map(|t| ListItem::new(format_tier(t, t.name == snapshot.active_tier_name)))
        .collect();
    list_panel(frame, area, "Prizes".into(), items);
}

/// One prize line: "> Gold  2 left", dimmed when used up.
pub fn format_tier(tier: &PrizeTier, active: bool) -> Line<'static> {
    let marker = if active { ">" } else { " " };
    let style = if !tier.is_available() {
        Style::default().fg(Color::DarkGray)
    } else if active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(Span::styled(
        format!("{marker} {}  {} left", tier.name, tier.remaining_count),
        style,
    ))
}

/// Render winner history, most recent first.
pub fn render_winners(frame: &mut Frame, area: Rect, state: &ViewState) {
    let winners = state
        .snapshot
        .as_ref()
        .map(|s| s.winners.as_slice())
        .unwrap_or_default();
    let title = format!("Winners ({})", winners.len());
    if winners.is_empty() {
        return empty_panel(frame, area, title, "  No winners yet.");
    }
    let items = winners
        .iter()
        .enumerate()
        .map(|(i, w)| ListItem::new(format_winner(winners.len() - i, w)))
        .collect();
    list_panel(frame, area, title, items);
}

/// "#3 Alice -- Gold"
pub fn format_winner(order: usize, winner: &Winner) -> String {
    format!("#{order} {} -- {}", winner.name, winner.prize_name)
}
