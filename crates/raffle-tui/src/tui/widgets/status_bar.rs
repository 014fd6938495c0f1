// Status bar widget: event title, storage health, tier and audio.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use raffle_core::model::AudioSettings;

use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [storage dot] [title] | [active tier] | [counts] | [audio]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(snapshot) = state.snapshot.as_ref() else {
        let paragraph = Paragraph::new(" Loading...")
            .style(Style::default().fg(Color::DarkGray).bg(Color::Black));
        frame.render_widget(paragraph, area);
        return;
    };

    let separator = || Span::styled(" | ", Style::default().fg(Color::Gray));
    let (dot, dot_color) = storage_indicator(snapshot.degraded);

    let spans = vec![
        Span::styled(format!(" {dot} "), Style::default().fg(dot_color)),
        Span::styled(
            snapshot.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        separator(),
        Span::styled(
            format!("Tier: {}", snapshot.active_tier_name),
            Style::default().fg(Color::Yellow),
        ),
        separator(),
        Span::raw(format!(
            "{} in pool, {} winners",
            snapshot.roster.len(),
            snapshot.winners.len()
        )),
        separator(),
        Span::raw(audio_label(&snapshot.audio)),
    ];

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Dot shown for the storage state: red while changes are not being shared.
pub fn storage_indicator(degraded: bool) -> (&'static str, Color) {
    if degraded {
        ("●", Color::Red)
    } else {
        ("●", Color::Green)
    }
}

/// "Sound 50%" or "Muted".
pub fn audio_label(audio: &AudioSettings) -> String {
    if audio.enabled {
        format!("Sound {:.0}%", audio.volume * 100.0)
    } else {
        "Muted".to_string()
    }
}
