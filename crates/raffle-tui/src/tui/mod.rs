// Terminal presentation: operator dashboard and registration kiosk.
//
// The TUI owns a `ViewState` holding the latest `AppSnapshot` plus purely
// local state (input mode, typed text, last message, spin frame). The
// orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::io::Write;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use raffle_app::protocol::{AppSnapshot, UiUpdate, UserCommand};
use raffle_core::draw::DrawPhase;
use raffle_core::model::Winner;
use raffle_core::raffle::AccessMode;

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// What keystrokes currently mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing a participant name.
    AddName,
    /// Typing "<tier name> [count]".
    AddTier,
    /// Typing the CSV path for winner export.
    ExportPath,
    /// Typing the CSV path for roster import.
    ImportPath,
    ConfirmQuit,
    ConfirmReset,
}

/// Last feedback line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Info(String),
    Error(String),
}

/// TUI-local state: the latest snapshot plus input and animation state.
#[derive(Debug, Default)]
pub struct ViewState {
    /// `None` until the orchestrator sends the first snapshot.
    pub snapshot: Option<AppSnapshot>,
    pub input_mode: InputMode,
    pub input_text: String,
    pub message: Option<Message>,
    /// The most recent winner drawn by this context.
    pub last_winner: Option<Winner>,
    /// Advances every frame while rolling.
    pub spin_index: usize,
}

impl ViewState {
    pub fn is_registration_only(&self) -> bool {
        matches!(
            self.snapshot.as_ref().map(|s| s.mode),
            Some(AccessMode::RegistrationOnly)
        )
    }

    pub fn phase(&self) -> DrawPhase {
        self.snapshot
            .as_ref()
            .map(|s| s.phase.clone())
            .unwrap_or_default()
    }

    /// Name shown in the spinning display for the current frame.
    pub fn spinning_name(&self) -> Option<&str> {
        let roster = &self.snapshot.as_ref()?.roster;
        if roster.is_empty() {
            return None;
        }
        Some(roster[self.spin_index % roster.len()].name.as_str())
    }

    /// Enter a text-entry mode with `prefill` in the buffer.
    pub fn begin_input(&mut self, mode: InputMode, prefill: &str) {
        self.input_mode = mode;
        self.input_text = prefill.to_string();
    }

    /// Leave any input or confirmation mode and drop typed text.
    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_text.clear();
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            if snapshot.winners.is_empty() {
                state.last_winner = None;
            }
            state.snapshot = Some(*snapshot);
        }
        UiUpdate::Rejected(text) => {
            state.message = Some(Message::Error(text));
        }
        UiUpdate::Notice(text) => {
            state.message = Some(Message::Info(text));
        }
        UiUpdate::WinnerDrawn(winner) => {
            state.message = Some(Message::Info(format!(
                "{} wins {}!",
                winner.name, winner.prize_name
            )));
            state.last_winner = Some(winner);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the whole screen for the current mode.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    if state.is_registration_only() {
        widgets::registration::render(frame, frame.area(), state);
    } else {
        let layout = build_layout(frame.area());
        render_dashboard(frame, &layout, state);
    }

    match state.input_mode {
        InputMode::ConfirmQuit => {
            widgets::confirm::render(frame, frame.area(), " Quit? ", "Really quit?")
        }
        InputMode::ConfirmReset => widgets::confirm::render(
            frame,
            frame.area(),
            " Reset? ",
            "Erase ALL raffle data?",
        ),
        _ => {}
    }
}

fn render_dashboard(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::stage::render(frame, layout.stage, state);
    widgets::lists::render_roster(frame, layout.roster, state);
    widgets::lists::render_prizes(frame, layout.prizes, state);
    widgets::lists::render_winners(frame, layout.winners, state);
    render_input_line(frame, layout, state);
    render_help_bar(frame, layout, state);
}

/// Prompt text for a text-entry mode.
pub fn input_prompt(mode: InputMode) -> Option<&'static str> {
    match mode {
        InputMode::AddName => Some("Name: "),
        InputMode::AddTier => Some("Tier (name count): "),
        InputMode::ExportPath => Some("Export winners to: "),
        InputMode::ImportPath => Some("Import roster from: "),
        _ => None,
    }
}

fn render_input_line(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let line = if let Some(prompt) = input_prompt(state.input_mode) {
        Line::from(vec![
            Span::styled(prompt, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(state.input_text.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    } else {
        message_line(state.message.as_ref())
    };
    frame.render_widget(Paragraph::new(line), layout.input_line);
}

/// Styled line for the last feedback message.
pub fn message_line(message: Option<&Message>) -> Line<'static> {
    match message {
        Some(Message::Info(text)) => Line::from(Span::styled(
            format!(" {text}"),
            Style::default().fg(Color::Green),
        )),
        Some(Message::Error(text)) => Line::from(Span::styled(
            format!(" {text}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Line::default(),
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = match state.phase() {
        DrawPhase::Idle => {
            " space:Draw | a:Add name | p:Add tier | x:Remove tier | \u{2190}\u{2192}:Tier | m:Mute +/-:Vol | i:Import e:Export | R:Reset | q:Quit"
        }
        DrawPhase::Rolling => " space:Stop | q:Quit",
        DrawPhase::AwaitingConfirmation(_) => " enter:Confirm winner | q:Quit",
    };
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Ring the terminal bell for a drawn winner when sound is on.
fn announce(state: &ViewState) {
    let audible = state
        .snapshot
        .as_ref()
        .is_some_and(|s| s.audio.effective_volume() > 0.0);
    if audible {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

/// Run the TUI event loop until the user quits or the orchestrator stops.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Selects over UI updates, keyboard input and render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => {
                        let drawn = matches!(ui_update, UiUpdate::WinnerDrawn(_));
                        apply_ui_update(&mut view_state, ui_update);
                        if drawn {
                            announce(&view_state);
                        }
                    }
                    None => break,
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                if view_state.phase() == DrawPhase::Rolling {
                    view_state.spin_index = view_state.spin_index.wrapping_add(1);
                }
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use raffle_core::model::{AudioSettings, Participant, PrizeTier};

    pub(crate) fn snapshot(mode: AccessMode) -> AppSnapshot {
        AppSnapshot {
            title: "Year-End Party".into(),
            mode,
            roster: vec![Participant::new("Alice"), Participant::new("Bob")],
            winners: Vec::new(),
            prizes: vec![PrizeTier::new("Gold", 1), PrizeTier::new("Silver", 0)],
            active_tiers: vec!["Gold".into()],
            active_tier_name: "Gold".into(),
            phase: DrawPhase::Idle,
            audio: AudioSettings::default(),
            degraded: false,
        }
    }

    pub(crate) fn winner(name: &str) -> Winner {
        Winner {
            id: "w1".into(),
            name: name.into(),
            prize_name: "Gold".into(),
            timestamp: 0,
        }
    }

    pub(crate) fn screen_text(state: &ViewState, width: u16, height: u16) -> String {
        let backend = ratatui::backend::TestBackend::new(width, height);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_frame(frame, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert!(state.snapshot.is_none());
        assert_eq!(state.input_mode, InputMode::Normal);
        assert!(state.input_text.is_empty());
        assert!(state.message.is_none());
        assert!(!state.is_registration_only());
        assert_eq!(state.phase(), DrawPhase::Idle);
    }

    #[test]
    fn apply_snapshot_replaces_view() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::Snapshot(Box::new(snapshot(AccessMode::RegistrationOnly))),
        );
        assert!(state.is_registration_only());
        assert_eq!(state.snapshot.as_ref().unwrap().roster.len(), 2);
    }

    #[test]
    fn rejected_and_notice_set_message() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::Rejected("nope".into()));
        assert_eq!(state.message, Some(Message::Error("nope".into())));
        apply_ui_update(&mut state, UiUpdate::Notice("ok".into()));
        assert_eq!(state.message, Some(Message::Info("ok".into())));
    }

    #[test]
    fn winner_drawn_is_remembered_until_history_clears() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::WinnerDrawn(winner("Alice")));
        assert_eq!(state.last_winner.as_ref().unwrap().name, "Alice");
        assert!(matches!(&state.message, Some(Message::Info(m)) if m.contains("Alice")));

        let mut with_history = snapshot(AccessMode::Operator);
        with_history.winners = vec![winner("Alice")];
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(with_history)));
        assert!(state.last_winner.is_some());

        // A reset empties the history.
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(snapshot(AccessMode::Operator))));
        assert!(state.last_winner.is_none());
    }

    #[test]
    fn spinning_name_cycles_through_roster() {
        let mut state = ViewState::default();
        assert!(state.spinning_name().is_none());
        state.snapshot = Some(snapshot(AccessMode::Operator));
        assert_eq!(state.spinning_name(), Some("Alice"));
        state.spin_index = 3;
        assert_eq!(state.spinning_name(), Some("Bob"));
    }

    #[test]
    fn dashboard_shows_title_and_tiers() {
        let mut state = ViewState::default();
        state.snapshot = Some(snapshot(AccessMode::Operator));
        let text = screen_text(&state, 120, 30);
        assert!(text.contains("Year-End Party"));
        assert!(text.contains("Gold"));
        assert!(text.contains("Alice"));
    }

    #[test]
    fn reset_confirmation_overlay_is_drawn() {
        let mut state = ViewState::default();
        state.snapshot = Some(snapshot(AccessMode::Operator));
        state.input_mode = InputMode::ConfirmReset;
        let text = screen_text(&state, 120, 30);
        assert!(text.contains("Erase ALL raffle data?"));
    }

    #[test]
    fn render_before_first_snapshot_does_not_panic() {
        let state = ViewState::default();
        screen_text(&state, 80, 24);
    }
}
