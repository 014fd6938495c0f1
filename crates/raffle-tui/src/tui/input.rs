// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// orchestrator, or into local ViewState mutations (text entry, dialogs).

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use raffle_app::protocol::UserCommand;
use raffle_core::draw::DrawPhase;
use raffle_core::model::AudioSettings;

use super::{InputMode, ViewState};

/// Default file name offered for winner export.
pub const DEFAULT_EXPORT_PATH: &str = "winners.csv";

/// Volume change per `+`/`-` press.
const VOLUME_STEP: f64 = 0.1;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// orchestrator. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events; crossterm may also emit releases.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    match view_state.input_mode {
        InputMode::ConfirmQuit => return handle_confirm(key_event, view_state, UserCommand::Quit),
        InputMode::ConfirmReset => {
            return handle_confirm(key_event, view_state, UserCommand::FullReset)
        }
        InputMode::AddName
        | InputMode::AddTier
        | InputMode::ExportPath
        | InputMode::ImportPath => return handle_text_entry(key_event, view_state),
        InputMode::Normal => {}
    }

    if view_state.is_registration_only() {
        return handle_kiosk(key_event, view_state);
    }

    handle_operator(key_event, view_state)
}

/// Handle key events while a yes/no dialog is open.
///
/// - `y` confirms and sends `on_yes` (`q` also confirms a quit)
/// - `n` or `Esc` cancels
/// - All other keys are blocked
fn handle_confirm(
    key_event: KeyEvent,
    view_state: &mut ViewState,
    on_yes: UserCommand,
) -> Option<UserCommand> {
    let quitting = on_yes == UserCommand::Quit;
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            view_state.cancel_input();
            Some(on_yes)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') if quitting => Some(on_yes),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.cancel_input();
            None
        }
        _ => None,
    }
}

/// Handle key events while typing into the input line.
fn handle_text_entry(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.cancel_input();
            None
        }
        KeyCode::Backspace => {
            view_state.input_text.pop();
            None
        }
        KeyCode::Char(c) => {
            view_state.input_text.push(c);
            None
        }
        KeyCode::Enter => submit_text(view_state),
        _ => None,
    }
}

/// Turn the typed text into a command for the current entry mode.
fn submit_text(view_state: &mut ViewState) -> Option<UserCommand> {
    let mode = view_state.input_mode;
    let text = std::mem::take(&mut view_state.input_text);
    let text = text.trim();

    // Registration stays open for the next guest.
    if mode != InputMode::AddName || !view_state.is_registration_only() {
        view_state.input_mode = InputMode::Normal;
    }

    if text.is_empty() {
        return None;
    }

    match mode {
        InputMode::AddName => Some(UserCommand::Register(text.to_string())),
        InputMode::AddTier => {
            let (name, count) = parse_tier_input(text);
            Some(UserCommand::AddTier { name, count })
        }
        InputMode::ExportPath => Some(UserCommand::ExportWinners(PathBuf::from(text))),
        InputMode::ImportPath => Some(UserCommand::ImportRoster(PathBuf::from(text))),
        _ => None,
    }
}

/// Split "Gold 3" into ("Gold", 3). Without a trailing count the whole text
/// is the name and the count is 1.
pub fn parse_tier_input(text: &str) -> (String, u32) {
    let text = text.trim();
    if let Some((name, last)) = text.rsplit_once(char::is_whitespace) {
        if let Ok(count) = last.parse::<u32>() {
            let name = name.trim();
            if !name.is_empty() {
                return (name.to_string(), count);
            }
        }
    }
    (text.to_string(), 1)
}

/// Registration kiosk: every printable key goes to the name field.
fn handle_kiosk(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.input_mode = InputMode::ConfirmQuit;
            None
        }
        KeyCode::Char(_) | KeyCode::Backspace | KeyCode::Enter => {
            view_state.input_mode = InputMode::AddName;
            handle_text_entry(key_event, view_state)
        }
        _ => None,
    }
}

fn handle_operator(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char(' ') => match view_state.phase() {
            DrawPhase::Idle => Some(UserCommand::StartDraw),
            DrawPhase::Rolling => Some(UserCommand::StopDraw),
            DrawPhase::AwaitingConfirmation(_) => None,
        },
        KeyCode::Enter => match view_state.phase() {
            DrawPhase::AwaitingConfirmation(_) => Some(UserCommand::ConfirmWinner),
            _ => None,
        },
        KeyCode::Char('a') => {
            view_state.begin_input(InputMode::AddName, "");
            None
        }
        KeyCode::Char('p') => {
            view_state.begin_input(InputMode::AddTier, "");
            None
        }
        KeyCode::Char('x') => active_tier_id(view_state).map(UserCommand::RemoveTier),
        KeyCode::Left => cycle_tier(view_state, false),
        KeyCode::Right => cycle_tier(view_state, true),
        KeyCode::Char('m') => {
            let audio = current_audio(view_state);
            Some(UserCommand::SetAudio(AudioSettings {
                enabled: !audio.enabled,
                ..audio
            }))
        }
        KeyCode::Char('+') | KeyCode::Char('=') => step_volume(view_state, VOLUME_STEP),
        KeyCode::Char('-') => step_volume(view_state, -VOLUME_STEP),
        KeyCode::Char('e') => {
            view_state.begin_input(InputMode::ExportPath, DEFAULT_EXPORT_PATH);
            None
        }
        KeyCode::Char('i') => {
            view_state.begin_input(InputMode::ImportPath, "");
            None
        }
        KeyCode::Char('R') => {
            view_state.input_mode = InputMode::ConfirmReset;
            None
        }
        KeyCode::Char('r') => Some(UserCommand::Reload),
        KeyCode::Char('q') | KeyCode::Esc => {
            view_state.input_mode = InputMode::ConfirmQuit;
            None
        }
        _ => None,
    }
}

fn current_audio(view_state: &ViewState) -> AudioSettings {
    view_state
        .snapshot
        .as_ref()
        .map(|s| s.audio)
        .unwrap_or_default()
}

fn step_volume(view_state: &ViewState, delta: f64) -> Option<UserCommand> {
    let audio = current_audio(view_state);
    let volume = ((audio.volume + delta) * 10.0).round() / 10.0;
    Some(UserCommand::SetAudio(
        AudioSettings { volume, ..audio }.clamped(),
    ))
}

/// Id of the pool entry whose name matches the active tier.
fn active_tier_id(view_state: &ViewState) -> Option<String> {
    let snapshot = view_state.snapshot.as_ref()?;
    snapshot
        .prizes
        .iter()
        .find(|t| t.name == snapshot.active_tier_name)
        .map(|t| t.id.clone())
}

/// Select the next or previous tier with budget left, wrapping around.
fn cycle_tier(view_state: &ViewState, forward: bool) -> Option<UserCommand> {
    let snapshot = view_state.snapshot.as_ref()?;
    let tiers = &snapshot.active_tiers;
    if tiers.is_empty() {
        return None;
    }
    let next = match tiers.iter().position(|t| *t == snapshot.active_tier_name) {
        Some(i) if forward => (i + 1) % tiers.len(),
        Some(i) => (i + tiers.len() - 1) % tiers.len(),
        None => 0,
    };
    Some(UserCommand::SelectTier(tiers[next].clone()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
