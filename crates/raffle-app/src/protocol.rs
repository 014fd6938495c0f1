// Messages exchanged between the context orchestrator and presentation.

use std::path::PathBuf;

use raffle_core::draw::DrawPhase;
use raffle_core::model::{AudioSettings, Participant, PrizeTier, Winner};
use raffle_core::raffle::AccessMode;

/// Requests from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Register(String),
    StartDraw,
    StopDraw,
    ConfirmWinner,
    SelectTier(String),
    AddTier { name: String, count: u32 },
    /// Remove the tier with this id.
    RemoveTier(String),
    ReplacePool(Vec<PrizeTier>),
    SetAudio(AudioSettings),
    ExportWinners(PathBuf),
    ImportRoster(PathBuf),
    FullReset,
    Reload,
    Quit,
}

/// Pushed from the orchestrator to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Full read-only view of the context.
    Snapshot(Box<AppSnapshot>),
    /// A command was refused; the text is user-facing.
    Rejected(String),
    /// Informational message (e.g. export finished, tier advanced).
    Notice(String),
    /// A draw just produced this winner.
    WinnerDrawn(Winner),
}

/// Everything presentation needs to render one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    pub title: String,
    pub mode: AccessMode,
    pub roster: Vec<Participant>,
    /// Most recent first.
    pub winners: Vec<Winner>,
    pub prizes: Vec<PrizeTier>,
    /// Names of tiers with budget left, in pool order.
    pub active_tiers: Vec<String>,
    pub active_tier_name: String,
    pub phase: DrawPhase,
    pub audio: AudioSettings,
    /// The last store access failed; changes may not be shared.
    pub degraded: bool,
}
