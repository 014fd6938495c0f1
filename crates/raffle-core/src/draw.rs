// Draw state machine: phases, start preconditions and winner selection.

use rand::Rng;

use crate::error::RaffleError;
use crate::model::{Participant, PrizeTier, Winner};
use crate::pool;
use crate::roster;

/// Where the local draw currently stands. Each context has its own phase;
/// it is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DrawPhase {
    #[default]
    Idle,
    /// Names are spinning on screen; no winner has been chosen yet.
    Rolling,
    /// A winner was drawn and recorded, waiting for the operator to confirm.
    AwaitingConfirmation(Winner),
}

impl DrawPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, DrawPhase::Idle)
    }

    pub fn pending_winner(&self) -> Option<&Winner> {
        match self {
            DrawPhase::AwaitingConfirmation(w) => Some(w),
            _ => None,
        }
    }
}

/// Check the preconditions for starting a draw, in order: nothing in
/// progress, someone to draw, some prize configured, and the active tier
/// present with budget left.
pub fn check_can_start(
    phase: &DrawPhase,
    roster: &[Participant],
    prizes: &[PrizeTier],
    active_tier: &str,
) -> Result<(), RaffleError> {
    if !phase.is_idle() {
        return Err(RaffleError::DrawInProgress);
    }
    if roster.is_empty() {
        return Err(RaffleError::EmptyRoster);
    }
    if prizes.is_empty() {
        return Err(RaffleError::EmptyPool);
    }
    match pool::find(prizes, active_tier) {
        Some(tier) if tier.is_available() => Ok(()),
        _ => Err(RaffleError::TierUnavailable(active_tier.to_string())),
    }
}

/// Timestamp for a new winner: `now_ms`, but never earlier than the newest
/// recorded winner so history stays ordered even if the clock steps back.
pub fn winner_timestamp(now_ms: i64, history: &[Winner]) -> i64 {
    history
        .first()
        .map(|latest| now_ms.max(latest.timestamp))
        .unwrap_or(now_ms)
}

/// Remove one participant chosen uniformly at random from `people` and
/// build their winner record for `prize_name`.
///
/// Returns `None` when the roster is empty.
pub fn pick_winner<R: Rng>(
    people: &mut Vec<Participant>,
    prize_name: &str,
    timestamp: i64,
    rng: &mut R,
) -> Option<Winner> {
    if people.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..people.len());
    let chosen = roster::take_at(people, index)?;
    Some(Winner {
        id: chosen.id,
        name: chosen.name,
        prize_name: prize_name.to_string(),
        timestamp,
    })
}
