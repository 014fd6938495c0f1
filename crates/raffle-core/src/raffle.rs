// The raffle context: one in-memory mirror of the durable snapshot plus the
// local draw phase, exposed through the operations presentation may call.
//
// Every mutation follows the same path: validate against the mirror, merge
// the changed fields into the latest durable snapshot, then tell sibling
// contexts to reload. A failed write keeps the in-memory effect and marks
// the context as degraded until the next successful write.

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use crate::advance::{self, Advancement};
use crate::draw::{self, DrawPhase};
use crate::error::RaffleError;
use crate::model::{AudioSettings, Participant, PrizeTier, Snapshot, SnapshotPatch, Winner};
use crate::notifier::{new_context_id, Notifier, SyncSignal};
use crate::pool;
use crate::roster;
use crate::store::SnapshotStore;

/// Selector label used when no tier has ever been configured.
pub const DEFAULT_FALLBACK_TIER: &str = "Grand Prize";

/// Selector label once every tier has been drawn out.
pub const DEFAULT_EXHAUSTED_LABEL: &str = "All prizes drawn";

/// Fixed labels shown in place of a real tier name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub fallback_tier: String,
    pub exhausted: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            fallback_tier: DEFAULT_FALLBACK_TIER.to_string(),
            exhausted: DEFAULT_EXHAUSTED_LABEL.to_string(),
        }
    }
}

/// What a context is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Full control: roster, prizes, draws, reset.
    Operator,
    /// Self-service sign-up: may only register participants.
    RegistrationOnly,
}

/// One raffle context.
pub struct Raffle {
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    context_id: String,
    mode: AccessMode,
    labels: Labels,
    mirror: Snapshot,
    phase: DrawPhase,
    degraded: bool,
}

impl Raffle {
    /// Create a context and load the current durable snapshot.
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
        mode: AccessMode,
        labels: Labels,
    ) -> Self {
        let mut raffle = Raffle {
            store,
            notifier,
            context_id: new_context_id(),
            mode,
            labels,
            mirror: Snapshot::default(),
            phase: DrawPhase::Idle,
            degraded: false,
        };
        raffle.reload();
        raffle
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn phase(&self) -> &DrawPhase {
        &self.phase
    }

    /// The winner drawn but not yet confirmed, if any.
    pub fn pending_winner(&self) -> Option<&Winner> {
        self.phase.pending_winner()
    }

    /// The in-memory mirror of the durable snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.mirror
    }

    /// Whether the last store access failed.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// A handle to the notifier, for wiring up a subscription.
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn list_roster(&self) -> &[Participant] {
        &self.mirror.participants
    }

    /// Winner history, most recent first.
    pub fn list_winners(&self) -> &[Winner] {
        &self.mirror.winners
    }

    /// The whole pool, exhausted tiers included.
    pub fn prize_pool(&self) -> &[PrizeTier] {
        &self.mirror.prizes
    }

    /// Tiers with budget left, in pool order.
    pub fn list_active_tiers(&self) -> Vec<&PrizeTier> {
        pool::active_tiers(&self.mirror.prizes)
    }

    /// The selector value: the stored name, else the first tier, else the
    /// fallback label.
    pub fn active_tier_name(&self) -> String {
        if let Some(name) = &self.mirror.active_tier_name {
            return name.clone();
        }
        self.mirror
            .prizes
            .first()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| self.labels.fallback_tier.clone())
    }

    pub fn audio_settings(&self) -> AudioSettings {
        self.mirror.audio_settings
    }

    /// Re-read the durable snapshot into the mirror. Returns `true` if the
    /// mirror changed. The local draw phase is left alone.
    pub fn reload(&mut self) -> bool {
        match self.store.load() {
            Ok(latest) => {
                self.degraded = false;
                if latest == self.mirror {
                    false
                } else {
                    self.mirror = latest;
                    true
                }
            }
            Err(e) => {
                warn!("Failed to reload snapshot, keeping in-memory state: {}", e);
                self.degraded = true;
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    /// Register a participant. Returns `false` for an empty or duplicate
    /// name.
    pub fn register_participant(&mut self, raw_name: &str) -> bool {
        self.try_register(raw_name).is_ok()
    }

    /// Register a participant, saying why on failure.
    ///
    /// The uniqueness check runs against a fresh read of the durable roster
    /// so that a sibling's recent registration is not overwritten.
    pub fn try_register(&mut self, raw_name: &str) -> Result<Participant, RaffleError> {
        let mut latest = self.latest_snapshot().participants;
        let participant = roster::register(&mut latest, raw_name)?;
        info!("Registered participant '{}' ({})", participant.name, participant.id);
        self.persist(SnapshotPatch {
            participants: Some(latest),
            ..SnapshotPatch::default()
        });
        Ok(participant)
    }

    // ------------------------------------------------------------------
    // Prize pool
    // ------------------------------------------------------------------

    /// Point the next draw at `name`. No check that the tier exists or has
    /// budget; the operator may override freely.
    pub fn set_active_tier(&mut self, name: &str) -> Result<(), RaffleError> {
        self.require_operator()?;
        info!("Active tier set to '{}'", name);
        self.persist(SnapshotPatch {
            active_tier_name: Some(name.to_string()),
            ..SnapshotPatch::default()
        });
        Ok(())
    }

    /// Replace the whole pool. Tier names are trimmed and must be non-empty
    /// and unique.
    pub fn edit_prize_pool(&mut self, mut new_pool: Vec<PrizeTier>) -> Result<(), RaffleError> {
        self.require_operator()?;
        pool::trim_names(&mut new_pool);
        pool::validate(&new_pool)?;
        info!("Prize pool replaced ({} tiers)", new_pool.len());
        self.persist(SnapshotPatch {
            prizes: Some(new_pool),
            ..SnapshotPatch::default()
        });
        Ok(())
    }

    /// Append a tier to the end of the pool.
    pub fn add_tier(&mut self, name: &str, count: u32) -> Result<PrizeTier, RaffleError> {
        self.require_operator()?;
        let next = pool::with_added_tier(&self.latest_snapshot().prizes, name, count)?;
        let added = next.last().cloned().ok_or(RaffleError::EmptyTierName)?;
        info!("Added tier '{}' x{}", added.name, added.remaining_count);
        self.persist(SnapshotPatch {
            prizes: Some(next),
            ..SnapshotPatch::default()
        });
        Ok(added)
    }

    /// Delete the tier with `id`. Returns `false` when there is no such tier.
    pub fn remove_tier(&mut self, id: &str) -> Result<bool, RaffleError> {
        self.require_operator()?;
        let Some(next) = pool::without_tier(&self.latest_snapshot().prizes, id) else {
            return Ok(false);
        };
        info!("Removed tier {}", id);
        self.persist(SnapshotPatch {
            prizes: Some(next),
            ..SnapshotPatch::default()
        });
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Draw
    // ------------------------------------------------------------------

    /// Begin rolling. No winner is chosen until [`Raffle::stop_draw`].
    pub fn start_draw(&mut self) -> Result<(), RaffleError> {
        self.require_operator()?;
        draw::check_can_start(
            &self.phase,
            &self.mirror.participants,
            &self.mirror.prizes,
            &self.active_tier_name(),
        )?;
        info!("Draw started for '{}'", self.active_tier_name());
        self.phase = DrawPhase::Rolling;
        Ok(())
    }

    /// Stop rolling and draw a winner using the thread-local RNG.
    pub fn stop_draw(&mut self) -> Result<Winner, RaffleError> {
        self.stop_draw_with(&mut rand::thread_rng())
    }

    /// Stop rolling and draw a winner using `rng`.
    ///
    /// The pick is made from the roster on screen. The winner is then
    /// removed by id from a fresh read of the durable roster and prepended
    /// to the durable history, so registrations saved by siblings since the
    /// last reload survive. If the on-screen pick is already gone from the
    /// durable roster, the pick is redone over the durable roster.
    pub fn stop_draw_with<R: Rng>(&mut self, rng: &mut R) -> Result<Winner, RaffleError> {
        self.require_operator()?;
        if self.phase != DrawPhase::Rolling {
            return Err(RaffleError::NotRolling);
        }

        let latest = self.latest_snapshot();
        let prize_name = self.active_tier_name();
        let timestamp = draw::winner_timestamp(
            chrono::Utc::now().timestamp_millis(),
            &latest.winners,
        );

        let mut participants = latest.participants;
        let mut on_screen = self.mirror.participants.clone();
        let picked = draw::pick_winner(&mut on_screen, &prize_name, timestamp, rng)
            .filter(|w| participants.iter().any(|p| p.id == w.id));
        let winner = match picked {
            Some(winner) => {
                participants.retain(|p| p.id != winner.id);
                winner
            }
            None => match draw::pick_winner(&mut participants, &prize_name, timestamp, rng) {
                Some(winner) => winner,
                None => {
                    // A sibling emptied the roster while we were rolling.
                    self.mirror.participants.clear();
                    self.phase = DrawPhase::Idle;
                    return Err(RaffleError::EmptyRoster);
                }
            },
        };

        let mut winners = Vec::with_capacity(latest.winners.len() + 1);
        winners.push(winner.clone());
        winners.extend(latest.winners);

        info!("Drew '{}' for '{}'", winner.name, winner.prize_name);
        self.persist(SnapshotPatch {
            participants: Some(participants),
            winners: Some(winners),
            ..SnapshotPatch::default()
        });
        self.phase = DrawPhase::AwaitingConfirmation(winner.clone());
        Ok(winner)
    }

    /// Accept the pending winner: spend one unit of the active tier and move
    /// the selector on if the tier ran out.
    pub fn confirm_winner(&mut self) -> Result<Advancement, RaffleError> {
        self.require_operator()?;
        if self.phase.pending_winner().is_none() {
            return Err(RaffleError::NoPendingWinner);
        }
        self.phase = DrawPhase::Idle;

        let active = self.active_tier_name();
        let mut prizes = self.latest_snapshot().prizes;
        let advancement = advance::advance(&mut prizes, &active);
        if advancement == Advancement::TierMissing {
            warn!("Active tier '{}' vanished before confirmation; budget untouched", active);
            return Ok(advancement);
        }

        let next_active = advancement
            .next_active(&self.labels.exhausted)
            .unwrap_or(active);
        info!("Winner confirmed: {:?}", advancement);
        self.persist(SnapshotPatch {
            prizes: Some(prizes),
            active_tier_name: Some(next_active),
            ..SnapshotPatch::default()
        });
        Ok(advancement)
    }

    // ------------------------------------------------------------------
    // Settings and reset
    // ------------------------------------------------------------------

    /// Store new audio preferences (volume clamped to `[0, 1]`).
    pub fn set_audio_settings(&mut self, settings: AudioSettings) -> Result<AudioSettings, RaffleError> {
        self.require_operator()?;
        let settings = settings.clamped();
        self.persist(SnapshotPatch {
            audio_settings: Some(settings),
            ..SnapshotPatch::default()
        });
        Ok(settings)
    }

    /// Erase everything: roster, winners, prizes, selector, settings.
    pub fn full_reset(&mut self) -> Result<(), RaffleError> {
        self.require_operator()?;
        warn!("Full reset requested by {}", self.context_id);
        self.mirror = Snapshot::default();
        self.phase = DrawPhase::Idle;
        match self.store.clear() {
            Ok(()) => {
                self.degraded = false;
                self.notify();
            }
            Err(e) => {
                warn!("Failed to clear durable snapshot: {}", e);
                self.degraded = true;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Fail with [`RaffleError::OperatorOnly`] in a registration-only
    /// context.
    pub fn require_operator(&self) -> Result<(), RaffleError> {
        match self.mode {
            AccessMode::Operator => Ok(()),
            AccessMode::RegistrationOnly => Err(RaffleError::OperatorOnly),
        }
    }

    /// Fresh read of the durable snapshot, or the mirror if the store
    /// cannot be read.
    fn latest_snapshot(&mut self) -> Snapshot {
        match self.store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Snapshot re-read failed, using local copy: {}", e);
                self.degraded = true;
                self.mirror.clone()
            }
        }
    }

    /// Merge `patch` into the durable snapshot and broadcast the change. On
    /// failure the patch is applied to the mirror only.
    fn persist(&mut self, patch: SnapshotPatch) {
        match self.store.merge(patch.clone()) {
            Ok(merged) => {
                self.mirror = merged;
                self.degraded = false;
                self.notify();
            }
            Err(e) => {
                warn!("Snapshot write failed, change kept in memory only: {}", e);
                patch.apply_to(&mut self.mirror);
                self.degraded = true;
            }
        }
    }

    fn notify(&self) {
        self.notifier
            .publish(SyncSignal::state_changed(&self.context_id));
    }
}
