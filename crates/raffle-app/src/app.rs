// Context orchestrator: owns the raffle context and runs the event loop
// that ties user commands, sync signals and the poll timer together.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use raffle_core::advance::Advancement;
use raffle_core::error::RaffleError;
use raffle_core::notifier::SyncSignal;
use raffle_core::raffle::Raffle;

use crate::protocol::{AppSnapshot, UiUpdate, UserCommand};
use crate::transfer;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Everything the event loop owns.
pub struct AppState {
    pub raffle: Raffle,
    /// Event title shown by presentation.
    pub title: String,
}

impl AppState {
    pub fn new(raffle: Raffle, title: impl Into<String>) -> Self {
        AppState {
            raffle,
            title: title.into(),
        }
    }

    /// Build a read-only projection for presentation.
    pub fn build_snapshot(&self) -> AppSnapshot {
        let r = &self.raffle;
        AppSnapshot {
            title: self.title.clone(),
            mode: r.mode(),
            roster: r.list_roster().to_vec(),
            winners: r.list_winners().to_vec(),
            prizes: r.prize_pool().to_vec(),
            active_tiers: r.list_active_tiers().iter().map(|t| t.name.clone()).collect(),
            active_tier_name: r.active_tier_name(),
            phase: r.phase().clone(),
            audio: r.audio_settings(),
            degraded: r.is_degraded(),
        }
    }

    /// Apply one command and return the updates presentation should see.
    /// Every command ends with a fresh snapshot.
    pub fn handle_command(&mut self, cmd: UserCommand) -> Vec<UiUpdate> {
        let mut updates = Vec::new();
        let outcome: Result<Option<UiUpdate>, String> = match cmd {
            UserCommand::Register(name) => self
                .raffle
                .try_register(&name)
                .map(|p| Some(UiUpdate::Notice(format!("Welcome, {}!", p.name))))
                .map_err(|e| e.to_string()),
            UserCommand::StartDraw => self.raffle.start_draw().map(|_| None).map_err(|e| e.to_string()),
            UserCommand::StopDraw => self
                .raffle
                .stop_draw()
                .map(|w| Some(UiUpdate::WinnerDrawn(w)))
                .map_err(|e| e.to_string()),
            UserCommand::ConfirmWinner => self
                .raffle
                .confirm_winner()
                .map(|adv| Some(UiUpdate::Notice(describe_advancement(&adv))))
                .map_err(|e| e.to_string()),
            UserCommand::SelectTier(name) => self
                .raffle
                .set_active_tier(&name)
                .map(|_| None)
                .map_err(|e| e.to_string()),
            UserCommand::AddTier { name, count } => self
                .raffle
                .add_tier(&name, count)
                .map(|t| Some(UiUpdate::Notice(format!("Added {} x{}", t.name, t.remaining_count))))
                .map_err(|e| e.to_string()),
            UserCommand::RemoveTier(id) => match self.raffle.remove_tier(&id) {
                Ok(true) => Ok(None),
                Ok(false) => Err("That prize tier no longer exists".to_string()),
                Err(e) => Err(e.to_string()),
            },
            UserCommand::ReplacePool(pool) => self
                .raffle
                .edit_prize_pool(pool)
                .map(|_| None)
                .map_err(|e| e.to_string()),
            UserCommand::SetAudio(settings) => self
                .raffle
                .set_audio_settings(settings)
                .map(|_| None)
                .map_err(|e| e.to_string()),
            UserCommand::ExportWinners(path) => self.export_winners(&path),
            UserCommand::ImportRoster(path) => self.import_roster(&path),
            UserCommand::FullReset => self
                .raffle
                .full_reset()
                .map(|_| Some(UiUpdate::Notice("All raffle data cleared".into())))
                .map_err(|e| e.to_string()),
            UserCommand::Reload => {
                self.raffle.reload();
                Ok(None)
            }
            UserCommand::Quit => Ok(None),
        };

        match outcome {
            Ok(Some(update)) => updates.push(update),
            Ok(None) => {}
            Err(message) => {
                debug!("Command rejected: {}", message);
                updates.push(UiUpdate::Rejected(message));
            }
        }
        updates.push(UiUpdate::Snapshot(Box::new(self.build_snapshot())));
        updates
    }

    fn export_winners(&self, path: &std::path::Path) -> Result<Option<UiUpdate>, String> {
        self.raffle.require_operator().map_err(|e| e.to_string())?;
        let count = transfer::export_winners(path, self.raffle.list_winners()).map_err(|e| {
            warn!("Winner export failed: {}", e);
            e.to_string()
        })?;
        info!("Exported {} winners to {}", count, path.display());
        Ok(Some(UiUpdate::Notice(format!(
            "Exported {count} winners to {}",
            path.display()
        ))))
    }

    fn import_roster(&mut self, path: &std::path::Path) -> Result<Option<UiUpdate>, String> {
        self.raffle.require_operator().map_err(|e| e.to_string())?;
        let names = transfer::import_roster(path).map_err(|e| {
            warn!("Roster import failed: {}", e);
            e.to_string()
        })?;

        let mut added = 0;
        let mut skipped = Vec::new();
        for name in &names {
            match self.raffle.try_register(name) {
                Ok(_) => added += 1,
                Err(RaffleError::DuplicateName(n)) => skipped.push(n),
                Err(RaffleError::EmptyName) => {}
                Err(e) => return Err(e.to_string()),
            }
        }
        info!(
            "Imported roster from {}: {} added, {} skipped",
            path.display(),
            added,
            skipped.len()
        );
        Ok(Some(UiUpdate::Notice(import_summary(added, &skipped))))
    }

    /// Re-read the durable snapshot; returns a snapshot update if anything
    /// changed.
    pub fn refresh(&mut self) -> Option<UiUpdate> {
        if self.raffle.reload() {
            Some(UiUpdate::Snapshot(Box::new(self.build_snapshot())))
        } else {
            None
        }
    }
}

/// Names listed in an import summary before truncating.
const MAX_LISTED_SKIPS: usize = 3;

/// "Imported 2 participants; already registered: Ann, Bob"
fn import_summary(added: usize, skipped: &[String]) -> String {
    if skipped.is_empty() {
        return format!("Imported {added} participants");
    }
    let mut listed = skipped[..skipped.len().min(MAX_LISTED_SKIPS)].join(", ");
    if skipped.len() > MAX_LISTED_SKIPS {
        listed.push_str(&format!(" and {} more", skipped.len() - MAX_LISTED_SKIPS));
    }
    format!("Imported {added} participants; already registered: {listed}")
}

/// User-facing text for what a confirmation did to the tier selector.
fn describe_advancement(adv: &Advancement) -> String {
    match adv {
        Advancement::TierMissing => "That prize tier was removed; nothing was deducted".to_string(),
        Advancement::Stayed { tier, remaining } => format!("{tier}: {remaining} left"),
        Advancement::Advanced { from, to } => format!("{from} is drawn out; next up: {to}"),
        Advancement::AllDrawn { from } => format!("{from} is drawn out; all prizes drawn"),
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Wait for the next sync signal, or forever if there is no subscription.
async fn next_signal(
    rx: &mut Option<broadcast::Receiver<SyncSignal>>,
) -> Result<SyncSignal, RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Run the context event loop.
///
/// Listens with `tokio::select!` on:
/// 1. User commands from presentation
/// 2. Sync signals from sibling contexts
/// 3. The poll timer, which reloads the store even without signals
///
/// Pushes UI updates through `ui_tx`. Exits on `Quit` or when the command
/// channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
    poll_interval: Duration,
) -> anyhow::Result<()> {
    info!("Context {} event loop started", state.raffle.context_id());

    let mut sync_rx = state.raffle.notifier().subscribe();
    let mut sync_open = sync_rx.is_some();
    if !sync_open {
        info!("No sync transport; relying on polling every {:?}", poll_interval);
    }

    let mut poll = tokio::time::interval(poll_interval);
    // The first tick completes immediately; consume it so the first real
    // poll happens after one full interval.
    poll.tick().await;

    let _ = ui_tx
        .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
        .await;

    loop {
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        for update in state.handle_command(cmd) {
                            let _ = ui_tx.send(update).await;
                        }
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Sync signals (only while the transport is up) ---
            signal = next_signal(&mut sync_rx), if sync_open => {
                match signal {
                    Ok(sig) if sig.origin() == state.raffle.context_id() => {}
                    Ok(sig) => {
                        debug!("Sync signal from {}", sig.origin());
                        if let Some(update) = state.refresh() {
                            let _ = ui_tx.send(update).await;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!("Missed {} sync signals, reloading", n);
                        if let Some(update) = state.refresh() {
                            let _ = ui_tx.send(update).await;
                        }
                    }
                    Err(RecvError::Closed) => {
                        warn!("Sync channel closed; relying on polling");
                        sync_open = false;
                    }
                }
            }

            // --- Poll timer ---
            _ = poll.tick() => {
                if let Some(update) = state.refresh() {
                    debug!("Poll picked up external changes");
                    let _ = ui_tx.send(update).await;
                }
            }
        }
    }

    info!("Context event loop exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use raffle_core::draw::DrawPhase;
    use raffle_core::model::PrizeTier;
    use raffle_core::notifier::NullNotifier;
    use raffle_core::raffle::{AccessMode, Labels};
    use raffle_core::store::MemoryStore;

    fn test_state(mode: AccessMode) -> AppState {
        let raffle = Raffle::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NullNotifier),
            mode,
            Labels::default(),
        );
        AppState::new(raffle, "Test Party")
    }

    fn last_snapshot(updates: &[UiUpdate]) -> &AppSnapshot {
        match updates.last() {
            Some(UiUpdate::Snapshot(s)) => s,
            other => panic!("expected trailing snapshot, got {other:?}"),
        }
    }

    #[test]
    fn every_command_ends_with_snapshot() {
        let mut state = test_state(AccessMode::Operator);
        let updates = state.handle_command(UserCommand::Register("Alice".into()));
        assert_eq!(updates.len(), 2);
        assert!(matches!(&updates[0], UiUpdate::Notice(n) if n.contains("Alice")));
        assert_eq!(last_snapshot(&updates).roster.len(), 1);
        assert_eq!(last_snapshot(&updates).title, "Test Party");
    }

    #[test]
    fn rejected_command_reports_reason() {
        let mut state = test_state(AccessMode::Operator);
        let updates = state.handle_command(UserCommand::StartDraw);
        assert_eq!(
            updates[0],
            UiUpdate::Rejected(RaffleError::EmptyRoster.to_string())
        );
        assert!(last_snapshot(&updates).phase.is_idle());
    }

    #[test]
    fn draw_cycle_through_commands() {
        let mut state = test_state(AccessMode::Operator);
        state.handle_command(UserCommand::Register("Alice".into()));
        state.handle_command(UserCommand::AddTier { name: "Gold".into(), count: 1 });

        let updates = state.handle_command(UserCommand::StartDraw);
        assert_eq!(last_snapshot(&updates).phase, DrawPhase::Rolling);

        let updates = state.handle_command(UserCommand::StopDraw);
        match &updates[0] {
            UiUpdate::WinnerDrawn(w) => assert_eq!(w.name, "Alice"),
            other => panic!("expected WinnerDrawn, got {other:?}"),
        }

        let updates = state.handle_command(UserCommand::ConfirmWinner);
        assert!(matches!(&updates[0], UiUpdate::Notice(n) if n.contains("all prizes drawn")));
        let snap = last_snapshot(&updates);
        assert!(snap.active_tiers.is_empty());
        assert_eq!(snap.active_tier_name, "All prizes drawn");
        assert_eq!(snap.winners.len(), 1);
    }

    #[test]
    fn removing_unknown_tier_is_rejected() {
        let mut state = test_state(AccessMode::Operator);
        let updates = state.handle_command(UserCommand::RemoveTier("missing".into()));
        assert!(matches!(&updates[0], UiUpdate::Rejected(_)));
    }

    #[test]
    fn replace_pool_updates_snapshot() {
        let mut state = test_state(AccessMode::Operator);
        let updates = state.handle_command(UserCommand::ReplacePool(vec![
            PrizeTier::new("A", 0),
            PrizeTier::new("B", 2),
        ]));
        let snap = last_snapshot(&updates);
        assert_eq!(snap.prizes.len(), 2);
        assert_eq!(snap.active_tiers, vec!["B"]);
    }

    #[test]
    fn registration_only_cannot_export() {
        let mut state = test_state(AccessMode::RegistrationOnly);
        let path = std::env::temp_dir().join("raffle_should_not_exist.csv");
        let updates = state.handle_command(UserCommand::ExportWinners(path.clone()));
        assert_eq!(
            updates[0],
            UiUpdate::Rejected(RaffleError::OperatorOnly.to_string())
        );
        assert!(!path.exists());
    }

    #[test]
    fn import_summary_truncates_long_skip_lists() {
        assert_eq!(import_summary(4, &[]), "Imported 4 participants");
        let skipped: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            import_summary(0, &skipped),
            "Imported 0 participants; already registered: A, B, C and 2 more"
        );
    }

    #[test]
    fn import_skips_duplicates() {
        let dir = std::env::temp_dir().join(format!("raffle_app_import_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roster.csv");
        std::fs::write(&path, "name\nAlice\nBob\nAlice\n").unwrap();

        let mut state = test_state(AccessMode::Operator);
        let updates = state.handle_command(UserCommand::ImportRoster(path));
        assert_eq!(
            updates[0],
            UiUpdate::Notice("Imported 2 participants; already registered: Alice".into())
        );
        assert_eq!(last_snapshot(&updates).roster.len(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn event_loop_handles_quit_command() {
        let state = test_state(AccessMode::Operator);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);

        let handle = tokio::spawn(run(cmd_rx, ui_tx, state, Duration::from_secs(3)));

        // Initial snapshot arrives before any command.
        assert!(matches!(ui_rx.recv().await, Some(UiUpdate::Snapshot(_))));

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn event_loop_exits_when_command_channel_closes() {
        let state = test_state(AccessMode::Operator);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, _ui_rx) = mpsc::channel(64);

        let handle = tokio::spawn(run(cmd_rx, ui_tx, state, Duration::from_secs(3)));
        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }
}
