// Roster registration rules: trimmed, non-empty, unique names.

use crate::error::RaffleError;
use crate::model::Participant;

/// Trim `raw` and reject it if nothing is left.
pub fn normalize_name(raw: &str) -> Result<&str, RaffleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(RaffleError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

/// Whether a live participant already uses exactly this name.
pub fn contains_name(roster: &[Participant], name: &str) -> bool {
    roster.iter().any(|p| p.name == name)
}

/// Append a new participant named `raw` (trimmed) to `roster`.
///
/// Fails without touching `roster` when the trimmed name is empty or an
/// exact match of an existing participant. Returns a copy of the new entry.
pub fn register(roster: &mut Vec<Participant>, raw: &str) -> Result<Participant, RaffleError> {
    let name = normalize_name(raw)?;
    if contains_name(roster, name) {
        return Err(RaffleError::DuplicateName(name.to_string()));
    }
    let participant = Participant::new(name);
    roster.push(participant.clone());
    Ok(participant)
}

/// Remove the participant at `index`, returning it. `None` when the index is
/// out of range.
pub fn take_at(roster: &mut Vec<Participant>, index: usize) -> Option<Participant> {
    if index < roster.len() {
        Some(roster.remove(index))
    } else {
        None
    }
}
