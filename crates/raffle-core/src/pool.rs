// Prize pool queries and administrative edits.

use std::collections::HashSet;

use crate::error::RaffleError;
use crate::model::PrizeTier;

/// Tiers that still have budget, in pool order.
pub fn active_tiers(pool: &[PrizeTier]) -> Vec<&PrizeTier> {
    pool.iter().filter(|t| t.is_available()).collect()
}

/// Position of the tier named `name`, if any.
pub fn position_of(pool: &[PrizeTier], name: &str) -> Option<usize> {
    pool.iter().position(|t| t.name == name)
}

/// Look up a tier by name.
pub fn find<'a>(pool: &'a [PrizeTier], name: &str) -> Option<&'a PrizeTier> {
    pool.iter().find(|t| t.name == name)
}

/// Check that every tier has a non-empty name and that names are unique.
///
/// Tier names double as keys for the active-tier selector and winner
/// records, so two tiers with the same name could never be told apart.
/// Names are compared after trimming.
pub fn validate(pool: &[PrizeTier]) -> Result<(), RaffleError> {
    let mut seen = HashSet::new();
    for tier in pool {
        let name = tier.name.trim();
        if name.is_empty() {
            return Err(RaffleError::EmptyTierName);
        }
        if !seen.insert(name) {
            return Err(RaffleError::DuplicateTierName(name.to_string()));
        }
    }
    Ok(())
}

/// Trim every tier name in place.
pub fn trim_names(pool: &mut [PrizeTier]) {
    for tier in pool {
        let trimmed = tier.name.trim();
        if trimmed.len() != tier.name.len() {
            tier.name = trimmed.to_string();
        }
    }
}

/// Build a new pool with a tier named `name` (trimmed) appended. `count` is
/// raised to at least one.
///
/// Only the new name is checked against the existing tiers; duplicates
/// already present in an older pool are left alone.
pub fn with_added_tier(pool: &[PrizeTier], name: &str, count: u32) -> Result<Vec<PrizeTier>, RaffleError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RaffleError::EmptyTierName);
    }
    if pool.iter().any(|t| t.name.trim() == name) {
        return Err(RaffleError::DuplicateTierName(name.to_string()));
    }
    let mut next = pool.to_vec();
    next.push(PrizeTier::new(name, count.max(1)));
    Ok(next)
}

/// Build a new pool without the tier whose id is `id`. Returns `None` when no
/// tier has that id.
pub fn without_tier(pool: &[PrizeTier], id: &str) -> Option<Vec<PrizeTier>> {
    if !pool.iter().any(|t| t.id == id) {
        return None;
    }
    Some(pool.iter().filter(|t| t.id != id).cloned().collect())
}
