// Error types for raffle operations and persistence.

use thiserror::Error;

/// A rejected raffle operation. Every variant leaves state untouched and
/// carries a message suitable for showing to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaffleError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("'{0}' is already registered")]
    DuplicateName(String),

    #[error("a draw is already in progress")]
    DrawInProgress,

    #[error("no participants left to draw from")]
    EmptyRoster,

    #[error("no prize tiers have been configured")]
    EmptyPool,

    #[error("prize '{0}' has no winners left to draw; pick another tier")]
    TierUnavailable(String),

    #[error("no draw is rolling")]
    NotRolling,

    #[error("no winner is waiting for confirmation")]
    NoPendingWinner,

    #[error("prize tier name must not be empty")]
    EmptyTierName,

    #[error("prize tier '{0}' appears more than once")]
    DuplicateTierName(String),

    #[error("this action is only available to the operator")]
    OperatorOnly,
}

/// Failure reading or writing the durable snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}
