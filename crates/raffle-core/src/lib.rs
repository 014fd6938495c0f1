// Raffle engine: roster, prize pool, draw state machine, durable snapshot
// and cross-context sync.

pub mod advance;
pub mod config;
pub mod db;
pub mod draw;
pub mod error;
pub mod model;
pub mod notifier;
pub mod pool;
pub mod raffle;
pub mod roster;
pub mod store;
pub mod sync;
