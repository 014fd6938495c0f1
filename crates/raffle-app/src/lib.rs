// Context orchestration on top of raffle-core: the event loop, the
// command/update protocol presentation speaks, and CSV transfer.

pub mod app;
pub mod protocol;
pub mod transfer;
