// TUI widget modules for each dashboard panel.

pub mod confirm;
pub mod lists;
pub mod registration;
pub mod stage;
pub mod status_bar;
