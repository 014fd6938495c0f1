// Library root: exposes the terminal UI so the binary and tests share it.

pub mod tui;
