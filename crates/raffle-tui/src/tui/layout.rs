// Screen layout: panel arrangement and sizing.
//
// Operator dashboard:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Stage (7 rows): spinning name / winner            |
// +----------------+----------------+----------------+
// | Roster (30%)   | Prizes (30%)   | Winners (40%)  |
// +----------------+----------------+----------------+
// | Input / message line (1 row)                      |
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    pub status_bar: Rect,
    pub stage: Rect,
    pub roster: Rect,
    pub prizes: Rect,
    pub winners: Rect,
    /// Text entry prompt, or the last notice/rejection.
    pub input_line: Rect,
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Length(7), // stage
            Constraint::Min(5),    // lists
            Constraint::Length(1), // input line
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(vertical[2]);

    AppLayout {
        status_bar: vertical[0],
        stage: vertical[1],
        roster: lists[0],
        prizes: lists[1],
        winners: lists[2],
        input_line: vertical[3],
        help_bar: vertical[4],
    }
}
