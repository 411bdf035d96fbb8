//! Collection of reusable TUI components.

pub mod checklist;
pub mod preview;
pub mod prompt;
pub mod render;
