//! Checklist of extracted components.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::domain::model::{Fragment, component_label};

#[derive(Debug, Clone)]
struct ChecklistRow {
    label: String,
    kind: &'static str,
    headline: String,
    checked: bool,
}

/// Marks and cursor position for the component checklist.
#[derive(Debug, Default, Clone)]
pub struct ChecklistState {
    rows: Vec<ChecklistRow>,
    cursor: usize,
}

impl ChecklistState {
    pub fn from_fragments(fragments: &[Fragment]) -> Self {
        let rows = fragments
            .iter()
            .enumerate()
            .map(|(index, fragment)| ChecklistRow {
                label: component_label(index),
                kind: fragment.kind.as_str(),
                headline: fragment.headline().to_string(),
                checked: false,
            })
            .collect();
        Self { rows, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn select_next(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Flip the mark on the row under the cursor, returning its new state.
    pub fn toggle_current(&mut self) -> Option<bool> {
        let row = self.rows.get_mut(self.cursor)?;
        row.checked = !row.checked;
        Some(row.checked)
    }

    pub fn check_all(&mut self) {
        self.rows.iter_mut().for_each(|row| row.checked = true);
    }

    pub fn clear(&mut self) {
        self.rows.iter_mut().for_each(|row| row.checked = false);
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.rows.get(index).is_some_and(|row| row.checked)
    }

    /// Checked rows in display order.
    pub fn checked_indices(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.checked)
            .map(|(index, _)| index)
            .collect()
    }
}

/// Renders the checklist with the cursor row highlighted.
#[derive(Debug, Default)]
pub struct Checklist;

impl Checklist {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &ChecklistState, focused: bool) {
        let checked = state.checked_indices().len();
        let block = Block::default()
            .title(format!("Components ({checked}/{})", state.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused {
                Color::Cyan
            } else {
                Color::DarkGray
            }));

        if state.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let placeholder = Paragraph::new("No sections, tables or figures found")
                .style(
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(placeholder, inner);
            return;
        }

        let items: Vec<ListItem<'_>> = state.rows.iter().map(row_item).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Rgb(32, 52, 70)))
            .highlight_symbol("› ");
        let mut list_state = ListState::default().with_selected(Some(state.cursor));
        frame.render_stateful_widget(list, area, &mut list_state);
    }
}

fn row_item(row: &ChecklistRow) -> ListItem<'_> {
    let (mark, mark_style) = if row.checked {
        ("[x] ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        ("[ ] ", Style::default().fg(Color::DarkGray))
    };
    ListItem::new(Line::from(vec![
        Span::styled(mark, mark_style),
        Span::raw(row.label.as_str()),
        Span::styled(format!("  {} ", row.kind), Style::default().fg(Color::Yellow)),
        Span::styled(row.headline.as_str(), Style::default().fg(Color::Gray)),
    ]))
}
