//! Pane showing the accumulated report text.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::infra::highlight::{HighlightResult, HighlightSpan};

#[derive(Debug, Clone, Default)]
enum PaneContent {
    #[default]
    Empty,
    Notice(String),
    Text(HighlightResult),
}

/// What the preview pane currently shows and how far it is scrolled.
#[derive(Debug, Clone, Default)]
pub struct PreviewPaneState {
    content: PaneContent,
    scroll: u16,
}

impl PreviewPaneState {
    /// Show highlighted report text, keeping the scroll position.
    pub fn show_text(&mut self, text: HighlightResult) {
        self.content = PaneContent::Text(text);
        self.clamp_scroll();
    }

    /// Replace the pane with a one-line notice.
    pub fn show_notice(&mut self, notice: impl Into<String>) {
        self.content = PaneContent::Notice(notice.into());
        self.scroll = 0;
    }

    pub fn notice(&self) -> Option<&str> {
        match &self.content {
            PaneContent::Notice(notice) => Some(notice),
            _ => None,
        }
    }

    pub fn line_count(&self) -> usize {
        match &self.content {
            PaneContent::Text(text) => text.lines.len(),
            _ => 0,
        }
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_by(&mut self, delta: i32) {
        self.scroll = (i32::from(self.scroll) + delta).clamp(0, i32::from(u16::MAX)) as u16;
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max = self.line_count().saturating_sub(1);
        self.scroll = self.scroll.min(u16::try_from(max).unwrap_or(u16::MAX));
    }
}

/// Renders the accumulated text with line numbers.
#[derive(Debug, Default)]
pub struct PreviewPane;

impl PreviewPane {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &PreviewPaneState, focused: bool) {
        let block = Block::default()
            .title("Report text")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused {
                Color::Cyan
            } else {
                Color::DarkGray
            }));

        let lines = match &state.content {
            PaneContent::Empty => vec![Line::styled(
                "Check components and press g to generate",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )],
            PaneContent::Notice(notice) => vec![Line::styled(
                notice.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )],
            PaneContent::Text(text) => text
                .lines
                .iter()
                .enumerate()
                .map(|(idx, line)| {
                    let mut spans = vec![Span::styled(
                        format!("{:>4} │ ", idx + 1),
                        Style::default().fg(Color::DarkGray),
                    )];
                    spans.extend(line.spans.iter().map(highlight_span_to_span));
                    Line::from(spans)
                })
                .collect(),
        };

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((state.scroll, 0));
        frame.render_widget(paragraph, area);
    }
}

fn highlight_span_to_span(span: &HighlightSpan) -> Span<'_> {
    let mut style = Style::default();
    if let Some(color) = span.style.foreground {
        style = style.fg(Color::Rgb(color.r, color.g, color.b));
    }
    if span.style.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if span.style.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    Span::styled(span.content.as_str(), style)
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn text(lines: &[&str]) -> HighlightResult {
        HighlightResult::plain(
            lines.iter().map(|line| line.to_string()).collect(),
            "test".into(),
        )
    }

    fn draw(state: &PreviewPaneState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(50, 6)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                PreviewPane.render(frame, area, state, false);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn notice_replaces_text() {
        let mut state = PreviewPaneState::default();
        state.show_text(text(&["\\section{A}"]));
        state.show_notice("No components selected!");

        assert_eq!(state.notice(), Some("No components selected!"));
        assert!(draw(&state).contains("No components selected!"));
    }

    #[test]
    fn renders_numbered_lines() {
        let mut state = PreviewPaneState::default();
        state.show_text(text(&["\\section{Intro}", "\\begin{table}"]));
        let rendered = draw(&state);
        assert!(rendered.contains("1 │ \\section{Intro}"));
        assert!(rendered.contains("2 │ \\begin{table}"));
    }

    #[test]
    fn scroll_is_clamped_to_content() {
        let mut state = PreviewPaneState::default();
        state.show_text(text(&["a", "b", "c"]));
        state.scroll_by(10);
        assert_eq!(state.scroll(), 2);
        state.scroll_by(-5);
        assert_eq!(state.scroll(), 0);

        state.show_notice("none");
        state.scroll_by(3);
        assert_eq!(state.scroll(), 0);
    }
}
