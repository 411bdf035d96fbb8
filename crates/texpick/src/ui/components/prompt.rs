//! Single-line input overlay used for the save prompt and the command palette.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// What the submitted input will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    SavePath,
    Command,
}

impl PromptMode {
    fn title(&self) -> &'static str {
        match self {
            PromptMode::SavePath => "Save report as (enter to save, esc to cancel)",
            PromptMode::Command => "Command Palette",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            PromptMode::SavePath => "",
            PromptMode::Command => ":",
        }
    }
}

/// Interactive state backing the prompt overlay.
#[derive(Debug, Default, Clone)]
pub struct PromptState {
    mode: Option<PromptMode>,
    input: String,
}

impl PromptState {
    /// Ask for a destination, prefilled with `default_name`.
    pub fn open_save(&mut self, default_name: impl Into<String>) {
        self.mode = Some(PromptMode::SavePath);
        self.input = default_name.into();
    }

    pub fn open_command(&mut self) {
        self.mode = Some(PromptMode::Command);
        self.input.clear();
    }

    pub fn close(&mut self) {
        self.mode = None;
    }

    pub fn mode(&self) -> Option<PromptMode> {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Consume the current input, leaving the buffer empty.
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }
}

/// Draws the prompt centred near the bottom of `area` when open.
#[derive(Debug, Default)]
pub struct Prompt;

impl Prompt {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &PromptState) {
        let Some(mode) = state.mode() else {
            return;
        };

        let width = area.width.saturating_sub(10).min(80);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + area.height.saturating_sub(5),
            width,
            height: 3.min(area.height),
        };
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(mode.title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let line = Line::from(vec![
            Span::styled(mode.prefix(), Style::default().fg(Color::Cyan)),
            Span::raw(state.input()),
            Span::styled("▏", Style::default().fg(Color::Gray)),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn save_prompt_is_prefilled() {
        let mut state = PromptState::default();
        state.open_save("custom_report.pdf");
        assert_eq!(state.mode(), Some(PromptMode::SavePath));
        state.pop_char();
        state.pop_char();
        state.pop_char();
        state.push_char('t');
        state.push_char('e');
        state.push_char('x');
        assert_eq!(state.take_input(), "custom_report.tex");
        assert_eq!(state.input(), "");
    }

    #[test]
    fn command_prompt_starts_empty() {
        let mut state = PromptState::default();
        state.open_save("x.pdf");
        state.open_command();
        assert_eq!(state.input(), "");
        state.close();
        assert!(!state.is_open());
    }

    #[test]
    fn renders_only_when_open() {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        let mut state = PromptState::default();
        let draw = |terminal: &mut Terminal<TestBackend>, state: &PromptState| -> String {
            terminal
                .draw(|frame| {
                    let area = frame.size();
                    Prompt.render(frame, area, state);
                })
                .unwrap();
            terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|cell| cell.symbol())
                .collect()
        };

        assert!(!draw(&mut terminal, &state).contains("Command Palette"));
        state.open_command();
        state.push_char('y');
        let rendered = draw(&mut terminal, &state);
        assert!(rendered.contains("Command Palette"));
        assert!(rendered.contains(":y"));
    }
}
