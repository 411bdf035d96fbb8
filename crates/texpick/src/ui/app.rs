//! Application loop for the TUI.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::app::assemble::ReportAssembler;
use crate::app::compile::{CompileOptions, DocumentCompiler, LatexCompiler};
use crate::app::rasterize::{PdftoppmRasterizer, Rasterizer};
use crate::app::selection::CommitOutcome;
use crate::app::session::{NOTHING_SELECTED, ReportSession};
use crate::infra::clipboard::Clipboard;
use crate::infra::config::Config;
use crate::infra::highlight::Highlighter;
use crate::infra::viewer;
use crate::ui::components::checklist::{Checklist, ChecklistState};
use crate::ui::components::preview::{PreviewPane, PreviewPaneState};
use crate::ui::components::prompt::{Prompt, PromptMode, PromptState};
use crate::ui::components::render::RenderPane;

const TICK_RATE: Duration = Duration::from_millis(120);
const PAGE: i32 = 10;

/// Interactive checklist, preview and render panes for one report session.
pub struct UiApp {
    config: Config,
    session: ReportSession,
    assembler: ReportAssembler,
    compiler: Box<dyn DocumentCompiler>,
    rasterizer: Box<dyn Rasterizer>,
    highlighter: Highlighter,
    clipboard: Option<Clipboard>,
    checklist: ChecklistState,
    checklist_component: Checklist,
    preview: PreviewPaneState,
    preview_component: PreviewPane,
    render_component: RenderPane,
    prompt: PromptState,
    prompt_component: Prompt,
    pending_build: Option<PathBuf>,
    status: Option<StatusMessage>,
    focus: FocusTarget,
    should_quit: bool,
}

impl UiApp {
    /// Build the UI around `session` using the LaTeX toolchain named in `config`.
    pub fn new(config: Config, session: ReportSession) -> Result<Self> {
        let compiler = LatexCompiler::new(CompileOptions::from_config(&config));
        let rasterizer = PdftoppmRasterizer::from_config(&config);
        Self::with_tools(config, session, Box::new(compiler), Box::new(rasterizer))
    }

    /// Build the UI with explicit compiler and rasterizer implementations.
    pub fn with_tools(
        config: Config,
        session: ReportSession,
        compiler: Box<dyn DocumentCompiler>,
        rasterizer: Box<dyn Rasterizer>,
    ) -> Result<Self> {
        let assembler =
            ReportAssembler::from_config(&config).context("failed to prepare document template")?;
        let checklist = ChecklistState::from_fragments(session.fragments());
        Ok(Self {
            config,
            session,
            assembler,
            compiler,
            rasterizer,
            highlighter: Highlighter::new(),
            clipboard: None,
            checklist,
            checklist_component: Checklist,
            preview: PreviewPaneState::default(),
            preview_component: PreviewPane,
            render_component: RenderPane,
            prompt: PromptState::default(),
            prompt_component: Prompt,
            pending_build: None,
            status: None,
            focus: FocusTarget::Checklist,
            should_quit: false,
        })
    }

    pub fn session(&self) -> &ReportSession {
        &self.session
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(
            source = %self.session.source().display(),
            components = self.session.fragments().len(),
            "starting interactive session"
        );

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
        terminal.show_cursor().ok();

        event_loop_result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            // The "Compiling" status is on screen before the blocking build starts.
            if self.run_pending_build() {
                continue;
            }
            self.tick();

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)? {
                let ev = event::read()?;
                self.handle_event(ev)?;
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(2)])
            .split(size);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(layout[0]);

        let left_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(8), Constraint::Length(4)])
            .split(main_chunks[0]);

        self.checklist_component.render(
            frame,
            left_chunks[0],
            &self.checklist,
            self.focus == FocusTarget::Checklist,
        );
        self.render_component
            .render(frame, left_chunks[1], self.session.last_render());
        render_hints(frame, left_chunks[2]);

        self.preview_component.render(
            frame,
            main_chunks[1],
            &self.preview,
            self.focus == FocusTarget::Preview,
        );

        self.render_status(frame, layout[1]);
        self.prompt_component.render(frame, size, &self.prompt);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let line = match &self.status {
            Some(status) => {
                let style = match status.level {
                    StatusLevel::Info => Style::default().fg(Color::Gray),
                    StatusLevel::Success => Style::default().fg(Color::Green),
                    StatusLevel::Error => Style::default().fg(Color::Red),
                };
                Line::styled(status.text.clone(), style)
            }
            None => Line::styled(
                format!(
                    "{} · {} batches committed · press : for commands",
                    self.session.source().display(),
                    self.session.selections().len()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        };
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn tick(&mut self) {
        if let Some(status) = &self.status
            && status.is_expired()
        {
            self.status = None;
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key)?,
            Event::Key(_) | Event::Resize(..) | Event::Mouse(_) => {}
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        if self.prompt.is_open() {
            return self.handle_prompt_key(key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(':') => self.prompt.open_command(),
            KeyCode::Char('g') | KeyCode::Enter => self.generate(),
            KeyCode::Char('y') => self.yank(),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    FocusTarget::Checklist => FocusTarget::Preview,
                    FocusTarget::Preview => FocusTarget::Checklist,
                };
            }
            KeyCode::PageDown => self.preview.scroll_by(PAGE),
            KeyCode::PageUp => self.preview.scroll_by(-PAGE),
            _ => match self.focus {
                FocusTarget::Checklist => self.handle_checklist_key(key),
                FocusTarget::Preview => self.handle_preview_key(key),
            },
        }
        Ok(())
    }

    fn handle_checklist_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.checklist.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.checklist.select_previous(),
            KeyCode::Char(' ') => {
                self.checklist.toggle_current();
            }
            KeyCode::Char('a') => self.checklist.check_all(),
            KeyCode::Char('c') => self.checklist.clear(),
            _ => {}
        }
    }

    fn handle_preview_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.preview.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.preview.scroll_by(-1),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                if self.prompt.mode() == Some(PromptMode::SavePath) {
                    tracing::debug!("save cancelled");
                }
                self.prompt.close();
            }
            KeyCode::Enter => {
                let mode = self.prompt.mode();
                let input = self.prompt.take_input();
                self.prompt.close();
                match mode {
                    Some(PromptMode::SavePath) => self.request_build(input.trim()),
                    Some(PromptMode::Command) => {
                        if let Err(err) = self.execute_command(input.trim()) {
                            self.set_status(StatusLevel::Error, err.to_string());
                        }
                    }
                    None => {}
                }
            }
            KeyCode::Backspace => self.prompt.pop_char(),
            KeyCode::Char(ch) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.prompt.push_char(ch);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn execute_command(&mut self, command: &str) -> Result<()> {
        match command {
            "" => {}
            "generate" | "g" => self.generate(),
            "yank" | "y" => self.yank(),
            "open" => self.open_render()?,
            "quit" | "q" => self.should_quit = true,
            "help" => self.set_status(
                StatusLevel::Info,
                "Commands: generate, open, yank, quit · keys: space toggle, a all, c clear, g generate",
            ),
            other => return Err(anyhow!("unknown command '{other}'")),
        }
        Ok(())
    }

    /// Commit the checked components, show the accumulated text and ask where to save.
    fn generate(&mut self) {
        let indices = self.checklist.checked_indices();
        match self.session.commit(&indices) {
            Ok(CommitOutcome::NothingSelected) => {
                self.preview.show_notice(NOTHING_SELECTED);
            }
            Ok(CommitOutcome::Committed { batch }) => {
                tracing::debug!(batch, components = indices.len(), "selection committed");
                self.refresh_preview();
                self.prompt.open_save(self.config.output.default_name());
            }
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    fn refresh_preview(&mut self) {
        let highlighted = self
            .highlighter
            .highlight_latex(&self.session.preview_text(), self.config.preview.theme());
        self.preview.show_text(highlighted);
    }

    fn request_build(&mut self, destination: &str) {
        if destination.is_empty() {
            tracing::debug!("empty destination, save cancelled");
            return;
        }
        self.pending_build = Some(PathBuf::from(destination));
        self.set_status(StatusLevel::Info, format!("Compiling {destination}…"));
    }

    /// Run a queued build, returning whether one was run.
    fn run_pending_build(&mut self) -> bool {
        let Some(destination) = self.pending_build.take() else {
            return false;
        };

        let pdf = match self.session.generate(
            &destination,
            &self.assembler,
            self.compiler.as_ref(),
        ) {
            Ok(pdf) => pdf,
            Err(err) => {
                tracing::warn!(error = %err, "report generation failed");
                self.set_status(StatusLevel::Error, err.to_string());
                return true;
            }
        };

        let rendered = self
            .session
            .render_preview(self.rasterizer.as_ref(), self.config.preview.image_name())
            .map(|_| ());
        match rendered {
            Ok(()) => self.set_status(StatusLevel::Success, format!("Saved {}", pdf.display())),
            Err(err) => {
                tracing::warn!(error = %err, "preview rendering failed");
                self.set_status(
                    StatusLevel::Error,
                    format!("Saved {} but preview failed: {err}", pdf.display()),
                );
            }
        }
        true
    }

    fn yank(&mut self) {
        let text = self.session.preview_text();
        if text.is_empty() {
            self.set_status(StatusLevel::Info, "Nothing committed yet");
            return;
        }
        let clipboard = self.clipboard.get_or_insert_with(Clipboard::new);
        match clipboard.copy(&text) {
            Ok(backend) => self.set_status(
                StatusLevel::Success,
                format!("Copied report text via {}", backend.describe()),
            ),
            Err(err) => self.set_status(StatusLevel::Error, format!("{err:#}")),
        }
    }

    fn open_render(&mut self) -> Result<()> {
        let page = self
            .session
            .last_render()
            .ok_or_else(|| anyhow!("no preview rendered yet"))?;
        viewer::open(&page.image)?;
        Ok(())
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
    }
}

fn render_hints(frame: &mut Frame<'_>, area: Rect) {
    let key = |label: &'static str| Span::styled(label, Style::default().fg(Color::Cyan));
    let hints = Paragraph::new(Line::from(vec![
        key("space"),
        Span::raw(" toggle · "),
        key("a/c"),
        Span::raw(" all/clear · "),
        key("g"),
        Span::raw(" generate · "),
        key("y"),
        Span::raw(" yank · "),
        key(":"),
        Span::raw(" commands · "),
        key("q"),
        Span::raw(" quit"),
    ]))
    .wrap(Wrap { trim: true })
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(hints, area);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    Checklist,
    Preview,
}

#[derive(Debug)]
struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(4),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusLevel {
    Info,
    Success,
    Error,
}
