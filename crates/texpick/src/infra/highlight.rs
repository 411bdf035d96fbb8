//! LaTeX syntax highlighting built on top of syntect.

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SyntectStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

const DEFAULT_THEME: &str = "base16-ocean.dark";
const LATEX_EXTENSION: &str = "tex";

static DEFAULT_ASSETS: Lazy<(Arc<SyntaxSet>, Arc<ThemeSet>)> = Lazy::new(|| {
    (
        Arc::new(SyntaxSet::load_defaults_newlines()),
        Arc::new(ThemeSet::load_defaults()),
    )
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighlightStyle {
    pub foreground: Option<RgbColor>,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub content: String,
    pub style: HighlightStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightLine {
    pub spans: Vec<HighlightSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMode {
    Highlighted,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightResult {
    pub lines: Vec<HighlightLine>,
    pub theme: String,
    pub mode: HighlightMode,
}

impl HighlightResult {
    pub fn plain(lines: Vec<String>, theme: String) -> Self {
        HighlightResult {
            lines: lines
                .into_iter()
                .map(|line| HighlightLine {
                    spans: vec![HighlightSpan {
                        content: line,
                        style: HighlightStyle::default(),
                    }],
                })
                .collect(),
            theme,
            mode: HighlightMode::Plain,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Highlights LaTeX source for the preview pane.
#[derive(Debug, Clone)]
pub struct Highlighter {
    syntax_set: Arc<SyntaxSet>,
    theme_set: Arc<ThemeSet>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        let assets = &*DEFAULT_ASSETS;
        Self {
            syntax_set: Arc::clone(&assets.0),
            theme_set: Arc::clone(&assets.1),
        }
    }

    pub fn available_themes(&self) -> Vec<String> {
        let mut themes: Vec<_> = self.theme_set.themes.keys().cloned().collect();
        themes.sort();
        themes
    }

    /// Highlight `text` line by line as LaTeX, falling back to plain lines on any failure.
    pub fn highlight_latex(&self, text: &str, theme: &str) -> HighlightResult {
        let lines: Vec<String> = text.lines().map(ToOwned::to_owned).collect();
        let Some((theme_name, resolved)) = self.resolve_theme(theme) else {
            return HighlightResult::plain(lines, theme.to_string());
        };

        let Some(syntax) = self.syntax_set.find_syntax_by_extension(LATEX_EXTENSION) else {
            tracing::debug!("no LaTeX syntax bundled; previewing as plain text");
            return HighlightResult::plain(lines, theme_name);
        };

        match self.highlight_with_syntax(&lines, resolved, syntax) {
            Ok(highlighted) => HighlightResult {
                lines: highlighted,
                theme: theme_name,
                mode: HighlightMode::Highlighted,
            },
            Err(err) => {
                tracing::warn!(error = %err, "highlight failed");
                HighlightResult::plain(lines, theme_name)
            }
        }
    }

    fn highlight_with_syntax(
        &self,
        lines: &[String],
        theme: &Theme,
        syntax: &SyntaxReference,
    ) -> Result<Vec<HighlightLine>> {
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut result = Vec::with_capacity(lines.len());
        for line in lines {
            // The newline-aware syntax set expects each line to end with `\n`.
            let with_newline = format!("{line}\n");
            let segments = highlighter.highlight_line(&with_newline, &self.syntax_set)?;
            let spans = segments
                .into_iter()
                .map(|(style, text)| HighlightSpan {
                    content: text.trim_end_matches('\n').to_string(),
                    style: convert_style(style),
                })
                .filter(|span| !span.content.is_empty())
                .collect();
            result.push(HighlightLine { spans });
        }
        Ok(result)
    }

    fn resolve_theme(&self, requested: &str) -> Option<(String, &Theme)> {
        if let Some(theme) = self.theme_set.themes.get(requested) {
            return Some((requested.to_string(), theme));
        }

        let fallback = self
            .theme_set
            .themes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(requested))
            .or_else(|| self.theme_set.themes.get_key_value(DEFAULT_THEME))
            .or_else(|| self.theme_set.themes.iter().next());

        if let Some((name, _)) = fallback
            && !name.eq_ignore_ascii_case(requested)
        {
            tracing::warn!(requested, fallback = %name, "theme not found");
        }
        fallback.map(|(name, theme)| (name.clone(), theme))
    }
}

fn convert_style(style: SyntectStyle) -> HighlightStyle {
    HighlightStyle {
        foreground: convert_color(style.foreground),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
    }
}

fn convert_color(color: syntect::highlighting::Color) -> Option<RgbColor> {
    if color.a == 0 {
        None
    } else {
        Some(RgbColor {
            r: color.r,
            g: color.g,
            b: color.b,
        })
    }
}
