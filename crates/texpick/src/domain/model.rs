//! Domain models for extracted fragments and committed selections.

use serde::Serialize;

/// Which markup construct a fragment was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentKind {
    Section,
    Table,
    Figure,
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Section => "section",
            FragmentKind::Table => "table",
            FragmentKind::Figure => "figure",
        }
    }
}

/// One section heading, table block, or figure block copied verbatim from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    /// Byte offset of the opening marker in the source text.
    pub offset: usize,
    pub text: String,
}

impl Fragment {
    /// First line of the fragment, used as a hint next to the generic label.
    pub fn headline(&self) -> &str {
        self.text.lines().next().unwrap_or_default().trim()
    }
}

/// Fragments chosen in a single commit, joined into one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionBatch {
    pub indices: Vec<usize>,
    pub text: String,
}

/// Display label for the fragment at a 0-based index.
pub fn component_label(index: usize) -> String {
    format!("Component {}", index + 1)
}
