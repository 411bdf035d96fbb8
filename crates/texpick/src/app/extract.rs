//! Locating sections, tables, and figures in LaTeX source.
//!
//! Openers are found with a single pattern; each opener is then closed by an explicit scan for
//! the first matching close marker after it. Environments of the same kind are not counted, so
//! a table nested inside a table ends at the inner `\end{table}`. Openers without a close are
//! skipped and scanning resumes right after the opener's first character.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::model::{Fragment, FragmentKind};

static OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\section\{|\\begin\{(?:table|figure)\}").expect("opener pattern compiles")
});

const TABLE_OPEN: &str = r"\begin{table}";
const FIGURE_OPEN: &str = r"\begin{figure}";
const TABLE_CLOSE: &str = r"\end{table}";
const FIGURE_CLOSE: &str = r"\end{figure}";

/// Failure to load the source document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read LaTeX source {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Extract every recognizable fragment from `source`, in order of appearance.
pub fn extract(source: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut cursor = 0;

    while let Some(opener) = OPENER.find_at(source, cursor) {
        let kind = match opener.as_str() {
            TABLE_OPEN => FragmentKind::Table,
            FIGURE_OPEN => FragmentKind::Figure,
            _ => FragmentKind::Section,
        };

        match close_after(source, opener.end(), kind) {
            Some(end) => {
                fragments.push(Fragment {
                    kind,
                    offset: opener.start(),
                    text: source[opener.start()..end].to_string(),
                });
                cursor = end;
            }
            None => {
                tracing::debug!(
                    offset = opener.start(),
                    kind = kind.as_str(),
                    "unterminated opener skipped"
                );
                // Openers start with an ASCII backslash, so +1 stays on a char boundary.
                cursor = opener.start() + 1;
            }
        }
    }

    fragments
}

/// Read `path` once as UTF-8 and extract its fragments.
pub fn extract_file(path: &Path) -> Result<Vec<Fragment>, ExtractError> {
    let contents = fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fragments = extract(&contents);
    tracing::info!(
        path = %path.display(),
        fragments = fragments.len(),
        "extracted components"
    );
    Ok(fragments)
}

/// End offset (exclusive) of the first close marker for `kind` found at or after `from`.
fn close_after(source: &str, from: usize, kind: FragmentKind) -> Option<usize> {
    let rest = &source[from..];
    let (position, marker_len) = match kind {
        FragmentKind::Section => (rest.find('}')?, 1),
        FragmentKind::Table => (rest.find(TABLE_CLOSE)?, TABLE_CLOSE.len()),
        FragmentKind::Figure => (rest.find(FIGURE_CLOSE)?, FIGURE_CLOSE.len()),
    };
    Some(from + position + marker_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(|f| f.text.as_str()).collect()
    }

    #[test]
    fn section_then_table_in_order() {
        let source = "\\section{Intro}\nHello\n\\begin{table}\nData\n\\end{table}";
        let fragments = extract(source);

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].kind, FragmentKind::Section);
        assert_eq!(fragments[0].text, "\\section{Intro}");
        assert_eq!(fragments[1].kind, FragmentKind::Table);
        assert_eq!(fragments[1].text, "\\begin{table}\nData\n\\end{table}");
    }

    #[test]
    fn plain_text_yields_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("Just prose with a \\textbf{bold} word.\n").is_empty());
    }

    #[test]
    fn offsets_strictly_increase() {
        let source = "\\begin{figure}\\includegraphics{a}\\end{figure}\n\
                      \\section{One}\n\\section{Two}\n\
                      \\begin{table}x\\end{table}\\begin{figure}y\\end{figure}";
        let fragments = extract(source);

        assert_eq!(fragments.len(), 5);
        assert!(fragments.windows(2).all(|pair| pair[0].offset < pair[1].offset));
        for fragment in &fragments {
            assert!(source[fragment.offset..].starts_with(&fragment.text));
        }
    }

    #[test]
    fn section_title_may_span_lines_and_ends_at_first_brace() {
        let fragments = extract("\\section{Long\ntitle}\n\\section{A \\emph{b} c}");
        assert_eq!(
            texts(&fragments),
            vec!["\\section{Long\ntitle}", "\\section{A \\emph{b}"]
        );
    }

    #[test]
    fn nested_table_closes_at_first_end_marker() {
        let source = "\\begin{table}\nouter\n\\begin{table}\ninner\n\\end{table}\ntail\n\\end{table}";
        let fragments = extract(source);

        assert_eq!(fragments.len(), 1);
        assert_eq!(
            fragments[0].text,
            "\\begin{table}\nouter\n\\begin{table}\ninner\n\\end{table}"
        );
    }

    #[test]
    fn unterminated_environment_does_not_hide_later_fragments() {
        let source = "\\begin{figure}\n\\section{Inside}\nno close here";
        let fragments = extract(source);

        assert_eq!(texts(&fragments), vec!["\\section{Inside}"]);
    }

    #[test]
    fn mismatched_close_marker_is_ignored() {
        let source = "\\begin{table}\n\\end{figure}\n";
        assert!(extract(source).is_empty());
    }

    #[test]
    fn starred_sections_and_other_environments_are_not_components() {
        let source = "\\section*{Hidden}\n\\begin{itemize}\\item a\\end{itemize}\n\\subsection{Sub}";
        assert!(extract(source).is_empty());
    }

    #[test]
    fn extract_file_reports_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.tex");
        let err = extract_file(&missing).unwrap_err();
        assert!(err.to_string().contains("absent.tex"));
    }

    #[test]
    fn extract_file_reads_utf8_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.tex");
        fs::write(&path, "\\section{Überblick}\n\\begin{figure}ö\\end{figure}\n").unwrap();

        let fragments = extract_file(&path).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "\\section{Überblick}");
    }
}
