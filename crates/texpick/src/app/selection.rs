//! Accumulating committed selections across generate actions.

use crate::domain::errors::DomainError;
use crate::domain::model::{Fragment, SelectionBatch};

/// Separator placed between fragments of a batch and between batches.
pub const SEPARATOR: &str = "\n";

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new batch was appended at this position in the history.
    Committed { batch: usize },
    /// No indices were given; nothing was recorded.
    NothingSelected,
}

/// Append-only history of committed batches for one session.
///
/// Batches are never removed or reordered, and repeated selections are kept as-is.
#[derive(Debug, Default, Clone)]
pub struct SelectionStore {
    batches: Vec<SelectionBatch>,
}

impl SelectionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Access the committed batches in commit order.
    pub fn batches(&self) -> &[SelectionBatch] {
        &self.batches
    }

    /// Join the fragments at `indices` and append them as one batch.
    ///
    /// Every index is validated before anything is recorded, so a rejected commit leaves the
    /// history untouched.
    pub fn commit(
        &mut self,
        fragments: &[Fragment],
        indices: &[usize],
    ) -> Result<CommitOutcome, DomainError> {
        if indices.is_empty() {
            return Ok(CommitOutcome::NothingSelected);
        }

        let parts = indices
            .iter()
            .map(|&index| {
                fragments
                    .get(index)
                    .map(|fragment| fragment.text.as_str())
                    .ok_or(DomainError::IndexOutOfRange {
                        index,
                        available: fragments.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.batches.push(SelectionBatch {
            indices: indices.to_vec(),
            text: parts.join(SEPARATOR),
        });
        tracing::debug!(
            batch = self.batches.len() - 1,
            fragments = indices.len(),
            "selection committed"
        );

        Ok(CommitOutcome::Committed {
            batch: self.batches.len() - 1,
        })
    }

    /// Full text of every batch in commit order.
    pub fn render_all(&self) -> String {
        self.batches
            .iter()
            .map(|batch| batch.text.as_str())
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::model::FragmentKind;

    fn fragments() -> Vec<Fragment> {
        ["\\section{A}", "\\begin{table}T\\end{table}", "\\section{B}"]
            .iter()
            .enumerate()
            .map(|(idx, text)| Fragment {
                kind: if idx == 1 {
                    FragmentKind::Table
                } else {
                    FragmentKind::Section
                },
                offset: idx * 100,
                text: (*text).to_string(),
            })
            .collect()
    }

    #[test]
    fn empty_commit_is_advisory_and_changes_nothing() {
        let mut store = SelectionStore::new();
        let outcome = store.commit(&fragments(), &[]).unwrap();

        assert_eq!(outcome, CommitOutcome::NothingSelected);
        assert!(store.is_empty());
        assert_eq!(store.render_all(), "");
    }

    #[test]
    fn joins_fragments_in_given_order() {
        let mut store = SelectionStore::new();
        store.commit(&fragments(), &[2, 0]).unwrap();

        assert_eq!(store.batches()[0].text, "\\section{B}\n\\section{A}");
        assert_eq!(store.batches()[0].indices, vec![2, 0]);
    }

    #[test]
    fn accumulates_batches_in_commit_order() {
        let fragments = fragments();
        let mut store = SelectionStore::new();

        assert_eq!(
            store.commit(&fragments, &[1]).unwrap(),
            CommitOutcome::Committed { batch: 0 }
        );
        assert_eq!(
            store.commit(&fragments, &[0, 2]).unwrap(),
            CommitOutcome::Committed { batch: 1 }
        );

        assert_eq!(
            store.render_all(),
            "\\begin{table}T\\end{table}\n\\section{A}\n\\section{B}"
        );
    }

    #[test]
    fn repeated_selection_is_not_deduplicated() {
        let fragments = fragments();
        let mut store = SelectionStore::new();
        store.commit(&fragments, &[0]).unwrap();
        store.commit(&fragments, &[0]).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.batches()[0], store.batches()[1]);
        assert_eq!(store.render_all().matches("\\section{A}").count(), 2);
    }

    #[test]
    fn render_all_is_idempotent() {
        let mut store = SelectionStore::new();
        store.commit(&fragments(), &[0, 1]).unwrap();

        let first = store.render_all();
        let second = store.render_all();
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_index_rejects_whole_commit() {
        let mut store = SelectionStore::new();
        let err = store.commit(&fragments(), &[0, 7]).unwrap_err();

        assert_eq!(
            err,
            DomainError::IndexOutOfRange {
                index: 7,
                available: 3
            }
        );
        assert!(store.is_empty());
    }
}
