//! In-memory state for one report-building session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::app::assemble::ReportAssembler;
use crate::app::compile::{BUILD_ARTIFACTS, CompileError, DocumentCompiler};
use crate::app::extract::{extract, extract_file};
use crate::app::naming::{force_extension, strip_extension, unique_path_with_siblings};
use crate::app::rasterize::{RasterError, Rasterizer, RenderedPage, preview_target};
use crate::app::selection::{CommitOutcome, SelectionStore};
use crate::domain::errors::DomainError;
use crate::domain::model::{Fragment, component_label};

/// Message shown instead of the preview when a commit has nothing in it.
pub const NOTHING_SELECTED: &str = "No components selected!";

/// Failure while producing a report from the accumulated selections.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("nothing has been committed yet")]
    NothingCommitted,
    #[error("failed to assemble report: {0:#}")]
    Assemble(anyhow::Error),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Source document, its fragments, and everything committed since it was loaded.
///
/// Created once on load and dropped on exit. History is never persisted.
#[derive(Debug)]
pub struct ReportSession {
    source: PathBuf,
    fragments: Vec<Fragment>,
    selections: SelectionStore,
    last_report: Option<PathBuf>,
    last_render: Option<RenderedPage>,
}

impl ReportSession {
    /// Read and extract the document at `source`.
    pub fn load(source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let fragments = extract_file(&source)
            .with_context(|| format!("cannot start a session for {}", source.display()))?;
        Ok(Self::with_fragments(source, fragments))
    }

    /// Build a session from text that has already been read.
    pub fn from_text(source: impl Into<PathBuf>, text: &str) -> Self {
        Self::with_fragments(source.into(), extract(text))
    }

    fn with_fragments(source: PathBuf, fragments: Vec<Fragment>) -> Self {
        Self {
            source,
            fragments,
            selections: SelectionStore::new(),
            last_report: None,
            last_render: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// `Component N` labels in fragment order.
    pub fn labels(&self) -> Vec<String> {
        (0..self.fragments.len()).map(component_label).collect()
    }

    pub fn selections(&self) -> &SelectionStore {
        &self.selections
    }

    pub fn last_report(&self) -> Option<&Path> {
        self.last_report.as_deref()
    }

    pub fn last_render(&self) -> Option<&RenderedPage> {
        self.last_render.as_ref()
    }

    /// Append the fragments at `indices` to the session history.
    pub fn commit(&mut self, indices: &[usize]) -> Result<CommitOutcome, DomainError> {
        let outcome = self.selections.commit(&self.fragments, indices)?;
        if outcome == CommitOutcome::NothingSelected {
            tracing::info!("generate requested with nothing selected");
        }
        Ok(outcome)
    }

    /// Every committed batch, in commit order.
    pub fn preview_text(&self) -> String {
        self.selections.render_all()
    }

    /// Assemble and compile the full history into a PDF at a free path near `destination`.
    ///
    /// `destination` gets a `.pdf` extension unless it already ends in one. The chosen name
    /// never collides with an existing PDF or with any file the build writes beside it, so the
    /// source document is never overwritten. Earlier history is untouched whether or not
    /// compilation succeeds.
    pub fn generate(
        &mut self,
        destination: &Path,
        assembler: &ReportAssembler,
        compiler: &dyn DocumentCompiler,
    ) -> Result<PathBuf, GenerateError> {
        if self.selections.is_empty() {
            return Err(GenerateError::NothingCommitted);
        }

        let target =
            unique_path_with_siblings(&force_extension(destination, "pdf"), BUILD_ARTIFACTS);
        let document = assembler
            .assemble(&self.preview_text())
            .map_err(GenerateError::Assemble)?;
        let pdf = compiler.compile(&document, &strip_extension(&target))?;

        tracing::info!(
            pdf = %pdf.display(),
            batches = self.selections.len(),
            "report generated"
        );
        self.last_report = Some(pdf.clone());
        Ok(pdf)
    }

    /// Rasterize page one of the most recent report to `image_name`.
    pub fn render_preview(
        &mut self,
        rasterizer: &dyn Rasterizer,
        image_name: &str,
    ) -> Result<Option<&RenderedPage>, RasterError> {
        let Some(pdf) = self.last_report.clone() else {
            return Ok(None);
        };
        let target = preview_target(&pdf, image_name);
        let page = rasterizer.first_page(&pdf, &target)?;
        self.last_render = Some(page);
        Ok(self.last_render.as_ref())
    }
}
