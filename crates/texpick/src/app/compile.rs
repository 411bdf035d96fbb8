//! Running a LaTeX engine over an assembled report.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::naming::with_appended_extension;
use crate::infra::config::Config;

/// Auxiliary artifacts removed after a successful build when cleaning is enabled.
const AUX_EXTENSIONS: &[&str] = &["aux", "log", "out", "fls", "fdb_latexmk"];

/// Files a build may write or delete next to `<base>.pdf`.
pub const BUILD_ARTIFACTS: &[&str] = &["tex", "aux", "log", "out", "fls", "fdb_latexmk"];
const DETAIL_LINES: usize = 6;

/// Supported LaTeX engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum CompilerKind {
    Pdflatex,
    Xelatex,
    Lualatex,
    /// latexmk driving pdflatex, handling reruns itself.
    Latexmk,
}

impl CompilerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerKind::Pdflatex => "pdflatex",
            CompilerKind::Xelatex => "xelatex",
            CompilerKind::Lualatex => "lualatex",
            CompilerKind::Latexmk => "latexmk",
        }
    }
}

impl FromStr for CompilerKind {
    type Err = CompilerKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdflatex" | "pdftex" => Ok(CompilerKind::Pdflatex),
            "xelatex" | "xetex" => Ok(CompilerKind::Xelatex),
            "lualatex" | "luatex" => Ok(CompilerKind::Lualatex),
            "latexmk" => Ok(CompilerKind::Latexmk),
            other => Err(CompilerKindParseError::UnknownCompiler(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`CompilerKind`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CompilerKindParseError {
    #[error("unknown compiler '{0}'")]
    UnknownCompiler(String),
}

/// Failure while turning an assembled document into a PDF.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compiler '{program}' could not be started: {source}")]
    ToolMissing {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("compile failed: {detail}")]
    Failed { status: Option<i32>, detail: String },
    #[error("compiler finished but {} was not produced", .path.display())]
    NoOutput { path: PathBuf },
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Something that can compile a complete document into `<base>.pdf`.
pub trait DocumentCompiler {
    /// Compile `document`, using `base` (a path without extension) for every artifact.
    fn compile(&self, document: &str, base: &Path) -> Result<PathBuf, CompileError>;
}

/// Runtime options controlling compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub kind: CompilerKind,
    pub program: Option<String>,
    pub keep_source: bool,
    pub clean_aux: bool,
    pub max_passes: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            kind: CompilerKind::Pdflatex,
            program: None,
            keep_source: true,
            clean_aux: true,
            max_passes: 2,
        }
    }
}

impl CompileOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        let kind = config.compile.compiler().parse::<CompilerKind>().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to pdflatex");
            CompilerKind::Pdflatex
        });
        Self {
            kind,
            program: config.compile.program().map(ToOwned::to_owned),
            keep_source: config.compile.keep_source(),
            clean_aux: config.compile.clean_aux(),
            max_passes: config.compile.max_passes(),
        }
    }

    fn program(&self) -> &str {
        self.program.as_deref().unwrap_or(self.kind.as_str())
    }
}

/// Compiler backed by a locally installed TeX distribution.
#[derive(Debug, Clone, Default)]
pub struct LatexCompiler {
    options: CompileOptions,
}

impl LatexCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    fn arguments(&self, tex_path: &Path, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if self.options.kind == CompilerKind::Latexmk {
            args.push("-pdf".into());
        }
        args.push("-interaction=nonstopmode".into());
        args.push("-halt-on-error".into());
        let mut output = OsString::from("-output-directory=");
        output.push(output_dir);
        args.push(output);
        args.push(tex_path.as_os_str().to_owned());
        args
    }

    fn passes(&self) -> u32 {
        match self.options.kind {
            CompilerKind::Latexmk => 1,
            _ => self.options.max_passes.max(1),
        }
    }

    fn remove_artifacts(&self, base: &Path, tex_path: &Path) {
        if self.options.clean_aux {
            for extension in AUX_EXTENSIONS {
                remove_quietly(&with_appended_extension(base, extension));
            }
        }
        if !self.options.keep_source {
            remove_quietly(tex_path);
        }
    }
}

impl DocumentCompiler for LatexCompiler {
    fn compile(&self, document: &str, base: &Path) -> Result<PathBuf, CompileError> {
        let output_dir = match base.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&output_dir).map_err(|source| CompileError::Io {
            path: output_dir.clone(),
            source,
        })?;

        let tex_path = with_appended_extension(base, "tex");
        fs::write(&tex_path, document).map_err(|source| CompileError::Io {
            path: tex_path.clone(),
            source,
        })?;

        let program = self.options.program();
        let passes = self.passes();
        for pass in 1..=passes {
            tracing::info!(program, pass, tex = %tex_path.display(), "running compiler");
            let output = Command::new(program)
                .args(self.arguments(&tex_path, &output_dir))
                .output()
                .map_err(|source| CompileError::ToolMissing {
                    program: program.to_string(),
                    source,
                })?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            if !output.status.success() {
                let detail = summarize_failure(&stdout, &String::from_utf8_lossy(&output.stderr))
                    .unwrap_or_else(|| format!("{program} exited with status {}", output.status));
                tracing::error!(program, status = ?output.status.code(), %detail, "compiler failed");
                return Err(CompileError::Failed {
                    status: output.status.code(),
                    detail,
                });
            }

            if !needs_rerun(&stdout) {
                break;
            }
            if pass == passes {
                tracing::warn!(program, passes, "references may be unresolved after last pass");
            }
        }

        let pdf_path = with_appended_extension(base, "pdf");
        if !pdf_path.exists() {
            return Err(CompileError::NoOutput { path: pdf_path });
        }

        self.remove_artifacts(base, &tex_path);
        tracing::info!(pdf = %pdf_path.display(), "report compiled");
        Ok(pdf_path)
    }
}

fn needs_rerun(log: &str) -> bool {
    log.contains("Rerun to get") || log.contains("Rerun LaTeX")
}

/// Pick the TeX error lines (`! ...`) out of the output, or its last lines when there are none.
fn summarize_failure(stdout: &str, stderr: &str) -> Option<String> {
    let errors: Vec<&str> = stdout
        .lines()
        .filter(|line| line.starts_with('!'))
        .take(DETAIL_LINES)
        .collect();
    if !errors.is_empty() {
        return Some(errors.join(" | "));
    }

    let combined = if stderr.trim().is_empty() { stdout } else { stderr };
    let tail: Vec<&str> = combined
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if tail.is_empty() {
        return None;
    }
    let start = tail.len().saturating_sub(DETAIL_LINES);
    Some(tail[start..].join(" | "))
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed build artifact"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(path = %path.display(), error = %err, "failed to remove artifact"),
    }
}
