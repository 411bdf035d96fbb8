//! Command-line entry points.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

use crate::app::assemble::ReportAssembler;
use crate::app::compile::{CompileOptions, CompilerKind, LatexCompiler};
use crate::app::rasterize::PdftoppmRasterizer;
use crate::app::selection::CommitOutcome;
use crate::app::session::{NOTHING_SELECTED, ReportSession};
use crate::domain::labels::parse_selection;
use crate::domain::model::{FragmentKind, component_label};
use crate::infra::config::Config;
use crate::infra::logging::{self, LogTarget};
use crate::ui::app::UiApp;

#[derive(Parser, Debug)]
#[command(name = "texpick", version)]
#[command(about = "Pick sections, tables and figures out of a LaTeX document and compile them into reports")]
#[command(after_help = "EXAMPLES:\n  \
    texpick thesis.tex\n  \
    texpick list thesis.tex --json\n  \
    texpick build thesis.tex --select 1,3 --select 2 --output results.pdf")]
pub struct Cli {
    /// LaTeX document to pick from when no subcommand is given
    pub source: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbose logging (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Extra TOML configuration layered over the global and workspace files
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive checklist (the default)
    Tui {
        /// LaTeX document to pick from
        source: Option<PathBuf>,
    },
    /// List the extracted components
    List {
        /// LaTeX document to pick from
        source: Option<PathBuf>,
        /// Print JSON instead of one line per component
        #[arg(long)]
        json: bool,
    },
    /// Commit selections and compile them into a PDF
    Build {
        /// LaTeX document to pick from
        source: Option<PathBuf>,
        /// Comma separated component numbers; each occurrence is one commit
        #[arg(short, long, required = true)]
        select: Vec<String>,
        /// Destination PDF (defaults to output.default_name)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// LaTeX engine to run
        #[arg(long, value_enum)]
        compiler: Option<CompilerKind>,
        /// Skip rendering the first page to an image
        #[arg(long)]
        no_preview: bool,
    },
    /// Print the assembled document without compiling it
    Assemble {
        /// LaTeX document to pick from
        source: Option<PathBuf>,
        /// Comma separated component numbers; each occurrence is one commit
        #[arg(short, long, required = true)]
        select: Vec<String>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Command::Tui { .. }))
    }
}

/// Execute the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    if let Some(Command::Completions { shell }) = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "texpick", &mut io::stdout());
        return Ok(());
    }

    let target = if cli.is_interactive() {
        LogTarget::File(logging::default_log_file())
    } else {
        LogTarget::Stderr
    };
    logging::init(cli.verbose, target)?;

    let mut config = Config::load_with_file(cli.config.as_deref())?;
    match cli.command {
        None => run_tui(config, cli.source),
        Some(Command::Tui { source }) => run_tui(config, source.or(cli.source)),
        Some(Command::List { source, json }) => list(&config, source, json),
        Some(Command::Build {
            source,
            select,
            output,
            compiler,
            no_preview,
        }) => {
            if let Some(kind) = compiler {
                config.set_compiler(kind.as_str());
            }
            build(&config, source, &select, output, no_preview)
        }
        Some(Command::Assemble { source, select }) => assemble(&config, source, &select),
        Some(Command::Completions { .. }) => Ok(()),
    }
}

fn resolve_source(argument: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    argument
        .or_else(|| config.source.path().map(Path::to_path_buf))
        .ok_or_else(|| {
            anyhow!("no source document given; pass a path or set source.path in the config")
        })
}

fn run_tui(config: Config, source: Option<PathBuf>) -> Result<()> {
    let source = resolve_source(source, &config)?;
    let session = ReportSession::load(source)?;
    let mut app = UiApp::new(config, session)?;
    app.run()
}

#[derive(Serialize)]
struct ListedComponent<'a> {
    label: String,
    kind: FragmentKind,
    offset: usize,
    headline: &'a str,
    text: &'a str,
}

fn list(config: &Config, source: Option<PathBuf>, json: bool) -> Result<()> {
    let session = ReportSession::load(resolve_source(source, config)?)?;
    let components: Vec<ListedComponent<'_>> = session
        .fragments()
        .iter()
        .enumerate()
        .map(|(index, fragment)| ListedComponent {
            label: component_label(index),
            kind: fragment.kind,
            offset: fragment.offset,
            headline: fragment.headline(),
            text: &fragment.text,
        })
        .collect();

    if json {
        let rendered =
            serde_json::to_string_pretty(&components).context("failed to serialize components")?;
        println!("{rendered}");
        return Ok(());
    }

    if components.is_empty() {
        eprintln!("no sections, tables or figures found");
    }
    for component in &components {
        println!(
            "{:<14} {:<8} {}",
            component.label,
            component.kind.as_str(),
            component.headline
        );
    }
    Ok(())
}

/// Load the source and commit every `--select` value in order.
fn commit_selections(config: &Config, source: Option<PathBuf>, selects: &[String]) -> Result<ReportSession> {
    let mut session = ReportSession::load(resolve_source(source, config)?)?;
    for select in selects {
        let indices = parse_selection(select).with_context(|| format!("invalid selection '{select}'"))?;
        if session.commit(&indices)? == CommitOutcome::NothingSelected {
            tracing::warn!(select = %select, "{NOTHING_SELECTED}");
        }
    }
    if session.selections().is_empty() {
        bail!(NOTHING_SELECTED);
    }
    Ok(session)
}

fn assemble(config: &Config, source: Option<PathBuf>, selects: &[String]) -> Result<()> {
    let session = commit_selections(config, source, selects)?;
    let assembler = ReportAssembler::from_config(config)?;
    let document = assembler.assemble(&session.preview_text())?;
    println!("{document}");
    Ok(())
}

fn build(
    config: &Config,
    source: Option<PathBuf>,
    selects: &[String],
    output: Option<PathBuf>,
    no_preview: bool,
) -> Result<()> {
    let mut session = commit_selections(config, source, selects)?;
    let destination = output.unwrap_or_else(|| PathBuf::from(config.output.default_name()));
    let assembler = ReportAssembler::from_config(config)?;
    let compiler = LatexCompiler::new(CompileOptions::from_config(config));

    let pdf = session.generate(&destination, &assembler, &compiler)?;
    println!("{}", pdf.display());

    if no_preview {
        return Ok(());
    }
    let rasterizer = PdftoppmRasterizer::from_config(config);
    let page = session
        .render_preview(&rasterizer, config.preview.image_name())
        .with_context(|| format!("{} was written but its preview failed", pdf.display()))?;
    if let Some(page) = page {
        println!("{}", page.image.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_source_opens_the_checklist() {
        let cli = Cli::parse_from(["texpick", "thesis.tex"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.source, Some(PathBuf::from("thesis.tex")));
        assert!(cli.is_interactive());
    }

    #[test]
    fn build_keeps_each_select_as_one_commit() {
        let cli = Cli::parse_from([
            "texpick", "build", "doc.tex", "--select", "1,3", "-s", "2", "--compiler", "xelatex", "-v",
        ]);
        match cli.command {
            Some(Command::Build {
                select, compiler, ..
            }) => {
                assert_eq!(select, vec!["1,3", "2"]);
                assert_eq!(compiler, Some(CompilerKind::Xelatex));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn source_falls_back_to_config() {
        let mut config = Config::default();
        assert!(resolve_source(None, &config).is_err());
        config.set_source_path("from-config.tex");
        assert_eq!(
            resolve_source(None, &config).unwrap(),
            PathBuf::from("from-config.tex")
        );
        assert_eq!(
            resolve_source(Some("arg.tex".into()), &config).unwrap(),
            PathBuf::from("arg.tex")
        );
    }
}
