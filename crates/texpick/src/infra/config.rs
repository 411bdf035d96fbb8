//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".texpick/config.toml";

/// Layered configuration loaded from defaults, user, workspace, explicit file, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub document: Document,
    #[serde(default)]
    pub compile: Compile,
    #[serde(default)]
    pub preview: Preview,
    #[serde(default)]
    pub output: Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Source {
    #[serde(default)]
    path: Option<PathBuf>,
}

impl Source {
    /// LaTeX document used when none is given on the command line.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// A `\usepackage` line in the generated preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    #[serde(default)]
    pub options: Option<String>,
}

impl PackageSpec {
    pub fn new(name: &str, options: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            options: options.map(ToOwned::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    packages: Option<Vec<PackageSpec>>,
    #[serde(default)]
    template: Option<PathBuf>,
}

impl Document {
    fn default_class() -> &'static str {
        "article"
    }

    fn default_packages() -> Vec<PackageSpec> {
        vec![
            PackageSpec::new("fontenc", Some("T1")),
            PackageSpec::new("inputenc", Some("utf8")),
            PackageSpec::new("lmodern", None),
            PackageSpec::new("textcomp", None),
            PackageSpec::new("lastpage", None),
        ]
    }

    pub fn class(&self) -> &str {
        self.class.as_deref().unwrap_or(Self::default_class())
    }

    pub fn packages(&self) -> Vec<PackageSpec> {
        self.packages
            .clone()
            .unwrap_or_else(Self::default_packages)
    }

    /// Custom template file replacing the built-in document shell.
    pub fn template(&self) -> Option<&Path> {
        self.template.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Compile {
    #[serde(default)]
    compiler: Option<String>,
    #[serde(default)]
    program: Option<String>,
    #[serde(default)]
    keep_source: Option<bool>,
    #[serde(default)]
    clean_aux: Option<bool>,
    #[serde(default)]
    max_passes: Option<u32>,
}

impl Compile {
    fn default_compiler() -> &'static str {
        "pdflatex"
    }

    fn default_max_passes() -> u32 {
        2
    }

    pub fn compiler(&self) -> &str {
        self.compiler
            .as_deref()
            .unwrap_or(Self::default_compiler())
    }

    /// Explicit executable overriding the one implied by [`Compile::compiler`].
    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    pub fn keep_source(&self) -> bool {
        self.keep_source.unwrap_or(true)
    }

    pub fn clean_aux(&self) -> bool {
        self.clean_aux.unwrap_or(true)
    }

    pub fn max_passes(&self) -> u32 {
        self.max_passes
            .unwrap_or_else(Self::default_max_passes)
            .max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Preview {
    #[serde(default)]
    image_name: Option<String>,
    #[serde(default)]
    dpi: Option<u32>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    program: Option<String>,
}

impl Preview {
    fn default_image_name() -> &'static str {
        "preview.png"
    }

    fn default_dpi() -> u32 {
        100
    }

    fn default_theme() -> &'static str {
        "base16-ocean.dark"
    }

    fn default_program() -> &'static str {
        "pdftoppm"
    }

    /// Intermediate image written for the first page; relative names sit next to the PDF.
    pub fn image_name(&self) -> &str {
        self.image_name
            .as_deref()
            .unwrap_or(Self::default_image_name())
    }

    pub fn dpi(&self) -> u32 {
        self.dpi.unwrap_or_else(Self::default_dpi)
    }

    pub fn theme(&self) -> &str {
        self.theme.as_deref().unwrap_or(Self::default_theme())
    }

    pub fn program(&self) -> &str {
        self.program
            .as_deref()
            .unwrap_or(Self::default_program())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Output {
    #[serde(default)]
    default_name: Option<String>,
}

impl Output {
    fn default_name_value() -> &'static str {
        "custom_report.pdf"
    }

    /// Name prefilled in the save prompt.
    pub fn default_name(&self) -> &str {
        self.default_name
            .as_deref()
            .unwrap_or(Self::default_name_value())
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    source: Option<PathBuf>,
    compiler: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            source: env::var_os("TEXPICK_SOURCE").map(PathBuf::from),
            compiler: env::var("TEXPICK_COMPILER").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(source: &str, compiler: &str) -> Self {
        Self {
            source: Some(PathBuf::from(source)),
            compiler: Some(compiler.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        Self::load_with_file(None)
    }

    /// Like [`Config::load`], with `extra` layered above the workspace file.
    pub fn load_with_file(extra: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        let mut layers = vec![global, workspace];
        if let Some(path) = extra {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            layers.push(Some(path.to_path_buf()));
        }
        Self::load_with_layers(layers, env)
    }

    fn load_with_layers(files: Vec<Option<PathBuf>>, env_overrides: EnvOverrides) -> Result<Self> {
        let mut layers: Vec<Config> = vec![Self::from_str(&DEFAULT_CONFIG)?];

        for path in files.into_iter().flatten() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config layer");
                layers.push(Self::from_file(&path)?);
            }
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, overlay: Self) -> Self {
        Self {
            source: Source {
                path: overlay.source.path.or(self.source.path),
            },
            document: Document {
                class: overlay.document.class.or(self.document.class),
                packages: overlay.document.packages.or(self.document.packages),
                template: overlay.document.template.or(self.document.template),
            },
            compile: merge_compile(self.compile, overlay.compile),
            preview: merge_preview(self.preview, overlay.preview),
            output: Output {
                default_name: overlay.output.default_name.or(self.output.default_name),
            },
        }
    }

    /// Point the session at a different source document.
    pub fn set_source_path(&mut self, path: impl Into<PathBuf>) {
        self.source.path = Some(path.into());
    }

    /// Select a compiler by name, as a CLI flag would.
    pub fn set_compiler(&mut self, compiler: impl Into<String>) {
        self.compile.compiler = Some(compiler.into());
    }
}

fn merge_compile(base: Compile, overlay: Compile) -> Compile {
    Compile {
        compiler: overlay.compiler.or(base.compiler),
        program: overlay.program.or(base.program),
        keep_source: overlay.keep_source.or(base.keep_source),
        clean_aux: overlay.clean_aux.or(base.clean_aux),
        max_passes: overlay.max_passes.or(base.max_passes),
    }
}

fn merge_preview(base: Preview, overlay: Preview) -> Preview {
    Preview {
        image_name: overlay.image_name.or(base.image_name),
        dpi: overlay.dpi.or(base.dpi),
        theme: overlay.theme.or(base.theme),
        program: overlay.program.or(base.program),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("texpick/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(source) = env.source {
        config.source.path = Some(source);
    }
    if let Some(compiler) = env.compiler {
        config.compile.compiler = Some(compiler);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(Vec::new(), EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.document.class(), "article");
        assert_eq!(config.document.packages().len(), 5);
        assert_eq!(config.compile.compiler(), "pdflatex");
        assert_eq!(config.compile.max_passes(), 2);
        assert!(config.compile.keep_source());
        assert_eq!(config.preview.image_name(), "preview.png");
        assert_eq!(config.output.default_name(), "custom_report.pdf");
        assert!(config.source.path().is_none());
    }

    #[test]
    fn embedded_defaults_match_code_defaults() {
        let embedded = Config::from_str(&DEFAULT_CONFIG).unwrap();
        let fallback = Config::default();
        assert_eq!(embedded.document.packages(), fallback.document.packages());
        assert_eq!(embedded.preview.theme(), fallback.preview.theme());
        assert_eq!(embedded.compile.clean_aux(), fallback.compile.clean_aux());
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[document]
class = "report"
[compile]
compiler = "xelatex"
max_passes = 3
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".texpick"))?;
        fs::write(
            workspace_dir.join(".texpick/config.toml"),
            r#"
[source]
path = "thesis.tex"
[compile]
keep_source = false
[document]
packages = [{ name = "graphicx" }]
"#,
        )?;

        let config = Config::load_with_layers(
            vec![
                Some(global),
                Some(workspace_dir.join(".texpick/config.toml")),
            ],
            EnvOverrides::default(),
        )?;

        assert_eq!(config.document.class(), "report");
        assert_eq!(
            config.document.packages(),
            vec![PackageSpec::new("graphicx", None)]
        );
        assert_eq!(config.compile.compiler(), "xelatex");
        assert_eq!(config.compile.max_passes(), 3);
        assert!(!config.compile.keep_source());
        assert!(config.compile.clean_aux());
        assert_eq!(config.source.path(), Some(Path::new("thesis.tex")));
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("paper.tex", "lualatex");
        let config = Config::load_with_layers(Vec::new(), overrides)?;
        assert_eq!(config.source.path(), Some(Path::new("paper.tex")));
        assert_eq!(config.compile.compiler(), "lualatex");
        Ok(())
    }

    #[test]
    fn zero_passes_are_clamped() -> Result<()> {
        let config = Config::from_str("[compile]\nmax_passes = 0\n")?;
        assert_eq!(config.compile.max_passes(), 1);
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Config::load_with_file(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
