//! Wrapping accumulated fragments in a compilable document shell.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use minijinja::Environment;
use serde::Serialize;

use crate::infra::config::{Config, PackageSpec};

const BUILTIN_TEMPLATE: &str = "standalone";
const EXTERNAL_TEMPLATE: &str = "external";

/// Renders report bodies into complete LaTeX documents.
///
/// The body is inserted verbatim: no escaping and no validation. Broken markup only shows up
/// when the document is compiled.
pub struct ReportAssembler {
    env: Environment<'static>,
    custom_template: Option<String>,
    document_class: String,
    packages: Vec<PackageSpec>,
}

impl ReportAssembler {
    /// Assembler using the built-in shell with the given class and packages.
    pub fn new(document_class: impl Into<String>, packages: Vec<PackageSpec>) -> Result<Self> {
        Ok(Self {
            env: default_environment()?,
            custom_template: None,
            document_class: document_class.into(),
            packages,
        })
    }

    /// Build an assembler from the `[document]` configuration, loading a custom template if set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut assembler = Self::new(config.document.class(), config.document.packages())?;
        if let Some(path) = config.document.template() {
            assembler.load_template(path)?;
        }
        Ok(assembler)
    }

    /// Replace the built-in shell with the template stored at `path`.
    pub fn load_template(&mut self, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to load template from path {}", path.display()))?;
        external_environment(&source)
            .map_err(|err| anyhow!("invalid template '{}': {err}", path.display()))?;
        self.custom_template = Some(source);
        tracing::debug!(path = %path.display(), "using custom document template");
        Ok(())
    }

    /// Produce a standalone document around `body`.
    pub fn assemble(&self, body: &str) -> Result<String> {
        let context = TemplateContext {
            document_class: &self.document_class,
            packages: &self.packages,
            body,
        };

        if let Some(source) = &self.custom_template {
            let env = external_environment(source)
                .map_err(|err| anyhow!("invalid custom template: {err}"))?;
            return render(&env, EXTERNAL_TEMPLATE, &context);
        }
        render(&self.env, BUILTIN_TEMPLATE, &context)
    }
}

fn render(env: &Environment<'_>, name: &str, context: &TemplateContext<'_>) -> Result<String> {
    env.get_template(name)
        .and_then(|template| template.render(context))
        .map_err(|err| anyhow!("failed to render template '{name}': {err}"))
}

fn external_environment(source: &str) -> Result<Environment<'_>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template(EXTERNAL_TEMPLATE, source)?;
    Ok(env)
}

fn default_environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template(BUILTIN_TEMPLATE, STANDALONE_TEMPLATE)
        .map_err(|err| anyhow!("failed to register built-in document template: {err}"))?;
    Ok(env)
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    document_class: &'a str,
    packages: &'a [PackageSpec],
    body: &'a str,
}

// Braces hugging `{{-`/`-}}` keep LaTeX groups apart from template delimiters.
const STANDALONE_TEMPLATE: &str = r"\documentclass{ {{- document_class -}} }%
{% for package in packages %}
\usepackage{% if package.options %}[{{ package.options }}]{% endif %}{ {{- package.name -}} }%
{% endfor %}
\begin{document}%
\normalsize%
{{ body }}
\end{document}
";

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    fn assembler() -> ReportAssembler {
        ReportAssembler::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn wraps_body_in_document_environment() {
        let document = assembler().assemble("\\section{Intro}").unwrap();

        assert!(document.starts_with("\\documentclass{article}%\n"));
        assert!(document.contains("\\usepackage[T1]{fontenc}%\n"));
        assert!(document.contains("\\usepackage{lmodern}%\n"));
        assert!(document.contains("\\begin{document}%\n\\normalsize%\n\\section{Intro}\n\\end{document}"));
    }

    #[test]
    fn body_is_inserted_verbatim() {
        let body = "\\begin{table}\n & 50% <b> \"quoted\" {{ not a tag }}\n\\end{table}";
        let document = assembler().assemble(body).unwrap();
        assert!(document.contains(body));
    }

    #[test]
    fn class_and_packages_follow_configuration() {
        let assembler = ReportAssembler::new(
            "report",
            vec![PackageSpec::new("geometry", Some("margin=2cm"))],
        )
        .unwrap();
        let document = assembler.assemble("x").unwrap();

        assert!(document.starts_with("\\documentclass{report}%\n\\usepackage[margin=2cm]{geometry}%\n"));
        assert!(!document.contains("fontenc"));
    }

    #[test]
    fn custom_template_receives_context() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("shell.tex.j2");
        fs::write(
            &path,
            "% {{ packages | length }} packages\n\\documentclass{ {{- document_class -}} }\n{{ body }}\n",
        )?;

        let mut assembler = assembler();
        assembler.load_template(&path)?;
        let document = assembler.assemble("\\section{A}")?;

        assert_eq!(document, "% 5 packages\n\\documentclass{article}\n\\section{A}");
        Ok(())
    }

    #[test]
    fn broken_template_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.j2");
        fs::write(&path, "{% for x in %}")?;

        let mut assembler = assembler();
        assert!(assembler.load_template(&path).is_err());
        Ok(())
    }
}
