//! Copying the accumulated report text to the system clipboard.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Which mechanism ended up holding the copied text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyBackend {
    System,
    Command(&'static str),
}

impl CopyBackend {
    pub fn describe(&self) -> &'static str {
        match self {
            CopyBackend::System => "system clipboard",
            CopyBackend::Command(program) => program,
        }
    }
}

/// Clipboard access through `arboard`, with command-line tools as a fallback.
pub struct Clipboard {
    system: Option<arboard::Clipboard>,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard {
    pub fn new() -> Self {
        let system = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                tracing::debug!(error = %err, "system clipboard unavailable");
                None
            }
        };
        Self { system }
    }

    /// Copy `text`, reporting which backend accepted it.
    pub fn copy(&mut self, text: &str) -> Result<CopyBackend> {
        if let Some(system) = self.system.as_mut() {
            match system.set_text(text.to_owned()) {
                Ok(()) => return Ok(CopyBackend::System),
                Err(err) => {
                    tracing::warn!(error = %err, "system clipboard rejected text");
                    self.system = None;
                }
            }
        }

        for command in fallback_commands() {
            match pipe_to(command, text) {
                Ok(()) => return Ok(CopyBackend::Command(command[0])),
                Err(err) => tracing::debug!(program = command[0], error = %err, "clipboard fallback failed"),
            }
        }
        Err(anyhow!("no clipboard backend accepted the text"))
    }
}

fn pipe_to(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .with_context(|| format!("failed to write to {program}"))?;
    }

    let status = child
        .wait()
        .with_context(|| format!("{program} did not exit cleanly"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("{program} exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["pbcopy"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["wl-copy"], &["xclip", "-selection", "clipboard"], &["xsel", "--clipboard", "--input"]]
}

#[cfg(target_os = "windows")]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[&["clip.exe"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn fallback_commands() -> &'static [&'static [&'static str]] {
    &[]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_commands_name_a_program() {
        assert!(fallback_commands().iter().all(|command| !command.is_empty()));
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(pipe_to(&["texpick-no-such-clipboard-tool"], "text").is_err());
    }

    #[test]
    fn backend_descriptions() {
        assert_eq!(CopyBackend::System.describe(), "system clipboard");
        assert_eq!(CopyBackend::Command("xclip").describe(), "xclip");
    }
}
