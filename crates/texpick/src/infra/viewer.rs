//! Handing rendered previews to the platform's image viewer.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Open `path` with the desktop's default application without waiting for it to exit.
pub fn open(path: &Path) -> Result<()> {
    let (program, args) = opener();
    Command::new(program)
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to launch {program} for {}", path.display()))?;
    tracing::info!(program, path = %path.display(), "opened preview");
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener() -> (&'static str, &'static [&'static str]) {
    ("open", &[])
}

#[cfg(target_os = "windows")]
fn opener() -> (&'static str, &'static [&'static str]) {
    ("cmd", &["/C", "start", ""])
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener() -> (&'static str, &'static [&'static str]) {
    ("xdg-open", &[])
}
