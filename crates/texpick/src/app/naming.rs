//! Choosing output paths that do not clobber existing files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Return `path` if nothing exists there, otherwise the first free `<stem>_<n><.ext>` with
/// `n` counting up from 1.
///
/// Only existence is checked; another process may still create the file before it is written.
pub fn unique_path(path: &Path) -> PathBuf {
    unique_path_with_siblings(path, &[])
}

/// Like [`unique_path`], but a candidate is only free when every `<stem>.<sibling>` next to it
/// is free as well.
pub fn unique_path_with_siblings(path: &Path, siblings: &[&str]) -> PathBuf {
    let is_free = |candidate: &Path| {
        !candidate.exists()
            && siblings
                .iter()
                .all(|extension| !candidate.with_extension(extension).exists())
    };
    if is_free(path) {
        return path.to_path_buf();
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = with_counter(path, counter);
        if is_free(&candidate) {
            tracing::debug!(
                requested = %path.display(),
                chosen = %candidate.display(),
                "output name collided"
            );
            return candidate;
        }
        counter += 1;
    }
}

/// `path` ending in `.extension`: a differently cased match is normalised, anything else gets
/// the extension appended.
pub fn force_extension(path: &Path, extension: &str) -> PathBuf {
    match path.extension() {
        Some(current) if current.eq_ignore_ascii_case(extension) => path.with_extension(extension),
        _ => with_appended_extension(path, extension),
    }
}

/// `path` with its extension removed, keeping any other dots in the file name.
pub fn strip_extension(path: &Path) -> PathBuf {
    match path.file_stem() {
        Some(stem) if path.extension().is_some() => path.with_file_name(stem),
        _ => path.to_path_buf(),
    }
}

/// `path` with `.extension` appended to the full file name.
pub fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn with_counter(path: &Path, counter: u64) -> PathBuf {
    let mut name: OsString = path.file_stem().map(ToOwned::to_owned).unwrap_or_default();
    name.push(format!("_{counter}"));
    if let Some(extension) = path.extension() {
        name.push(".");
        name.push(extension);
    }
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::tempdir;

    #[test]
    fn free_path_is_returned_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        assert_eq!(unique_path(&path), path);
    }

    #[test]
    fn skips_taken_suffixes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("report.pdf"), b"").unwrap();
        fs::write(dir.path().join("report_1.pdf"), b"").unwrap();

        let chosen = unique_path(&dir.path().join("report.pdf"));
        assert_eq!(chosen, dir.path().join("report_2.pdf"));
    }

    #[test]
    fn counter_is_applied_to_full_stem() {
        let dir = tempdir().unwrap();
        for name in ["notes.v2.pdf", "notes.v2_1.pdf", "notes.v2_2.pdf"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let chosen = unique_path(&dir.path().join("notes.v2.pdf"));
        assert_eq!(chosen, dir.path().join("notes.v2_3.pdf"));
    }

    #[test]
    fn extensionless_paths_get_plain_suffix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("draft"), b"").unwrap();

        assert_eq!(
            unique_path(&dir.path().join("draft")),
            dir.path().join("draft_1")
        );
    }

    #[test]
    fn siblings_must_be_free_too() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("paper.tex"), b"source").unwrap();
        fs::write(dir.path().join("paper_1.log"), b"").unwrap();

        let chosen = unique_path_with_siblings(&dir.path().join("paper.pdf"), &["tex", "log"]);
        assert_eq!(chosen, dir.path().join("paper_2.pdf"));
        assert_eq!(
            unique_path_with_siblings(&dir.path().join("other.pdf"), &["tex"]),
            dir.path().join("other.pdf")
        );
    }

    #[test]
    fn extension_helpers() {
        assert_eq!(
            force_extension(Path::new("out/report"), "pdf"),
            PathBuf::from("out/report.pdf")
        );
        assert_eq!(
            force_extension(Path::new("report.PDF"), "pdf"),
            PathBuf::from("report.pdf")
        );
        assert_eq!(
            force_extension(Path::new("thesis.v2"), "pdf"),
            PathBuf::from("thesis.v2.pdf")
        );
        assert_eq!(
            strip_extension(Path::new("out/my.report.pdf")),
            PathBuf::from("out/my.report")
        );
        assert_eq!(
            with_appended_extension(Path::new("out/my.report"), "tex"),
            PathBuf::from("out/my.report.tex")
        );
    }
}
