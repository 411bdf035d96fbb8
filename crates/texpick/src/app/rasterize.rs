//! Rendering the first page of a compiled report to an image.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use time::OffsetDateTime;

use crate::app::naming::{strip_extension, with_appended_extension};
use crate::infra::config::Config;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Failure while rasterizing a PDF page.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("rasterizer '{program}' could not be started: {source}")]
    ToolMissing {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("rasterizing {} failed: {detail}", .pdf.display())]
    Failed { pdf: PathBuf, detail: String },
    #[error("rasterizer produced no image at {}", .path.display())]
    NoOutput { path: PathBuf },
}

/// An image of the first page of a compiled report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub image: PathBuf,
    pub pdf: PathBuf,
    /// Pixel size read from the PNG header, when it could be read.
    pub dimensions: Option<(u32, u32)>,
    pub rendered_at: OffsetDateTime,
}

/// Something that can turn page one of a PDF into a PNG at `target`.
pub trait Rasterizer {
    fn first_page(&self, pdf: &Path, target: &Path) -> Result<RenderedPage, RasterError>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: String,
    dpi: u32,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            program: "pdftoppm".into(),
            dpi: 100,
        }
    }
}

impl PdftoppmRasterizer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.preview.program().to_owned(),
            dpi: config.preview.dpi(),
        }
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn first_page(&self, pdf: &Path, target: &Path) -> Result<RenderedPage, RasterError> {
        // pdftoppm appends the extension to the prefix it is given.
        let prefix = strip_extension(target);
        let image = with_appended_extension(&prefix, "png");

        tracing::info!(pdf = %pdf.display(), image = %image.display(), "rasterizing first page");
        let output = Command::new(&self.program)
            .arg("-png")
            .args(["-f", "1", "-l", "1"])
            .arg("-singlefile")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|source| RasterError::ToolMissing {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| format!("exited with status {}", output.status));
            return Err(RasterError::Failed {
                pdf: pdf.to_path_buf(),
                detail,
            });
        }

        if !image.exists() {
            return Err(RasterError::NoOutput { path: image });
        }

        Ok(RenderedPage {
            dimensions: png_dimensions(&image),
            image,
            pdf: pdf.to_path_buf(),
            rendered_at: OffsetDateTime::now_utc(),
        })
    }
}

/// Where the preview image for `pdf` goes: relative names are placed next to the PDF.
pub fn preview_target(pdf: &Path, image_name: &str) -> PathBuf {
    let name = Path::new(image_name);
    if name.is_absolute() {
        return name.to_path_buf();
    }
    match pdf.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => name.to_path_buf(),
    }
}

/// Width and height from a PNG's IHDR chunk.
pub fn png_dimensions(path: &Path) -> Option<(u32, u32)> {
    let mut header = [0u8; 24];
    File::open(path).ok()?.read_exact(&mut header).ok()?;
    if header[..8] != PNG_SIGNATURE || &header[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes([header[16], header[17], header[18], header[19]]);
    let height = u32::from_be_bytes([header[20], header[21], header[22], header[23]]);
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::tempdir;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    #[test]
    fn reads_png_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.png");
        fs::write(&path, png_header(827, 1169)).unwrap();

        assert_eq!(png_dimensions(&path), Some((827, 1169)));
    }

    #[test]
    fn non_png_has_no_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.png");
        fs::write(&path, b"%PDF-1.5 not an image at all").unwrap();

        assert_eq!(png_dimensions(&path), None);
        assert_eq!(png_dimensions(&dir.path().join("missing.png")), None);
    }

    #[test]
    fn preview_target_sits_next_to_pdf() {
        assert_eq!(
            preview_target(Path::new("out/report.pdf"), "preview.png"),
            PathBuf::from("out/preview.png")
        );
        assert_eq!(
            preview_target(Path::new("report.pdf"), "preview.png"),
            PathBuf::from("preview.png")
        );
    }

    #[test]
    fn missing_rasterizer_is_reported() {
        let dir = tempdir().unwrap();
        let rasterizer = PdftoppmRasterizer {
            program: "texpick-missing-rasterizer".into(),
            dpi: 72,
        };
        let err = rasterizer
            .first_page(&dir.path().join("report.pdf"), &dir.path().join("preview.png"))
            .unwrap_err();
        assert!(matches!(err, RasterError::ToolMissing { .. }));
    }
}
