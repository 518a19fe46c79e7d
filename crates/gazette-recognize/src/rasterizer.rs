//! Document rasterization: document file → ordered page images.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use gazette_core::{Error, Result};
use tracing::{debug, info};

use crate::types::{DocumentKind, PageImage};

/// Trait for rasterization backends.
pub trait Rasterizer: Send + Sync {
    /// Render `document` into page images under `out_dir`, in page order.
    ///
    /// An empty result means the document has zero pages. A missing tool is
    /// reported as `Error::RendererUnavailable`, an unreadable document as
    /// `Error::Render`.
    fn render(
        &self,
        document: &Path,
        kind: DocumentKind,
        out_dir: &Path,
        dpi: u32,
    ) -> Result<Vec<PageImage>>;
}

/// Poppler-backed rasterizer (`pdftoppm`). Image uploads are copied as page 1.
pub struct PopplerRasterizer {
    poppler_path: Option<PathBuf>,
}

impl PopplerRasterizer {
    pub fn new(poppler_path: Option<PathBuf>) -> Self {
        Self { poppler_path }
    }

    /// Resolve the `pdftoppm` executable.
    fn pdftoppm_program(&self) -> Result<PathBuf> {
        let exe = if cfg!(windows) { "pdftoppm.exe" } else { "pdftoppm" };
        let dir = match &self.poppler_path {
            Some(dir) => dir,
            None => return Ok(PathBuf::from(exe)),
        };
        if !dir.exists() {
            return Err(Error::RendererUnavailable(format!(
                "poppler directory does not exist: {}",
                dir.display()
            )));
        }
        // Some poppler distributions keep the binaries one level up from the configured dir.
        let candidates = [Some(dir.join(exe)), dir.parent().map(|p| p.join(exe))];
        candidates
            .into_iter()
            .flatten()
            .find(|p| p.exists())
            .ok_or_else(|| {
                Error::RendererUnavailable(format!("{} not found under {}", exe, dir.display()))
            })
    }

    fn render_pdf(&self, document: &Path, out_dir: &Path, dpi: u32) -> Result<Vec<PageImage>> {
        let program = self.pdftoppm_program()?;
        let prefix = out_dir.join("page");
        debug!("Running {} at {} dpi on {}", program.display(), dpi, document.display());

        let output = Command::new(&program)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(document)
            .arg(&prefix)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::RendererUnavailable(format!(
                    "{} not found; install poppler or set POPPLER_PATH",
                    program.display()
                )),
                _ => Error::RendererUnavailable(format!(
                    "failed to start {}: {}",
                    program.display(),
                    e
                )),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Render(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let pages = collect_rendered_pages(out_dir)?;
        info!("Rendered {} page(s) from {}", pages.len(), document.display());
        Ok(pages)
    }

    fn copy_image(
        &self,
        document: &Path,
        kind: DocumentKind,
        out_dir: &Path,
    ) -> Result<Vec<PageImage>> {
        let target = out_dir.join(format!("page_1.{}", kind.extension()));
        std::fs::copy(document, &target).map_err(|e| {
            Error::Render(format!("cannot read image {}: {}", document.display(), e))
        })?;
        Ok(vec![PageImage::new(1, target)])
    }
}

impl Rasterizer for PopplerRasterizer {
    fn render(
        &self,
        document: &Path,
        kind: DocumentKind,
        out_dir: &Path,
        dpi: u32,
    ) -> Result<Vec<PageImage>> {
        std::fs::create_dir_all(out_dir)?;
        if kind.is_image() {
            self.copy_image(document, kind, out_dir)
        } else {
            self.render_pdf(document, out_dir, dpi)
        }
    }
}

/// Gather `page-<n>.png` files written by `pdftoppm` (which zero-pads `<n>`
/// for long documents), order them numerically and rename to `page_<n>.png`.
fn collect_rendered_pages(out_dir: &Path) -> Result<Vec<PageImage>> {
    let mut numbered: Vec<(u32, PathBuf)> = std::fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let number = name
                .strip_prefix("page-")
                .and_then(|rest| rest.strip_suffix(".png"))
                .and_then(|n| n.parse::<u32>().ok())?;
            Some((number, entry.path()))
        })
        .collect();
    numbered.sort_by_key(|(n, _)| *n);

    let mut pages = Vec::with_capacity(numbered.len());
    for (number, path) in numbered {
        let target = out_dir.join(format!("page_{}.png", number));
        std::fs::rename(&path, &target)?;
        pages.push(PageImage::new(number, target));
    }
    Ok(pages)
}
