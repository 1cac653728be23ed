//! The external programs that do the heavy lifting.
//!
//! Markdown conversion, image rendering and PDF rendering all happen in other
//! processes. The pipeline only talks to them through these traits, which
//! keeps it testable without pandoc or wkhtmltopdf installed.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

mod pandoc;
pub use pandoc::*;

mod wkhtmltox;
pub use wkhtmltox::*;

/// Width in pixels of images rendered from PDF-only sections.
pub const IMAGE_WIDTH: u32 = 700;

pub trait MarkdownConverter {
    /// Convert a markdown page to HTML.
    fn convert(&self, page: &Path) -> Result<String>;
}

pub trait ImageRenderer {
    /// Render an HTML file to a PNG image of the given width.
    fn render_image(&self, html: &Path, width: u32, output: &Path) -> Result<()>;
}

/// Everything the PDF renderer needs to produce the manual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfJob {
    pub flags: Vec<String>,
    pub cover: Option<PathBuf>,
    pub toc_xsl: Option<PathBuf>,
    pub document: PathBuf,
    pub output: PathBuf,
}

impl PdfJob {
    /// The renderer's argument list, in the order it expects them.
    pub fn args(&self) -> Vec<String> {
        let mut args = self.flags.clone();
        if let Some(cover) = &self.cover {
            args.push("cover".to_string());
            args.push(cover.display().to_string());
        }
        if let Some(toc) = &self.toc_xsl {
            args.push("toc".to_string());
            args.push("--xsl-style-sheet".to_string());
            args.push(toc.display().to_string());
        }
        args.push(self.document.display().to_string());
        args.push(self.output.display().to_string());
        args
    }
}

pub trait PdfRenderer {
    fn render_pdf(&self, job: &PdfJob) -> Result<()>;
}

/// One of each external tool. Without an image renderer, PDF-only sections are
/// still merged into the document but not exported as images.
pub struct Toolchain<'a> {
    pub converter: &'a dyn MarkdownConverter,
    pub images: Option<&'a dyn ImageRenderer>,
    pub pdf: &'a dyn PdfRenderer,
}

/// Run a command to completion, failing on a non-zero exit status.
pub(crate) fn run(command: &mut Command) -> Result<Output> {
    let program = command.get_program().to_string_lossy().to_string();
    log::debug!("Running {command:?}");
    let output = command
        .output()
        .with_context(|| format!("Failed to launch `{program}`"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "`{program}` exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }
    Ok(output)
}
