use super::{run, ImageRenderer, PdfJob, PdfRenderer};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const PDF_RENDERER: &str = "wkhtmltopdf";
pub const IMAGE_RENDERER: &str = "wkhtmltoimage";

/// Renders HTML to PNG with `wkhtmltoimage`.
#[derive(Debug, Clone)]
pub struct Wkhtmltoimage {
    pub program: PathBuf,
}

impl Wkhtmltoimage {
    pub fn new<P: Into<PathBuf>>(program: P) -> Wkhtmltoimage {
        Wkhtmltoimage {
            program: program.into(),
        }
    }

    fn command(&self, html: &Path, width: u32, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--width")
            .arg(width.to_string())
            .arg(html)
            .arg(output);
        command
    }
}

impl ImageRenderer for Wkhtmltoimage {
    fn render_image(&self, html: &Path, width: u32, output: &Path) -> Result<()> {
        run(&mut self.command(html, width, output))?;
        Ok(())
    }
}

/// Renders the assembled document to PDF with `wkhtmltopdf`.
#[derive(Debug, Clone)]
pub struct Wkhtmltopdf {
    pub program: PathBuf,
    pub work_dir: PathBuf,
}

impl Wkhtmltopdf {
    pub fn new<P: Into<PathBuf>, W: Into<PathBuf>>(program: P, work_dir: W) -> Wkhtmltopdf {
        Wkhtmltopdf {
            program: program.into(),
            work_dir: work_dir.into(),
        }
    }
}

impl PdfRenderer for Wkhtmltopdf {
    fn render_pdf(&self, job: &PdfJob) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(job.args()).current_dir(&self.work_dir);
        run(&mut command)?;
        Ok(())
    }
}

/// Look for `wkhtmltoimage` installed alongside the PDF renderer.
///
/// Windows builds ship as `.exe`, so that variant is checked too.
pub fn find_image_renderer(pdf_renderer: &Path) -> Option<PathBuf> {
    let dir = pdf_renderer.parent().unwrap_or_else(|| Path::new(""));
    [IMAGE_RENDERER.to_string(), format!("{IMAGE_RENDERER}.exe")]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}
