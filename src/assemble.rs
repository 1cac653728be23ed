//! Assembling the whole wiki into one document and rendering it.
//!
//! The intermediate files use fixed names inside the work directory, so only
//! one run may use a given work directory at a time.

use crate::links;
use crate::page::{self, PageFragment};
use crate::page_ordering::{self, HOME_PAGE};
use crate::settings::Settings;
use crate::tools::{PdfJob, Toolchain};
use crate::wiki_config;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

pub const DOCUMENT_FILE: &str = "wikidoc.html";
pub const COVER_FILE: &str = "wikidoc_cover.html";
pub const TOC_FILE: &str = "wikidoc_toc.xsl";

/// What a run produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    /// The merged HTML document, kept after the run
    pub document: PathBuf,
    /// The rendered PDF, if the renderer succeeded
    pub pdf: Option<PathBuf>,
    pub pages: usize,
    pub empty_pages: usize,
    pub images: Vec<PathBuf>,
    pub image_failures: usize,
}

/// Temporary files that are removed again once the run is over.
#[derive(Default)]
struct TempFiles(Vec<PathBuf>);

impl TempFiles {
    fn write(&mut self, path: PathBuf, contents: &str) -> Result<PathBuf> {
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.0.push(path.clone());
        Ok(path)
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            if let Err(e) = std::fs::remove_file(path) {
                log::debug!("Failed to remove {}: {e}", path.display());
            }
        }
    }
}

fn rewrite_in_place(path: &Path, settings: &Settings) -> Result<()> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let html = links::rewrite_document(&html, settings.image_rewrite.as_ref());
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))
}

/// Merge every page of the wiki and render the result to PDF.
///
/// Only configuration problems are errors. Pages that fail to convert, images
/// that fail to render and a failing PDF renderer are logged and reflected in
/// the returned report.
pub fn assemble(
    settings: &Settings,
    tools: &Toolchain<'_>,
    progress: &ProgressBar,
) -> Result<AssemblyReport> {
    let (config, renderer_config) =
        wiki_config::load(&settings.wiki.join(HOME_PAGE), settings.generation_date)?;
    let pages = page_ordering::resolve(&settings.wiki)?;

    let mut report = AssemblyReport::default();
    progress.set_length(pages.len() as u64 + 1);

    let mut html = Vec::with_capacity(pages.len() + 3);
    html.push(config.head.clone());
    for filename in std::iter::once(HOME_PAGE).chain(pages.iter().map(String::as_str)) {
        progress.set_message(filename.to_string());
        let PageFragment {
            html: fragment,
            images_written,
            image_failures,
        } = page::transform(filename, settings, &config, tools.converter, tools.images);
        progress.inc(1);

        report.pages += 1;
        if fragment.is_empty() {
            report.empty_pages += 1;
        }
        report.images.extend(images_written);
        report.image_failures += image_failures;
        html.push(fragment);
    }
    html.push(config.foot.clone());

    let document = settings.work_dir.join(DOCUMENT_FILE);
    std::fs::write(&document, html.join("\n"))
        .with_context(|| format!("Failed to write {}", document.display()))?;
    report.document = document.clone();

    let mut temp_files = TempFiles::default();
    let cover = match &config.cover {
        Some(cover) => {
            let cover = links::rewrite_document(cover, settings.image_rewrite.as_ref());
            Some(temp_files.write(settings.work_dir.join(COVER_FILE), &config.wrap(&cover))?)
        }
        None => None,
    };
    let toc_xsl = match &config.toc_xsl {
        Some(xsl) => Some(temp_files.write(settings.work_dir.join(TOC_FILE), xsl)?),
        None => None,
    };

    rewrite_in_place(&document, settings)?;

    let job = PdfJob {
        flags: renderer_config.args(),
        cover,
        toc_xsl,
        document,
        output: settings.wiki.join(&config.filename),
    };
    progress.set_message(format!("Rendering {}", config.filename));
    match tools.pdf.render_pdf(&job) {
        Ok(()) => report.pdf = Some(job.output),
        Err(e) => log::warn!(
            "Something went wrong rendering {}: {e:#}",
            job.output.display()
        ),
    }
    progress.finish_and_clear();

    Ok(report)
}
