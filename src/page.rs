//! Turning a single wiki page into an HTML fragment of the manual.

use crate::directives::{self, Directive};
use crate::settings::Settings;
use crate::template;
use crate::tools::{ImageRenderer, MarkdownConverter, IMAGE_WIDTH};
use crate::wiki_config::WikiConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const IMAGE_DIR: &str = "generated-images";
pub const IMAGE_SCRATCH_FILE: &str = "wikidoc_image.html";

/// The outcome of transforming one page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageFragment {
    pub html: String,
    pub images_written: Vec<PathBuf>,
    pub image_failures: usize,
}

impl PageFragment {
    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

/// Where the image for a named PDF-only section ends up.
pub fn image_path(wiki: &Path, name: &str) -> PathBuf {
    wiki.join(IMAGE_DIR).join(format!("{name}.PNG"))
}

/// Convert a page to HTML, falling back to its raw contents if conversion fails.
fn convert(converter: &dyn MarkdownConverter, path: &Path, filename: &str) -> String {
    match converter.convert(path) {
        Ok(html) => html,
        Err(e) => {
            log::warn!(
                "Could not convert {filename} from github markdown to html, trying to open it as plain html: {e:#}"
            );
            match std::fs::read(path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
                Err(e) => {
                    log::warn!("Could not read {}: {e}", path.display());
                    String::new()
                }
            }
        }
    }
}

/// Export a named PDF-only section as a standalone image.
fn render_image(
    renderer: &dyn ImageRenderer,
    settings: &Settings,
    config: &WikiConfig,
    directive: &Directive,
    name: &str,
) -> Result<PathBuf> {
    log::info!(" -> Converting PDFONLY section < {name} > to PNG.");
    let scratch = settings.work_dir.join(IMAGE_SCRATCH_FILE);
    std::fs::write(&scratch, config.wrap(&directive.body))
        .with_context(|| format!("Failed to write {}", scratch.display()))?;

    let output = image_path(&settings.wiki, name);
    let rendered = renderer.render_image(&scratch, IMAGE_WIDTH, &output);

    if let Err(e) = std::fs::remove_file(&scratch) {
        log::debug!("Failed to remove {}: {e}", scratch.display());
    }
    rendered.map(|_| output)
}

/// Transform the page `filename` of the wiki into an HTML fragment.
///
/// PDF-only sections are inlined into the fragment and, when an image
/// renderer is available, named sections are also written out as PNGs.
/// None of the failures along the way stop the page from being merged.
pub fn transform(
    filename: &str,
    settings: &Settings,
    config: &WikiConfig,
    converter: &dyn MarkdownConverter,
    images: Option<&dyn ImageRenderer>,
) -> PageFragment {
    log::debug!("Transforming {filename}");
    let path = settings.wiki.join(filename);
    let html = convert(converter, &path, filename);
    if html.is_empty() {
        log::warn!("{filename} is empty, skipping it.");
        return PageFragment::default();
    }

    let date = settings.generation_date;
    let extraction =
        directives::extract(&html, |body| template::substitute(body, filename, date));

    let mut fragment = PageFragment::default();
    if let Some(renderer) = images {
        // right to left, so the first of several equally named sections wins
        for directive in extraction.directives.iter().rev() {
            log::debug!("{filename}: PDFONLY section at {:?}", directive.span);
            let Some(name) = directive.image_name() else {
                continue;
            };
            match render_image(renderer, settings, config, directive, name) {
                Ok(output) => fragment.images_written.push(output),
                Err(e) => {
                    log::warn!("Something went wrong converting PDFONLY section {name} to PNG: {e:#}");
                    fragment.image_failures += 1;
                }
            }
        }
    }

    fragment.html = template::substitute(&extraction.text, filename, date);
    fragment
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::settings::tests::settings_for;
    use anyhow::anyhow;
    use std::cell::RefCell;

    /// Treats every page as already converted, optionally failing.
    pub struct FakeConverter {
        pub fail: bool,
    }

    impl MarkdownConverter for FakeConverter {
        fn convert(&self, page: &Path) -> Result<String> {
            if self.fail {
                return Err(anyhow!("converter exploded"));
            }
            Ok(format!("<converted>\n{}", std::fs::read_to_string(page)?))
        }
    }

    /// Records every render request and copies the scratch HTML to the output.
    #[derive(Default)]
    pub struct FakeImageRenderer {
        pub fail: bool,
        pub rendered: RefCell<Vec<(PathBuf, u32, String)>>,
    }

    impl ImageRenderer for FakeImageRenderer {
        fn render_image(&self, html: &Path, width: u32, output: &Path) -> Result<()> {
            let contents = std::fs::read_to_string(html)?;
            self.rendered
                .borrow_mut()
                .push((output.to_path_buf(), width, contents.clone()));
            if self.fail {
                return Err(anyhow!("renderer exploded"));
            }
            std::fs::write(output, contents)?;
            Ok(())
        }
    }

    pub fn config() -> WikiConfig {
        WikiConfig {
            head: "<html>".to_string(),
            foot: "</html>".to_string(),
            cover: None,
            toc_xsl: None,
            filename: "wikidoc.pdf".to_string(),
        }
    }

    const NOTE_PAGE: &str =
        "Intro ###_WIKIDOC_TITLE_###\n<!-- WIKIDOC PDFONLY Note\nWarning: print only\nWIKIDOC PDFONLY -->\nOutro";

    #[test]
    fn named_section_is_inlined_and_exported() {
        let (wiki, work) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        std::fs::create_dir(wiki.path().join(IMAGE_DIR)).unwrap();
        std::fs::write(wiki.path().join("Home.md"), NOTE_PAGE).unwrap();
        let settings = settings_for(wiki.path(), work.path());
        let renderer = FakeImageRenderer::default();

        let fragment = transform(
            "Home.md",
            &settings,
            &config(),
            &FakeConverter { fail: false },
            Some(&renderer),
        );

        assert_eq!(
            fragment.html,
            "<converted>\nIntro Home\nWarning: print only\nOutro"
        );
        let png = wiki.path().join("generated-images/Note.PNG");
        assert_eq!(fragment.images_written, vec![png.clone()]);
        assert!(png.is_file());
        let rendered = renderer.rendered.borrow();
        assert_eq!(rendered[0].1, 700);
        assert_eq!(rendered[0].2, "<html>\nWarning: print only\n</html>");
        assert!(!work.path().join(IMAGE_SCRATCH_FILE).exists());
    }

    #[test]
    fn first_section_wins_a_shared_image_name() {
        let (wiki, work) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        std::fs::create_dir(wiki.path().join(IMAGE_DIR)).unwrap();
        std::fs::write(
            wiki.path().join("Page.md"),
            "<!-- WIKIDOC PDFONLY Note\nfirst\nWIKIDOC PDFONLY -->\n\
             <!-- WIKIDOC PDFONLY Note\nsecond\nWIKIDOC PDFONLY -->",
        )
        .unwrap();
        let settings = settings_for(wiki.path(), work.path());
        let renderer = FakeImageRenderer::default();

        transform(
            "Page.md",
            &settings,
            &config(),
            &FakeConverter { fail: false },
            Some(&renderer),
        );

        let png = std::fs::read_to_string(wiki.path().join("generated-images/Note.PNG")).unwrap();
        assert_eq!(png, "<html>\nfirst\n</html>");
    }

    #[test]
    fn no_images_without_renderer() {
        let (wiki, work) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        std::fs::write(wiki.path().join("Page.md"), NOTE_PAGE).unwrap();
        let settings = settings_for(wiki.path(), work.path());

        let fragment = transform(
            "Page.md",
            &settings,
            &config(),
            &FakeConverter { fail: false },
            None,
        );
        assert!(fragment.html.contains("Warning: print only"));
        assert!(fragment.images_written.is_empty());
    }

    #[test]
    fn renderer_failure_does_not_abort_page() {
        let (wiki, work) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        std::fs::write(wiki.path().join("Page.md"), NOTE_PAGE).unwrap();
        let settings = settings_for(wiki.path(), work.path());
        let renderer = FakeImageRenderer {
            fail: true,
            ..Default::default()
        };

        let fragment = transform(
            "Page.md",
            &settings,
            &config(),
            &FakeConverter { fail: false },
            Some(&renderer),
        );
        assert!(fragment.html.contains("Warning: print only"));
        assert_eq!(fragment.image_failures, 1);
        assert!(!work.path().join(IMAGE_SCRATCH_FILE).exists());
    }

    #[test]
    fn unnamed_sections_are_not_exported() {
        let (wiki, work) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        std::fs::write(
            wiki.path().join("Page.md"),
            "<!-- WIKIDOC PDFONLY\nprint\nWIKIDOC PDFONLY -->",
        )
        .unwrap();
        let settings = settings_for(wiki.path(), work.path());
        let renderer = FakeImageRenderer::default();

        let fragment = transform(
            "Page.md",
            &settings,
            &config(),
            &FakeConverter { fail: false },
            Some(&renderer),
        );
        assert_eq!(fragment.html, "<converted>\nprint");
        assert!(renderer.rendered.borrow().is_empty());
    }

    #[test]
    fn falls_back_to_raw_contents() {
        let (wiki, work) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        std::fs::write(wiki.path().join("Raw.md"), "<p>###_WIKIDOC_TITLE_###</p>").unwrap();
        let settings = settings_for(wiki.path(), work.path());

        let fragment = transform(
            "Raw.md",
            &settings,
            &config(),
            &FakeConverter { fail: true },
            None,
        );
        assert_eq!(fragment.html, "<p>Raw</p>");
    }

    #[test]
    fn empty_page_contributes_nothing() {
        let (wiki, work) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        std::fs::write(wiki.path().join("Empty.md"), "").unwrap();
        let settings = settings_for(wiki.path(), work.path());

        let fragment = transform(
            "Empty.md",
            &settings,
            &config(),
            &FakeConverter { fail: true },
            None,
        );
        assert!(fragment.is_empty());
    }
}
