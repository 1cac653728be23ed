use super::{run, MarkdownConverter};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Embedded media is extracted into this directory, relative to the work directory.
pub const MEDIA_DIR: &str = "downloaded_imgs";

/// Converts GitHub flavoured markdown to HTML with pandoc.
#[derive(Debug, Clone)]
pub struct Pandoc {
    pub program: PathBuf,
    pub work_dir: PathBuf,
}

impl Pandoc {
    pub fn new<P: Into<PathBuf>, W: Into<PathBuf>>(program: P, work_dir: W) -> Pandoc {
        Pandoc {
            program: program.into(),
            work_dir: work_dir.into(),
        }
    }

    fn command(&self, page: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--ascii")
            .arg(format!("--extract-media={MEDIA_DIR}"))
            .args(["-r", "gfm", "--mathjax"])
            .arg(page)
            .current_dir(&self.work_dir);
        command
    }
}

impl MarkdownConverter for Pandoc {
    fn convert(&self, page: &Path) -> Result<String> {
        let output = run(&mut self.command(page))?;
        String::from_utf8(output.stdout)
            .with_context(|| format!("pandoc produced invalid UTF-8 for {}", page.display()))
    }
}
