use clap::Parser;
use std::path::PathBuf;

/// Merges a cloned GitHub wiki into a single PDF manual
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// Path to the wkhtmltopdf executable (looked up on PATH if empty)
    pub renderer: Option<PathBuf>,

    /// Local path to the cloned wiki
    pub wiki: Option<PathBuf>,

    /// URL prefix of images to replace with local files
    pub remote_image_prefix: Option<String>,

    /// Local folder that replaces the remote image prefix
    pub local_image_prefix: Option<String>,

    /// Settings file [default: wikidoc.toml, if present]
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the pandoc executable
    #[clap(long, value_name = "PATH")]
    pub pandoc: Option<PathBuf>,

    /// Don't export PDF-only sections as images
    #[clap(long)]
    pub no_images: bool,

    /// Directory for the intermediate HTML files
    #[clap(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Show debug output
    #[clap(short, long)]
    pub verbose: bool,
}
