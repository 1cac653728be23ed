//! Run settings, merged from the command line and an optional TOML file.
//!
//! Command line values win over the settings file, which wins over the
//! defaults. The result is validated once and then handed, read-only, to
//! every stage of the pipeline.

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::links::ImageRewrite;
use crate::page::IMAGE_DIR;
use crate::tools::{find_image_renderer, PDF_RENDERER};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use derive_builder::Builder;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_FILE: &str = "wikidoc.toml";

/// The contents of a `wikidoc.toml` file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub renderer: Option<PathBuf>,
    pub wiki: Option<PathBuf>,
    pub remote_image_prefix: Option<String>,
    pub local_image_prefix: Option<String>,
    pub pandoc: Option<PathBuf>,
    pub images: Option<bool>,
    pub work_dir: Option<PathBuf>,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<FileSettings, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::UnreadableSettings {
                path: path.to_path_buf(),
                source,
            })?;
        toml::from_str(&contents).map_err(|source| ConfigError::MalformedSettings {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything a run needs to know, fixed before the first page is touched.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(setter(into))]
pub struct Settings {
    /// The PDF renderer executable
    pub renderer: PathBuf,
    /// The image renderer executable, if PDF-only sections should be exported
    #[builder(setter(into, strip_option), default)]
    pub image_renderer: Option<PathBuf>,
    /// The markdown converter executable
    #[builder(default = "PathBuf::from(\"pandoc\")")]
    pub pandoc: PathBuf,
    /// The directory holding the wiki's markdown pages
    pub wiki: PathBuf,
    /// Remote to local image URL rewriting
    #[builder(setter(into, strip_option), default)]
    pub image_rewrite: Option<ImageRewrite>,
    /// Where the temporary HTML files are written
    #[builder(default = "PathBuf::from(\".\")")]
    pub work_dir: PathBuf,
    /// The date substituted for the generation date token
    pub generation_date: NaiveDate,
}

fn with_trailing_slash(mut s: String) -> String {
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

/// Normalise the remote/local image prefix pair.
///
/// Rewriting is only active with a remote prefix. The local prefix is turned
/// into a `file:///` URL unless it already is one.
pub fn image_rewrite(remote: &str, local: &str) -> Option<ImageRewrite> {
    let remote = remote.trim();
    if remote.is_empty() {
        return None;
    }
    let local = local.trim().replace('\\', "/");
    let local = if local.starts_with("file:") {
        local
    } else {
        format!("file:///{}", local.trim_start_matches('/'))
    };
    Some(ImageRewrite {
        remote_prefix: with_trailing_slash(remote.to_string()),
        local_prefix: with_trailing_slash(local),
    })
}

/// Locate the PDF renderer. Bare program names are looked up on `PATH`.
fn resolve_renderer(renderer: Option<PathBuf>) -> PathBuf {
    let renderer = renderer
        .filter(|r| !r.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(PDF_RENDERER));
    let is_bare_name = renderer.components().count() == 1
        && renderer.parent().is_some_and(|p| p.as_os_str().is_empty());
    if is_bare_name {
        if let Ok(found) = which::which(&renderer) {
            return found;
        }
    }
    std::fs::canonicalize(&renderer).unwrap_or(renderer)
}

/// Decide whether PDF-only sections can be exported as images.
fn resolve_image_renderer(renderer: &Path, wiki: &Path, enabled: bool) -> Option<PathBuf> {
    if !enabled {
        log::info!("PDFONLY sections will not be saved as images, image export is disabled.");
        return None;
    }
    let Some(image_renderer) = find_image_renderer(renderer) else {
        log::info!(
            "PDFONLY sections will not be saved as images, because 'wkhtmltoimage' is not found next to {}.",
            renderer.display()
        );
        return None;
    };
    if !wiki.join(IMAGE_DIR).is_dir() {
        log::info!(
            "PDFONLY sections will not be saved as images, because '{IMAGE_DIR}' folder not found in wiki repository."
        );
        return None;
    }
    Some(image_renderer)
}

impl Settings {
    /// Merge command line arguments with the settings file and validate the result.
    pub fn resolve(cli: &Cli, date: NaiveDate) -> Result<Settings> {
        let file = match &cli.config {
            Some(path) => FileSettings::load(path)?,
            None if Path::new(DEFAULT_SETTINGS_FILE).is_file() => {
                FileSettings::load(Path::new(DEFAULT_SETTINGS_FILE))?
            }
            None => FileSettings::default(),
        };
        Settings::merge(cli, file, date)
    }

    pub fn merge(cli: &Cli, file: FileSettings, date: NaiveDate) -> Result<Settings> {
        let non_empty = |s: &Option<String>| s.clone().filter(|s| !s.is_empty());

        let wiki = cli
            .wiki
            .clone()
            .filter(|w| !w.as_os_str().is_empty())
            .or(file.wiki)
            .ok_or(ConfigError::MissingWikiDirectory)?;
        if !wiki.is_dir() {
            return Err(ConfigError::WikiDirectoryNotFound { path: wiki }.into());
        }
        let wiki = std::fs::canonicalize(&wiki)
            .with_context(|| format!("Failed to canonicalize {}", wiki.display()))?;

        let renderer = resolve_renderer(cli.renderer.clone().or(file.renderer));
        let images_enabled = !cli.no_images && file.images.unwrap_or(true);
        let image_renderer = resolve_image_renderer(&renderer, &wiki, images_enabled);

        let remote = non_empty(&cli.remote_image_prefix)
            .or(file.remote_image_prefix)
            .unwrap_or_default();
        let local = non_empty(&cli.local_image_prefix)
            .or(file.local_image_prefix)
            .unwrap_or_default();

        let work_dir = cli
            .work_dir
            .clone()
            .or(file.work_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&work_dir)
            .with_context(|| format!("Failed to create work directory {}", work_dir.display()))?;
        let work_dir = std::fs::canonicalize(&work_dir)
            .with_context(|| format!("Failed to canonicalize {}", work_dir.display()))?;

        let mut builder = SettingsBuilder::default();
        builder
            .renderer(renderer)
            .pandoc(
                cli.pandoc
                    .clone()
                    .or(file.pandoc)
                    .unwrap_or_else(|| PathBuf::from("pandoc")),
            )
            .wiki(wiki)
            .work_dir(work_dir)
            .generation_date(date);
        if let Some(image_renderer) = image_renderer {
            builder.image_renderer(image_renderer);
        }
        if let Some(rewrite) = image_rewrite(&remote, &local) {
            builder.image_rewrite(rewrite);
        }
        builder.build().with_context(|| "Failed to build settings")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use clap::Parser;

    pub fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date")
    }

    /// Settings for a test wiki with image export disabled.
    pub fn settings_for(wiki: &Path, work_dir: &Path) -> Settings {
        SettingsBuilder::default()
            .renderer("wkhtmltopdf")
            .wiki(wiki)
            .work_dir(work_dir)
            .generation_date(date())
            .build()
            .expect("can build settings")
    }

    #[test]
    fn can_normalise_image_prefixes() {
        assert_eq!(
            image_rewrite("https://github.com/o/r/raw/main/img", "C:\\wiki\\img"),
            Some(ImageRewrite {
                remote_prefix: "https://github.com/o/r/raw/main/img/".to_string(),
                local_prefix: "file:///C:/wiki/img/".to_string(),
            })
        );
        assert_eq!(
            image_rewrite("https://x/", "file:///home/me/img/"),
            Some(ImageRewrite {
                remote_prefix: "https://x/".to_string(),
                local_prefix: "file:///home/me/img/".to_string(),
            })
        );
        assert_eq!(
            image_rewrite("https://x/", "/home/me/img"),
            Some(ImageRewrite {
                remote_prefix: "https://x/".to_string(),
                local_prefix: "file:///home/me/img/".to_string(),
            })
        );
    }

    #[test]
    fn no_rewrite_without_remote_prefix() {
        assert_eq!(image_rewrite("", "/home/me/img"), None);
    }

    #[test]
    fn wiki_directory_is_required() {
        let cli = Cli::parse_from(["wikidoc"]);
        let err = Settings::merge(&cli, FileSettings::default(), date()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingWikiDirectory)
        ));
    }

    #[test]
    fn wiki_directory_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let cli = Cli::parse_from(["wikidoc", "wkhtmltopdf", missing.to_str().unwrap()]);
        let err = Settings::merge(&cli, FileSettings::default(), date()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::WikiDirectoryNotFound { .. })
        ));
    }

    #[test]
    fn command_line_overrides_settings_file() {
        let (wiki, other, work) = (
            tempfile::tempdir().unwrap(),
            tempfile::tempdir().unwrap(),
            tempfile::tempdir().unwrap(),
        );
        let file: FileSettings = toml::from_str(&format!(
            "wiki = {:?}\nremote_image_prefix = \"https://img\"\npandoc = \"/opt/pandoc\"\nimages = false\nwork_dir = {:?}",
            other.path(),
            work.path()
        ))
        .unwrap();
        let cli = Cli::parse_from(["wikidoc", "", wiki.path().to_str().unwrap()]);

        let settings = Settings::merge(&cli, file, date()).unwrap();
        assert_eq!(settings.wiki, std::fs::canonicalize(wiki.path()).unwrap());
        assert_eq!(settings.pandoc, PathBuf::from("/opt/pandoc"));
        assert_eq!(settings.work_dir, std::fs::canonicalize(work.path()).unwrap());
        assert_eq!(settings.image_renderer, None);
        assert_eq!(
            settings.image_rewrite.map(|r| r.remote_prefix),
            Some("https://img/".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn bare_renderer_names_are_looked_up_on_path() {
        let resolved = resolve_renderer(Some(PathBuf::from("sh")));
        assert!(resolved.is_absolute());
        assert_eq!(resolved.file_name(), Some(std::ffi::OsStr::new("sh")));
    }

    #[test]
    fn renderer_paths_are_not_looked_up_on_path() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("wkhtmltopdf");
        std::fs::write(&pdf, "").unwrap();
        assert_eq!(
            resolve_renderer(Some(pdf)),
            std::fs::canonicalize(dir.path().join("wkhtmltopdf")).unwrap()
        );
    }

    #[test]
    fn images_need_renderer_and_image_directory() {
        let (tools, wiki) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let pdf = tools.path().join("wkhtmltopdf");
        let image = tools.path().join("wkhtmltoimage");
        std::fs::write(&pdf, "").unwrap();
        std::fs::write(&image, "").unwrap();

        assert_eq!(resolve_image_renderer(&pdf, wiki.path(), true), None);
        std::fs::create_dir(wiki.path().join(IMAGE_DIR)).unwrap();
        assert_eq!(
            resolve_image_renderer(&pdf, wiki.path(), true),
            Some(image.clone())
        );
        assert_eq!(resolve_image_renderer(&pdf, wiki.path(), false), None);
    }

    #[test]
    fn unknown_settings_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        std::fs::write(&path, "wikki = \"typo\"\n").unwrap();
        assert!(matches!(
            FileSettings::load(&path),
            Err(ConfigError::MalformedSettings { .. })
        ));
    }
}
