//! Global configuration carried by magic comments on the wiki's home page.
//!
//! The home page holds HTML comment pairs such as
//!
//! ```text
//! <!-- WIKIDOC HTMLHEAD
//! <html><head>...</head><body>
//! WIKIDOC HTMLHEAD -->
//! ```
//!
//! GitHub does not render them, but they carry everything needed to wrap the
//! merged pages into one printable document: the HTML head and foot, an
//! optional cover page, an optional table of contents stylesheet and the
//! flags handed to the PDF renderer.

use crate::error::ConfigError;
use crate::template;
use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;

pub const DEFAULT_FILENAME: &str = "wikidoc.pdf";
pub const LOCAL_FILE_ACCESS_FLAG: &str = "--enable-local-file-access";
const FILENAME_PREFIX: &str = "--filename ";

/// The HTML fragments and output name taken from the home page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiConfig {
    pub head: String,
    pub foot: String,
    pub cover: Option<String>,
    pub toc_xsl: Option<String>,
    pub filename: String,
}

impl WikiConfig {
    /// Wrap an HTML body into the configured head and foot.
    pub fn wrap(&self, body: &str) -> String {
        format!("{}\n{}\n{}", self.head, body, self.foot)
    }
}

/// Flags for the PDF renderer, in the order they were written.
///
/// The last entry is always [`LOCAL_FILE_ACCESS_FLAG`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub flags: Vec<String>,
}

impl RendererConfig {
    /// Split every flag line into individual command line arguments.
    pub fn args(&self) -> Vec<String> {
        self.flags
            .iter()
            .flat_map(|line| line.split_whitespace())
            .map(ToString::to_string)
            .collect()
    }
}

fn markers(keyword: &str) -> (String, String) {
    (
        format!("<!-- WIKIDOC {keyword}"),
        format!("WIKIDOC {keyword} -->"),
    )
}

/// Return the text between the first `start` marker and the first `end` marker.
///
/// Surrounding spaces and line breaks are trimmed. Missing markers, or an end
/// marker that doesn't come after the start marker, yield an empty string.
pub fn extract_between<'a>(start: &str, end: &str, text: &'a str) -> &'a str {
    let (Some(start_idx), Some(end_idx)) = (text.find(start), text.find(end)) else {
        return "";
    };
    let content_start = start_idx + start.len();
    if start_idx >= end_idx || content_start > end_idx {
        return "";
    }
    text[content_start..end_idx].trim_matches(|c| matches!(c, ' ' | '\n' | '\r'))
}

fn extract_block<'a>(keyword: &str, text: &'a str) -> &'a str {
    let (start, end) = markers(keyword);
    extract_between(&start, &end, text)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse the magic comments out of the home page's raw text.
pub fn parse(
    text: &str,
    home_page: &Path,
    date: NaiveDate,
) -> Result<(WikiConfig, RendererConfig), ConfigError> {
    let head = extract_block("HTMLHEAD", text);
    let foot = extract_block("HTMLFOOT", text);
    if head.is_empty() || foot.is_empty() {
        return Err(ConfigError::MissingHeadOrFoot {
            path: home_page.to_path_buf(),
        });
    }

    let cover = non_empty(template::substitute(
        extract_block("COVER", text),
        "Cover.md",
        date,
    ));
    let toc_xsl = non_empty(extract_block("TOCXSL", text).to_string());

    let mut filename = None;
    let mut flags = Vec::new();
    for line in extract_block("CONFIG", text).lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.strip_prefix(FILENAME_PREFIX) {
            Some(name) => filename = Some(name.trim().to_string()),
            None => flags.push(line.to_string()),
        }
    }
    flags.push(LOCAL_FILE_ACCESS_FLAG.to_string());

    let config = WikiConfig {
        head: head.to_string(),
        foot: foot.to_string(),
        cover,
        toc_xsl,
        filename: filename
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
    };
    Ok((config, RendererConfig { flags }))
}

/// Read the home page and parse its magic comments.
pub fn load(home_page: &Path, date: NaiveDate) -> Result<(WikiConfig, RendererConfig)> {
    let text =
        std::fs::read_to_string(home_page).map_err(|source| ConfigError::UnreadableHomePage {
            path: home_page.to_path_buf(),
            source,
        })?;
    Ok(parse(&text, home_page, date)?)
}
