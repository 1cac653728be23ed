//! Which pages go into the manual, and in what order.
//!
//! A GitHub wiki's sidebar (`_Sidebar.md`) is the natural table of contents:
//! if it exists, the pages it links to are merged in the order they appear
//! there. Without a sidebar every markdown page is merged alphabetically.
//! The home page is always merged first by the assembler and never appears
//! in the ordering.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub const HOME_PAGE: &str = "Home.md";
pub const ORDERING_FILE: &str = "_Sidebar.md";

/// Matches `[text](target)`, `[[Target]]` and `[[Text|Target]]`.
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[\[(?:[^\]|]*\|)?(?P<wiki>[^\]|]+)\]\]|\[[^\]]*\]\((?P<link>[^)\s]+)[^)]*\)")
            .expect("reference pattern is valid")
    })
}

/// Every page reference in an ordering file, in document order.
pub fn references(text: &str) -> Vec<String> {
    reference_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            if let Some(wiki) = caps.name("wiki") {
                Some(wiki.as_str().trim().replace(' ', "-"))
            } else {
                caps.name("link").map(|link| link.as_str().to_string())
            }
        })
        .collect()
}

/// Turn a reference into the file name it points at.
pub fn reference_to_filename(reference: &str) -> String {
    let reference = match reference.find('#') {
        Some(idx) => &reference[..idx],
        None => reference,
    };
    if reference.to_ascii_lowercase().ends_with(".md") {
        reference.to_string()
    } else {
        format!("{reference}.md")
    }
}

fn is_excluded(filename: &str) -> bool {
    filename == HOME_PAGE || filename == ORDERING_FILE
}

/// Resolve the ordering file's references against the wiki directory.
///
/// References without a matching file are reported and skipped.
pub fn order_from_references(wiki: &Path, text: &str) -> Vec<String> {
    references(text)
        .into_iter()
        .filter_map(|reference| {
            let filename = reference_to_filename(&reference);
            if wiki.join(&filename).is_file() {
                Some(filename)
            } else {
                log::warn!("Ignoring {ORDERING_FILE} entry \"{reference}\"");
                None
            }
        })
        .filter(|filename| !is_excluded(filename))
        .collect()
}

/// Sort file names alphabetically, ignoring case.
pub fn sort_alphabetically(files: &mut [String]) {
    files.sort_by_cached_key(|f| f.to_lowercase());
}

/// Every markdown page in the wiki directory, alphabetically.
pub fn order_alphabetically(wiki: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(wiki)
        .with_context(|| format!("Failed to list wiki directory {}", wiki.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read entry in {}", wiki.display()))?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.to_ascii_lowercase().ends_with(".md") && !is_excluded(&name) {
            files.push(name);
        }
    }
    sort_alphabetically(&mut files);
    Ok(files)
}

/// Determine the pages to merge after the home page.
pub fn resolve(wiki: &Path) -> Result<Vec<String>> {
    let ordering = wiki.join(ORDERING_FILE);
    if ordering.is_file() {
        match std::fs::read(&ordering) {
            Ok(bytes) => {
                log::info!("Using {ORDERING_FILE} for ordering of pages");
                let text = String::from_utf8_lossy(&bytes);
                return Ok(order_from_references(wiki, &text));
            }
            Err(e) => log::warn!(
                "Could not read {}, falling back to alphabetical ordering: {e}",
                ordering.display()
            ),
        }
    } else {
        log::info!("Using alphabetical ordering of pages");
    }
    order_alphabetically(wiki)
}
