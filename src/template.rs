//! Template tokens that page authors can drop into their markdown.
//!
//! Two tokens are supported and both are replaced literally wherever they occur:
//! - `###_WIKIDOC_GENDATE_###` becomes the generation date (`dd.mm.yyyy`)
//! - `###_WIKIDOC_TITLE_###` becomes a title derived from the page's file name

use chrono::NaiveDate;
use std::path::Path;

pub const GENDATE_TOKEN: &str = "###_WIKIDOC_GENDATE_###";
pub const TITLE_TOKEN: &str = "###_WIKIDOC_TITLE_###";

/// Derive a human readable title from a wiki page file name.
///
/// `Getting-Started.md` becomes `Getting Started`.
pub fn title_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    stem.replace('-', " ")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Replace every template token in `text`.
pub fn substitute(text: &str, filename: &str, date: NaiveDate) -> String {
    text.replace(GENDATE_TOKEN, &format_date(date))
        .replace(TITLE_TOKEN, &title_from_filename(filename))
}
