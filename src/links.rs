//! Rewriting of links once all pages live in a single document.
//!
//! On the wiki every page is its own URL, so pages link to each other with
//! `href="Other-Page"`. After merging, those targets have to become fragment
//! links (`href="#Other-Page"`) pointing at the heading that starts each page.

const PAGE_BREAK_CLASS: &str = r#"class="breakbefore""#;
const HREF: &str = r#"href=""#;
const RAW_SUFFIX: &str = "?raw=true";

/// Replace remote image URLs with a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRewrite {
    pub remote_prefix: String,
    pub local_prefix: String,
}

/// Rewrite every line. The output always has as many lines as the input.
pub fn rewrite_lines<S: AsRef<str>>(lines: &[S], images: Option<&ImageRewrite>) -> Vec<String> {
    lines
        .iter()
        .map(|line| rewrite_line(line.as_ref(), images))
        .collect()
}

/// Rewrite the lines of a whole document, keeping its line structure.
pub fn rewrite_document(document: &str, images: Option<&ImageRewrite>) -> String {
    let lines: Vec<&str> = document.split('\n').collect();
    rewrite_lines(&lines, images).join("\n")
}

pub fn rewrite_line(line: &str, images: Option<&ImageRewrite>) -> String {
    let mut line = if line.contains(PAGE_BREAK_CLASS) && line.starts_with("<h1") {
        inject_anchor(line)
    } else {
        line.to_string()
    };

    if line.contains(HREF) {
        line = rewrite_hrefs(&line);
    }

    if let Some(images) = images {
        if !images.remote_prefix.is_empty() && line.contains(&images.remote_prefix) {
            line = line
                .replace(&images.remote_prefix, &images.local_prefix)
                .replace(RAW_SUFFIX, "");
        }
    }

    line
}

/// Give a page-breaking `<h1>` an id derived from its text.
fn inject_anchor(line: &str) -> String {
    let Some(tag_end) = line.find('>') else {
        return line.to_string();
    };
    let (tag, rest) = line.split_at(tag_end);
    if tag
        .split_whitespace()
        .any(|attribute| attribute.starts_with("id=\""))
    {
        return line.to_string();
    }

    let text = &rest[1..];
    let text = match text.find('<') {
        Some(idx) => &text[..idx],
        None => text,
    };
    format!(r#"{tag} id="{}"{rest}"#, text.replace(' ', "-"))
}

/// Whether an href value already points somewhere outside the wiki pages.
fn is_external(value: &str) -> bool {
    if value.is_empty() || value.starts_with('"') || value.starts_with('#') {
        return true;
    }
    let Some(colon) = value.find(':') else {
        return false;
    };
    let scheme = &value[..colon];
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn rewrite_hrefs(line: &str) -> String {
    let mut parts = line.split(HREF);
    let mut out = String::with_capacity(line.len() + 8);
    out.push_str(parts.next().unwrap_or_default());
    for part in parts {
        out.push_str(HREF);
        if !is_external(part) {
            out.push('#');
        }
        out.push_str(part);
    }
    out
}
