//! Extraction of PDF-only sections from a page.
//!
//! Authors mark content that should only appear in the printed manual with
//!
//! ```text
//! <!-- WIKIDOC PDFONLY optional-name
//! <div class="note">Shown in the PDF, hidden on GitHub</div>
//! WIKIDOC PDFONLY -->
//! ```
//!
//! The section is replaced by its body so it becomes visible in the merged
//! document, and a named section can additionally be exported as an image.
//!
//! Sections are matched from the end of the text towards the start. Each step
//! pairs the rightmost start marker with the rightmost end marker and replaces
//! that span with its body, then scans the result again. Nested sections are
//! resolved this way: the outer start marker pairs with an end marker left
//! behind in the inner body. A body never contains a start marker, so every
//! step removes one and the scan ends after at most one step per start marker.

use std::ops::Range;

pub const START_MARKER: &str = "<!-- WIKIDOC PDFONLY";
pub const END_MARKER: &str = "WIKIDOC PDFONLY -->";

/// A single PDF-only section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Text following the start marker on its line, trimmed. May be empty.
    pub name: String,
    /// The enclosed lines, template-substituted and trimmed.
    pub body: String,
    /// Byte range of the markers and their contents in the text as it was when
    /// this section was matched.
    pub span: Range<usize>,
}

impl Directive {
    /// The name to export the section's image under, if it has one.
    pub fn image_name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }
}

/// The result of scanning a page for PDF-only sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Matched sections in document order.
    pub directives: Vec<Directive>,
    /// The page text with every matched section replaced by its body.
    pub text: String,
}

enum Step {
    Matched { start: usize, end: usize },
    Done,
}

/// Find the rightmost section still left in `text`.
fn next_step(text: &str) -> Step {
    let (Some(start), Some(end_marker)) = (text.rfind(START_MARKER), text.rfind(END_MARKER))
    else {
        return Step::Done;
    };
    let end = end_marker + END_MARKER.len();
    if start >= end_marker {
        return Step::Done;
    }
    Step::Matched { start, end }
}

fn parse_section(section: &str, render_body: &impl Fn(&str) -> String) -> (String, String) {
    let lines: Vec<&str> = section.lines().collect();
    let first = lines.first().copied().unwrap_or_default();
    let first = first.strip_prefix(START_MARKER).unwrap_or(first);
    let name = match first.find(END_MARKER) {
        Some(idx) => &first[..idx],
        None => first,
    };

    let inner = if lines.len() > 2 {
        lines[1..lines.len() - 1].join("\n")
    } else {
        String::new()
    };

    (name.trim().to_string(), render_body(&inner).trim().to_string())
}

/// Scan `text` for PDF-only sections.
///
/// `render_body` is applied to the raw enclosed lines of every section before
/// trimming, which is where template tokens get substituted. Scanning stops at
/// the first unpaired or out-of-order marker, leaving the rest untouched.
pub fn extract<F>(text: &str, render_body: F) -> Extraction
where
    F: Fn(&str) -> String,
{
    let mut directives = Vec::new();
    let mut text = text.to_string();
    let mut remaining_starts = text.matches(START_MARKER).count();

    while let Step::Matched { start, end } = next_step(&text) {
        let (name, body) = parse_section(&text[start..end], &render_body);
        let next = format!("{}{}{}", &text[..start], body, &text[end..]);

        // a substituted body could in principle reintroduce a start marker
        let starts = next.matches(START_MARKER).count();
        if starts >= remaining_starts {
            break;
        }
        remaining_starts = starts;

        directives.push(Directive {
            name,
            body,
            span: start..end,
        });
        text = next;
    }
    directives.reverse();

    Extraction { directives, text }
}
