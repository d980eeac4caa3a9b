/*!
 * Reference inventory of RST sources.
 *
 * Flags the shapes most likely to be corrupted by a translation engine:
 * references wrapped over several lines and references packed closely
 * together.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Gap (in bytes) below which two references count as consecutive
pub const CONSECUTIVE_GAP: usize = 10;

static ANY_REF_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r":ref:`([^`]+)`").expect("Invalid ref scan regex"));

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// One `:ref:` occurrence in a source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    /// 1-based line of the opening `:ref:`
    pub line: usize,
    /// Role content with whitespace collapsed
    pub content: String,
    pub multi_line: bool,
    /// Starts less than [`CONSECUTIVE_GAP`] bytes after the previous reference
    pub consecutive: bool,
}

impl ReferenceSite {
    /// The reference in single-line form
    pub fn formatted(&self) -> String {
        format!(":ref:`{}`", self.content)
    }
}

/// Totals over a set of scanned sites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub total: usize,
    pub multi_line: usize,
    pub consecutive: usize,
}

impl ScanSummary {
    pub fn add(&mut self, sites: &[ReferenceSite]) {
        self.total += sites.len();
        self.multi_line += sites.iter().filter(|s| s.multi_line).count();
        self.consecutive += sites.iter().filter(|s| s.consecutive).count();
    }
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

pub fn scan_references(text: &str) -> Vec<ReferenceSite> {
    let mut sites = Vec::new();
    let mut previous_end: Option<usize> = None;

    for caps in ANY_REF_REGEX.captures_iter(text) {
        let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let consecutive = previous_end.is_some_and(|end| whole.start() - end < CONSECUTIVE_GAP);
        previous_end = Some(whole.end());

        sites.push(ReferenceSite {
            line: text[..whole.start()].matches('\n').count() + 1,
            content: collapse_whitespace(content.as_str()),
            multi_line: content.as_str().contains('\n'),
            consecutive,
        });
    }

    sites
}
