/*!
 * Reference classification.
 *
 * Finds every cross-reference, substitution and hyperlink in a text unit and
 * resolves overlapping candidates so that each byte belongs to at most one
 * fragment. Character classes exclude backticks rather than newlines, so a
 * reference wrapped over several lines is matched as a single fragment.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::MarkupError;
use super::fragment::{Fragment, FragmentKind};

/// `:ref:`display <label>``; group 1 display, 2 separator, 3 label
static LABELED_REF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r":ref:`([^`<]*?)(\s*)<([^<>`]+)>`").expect("Invalid labeled-ref regex")
});

/// `:ref:`label``
static BARE_REF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r":ref:`([^`<>]+)`").expect("Invalid bare-ref regex")
});

/// `|name|`, name must not start or end with whitespace
static SUBSTITUTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|([^|\s](?:[^|\n]*[^|\s])?)\|(__?)?").expect("Invalid substitution regex")
});

/// `` `text <url>`_ `` and `` `text <url>`__ ``
static HYPERLINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"`([^`<]*?)(\s*)<([^<>`]+)>`(__?)").expect("Invalid hyperlink regex")
});

fn pattern_for(kind: FragmentKind) -> &'static Regex {
    match kind {
        FragmentKind::CrossRefWithLabel => &LABELED_REF_REGEX,
        FragmentKind::CrossRefBare => &BARE_REF_REGEX,
        FragmentKind::Substitution => &SUBSTITUTION_REGEX,
        FragmentKind::HyperlinkWithUrl => &HYPERLINK_REGEX,
    }
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn fragment_from(kind: FragmentKind, caps: &Captures<'_>) -> Option<Fragment> {
    let whole = caps.get(0)?;
    let (display_text, separator, target, suffix) = match kind {
        FragmentKind::CrossRefWithLabel => (group(caps, 1), group(caps, 2), group(caps, 3), ""),
        FragmentKind::CrossRefBare => ("", "", group(caps, 1), ""),
        FragmentKind::Substitution => ("", "", group(caps, 1), group(caps, 2)),
        FragmentKind::HyperlinkWithUrl => (group(caps, 1), group(caps, 2), group(caps, 3), group(caps, 4)),
    };

    Some(Fragment {
        kind,
        span: whole.start()..whole.end(),
        display_text: display_text.to_string(),
        target: target.to_string(),
        separator: separator.to_string(),
        suffix: suffix.to_string(),
    })
}

/// Every match of every pattern, before overlap resolution
pub fn candidates(text: &str) -> Vec<Fragment> {
    FragmentKind::ALL
        .iter()
        .flat_map(|&kind| {
            pattern_for(kind)
                .captures_iter(text)
                .filter_map(move |caps| fragment_from(kind, &caps))
        })
        .collect()
}

/// Interval-occupancy scan: candidates are visited by (priority, start) and
/// accepted only if they do not touch an already accepted span.
pub fn resolve_overlaps(mut candidates: Vec<Fragment>) -> Vec<Fragment> {
    candidates.sort_by_key(|f| (f.kind.priority(), f.span.start));

    let mut accepted: Vec<Fragment> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.iter().any(|kept| kept.overlaps(&candidate)) {
            continue;
        }
        accepted.push(candidate);
    }

    accepted.sort_by_key(|f| f.span.start);
    accepted
}

/// Fails if any two fragments (sorted by start) overlap
pub fn ensure_disjoint(text: &str, fragments: &[Fragment]) -> Result<(), MarkupError> {
    let offending: Vec<(usize, usize)> = fragments
        .windows(2)
        .filter(|pair| pair[0].span.end > pair[1].span.start)
        .flat_map(|pair| [(pair[0].span.start, pair[0].span.end), (pair[1].span.start, pair[1].span.end)])
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(MarkupError::OverlappingFragments {
            text: text.to_string(),
            spans: offending,
        })
    }
}

/// Classify a text unit into non-overlapping fragments sorted by start
pub fn classify(text: &str) -> Result<Vec<Fragment>, MarkupError> {
    let fragments = resolve_overlaps(candidates(text));
    ensure_disjoint(text, &fragments)?;
    Ok(fragments)
}
