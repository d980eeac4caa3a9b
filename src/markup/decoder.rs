/*!
 * Decoding of translated text back into markup.
 *
 * Tokens are located left to right. For kinds that carry display text, the
 * translated text between the nearest opening backtick and the token becomes
 * the new display text. When the engine dropped that text, the original
 * display text is used instead. Tokens that vanished are reported so the
 * caller can decide what to do with the unit.
 */

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::encoder::{Placeholder, PlaceholderTable};
use super::fragment::{Fragment, FragmentKind, TOKEN_DRIFT_REGEX};

/// Canonical token shape; group 1 holds the salt
static STRAY_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r" ?\{\{(?:XREF|XLBL|SUBST|LINK)(X*)_\d+\}\}").expect("Invalid stray token regex")
});

/// How a fragment made it back into the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restoration {
    /// Rebuilt around the translated display text
    Translated,
    /// Token survived but its display text did not; original display text used
    DisplayFallback,
    /// Token lost but the target survived literally in the output
    Salvaged,
    /// Token and target both lost
    Lost,
}

/// Per-fragment decoding result
#[derive(Debug, Clone)]
pub struct FragmentOutcome {
    pub fragment: Fragment,
    pub restoration: Restoration,
}

/// Output of [`decode`]
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    pub outcomes: Vec<FragmentOutcome>,
}

impl Decoded {
    /// Fragments whose token and target both vanished
    pub fn lost(&self) -> impl Iterator<Item = &Fragment> {
        self.outcomes
            .iter()
            .filter(|o| o.restoration == Restoration::Lost)
            .map(|o| &o.fragment)
    }

    pub fn count(&self, restoration: Restoration) -> usize {
        self.outcomes.iter().filter(|o| o.restoration == restoration).count()
    }

    pub fn is_complete(&self) -> bool {
        self.count(Restoration::Lost) == 0
    }
}

/// Rewrite drifted token spellings back to the canonical form of this table
fn normalize_token_drift(text: &str, table: &PlaceholderTable) -> String {
    TOKEN_DRIFT_REGEX
        .replace_all(text, |caps: &Captures| {
            let canonical = format!("{{{{{}_{}}}}}", caps[1].to_uppercase(), &caps[2]);
            if table.get(&canonical).is_some() {
                canonical
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Drop tokens with this table's salt that are left after rebuilding; the
/// engine invented or duplicated them. Other salts are source text.
fn strip_stray_tokens(text: &str, salt: usize) -> String {
    STRAY_TOKEN_REGEX
        .replace_all(text, |caps: &Captures| {
            if caps[1].len() == salt {
                debug!("Dropping stray token {}", caps[0].trim_start());
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Replacement for one token occurrence found at `pos`
struct Rebuilt {
    start: usize,
    end: usize,
    markup: String,
    restoration: Restoration,
}

fn rebuild_at(text: &str, floor: usize, pos: usize, placeholder: &Placeholder) -> Rebuilt {
    let fragment = &placeholder.fragment;
    let token_end = pos + placeholder.token.len();

    if !fragment.kind.has_display_text() {
        return Rebuilt {
            start: pos,
            end: token_end,
            markup: fragment.render_original(),
            restoration: Restoration::Translated,
        };
    }

    // Opening backtick of this fragment; an even count means the last one closes a literal
    let before = &text[floor..pos];
    let opening = before
        .rfind('`')
        .filter(|_| before.matches('`').count() % 2 == 1)
        .map(|i| floor + i);

    let (mut start, raw) = match opening {
        Some(b) => (b, &text[b + 1..pos]),
        None => (pos, ""),
    };
    if fragment.kind == FragmentKind::CrossRefWithLabel && text[floor..start].ends_with(":ref:") {
        start -= ":ref:".len();
    }

    let mut end = token_end;
    if text[end..].starts_with('`') {
        end += 1;
    }
    if fragment.kind == FragmentKind::HyperlinkWithUrl {
        let underscores = text[end..].chars().take(2).take_while(|&c| c == '_').count();
        end += underscores;
    }

    let display = raw.trim_end();
    let display_lost = display.trim().is_empty() && !fragment.display_text.trim().is_empty();
    let (markup, restoration) = if display_lost {
        (fragment.render_fallback(), Restoration::DisplayFallback)
    } else {
        (fragment.render(display, &fragment.separator), Restoration::Translated)
    };

    Rebuilt { start, end, markup, restoration }
}

/// Restore a fragment whose token vanished, if the engine left its target behind
fn salvage(text: &mut String, fragment: &Fragment, seen: &mut HashMap<String, usize>) -> bool {
    if fragment.kind == FragmentKind::CrossRefWithLabel && !fragment.display_text.trim().is_empty() {
        let emptied = format!(":ref:`<{}>`", fragment.target);
        if let Some(at) = text.find(&emptied) {
            text.replace_range(at..at + emptied.len(), &fragment.render_fallback());
            *seen.entry(fragment.marker()).or_insert(0) += 1;
            return true;
        }
    }

    let marker = fragment.marker();
    let claimed = seen.entry(marker.clone()).or_insert(0);
    if text.matches(marker.as_str()).count() > *claimed {
        *claimed += 1;
        return true;
    }
    false
}

/// Rebuild markup in `translated` using the fragments recorded in `table`.
///
/// With no intervening translation this reproduces the original text exactly.
pub fn decode(translated: &str, table: PlaceholderTable) -> Decoded {
    if table.is_empty() {
        return Decoded {
            text: translated.to_string(),
            outcomes: Vec::new(),
        };
    }

    let text = normalize_token_drift(translated, &table);
    let salt = table.salt();
    let entries = table.into_entries();

    let mut hits: Vec<(usize, usize)> = entries
        .iter()
        .enumerate()
        .flat_map(|(index, placeholder)| {
            text.match_indices(placeholder.token.as_str())
                .map(move |(pos, _)| (pos, index))
        })
        .collect();
    hits.sort_unstable();

    let mut output = String::with_capacity(text.len());
    let mut restorations: Vec<Option<Restoration>> = vec![None; entries.len()];
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut cursor = 0;

    for (pos, index) in hits {
        if pos < cursor {
            continue;
        }
        let placeholder = &entries[index];
        let rebuilt = rebuild_at(&text, cursor, pos, placeholder);

        output.push_str(&text[cursor..rebuilt.start]);
        output.push_str(&rebuilt.markup);
        cursor = rebuilt.end;

        *seen.entry(placeholder.fragment.marker()).or_insert(0) += 1;
        if restorations[index].is_none() {
            restorations[index] = Some(rebuilt.restoration);
        } else {
            debug!("Token {} appeared more than once", placeholder.token);
        }
    }
    output.push_str(&text[cursor..]);
    let mut output = strip_stray_tokens(&output, salt);

    let mut outcomes = Vec::with_capacity(entries.len());
    for (placeholder, restoration) in entries.into_iter().zip(restorations) {
        let restoration = match restoration {
            Some(r) => r,
            None if salvage(&mut output, &placeholder.fragment, &mut seen) => Restoration::Salvaged,
            None => Restoration::Lost,
        };
        if restoration == Restoration::Lost {
            debug!("Lost {} '{}'", placeholder.fragment.kind, placeholder.fragment.target);
        }
        outcomes.push(FragmentOutcome {
            fragment: placeholder.fragment,
            restoration,
        });
    }

    Decoded { text: output, outcomes }
}
