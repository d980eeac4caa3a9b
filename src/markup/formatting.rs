/*!
 * RST inline formatting fixes for translated text.
 *
 * Engines tend to pad emphasis markers with spaces, glue words to a closing
 * marker, and occasionally drop a closing `**`. All fixes are idempotent.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered `(pattern, replacement)` fixes
static FORMATTING_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // `** bold **` -> `**bold**`
        (
            Regex::new(r"(^|[^*\w])\*\*[ \t]*([^*\n]*?[^*\s])[ \t]*\*\*([^*\w]|$)").expect("Invalid bold padding regex"),
            "${1}**${2}**${3}",
        ),
        // `* italic *` -> `*italic*`
        (
            Regex::new(r"(^|[^*\w])\*[ \t]*([^*\s](?:[^*\n]*?[^*\s])?)[ \t]*\*([^*\w]|$)")
                .expect("Invalid italic padding regex"),
            "${1}*${2}*${3}",
        ),
        // `**Username:**Ange` -> `**Username:** Ange`
        (
            Regex::new(r"(\*\*[^*\n]+?:\*\*)([^\s*.,;:!?)\]])").expect("Invalid bold colon regex"),
            "${1} ${2}",
        ),
        // `*Path:*More` -> `*Path:* More`
        (
            Regex::new(r"(^|[^*])(\*[^*\s][^*\n]*?:\*)([^\s*.,;:!?)\]])").expect("Invalid italic colon regex"),
            "${1}${2} ${3}",
        ),
        // `2.**Password:**` -> `2. **Password:**`
        (
            Regex::new(r"(^|\s)(\d+\.)\*\*").expect("Invalid enumerator regex"),
            "${1}${2} **",
        ),
        // `` `Site<https://x>`_ `` -> `` `Site <https://x>`_ ``
        (
            Regex::new(r"`([^`<\s](?:[^`<]*?[^`<\s])?)<([^<>`\s]+)>`(__?)").expect("Invalid hyperlink spacing regex"),
            "`${1} <${2}>`${3}",
        ),
    ]
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Formatting fixes for translated RST units
pub struct FormatFixer;

impl FormatFixer {
    /// Apply every fix until the text is stable
    pub fn fix(text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut result = text.to_string();
        // Matches consume one boundary character, so adjacent spans need another round
        for _ in 0..3 {
            let next = Self::close_dangling_emphasis(&Self::apply_patterns(&result));
            if next == result {
                break;
            }
            result = next;
        }
        result
    }

    fn apply_patterns(text: &str) -> String {
        FORMATTING_PATTERNS
            .iter()
            .fold(text.to_string(), |acc, (pattern, replacement)| {
                pattern.replace_all(&acc, *replacement).into_owned()
            })
    }

    /// Close a bold or italic span the engine left open at the end of the unit
    pub fn close_dangling_emphasis(text: &str) -> String {
        let bold = marker_positions(text, true);
        let text = match bold.last() {
            Some(&last) if bold.len() % 2 == 1 && opens_span(text, last + 2) => close_at_end(text, "**"),
            _ => text.to_string(),
        };

        let italic = marker_positions(&text, false);
        match italic.last() {
            Some(&last) if italic.len() % 2 == 1 && opens_span(&text, last + 1) => close_at_end(&text, "*"),
            _ => text,
        }
    }

    /// Decode the HTML entities some engines emit for RST punctuation
    pub fn convert_html_entities(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }
}

/// Byte offsets of `**` (bold) or lone `*` (italic) markers, skipping bullets
fn marker_positions(text: &str, bold: bool) -> Vec<usize> {
    let bytes = text.as_bytes();
    let is_star = |i: usize| bytes.get(i) == Some(&b'*');
    let is_space = |i: Option<usize>| i.and_then(|i| bytes.get(i)).is_none_or(|b| b.is_ascii_whitespace());

    let mut positions = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !is_star(i) {
            i += 1;
            continue;
        }
        let run = (i..bytes.len()).take_while(|&j| is_star(j)).count();
        let wanted = if bold { 2 } else { 1 };
        let bullet = is_space(i.checked_sub(1)) && is_space(Some(i + run));
        if run == wanted && !bullet {
            positions.push(i);
        }
        i += run;
    }
    positions
}

fn opens_span(text: &str, after: usize) -> bool {
    text[after..].chars().next().is_some_and(|c| !c.is_whitespace())
}

fn close_at_end(text: &str, marker: &str) -> String {
    let body = text.trim_end();
    let content_end = body.trim_end_matches(TRAILING_PUNCTUATION).len();
    format!("{}{}{}{}", &body[..content_end], marker, &body[content_end..], &text[body.len()..])
}
