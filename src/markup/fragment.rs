/*!
 * Structural fragments and the tokens that stand in for them.
 */

use std::fmt;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// Token-like text as engines tend to mangle it: any case, padded or with one brace.
/// Group 1 is the tag including salt, group 2 the ordinal.
pub(crate) static TOKEN_DRIFT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\{\{?\s*([a-z]+)\s*_\s*(\d+)\s*\}\}?").expect("Invalid token drift regex")
});

/// The four inline constructs that must survive translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentKind {
    /// `:ref:`display text <label>``
    CrossRefWithLabel,
    /// `:ref:`label``
    CrossRefBare,
    /// `|name|`, optionally followed by `_` or `__`
    Substitution,
    /// `` `link text <url>`_ `` or the anonymous `__` form
    HyperlinkWithUrl,
}

impl FragmentKind {
    /// All kinds, highest classification priority first
    pub const ALL: [FragmentKind; 4] = [
        FragmentKind::CrossRefWithLabel,
        FragmentKind::CrossRefBare,
        FragmentKind::Substitution,
        FragmentKind::HyperlinkWithUrl,
    ];

    /// Lower value wins when two candidates overlap
    pub fn priority(self) -> u8 {
        match self {
            Self::CrossRefWithLabel => 0,
            Self::CrossRefBare => 1,
            Self::Substitution => 2,
            Self::HyperlinkWithUrl => 3,
        }
    }

    /// Tag used inside tokens of this kind
    pub fn tag(self) -> &'static str {
        match self {
            Self::CrossRefWithLabel => "XREF",
            Self::CrossRefBare => "XLBL",
            Self::Substitution => "SUBST",
            Self::HyperlinkWithUrl => "LINK",
        }
    }

    /// Whether fragments of this kind expose display text to the translator
    pub fn has_display_text(self) -> bool {
        matches!(self, Self::CrossRefWithLabel | Self::HyperlinkWithUrl)
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CrossRefWithLabel => "cross-reference",
            Self::CrossRefBare => "bare cross-reference",
            Self::Substitution => "substitution",
            Self::HyperlinkWithUrl => "hyperlink",
        };
        write!(f, "{}", name)
    }
}

/// A structural span found in a text unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,

    /// Byte range `[start, end)` in the source text unit
    pub span: Range<usize>,

    /// Translatable portion; empty for bare references and substitutions
    pub display_text: String,

    /// Label name, substitution name or URL
    pub target: String,

    /// Whitespace that separated display text from `<target>` in the source.
    /// May contain a newline when the reference was wrapped.
    pub separator: String,

    /// Trailing `_`/`__` of hyperlinks and substitution references
    pub suffix: String,
}

impl Fragment {
    /// Whether whitespace separated display text from target in the source
    pub fn had_leading_space(&self) -> bool {
        !self.separator.is_empty()
    }

    pub fn overlaps(&self, other: &Fragment) -> bool {
        self.span.start < other.span.end && other.span.start < self.span.end
    }

    /// Canonical markup for this fragment with the given display text
    pub fn render(&self, display_text: &str, separator: &str) -> String {
        match self.kind {
            FragmentKind::CrossRefWithLabel => {
                format!(":ref:`{}{}<{}>`", display_text, separator, self.target)
            }
            FragmentKind::CrossRefBare => format!(":ref:`{}`", self.target),
            FragmentKind::Substitution => format!("|{}|{}", self.target, self.suffix),
            FragmentKind::HyperlinkWithUrl => {
                format!("`{}{}<{}>`{}", display_text, separator, self.target, self.suffix)
            }
        }
    }

    /// The exact source markup
    pub fn render_original(&self) -> String {
        self.render(&self.display_text, &self.separator)
    }

    /// Markup emitted when the translated display text was lost.
    ///
    /// Cross-references are written in compact `text<label>` form; hyperlinks keep
    /// their source spacing.
    pub fn render_fallback(&self) -> String {
        match self.kind {
            FragmentKind::CrossRefWithLabel if !self.display_text.trim().is_empty() => {
                self.render(self.display_text.trim(), "")
            }
            _ => self.render_original(),
        }
    }

    /// Text whose presence shows the fragment exists in some form
    pub fn marker(&self) -> String {
        match self.kind {
            FragmentKind::CrossRefWithLabel | FragmentKind::HyperlinkWithUrl => {
                format!("<{}>`", self.target)
            }
            FragmentKind::CrossRefBare => format!(":ref:`{}`", self.target),
            FragmentKind::Substitution => format!("|{}|", self.target),
        }
    }
}

/// Opaque placeholder for one fragment within one text unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Build the token for the `ordinal`-th fragment of `kind`.
    ///
    /// `salt` lengthens the tag so tokens cannot collide with text that already
    /// looks like a token.
    pub fn new(kind: FragmentKind, ordinal: usize, salt: usize) -> Self {
        Self(format!("{}{}}}}}", Self::prefix(kind, salt), ordinal))
    }

    /// Everything up to the ordinal, e.g. `{{XREF_`
    pub fn prefix(kind: FragmentKind, salt: usize) -> String {
        format!("{{{{{}_", Self::salted_tag(kind, salt))
    }

    /// Kind tag followed by `salt` extra `X`s, e.g. `XREFX`
    pub fn salted_tag(kind: FragmentKind, salt: usize) -> String {
        format!("{}{}", kind.tag(), "X".repeat(salt))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
