/*!
 * Encoding of classified text for the translation engine.
 *
 * Each fragment's target is replaced with a token. Display text stays in place
 * next to the token so the engine translates it in context.
 */

use std::collections::HashSet;

use super::fragment::{Fragment, FragmentKind, Token, TOKEN_DRIFT_REGEX};

/// One token and the fragment it stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub token: Token,
    pub fragment: Fragment,
}

/// Token to fragment mapping for a single text unit.
///
/// Built by [`encode`] and consumed by `decode` for the same unit.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlaceholderTable {
    entries: Vec<Placeholder>,
    salt: usize,
}

impl PlaceholderTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placeholder> {
        self.entries.iter()
    }

    /// Look up the placeholder for a token string
    pub fn get(&self, token: &str) -> Option<&Placeholder> {
        self.entries.iter().find(|p| p.token.as_str() == token)
    }

    /// Tag salt the tokens of this table were built with
    pub fn salt(&self) -> usize {
        self.salt
    }

    pub fn into_entries(self) -> Vec<Placeholder> {
        self.entries
    }
}

/// Output of [`encode`]
#[derive(Debug)]
pub struct Encoded {
    pub text: String,
    pub table: PlaceholderTable,
}

/// Smallest salt whose tags occur in the text neither as a token prefix nor in
/// any spelling the decoder would read back as a token
fn choose_salt(text: &str) -> usize {
    let upper = text.to_uppercase();
    let taken: HashSet<String> = TOKEN_DRIFT_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_uppercase())
        .collect();

    (0..)
        .find(|&salt| {
            FragmentKind::ALL.iter().all(|&kind| {
                !taken.contains(&Token::salted_tag(kind, salt)) && !upper.contains(&Token::prefix(kind, salt))
            })
        })
        .unwrap_or(0)
}

/// Encoded replacement for one fragment
fn encoded_form(fragment: &Fragment, token: &Token) -> String {
    match fragment.kind {
        FragmentKind::CrossRefWithLabel => {
            format!(":ref:`{}{}{}`", fragment.display_text, fragment.separator, token)
        }
        FragmentKind::HyperlinkWithUrl => format!(
            "`{}{}{}`{}",
            fragment.display_text, fragment.separator, token, fragment.suffix
        ),
        FragmentKind::CrossRefBare | FragmentKind::Substitution => token.to_string(),
    }
}

/// Replace every fragment of `text` with its encoded form.
///
/// `fragments` must be the disjoint, start-sorted output of `classify`.
/// Tokens are numbered per kind in order of appearance.
pub fn encode(text: &str, fragments: &[Fragment]) -> Encoded {
    let salt = choose_salt(text);

    let mut ordinals = [0usize; FragmentKind::ALL.len()];
    let entries: Vec<Placeholder> = fragments
        .iter()
        .map(|fragment| {
            let slot = fragment.kind.priority() as usize;
            let token = Token::new(fragment.kind, ordinals[slot], salt);
            ordinals[slot] += 1;
            Placeholder {
                token,
                fragment: fragment.clone(),
            }
        })
        .collect();

    // Rewrite from the end so earlier spans stay valid
    let mut encoded = text.to_string();
    for placeholder in entries.iter().rev() {
        let replacement = encoded_form(&placeholder.fragment, &placeholder.token);
        encoded.replace_range(placeholder.fragment.span.clone(), &replacement);
    }

    Encoded {
        text: encoded,
        table: PlaceholderTable { entries, salt },
    }
}
