/*!
 * Repair of translator-induced reference corruption.
 *
 * The decoder can only rebuild what the engine left around a token. Engines
 * also duplicate, truncate and merge references outside the tokens; each
 * recurring signature is captured here as a [`RepairRule`]. The table is
 * applied in order and repeated until the text stops changing, which makes
 * the pass idempotent.
 *
 * Phrase-level fixes that only make sense for one documentation corpus are
 * not built in. They are supplied as [`Normalization`]s from configuration.
 */

use std::borrow::Cow;

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::errors::MarkupError;

/// An intact labeled cross-reference
const REFERENCE: &str = r":ref:`[^<`]*<[^<>`]+>`";

/// An intact hyperlink with explicit URL
const HYPERLINK: &str = r"`[^<`]*<[^<>`]+>`__?";

/// Upper bound on table passes; every rule shrinks or finalizes its match
const MAX_PASSES: usize = 8;

static REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(REFERENCE).expect("Invalid reference regex"));

static HYPERLINK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(HYPERLINK).expect("Invalid hyperlink regex"));

/// One `text <label>`` left behind a reference; group 1 text, 2 label
static TARGET_REPEAT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^<`]*?)<([^<>`]+)>`").expect("Invalid target-repeat regex"));

/// How a matched signature is rewritten
pub enum Rewrite {
    /// `regex` replacement template
    Template(&'static str),
    /// Computed replacement; returning the match unchanged leaves it alone
    With(fn(&Captures) -> String),
}

/// One known corruption signature
pub struct RepairRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub rewrite: Rewrite,
    pub description: &'static str,
}

impl RepairRule {
    fn new(name: &'static str, pattern: &str, rewrite: Rewrite, description: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("Invalid repair rule '{}': {}", name, e)),
            rewrite,
            description,
        }
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.rewrite {
            Rewrite::Template(template) => self.pattern.replace_all(text, template),
            Rewrite::With(rewrite) => self.pattern.replace_all(text, |caps: &Captures| rewrite(caps)),
        }
    }
}

impl std::fmt::Debug for RepairRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Collapse every repeat of the reference's label in one go. Text before a
/// repeat survives unless it is a copy of the display text; a repeat of a
/// different label ends the run.
fn collapse_duplicated_target(caps: &Captures) -> String {
    let (display, label, repeats) = (&caps[1], &caps[2], &caps[3]);
    let mut output = format!(":ref:`{}<{}>`", display, label);
    let mut cursor = 0;

    for repeat in TARGET_REPEAT_REGEX.captures_iter(repeats) {
        if &repeat[2] != label {
            break;
        }
        let between = repeat[1].trim();
        if !between.is_empty() && !display.contains(between) {
            output.push_str(&repeat[1]);
        }
        cursor = repeat.get(0).map_or(cursor, |m| m.end());
    }

    output.push_str(&repeats[cursor..]);
    output
}

fn strip_target_tail(caps: &Captures) -> String {
    if caps[2].ends_with(&caps[3]) {
        caps[1].to_string()
    } else {
        caps[0].to_string()
    }
}

/// Letters glued to a closing backtick: leftovers of the display text are
/// dropped, genuine words get their missing space back.
fn detach_orphan_suffix(caps: &Captures) -> String {
    let (reference, display, tail) = (&caps[1], &caps[2], &caps[3]);
    if display.contains(tail) {
        return reference.to_string();
    }

    let first = tail.split([' ', '\t']).next().unwrap_or_default();
    if !first.is_empty() && display.contains(first) {
        return format!("{}{}", reference, &tail[first.len()..]);
    }

    format!("{} {}", reference, tail)
}

/// Drop immediate repeats from a whitespace-separated run of `unit` matches
fn collapse_run(run: &str, unit: &Regex) -> String {
    let mut output = String::with_capacity(run.len());
    let mut previous: Option<&str> = None;
    let mut cursor = 0;

    for found in unit.find_iter(run) {
        if previous != Some(found.as_str()) {
            output.push_str(&run[cursor..found.start()]);
            output.push_str(found.as_str());
            previous = Some(found.as_str());
        }
        cursor = found.end();
    }
    output.push_str(&run[cursor..]);
    output
}

fn collapse_reference_run(caps: &Captures) -> String {
    collapse_run(&caps[0], &REFERENCE_REGEX)
}

fn collapse_hyperlink_run(caps: &Captures) -> String {
    collapse_run(&caps[0], &HYPERLINK_REGEX)
}

static REPAIR_RULES: Lazy<Vec<RepairRule>> = Lazy::new(|| {
    vec![
        RepairRule::new(
            "merged-references",
            r":ref:`([^<`]+?)\s+a:ref:`",
            Rewrite::Template(":ref:`${1}` :ref:`"),
            "Two references fused: the first lost its closing backtick and an article was glued to the second",
        ),
        RepairRule::new(
            "stray-role-prefix",
            r"(^|[\s(\[])(?:temp|a):ref:`",
            Rewrite::Template("${1}:ref:`"),
            "Tag-handling residue glued in front of a role",
        ),
        RepairRule::new(
            "missing-target-bracket",
            r":ref:`([^<`]+)<([^<>`]+)`",
            Rewrite::Template(":ref:`${1}<${2}>`"),
            "Label closed by a backtick without the `>`",
        ),
        RepairRule::new(
            "missing-closing-backtick",
            r"(:ref:`[^<`]*<[^<>`]+>)([^`]|$)",
            Rewrite::Template("${1}`${2}"),
            "Reference ends at `>` without the closing backtick",
        ),
        RepairRule::new(
            "duplicated-target",
            r":ref:`([^<`]*)<([^<>`]+)>`((?:[^<`]*?<[^<>`]+>`)+)",
            Rewrite::With(collapse_duplicated_target),
            "Label repeated right after the reference, optionally with a copy of the display text",
        ),
        RepairRule::new(
            "duplicated-target-tail",
            r"(:ref:`[^<`]*<([^<>`]+)>`)([^<>`\s]+)>`",
            Rewrite::With(strip_target_tail),
            "Trailing piece of the label repeated after the reference",
        ),
        RepairRule::new(
            "orphan-suffix",
            r"(:ref:`([^<`]*)<[^<>`]+>`)(\p{L}+(?:[ \t]+\p{L}+)?)",
            Rewrite::With(detach_orphan_suffix),
            "Letters glued to the closing backtick",
        ),
        RepairRule::new(
            "duplicate-adjacent-reference",
            &format!(r"{0}(?:\s+{0})+", REFERENCE),
            Rewrite::With(collapse_reference_run),
            "Identical reference repeated with only whitespace between",
        ),
        RepairRule::new(
            "duplicate-adjacent-hyperlink",
            &format!(r"{0}(?:\s+{0})+", HYPERLINK),
            Rewrite::With(collapse_hyperlink_run),
            "Identical hyperlink repeated with only whitespace between",
        ),
        RepairRule::new(
            "hyperlink-glued-word",
            r"(<[^<>`]+>`__?)(\p{L})",
            Rewrite::Template("${1} ${2}"),
            "Word glued to the end of a hyperlink",
        ),
    ]
});

static UNTERMINATED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":ref:`[^`]*\z").expect("Invalid unterminated-ref regex"));

static NESTED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":ref:`[^`]*:ref:`").expect("Invalid nested-ref regex"));

static EMPTY_DISPLAY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":ref:`<[^<>`]+>`").expect("Invalid empty-display regex"));

/// Corpus-specific phrase rewrite, e.g. a translator variant of a reference title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalization {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub description: String,
}

impl Normalization {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            description: String::new(),
        }
    }

    /// A rewrite whose output still contains its input would never settle
    pub fn validate(&self) -> Result<(), MarkupError> {
        if self.from.is_empty() {
            return Err(MarkupError::InvalidRepairRule {
                name: self.description.clone(),
                reason: "empty source phrase".to_string(),
            });
        }
        self.check_against(self)
    }

    /// Reject a replacement that reintroduces the source phrase of `other`
    fn check_against(&self, other: &Normalization) -> Result<(), MarkupError> {
        if self.to.contains(&other.from) {
            let reason = if std::ptr::eq(self, other) {
                "replacement contains the source phrase".to_string()
            } else {
                format!("replacement contains the source phrase of '{}'", other.from)
            };
            return Err(MarkupError::InvalidRepairRule {
                name: self.from.clone(),
                reason,
            });
        }
        Ok(())
    }
}

/// Result of one repair pass
#[derive(Debug, Clone, PartialEq)]
pub struct RepairReport {
    pub text: String,
    /// Names of rules that changed the text, in first-applied order
    pub applied: Vec<String>,
    /// Corruption still present afterwards
    pub residual: Vec<String>,
}

impl RepairReport {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Applies the built-in rule table plus configured normalizations
#[derive(Debug, Clone, Default)]
pub struct Repairer {
    normalizations: Vec<Normalization>,
}

impl Repairer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every replacement is checked against every source phrase of the set,
    /// so no normalization can feed another
    pub fn with_normalizations(normalizations: Vec<Normalization>) -> Result<Self, MarkupError> {
        for normalization in &normalizations {
            normalization.validate()?;
            for other in &normalizations {
                normalization.check_against(other)?;
            }
        }
        Ok(Self { normalizations })
    }

    /// The built-in rules in application order
    pub fn rules() -> &'static [RepairRule] {
        &REPAIR_RULES
    }

    pub fn normalizations(&self) -> &[Normalization] {
        &self.normalizations
    }

    pub fn repair(&self, text: &str) -> RepairReport {
        fn note(applied: &mut Vec<String>, name: &str) {
            if !applied.iter().any(|a| a == name) {
                applied.push(name.to_string());
            }
        }

        let mut current = text.to_string();
        let mut applied: Vec<String> = Vec::new();

        for pass in 0..MAX_PASSES {
            let mut changed = false;

            for rule in Self::rules() {
                let next = rule.apply(&current).into_owned();
                if next != current {
                    debug!("Repair rule '{}' applied", rule.name);
                    current = next;
                    note(&mut applied, rule.name);
                    changed = true;
                }
            }

            for normalization in &self.normalizations {
                if current.contains(&normalization.from) {
                    current = current.replace(&normalization.from, &normalization.to);
                    note(&mut applied, &normalization.from);
                    changed = true;
                }
            }

            if !changed {
                break;
            }
            if pass + 1 == MAX_PASSES {
                debug!("Repair pass did not settle after {} rounds", MAX_PASSES);
            }
        }

        let residual = detect_residual(&current);
        RepairReport {
            text: current,
            applied,
            residual,
        }
    }
}

/// Describe reference corruption that no rule could fix
pub fn detect_residual(text: &str) -> Vec<String> {
    let checks: [(&Regex, &str); 3] = [
        (&UNTERMINATED_REGEX, "unterminated reference"),
        (&NESTED_REGEX, "reference opened inside another reference"),
        (&EMPTY_DISPLAY_REGEX, "reference without display text"),
    ];

    checks
        .iter()
        .flat_map(|(regex, label)| {
            regex
                .find_iter(text)
                .map(move |m| format!("{}: {}", label, m.as_str()))
        })
        .collect()
}
