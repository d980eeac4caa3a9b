/*!
 * RST markup protection across a markup-unaware translation engine.
 *
 * A text unit goes through four stages:
 * - `classifier`: find cross-references, substitutions and hyperlinks
 * - `encoder`: replace their targets with opaque tokens
 * - `decoder`: rebuild the markup around the translated display text
 * - `repair`: fix known corruption signatures the engine introduced
 *
 * [`MarkupCodec`] bundles the stages for callers that process one unit at a time.
 */

pub mod classifier;
pub mod decoder;
pub mod encoder;
pub mod formatting;
pub mod fragment;
pub mod repair;
pub mod scan;

pub use classifier::classify;
pub use decoder::{decode, Decoded, Restoration};
pub use encoder::{encode, Encoded, PlaceholderTable};
pub use formatting::FormatFixer;
pub use fragment::{Fragment, FragmentKind, Token};
pub use repair::{Normalization, RepairReport, Repairer};

use log::warn;

use crate::errors::MarkupError;

/// Result of restoring one translated unit
#[derive(Debug, Clone)]
pub struct Restored {
    pub text: String,
    /// Fragments that exist in no form in the output
    pub unrestored: Vec<Fragment>,
    /// Repair rules that changed the text
    pub repairs: Vec<String>,
    /// Corruption left after repair
    pub residual: Vec<String>,
    /// Fragments emitted with their original display text
    pub fallbacks: usize,
}

impl Restored {
    pub fn is_clean(&self) -> bool {
        self.unrestored.is_empty() && self.residual.is_empty()
    }
}

/// Encode/decode/repair pipeline for single text units
#[derive(Debug, Clone)]
pub struct MarkupCodec {
    repairer: Repairer,
    fix_formatting: bool,
}

impl Default for MarkupCodec {
    fn default() -> Self {
        Self::new(Repairer::default())
    }
}

impl MarkupCodec {
    pub fn new(repairer: Repairer) -> Self {
        Self {
            repairer,
            fix_formatting: true,
        }
    }

    pub fn with_formatting(mut self, enabled: bool) -> Self {
        self.fix_formatting = enabled;
        self
    }

    pub fn repairer(&self) -> &Repairer {
        &self.repairer
    }

    /// Classify and encode a source unit
    pub fn protect(&self, text: &str) -> Result<Encoded, MarkupError> {
        let fragments = classify(text)?;
        Ok(encode(text, &fragments))
    }

    /// Decode and repair the engine output for a unit encoded by [`protect`](Self::protect)
    pub fn restore(&self, translated: &str, table: PlaceholderTable) -> Restored {
        let decoded = decode(translated, table);
        let fallbacks = decoded.count(Restoration::DisplayFallback);

        let report = self.repairer.repair(&decoded.text);
        let text = if self.fix_formatting {
            FormatFixer::fix(&report.text)
        } else {
            report.text
        };

        // A repair rule may have rebuilt a reference whose token was lost
        let unrestored: Vec<Fragment> = decoded
            .lost()
            .filter(|fragment| {
                let marker = fragment.marker();
                text.matches(&marker).count() <= decoded.text.matches(&marker).count()
            })
            .cloned()
            .collect();

        for fragment in &unrestored {
            warn!("Unrestored {}: {}", fragment.kind, fragment.render_original());
        }

        Restored {
            text,
            unrestored,
            repairs: report.applied,
            residual: report.residual,
            fallbacks,
        }
    }

    /// Encode then immediately restore; used to check a unit survives untranslated
    pub fn round_trip(&self, text: &str) -> Result<String, MarkupError> {
        let encoded = self.protect(text)?;
        Ok(decode(&encoded.text, encoded.table).text)
    }
}
