/*!
 * Gettext PO catalogs.
 *
 * Wraps a `polib` catalog with the operations the translation workflow needs:
 * listing pending messages, writing translations back, repairing stored
 * translations and clearing fuzzy flags.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use polib::catalog::Catalog;
use polib::message::{MessageMutView, MessageView};
use polib::po_file;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::markup::Repairer;

const FUZZY: &str = "fuzzy";

/// Message counts of one catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub translated: usize,
    pub fuzzy: usize,
}

impl CatalogStats {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.translated as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} translated ({:.1}%), {} fuzzy",
            self.translated,
            self.total,
            self.percentage(),
            self.fuzzy
        )
    }
}

/// A stored translation changed by the repair pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFix {
    pub msgid: String,
    pub before: String,
    pub after: String,
    pub rules: Vec<String>,
}

/// A PO file loaded in memory
pub struct PoCatalog {
    path: PathBuf,
    catalog: Catalog,
    dirty: bool,
}

impl fmt::Debug for PoCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoCatalog")
            .field("path", &self.path)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl PoCatalog {
    /// Parse a PO file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let catalog = po_file::parse(&path)
            .with_context(|| format!("Could not parse {:?}", path))?;

        debug!("Loaded catalog {:?}", path);
        Ok(Self {
            path,
            catalog,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are changes not yet written to disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Singular messages to send to the engine, in file order.
    ///
    /// Only untranslated messages are listed unless `translate_all` is set.
    pub fn pending_units(&self, translate_all: bool) -> Vec<String> {
        self.catalog
            .messages()
            .filter(|message| message.is_singular() && !message.msgid().is_empty())
            .filter(|message| translate_all || !message.is_translated())
            .map(|message| message.msgid().to_string())
            .collect()
    }

    /// All msgids of the catalog
    pub fn msgids(&self) -> Vec<String> {
        self.catalog
            .messages()
            .filter(|message| !message.msgid().is_empty())
            .map(|message| message.msgid().to_string())
            .collect()
    }

    /// Store a translation for `msgid` and clear its fuzzy flag.
    ///
    /// Returns false when the catalog has no singular message with that msgid.
    pub fn set_translation(&mut self, msgid: &str, msgstr: &str) -> Result<bool> {
        for mut message in self.catalog.messages_mut() {
            if message.msgid() != msgid || !message.is_singular() {
                continue;
            }

            message
                .set_msgstr(msgstr.to_string())
                .map_err(|_| anyhow!("Cannot set msgstr of plural message: {}", msgid))?;
            message.flags_mut().remove_flag(FUZZY);
            self.dirty = true;
            return Ok(true);
        }

        Ok(false)
    }

    /// Flag a message for review
    pub fn mark_fuzzy(&mut self, msgid: &str) -> bool {
        for mut message in self.catalog.messages_mut() {
            if message.msgid() == msgid && !message.is_fuzzy() {
                message.flags_mut().add_flag(FUZZY);
                self.dirty = true;
                return true;
            }
        }
        false
    }

    /// Current translation of a singular message
    pub fn translation(&self, msgid: &str) -> Option<String> {
        self.catalog
            .messages()
            .find(|message| message.msgid() == msgid && message.is_singular())
            .and_then(|message| message.msgstr().ok().map(str::to_string))
            .filter(|msgstr| !msgstr.is_empty())
    }

    pub fn stats(&self) -> CatalogStats {
        self.catalog
            .messages()
            .filter(|message| !message.msgid().is_empty())
            .fold(CatalogStats::default(), |mut stats, message| {
                stats.total += 1;
                if message.is_translated() {
                    stats.translated += 1;
                }
                if message.is_fuzzy() {
                    stats.fuzzy += 1;
                }
                stats
            })
    }

    /// Run the repair pass over every stored translation.
    ///
    /// With `dry_run` the catalog is left untouched and the fixes are only reported.
    pub fn fix_references(&mut self, repairer: &Repairer, dry_run: bool) -> Result<Vec<ReferenceFix>> {
        let mut fixes = Vec::new();

        for mut message in self.catalog.messages_mut() {
            if !message.is_singular() || !message.is_translated() {
                continue;
            }

            let before = match message.msgstr() {
                Ok(msgstr) => msgstr.to_string(),
                Err(_) => continue,
            };

            let report = repairer.repair(&before);
            if !report.changed() {
                continue;
            }

            fixes.push(ReferenceFix {
                msgid: message.msgid().to_string(),
                before,
                after: report.text.clone(),
                rules: report.applied,
            });

            if !dry_run {
                message
                    .set_msgstr(report.text)
                    .map_err(|_| anyhow!("Cannot set msgstr of plural message"))?;
            }
        }

        if !dry_run && !fixes.is_empty() {
            self.dirty = true;
        }

        Ok(fixes)
    }

    /// Clear the fuzzy flag everywhere; returns the number of messages changed
    pub fn remove_fuzzy_flags(&mut self) -> usize {
        let mut removed = 0;

        for mut message in self.catalog.messages_mut() {
            if message.is_fuzzy() {
                message.flags_mut().remove_flag(FUZZY);
                removed += 1;
            }
        }

        if removed > 0 {
            self.dirty = true;
        }

        removed
    }

    /// Write the catalog back if it changed
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }

        po_file::write_to_file(&self.catalog, &self.path)
            .with_context(|| format!("Could not write catalog to {:?}", self.path))?;
        self.dirty = false;

        info!("Saved {:?}", self.path);
        Ok(true)
    }
}
