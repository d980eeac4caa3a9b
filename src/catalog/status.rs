/*!
 * Translation status report: RST sources compared with their PO catalogs.
 */

use anyhow::{anyhow, Result};
use log::warn;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use super::po::PoCatalog;
use super::rst::{normalize_text, translatable_units};
use crate::file_utils::FileManager;

const BAR_CELLS: usize = 10;

/// `#` for every full ten percent, `-` for the rest
pub fn progress_bar(percentage: f64) -> String {
    let filled = ((percentage / 10.0).floor().max(0.0) as usize).min(BAR_CELLS);
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_CELLS - filled))
}

/// Status of one source document
#[derive(Debug, Clone, PartialEq)]
pub struct FileStatus {
    /// File stem shared by the RST source and the PO file
    pub name: String,
    pub translated: usize,
    pub total: usize,
    /// RST paragraphs with no matching msgid
    pub missing: Vec<String>,
    /// False when the RST file has no PO file at all
    pub has_catalog: bool,
}

impl FileStatus {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.translated as f64 / self.total as f64 * 100.0
        }
    }
}

/// Status of every document of one language
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub language: String,
    pub files: Vec<FileStatus>,
}

impl StatusReport {
    pub fn total(&self) -> usize {
        self.files.iter().map(|file| file.total).sum()
    }

    pub fn translated(&self) -> usize {
        self.files.iter().map(|file| file.translated).sum()
    }

    /// Completion over all files; documents without a catalog count as untranslated
    pub fn overall_percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.translated() as f64 / total as f64 * 100.0
        }
    }

    pub fn missing_catalogs(&self) -> impl Iterator<Item = &FileStatus> {
        self.files.iter().filter(|file| !file.has_catalog)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(80);
        writeln!(f, "Translation Status for {}:", self.language)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<30} {:<10} {:<12} {:<8} {:<8}",
            "File", "Progress", "Translated", "Total", "Missing"
        )?;
        writeln!(f, "{}", rule)?;

        for file in &self.files {
            let missing = if !file.has_catalog {
                "(all)".to_string()
            } else if file.missing.is_empty() {
                String::new()
            } else {
                format!("({})", file.missing.len())
            };
            writeln!(
                f,
                "{:<30} {:<10} {:<12} {:<8} {:<8}",
                file.name,
                progress_bar(file.percentage()),
                file.translated,
                file.total,
                missing
            )?;
        }

        writeln!(f, "{}", rule)?;
        write!(f, "Overall completion: {:.1}%", self.overall_percentage())
    }
}

/// Compare `source_dir/**/*.rst` with `messages_dir/<stem>.po`.
///
/// With `only` set, just the document with that stem is reported.
pub fn analyze(source_dir: &Path, messages_dir: &Path, language: &str, only: Option<&str>) -> Result<StatusReport> {
    let sources = match only {
        Some(stem) => {
            let path = source_dir.join(format!("{}.rst", stem));
            if !path.is_file() {
                return Err(anyhow!("No source file found for {}", stem));
            }
            vec![path]
        }
        None => FileManager::find_files(source_dir, "rst")?,
    };

    let mut files = Vec::with_capacity(sources.len());
    for source in &sources {
        let name = FileManager::file_stem(source);
        let units: BTreeSet<String> = translatable_units(&FileManager::read_to_string(source)?)
            .iter()
            .map(|unit| normalize_text(unit))
            .filter(|unit| !unit.is_empty())
            .collect();

        let po_path = messages_dir.join(format!("{}.po", name));
        if !po_path.is_file() {
            files.push(FileStatus {
                name,
                translated: 0,
                total: units.len(),
                missing: units.into_iter().collect(),
                has_catalog: false,
            });
            continue;
        }

        let catalog = match PoCatalog::open(&po_path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Skipping {}: {:#}", name, e);
                continue;
            }
        };

        let msgids: BTreeSet<String> = catalog.msgids().iter().map(|id| normalize_text(id)).collect();
        let stats = catalog.stats();
        files.push(FileStatus {
            name,
            translated: stats.translated,
            total: stats.total,
            missing: units.difference(&msgids).cloned().collect(),
            has_catalog: true,
        });
    }

    files.sort_by(|a, b| a.has_catalog.cmp(&b.has_catalog).then_with(|| a.name.cmp(&b.name)));

    Ok(StatusReport {
        language: language.to_string(),
        files,
    })
}
