use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::catalog::{self, PoCatalog, ReferenceFix, StatusReport};
use crate::database::{DatabaseConnection, Repository};
use crate::errors::TranslationError;
use crate::file_utils::FileManager;
use crate::markup::Repairer;
use crate::providers::deepl::DeepL;
use crate::translation::cache::{truncate_text, TranslationCache};
use crate::translation::{TranslationService, UnitOutcome};

// @module: Application controller for catalog translation

/// Counts of one translation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub translated: usize,
    /// Messages already translated and left alone
    pub skipped: usize,
    pub failed: usize,
    pub from_cache: usize,
    /// Msgids written with references that could not be restored
    pub unrestored_units: Vec<String>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files: {} translated ({} from cache), {} skipped, {} failed, {} with unrestored references",
            self.files,
            self.translated,
            self.from_cache,
            self.skipped,
            self.failed,
            self.unrestored_units.len()
        )
    }
}

/// Totals of a `fix-refs` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixSummary {
    pub files: usize,
    pub changed_files: usize,
    pub fixes: Vec<ReferenceFix>,
}

// @creates: Progress bar with the shared style
fn progress_bar(len: u64, unit: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let progress_bar = ProgressBar::new(len);
    let template_result = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        ))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(template_result.progress_chars("█▓▒░"));
    progress_bar
}

/// Main application controller for catalog translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Engine pipeline; absent for offline commands
    service: Option<TranslationService>,
    // @field: Draw progress bars
    show_progress: bool,
}

impl Controller {
    /// Controller for commands that never call the engine
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            service: None,
            show_progress: true,
        }
    }

    /// Controller with a DeepL service and, unless disabled, the SQLite cache
    pub fn for_translation(config: Config, use_cache: bool) -> Result<Self> {
        config.validate_for_translation()?;

        let engine = DeepL::new(
            &config.engine.api_key,
            config.engine.resolved_endpoint(),
            config.engine.timeout_secs,
        )
        .with_preserve_formatting(config.engine.preserve_formatting);

        let mut service = TranslationService::from_config(&config, Arc::new(engine))?;
        if use_cache && config.cache.enabled {
            let opened = match &config.cache.path {
                Some(path) => DatabaseConnection::new(path).map(Repository::new),
                None => Repository::new_default(),
            };
            service = match opened {
                Ok(repository) => service.with_store(Arc::new(repository)),
                Err(e) => {
                    // Repeated units within this run are still served from memory
                    warn!("Translation cache unavailable, using an in-memory cache: {:#}", e);
                    service.with_store(Arc::new(TranslationCache::new()))
                }
            };
        }

        Ok(Self::with_config(config).with_service(service))
    }

    pub fn with_service(mut self, service: TranslationService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_progress(mut self, visible: bool) -> Self {
        self.show_progress = visible;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn service(&self) -> Result<&TranslationService> {
        self.service
            .as_ref()
            .ok_or_else(|| anyhow!("No translation engine configured"))
    }

    /// Directory holding the PO files of the target language
    pub fn messages_dir(&self) -> PathBuf {
        self.config.paths.messages_dir(&self.config.target_language)
    }

    /// PO files of the target language, or just `<stem>.po`
    pub fn catalog_files(&self, only: Option<&str>) -> Result<Vec<PathBuf>> {
        let dir = self.messages_dir();
        if !FileManager::dir_exists(&dir) {
            return Err(anyhow!("No translations found for language {}: {:?}", self.config.target_language, dir));
        }

        match only {
            Some(stem) => {
                let path = dir.join(format!("{}.po", stem));
                if !FileManager::file_exists(&path) {
                    return Err(anyhow!("PO file not found: {:?}", path));
                }
                Ok(vec![path])
            }
            None => FileManager::find_files(&dir, "po"),
        }
    }

    /// Check the engine answers before a long run
    pub async fn test_connection(&self) -> Result<()> {
        let service = self.service()?;
        service.test_connection().await?;
        info!("Connected to {}", service.engine_name());
        Ok(())
    }

    /// Translate one string outside any catalog
    pub async fn translate_text(&self, text: &str) -> Result<UnitOutcome> {
        Ok(self.service()?.translate_unit(text).await?)
    }

    /// Translate pending messages of every file, stopping on Ctrl+C
    pub async fn translate_catalogs(&self, files: &[PathBuf], translate_all: bool) -> Result<RunSummary> {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.translate_catalogs_until(files, translate_all, interrupt).await
    }

    /// Translate pending messages of every file until `cancel` completes.
    ///
    /// Failed units are logged and counted. On cancellation the unit in
    /// flight is dropped, finished units are saved, and
    /// [`TranslationError::Cancelled`] is returned.
    pub async fn translate_catalogs_until<C>(&self, files: &[PathBuf], translate_all: bool, cancel: C) -> Result<RunSummary>
    where
        C: Future<Output = ()>,
    {
        let service = self.service()?;
        tokio::pin!(cancel);

        info!(
            "Translating {} catalog(s) {} -> {} with {}",
            files.len(),
            service.source_language(),
            service.target_language(),
            service.engine_name()
        );

        let mut summary = RunSummary::default();
        for file in files {
            let name = FileManager::file_stem(file);
            let mut catalog = match PoCatalog::open(file) {
                Ok(catalog) => catalog,
                Err(e) => {
                    error!("Error processing file {}: {:#}", name, e);
                    continue;
                }
            };
            summary.files += 1;

            let pending = catalog.pending_units(translate_all);
            summary.skipped += catalog.stats().total.saturating_sub(pending.len());
            if pending.is_empty() {
                debug!("Nothing to translate in {}", name);
                continue;
            }

            info!("Processing {} ({} messages)", name, pending.len());
            let progress = progress_bar(pending.len() as u64, "messages", self.show_progress);
            progress.set_message(name.clone());

            for msgid in &pending {
                let result = tokio::select! {
                    result = service.translate_unit(msgid) => result,
                    _ = &mut cancel => {
                        progress.abandon_with_message("Cancelled");
                        catalog.save()?;
                        warn!("Translation cancelled: {}", summary);
                        return Err(TranslationError::Cancelled.into());
                    }
                };

                match result {
                    Ok(outcome) => {
                        catalog.set_translation(msgid, &outcome.text)?;
                        if !outcome.is_clean() {
                            warn!("Unrestored references in '{}', marked fuzzy", truncate_text(msgid, 60));
                            catalog.mark_fuzzy(msgid);
                            summary.unrestored_units.push(msgid.clone());
                        }
                        if outcome.from_cache {
                            summary.from_cache += 1;
                        }
                        summary.translated += 1;
                    }
                    Err(e) => {
                        error!("Failed to translate '{}': {}", truncate_text(msgid, 60), e);
                        summary.failed += 1;
                    }
                }

                progress.inc(1);
            }

            progress.finish_and_clear();
            catalog.save()?;
        }

        info!("Translation completed: {}", summary);
        Ok(summary)
    }

    /// Run the repair pass over stored translations
    pub fn fix_references(&self, files: &[PathBuf], dry_run: bool) -> Result<FixSummary> {
        let repairer = Repairer::with_normalizations(self.config.repair.normalizations.clone())?;
        let mut summary = FixSummary::default();

        for file in files {
            let mut catalog = match PoCatalog::open(file) {
                Ok(catalog) => catalog,
                Err(e) => {
                    error!("Error processing {:?}: {:#}", file, e);
                    continue;
                }
            };
            summary.files += 1;

            let fixes = catalog.fix_references(&repairer, dry_run)?;
            if fixes.is_empty() {
                debug!("No corrupted references found in {:?}", file);
                continue;
            }

            summary.changed_files += 1;
            if dry_run {
                info!("Would fix {} reference(s) in {:?} (dry run)", fixes.len(), file);
            } else {
                catalog.save()?;
                info!("Fixed {} reference(s) in {:?}", fixes.len(), file);
            }
            summary.fixes.extend(fixes);
        }

        Ok(summary)
    }

    /// Clear fuzzy flags; returns the number of messages changed
    pub fn remove_fuzzy(&self, files: &[PathBuf]) -> Result<usize> {
        let mut total = 0;

        for file in files {
            let mut catalog = PoCatalog::open(file)?;
            let removed = catalog.remove_fuzzy_flags();
            if removed > 0 {
                catalog.save()?;
                info!("Updated {:?}: removed fuzzy flag from {} entries", file, removed);
            }
            total += removed;
        }

        Ok(total)
    }

    /// Completion of the target language against the RST sources
    pub fn status(&self, only: Option<&str>) -> Result<StatusReport> {
        catalog::analyze(
            &self.config.paths.source_dir,
            &self.messages_dir(),
            &self.config.target_language,
            only,
        )
    }
}

/// Whether an error chain ends in a user cancellation
pub fn is_cancelled(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<TranslationError>(), Some(TranslationError::Cancelled))
}

/// RST files below `path`, or the file itself
pub fn rst_sources(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else {
        FileManager::find_files(path, "rst")
    }
}
