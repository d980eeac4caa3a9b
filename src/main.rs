// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use rstlate::app_config::{self, Config};
use rstlate::app_controller::{self, Controller};
use rstlate::database::{DatabaseConnection, Repository, DEFAULT_CLEAN_PATTERN};
use rstlate::markup::scan::{scan_references, ScanSummary};
use rstlate::file_utils::FileManager;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate pending PO messages through DeepL
    Translate {
        /// Only this document (file stem, e.g. 'circulation')
        #[arg(short, long)]
        file: Option<String>,

        /// Retranslate messages that already have a translation
        #[arg(short, long)]
        all: bool,

        /// Do not read or write the translation cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Show translation completion per document
    Status {
        /// Only this document (file stem)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Repair corrupted references in existing translations
    FixRefs {
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Print every changed message
        #[arg(short, long)]
        verbose: bool,
    },

    /// Remove fuzzy flags from all PO files of the language
    RemoveFuzzy,

    /// List multi-line and closely spaced references in RST sources
    Refs {
        /// RST file or directory; defaults to the configured source directory
        path: Option<PathBuf>,
    },

    /// Inspect and clean the translation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Translate a single string and print the result
    Text {
        text: String,
    },

    /// Generate shell completions for rstlate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show entry counts and size
    Stats,

    /// Delete every entry
    Clear,

    /// Delete entries not used for a number of days
    DeleteUnused {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Delete entries whose source or translation contains TEXT
    DeleteContaining {
        text: String,
    },

    /// Delete entries whose translation matches a regex
    Clean {
        #[arg(long, default_value = DEFAULT_CLEAN_PATTERN)]
        pattern: String,

        /// Only list the matching entries
        #[arg(long)]
        dry_run: bool,
    },
}

/// rstlate - markup-safe machine translation for RST documentation
///
/// Sends PO messages through DeepL while shielding cross-references,
/// substitutions and hyperlinks, then repairs what the engine corrupted.
#[derive(Parser, Debug)]
#[command(name = "rstlate")]
#[command(version)]
#[command(about = "Markup-safe machine translation for RST documentation")]
#[command(long_about = "rstlate translates gettext catalogs of Sphinx/RST documentation with DeepL.

EXAMPLES:
    rstlate translate                          # Translate all pending messages
    rstlate translate --file circulation       # Translate one document
    rstlate --lang de status                   # Completion report for German
    rstlate fix-refs --dry-run                 # Preview reference repairs
    rstlate cache clean --dry-run              # List cached placeholder residue
    rstlate text 'See :ref:`Holds <holds-label>`'
    rstlate completions bash > rstlate.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't
    exist, a default one is created. The API key can also be given with
    --api-key or the DEEPL_API_KEY environment variable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Target language code (e.g., 'sv', 'de')
    #[arg(long, global = true)]
    lang: Option<String>,

    /// DeepL API key
    #[arg(long, env = "DEEPL_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself passes everything; set_max_level does the filtering
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Info until the configuration is known
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    if let Err(e) = run(cli).await {
        if app_controller::is_cancelled(&e) {
            warn!("Interrupted; finished translations were saved");
            std::process::exit(130);
        }
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Load the configuration and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let (mut config, created) = Config::load_or_create(&cli.config_path)?;
    if created {
        warn!("Config file not found at {:?}, created default config.", cli.config_path);
    }

    if let Some(lang) = &cli.lang {
        config.target_language = lang.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.engine.api_key = api_key.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

fn open_cache(config: &Config) -> Result<Repository> {
    match &config.cache.path {
        Some(path) => Ok(Repository::new(DatabaseConnection::new(path)?)),
        None => Repository::new_default(),
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "rstlate", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Translate { file, all, no_cache } => {
            let controller = Controller::for_translation(config, !no_cache)?;
            let files = controller.catalog_files(file.as_deref())?;
            controller.test_connection().await?;

            let summary = controller.translate_catalogs(&files, all).await?;
            for msgid in &summary.unrestored_units {
                warn!("Check references in: {}", msgid);
            }
            println!("{}", summary);
        }

        Commands::Status { file } => {
            let report = Controller::with_config(config).status(file.as_deref())?;
            println!("{}", report);

            let missing: Vec<_> = report.files.iter().filter(|f| f.has_catalog && !f.missing.is_empty()).collect();
            if file.is_some() {
                for (i, text) in missing.iter().flat_map(|f| f.missing.iter()).enumerate() {
                    println!("{:>4}. {}", i + 1, text);
                }
            } else if !missing.is_empty() {
                println!("\nFiles with content in RST not included in PO files:");
                for status in missing {
                    println!("  - {}: {} strings missing", status.name, status.missing.len());
                }
            }
        }

        Commands::FixRefs { dry_run, verbose } => {
            let controller = Controller::with_config(config);
            let files = controller.catalog_files(None)?;
            let summary = controller.fix_references(&files, dry_run)?;

            if verbose || dry_run {
                for fix in &summary.fixes {
                    println!("\nOriginal: {}\nFixed:    {}\nRules:    {}", fix.before, fix.after, fix.rules.join(", "));
                }
            }
            let verb = if dry_run { "Would fix" } else { "Fixed" };
            println!(
                "{} corrupted references in {} of {} PO files",
                verb, summary.changed_files, summary.files
            );
        }

        Commands::RemoveFuzzy => {
            let controller = Controller::with_config(config);
            let files = controller.catalog_files(None)?;
            let removed = controller.remove_fuzzy(&files)?;
            println!("Removed fuzzy flags from {} entries across {} files.", removed, files.len());
        }

        Commands::Refs { path } => {
            let root = path.unwrap_or_else(|| config.paths.source_dir.clone());
            let mut totals = ScanSummary::default();

            for source in app_controller::rst_sources(&root)? {
                let sites = scan_references(&FileManager::read_to_string(&source)?);
                if sites.is_empty() {
                    continue;
                }
                println!("\n{}", source.display());
                for site in &sites {
                    println!("  {}", site.formatted());
                }
                totals.add(&sites);
            }

            println!(
                "\n{} references, {} multi-line, {} consecutive",
                totals.total, totals.multi_line, totals.consecutive
            );
        }

        Commands::Cache { action } => {
            let repository = open_cache(&config)?;
            match action {
                CacheAction::Stats => println!("{}", repository.stats().await?),
                CacheAction::Clear => {
                    let removed = repository.clear().await?;
                    repository.connection().vacuum().await?;
                    println!("Cleared {} cache entries", removed);
                }
                CacheAction::DeleteUnused { days } => {
                    let removed = repository.delete_unused(days).await?;
                    println!("Deleted {} entries unused for {} days", removed, days);
                }
                CacheAction::DeleteContaining { text } => {
                    let removed = repository.delete_containing(&text).await?;
                    println!("Deleted {} entries containing '{}'", removed, text);
                }
                CacheAction::Clean { pattern, dry_run } => {
                    let records = repository.clean_pattern(&pattern, dry_run).await?;
                    for record in &records {
                        println!("{}", record);
                    }
                    let verb = if dry_run { "Would delete" } else { "Deleted" };
                    println!("{} {} entries matching {}", verb, records.len(), pattern);
                }
            }
        }

        Commands::Text { text } => {
            let controller = Controller::for_translation(config, true)?;
            let outcome = controller.translate_text(&text).await?;
            if !outcome.is_clean() {
                warn!("{} reference(s) could not be restored", outcome.unrestored.len());
            }
            info!("Repairs: {}", if outcome.repairs.is_empty() { "none".to_string() } else { outcome.repairs.join(", ") });
            println!("{}", outcome.text);
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
