/*!
 * # rstlate - markup-safe machine translation for RST documentation
 *
 * A Rust library for translating Sphinx/RST documentation catalogs through a
 * markup-unaware machine translation engine without corrupting the markup.
 *
 * ## Features
 *
 * - Shield cross-references, substitutions and hyperlinks behind opaque tokens
 * - Rebuild the markup around the translated display text
 * - Repair corruption signatures the engine is known to introduce
 * - DeepL client with pacing and bounded exponential backoff
 * - SQLite translation cache
 * - PO catalog updates, fuzzy flag cleanup and completion reports
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `markup`: the protection pipeline:
 *   - `markup::classifier`: fragment detection and overlap resolution
 *   - `markup::encoder`: token substitution
 *   - `markup::decoder`: markup reconstruction with fallbacks
 *   - `markup::repair`: ordered repair rule table
 * - `translation`: per-unit translation service and cache seam
 * - `providers`: engine trait, DeepL client and mock engine
 * - `database`: SQLite persistence for the cache
 * - `catalog`: PO catalogs, RST paragraph extraction and status reports
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod catalog;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod markup;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, MarkupError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part1};
pub use markup::{MarkupCodec, Restored};
pub use translation::{TranslationService, UnitOutcome};
