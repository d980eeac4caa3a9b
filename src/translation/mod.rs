/*!
 * Translation of RST text units through an external engine.
 *
 * - `core`: per-unit service (cache, markup protection, engine call with retries)
 * - `cache`: the cache seam and an in-memory implementation
 */

pub use self::cache::{TranslationCache, TranslationStore};
pub use self::core::{RetryPolicy, TranslationService, UnitOutcome};

pub mod cache;
pub mod core;
