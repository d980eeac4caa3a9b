/*!
 * Documentation sources and their translation catalogs.
 *
 * - `po`: gettext catalogs holding msgid/msgstr pairs
 * - `rst`: translatable paragraphs of RST sources
 * - `status`: completion report per document
 */

pub mod po;
pub mod rst;
pub mod status;

pub use po::{CatalogStats, PoCatalog, ReferenceFix};
pub use rst::{normalize_text, translatable_units};
pub use status::{analyze, progress_bar, FileStatus, StatusReport};
