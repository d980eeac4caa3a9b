/*!
 * Common test utilities for the rstlate test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use rstlate::app_config::Config;

/// Header every generated PO file starts with
pub const PO_HEADER: &str = r#"msgid ""
msgstr ""
"Project-Id-Version: Koha Manual\n"
"Language: sv\n"
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Content-Transfer-Encoding: 8bit\n"
"Plural-Forms: nplurals=2; plural=(n != 1);\n"
"#;

/// Source units exercising every fragment kind
pub const SAMPLE_UNITS: &[&str] = &[
    "Plain sentence without markup.",
    "See :ref:`item search <item-searching-label>`.",
    "Go to :ref:`circulation-label` first.",
    "Use |koha| with |opac|.",
    "Read the `Koha Manual <https://koha-community.org/manual/>`__ today.",
    "Both :ref:`holds <holds-label>` and :ref:`renewals <renew-label>` apply.",
    "A wrapped :ref:`long display\ntext <wrapped-label>` reference.",
    "Mixed |koha| :ref:`patrons <patrons-label>` and `site <https://example.org>`_ here.",
    "Set **Username:** and *Password:* before :ref:`logging in<login-label>`.",
];

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content, creating parent directories
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// PO file body from (msgid, msgstr) pairs; strings must not need escaping
pub fn po_content(messages: &[(&str, &str)]) -> String {
    let mut content = PO_HEADER.to_string();
    for (msgid, msgstr) in messages {
        content.push_str(&format!("\nmsgid \"{}\"\nmsgstr \"{}\"\n", msgid, msgstr));
    }
    content
}

/// Documentation tree with one RST source and its Swedish catalog
pub fn create_manual_layout(root: &Path, stem: &str, rst: &str, messages: &[(&str, &str)]) -> Result<PathBuf> {
    create_test_file(&root.join("source"), &format!("{}.rst", stem), rst)?;
    create_test_file(
        &root.join("locales").join("sv").join("LC_MESSAGES"),
        &format!("{}.po", stem),
        &po_content(messages),
    )
}

/// Configuration pointing at a layout created by [`create_manual_layout`]
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.source_dir = root.join("source");
    config.paths.locale_dir = root.join("locales");
    config.cache.path = Some(root.join("cache.db"));
    config.common.rate_limit_delay_ms = 0;
    config.common.retry_backoff_ms = 0;
    config.common.retry_backoff_max_ms = 0;
    config
}

/// Route library logging to the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
