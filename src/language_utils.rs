use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Configuration accepts ISO 639-1 (2-letter) and ISO 639-3 (3-letter) codes;
/// the engine wants upper-case ISO 639-1 codes, with regional variants for a
/// few target languages.

/// Which side of a translation a code is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageRole {
    Source,
    Target,
}

fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    }
}

/// Validate that a code is a known ISO 639-1 or ISO 639-3 code
pub fn validate_language_code(code: &str) -> Result<()> {
    lookup(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1
pub fn normalize_to_part1(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    lang.to_639_1()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Language '{}' has no two-letter code", code))
}

/// Check if two language codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(code1), lookup(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Engine language code: upper-case ISO 639-1, regional variant for some targets
pub fn engine_language_code(code: &str, role: LanguageRole) -> Result<String> {
    let part1 = normalize_to_part1(code)?;
    let engine_code = match (role, part1.as_str()) {
        (LanguageRole::Target, "en") => "EN-GB".to_string(),
        (LanguageRole::Target, "pt") => "PT-PT".to_string(),
        _ => part1.to_uppercase(),
    };
    Ok(engine_code)
}
