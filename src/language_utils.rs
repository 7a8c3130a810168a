use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// This module provides functions for validating and normalizing ISO 639-1
/// (2-letter) and ISO 639-2 (3-letter) language codes, classifying CJK
/// scripts, and normalizing the `src→tgt` language pair strings used as
/// routing keys.

/// Wildcard accepted in language pairs and document types
pub const WILDCARD: &str = "*";

/// Separator used in normalized language pairs
pub const PAIR_SEPARATOR: char = '→';

/// Map an ISO 639-2/B code to its ISO 639-2/T counterpart
fn part2b_to_part2t(code: &str) -> &str {
    match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        other => other,
    }
}

/// Resolve a 2- or 3-letter code (ISO 639-1, 639-2/T or 639-2/B) to a language
fn resolve_language(code: &str) -> Option<Language> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => Language::from_639_3(part2b_to_part2t(&normalized_code)),
        _ => None,
    }
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<()> {
    resolve_language(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let lang = resolve_language(code)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = resolve_language(code)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;

    Ok(lang.to_name().to_string())
}

/// Check if a language code denotes Chinese, Japanese or Korean.
///
/// Region suffixes such as `zh-TW` or `ja_JP` are ignored. Unknown codes are
/// never CJK.
pub fn is_cjk_language(code: &str) -> bool {
    let base = code
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default();

    match normalize_to_part1_or_part2t(base) {
        Ok(normalized) => matches!(normalized.as_str(), "zh" | "ja" | "ko"),
        Err(_) => false,
    }
}

/// Check if a character belongs to one of the CJK script ranges
pub fn is_cjk_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF      // CJK Unified Ideographs
        | 0x3400..=0x4DBF    // Extension A
        | 0x20000..=0x2A6DF  // Extension B
        | 0xF900..=0xFAFF    // Compatibility Ideographs
        | 0x3040..=0x309F    // Hiragana
        | 0x30A0..=0x30FF    // Katakana
        | 0x31F0..=0x31FF    // Katakana Phonetic Extensions
        | 0xAC00..=0xD7AF    // Hangul Syllables
        | 0x1100..=0x11FF    // Hangul Jamo
        | 0x3130..=0x318F    // Hangul Compatibility Jamo
        | 0x3000..=0x303F    // CJK Symbols and Punctuation
        | 0xFF00..=0xFFEF    // Halfwidth and Fullwidth Forms
    )
}

/// Share of non-whitespace characters that are CJK (0.0 for empty text)
pub fn cjk_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut cjk = 0usize;

    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_cjk_char(c) {
            cjk += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        cjk as f64 / total as f64
    }
}

/// Normalize a `src→tgt` language pair.
///
/// Accepts `→` or `->` as separator, lowercases both sides and trims
/// whitespace. A bare wildcard stays a wildcard; a string without separator is
/// returned trimmed and lowercased.
pub fn normalize_language_pair(pair: &str) -> String {
    let trimmed = pair.trim();
    if trimmed == WILDCARD {
        return WILDCARD.to_string();
    }

    let replaced = trimmed.replace("->", "→");
    match replaced.split_once(PAIR_SEPARATOR) {
        Some((source, target)) => format!(
            "{}{}{}",
            source.trim().to_lowercase(),
            PAIR_SEPARATOR,
            target.trim().to_lowercase()
        ),
        None => replaced.to_lowercase(),
    }
}

/// Check if a stored key component matches a query component, honouring `*`
/// on either side.
///
/// Language pairs are compared per side, so `*→en` matches `zh→en`.
pub fn wildcard_matches(stored: &str, query: &str) -> bool {
    match (stored.split_once(PAIR_SEPARATOR), query.split_once(PAIR_SEPARATOR)) {
        (Some((stored_src, stored_tgt)), Some((query_src, query_tgt))) => {
            component_matches(stored_src, query_src) && component_matches(stored_tgt, query_tgt)
        }
        _ => component_matches(stored, query),
    }
}

fn component_matches(stored: &str, query: &str) -> bool {
    stored == WILDCARD || query == WILDCARD || stored == query
}
