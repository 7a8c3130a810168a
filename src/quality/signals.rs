/*!
 * The six independent extraction quality signals.
 *
 * Each signal is computed over the whole text and returns a `SignalScore`
 * carrying the weight it was given:
 * - text_density: characters per page against a three-zone curve
 * - structure: headings, list items and paragraphs among the lines
 * - encoding: mojibake patterns and invalid characters
 * - language: share of word-like tokens and token length sanity
 * - completeness: extracted volume against a conservative minimum
 * - format_integrity: balance of math and markup delimiters
 */

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::report::{SignalName, SignalScore};
use crate::language_utils::{cjk_ratio, is_cjk_language};

/// Characters-per-page zones of the density curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityThresholds {
    /// Below this, the score ramps linearly toward 0
    #[serde(default = "default_min_chars_per_page")]
    pub min_chars_per_page: f64,

    /// From here up to the maximum, the score is 1.0
    #[serde(default = "default_ideal_chars_per_page")]
    pub ideal_chars_per_page: f64,

    /// Above this, the score decays toward 0.5
    #[serde(default = "default_max_chars_per_page")]
    pub max_chars_per_page: f64,
}

impl Default for DensityThresholds {
    fn default() -> Self {
        Self {
            min_chars_per_page: default_min_chars_per_page(),
            ideal_chars_per_page: default_ideal_chars_per_page(),
            max_chars_per_page: default_max_chars_per_page(),
        }
    }
}

fn default_min_chars_per_page() -> f64 {
    100.0
}

fn default_ideal_chars_per_page() -> f64 {
    800.0
}

fn default_max_chars_per_page() -> f64 {
    5000.0
}

/// Score reached at the minimum density
const DENSITY_SCORE_AT_MIN: f64 = 0.3;

/// Floor the score decays to above the maximum density
const DENSITY_OVERFLOW_FLOOR: f64 = 0.5;

/// Bad-character ratio multiplier; 2% bad characters scores 0
const ENCODING_PENALTY_FACTOR: f64 = 50.0;

/// Minimum CJK share before the CJK boost applies
const CJK_MIN_RATIO: f64 = 0.3;

/// Score for text without any structural markers
const NEUTRAL_FORMAT_SCORE: f64 = 0.7;

/// Lines longer than this count as paragraphs
const PARAGRAPH_MIN_CHARS: usize = 40;

static MOJIBAKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\x{FFFD}|\x{FEFF}|\x00|Ã[\x{80}-\x{BF}]|â€[\x{80}-\x{BF}\x{2122}\x{0153}\x{201C}\x{201D}\x{02DC}\x{0161}\x{017E}]|Â[\x{A0}-\x{BF}]",
    )
    .expect("mojibake pattern is a valid regex")
});

static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6}\s+\S|(?i:chapter|section|part|appendix)\s+\S|第\S{1,6}[章节部])")
        .expect("heading pattern is a valid regex")
});

static LIST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-*•+]\s+\S|\d{1,3}[.)]\s+\S|[a-zA-Z][.)]\s+\S)")
        .expect("list pattern is a valid regex")
});

static WORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\p{L}\p{M}\p{N}'’\-.,;:!?()"«»“”、。，]+$"#)
        .expect("word token pattern is a valid regex")
});

static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s").expect("markdown heading pattern is a valid regex"));

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]\n]+\]\([^)\n]+\)").expect("markdown link pattern is a valid regex")
});

/// Score characters per page against the density curve.
pub fn text_density(
    char_count: usize,
    total_pages: usize,
    thresholds: &DensityThresholds,
    weight: f64,
) -> SignalScore {
    let pages = total_pages.max(1);
    let per_page = char_count as f64 / pages as f64;
    let min = thresholds.min_chars_per_page;
    let ideal = thresholds.ideal_chars_per_page;
    let max = thresholds.max_chars_per_page;

    let score = if per_page < min {
        DENSITY_SCORE_AT_MIN * per_page / min
    } else if per_page < ideal {
        DENSITY_SCORE_AT_MIN + (1.0 - DENSITY_SCORE_AT_MIN) * (per_page - min) / (ideal - min)
    } else if per_page <= max {
        1.0
    } else {
        (1.0 - 0.5 * (per_page - max) / max).max(DENSITY_OVERFLOW_FLOOR)
    };

    SignalScore::new(
        SignalName::TextDensity,
        score,
        weight,
        format!(
            "{:.0} chars/page over {} pages (ideal {:.0}-{:.0})",
            per_page, pages, ideal, max
        ),
    )
}

fn is_heading(line: &str) -> bool {
    if HEADING_LINE.is_match(line) {
        return true;
    }

    let length = line.chars().count();
    if !(3..=60).contains(&length) {
        return false;
    }

    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// Score the share of lines that look like headings, list items or paragraphs.
pub fn structure(text: &str, weight: f64) -> SignalScore {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return SignalScore::new(SignalName::Structure, 0.0, weight, "no non-empty lines");
    }

    let mut headings = 0usize;
    let mut list_items = 0usize;
    let mut paragraphs = 0usize;

    for line in &lines {
        if is_heading(line) {
            headings += 1;
        } else if LIST_LINE.is_match(line) {
            list_items += 1;
        } else if line.chars().count() > PARAGRAPH_MIN_CHARS {
            paragraphs += 1;
        }
    }

    let total = lines.len() as f64;
    let heading_ratio = headings as f64 / total;
    let list_ratio = list_items as f64 / total;
    let paragraph_ratio = paragraphs as f64 / total;
    let raw = 0.3 * heading_ratio + 0.2 * list_ratio + 0.5 * paragraph_ratio;

    SignalScore::new(
        SignalName::Structure,
        (raw * 2.0).min(1.0),
        weight,
        format!(
            "{} lines: {} headings, {} list items, {} paragraphs",
            lines.len(),
            headings,
            list_items,
            paragraphs
        ),
    )
}

/// Private-use, noncharacter and stray control code points.
///
/// Stands in for "unassigned" since std carries no general-category table.
fn is_unassigned_like(c: char) -> bool {
    let cp = c as u32;
    let private_use = matches!(cp, 0xE000..=0xF8FF | 0xF0000..=0xFFFFD | 0x100000..=0x10FFFD);
    let noncharacter = matches!(cp, 0xFDD0..=0xFDEF) || (cp & 0xFFFE) == 0xFFFE;
    let stray_control = c.is_control() && !matches!(c, '\t' | '\n' | '\r');

    private_use || noncharacter || stray_control
}

/// Score the ratio of mojibake and invalid characters.
pub fn encoding(text: &str, weight: f64) -> SignalScore {
    let total_chars = text.chars().count();
    if total_chars == 0 {
        return SignalScore::new(SignalName::Encoding, 0.0, weight, "no characters");
    }

    let mojibake_chars: usize = MOJIBAKE
        .find_iter(text)
        .map(|m| m.as_str().chars().count())
        .sum();
    let remaining = MOJIBAKE.replace_all(text, "");
    let unassigned_chars = remaining.chars().filter(|c| is_unassigned_like(*c)).count();

    let bad = mojibake_chars + unassigned_chars;
    let ratio = bad as f64 / total_chars as f64;

    SignalScore::new(
        SignalName::Encoding,
        1.0 - ratio * ENCODING_PENALTY_FACTOR,
        weight,
        format!(
            "{} mojibake + {} invalid chars of {} ({:.2}%)",
            mojibake_chars,
            unassigned_chars,
            total_chars,
            ratio * 100.0
        ),
    )
}

fn is_word_like(token: &str) -> bool {
    WORD_TOKEN.is_match(token) && token.chars().any(char::is_alphabetic)
}

/// Score how much the text reads like natural language.
pub fn language(text: &str, expected_language: Option<&str>, weight: f64) -> SignalScore {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return SignalScore::new(SignalName::Language, 0.0, weight, "no tokens");
    }

    let word_like = tokens.iter().filter(|t| is_word_like(t)).count();
    let mut word_ratio = word_like as f64 / tokens.len() as f64;

    let total_token_chars: usize = tokens.iter().map(|t| t.chars().count()).sum();
    let avg_length = total_token_chars as f64 / tokens.len() as f64;
    let mut length_sanity = if (2.0..=15.0).contains(&avg_length) { 1.0 } else { 0.5 };

    let mut cjk_note = String::new();
    if let Some(code) = expected_language.filter(|code| is_cjk_language(code)) {
        let ratio = cjk_ratio(text);
        if ratio >= CJK_MIN_RATIO {
            // Whitespace tokenization under-counts CJK words.
            word_ratio = (word_ratio + 0.5 * ratio).min(1.0);
            length_sanity = 1.0;
            cjk_note = format!(", CJK share {:.0}% for '{}'", ratio * 100.0, code);
        }
    }

    SignalScore::new(
        SignalName::Language,
        0.7 * word_ratio + 0.3 * length_sanity,
        weight,
        format!(
            "{}/{} word-like tokens, avg length {:.1}{}",
            word_like,
            tokens.len(),
            avg_length,
            cjk_note
        ),
    )
}

/// Score extracted characters against the expected minimum per page.
pub fn completeness(
    char_count: usize,
    total_pages: usize,
    expected_chars_per_page: f64,
    weight: f64,
) -> SignalScore {
    let pages = total_pages.max(1);
    let expected_min = expected_chars_per_page * pages as f64;
    let score = if expected_min > 0.0 {
        char_count as f64 / expected_min
    } else {
        1.0
    };

    SignalScore::new(
        SignalName::Completeness,
        score.min(1.0),
        weight,
        format!("{} chars vs expected minimum {:.0}", char_count, expected_min),
    )
}

/// Score the balance of LaTeX math and markdown delimiters.
pub fn format_integrity(text: &str, weight: f64) -> SignalScore {
    let unescaped = text.replace("\\$", "");
    let display_math = unescaped.matches("$$").count();
    let inline_math = unescaped.matches('$').count().saturating_sub(2 * display_math);
    let open_bracket = text.matches("\\[").count();
    let close_bracket = text.matches("\\]").count();
    let open_paren = text.matches("\\(").count();
    let close_paren = text.matches("\\)").count();
    let headings = MARKDOWN_HEADING.find_iter(text).count();
    let bold = text.matches("**").count();
    let links = MARKDOWN_LINK.find_iter(text).count();

    let math_delimiters =
        display_math + inline_math + open_bracket + close_bracket + open_paren + close_paren;
    let markers = math_delimiters + headings + bold + links;

    if markers == 0 {
        return SignalScore::new(
            SignalName::FormatIntegrity,
            NEUTRAL_FORMAT_SCORE,
            weight,
            "no structural markers",
        );
    }

    let unmatched = display_math % 2
        + inline_math % 2
        + open_bracket.abs_diff(close_bracket)
        + open_paren.abs_diff(close_paren);

    let mut score = if math_delimiters > 0 {
        1.0 - unmatched as f64 / math_delimiters as f64
    } else {
        1.0
    };
    if bold % 2 == 1 {
        score -= 0.1;
    }

    SignalScore::new(
        SignalName::FormatIntegrity,
        score.max(0.0),
        weight,
        format!(
            "{} markers, {} math delimiters, {} unmatched",
            markers, math_delimiters, unmatched
        ),
    )
}
