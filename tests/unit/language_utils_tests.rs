/*!
 * Tests for language code utilities
 */

use docqa::language_utils::{
    cjk_ratio, get_language_name, is_cjk_char, is_cjk_language, normalize_language_pair,
    normalize_to_part1_or_part2t, validate_language_code, wildcard_matches,
};

#[test]
fn test_validateLanguageCode_withValidCodes_shouldSucceed() {
    assert!(validate_language_code("en").is_ok());
    assert!(validate_language_code("FR").is_ok());
    assert!(validate_language_code("deu").is_ok());
    assert!(validate_language_code("ger").is_ok());
}

#[test]
fn test_validateLanguageCode_withInvalidCodes_shouldFail() {
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("english").is_err());
}

#[test]
fn test_normalizeToPart1OrPart2t_shouldPreferTwoLetterCodes() {
    assert_eq!(normalize_to_part1_or_part2t("fra").unwrap(), "fr");
    assert_eq!(normalize_to_part1_or_part2t("fre").unwrap(), "fr");
    assert_eq!(normalize_to_part1_or_part2t("JA").unwrap(), "ja");
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("jpn").unwrap(), "Japanese");
    assert!(get_language_name("zz").is_err());
}

#[test]
fn test_isCjkLanguage_withRegionSuffix_shouldIgnoreSuffix() {
    assert!(is_cjk_language("zh-TW"));
    assert!(is_cjk_language("ja_JP"));
    assert!(is_cjk_language("kor"));
    assert!(!is_cjk_language("en-US"));
    assert!(!is_cjk_language("unknown"));
}

#[test]
fn test_isCjkChar_shouldCoverKanaHangulAndIdeographs() {
    assert!(is_cjk_char('漢'));
    assert!(is_cjk_char('ひ'));
    assert!(is_cjk_char('カ'));
    assert!(is_cjk_char('한'));
    assert!(!is_cjk_char('a'));
    assert!(!is_cjk_char('é'));
}

#[test]
fn test_cjkRatio_shouldIgnoreWhitespace() {
    assert_eq!(cjk_ratio(""), 0.0);
    assert_eq!(cjk_ratio("漢字 ab"), 0.5);
    assert_eq!(cjk_ratio("   "), 0.0);
}

#[test]
fn test_normalizeLanguagePair_shouldCanonicalize() {
    assert_eq!(normalize_language_pair("EN->FR"), "en→fr");
    assert_eq!(normalize_language_pair(" zh → en "), "zh→en");
    assert_eq!(normalize_language_pair("*"), "*");
}

#[test]
fn test_wildcardMatches_shouldTreatStarAsAnything() {
    assert!(wildcard_matches("*", "en→fr"));
    assert!(wildcard_matches("en→fr", "*"));
    assert!(wildcard_matches("en→fr", "en→fr"));
    assert!(!wildcard_matches("en→fr", "en→de"));
}

#[test]
fn test_wildcardMatches_withPairSides_shouldCompareEachSide() {
    assert!(wildcard_matches("*→en", "zh→en"));
    assert!(wildcard_matches("zh→en", "*→en"));
    assert!(!wildcard_matches("*→en", "zh→fr"));
    assert!(wildcard_matches("legal", "*"));
    assert!(!wildcard_matches("legal", "general"));
}
