/*!
 * Tests for extraction quality scoring
 */

use docqa::QualityError;
use docqa::quality::{Grade, QualityScorer, SignalName, SignalWeights};
use rand::Rng;

use crate::common;

#[test]
fn test_score_withWellFormedPage_shouldPass() {
    let scorer = QualityScorer::default();
    let report = scorer.score(&common::well_formed_page(), 1, Some("en"));

    assert!(report.passed());
    assert!(report.overall_score >= 0.8, "score was {}", report.overall_score);
    assert!(matches!(report.grade, Grade::A | Grade::B));
    assert_eq!(report.signals.len(), 6);
    assert_eq!(report.signal(SignalName::Encoding).unwrap().score, 1.0);
}

#[test]
fn test_score_withMojibake_shouldFlagEncoding() {
    let scorer = QualityScorer::default();
    let clean = scorer.score(&common::well_formed_page(), 1, None);
    let garbled = scorer.score(&common::mojibake_page(), 1, None);

    let encoding = garbled.signal(SignalName::Encoding).unwrap();
    assert!(encoding.score < 0.1);
    assert!(garbled.overall_score < clean.overall_score);
    assert!(!garbled.grade.is_acceptable());
}

#[test]
fn test_score_withEmptyText_shouldBeGradeF() {
    let scorer = QualityScorer::default();
    let report = scorer.score("", 12, None);

    assert_eq!(report.overall_score, 0.0);
    assert_eq!(report.grade, Grade::F);
    assert!(report.signals.is_empty());
    assert_eq!(report.metadata.total_pages, 12);
    assert!(!report.passed());
}

#[test]
fn test_score_withCjkLanguage_shouldNotPenalizeMissingSpaces() {
    let scorer = QualityScorer::default();
    let text = common::japanese_page();

    let with_language = scorer.score(&text, 1, Some("ja"));
    let without_language = scorer.score(&text, 1, None);

    let boosted = with_language.signal(SignalName::Language).unwrap().score;
    let plain = without_language.signal(SignalName::Language).unwrap().score;
    assert!(boosted > plain);
    assert!((boosted - 1.0).abs() < 1e-9);
}

#[test]
fn test_score_withManyPagesAndLittleText_shouldLowerDensityAndCompleteness() {
    let scorer = QualityScorer::default();
    let text = common::well_formed_page();

    let one_page = scorer.score(&text, 1, None);
    let fifty_pages = scorer.score(&text, 50, None);

    assert!(
        fifty_pages.signal(SignalName::TextDensity).unwrap().score
            < one_page.signal(SignalName::TextDensity).unwrap().score
    );
    assert!(fifty_pages.signal(SignalName::Completeness).unwrap().score < 1.0);
    assert!(fifty_pages.overall_score < one_page.overall_score);
}

#[test]
fn test_score_withRandomText_shouldStayInUnitRange() {
    let scorer = QualityScorer::default();
    let mut rng = rand::rng();

    for _ in 0..200 {
        let length = rng.random_range(0..2000);
        let text: String = (0..length)
            .filter_map(|_| {
                let code_point = if rng.random_bool(0.7) {
                    rng.random_range(0x20..0x7F)
                } else {
                    rng.random_range(0..0x11_0000)
                };
                char::from_u32(code_point)
            })
            .collect();
        let pages = rng.random_range(0..20);

        let report = scorer.score(&text, pages, None);
        assert!((0.0..=1.0).contains(&report.overall_score));
        for signal in &report.signals {
            assert!((0.0..=1.0).contains(&signal.score), "{} = {}", signal.name, signal.score);
        }
        assert_eq!(report.grade, Grade::from_score(report.overall_score));
    }
}

#[test]
fn test_new_withWeightsSummingToOnePointFive_shouldFail() {
    let weights = SignalWeights {
        text_density: 0.5,
        ..SignalWeights::default()
    };

    let result = QualityScorer::new(weights);
    assert!(matches!(result, Err(QualityError::InvalidWeights { .. })));
}

#[test]
fn test_new_withCustomWeights_shouldShiftScore() {
    let encoding_only = SignalWeights {
        text_density: 0.0,
        structure: 0.0,
        encoding: 1.0,
        language: 0.0,
        completeness: 0.0,
        format_integrity: 0.0,
    };
    let scorer = QualityScorer::new(encoding_only).unwrap();

    let report = scorer.score(&common::mojibake_page(), 1, None);
    let encoding = report.signal(SignalName::Encoding).unwrap().score;
    assert!((report.overall_score - encoding).abs() < 1e-9);
}

#[test]
fn test_report_withLowScore_shouldRecommendFixForWeakestSignal() {
    let scorer = QualityScorer::default();
    let report = scorer.score(&common::mojibake_page(), 1, None);

    let weakest = report.weakest_signal().unwrap();
    assert_eq!(weakest.score, 0.0);
    assert!(report.recommendation.starts_with("Weakest signal:"));
    assert!(report.recommendation.contains(weakest.name.as_str()));
}

#[test]
fn test_toJson_shouldExposeFlatFields() {
    let scorer = QualityScorer::default();
    let json = scorer.score(&common::well_formed_page(), 1, Some("en")).to_json();

    assert!(json["overall_score"].is_number());
    assert!(json["grade"].is_string());
    assert_eq!(json["signals"].as_array().unwrap().len(), 6);
    assert_eq!(json["expected_language"], "en");
}
