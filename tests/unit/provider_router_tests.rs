/*!
 * Tests for quality-aware provider routing
 */

use docqa::app_config::RoutingConfig;
use docqa::routing::{
    CallRecord, ProviderPrior, ProviderRouter, RoutingMode, ScoreSource, StatsTracker,
};

fn cold_router() -> ProviderRouter {
    ProviderRouter::with_defaults(StatsTracker::in_memory())
}

fn record_calls(tracker: &StatsTracker, provider: &str, pair: &str, doc_type: &str, quality: f64, count: usize) {
    for _ in 0..count {
        tracker.record(
            CallRecord::new(provider, pair, doc_type, true)
                .with_quality(quality)
                .with_latency_ms(500.0)
                .with_cost(0.0)
                .with_tokens(500, 500),
        );
    }
}

#[test]
fn test_select_withAffinityPair_shouldBoostCandidateQuality() {
    let router = cold_router();

    let boosted = router.rank("zh→en", "novel", Some(RoutingMode::BestQuality), &[]);
    let plain = router.rank("fr→de", "novel", Some(RoutingMode::BestQuality), &[]);

    let quality_of = |candidates: &[docqa::routing::CandidateScore]| {
        candidates
            .iter()
            .find(|c| c.provider == "deepseek")
            .map(|c| c.quality)
            .unwrap()
    };
    assert!((quality_of(&boosted) - 0.87).abs() < 1e-9);
    assert!((quality_of(&plain) - 0.82).abs() < 1e-9);
}

#[test]
fn test_select_balancedForChineseAcademic_shouldPickDeepseek() {
    let decision = cold_router().select("zh->en", "academic", Some(RoutingMode::Balanced), &[]);

    assert_eq!(decision.provider, "deepseek");
    assert_eq!(decision.mode, RoutingMode::Balanced);
    assert!(decision.score > 0.8);
    assert!(!decision.is_fallback());
}

#[test]
fn test_select_withExclusion_shouldSkipExcludedProvider() {
    let decision = cold_router().select("zh→en", "academic", Some(RoutingMode::Balanced), &["deepseek"]);

    assert_ne!(decision.provider, "deepseek");
    assert_eq!(decision.candidates.len(), 4);
    assert!(decision.candidates.iter().all(|c| c.provider != "deepseek"));
}

#[test]
fn test_select_cheapestGoodEnough_shouldNeverPickBelowThreshold() {
    let router = cold_router();
    let decision = router.select("en→fr", "general", Some(RoutingMode::CheapestGoodEnough), &[]);

    // ollama is free but its prior quality (0.70) is under the 0.75 bar
    assert_eq!(decision.provider, "deepseek");
    let ollama = decision.candidates.iter().find(|c| c.provider == "ollama").unwrap();
    assert!(ollama.composite < 0.1);
    let chosen = decision.candidates.iter().find(|c| c.provider == decision.provider).unwrap();
    assert!(chosen.quality >= router.quality_threshold());
}

#[test]
fn test_select_cheapestGoodEnough_withNobodyQualifying_shouldPickBestQuality() {
    let router = cold_router().with_quality_threshold(0.99);
    let decision = router.select("en→fr", "general", Some(RoutingMode::CheapestGoodEnough), &[]);

    // openai: 0.88 + affinity 0.05 + strength 0.03
    assert_eq!(decision.provider, "openai");
    assert!((decision.score - 0.096).abs() < 1e-9);
    assert!(decision.reason.contains("No candidate meets"));
}

#[test]
fn test_select_withEnoughHistory_shouldOverridePriors() {
    let tracker = StatsTracker::in_memory();
    record_calls(&tracker, "ollama", "en→fr", "general", 0.99, 5);
    let router = ProviderRouter::with_defaults(tracker);

    let decision = router.select("en→fr", "general", Some(RoutingMode::BestQuality), &[]);

    assert_eq!(decision.provider, "ollama");
    let ollama = decision.candidates.iter().find(|c| c.provider == "ollama").unwrap();
    assert_eq!(ollama.source, ScoreSource::Historical);
    assert_eq!(ollama.calls, 5);
    assert!((ollama.quality - 0.99).abs() < 1e-9);
    assert_eq!(ollama.success_rate, 1.0);
}

#[test]
fn test_select_withFailingHistory_shouldDemoteProvider() {
    let tracker = StatsTracker::in_memory();
    for _ in 0..4 {
        tracker.record(CallRecord::new("anthropic", "ja→en", "legal", false));
    }
    let router = ProviderRouter::with_defaults(tracker);

    let ranked = router.rank("ja→en", "legal", Some(RoutingMode::BestQuality), &[]);
    assert_eq!(ranked.last().unwrap().provider, "anthropic");
    assert_eq!(ranked.last().unwrap().success_rate, 0.0);
}

#[test]
fn test_resolveMetrics_withOnlyPairWildcard_shouldPreferItOverSummary() {
    let tracker = StatsTracker::in_memory();
    record_calls(&tracker, "gemini", "en→fr", "*", 0.5, 3);
    record_calls(&tracker, "gemini", "de→en", "technical", 0.9, 3);
    let router = ProviderRouter::with_defaults(tracker);

    let ranked = router.rank("en→fr", "technical", None, &[]);
    let gemini = ranked.iter().find(|c| c.provider == "gemini").unwrap();

    assert_eq!(gemini.calls, 3);
    assert!((gemini.quality - 0.5).abs() < 1e-9);
}

#[test]
fn test_resolveMetrics_withOnlyOtherKeys_shouldFallBackToSummary() {
    let tracker = StatsTracker::in_memory();
    record_calls(&tracker, "openai", "en→es", "legal", 0.8, 2);
    record_calls(&tracker, "openai", "de→en", "general", 0.6, 2);
    let router = ProviderRouter::with_defaults(tracker);

    let ranked = router.rank("ja→ko", "medical", None, &[]);
    let openai = ranked.iter().find(|c| c.provider == "openai").unwrap();

    assert_eq!(openai.calls, 4);
    assert_eq!(openai.source, ScoreSource::Historical);
    assert!((openai.quality - 0.7).abs() < 1e-9);
}

#[test]
fn test_select_withTiedCandidates_shouldPreferConfigurationOrder() {
    let priors = vec![
        ProviderPrior::new("first", 0.8, 0.01, 1000.0),
        ProviderPrior::new("second", 0.8, 0.01, 1000.0),
    ];
    let router = cold_router().with_priors(priors);

    for mode in [RoutingMode::BestQuality, RoutingMode::CheapestGoodEnough, RoutingMode::Balanced] {
        assert_eq!(router.select("en→fr", "general", Some(mode), &[]).provider, "first");
    }
}

#[test]
fn test_select_withoutMode_shouldUseConfiguredDefault() {
    let config = RoutingConfig {
        default_mode: RoutingMode::CheapestGoodEnough,
        ..RoutingConfig::default()
    };
    let router = ProviderRouter::new(StatsTracker::in_memory(), &config);

    let decision = router.select("en→fr", "general", None, &[]);
    assert_eq!(decision.mode, RoutingMode::CheapestGoodEnough);
}

#[test]
fn test_recordOutcome_shouldBeVisibleToNextSelection() {
    let router = cold_router();
    router.record_outcome(CallRecord::new("gemini", "en→hi", "general", true).with_quality(0.9));

    let ranked = router.rank("en→hi", "general", None, &[]);
    let gemini = ranked.iter().find(|c| c.provider == "gemini").unwrap();
    assert_eq!(gemini.source, ScoreSource::Blended);
    assert_eq!(router.tracker().len(), 1);
}

#[test]
fn test_toJson_shouldListCandidates() {
    let json = cold_router()
        .select("en→ja", "legal", Some(RoutingMode::BestQuality), &[])
        .to_json();

    assert_eq!(json["mode"], "best_quality");
    assert_eq!(json["candidates"].as_array().unwrap().len(), 5);
    assert_eq!(json["candidates"][0]["source"], "cold_start");
}
