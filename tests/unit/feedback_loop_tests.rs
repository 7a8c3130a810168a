/*!
 * Tests for the extraction feedback loop
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use docqa::app_config::FeedbackConfig;
use docqa::feedback::{ExtractionStrategy, Extractor, FallbackChain, FeedbackAction, FeedbackLoop};
use docqa::quality::QualityScorer;

use crate::common::{self, ScriptedScorer};

/// Extractor serving fixed text per strategy and failing for the rest
struct CannedExtractor {
    texts: HashMap<ExtractionStrategy, String>,
}

#[async_trait]
impl Extractor for CannedExtractor {
    async fn extract(&self, strategy: ExtractionStrategy) -> anyhow::Result<String> {
        self.texts
            .get(&strategy)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no text for {}", strategy))
    }
}

fn scripted_loop(scores: &[f64]) -> FeedbackLoop {
    FeedbackLoop::new(Arc::new(ScriptedScorer::new(scores)), &FeedbackConfig::default())
}

fn any_text(_strategy: ExtractionStrategy) -> std::future::Ready<anyhow::Result<String>> {
    std::future::ready(Ok("some extracted text".to_string()))
}

#[tokio::test]
async fn test_runLoop_withImprovingScores_shouldAcceptOnThirdIteration() {
    let feedback = scripted_loop(&[0.3, 0.5, 0.8]);

    let outcome = feedback.run_loop(&any_text, ExtractionStrategy::Text, 1, None).await;

    assert_eq!(outcome.final_action, FeedbackAction::Accept);
    assert!(outcome.accepted());
    assert_eq!(outcome.total_iterations(), 3);
    assert_eq!(
        outcome.strategies_tried(),
        vec![
            ExtractionStrategy::Text,
            ExtractionStrategy::Ocr,
            ExtractionStrategy::Vision
        ]
    );
    assert_eq!(outcome.results[0].action, FeedbackAction::Retry);
    assert_eq!(outcome.results[1].action, FeedbackAction::Retry);
    assert_eq!(outcome.best_result().unwrap().iteration, 3);
}

#[tokio::test]
async fn test_runLoop_withBudgetExhausted_shouldEscalateAndKeepBestIteration() {
    let feedback = scripted_loop(&[0.5, 0.55, 0.4]);

    let outcome = feedback.run_loop(&any_text, ExtractionStrategy::Text, 1, None).await;

    assert_eq!(outcome.final_action, FeedbackAction::Escalate);
    assert_eq!(outcome.total_iterations(), 3);
    let best = outcome.best_result().unwrap();
    assert_eq!(best.iteration, 2);
    assert_eq!(best.strategy_used, ExtractionStrategy::Ocr);
    assert!((outcome.final_report().unwrap().overall_score - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn test_runLoop_withImmediateAccept_shouldRunOnce() {
    let feedback = scripted_loop(&[0.95]);

    let outcome = feedback.run_loop(&any_text, ExtractionStrategy::Text, 1, None).await;

    assert_eq!(outcome.total_iterations(), 1);
    assert_eq!(outcome.final_action, FeedbackAction::Accept);
    assert_eq!(outcome.results[0].next_strategy, None);
}

#[tokio::test]
async fn test_runLoop_withScoreEqualToMinimum_shouldAccept() {
    let feedback = scripted_loop(&[0.6]);

    let outcome = feedback.run_loop(&any_text, ExtractionStrategy::Text, 1, None).await;

    assert_eq!(outcome.final_action, FeedbackAction::Accept);
}

#[tokio::test]
async fn test_runLoop_withLowScoreFromVision_shouldEscalateBeforeBudget() {
    let feedback = scripted_loop(&[0.2]).with_max_retries(10);

    let outcome = feedback.run_loop(&any_text, ExtractionStrategy::Vision, 1, None).await;

    assert_eq!(outcome.total_iterations(), 1);
    assert_eq!(outcome.final_action, FeedbackAction::Escalate);
    assert_eq!(
        outcome.results[0].next_strategy,
        Some(ExtractionStrategy::ManualReview)
    );
}

#[tokio::test]
async fn test_runLoop_withPanickingExtractor_shouldScoreEmptyText() {
    let feedback = FeedbackLoop::default();
    let extractor = |strategy: ExtractionStrategy| async move {
        if strategy == ExtractionStrategy::Text {
            panic!("extractor crashed");
        }
        Ok::<String, anyhow::Error>(common::well_formed_page())
    };

    let outcome = feedback.run_loop(&extractor, ExtractionStrategy::Text, 1, None).await;

    assert_eq!(outcome.results[0].quality_report.overall_score, 0.0);
    assert_eq!(outcome.results[0].action, FeedbackAction::Retry);
    assert_eq!(outcome.final_action, FeedbackAction::Accept);
    assert_eq!(outcome.results[1].strategy_used, ExtractionStrategy::Ocr);
}

#[tokio::test]
async fn test_runLoop_withRealScorer_shouldFallBackToBetterStrategy() {
    let extractor = CannedExtractor {
        texts: HashMap::from([
            (ExtractionStrategy::Text, common::mojibake_page()),
            (ExtractionStrategy::Ocr, common::well_formed_page()),
        ]),
    };
    let feedback = FeedbackLoop::new(
        Arc::new(QualityScorer::default()),
        &FeedbackConfig {
            min_score: 0.75,
            ..FeedbackConfig::default()
        },
    );

    let outcome = feedback.run_loop(&extractor, ExtractionStrategy::Text, 1, Some("en")).await;

    assert!(outcome.accepted());
    assert_eq!(outcome.total_iterations(), 2);
    assert_eq!(outcome.best_result().unwrap().strategy_used, ExtractionStrategy::Ocr);
}

#[tokio::test]
async fn test_runLoop_withCustomChain_shouldSkipMissingStrategies() {
    let feedback = scripted_loop(&[0.1, 0.9]).with_chain(FallbackChain::new(vec![
        ExtractionStrategy::Text,
        ExtractionStrategy::Vision,
        ExtractionStrategy::ManualReview,
    ]));

    let outcome = feedback.run_loop(&any_text, ExtractionStrategy::Text, 1, None).await;

    assert_eq!(
        outcome.strategies_tried(),
        vec![ExtractionStrategy::Text, ExtractionStrategy::Vision]
    );
    assert!(outcome.accepted());
}

#[tokio::test]
async fn test_runLoop_withZeroRetriesConfigured_shouldStillRunOnce() {
    let feedback = FeedbackLoop::new(
        Arc::new(ScriptedScorer::new(&[0.1])),
        &FeedbackConfig {
            max_retries: 0,
            ..FeedbackConfig::default()
        },
    );

    let outcome = feedback.run_loop(&any_text, ExtractionStrategy::Text, 1, None).await;

    assert_eq!(feedback.max_retries(), 1);
    assert_eq!(outcome.total_iterations(), 1);
    assert_eq!(outcome.final_action, FeedbackAction::Escalate);
}

#[test]
fn test_toJson_shouldSummarizeRun() {
    let feedback = scripted_loop(&[0.3, 0.8]);
    let outcome = tokio_test::block_on(feedback.run_loop(&any_text, ExtractionStrategy::Text, 2, None));

    let json = outcome.to_json();
    assert_eq!(json["final_action"], "accept");
    assert_eq!(json["total_iterations"], 2);
    assert_eq!(json["best_iteration"], 2);
    assert_eq!(json["strategies_tried"][1], "ocr");
}
