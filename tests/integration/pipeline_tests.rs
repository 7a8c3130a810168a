/*!
 * End-to-end tests: extraction feedback, then provider routing and reporting
 */

use docqa::app_config::Config;
use docqa::feedback::{ExtractionStrategy, FeedbackAction};
use docqa::routing::{CallRecord, RoutingMode, ScoreSource};
use docqa::Controller;

use crate::common;

fn persisted_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.stats.persist_path = Some(dir.join("provider_stats.json"));
    config
}

#[tokio::test]
async fn test_pipeline_withScannedDocument_shouldRecoverThroughOcrThenRoute() {
    let dir = common::create_temp_dir().unwrap();
    let controller = Controller::with_config(persisted_config(dir.path())).unwrap();

    // Text layer is empty (scanned PDF); OCR produces clean text
    let extractor = |strategy: ExtractionStrategy| async move {
        match strategy {
            ExtractionStrategy::Text => Ok::<String, anyhow::Error>(String::new()),
            _ => Ok(common::well_formed_page().repeat(2)),
        }
    };

    let outcome = controller
        .run_extraction(&extractor, ExtractionStrategy::Text, 2, Some("en"))
        .await;
    assert_eq!(outcome.final_action, FeedbackAction::Accept);
    assert_eq!(outcome.results[0].quality_report.overall_score, 0.0);
    assert_eq!(outcome.best_result().unwrap().strategy_used, ExtractionStrategy::Ocr);

    let decision = controller.route("en→ja", "legal", Some(RoutingMode::BestQuality), &[]);
    assert_eq!(decision.provider, "anthropic");
    assert!(decision.candidates.iter().all(|c| c.source == ScoreSource::ColdStart));

    controller.report_call(
        CallRecord::new(&decision.provider, "en→ja", "legal", true)
            .with_quality(0.92)
            .with_latency_ms(2800.0)
            .with_cost(0.03)
            .with_tokens(1200, 800),
    );
    assert_eq!(controller.provider_summary("anthropic").total_calls(), 1);
}

#[tokio::test]
async fn test_pipeline_withUnreadableDocument_shouldEscalateToManualReview() {
    let controller = Controller::new_default().unwrap();
    let extractor = |_strategy: ExtractionStrategy| async move {
        Ok::<String, anyhow::Error>(common::mojibake_page())
    };

    let outcome = controller
        .run_extraction(&extractor, ExtractionStrategy::Text, 1, None)
        .await;

    assert_eq!(outcome.final_action, FeedbackAction::Escalate);
    assert!(outcome.total_iterations() <= controller.feedback_loop().max_retries());
    assert!(!outcome.final_report().unwrap().passed());
}

#[test]
fn test_pipeline_withRestart_shouldRouteOnPersistedHistory() {
    let dir = common::create_temp_dir().unwrap();

    {
        let controller = Controller::with_config(persisted_config(dir.path())).unwrap();
        for _ in 0..5 {
            controller.report_call(
                CallRecord::new("ollama", "de->en", "general", true)
                    .with_quality(0.97)
                    .with_latency_ms(800.0)
                    .with_tokens(400, 400),
            );
        }
    }

    let controller = Controller::with_config(persisted_config(dir.path())).unwrap();
    assert_eq!(controller.tracker().len(), 1);

    let decision = controller.route("de→en", "general", Some(RoutingMode::Balanced), &[]);
    assert_eq!(decision.provider, "ollama");
    let ollama = decision.candidates.iter().find(|c| c.provider == "ollama").unwrap();
    assert_eq!(ollama.source, ScoreSource::Historical);
    assert_eq!(ollama.calls, 5);
}

#[test]
fn test_pipeline_withAllProvidersExcluded_shouldDegradeGracefully() {
    let controller = Controller::new_default().unwrap();
    let all: Vec<String> = controller
        .config()
        .routing
        .providers
        .iter()
        .map(|p| p.name.clone())
        .collect();
    let excluded: Vec<&str> = all.iter().map(String::as_str).collect();

    let decision = controller.route("en→fr", "general", None, &excluded);

    assert_eq!(decision.provider, "anthropic");
    assert_eq!(decision.score, 0.0);
    assert!(decision.candidates.is_empty());
}

#[test]
fn test_pipeline_scorePages_shouldMatchJoinedScore() {
    let controller = Controller::new_default().unwrap();
    let page = common::well_formed_page();
    let pages = [page.as_str(), page.as_str(), page.as_str()];

    let report = controller.score_pages(&pages, Some("en"));

    assert_eq!(report.metadata.total_pages, 3);
    assert!(report.passed());
}
