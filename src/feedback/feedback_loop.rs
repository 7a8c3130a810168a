/*!
 * Bounded retry/escalation loop over the fallback chain.
 *
 * Each evaluation scores the extracted text and decides to accept it, retry
 * with the next strategy of the chain, or escalate to manual review. The
 * driver `run_loop` re-extracts through a caller-supplied `Extractor` and is
 * guaranteed to finish with ACCEPT or ESCALATE within `max_retries`
 * iterations: extractor errors and panics are treated as empty text.
 */

use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::strategy::{ExtractionStrategy, FallbackChain};
use crate::app_config::FeedbackConfig;
use crate::quality::report::{QualityReport, ReportMetadata, round_to};
use crate::quality::scorer::{QualityScorer, TextScorer};

/// Decision taken for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackAction {
    /// Quality is good enough
    Accept,
    /// Re-extract with the next strategy
    Retry,
    /// Automated strategies exhausted; needs human review
    Escalate,
}

impl FeedbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Retry => "retry",
            Self::Escalate => "escalate",
        }
    }

    /// Whether the loop stops on this action
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Retry)
    }
}

/// Outcome of a single evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackResult {
    pub action: FeedbackAction,
    pub strategy_used: ExtractionStrategy,
    pub quality_report: QualityReport,
    /// Strategy to try next; reported on RETRY and on ESCALATE toward manual review
    pub next_strategy: Option<ExtractionStrategy>,
    /// 1-based iteration number
    pub iteration: usize,
    pub reason: String,
}

impl FeedbackResult {
    /// Flat display representation.
    pub fn to_json(&self) -> Value {
        json!({
            "action": self.action.as_str(),
            "strategy_used": self.strategy_used.as_str(),
            "next_strategy": self.next_strategy.map(|s| s.as_str()),
            "iteration": self.iteration,
            "reason": self.reason,
            "overall_score": round_to(self.quality_report.overall_score, 4),
            "grade": self.quality_report.grade.as_str(),
            "quality_report": self.quality_report.to_json(),
        })
    }
}

/// All evaluations of one `run_loop` call
#[derive(Debug, Clone)]
pub struct FeedbackLoopResult {
    /// Evaluations in iteration order
    pub results: Vec<FeedbackResult>,
    pub final_action: FeedbackAction,
    pub total_time: Duration,
}

impl FeedbackLoopResult {
    /// The highest-scoring iteration (earliest on ties), not necessarily the last.
    pub fn best_result(&self) -> Option<&FeedbackResult> {
        self.results.iter().fold(None, |best: Option<&FeedbackResult>, candidate| match best {
            Some(current)
                if current.quality_report.overall_score
                    >= candidate.quality_report.overall_score =>
            {
                Some(current)
            }
            _ => Some(candidate),
        })
    }

    /// The last evaluation.
    pub fn final_result(&self) -> Option<&FeedbackResult> {
        self.results.last()
    }

    /// Quality report of the last evaluation.
    pub fn final_report(&self) -> Option<&QualityReport> {
        self.results.last().map(|r| &r.quality_report)
    }

    pub fn total_iterations(&self) -> usize {
        self.results.len()
    }

    /// Strategies in the order they were tried.
    pub fn strategies_tried(&self) -> Vec<ExtractionStrategy> {
        self.results.iter().map(|r| r.strategy_used).collect()
    }

    pub fn accepted(&self) -> bool {
        self.final_action == FeedbackAction::Accept
    }

    /// Flat display representation.
    pub fn to_json(&self) -> Value {
        json!({
            "final_action": self.final_action.as_str(),
            "total_iterations": self.total_iterations(),
            "total_time_secs": round_to(self.total_time.as_secs_f64(), 4),
            "strategies_tried": self.strategies_tried().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            "best_iteration": self.best_result().map(|r| r.iteration),
            "best_score": self.best_result().map(|r| round_to(r.quality_report.overall_score, 4)),
            "results": self.results.iter().map(FeedbackResult::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Source of text for a given strategy.
///
/// The only contract is "return text or fail"; failures never escape the loop.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, strategy: ExtractionStrategy) -> anyhow::Result<String>;
}

#[async_trait]
impl<F, Fut> Extractor for F
where
    F: Fn(ExtractionStrategy) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn extract(&self, strategy: ExtractionStrategy) -> anyhow::Result<String> {
        (self)(strategy).await
    }
}

/// Retry/escalation state machine over the fallback chain.
#[derive(Clone)]
pub struct FeedbackLoop {
    scorer: Arc<dyn TextScorer>,
    min_score: f64,
    max_retries: usize,
    chain: FallbackChain,
}

impl FeedbackLoop {
    /// Create a loop from the feedback section of the configuration.
    pub fn new(scorer: Arc<dyn TextScorer>, config: &FeedbackConfig) -> Self {
        Self {
            scorer,
            min_score: config.min_score,
            max_retries: config.max_retries.max(1),
            chain: config.fallback_chain.clone(),
        }
    }

    /// Set the minimum score for ACCEPT.
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Set the iteration budget (at least 1).
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Use a custom fallback chain.
    pub fn with_chain(mut self, chain: FallbackChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// Score `text` and decide what to do with it.
    pub fn evaluate(
        &self,
        text: &str,
        strategy: ExtractionStrategy,
        total_pages: usize,
        expected_language: Option<&str>,
        iteration: usize,
    ) -> FeedbackResult {
        let report = self.scorer.score(text, total_pages, expected_language);
        let score = report.overall_score;

        let (action, next_strategy, reason) = if score >= self.min_score {
            (
                FeedbackAction::Accept,
                None,
                format!("Score {:.3} meets minimum {:.2}", score, self.min_score),
            )
        } else if iteration >= self.max_retries {
            (
                FeedbackAction::Escalate,
                None,
                format!(
                    "Score {:.3} below {:.2} after {} of {} attempts; retries exhausted",
                    score, self.min_score, iteration, self.max_retries
                ),
            )
        } else {
            let next = self.chain.next_after(strategy);
            if !self.chain.contains(strategy) || next == ExtractionStrategy::ManualReview {
                (
                    FeedbackAction::Escalate,
                    Some(next),
                    format!(
                        "Score {:.3} below {:.2}; no automated strategy after {}",
                        score, self.min_score, strategy
                    ),
                )
            } else {
                (
                    FeedbackAction::Retry,
                    Some(next),
                    format!(
                        "Score {:.3} below {:.2}; retrying {} -> {}",
                        score, self.min_score, strategy, next
                    ),
                )
            }
        };

        match action {
            FeedbackAction::Retry => debug!("Iteration {}: {}", iteration, reason),
            _ => info!("Iteration {}: {} ({})", iteration, action.as_str(), reason),
        }

        FeedbackResult {
            action,
            strategy_used: strategy,
            quality_report: report,
            next_strategy,
            iteration,
            reason,
        }
    }

    /// Extract, evaluate and escalate until ACCEPT or ESCALATE.
    pub async fn run_loop<E>(
        &self,
        extractor: &E,
        initial_strategy: ExtractionStrategy,
        total_pages: usize,
        expected_language: Option<&str>,
    ) -> FeedbackLoopResult
    where
        E: Extractor + ?Sized,
    {
        let started = Instant::now();
        let mut results: Vec<FeedbackResult> = Vec::new();

        if !initial_strategy.is_automated() {
            let report = QualityReport::empty(ReportMetadata {
                total_pages,
                text_length: 0,
                expected_language: expected_language.map(str::to_string),
            });
            info!("Manual review requested up front; nothing to automate");
            results.push(FeedbackResult {
                action: FeedbackAction::Escalate,
                strategy_used: initial_strategy,
                quality_report: report,
                next_strategy: Some(ExtractionStrategy::ManualReview),
                iteration: 1,
                reason: "Manual review is never automated".to_string(),
            });
            return FeedbackLoopResult {
                results,
                final_action: FeedbackAction::Escalate,
                total_time: started.elapsed(),
            };
        }

        let mut strategy = initial_strategy;
        for iteration in 1..=self.max_retries {
            let text = extract_safely(extractor, strategy).await;
            let result = self.evaluate(&text, strategy, total_pages, expected_language, iteration);
            let action = result.action;
            let next = result.next_strategy;
            results.push(result);

            if action.is_terminal() {
                break;
            }
            strategy = next.unwrap_or(ExtractionStrategy::ManualReview);
        }

        let final_action = results
            .last()
            .map(|r| r.action)
            .unwrap_or(FeedbackAction::Escalate);

        FeedbackLoopResult {
            results,
            final_action,
            total_time: started.elapsed(),
        }
    }
}

impl Default for FeedbackLoop {
    fn default() -> Self {
        Self::new(Arc::new(QualityScorer::default()), &FeedbackConfig::default())
    }
}

impl std::fmt::Debug for FeedbackLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackLoop")
            .field("min_score", &self.min_score)
            .field("max_retries", &self.max_retries)
            .field("chain", &self.chain)
            .finish()
    }
}

/// Run the extractor, turning errors and panics into empty text.
async fn extract_safely<E>(extractor: &E, strategy: ExtractionStrategy) -> String
where
    E: Extractor + ?Sized,
{
    match AssertUnwindSafe(extractor.extract(strategy)).catch_unwind().await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Extraction with {} failed, scoring as empty: {:#}", strategy, e);
            String::new()
        }
        Err(_) => {
            warn!("Extraction with {} panicked, scoring as empty", strategy);
            String::new()
        }
    }
}
