use log::{debug, info};
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::feedback::{ExtractionStrategy, Extractor, FeedbackLoop, FeedbackLoopResult};
use crate::quality::{QualityReport, QualityScorer};
use crate::routing::{CallRecord, ProviderMetrics, ProviderRouter, RoutingDecision, RoutingMode, StatsTracker};

// @module: Application controller wiring scoring, feedback and routing

/// Main application controller for document quality control
#[derive(Debug, Clone)]
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Shared scorer, also used by the feedback loop
    scorer: Arc<QualityScorer>,

    feedback: FeedbackLoop,

    // @field: Router over the shared stats tracker
    router: ProviderRouter,
}

impl Controller {
    /// Create a controller with the default configuration and in-memory stats
    pub fn new_default() -> Result<Self, AppError> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validate()?;

        let scorer = Arc::new(QualityScorer::with_config(&config.quality)?);
        let feedback = FeedbackLoop::new(scorer.clone(), &config.feedback);

        let tracker = match &config.stats.persist_path {
            Some(path) => {
                info!("Provider stats persisted to {}", path.display());
                StatsTracker::with_persistence(path.clone())
            }
            None => {
                debug!("Provider stats kept in memory only");
                StatsTracker::in_memory()
            }
        };
        let router = ProviderRouter::new(tracker, &config.routing);

        Ok(Self {
            config,
            scorer,
            feedback,
            router,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn feedback_loop(&self) -> &FeedbackLoop {
        &self.feedback
    }

    pub fn router(&self) -> &ProviderRouter {
        &self.router
    }

    pub fn tracker(&self) -> &StatsTracker {
        self.router.tracker()
    }

    /// Score extracted text
    pub fn score(&self, text: &str, total_pages: usize, expected_language: Option<&str>) -> QualityReport {
        self.scorer.score(text, total_pages, expected_language)
    }

    /// Score per-page texts as one document
    pub fn score_pages(&self, pages: &[&str], expected_language: Option<&str>) -> QualityReport {
        self.scorer.score_pages(pages, expected_language)
    }

    /// Run the extraction feedback loop for one document
    pub async fn run_extraction<E>(
        &self,
        extractor: &E,
        initial_strategy: ExtractionStrategy,
        total_pages: usize,
        expected_language: Option<&str>,
    ) -> FeedbackLoopResult
    where
        E: Extractor + ?Sized,
    {
        let result = self
            .feedback
            .run_loop(extractor, initial_strategy, total_pages, expected_language)
            .await;

        info!(
            "Extraction finished with {} after {} iteration(s) in {:.2?}",
            result.final_action.as_str(),
            result.total_iterations(),
            result.total_time
        );

        result
    }

    /// Pick a provider for a translation call
    pub fn route(
        &self,
        language_pair: &str,
        document_type: &str,
        mode: Option<RoutingMode>,
        exclude_providers: &[&str],
    ) -> RoutingDecision {
        self.router.select(language_pair, document_type, mode, exclude_providers)
    }

    /// Report a finished translation call
    pub fn report_call(&self, record: CallRecord) {
        self.router.record_outcome(record);
    }

    /// Aggregate metrics of one provider over every key
    pub fn provider_summary(&self, provider: &str) -> ProviderMetrics {
        self.tracker().get_provider_summary(provider)
    }

    /// Write the current stats to the configured file, if any
    pub fn save_stats(&self) -> Result<(), AppError> {
        self.tracker().save()?;
        Ok(())
    }
}
