/*!
 * Quality-aware provider routing.
 *
 * This module picks the translation provider for each call:
 * - **Stats**: thread-safe per-provider call metrics with optional JSON persistence
 * - **Priors**: cold-start expectations per provider
 * - **Router**: candidate scoring and mode-specific selection
 */

pub mod priors;
pub mod router;
pub mod stats;

// Re-export main types
pub use priors::{ProviderPrior, default_priors};
pub use router::{CandidateScore, ProviderRouter, RoutingDecision, RoutingMode, ScoreSource};
pub use stats::{CallRecord, MetricsKey, ProviderMetrics, StatsTracker};
