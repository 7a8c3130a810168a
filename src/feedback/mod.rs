/*!
 * Adaptive extraction feedback.
 *
 * This module drives the accept/retry/escalate decision for extracted text:
 * - **Strategy**: extraction strategies and the ordered fallback chain
 * - **Feedback loop**: the per-evaluation state machine and its iterative driver
 */

pub mod feedback_loop;
pub mod strategy;

// Re-export main types
pub use feedback_loop::{Extractor, FeedbackAction, FeedbackLoop, FeedbackLoopResult, FeedbackResult};
pub use strategy::{ExtractionStrategy, FallbackChain};
