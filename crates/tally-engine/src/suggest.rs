//! # Suggestion Provider
//!
//! Optional assist layer: given the raw order text, an external service may
//! propose `(name, quantity)` pairs the operator can accept with one tap.
//!
//! ## Degradation Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  suggest_with_timeout(provider, text, budget)                           │
//! │                                                                         │
//! │    provider answers in time ──► its suggestions                         │
//! │    provider errors          ──► [] (logged at debug, never surfaced)    │
//! │    budget elapses           ──► [] (logged at debug, never surfaced)    │
//! │                                                                         │
//! │  Suggestions are ADVISORY. The deterministic parse/resolve pipeline     │
//! │  is the source of truth; a slow or broken provider must never block     │
//! │  or fail order entry.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::EngineResult;
use tally_core::Suggestion;

/// Default time budget for a suggestion call.
pub const DEFAULT_SUGGEST_TIMEOUT: Duration = Duration::from_secs(2);

/// A pluggable provider of order-text suggestions.
///
/// Implementations may call a remote model, a local heuristic, or nothing
/// at all ([`NoSuggestions`]). Callers should go through
/// [`suggest_with_timeout`] rather than calling `suggest` directly.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Proposes suggestions for the given raw order text.
    async fn suggest(&self, text: &str) -> EngineResult<Vec<Suggestion>>;
}

/// The null provider: suggestions disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSuggestions;

#[async_trait]
impl SuggestionService for NoSuggestions {
    async fn suggest(&self, _text: &str) -> EngineResult<Vec<Suggestion>> {
        Ok(Vec::new())
    }
}

/// Runs a suggestion call under a time budget, degrading silently to an
/// empty list on timeout or provider failure.
pub async fn suggest_with_timeout(
    service: &dyn SuggestionService,
    text: &str,
    budget: Duration,
) -> Vec<Suggestion> {
    match tokio::time::timeout(budget, service.suggest(text)).await {
        Ok(Ok(suggestions)) => suggestions,
        Ok(Err(err)) => {
            debug!(error = %err, "Suggestion provider failed, continuing without");
            Vec::new()
        }
        Err(_) => {
            debug!(budget_ms = budget.as_millis() as u64, "Suggestion call timed out");
            Vec::new()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
