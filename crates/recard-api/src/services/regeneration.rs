//! Regeneration coordination: regenerate, compare, apply.
//!
//! Three request shapes share one entry point:
//! - plain: run the rule-based generator against the card's stored
//!   snippet and apply the result;
//! - `useAI`: same but through the AI backend (availability-checked);
//! - `comparisonMode`: run both strategies concurrently and return the
//!   two-sided comparison without touching the card; a later request
//!   with `selectedVersion` + the echoed comparison applies the choice.
//!
//! Concurrency rules: one in-flight regeneration per card (in-process
//! guard), a bounded wait on comparison mode after which the joined
//! generation future is dropped (so a late backend response is
//! discarded, never applied), and a version compare-and-swap on apply
//! so a user edit that lands mid-comparison wins over the stale result.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use recard_core::defaults::COMPARISON_TIMEOUT_SECS;
use recard_core::{
    AiStatus, Card, CardGenerator, CardRepository, ComparisonResult, Error, GeneratedBy,
    GeneratedCard, Result,
};

use crate::query_types::RegenerateRequest;

/// Outcome of one regenerate call.
#[derive(Debug)]
pub enum RegenerationOutcome {
    /// A variant was applied; the card reflects it.
    Applied(Card),
    /// Comparison mode: both results (or their failure reasons),
    /// nothing applied yet.
    Comparison(ComparisonResult),
}

/// Coordinates the regenerate/compare/apply workflow.
pub struct RegenerationService {
    cards: Arc<dyn CardRepository>,
    rule_based: Arc<dyn CardGenerator>,
    ai: Arc<dyn CardGenerator>,
    ai_status: Arc<dyn AiStatus>,
    comparison_timeout: Duration,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

/// Membership token in the in-flight set; releases on drop so every
/// exit path (success, error, timeout) frees the card.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<Uuid>>>,
    id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.id);
    }
}

impl RegenerationService {
    pub fn new(
        cards: Arc<dyn CardRepository>,
        rule_based: Arc<dyn CardGenerator>,
        ai: Arc<dyn CardGenerator>,
        ai_status: Arc<dyn AiStatus>,
    ) -> Self {
        Self {
            cards,
            rule_based,
            ai,
            ai_status,
            comparison_timeout: Duration::from_secs(COMPARISON_TIMEOUT_SECS),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Override the comparison ceiling (tests use milliseconds).
    pub fn with_comparison_timeout(mut self, timeout: Duration) -> Self {
        self.comparison_timeout = timeout;
        self
    }

    fn try_acquire(&self, id: Uuid) -> Result<InFlightGuard> {
        let mut set = self.in_flight.lock().unwrap();
        if !set.insert(id) {
            return Err(Error::Conflict(
                "a regeneration for this card is already in progress".into(),
            ));
        }
        Ok(InFlightGuard {
            set: self.in_flight.clone(),
            id,
        })
    }

    pub async fn regenerate(
        &self,
        id_or_card_id: &str,
        owner_id: &str,
        request: RegenerateRequest,
    ) -> Result<RegenerationOutcome> {
        let card = self.cards.find_one_by_owner(id_or_card_id, owner_id).await?;
        // Public visibility grants reads, not regeneration.
        if card.owner_id != owner_id {
            return Err(Error::NotFound(format!("Card {} not found", id_or_card_id)));
        }

        if let Some(selected) = request.selected_version.as_deref() {
            return self.apply_selection(&card, owner_id, selected, request.comparison_data).await;
        }

        let snippet = card
            .provenance
            .as_ref()
            .and_then(|p| p.snippet.clone())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::Precondition("card has no stored snippet to regenerate from".into())
            })?;

        let _guard = self.try_acquire(card.id)?;

        if request.comparison_mode {
            self.run_comparison(&card, &snippet).await
        } else if request.use_ai {
            self.require_ai_available().await?;
            let generated = self.ai.generate(&snippet).await?;
            let applied = self
                .cards
                .apply_generated(card.id, owner_id, &generated, GeneratedBy::Ai, card.version)
                .await?;
            Ok(RegenerationOutcome::Applied(applied))
        } else {
            let generated = self.rule_based.generate(&snippet).await?;
            let applied = self
                .cards
                .apply_generated(
                    card.id,
                    owner_id,
                    &generated,
                    GeneratedBy::RuleBased,
                    card.version,
                )
                .await?;
            Ok(RegenerationOutcome::Applied(applied))
        }
    }

    async fn require_ai_available(&self) -> Result<()> {
        let status = self.ai_status.status().await;
        if status.available {
            Ok(())
        } else {
            Err(Error::Precondition(format!(
                "AI backend is unavailable: {}",
                status.reason.unwrap_or_else(|| "unknown reason".into())
            )))
        }
    }

    /// Run both strategies against the same snippet under the bounded
    /// wait. Per-side failures are isolated; only both sides failing is
    /// a total failure. On timeout the joined future is dropped, which
    /// is what discards a late backend response.
    async fn run_comparison(&self, card: &Card, snippet: &str) -> Result<RegenerationOutcome> {
        self.require_ai_available().await?;

        let work = async {
            tokio::join!(self.rule_based.generate(snippet), self.ai.generate(snippet))
        };
        let (rule_result, ai_result) = tokio::time::timeout(self.comparison_timeout, work)
            .await
            .map_err(|_| {
                warn!(
                    subsystem = "regen",
                    component = "regeneration_service",
                    op = "comparison",
                    card_id = %card.id,
                    "Comparison abandoned at the client-visible ceiling"
                );
                Error::Timeout(format!(
                    "comparison abandoned after {}s",
                    self.comparison_timeout.as_secs()
                ))
            })?;

        let mut comparison = ComparisonResult::default();
        match rule_result {
            Ok(generated) => comparison.rule_based = Some(generated),
            Err(e) => comparison.rule_based_error = Some(e.to_string()),
        }
        match ai_result {
            Ok(generated) => comparison.ai = Some(generated),
            Err(e) => comparison.ai_error = Some(e.to_string()),
        }

        if comparison.rule_based.is_none() && comparison.ai.is_none() {
            return Err(Error::Generation(format!(
                "both generation strategies failed: {}; {}",
                comparison
                    .rule_based_error
                    .as_deref()
                    .unwrap_or("rule-based failed"),
                comparison.ai_error.as_deref().unwrap_or("ai failed"),
            )));
        }

        info!(
            subsystem = "regen",
            component = "regeneration_service",
            op = "comparison",
            card_id = %card.id,
            strategy = "comparison",
            ai_ok = comparison.ai.is_some(),
            rule_based_ok = comparison.rule_based.is_some(),
            "Comparison ready"
        );
        Ok(RegenerationOutcome::Comparison(comparison))
    }

    /// Apply the user's pick from an earlier comparison. "ai" is only
    /// selectable when that side produced a result.
    async fn apply_selection(
        &self,
        card: &Card,
        owner_id: &str,
        selected: &str,
        comparison: Option<ComparisonResult>,
    ) -> Result<RegenerationOutcome> {
        let comparison = comparison.ok_or_else(|| {
            Error::Validation("comparisonData is required when selectedVersion is set".into())
        })?;

        let (generated, strategy): (GeneratedCard, GeneratedBy) = match selected {
            "ai" => (
                comparison.ai.ok_or_else(|| {
                    Error::Validation("the AI result is not available to apply".into())
                })?,
                GeneratedBy::Ai,
            ),
            "ruleBased" | "rule-based" | "rule_based" => (
                comparison.rule_based.ok_or_else(|| {
                    Error::Validation("the rule-based result is not available to apply".into())
                })?,
                GeneratedBy::RuleBased,
            ),
            other => {
                return Err(Error::Validation(format!(
                    "unknown selectedVersion: {}",
                    other
                )))
            }
        };

        let applied = self
            .cards
            .apply_generated(card.id, owner_id, &generated, strategy, card.version)
            .await?;
        info!(
            subsystem = "regen",
            component = "regeneration_service",
            op = "apply",
            card_id = %card.id,
            strategy = %strategy,
            "Applied selected comparison variant"
        );
        Ok(RegenerationOutcome::Applied(applied))
    }
}
