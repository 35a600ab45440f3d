//! Bounded-concurrency execution of a correction plan.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::curation::CorrectionPlan;
use crate::error::Result;

use super::result::{ApplyError, ApplyReport, ApplyResult};
use super::store::EntityStore;

/// Apply configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Maximum updates in flight.
    pub concurrency: usize,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl ApplyConfig {
    /// Set the number of updates in flight.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Applies a frozen plan to an [`EntityStore`], one update per entity.
///
/// Entities are independent: a failed update is recorded in that
/// entity's result and never stops the others. A store that panics on
/// one entity fails that entity with [`ApplyError::Rejected`]. Once cancellation is
/// signalled, entities not yet dispatched are reported as
/// [`ApplyError::Cancelled`]; updates already in flight run to
/// completion.
pub struct BatchApplier {
    store: Arc<dyn EntityStore>,
    config: ApplyConfig,
    cancel: CancellationToken,
}

impl BatchApplier {
    /// Create an applier with default configuration.
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            config: ApplyConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ApplyConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an externally controlled cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token that cancels not-yet-dispatched updates.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Apply the plan.
    ///
    /// Fails only with [`CuratorError::PlanNotFrozen`](crate::CuratorError::PlanNotFrozen),
    /// before any write. Otherwise returns one result per touched entity,
    /// in plan order, whatever the individual outcomes.
    pub async fn apply(&self, plan: &CorrectionPlan) -> Result<ApplyReport> {
        plan.ensure_frozen()?;

        let started_at = Utc::now();
        let updates = plan.entity_updates();
        let concurrency = self.config.concurrency.max(1);

        info!(entities = updates.len(), concurrency, "Applying correction plan");

        let mut outcomes: Vec<(usize, ApplyResult)> = stream::iter(updates.into_iter().enumerate())
            .map(|(index, update)| {
                let store = Arc::clone(&self.store);
                let cancel = self.cancel.clone();

                async move {
                    // Check cancellation before dispatch
                    if cancel.is_cancelled() {
                        return (index, ApplyResult::failure(update, ApplyError::Cancelled));
                    }

                    debug!(entity = %update.entity, changes = update.changes.len(), "Dispatching update");

                    let outcome = AssertUnwindSafe(store.update_entity(&update))
                        .catch_unwind()
                        .await;
                    let result = match outcome {
                        Ok(Ok(())) => ApplyResult::success(update),
                        Ok(Err(error)) => {
                            warn!(entity = %update.entity, error = %error, "Entity update failed");
                            ApplyResult::failure(update, error)
                        }
                        Err(panic) => {
                            let message = format!("store panicked: {}", panic_message(panic.as_ref()));
                            warn!(entity = %update.entity, error = %message, "Entity update failed");
                            ApplyResult::failure(update, ApplyError::Rejected { message })
                        }
                    };
                    (index, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        let report = ApplyReport {
            results: outcomes.into_iter().map(|(_, result)| result).collect(),
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            "Apply complete"
        );

        Ok(report)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
