use std::sync::Arc;
use std::time::Instant;

use tokio::time::sleep;

use crate::config::EngineConfig;
use crate::domain::order::OrderStatus;
use crate::metrics::Metrics;
use crate::repository::{OrderRepository, RepositoryError};

// ============================================================================
// Lifecycle Engine - background order fulfillment
// ============================================================================
//
// Polls the store on a fixed interval and walks each picked-up order through
// pending -> preparing -> completed, pausing between transitions to model
// real work. Transitions are compare-and-set, so several workers can run the
// same loop without double-processing an order: whoever loses the race just
// skips ahead.
//
// Orders found already in preparing were abandoned by an earlier run that
// died mid-tick. They are resumed before any new pending work is started.
// ============================================================================

pub struct LifecycleEngine {
    repository: Arc<OrderRepository>,
    config: EngineConfig,
    metrics: Arc<Metrics>,
}

impl LifecycleEngine {
    pub fn new(
        repository: Arc<OrderRepository>,
        config: EngineConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repository,
            config,
            metrics,
        }
    }

    /// Run ticks forever, sleeping `idle_interval` between them.
    pub async fn run(&self) {
        tracing::info!(
            batch_size = self.config.batch_size,
            idle_seconds = self.config.idle_interval.as_secs(),
            "Background worker started"
        );
        loop {
            self.tick().await;
            sleep(self.config.idle_interval).await;
        }
    }

    /// One polling pass. A store failure abandons the rest of the tick;
    /// whatever already committed stays committed and the next tick picks
    /// the remainder back up.
    pub async fn tick(&self) {
        let started = Instant::now();
        if let Err(e) = self.process_orders().await {
            tracing::error!(error = %e, "Error processing orders, abandoning tick");
        }
        self.metrics.record_tick(started.elapsed().as_secs_f64());
    }

    async fn process_orders(&self) -> Result<(), RepositoryError> {
        let stale = self
            .repository
            .preparing_batch(self.config.batch_size)
            .await?;
        for order_id in stale {
            tracing::warn!(order_id, "Resuming order left in preparing");
            self.cook_and_complete(order_id).await?;
        }

        let pending = self.repository.pending_batch(self.config.batch_size).await?;
        self.metrics.set_pending_orders(pending.len() as i64);
        if pending.is_empty() {
            tracing::debug!("No pending orders");
            return Ok(());
        }

        tracing::info!(count = pending.len(), "Picked up pending orders");
        for order_id in pending {
            self.fulfill(order_id).await?;
        }
        Ok(())
    }

    /// Take one pending order through its full lifecycle.
    async fn fulfill(&self, order_id: i64) -> Result<(), RepositoryError> {
        tracing::info!(order_id, "Processing order");
        sleep(self.config.processing_delay).await;

        let claimed = self
            .repository
            .advance_status(order_id, OrderStatus::Pending, OrderStatus::Preparing)
            .await?;
        if !claimed {
            tracing::debug!(order_id, "Order already picked up elsewhere, skipping");
            return Ok(());
        }
        tracing::info!(order_id, "Order moved to preparing");

        self.cook_and_complete(order_id).await
    }

    async fn cook_and_complete(&self, order_id: i64) -> Result<(), RepositoryError> {
        sleep(self.config.cooking_delay).await;

        let completed = self
            .repository
            .advance_status(order_id, OrderStatus::Preparing, OrderStatus::Completed)
            .await?;
        if completed {
            self.repository.invalidate_listing().await;
            tracing::info!(order_id, "✅ Order completed");
        } else {
            tracing::debug!(order_id, "Order no longer preparing, skipping completion");
        }
        Ok(())
    }
}
