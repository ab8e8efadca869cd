use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

use crate::domain::order::OrderStatus;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order intake and status transitions
// - Cache lookups (hit / miss / error) and invalidations
// - Engine tick throughput and duration
//
// All metrics are registered with Prometheus and scraped via /metrics on the
// HTTP gateway.
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Intake Metrics
    pub orders_created: IntCounter,
    pub status_transitions: IntCounterVec,

    // Cache Metrics
    pub cache_lookups: IntCounterVec,
    pub cache_invalidations: IntCounter,

    // Engine Metrics
    pub engine_ticks: IntCounter,
    pub tick_duration: Histogram,
    pub orders_pending: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Intake Metrics
        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new(
                "order_status_transitions_total",
                "Status writes that reached the store, by resulting status",
            ),
            &["status"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        // Cache Metrics
        let cache_lookups = IntCounterVec::new(
            Opts::new("cache_lookups_total", "Listing cache lookups by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(cache_lookups.clone()))?;

        let cache_invalidations = IntCounter::new(
            "cache_invalidations_total",
            "Listing cache entries dropped after writes",
        )?;
        registry.register(Box::new(cache_invalidations.clone()))?;

        // Engine Metrics
        let engine_ticks = IntCounter::new("engine_ticks_total", "Fulfillment engine ticks")?;
        registry.register(Box::new(engine_ticks.clone()))?;

        let tick_duration = Histogram::with_opts(
            HistogramOpts::new("engine_tick_duration_seconds", "Fulfillment tick duration")
                .buckets(vec![0.005, 0.05, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(tick_duration.clone()))?;

        let orders_pending = IntGauge::new(
            "orders_pending",
            "Pending orders seen by the most recent engine tick",
        )?;
        registry.register(Box::new(orders_pending.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_transitions,
            cache_lookups,
            cache_invalidations,
            engine_ticks,
            tick_duration,
            orders_pending,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }

    pub fn record_transition(&self, status: OrderStatus) {
        self.status_transitions
            .with_label_values(&[status.as_str()])
            .inc();
    }

    pub fn record_cache_hit(&self) {
        self.cache_lookups.with_label_values(&["hit"]).inc();
    }

    pub fn record_cache_miss(&self) {
        self.cache_lookups.with_label_values(&["miss"]).inc();
    }

    pub fn record_cache_error(&self) {
        self.cache_lookups.with_label_values(&["error"]).inc();
    }

    pub fn record_invalidation(&self) {
        self.cache_invalidations.inc();
    }

    /// Record one completed tick and how long it took
    pub fn record_tick(&self, duration_secs: f64) {
        self.engine_ticks.inc();
        self.tick_duration.observe(duration_secs);
    }

    pub fn set_pending_orders(&self, count: i64) {
        self.orders_pending.set(count);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
