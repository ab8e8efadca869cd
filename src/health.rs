use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::ListingCache;
use crate::store::OrderStore;

// ============================================================================
// Health Checks - dependency probes for liveness reporting
// ============================================================================
//
// The store is load-bearing: without it no request can be served, so a
// failed database probe marks the service unhealthy. The cache is purely an
// accelerator, so a failed cache probe only degrades the service. Reads keep
// working off the database.
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    /// Whether the service can still answer requests in this state.
    pub fn is_serving(&self) -> bool {
        !matches!(self, HealthState::Unhealthy)
    }
}

/// Snapshot of the service and its dependencies at probe time.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub service: String,
    pub database: String,
    pub redis: String,
    pub timestamp: DateTime<Utc>,
}

/// Probe both dependencies and fold the results into one report.
pub async fn check_dependencies(
    service: &str,
    store: &dyn OrderStore,
    cache: &dyn ListingCache,
) -> HealthReport {
    let database = store.ping().await;
    let redis = cache.ping().await;

    let status = match (&database, &redis) {
        (Ok(()), Ok(())) => HealthState::Healthy,
        (Ok(()), Err(_)) => HealthState::Degraded,
        (Err(_), _) => HealthState::Unhealthy,
    };

    HealthReport {
        status,
        service: service.to_string(),
        database: describe(database),
        redis: describe(redis),
        timestamp: Utc::now(),
    }
}

fn describe<E: std::fmt::Display>(result: Result<(), E>) -> String {
    match result {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {e}"),
    }
}
