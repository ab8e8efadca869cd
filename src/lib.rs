// ============================================================================
// Food Orders - order intake, caching, and asynchronous fulfillment
// ============================================================================
//
// Clients submit orders over HTTP, PostgreSQL persists them as the sole
// source of truth, Redis mirrors the full listing under a single key with a
// short TTL, and a background worker advances each order through
// pending -> preparing -> completed.
//
// Layout:
// - domain:     the Order entity, its status state machine, validation
// - store:      durable order storage (PostgreSQL, plus an in-memory fake)
// - cache:      the listing cache (Redis behind a circuit breaker, plus an
//               in-memory fake)
// - repository: read-through / invalidate-on-write mediation between the two
// - engine:     the fulfillment loop that drives status transitions
// - api:        the actix-web gateway
// - health:     dependency liveness reporting
// - metrics:    Prometheus registry shared by repository and engine
// - config:     env-derived runtime configuration
// - utils:      readiness probing, circuit breaker
//
// ============================================================================

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod health;
pub mod metrics;
pub mod repository;
pub mod store;
pub mod utils;
