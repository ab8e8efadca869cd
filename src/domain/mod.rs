// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain entities and the rules that govern them, independent of storage,
// caching, and HTTP concerns. The order is the only entity in this system.
//
// ============================================================================

pub mod order;
