// ============================================================================
// Order Domain
// ============================================================================
//
// All Order-specific code:
// - Value objects (OrderStatus and its forward-only state machine)
// - Errors (ValidationError, FormatError)
// - Model (Order, NewOrder, OrderRecord and the row-to-order mapping)
//
// ============================================================================

pub mod errors;
pub mod model;
pub mod value_objects;

// Re-export for convenience
pub use errors::*;
pub use model::*;
pub use value_objects::*;
