// ============================================================================
// Order Business Rule Errors
// ============================================================================

/// A status string outside the closed pending/preparing/completed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// Rejected input. Carries 4xx semantics; the operation was never attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("customer_name must not be empty")]
    EmptyCustomerName,

    #[error("items must not be empty")]
    EmptyItems,

    #[error("total must not be negative")]
    NegativeTotal,

    #[error("status is required")]
    MissingStatus,

    #[error(transparent)]
    InvalidStatus(#[from] UnknownStatus),
}

/// A stored row that cannot be mapped into an `Order`.
///
/// Listing recovers from this per row: the offending row is dropped with a
/// warning and the call still succeeds.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("items are not a JSON array")]
    ItemsNotAnArray,

    #[error("items text is not valid JSON: {0}")]
    ItemsNotJson(#[from] serde_json::Error),

    #[error(transparent)]
    BadStatus(#[from] UnknownStatus),
}
