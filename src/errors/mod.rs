/// Structured error types for data sources and on-demand lookups
///
/// Adapters never let transport errors escape: everything that crosses an adapter
/// boundary is a `FetchError`. Query failures are reshaped into `QueryError` so they
/// can be shown inline next to the query that produced them.
use crate::aggregator::types::QuerySlot;
use thiserror::Error;

// =============================================================================
// FETCH ERRORS (adapter boundary)
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Malformed input caught before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport, RPC or timeout failure
    #[error("{source_name} unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    /// Valid request, no matching data
    #[error("Not found: {0}")]
    NotFound(String),
}

impl FetchError {
    pub fn validation(message: impl Into<String>) -> Self {
        FetchError::Validation(message.into())
    }

    /// Wrap any displayable transport error
    pub fn unavailable(source_name: &str, err: impl std::fmt::Display) -> Self {
        FetchError::SourceUnavailable {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }

    pub fn timeout(source_name: &str, timeout_ms: u64) -> Self {
        FetchError::SourceUnavailable {
            source_name: source_name.to_string(),
            message: format!("timed out after {}ms", timeout_ms),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        FetchError::NotFound(what.into())
    }

    /// Only transport failures are worth another attempt on the next tick
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::SourceUnavailable { .. })
    }
}

// =============================================================================
// QUERY ERRORS (on-demand lookups)
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Display is the message shown next to the query slot
    #[error("{}", .slot.failure_message())]
    Lookup { slot: QuerySlot, reason: String },
}

impl QueryError {
    pub fn lookup(slot: QuerySlot, reason: impl Into<String>) -> Self {
        QueryError::Lookup {
            slot,
            reason: reason.into(),
        }
    }

    /// Underlying cause, for logs
    pub fn reason(&self) -> &str {
        match self {
            QueryError::Validation(message) | QueryError::NotFound(message) => message,
            QueryError::Lookup { reason, .. } => reason,
        }
    }

    pub fn from_fetch(slot: QuerySlot, err: FetchError) -> Self {
        match err {
            FetchError::Validation(message) => QueryError::Validation(message),
            FetchError::NotFound(input) => QueryError::NotFound(input),
            other => QueryError::lookup(slot, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(FetchError::unavailable("rpc", "connection refused").is_retryable());
        assert!(FetchError::timeout("rpc", 500).is_retryable());
        assert!(!FetchError::validation("bad input").is_retryable());
        assert!(!FetchError::not_found("tx").is_retryable());
    }

    #[test]
    fn test_timeout_message() {
        let err = FetchError::timeout("sol_price", 10_000);
        assert_eq!(err.to_string(), "sol_price unavailable: timed out after 10000ms");
    }

    #[test]
    fn test_lookup_error_shows_user_facing_message() {
        let err = QueryError::from_fetch(
            QuerySlot::Wallet,
            FetchError::unavailable("rpc", "502 Bad Gateway"),
        );
        assert_eq!(err.to_string(), "Failed to fetch wallet data");
        assert!(err.reason().contains("502"));
    }

    #[test]
    fn test_validation_survives_conversion() {
        let err = QueryError::from_fetch(
            QuerySlot::Transaction,
            FetchError::validation("signature must be base58"),
        );
        assert_eq!(
            err,
            QueryError::Validation("signature must be base58".to_string())
        );
    }
}
