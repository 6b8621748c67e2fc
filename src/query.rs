/// On-demand lookups triggered by the user
///
/// Input is validated before anything is dispatched. Every resolved lookup
/// overwrites the result slot for its kind. Lookups of the same kind may run
/// concurrently; whichever resolves last is what the slot shows.
use crate::aggregator::store::ViewModelStore;
use crate::aggregator::types::{QueryOutcome, QuerySlot, QueryValue};
use crate::errors::{FetchError, QueryError};
use crate::logger::{self, LogTag};
use crate::sources::transaction::validate_signature;
use crate::sources::LookupSource;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct QueryHandler {
    lookups: Arc<HashMap<QuerySlot, Arc<dyn LookupSource>>>,
    store: ViewModelStore,
}

/// Reject input that can never succeed; returns the trimmed input
pub fn validate_input(kind: QuerySlot, input: &str) -> Result<String, QueryError> {
    let trimmed = input.trim();

    match kind {
        QuerySlot::Transaction => {
            if trimmed.is_empty() {
                return Err(QueryError::Validation("Transaction ID is required".to_string()));
            }
            validate_signature(trimmed).map_err(|e| match e {
                FetchError::Validation(message) => QueryError::Validation(message),
                other => QueryError::Validation(other.to_string()),
            })?;
        }
        QuerySlot::Wallet | QuerySlot::WalletHistory => {
            if trimmed.is_empty() {
                return Err(QueryError::Validation("Wallet address is required".to_string()));
            }
        }
    }

    Ok(trimmed.to_string())
}

impl QueryHandler {
    pub fn new(lookups: Vec<Arc<dyn LookupSource>>, store: ViewModelStore) -> Self {
        let lookups = lookups
            .into_iter()
            .map(|lookup| (lookup.kind(), lookup))
            .collect();

        Self {
            lookups: Arc::new(lookups),
            store,
        }
    }

    /// Run one lookup and store its outcome in the matching slot.
    /// Validation failures leave the slot untouched.
    pub async fn execute(&self, kind: QuerySlot, input: &str) -> Result<QueryValue, QueryError> {
        let input = validate_input(kind, input)?;

        let lookup = self
            .lookups
            .get(&kind)
            .cloned()
            .ok_or_else(|| QueryError::lookup(kind, "no lookup source configured"))?;

        logger::debug(LogTag::Query, &format!("{} lookup for {}", kind, input));

        match lookup.lookup(&input).await {
            Ok(value) => {
                self.store.set_query_result(
                    kind,
                    QueryOutcome::Found {
                        value: value.clone(),
                    },
                );
                Ok(value)
            }
            Err(FetchError::Validation(message)) => {
                logger::debug(LogTag::Query, &format!("{} rejected: {}", kind, message));
                Err(QueryError::Validation(message))
            }
            Err(FetchError::NotFound(_)) => {
                logger::info(LogTag::Query, &format!("{} not found: {}", kind, input));
                self.store
                    .set_query_result(kind, QueryOutcome::NotFound { input: input.clone() });
                Err(QueryError::NotFound(input))
            }
            Err(err) => {
                let error = QueryError::from_fetch(kind, err);
                logger::warning(
                    LogTag::Query,
                    &format!("{}: {}", error, error.reason()),
                );
                self.store.set_query_result(
                    kind,
                    QueryOutcome::Failed {
                        message: error.to_string(),
                        reason: error.reason().to_string(),
                    },
                );
                Err(error)
            }
        }
    }
}
