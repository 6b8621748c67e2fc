use super::{LookupSource, SolanaRpc};
use crate::aggregator::types::{QuerySlot, QueryValue, TransactionDetails};
use crate::constants::{SIGNATURE_BASE58_MAX_LEN, SIGNATURE_BASE58_MIN_LEN, SIGNATURE_BYTES};
use crate::errors::FetchError;
use async_trait::async_trait;
use serde_json::{json, Value};
use solana_client::rpc_request::RpcRequest;

const SOURCE_NAME: &str = "transaction_lookup";

/// Check that input looks like a base58 transaction signature.
/// Runs before any network call.
pub fn validate_signature(input: &str) -> Result<(), FetchError> {
    let len = input.len();
    if !(SIGNATURE_BASE58_MIN_LEN..=SIGNATURE_BASE58_MAX_LEN).contains(&len) {
        return Err(FetchError::validation(format!(
            "Transaction ID must be {}-{} base58 characters, got {}",
            SIGNATURE_BASE58_MIN_LEN, SIGNATURE_BASE58_MAX_LEN, len
        )));
    }

    let bytes = bs58::decode(input)
        .into_vec()
        .map_err(|e| FetchError::validation(format!("Transaction ID is not base58: {}", e)))?;

    if bytes.len() != SIGNATURE_BYTES {
        return Err(FetchError::validation(format!(
            "Transaction ID decodes to {} bytes, expected {}",
            bytes.len(),
            SIGNATURE_BYTES
        )));
    }

    Ok(())
}

/// Raw `getTransaction` result in jsonParsed encoding; `None` when the
/// cluster does not know the signature
pub async fn fetch_transaction_json(
    rpc: &SolanaRpc,
    signature: &str,
) -> Result<Option<Value>, FetchError> {
    let params = json!([
        signature,
        {
            "encoding": "jsonParsed",
            "commitment": rpc.read_commitment().commitment,
            "maxSupportedTransactionVersion": 0
        }
    ]);

    rpc.client()
        .send::<Option<Value>>(RpcRequest::GetTransaction, params)
        .await
        .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))
}

pub fn parse_transaction_details(signature: &str, tx: &Value) -> Result<TransactionDetails, FetchError> {
    let slot = tx
        .get("slot")
        .and_then(Value::as_u64)
        .ok_or_else(|| FetchError::unavailable(SOURCE_NAME, "transaction has no slot"))?;
    let meta = tx.get("meta").filter(|meta| !meta.is_null());

    Ok(TransactionDetails {
        signature: signature.to_string(),
        slot,
        block_time: tx.get("blockTime").and_then(Value::as_i64),
        fee_lamports: meta
            .and_then(|meta| meta.get("fee"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        succeeded: meta
            .map(|meta| meta.get("err").map_or(true, Value::is_null))
            .unwrap_or(true),
    })
}

/// Look up one transaction by signature
pub struct TransactionLookup {
    rpc: SolanaRpc,
}

impl TransactionLookup {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl LookupSource for TransactionLookup {
    fn kind(&self) -> QuerySlot {
        QuerySlot::Transaction
    }

    async fn lookup(&self, input: &str) -> Result<QueryValue, FetchError> {
        validate_signature(input)?;

        match fetch_transaction_json(&self.rpc, input).await? {
            Some(tx) => Ok(QueryValue::Transaction(parse_transaction_details(input, &tx)?)),
            None => Err(FetchError::not_found(input)),
        }
    }
}
