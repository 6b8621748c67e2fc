use super::transaction::fetch_transaction_json;
use super::{LookupSource, SolanaRpc};
use crate::aggregator::types::{QuerySlot, QueryValue, TokenBalance, WalletInfo, WalletTransaction};
use crate::constants::{lamports_to_sol, SPL_TOKEN_PROGRAM_ID};
use crate::errors::FetchError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde_json::Value;
use solana_account_decoder::UiAccountData;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

const SOURCE_NAME: &str = "wallet_lookup";

pub fn parse_address(input: &str) -> Result<Pubkey, FetchError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FetchError::validation("Wallet address is required"));
    }
    Pubkey::from_str(trimmed)
        .map_err(|e| FetchError::validation(format!("Invalid wallet address '{}': {}", trimmed, e)))
}

/// Balance of one jsonParsed SPL token account (`parsed.info`)
pub fn parse_token_account(parsed: &Value) -> Option<TokenBalance> {
    let info = parsed.get("info")?;
    let mint = info.get("mint")?.as_str()?.to_string();
    let amount = info.get("tokenAmount")?;

    let decimals = amount.get("decimals").and_then(Value::as_u64).unwrap_or(0) as u8;
    let balance = amount
        .get("uiAmount")
        .and_then(Value::as_f64)
        .or_else(|| {
            amount
                .get("uiAmountString")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    Some(TokenBalance {
        mint,
        balance,
        decimals,
    })
}

/// SOL balance and SPL token holdings of one address
pub struct WalletLookup {
    rpc: SolanaRpc,
}

impl WalletLookup {
    pub fn new(rpc: SolanaRpc) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl LookupSource for WalletLookup {
    fn kind(&self) -> QuerySlot {
        QuerySlot::Wallet
    }

    async fn lookup(&self, input: &str) -> Result<QueryValue, FetchError> {
        let owner = parse_address(input)?;
        let client = self.rpc.client();

        let lamports = client
            .get_balance(&owner)
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;

        let program_id = Pubkey::from_str(SPL_TOKEN_PROGRAM_ID)
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;
        let accounts = client
            .get_token_accounts_by_owner(&owner, TokenAccountsFilter::ProgramId(program_id))
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;

        let tokens = accounts
            .into_iter()
            .filter_map(|keyed| match keyed.account.data {
                UiAccountData::Json(parsed) => parse_token_account(&parsed.parsed),
                _ => None,
            })
            .collect();

        Ok(QueryValue::Wallet(WalletInfo {
            address: owner.to_string(),
            sol_balance: lamports_to_sol(lamports),
            tokens,
        }))
    }
}

// =============================================================================
// TRANSACTION HISTORY
// =============================================================================

/// One history row from a signature entry and its jsonParsed transaction
pub fn build_wallet_transaction(
    signature: &str,
    slot: u64,
    block_time: Option<i64>,
    failed: bool,
    tx: &Value,
) -> WalletTransaction {
    let fee = tx
        .pointer("/meta/fee")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let instructions = tx
        .pointer("/transaction/message/instructions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    WalletTransaction {
        signature: signature.to_string(),
        slot,
        block_time,
        fee,
        status: if failed { "Failed" } else { "Success" }.to_string(),
        instructions,
    }
}

/// Most recent transactions touching an address
pub struct WalletHistoryLookup {
    rpc: SolanaRpc,
    limit: usize,
}

impl WalletHistoryLookup {
    pub fn new(rpc: SolanaRpc, limit: usize) -> Self {
        Self {
            rpc,
            limit: limit.max(1),
        }
    }
}

#[async_trait]
impl LookupSource for WalletHistoryLookup {
    fn kind(&self) -> QuerySlot {
        QuerySlot::WalletHistory
    }

    async fn lookup(&self, input: &str) -> Result<QueryValue, FetchError> {
        let address = parse_address(input)?;

        let config = GetConfirmedSignaturesForAddress2Config {
            limit: Some(self.limit),
            commitment: Some(self.rpc.read_commitment()),
            ..Default::default()
        };
        let signatures = self
            .rpc
            .client()
            .get_signatures_for_address_with_config(&address, config)
            .await
            .map_err(|e| FetchError::unavailable(SOURCE_NAME, e))?;

        let mut history = Vec::with_capacity(signatures.len());
        for entry in signatures {
            match fetch_transaction_json(&self.rpc, &entry.signature).await {
                Ok(Some(tx)) => history.push(build_wallet_transaction(
                    &entry.signature,
                    entry.slot,
                    entry.block_time,
                    entry.err.is_some(),
                    &tx,
                )),
                Ok(None) => logger::debug(
                    LogTag::Query,
                    &format!("Skipping {}: transaction not yet available", entry.signature),
                ),
                Err(e) => logger::warning(
                    LogTag::Query,
                    &format!("Skipping {}: {}", entry.signature, e),
                ),
            }
        }

        Ok(QueryValue::WalletHistory(history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_address_validation() {
        assert!(matches!(parse_address(""), Err(FetchError::Validation(_))));
        assert!(matches!(parse_address("   "), Err(FetchError::Validation(_))));
        assert!(matches!(
            parse_address("not-a-key"),
            Err(FetchError::Validation(_))
        ));
        assert!(parse_address("11111111111111111111111111111111").is_ok());
    }

    #[test]
    fn test_parse_token_account() {
        let parsed = json!({
            "info": {
                "mint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                "owner": "11111111111111111111111111111111",
                "tokenAmount": {
                    "amount": "1500000",
                    "decimals": 6,
                    "uiAmount": 1.5,
                    "uiAmountString": "1.5"
                }
            },
            "type": "account"
        });

        let token = parse_token_account(&parsed).unwrap();
        assert_eq!(token.mint, "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
        assert_eq!(token.balance, 1.5);
        assert_eq!(token.decimals, 6);
    }

    #[test]
    fn test_token_amount_falls_back_to_string() {
        let parsed = json!({
            "info": {
                "mint": "Mint111",
                "tokenAmount": { "decimals": 9, "uiAmount": null, "uiAmountString": "0.25" }
            }
        });
        assert_eq!(parse_token_account(&parsed).unwrap().balance, 0.25);
        assert!(parse_token_account(&json!({ "info": {} })).is_none());
    }

    #[test]
    fn test_history_row() {
        let tx = json!({
            "meta": { "fee": 5000 },
            "transaction": {
                "message": {
                    "instructions": [
                        { "program": "system", "parsed": { "type": "transfer" } }
                    ]
                }
            }
        });

        let row = build_wallet_transaction("sig1", 42, Some(1_700_000_000), false, &tx);
        assert_eq!(row.fee, 5000);
        assert_eq!(row.status, "Success");
        assert_eq!(row.instructions.len(), 1);
        assert_eq!(row.instructions[0]["parsed"]["type"], "transfer");

        let failed = build_wallet_transaction("sig2", 43, None, true, &json!({}));
        assert_eq!(failed.status, "Failed");
        assert_eq!(failed.fee, 0);
        assert!(failed.instructions.is_empty());
    }
}
