/// Global constants used across solscope
///
/// This module contains system-wide constants that are not configurable
/// and are used across multiple modules.

// ============================================================================
// SOLANA BLOCKCHAIN CONSTANTS
// ============================================================================

/// Lamports per SOL (10^9)
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Number of decimal places for SOL
pub const SOL_DECIMALS: usize = 9;

/// SPL Token program (owner of classic token accounts)
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Raw ed25519 signature length in bytes
pub const SIGNATURE_BYTES: usize = 64;

/// Base58 text length range of a 64-byte signature. Each leading zero byte
/// encodes as a single `1`, so all-zero bytes give the 64-character minimum.
pub const SIGNATURE_BASE58_MIN_LEN: usize = 64;
pub const SIGNATURE_BASE58_MAX_LEN: usize = 88;

// ============================================================================
// CLUSTER ENDPOINTS
// ============================================================================

pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
pub const TESTNET_RPC_URL: &str = "https://api.testnet.solana.com";
pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const LOCALNET_RPC_URL: &str = "http://127.0.0.1:8899";

// ============================================================================
// PRICE INDEX
// ============================================================================

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Convert lamports to SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Same conversion for fractional lamport values (averages)
pub fn lamports_f64_to_sol(lamports: f64) -> f64 {
    lamports / LAMPORTS_PER_SOL as f64
}
