use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

/// Largest payload slice carried by one upload transaction
pub const CHUNK_SIZE: usize = 900;

/// Chunk indices are encoded as a single byte
pub const MAX_CHUNKS: usize = u8::MAX as usize;

pub const COMPUTE_BUDGET_PROGRAM_ID: Pubkey =
    pubkey!("ComputeBudget111111111111111111111111111111");
pub const ADDRESS_LOOKUP_TABLE_PROGRAM_ID: Pubkey =
    pubkey!("AddressLookupTab1e1111111111111111111111111");

/// `SetComputeUnitLimit` tag in the compute budget program
pub const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;

pub const CREATE_LOOKUP_TABLE_TAG: u32 = 0;
pub const EXTEND_LOOKUP_TABLE_TAG: u32 = 2;

/// Addresses appended per extend instruction; keeps the transaction under the size cap
pub const MAX_EXTEND_ADDRESSES: usize = 20;

/// Compute ceiling for a single transaction
pub const MAX_COMPUTE_UNITS: u32 = 1_400_000;

pub const ROUTER_STATE_SEED: &[u8] = b"router_state";
pub const GMP_RESULT_SEED: &[u8] = b"gmp_result";
pub const MISBEHAVIOUR_CHUNK_SEED: &[u8] = b"misbehaviour_chunk";

pub const DEFAULT_TX_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STATUS_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SLOT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_SLOT_WAIT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
