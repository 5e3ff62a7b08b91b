//! Chunked transaction submission for IBC relaying onto Solana.
//!
//! Large update-client and packet payloads do not fit one transaction.
//! [`Submitter`] uploads them in parallel chunks, bootstraps address lookup
//! tables, and lands the final transaction once everything it references
//! is confirmed.

pub mod advanced;
pub mod basic;
pub mod config;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::advanced::instructions::MisbehaviourAccounts;
pub use crate::basic::inspect::SubmissionStats;
pub use crate::basic::submitter::Submitter;
pub use crate::config::SubmitterConfig;
pub use crate::core::connection::SolConnection;
pub use crate::core::rpc::RpcConnection;
pub use crate::core::signer::DynSigner;
pub use crate::error::{Result, SubmitterError};
pub use crate::types::{
    ConfirmationLevel, LookupTableReceipt, MisbehaviourReceipt, PacketReceipt, PacketTxs, Phase,
    RefundClaim, RelayBatch, RelaySummary, SignatureStatus, Target, TransactionDetails,
    UpdateClient, UpdateClientOutcome,
};
pub use crate::utils::{
    derive_gmp_result_pda, derive_lookup_table_address, derive_misbehaviour_chunk_pda,
    derive_router_state_pda,
};
