use crate::types::{ConfirmationLevel, Phase};
use solana_sdk::signature::Signature;
use std::time::Duration;
use thiserror::Error;

/// Error types for chunked relay submission
#[derive(Debug, Error)]
pub enum SubmitterError {
    /// Connection or RPC error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Broadcast was requested without any signer
    #[error("No signers provided")]
    NoSigners,

    /// Lookup table bootstrap was requested with no accounts
    #[error("Lookup table requires at least one account")]
    EmptyLookupTable,

    /// Nothing to split into chunks
    #[error("Payload is empty")]
    EmptyPayload,

    /// Chunk indices are a single byte on-chain
    #[error("Payload needs {chunks} chunks, at most 255 are addressable")]
    TooManyChunks { chunks: usize },

    /// Transaction landed but the runtime reported an error for it
    #[error("Transaction {signature} failed on-chain: {reason}")]
    TransactionFailed { signature: Signature, reason: String },

    /// Signature never reached the requested level within the polling window
    #[error("Transaction {signature} did not reach {level:?} within {waited:?}")]
    StatusTimeout {
        signature: Signature,
        level: ConfirmationLevel,
        waited: Duration,
    },

    /// The chain never moved past the given slot
    #[error("Slot did not advance past {slot} within {waited:?}")]
    SlotWaitTimeout { slot: u64, waited: Duration },

    /// Broadcast loop ran out of time; carries the last attempt's failure
    #[error("Gave up after {elapsed:?}: {source}")]
    RetriesExhausted {
        elapsed: Duration,
        #[source]
        source: Box<SubmitterError>,
    },

    /// v0 message compilation against a lookup table failed
    #[error("Message compile error: {0}")]
    Compile(String),

    /// A signer refused to sign
    #[error("Signing error: {0}")]
    Signing(String),

    /// Transaction metadata never became available
    #[error("Transaction {0} not found")]
    TransactionNotFound(Signature),

    /// Transaction did not expose return data
    #[error("Transaction {0} returned no data")]
    MissingReturnData(Signature),

    /// Return data did not decode into an update outcome
    #[error("Invalid update outcome byte: {0}")]
    InvalidReturnData(u8),

    /// Only packets earn refunds; a chunked client update cannot claim one
    #[error("Chunked client update carries a refund claim")]
    UpdateClientRefundClaim,

    /// A plain client update froze the client
    #[error("Client update {0} unexpectedly reported misbehaviour")]
    UnexpectedMisbehaviour(Signature),

    /// Read-after-write check on a funded account failed
    #[error("Balance mismatch: expected {expected}, found {actual}")]
    BalanceMismatch { expected: u64, actual: u64 },

    /// Faucet cannot cover the requested amount
    #[error("Faucet holds {available} lamports, {requested} requested")]
    InsufficientFunds { available: u64, requested: u64 },

    /// Funding a fresh account below the rent-exempt minimum
    #[error("{lamports} lamports is below the rent-exempt minimum of {minimum}")]
    BelowRentExemption { lamports: u64, minimum: u64 },

    /// A spawned task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// Borsh serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] std::io::Error),

    /// Failure inside a named stage of a relay or misbehaviour submission
    #[error("{phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<SubmitterError>,
    },
}

impl SubmitterError {
    pub fn in_phase(self, phase: Phase) -> Self {
        SubmitterError::Phase {
            phase,
            source: Box::new(self),
        }
    }

    /// Strip phase and retry wrappers down to the underlying cause.
    pub fn root_cause(&self) -> &SubmitterError {
        match self {
            SubmitterError::Phase { source, .. }
            | SubmitterError::RetriesExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<tokio::task::JoinError> for SubmitterError {
    fn from(err: tokio::task::JoinError) -> Self {
        SubmitterError::Task(err.to_string())
    }
}

/// Result type alias for submitter operations
pub type Result<T> = std::result::Result<T, SubmitterError>;
