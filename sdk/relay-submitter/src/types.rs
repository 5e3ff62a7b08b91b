use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::fmt;
use std::time::Duration;

/// How far a transaction (or a state read) has progressed through consensus.
///
/// Ordered by the numeric level, so a finalized transaction satisfies a
/// request for `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ConfirmationLevel {
    Processed = 1,
    Confirmed = 2,
    Finalized = 3,
}

impl ConfirmationLevel {
    pub fn level(self) -> u8 {
        self as u8
    }

    /// True when a transaction at `self` meets a wait for `target`.
    pub fn satisfies(self, target: ConfirmationLevel) -> bool {
        self.level() >= target.level()
    }

    pub fn commitment(self) -> CommitmentConfig {
        match self {
            ConfirmationLevel::Processed => CommitmentConfig::processed(),
            ConfirmationLevel::Confirmed => CommitmentConfig::confirmed(),
            ConfirmationLevel::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl std::str::FromStr for ConfirmationLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(ConfirmationLevel::Processed),
            "confirmed" => Ok(ConfirmationLevel::Confirmed),
            "finalized" => Ok(ConfirmationLevel::Finalized),
            other => Err(format!("unknown confirmation level '{}'", other)),
        }
    }
}

/// One entry of a `getSignatureStatuses` response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    pub slot: u64,
    /// `None` when the node does not report a level yet
    pub confirmation_status: Option<ConfirmationLevel>,
    /// On-chain execution error, if the transaction failed
    pub err: Option<String>,
}

/// Execution metadata of a landed transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionDetails {
    pub slot: u64,
    pub fee: u64,
    pub compute_units_consumed: Option<u64>,
    pub log_messages: Vec<String>,
    /// Decoded return data of the last instruction that set it
    pub return_data: Option<Vec<u8>>,
    pub err: Option<String>,
}

/// Result byte written by the light client's update and misbehaviour handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UpdateClientOutcome {
    Update = 0,
    NoOp = 1,
    /// The client was frozen
    Misbehaviour = 2,
}

impl TryFrom<u8> for UpdateClientOutcome {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(UpdateClientOutcome::Update),
            1 => Ok(UpdateClientOutcome::NoOp),
            2 => Ok(UpdateClientOutcome::Misbehaviour),
            other => Err(other),
        }
    }
}

/// What a relay stage was working on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    UpdateClient,
    Packet(usize),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::UpdateClient => write!(f, "update client"),
            Target::Packet(index) => write!(f, "packet {}", index),
        }
    }
}

/// Stage of a submission, used to give failures context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ChunkUpload { target: Target, chunk: usize },
    LookupTable { target: Target },
    Final { target: Target },
    RefundClaim { packet: usize },
    MisbehaviourChunk { chunk: usize },
    MisbehaviourAssembly,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::ChunkUpload { target, chunk } => write!(f, "{} chunk {} upload", target, chunk),
            Phase::LookupTable { target } => write!(f, "{} lookup table setup", target),
            Phase::Final { target } => write!(f, "{} final transaction", target),
            Phase::RefundClaim { packet } => write!(f, "packet {} refund claim", packet),
            Phase::MisbehaviourChunk { chunk } => write!(f, "misbehaviour chunk {} upload", chunk),
            Phase::MisbehaviourAssembly => write!(f, "misbehaviour assembly"),
        }
    }
}

/// Everything needed to land one relayed packet.
///
/// Each chunk entry is the instruction list of one upload transaction.
/// A non-empty `lookup_table_accounts` makes the submitter bootstrap a
/// lookup table and compile `final_instructions` as a v0 message against it.
#[derive(Debug, Clone, Default)]
pub struct PacketTxs {
    pub chunks: Vec<Vec<Instruction>>,
    pub lookup_table_accounts: Vec<Pubkey>,
    pub final_instructions: Vec<Instruction>,
    pub cleanup_instructions: Option<Vec<Instruction>>,
    pub refund_claim_instructions: Option<Vec<Instruction>>,
}

impl PacketTxs {
    pub fn has_lookup_table(&self) -> bool {
        !self.lookup_table_accounts.is_empty()
    }
}

/// Client update that has to land before any packet
#[derive(Debug, Clone)]
pub enum UpdateClient {
    /// Header uploaded in chunks, then assembled
    Chunked(PacketTxs),
    /// Single transaction carrying an attestation
    Attestation(Vec<Instruction>),
}

/// A relayer response: optional client update plus independent packets
#[derive(Debug, Clone, Default)]
pub struct RelayBatch {
    pub update_client: Option<UpdateClient>,
    pub packets: Vec<PacketTxs>,
}

/// Outcome of one packet's pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketReceipt {
    pub packet: usize,
    pub final_signature: Signature,
    pub chunks_uploaded: usize,
    pub lookup_table: Option<Pubkey>,
    /// Time spent blocked on the lookup table after chunks were done
    pub lookup_table_wait: Option<Duration>,
}

/// Refund claim result; failures are logged and recorded, not propagated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundClaim {
    pub packet: usize,
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, Default)]
pub struct RelaySummary {
    pub update_client: Option<Signature>,
    pub packets: Vec<PacketReceipt>,
    pub refund_claims: Vec<RefundClaim>,
    /// Final signature of the packet that completed last
    pub last_signature: Option<Signature>,
}

/// A lookup table that is created, extended and resolvable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTableReceipt {
    pub address: Pubkey,
    pub creation_slot: u64,
    pub addresses: Vec<Pubkey>,
    pub create_signature: Signature,
    pub extend_signatures: Vec<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisbehaviourReceipt {
    pub signature: Signature,
    pub chunk_accounts: Vec<Pubkey>,
    pub outcome: UpdateClientOutcome,
}
