#![allow(dead_code)]

use async_trait::async_trait;
use ibc_solana_submitter::core::connection::ConnectionError;
use ibc_solana_submitter::core::constants::ADDRESS_LOOKUP_TABLE_PROGRAM_ID;
use ibc_solana_submitter::{
    ConfirmationLevel, SignatureStatus, SolConnection, Submitter, SubmitterConfig,
    TransactionDetails,
};
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::system_program;
use solana_sdk::transaction::VersionedTransaction;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

pub const RENT_EXEMPT_MINIMUM: u64 = 890_880;
pub const FEE: u64 = 5_000;
pub const COMPUTE_UNITS: u64 = 1_200;

/// What happens to a transaction the chain receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Land,
    /// `sendTransaction` itself errors
    Reject,
    /// Lands with an execution error
    FailOnChain,
    /// Accepted, then never seen again
    Drop,
}

type Matcher = Box<dyn Fn(&VersionedTransaction) -> bool + Send + Sync>;

struct Rule {
    matches: Matcher,
    outcome: Outcome,
    remaining: Option<usize>,
}

/// Instruction of a sent transaction with its account indices resolved.
/// Accounts loaded through a lookup table show up as `Pubkey::default()`.
#[derive(Debug, Clone)]
pub struct SentInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<Pubkey>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SentTx {
    pub signature: Signature,
    pub blockhash: Hash,
    pub outcome: Outcome,
    pub versioned: bool,
    pub lookup_tables: Vec<Pubkey>,
    pub instructions: Vec<SentInstruction>,
}

impl SentTx {
    pub fn invokes(&self, program_id: &Pubkey) -> bool {
        self.instructions.iter().any(|ix| ix.program_id == *program_id)
    }

    pub fn landed(&self) -> bool {
        self.outcome == Outcome::Land
    }
}

struct ChainState {
    slot: u64,
    slot_step: u64,
    scripted_slots: VecDeque<u64>,
    landing_level: ConfirmationLevel,
    rules: Vec<Rule>,
    return_data: HashMap<Pubkey, Vec<u8>>,
    balances: HashMap<Pubkey, u64>,
    lookup_tables: HashSet<Pubkey>,
    credit_on_landing: u64,
    statuses: HashMap<Signature, SignatureStatus>,
    details: HashMap<Signature, TransactionDetails>,
    sent: Vec<SentTx>,
    send_attempts: usize,
    status_queries: usize,
    slot_queries: usize,
}

/// In-memory chain behind the [`SolConnection`] seam.
///
/// Every landed transaction is immediately visible at the landing level.
/// Failures are scripted per transaction through [`MockChain::on`].
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                slot: 100,
                slot_step: 1,
                scripted_slots: VecDeque::new(),
                landing_level: ConfirmationLevel::Confirmed,
                rules: Vec::new(),
                return_data: HashMap::new(),
                balances: HashMap::new(),
                lookup_tables: HashSet::new(),
                credit_on_landing: 0,
                statuses: HashMap::new(),
                details: HashMap::new(),
                sent: Vec::new(),
                send_attempts: 0,
                status_queries: 0,
                slot_queries: 0,
            }),
        }
    }

    pub fn with_landing_level(self, level: ConfirmationLevel) -> Self {
        self.state.lock().unwrap().landing_level = level;
        self
    }

    /// How far the slot moves on every `getSlot`; zero freezes the chain.
    pub fn with_slot_step(self, step: u64) -> Self {
        self.state.lock().unwrap().slot_step = step;
        self
    }

    /// Answer the next `getSlot` calls with `slots`, then keep stepping from the last one.
    pub fn script_slots(&self, slots: impl IntoIterator<Item = u64>) {
        self.state.lock().unwrap().scripted_slots.extend(slots);
    }

    /// Apply `outcome` to matching transactions, `times` times or forever.
    pub fn on(
        &self,
        matches: impl Fn(&VersionedTransaction) -> bool + Send + Sync + 'static,
        outcome: Outcome,
        times: Option<usize>,
    ) {
        self.state.lock().unwrap().rules.push(Rule {
            matches: Box::new(matches),
            outcome,
            remaining: times,
        });
    }

    pub fn set_return_data(&self, program_id: Pubkey, data: Vec<u8>) {
        self.state.lock().unwrap().return_data.insert(program_id, data);
    }

    pub fn set_balance(&self, pubkey: Pubkey, lamports: u64) {
        self.state.lock().unwrap().balances.insert(pubkey, lamports);
    }

    pub fn balance(&self, pubkey: &Pubkey) -> u64 {
        self.state.lock().unwrap().balances.get(pubkey).copied().unwrap_or_default()
    }

    /// Extra lamports credited to every transfer recipient, as if someone
    /// else funded it in the same slot.
    pub fn credit_on_landing(&self, lamports: u64) {
        self.state.lock().unwrap().credit_on_landing = lamports;
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn landed(&self) -> Vec<SentTx> {
        self.sent().into_iter().filter(SentTx::landed).collect()
    }

    pub fn landed_invoking(&self, program_id: &Pubkey) -> Vec<SentTx> {
        self.landed().into_iter().filter(|tx| tx.invokes(program_id)).collect()
    }

    /// Lookup tables successfully created so far
    pub fn lookup_tables(&self) -> HashSet<Pubkey> {
        self.state.lock().unwrap().lookup_tables.clone()
    }

    pub fn send_attempts(&self) -> usize {
        self.state.lock().unwrap().send_attempts
    }

    pub fn status_queries(&self) -> usize {
        self.state.lock().unwrap().status_queries
    }

    pub fn slot_queries(&self) -> usize {
        self.state.lock().unwrap().slot_queries
    }
}

/// Matches transactions with at least one instruction for `program_id`
pub fn invokes(
    program_id: Pubkey,
) -> impl Fn(&VersionedTransaction) -> bool + Send + Sync + 'static {
    move |tx| {
        let keys = tx.message.static_account_keys();
        tx.message
            .instructions()
            .iter()
            .any(|ix| keys.get(ix.program_id_index as usize) == Some(&program_id))
    }
}

fn decode(tx: &VersionedTransaction, signature: Signature, outcome: Outcome) -> SentTx {
    let keys = tx.message.static_account_keys();
    let resolve = |index: u8| keys.get(index as usize).copied().unwrap_or_default();
    SentTx {
        signature,
        blockhash: *tx.message.recent_blockhash(),
        outcome,
        versioned: tx.message.address_table_lookups().is_some(),
        lookup_tables: tx
            .message
            .address_table_lookups()
            .map(|lookups| lookups.iter().map(|lookup| lookup.account_key).collect())
            .unwrap_or_default(),
        instructions: tx
            .message
            .instructions()
            .iter()
            .map(|ix| SentInstruction {
                program_id: resolve(ix.program_id_index),
                accounts: ix.accounts.iter().map(|index| resolve(*index)).collect(),
                data: ix.data.clone(),
            })
            .collect(),
    }
}

impl ChainState {
    fn outcome_for(&mut self, tx: &VersionedTransaction) -> Outcome {
        for rule in self.rules.iter_mut() {
            if rule.remaining == Some(0) || !(rule.matches)(tx) {
                continue;
            }
            if let Some(remaining) = rule.remaining.as_mut() {
                *remaining -= 1;
            }
            return rule.outcome;
        }
        Outcome::Land
    }

    /// Tables this transaction would create, in instruction order
    fn created_tables(sent: &SentTx) -> impl Iterator<Item = Pubkey> + '_ {
        sent.instructions
            .iter()
            .filter(|ix| {
                ix.program_id == ADDRESS_LOOKUP_TABLE_PROGRAM_ID
                    && ix.data.starts_with(&[0, 0, 0, 0])
            })
            .filter_map(|ix| ix.accounts.first().copied())
    }

    fn apply_transfers(&mut self, sent: &SentTx) {
        for ix in &sent.instructions {
            if ix.program_id != system_program::id() || ix.data.len() < 12 {
                continue;
            }
            let tag = u32::from_le_bytes(ix.data[..4].try_into().unwrap());
            if tag != 2 {
                continue;
            }
            let lamports = u64::from_le_bytes(ix.data[4..12].try_into().unwrap());
            let (from, to) = (ix.accounts[0], ix.accounts[1]);
            let credit = self.credit_on_landing;
            *self.balances.entry(from).or_default() -= lamports;
            *self.balances.entry(to).or_default() += lamports + credit;
        }
    }

    fn return_data_for(&self, sent: &SentTx) -> Option<Vec<u8>> {
        sent.instructions
            .iter()
            .rev()
            .find_map(|ix| self.return_data.get(&ix.program_id).cloned())
    }
}

#[async_trait]
impl SolConnection for MockChain {
    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.send_attempts += 1;

        if tx.verify_with_results().iter().any(|valid| !valid) {
            return Err("transaction signature verification failure".into());
        }
        let signature = tx.signatures[0];
        let mut sent = decode(tx, signature, state.outcome_for(tx));
        let table_exists =
            ChainState::created_tables(&sent).any(|table| state.lookup_tables.contains(&table));
        if sent.outcome == Outcome::Land && table_exists {
            sent.outcome = Outcome::FailOnChain;
        }
        let outcome = sent.outcome;
        let slot = state.slot;

        match outcome {
            Outcome::Reject => {
                state.sent.push(sent);
                return Err("node is behind".into());
            },
            Outcome::Drop => {},
            Outcome::Land => {
                let created: Vec<Pubkey> = ChainState::created_tables(&sent).collect();
                state.lookup_tables.extend(created);
                state.apply_transfers(&sent);
                let return_data = state.return_data_for(&sent);
                let level = state.landing_level;
                state.statuses.insert(
                    signature,
                    SignatureStatus {
                        slot,
                        confirmation_status: Some(level),
                        err: None,
                    },
                );
                state.details.insert(
                    signature,
                    TransactionDetails {
                        slot,
                        fee: FEE,
                        compute_units_consumed: Some(COMPUTE_UNITS),
                        log_messages: vec!["Program log: ok".to_string()],
                        return_data,
                        err: None,
                    },
                );
            },
            Outcome::FailOnChain => {
                let reason = if table_exists {
                    "account already in use".to_string()
                } else {
                    "custom program error: 0x1".to_string()
                };
                state.statuses.insert(
                    signature,
                    SignatureStatus {
                        slot,
                        confirmation_status: Some(ConfirmationLevel::Processed),
                        err: Some(reason.clone()),
                    },
                );
                state.details.insert(
                    signature,
                    TransactionDetails {
                        slot,
                        fee: FEE,
                        compute_units_consumed: Some(COMPUTE_UNITS),
                        log_messages: vec!["Program log: failed".to_string()],
                        return_data: None,
                        err: Some(reason),
                    },
                );
            },
        }
        state.sent.push(sent);
        Ok(signature)
    }

    async fn get_latest_blockhash(
        &self,
        _commitment: ConfirmationLevel,
    ) -> Result<Hash, ConnectionError> {
        Ok(Hash::new_unique())
    }

    async fn get_slot(&self, _commitment: ConfirmationLevel) -> Result<u64, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.slot_queries += 1;
        if let Some(slot) = state.scripted_slots.pop_front() {
            state.slot = slot;
        } else {
            state.slot += state.slot_step;
        }
        Ok(state.slot)
    }

    async fn get_balance(
        &self,
        pubkey: &Pubkey,
        _commitment: ConfirmationLevel,
    ) -> Result<u64, ConnectionError> {
        Ok(self.balance(pubkey))
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, ConnectionError> {
        let lamports = self.balance(pubkey);
        Ok((lamports > 0).then(|| Account {
            lamports,
            owner: system_program::id(),
            ..Account::default()
        }))
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, ConnectionError> {
        Ok(RENT_EXEMPT_MINIMUM + data_len as u64 * 6_960)
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.status_queries += 1;
        Ok(signatures.iter().map(|sig| state.statuses.get(sig).cloned()).collect())
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
        _commitment: ConfirmationLevel,
    ) -> Result<Option<TransactionDetails>, ConnectionError> {
        Ok(self.state.lock().unwrap().details.get(signature).cloned())
    }
}

/// Short timeouts so paused-clock tests stay readable
pub fn test_config() -> SubmitterConfig {
    SubmitterConfig {
        tx_timeout_secs: 5,
        status_timeout_secs: 5,
        slot_wait_timeout_secs: 5,
        ..SubmitterConfig::default()
    }
}

pub fn setup_submitter(chain: MockChain) -> (Submitter<MockChain>, Arc<MockChain>) {
    setup_submitter_with(chain, test_config())
}

pub fn setup_submitter_with(
    chain: MockChain,
    config: SubmitterConfig,
) -> (Submitter<MockChain>, Arc<MockChain>) {
    let chain = Arc::new(chain);
    let submitter = Submitter::from_shared(Arc::clone(&chain), Arc::new(Keypair::new()), config);
    (submitter, chain)
}

/// Instruction for a made-up program, tagged so transactions stay distinct
pub fn tagged_ix(program_id: Pubkey, tag: u8, payer: &Pubkey) -> Instruction {
    Instruction::new_with_bytes(
        program_id,
        &[tag],
        vec![solana_sdk::instruction::AccountMeta::new(*payer, true)],
    )
}
