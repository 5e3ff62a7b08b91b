use crate::types::{ConfirmationLevel, SignatureStatus, TransactionDetails};
use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::error::Error;

pub type ConnectionError = Box<dyn Error + Send + Sync>;

/// RPC surface the submitter drives.
///
/// Every call is a network round trip; implementations must not retry on
/// their own, the submitter owns retry and timeout policy.
#[async_trait]
pub trait SolConnection: Send + Sync {
    /// Submit with preflight simulation disabled.
    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, ConnectionError>;

    async fn get_latest_blockhash(
        &self,
        commitment: ConfirmationLevel,
    ) -> Result<Hash, ConnectionError>;

    async fn get_slot(&self, commitment: ConfirmationLevel) -> Result<u64, ConnectionError>;

    async fn get_balance(
        &self,
        pubkey: &Pubkey,
        commitment: ConfirmationLevel,
    ) -> Result<u64, ConnectionError>;

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, ConnectionError>;

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, ConnectionError>;

    /// One entry per requested signature; `None` while the node has not seen it.
    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, ConnectionError>;

    async fn get_transaction(
        &self,
        signature: &Signature,
        commitment: ConfirmationLevel,
    ) -> Result<Option<TransactionDetails>, ConnectionError>;
}
