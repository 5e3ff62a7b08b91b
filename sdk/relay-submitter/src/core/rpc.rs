use crate::config::SubmitterConfig;
use crate::core::connection::{ConnectionError, SolConnection};
use crate::types::{ConfirmationLevel, SignatureStatus, TransactionDetails};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use solana_client::client_error::ClientErrorKind;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcSendTransactionConfig, RpcTransactionConfig};
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::{
    TransactionConfirmationStatus, UiTransactionEncoding, UiTransactionReturnData,
};

/// `SolConnection` backed by a JSON-RPC node.
pub struct RpcConnection {
    client: RpcClient,
    commitment: ConfirmationLevel,
}

impl RpcConnection {
    pub fn new(rpc_url: impl Into<String>, commitment: ConfirmationLevel) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.into(), commitment.commitment()),
            commitment,
        }
    }

    pub fn from_config(config: &SubmitterConfig) -> Self {
        Self::new(config.rpc_url.clone(), config.commitment)
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

fn confirmation_level(status: &TransactionConfirmationStatus) -> ConfirmationLevel {
    match status {
        TransactionConfirmationStatus::Processed => ConfirmationLevel::Processed,
        TransactionConfirmationStatus::Confirmed => ConfirmationLevel::Confirmed,
        TransactionConfirmationStatus::Finalized => ConfirmationLevel::Finalized,
    }
}

fn decode_return_data(return_data: UiTransactionReturnData) -> Result<Vec<u8>, ConnectionError> {
    // Only base64 is defined for return data
    let (encoded, _encoding) = return_data.data;
    Ok(BASE64.decode(encoded)?)
}

#[async_trait]
impl SolConnection for RpcConnection {
    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, ConnectionError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..RpcSendTransactionConfig::default()
        };
        Ok(self.client.send_transaction_with_config(tx, config).await?)
    }

    async fn get_latest_blockhash(
        &self,
        commitment: ConfirmationLevel,
    ) -> Result<Hash, ConnectionError> {
        let (hash, _last_valid_height) = self
            .client
            .get_latest_blockhash_with_commitment(commitment.commitment())
            .await?;
        Ok(hash)
    }

    async fn get_slot(&self, commitment: ConfirmationLevel) -> Result<u64, ConnectionError> {
        Ok(self.client.get_slot_with_commitment(commitment.commitment()).await?)
    }

    async fn get_balance(
        &self,
        pubkey: &Pubkey,
        commitment: ConfirmationLevel,
    ) -> Result<u64, ConnectionError> {
        Ok(self
            .client
            .get_balance_with_commitment(pubkey, commitment.commitment())
            .await?
            .value)
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, ConnectionError> {
        Ok(self
            .client
            .get_account_with_commitment(pubkey, self.commitment.commitment())
            .await?
            .value)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, ConnectionError> {
        Ok(self
            .client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await?)
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<SignatureStatus>>, ConnectionError> {
        let response = self.client.get_signature_statuses(signatures).await?;
        Ok(response
            .value
            .into_iter()
            .map(|status| {
                status.map(|status| SignatureStatus {
                    slot: status.slot,
                    confirmation_status: status
                        .confirmation_status
                        .as_ref()
                        .map(confirmation_level),
                    err: status.err.map(|e| e.to_string()),
                })
            })
            .collect())
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
        commitment: ConfirmationLevel,
    ) -> Result<Option<TransactionDetails>, ConnectionError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(commitment.commitment()),
            max_supported_transaction_version: Some(0),
        };

        let confirmed = match self.client.get_transaction_with_config(signature, config).await {
            Ok(confirmed) => confirmed,
            // A null result (not yet indexed) fails to deserialize
            Err(e) if matches!(e.kind(), ClientErrorKind::SerdeJson(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(meta) = confirmed.transaction.meta else {
            return Ok(Some(TransactionDetails {
                slot: confirmed.slot,
                ..TransactionDetails::default()
            }));
        };

        let return_data = match Option::<UiTransactionReturnData>::from(meta.return_data) {
            Some(data) => Some(decode_return_data(data)?),
            None => None,
        };

        Ok(Some(TransactionDetails {
            slot: confirmed.slot,
            fee: meta.fee,
            compute_units_consumed: Option::from(meta.compute_units_consumed),
            log_messages: Option::<Vec<String>>::from(meta.log_messages).unwrap_or_default(),
            return_data,
            err: meta.err.map(|e| e.to_string()),
        }))
    }
}
