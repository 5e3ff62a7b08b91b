use crate::basic::submitter::{Submitter, RETRY_INTERVAL};
use crate::core::connection::SolConnection;
use crate::error::{Result, SubmitterError};
use crate::types::{ConfirmationLevel, TransactionDetails, UpdateClientOutcome};
use solana_sdk::signature::Signature;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Running totals over every transaction the submitter inspected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionStats {
    pub transactions: u64,
    pub compute_units: u64,
    pub fees: u64,
}

impl SubmissionStats {
    fn record(&mut self, details: &TransactionDetails) {
        self.transactions += 1;
        self.compute_units += details.compute_units_consumed.unwrap_or_default();
        self.fees += details.fee;
    }
}

impl<C: SolConnection + 'static> Submitter<C> {
    pub async fn stats(&self) -> SubmissionStats {
        *self.stats.lock().await
    }

    /// Fetch metadata of a confirmed transaction, waiting for the node to index it.
    pub async fn transaction_details(&self, signature: &Signature) -> Result<TransactionDetails> {
        let timeout = self.config.status_timeout();
        let start = Instant::now();
        loop {
            let details = self
                .connection
                .get_transaction(signature, ConfirmationLevel::Confirmed)
                .await
                .map_err(|e| SubmitterError::Connection(e.to_string()))?;
            if let Some(details) = details {
                return Ok(details);
            }
            if start.elapsed() >= timeout {
                return Err(SubmitterError::TransactionNotFound(*signature));
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    /// Fold a landed transaction's compute units and fee into the stats.
    ///
    /// Introspection only: a failed lookup is logged, never returned.
    pub async fn record_transaction(
        &self,
        signature: &Signature,
        label: &str,
    ) -> Option<TransactionDetails> {
        let details = match self
            .connection
            .get_transaction(signature, ConfirmationLevel::Confirmed)
            .await
        {
            Ok(Some(details)) => details,
            Ok(None) => {
                debug!(%signature, label, "transaction not indexed yet, skipping stats");
                return None;
            },
            Err(e) => {
                warn!(%signature, label, error = %e, "failed to fetch transaction details");
                return None;
            },
        };

        let totals = {
            let mut stats = self.stats.lock().await;
            stats.record(&details);
            *stats
        };
        debug!(
            %signature,
            label,
            compute_units = details.compute_units_consumed,
            fee = details.fee,
            total_compute_units = totals.compute_units,
            total_fees = totals.fees,
            "transaction landed"
        );
        Some(details)
    }

    /// Dump program logs of a transaction that failed on-chain
    pub(crate) async fn log_failed_transaction(&self, signature: &Signature) {
        match self
            .connection
            .get_transaction(signature, ConfirmationLevel::Confirmed)
            .await
        {
            Ok(Some(details)) => warn!(
                %signature,
                error = details.err.as_deref().unwrap_or("unknown"),
                compute_units = details.compute_units_consumed,
                fee = details.fee,
                logs = ?details.log_messages,
                "transaction failed on-chain"
            ),
            Ok(None) => warn!(%signature, "transaction failed on-chain, no logs available"),
            Err(e) => {
                warn!(%signature, error = %e, "transaction failed on-chain, log fetch failed")
            },
        }
    }

    /// Decode the update outcome byte from a transaction's return data
    pub async fn read_update_outcome(&self, signature: &Signature) -> Result<UpdateClientOutcome> {
        let details = self.transaction_details(signature).await?;
        decode_update_outcome(signature, details.return_data.as_deref())
    }
}

pub fn decode_update_outcome(
    signature: &Signature,
    return_data: Option<&[u8]>,
) -> Result<UpdateClientOutcome> {
    let byte = return_data
        .and_then(|data| data.first().copied())
        .ok_or(SubmitterError::MissingReturnData(*signature))?;
    UpdateClientOutcome::try_from(byte).map_err(SubmitterError::InvalidReturnData)
}
