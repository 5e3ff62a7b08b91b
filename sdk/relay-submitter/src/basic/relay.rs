use crate::advanced::builders;
use crate::basic::inspect::decode_update_outcome;
use crate::basic::submitter::Submitter;
use crate::core::connection::SolConnection;
use crate::error::{Result, SubmitterError};
use crate::types::{
    LookupTableReceipt, PacketReceipt, PacketTxs, Phase, RefundClaim, RelayBatch, RelaySummary,
    Target, TransactionDetails, UpdateClient, UpdateClientOutcome,
};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// What a finished packet pipeline hands back to its caller
struct PacketOutcome {
    final_signature: Signature,
    final_details: Option<TransactionDetails>,
    chunks_uploaded: usize,
    lookup_table: Option<Pubkey>,
    lookup_table_wait: Option<Duration>,
    refund_claim: Option<Vec<Instruction>>,
}

impl PacketOutcome {
    fn into_receipt(self, packet: usize) -> (PacketReceipt, Option<Vec<Instruction>>) {
        let receipt = PacketReceipt {
            packet,
            final_signature: self.final_signature,
            chunks_uploaded: self.chunks_uploaded,
            lookup_table: self.lookup_table,
            lookup_table_wait: self.lookup_table_wait,
        };
        (receipt, self.refund_claim)
    }
}

impl<C: SolConnection + 'static> Submitter<C> {
    /// Land a relayer response.
    ///
    /// The client update, when present, is confirmed before any packet
    /// starts. Packets then run concurrently, each in its own task. The
    /// first packet failure is returned and the remaining packet tasks are
    /// aborted. Refund claims are awaited before a successful return, but
    /// their failures only show up in the summary.
    #[instrument(
        skip_all,
        fields(packets = batch.packets.len(), update_client = batch.update_client.is_some())
    )]
    pub async fn submit_relay(&self, batch: RelayBatch) -> Result<RelaySummary> {
        let mut summary = RelaySummary::default();

        if let Some(update) = batch.update_client {
            let signature = self.submit_update_client(update).await?;
            summary.update_client = Some(signature);
            summary.last_signature = Some(signature);
        }

        let mut packets = JoinSet::new();
        for (index, packet) in batch.packets.into_iter().enumerate() {
            let submitter = self.clone();
            packets.spawn(async move {
                let outcome = submitter.submit_packet(Target::Packet(index), packet).await?;
                Ok::<_, SubmitterError>(outcome.into_receipt(index))
            });
        }

        let mut refunds = JoinSet::new();
        while let Some(joined) = packets.join_next().await {
            let (receipt, refund_claim) = joined??;
            let packet = receipt.packet;

            if let Some(instructions) = refund_claim {
                let submitter = self.clone();
                refunds.spawn(async move {
                    let result = submitter
                        .send_instructions(&instructions)
                        .await
                        .map_err(|e| e.in_phase(Phase::RefundClaim { packet }));
                    (packet, result)
                });
            }

            summary.last_signature = Some(receipt.final_signature);
            summary.packets.push(receipt);
        }

        while let Some(joined) = refunds.join_next().await {
            let (packet, result) = joined?;
            let signature = match result {
                Ok(signature) => {
                    debug!(packet, %signature, "refund claimed");
                    Some(signature)
                },
                Err(e) => {
                    warn!(packet, error = %e, "refund claim failed");
                    None
                },
            };
            summary.refund_claims.push(RefundClaim { packet, signature });
        }

        summary.packets.sort_by_key(|receipt| receipt.packet);
        summary.refund_claims.sort_by_key(|claim| claim.packet);

        let stats = self.stats().await;
        info!(
            packets = summary.packets.len(),
            compute_units = stats.compute_units,
            fees = stats.fees,
            "relay batch landed"
        );
        Ok(summary)
    }

    async fn submit_update_client(&self, update: UpdateClient) -> Result<Signature> {
        let (signature, details) = match update {
            UpdateClient::Attestation(instructions) => {
                let signature = self
                    .send_instructions(&instructions)
                    .await
                    .map_err(|e| e.in_phase(Phase::Final {
                        target: Target::UpdateClient,
                    }))?;
                let details = self.record_transaction(&signature, "update_client").await;
                (signature, details)
            },
            UpdateClient::Chunked(packet) => {
                if packet.refund_claim_instructions.is_some() {
                    return Err(SubmitterError::UpdateClientRefundClaim);
                }
                let outcome = self.submit_packet(Target::UpdateClient, packet).await?;
                (outcome.final_signature, outcome.final_details)
            },
        };

        // Programs that report an outcome must not have frozen the client
        if let Some(return_data) = details.and_then(|d| d.return_data) {
            let outcome = decode_update_outcome(&signature, Some(&return_data))?;
            if outcome == UpdateClientOutcome::Misbehaviour {
                return Err(SubmitterError::UnexpectedMisbehaviour(signature));
            }
            debug!(%signature, ?outcome, "client updated");
        }
        Ok(signature)
    }

    /// Chunks, then lookup table, then final transaction. Cleanup is left
    /// running in the background; the refund claim is handed back.
    async fn submit_packet(&self, target: Target, packet: PacketTxs) -> Result<PacketOutcome> {
        let uses_lookup_table = packet.has_lookup_table();
        let PacketTxs {
            chunks,
            lookup_table_accounts,
            final_instructions,
            cleanup_instructions,
            refund_claim_instructions,
        } = packet;

        // Table setup overlaps the chunk uploads
        let mut lookup_task = JoinSet::new();
        if uses_lookup_table {
            let submitter = self.clone();
            lookup_task.spawn(async move {
                submitter
                    .bootstrap_lookup_table(&lookup_table_accounts)
                    .await
            });
        }

        let chunks_uploaded = chunks.len();
        if !chunks.is_empty() {
            self.upload_chunks(target, chunks).await?;
            debug!(%target, chunks = chunks_uploaded, "chunks uploaded");
        }

        let (lookup_table, lookup_table_wait) = if uses_lookup_table {
            let wait_start = Instant::now();
            let receipt = self
                .join_lookup_table(&mut lookup_task)
                .await
                .map_err(|e| e.in_phase(Phase::LookupTable { target }))?;
            (Some(receipt), Some(wait_start.elapsed()))
        } else {
            (None, None)
        };

        let table_account = lookup_table.as_ref().map(LookupTableReceipt::account);
        let mut tx = builders::unsigned_transaction_for(
            &final_instructions,
            &self.payer(),
            table_account.as_ref(),
        )?;
        let final_signature = self
            .send_with_retry(
                &mut tx,
                self.config.commitment,
                self.config.tx_timeout_secs,
                &[&*self.payer],
            )
            .await
            .map_err(|e| e.in_phase(Phase::Final { target }))?;
        let final_details = self.record_transaction(&final_signature, "final").await;

        if let Some(instructions) = cleanup_instructions {
            let submitter = self.clone();
            tokio::spawn(async move {
                match submitter.send_instructions(&instructions).await {
                    Ok(signature) => debug!(%target, %signature, "cleanup landed"),
                    Err(e) => warn!(%target, error = %e, "cleanup failed"),
                }
            });
        }

        debug!(%target, %final_signature, "packet landed");
        Ok(PacketOutcome {
            final_signature,
            final_details,
            chunks_uploaded,
            lookup_table: lookup_table.map(|receipt| receipt.address),
            lookup_table_wait,
            refund_claim: refund_claim_instructions,
        })
    }

    /// Upload every chunk in its own task and wait for all of them.
    async fn upload_chunks(&self, target: Target, chunks: Vec<Vec<Instruction>>) -> Result<()> {
        let mut uploads = JoinSet::new();
        for (chunk, instructions) in chunks.into_iter().enumerate() {
            let submitter = self.clone();
            uploads.spawn(async move {
                let signature = submitter
                    .send_instructions(&instructions)
                    .await
                    .map_err(|e| e.in_phase(Phase::ChunkUpload { target, chunk }))?;
                submitter.record_transaction(&signature, "chunk").await;
                debug!(%target, chunk, %signature, "chunk landed");
                Ok::<_, SubmitterError>(())
            });
        }

        while let Some(joined) = uploads.join_next().await {
            joined??;
        }
        Ok(())
    }

    async fn join_lookup_table(
        &self,
        task: &mut JoinSet<Result<LookupTableReceipt>>,
    ) -> Result<LookupTableReceipt> {
        match task.join_next().await {
            Some(joined) => joined?,
            None => Err(SubmitterError::Task("lookup table task missing".into())),
        }
    }
}
