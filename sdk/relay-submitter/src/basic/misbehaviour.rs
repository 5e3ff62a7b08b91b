use crate::advanced::chunking::split_into_chunks;
use crate::advanced::instructions::{self, MisbehaviourAccounts};
use crate::basic::inspect::decode_update_outcome;
use crate::basic::submitter::Submitter;
use crate::core::connection::SolConnection;
use crate::error::{Result, SubmitterError};
use crate::types::{MisbehaviourReceipt, Phase};
use crate::utils::derive_misbehaviour_chunk_pda;
use solana_sdk::pubkey::Pubkey;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

impl<C: SolConnection + 'static> Submitter<C> {
    /// Upload `misbehaviour` in chunks, then assemble and verify it on-chain.
    ///
    /// Chunks go up in parallel, one transaction each, to accounts derived
    /// from the payer and the chunk index. Assembly runs only after every
    /// chunk is confirmed, with a raised compute limit, and its return data
    /// tells whether the client was frozen.
    #[instrument(skip(self, accounts, misbehaviour), fields(bytes = misbehaviour.len()))]
    pub async fn submit_misbehaviour(
        &self,
        accounts: &MisbehaviourAccounts,
        client_id: &str,
        misbehaviour: &[u8],
    ) -> Result<MisbehaviourReceipt> {
        let chunks = split_into_chunks(misbehaviour, self.config.chunk_size)?;
        let submitter = self.payer();
        let program_id = &accounts.light_client_program_id;
        let chunk_accounts: Vec<Pubkey> = (0..chunks.len())
            .map(|index| derive_misbehaviour_chunk_pda(program_id, &submitter, index as u8).0)
            .collect();

        let mut uploads = JoinSet::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let upload_ix = instructions::upload_misbehaviour_chunk(
                accounts,
                &submitter,
                client_id,
                index as u8,
                chunk,
            )?;
            let this = self.clone();
            uploads.spawn(async move {
                let signature = this
                    .send_instructions(&[upload_ix])
                    .await
                    .map_err(|e| e.in_phase(Phase::MisbehaviourChunk { chunk: index }))?;
                this.record_transaction(&signature, "misbehaviour_chunk").await;
                Ok::<_, SubmitterError>(signature)
            });
        }

        while let Some(joined) = uploads.join_next().await {
            if let Err(e) = joined.map_err(SubmitterError::from).and_then(|result| result) {
                uploads.abort_all();
                self.spawn_misbehaviour_cleanup(accounts, client_id, &chunk_accounts);
                return Err(e);
            }
        }
        debug!(chunks = chunk_accounts.len(), "misbehaviour chunks uploaded");

        let assemble_ix = instructions::assemble_and_submit_misbehaviour(
            accounts,
            &submitter,
            client_id,
            &chunk_accounts,
        )?;
        let assembly = [
            instructions::set_compute_unit_limit(self.config.assembly_compute_units),
            assemble_ix,
        ];
        let signature = match self.send_instructions(&assembly).await {
            Ok(signature) => signature,
            Err(e) => {
                self.spawn_misbehaviour_cleanup(accounts, client_id, &chunk_accounts);
                return Err(e.in_phase(Phase::MisbehaviourAssembly));
            },
        };

        let details = match self.record_transaction(&signature, "misbehaviour_assembly").await {
            Some(details) => details,
            None => self
                .transaction_details(&signature)
                .await
                .map_err(|e| e.in_phase(Phase::MisbehaviourAssembly))?,
        };
        let outcome = decode_update_outcome(&signature, details.return_data.as_deref())
            .map_err(|e| e.in_phase(Phase::MisbehaviourAssembly))?;

        info!(%signature, ?outcome, chunks = chunk_accounts.len(), "misbehaviour submitted");
        Ok(MisbehaviourReceipt {
            signature,
            chunk_accounts,
            outcome,
        })
    }

    /// Best effort: reclaim chunk accounts of a submission that did not complete
    fn spawn_misbehaviour_cleanup(
        &self,
        accounts: &MisbehaviourAccounts,
        client_id: &str,
        chunk_accounts: &[Pubkey],
    ) {
        let cleanup_ix = match instructions::cleanup_incomplete_misbehaviour(
            accounts,
            &self.payer(),
            client_id,
            chunk_accounts,
        ) {
            Ok(ix) => ix,
            Err(e) => {
                warn!(error = %e, "could not build misbehaviour cleanup");
                return;
            },
        };

        let this = self.clone();
        tokio::spawn(async move {
            match this.send_instructions(&[cleanup_ix]).await {
                Ok(signature) => debug!(%signature, "misbehaviour chunks reclaimed"),
                Err(e) => warn!(error = %e, "misbehaviour cleanup failed"),
            }
        });
    }
}
