use crate::advanced::instructions;
use crate::basic::submitter::Submitter;
use crate::core::connection::SolConnection;
use crate::core::constants::MAX_EXTEND_ADDRESSES;
use crate::error::{Result, SubmitterError};
use crate::types::{ConfirmationLevel, LookupTableReceipt};
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

impl LookupTableReceipt {
    /// Table contents as the message compiler wants them
    pub fn account(&self) -> AddressLookupTableAccount {
        AddressLookupTableAccount {
            key: self.address,
            addresses: self.addresses.clone(),
        }
    }
}

impl<C: SolConnection + 'static> Submitter<C> {
    /// Create a lookup table owned by the payer, fill it with `accounts`
    /// and return once the runtime can resolve it.
    ///
    /// A failure after creation leaves the table behind; its address is
    /// logged so it can be reclaimed by hand.
    #[instrument(skip(self, accounts), fields(accounts = accounts.len()))]
    pub async fn bootstrap_lookup_table(
        &self,
        accounts: &[Pubkey],
    ) -> Result<LookupTableReceipt> {
        if accounts.is_empty() {
            return Err(SubmitterError::EmptyLookupTable);
        }

        let authority = self.payer();
        let creation_slot = self.reserve_creation_slot().await?;

        let (create_ix, table) =
            instructions::create_lookup_table(&authority, &authority, creation_slot);
        let create_signature = self.send_instructions(&[create_ix]).await?;
        debug!(%table, creation_slot, %create_signature, "lookup table created");

        // Each extension appends to the table's current state, so they go one at a time
        let mut extend_signatures = Vec::new();
        for batch in accounts.chunks(MAX_EXTEND_ADDRESSES) {
            let extend_ix =
                instructions::extend_lookup_table(&table, &authority, &authority, batch);
            let signature = self.send_instructions(&[extend_ix]).await.inspect_err(|e| {
                warn!(%table, error = %e, "lookup table extension failed, table left behind")
            })?;
            extend_signatures.push(signature);
        }

        self.wait_for_slot_after(creation_slot).await.inspect_err(|e| {
            warn!(%table, error = %e, "lookup table never became active, table left behind")
        })?;

        info!(%table, addresses = accounts.len(), "lookup table active");
        Ok(LookupTableReceipt {
            address: table,
            creation_slot,
            addresses: accounts.to_vec(),
            create_signature,
            extend_signatures,
        })
    }

    /// Pick a creation slot no earlier table of this payer has used.
    /// Table addresses derive from (authority, slot), so slots are never shared.
    async fn reserve_creation_slot(&self) -> Result<u64> {
        let mut last_slot = self.last_table_slot.lock().await;
        let slot = match *last_slot {
            Some(last) => self.wait_for_slot_after(last).await?,
            None => self.processed_slot().await?,
        };
        *last_slot = Some(slot);
        Ok(slot)
    }

    /// Poll the processed slot until it is strictly greater than `slot`
    /// and return the first slot seen past it.
    ///
    /// A lookup table only resolves from the slot after the one it was created in.
    pub async fn wait_for_slot_after(&self, slot: u64) -> Result<u64> {
        let timeout = self.config.slot_wait_timeout();
        let start = Instant::now();

        loop {
            let current = self.processed_slot().await?;
            if current > slot {
                return Ok(current);
            }
            if start.elapsed() >= timeout {
                return Err(SubmitterError::SlotWaitTimeout {
                    slot,
                    waited: timeout,
                });
            }
            tokio::time::sleep(self.config.slot_poll_interval()).await;
        }
    }

    async fn processed_slot(&self) -> Result<u64> {
        self.connection
            .get_slot(ConfirmationLevel::Processed)
            .await
            .map_err(|e| SubmitterError::Connection(e.to_string()))
    }
}
