use crate::advanced::builders;
use crate::basic::submitter::Submitter;
use crate::core::connection::SolConnection;
use crate::core::signer::DynSigner;
use crate::error::{Result, SubmitterError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use tracing::{info, instrument};

impl<C: SolConnection + 'static> Submitter<C> {
    /// Move `lamports` from `faucet` to `target`, fees paid by the submitter's payer.
    ///
    /// The faucet is shared without locking, so the result is verified by
    /// reading `target` back: it must hold exactly its old balance plus
    /// `lamports`.
    #[instrument(skip(self, faucet), fields(faucet = %faucet.pubkey()))]
    pub async fn fund_wallet(
        &self,
        faucet: &DynSigner,
        target: &Pubkey,
        lamports: u64,
    ) -> Result<Signature> {
        let level = self.config.commitment;
        let faucet_key = faucet.pubkey();

        let before = self
            .connection
            .get_balance(target, level)
            .await
            .map_err(|e| SubmitterError::Connection(e.to_string()))?;

        let exists = self
            .connection
            .get_account(target)
            .await
            .map_err(|e| SubmitterError::Connection(e.to_string()))?
            .is_some();
        if !exists {
            let minimum = self
                .connection
                .get_minimum_balance_for_rent_exemption(0)
                .await
                .map_err(|e| SubmitterError::Connection(e.to_string()))?;
            if lamports < minimum {
                return Err(SubmitterError::BelowRentExemption { lamports, minimum });
            }
        }

        let available = self
            .connection
            .get_balance(&faucet_key, level)
            .await
            .map_err(|e| SubmitterError::Connection(e.to_string()))?;
        if available < lamports {
            return Err(SubmitterError::InsufficientFunds {
                available,
                requested: lamports,
            });
        }

        let transfer_ix = system_instruction::transfer(&faucet_key, target, lamports);
        let mut tx = builders::unsigned_transaction(&[transfer_ix], &self.payer());
        let payer: &DynSigner = &*self.payer;
        let signature = self
            .send_with_retry(&mut tx, level, self.config.tx_timeout_secs, &[payer, faucet])
            .await?;

        let after = self
            .connection
            .get_balance(target, level)
            .await
            .map_err(|e| SubmitterError::Connection(e.to_string()))?;
        let expected = before.saturating_add(lamports);
        if after != expected {
            return Err(SubmitterError::BalanceMismatch {
                expected,
                actual: after,
            });
        }

        info!(%target, lamports, balance = after, "wallet funded");
        Ok(signature)
    }
}
