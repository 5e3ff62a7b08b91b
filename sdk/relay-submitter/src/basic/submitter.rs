use crate::advanced::builders;
use crate::basic::inspect::SubmissionStats;
use crate::config::SubmitterConfig;
use crate::core::connection::SolConnection;
use crate::core::signer::{sign_transaction, DynSigner};
use crate::error::{Result, SubmitterError};
use crate::types::ConfirmationLevel;
use crate::utils::wait_until;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Pause between broadcast attempts and between status polls
pub const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Drives transactions onto the chain through a [`SolConnection`].
///
/// Cheap to clone; clones share the connection, payer and stats so they
/// can be moved into spawned tasks.
pub struct Submitter<C> {
    pub(crate) connection: Arc<C>,
    pub(crate) payer: Arc<Keypair>,
    pub(crate) config: Arc<SubmitterConfig>,
    pub(crate) stats: Arc<Mutex<SubmissionStats>>,
    /// Creation slot of the most recent lookup table built by this payer.
    /// Table addresses derive from (authority, slot), so no two may share one.
    pub(crate) last_table_slot: Arc<Mutex<Option<u64>>>,
}

impl<C> Clone for Submitter<C> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            payer: Arc::clone(&self.payer),
            config: Arc::clone(&self.config),
            stats: Arc::clone(&self.stats),
            last_table_slot: Arc::clone(&self.last_table_slot),
        }
    }
}

impl<C: SolConnection + 'static> Submitter<C> {
    pub fn new(connection: C, payer: Keypair, config: SubmitterConfig) -> Self {
        Self::from_shared(Arc::new(connection), Arc::new(payer), config)
    }

    pub fn from_shared(connection: Arc<C>, payer: Arc<Keypair>, config: SubmitterConfig) -> Self {
        Self {
            connection,
            payer,
            config: Arc::new(config),
            stats: Arc::new(Mutex::new(SubmissionStats::default())),
            last_table_slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// Fee payer and default signer of every transaction this submitter builds
    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    /// Build a legacy transaction from `instructions` and drive it to the
    /// configured commitment, signed by the payer alone.
    pub async fn send_instructions(&self, instructions: &[Instruction]) -> Result<Signature> {
        let mut tx = builders::unsigned_transaction(instructions, &self.payer());
        self.send_with_retry(
            &mut tx,
            self.config.commitment,
            self.config.tx_timeout_secs,
            &[&*self.payer],
        )
        .await
    }

    /// Sign, broadcast and confirm `tx`, retrying once per second until
    /// `timeout_secs` have elapsed.
    ///
    /// Every attempt reads a fresh blockhash at `level`, writes it into `tx`,
    /// re-signs and submits without preflight. An on-chain failure counts as
    /// a failed attempt; the next attempt goes out with a new blockhash.
    #[instrument(skip(self, tx, signers), fields(payer = %self.payer()))]
    pub async fn send_with_retry(
        &self,
        tx: &mut VersionedTransaction,
        level: ConfirmationLevel,
        timeout_secs: u64,
        signers: &[&DynSigner],
    ) -> Result<Signature> {
        if signers.is_empty() {
            return Err(SubmitterError::NoSigners);
        }

        let timeout = Duration::from_secs(timeout_secs);
        let start = Instant::now();
        let mut attempt = 0u32;

        let last_error = loop {
            attempt += 1;
            let budget = timeout.saturating_sub(start.elapsed());

            let error = match self.broadcast_once(tx, level, budget, signers).await {
                Ok(signature) => {
                    debug!(%signature, attempt, "transaction reached {:?}", level);
                    return Ok(signature);
                },
                Err(e) => e,
            };
            warn!(attempt, error = %error, "broadcast attempt failed");

            if start.elapsed() >= timeout {
                break error;
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        };

        Err(SubmitterError::RetriesExhausted {
            elapsed: start.elapsed(),
            source: Box::new(last_error),
        })
    }

    async fn broadcast_once(
        &self,
        tx: &mut VersionedTransaction,
        level: ConfirmationLevel,
        budget: Duration,
        signers: &[&DynSigner],
    ) -> Result<Signature> {
        let blockhash = self
            .connection
            .get_latest_blockhash(level)
            .await
            .map_err(|e| SubmitterError::Connection(e.to_string()))?;

        tx.message.set_recent_blockhash(blockhash);
        sign_transaction(tx, signers)?;

        let signature = self
            .connection
            .send_transaction(tx)
            .await
            .map_err(|e| SubmitterError::Connection(e.to_string()))?;

        let window = budget.min(self.config.status_timeout());
        match self.poll_status(&signature, level, window).await {
            Err(e @ SubmitterError::TransactionFailed { .. }) => {
                self.log_failed_transaction(&signature).await;
                Err(e)
            },
            other => other.map(|_| signature),
        }
    }

    /// Wait until `signature` reaches `level`, polling once per second up
    /// to the configured status ceiling.
    pub async fn wait_for_status(
        &self,
        signature: &Signature,
        level: ConfirmationLevel,
    ) -> Result<()> {
        self.poll_status(signature, level, self.config.status_timeout())
            .await
    }

    async fn poll_status(
        &self,
        signature: &Signature,
        level: ConfirmationLevel,
        window: Duration,
    ) -> Result<()> {
        let connection = &self.connection;
        let reached = wait_until(window, RETRY_INTERVAL, || async move {
            let statuses = connection
                .get_signature_statuses(std::slice::from_ref(signature))
                .await
                .map_err(|e| SubmitterError::Connection(e.to_string()))?;

            // Lagging nodes return nothing for fresh signatures
            let Some(Some(status)) = statuses.into_iter().next() else {
                return Ok(false);
            };
            if let Some(reason) = status.err {
                return Err(SubmitterError::TransactionFailed {
                    signature: *signature,
                    reason,
                });
            }
            Ok(status
                .confirmation_status
                .is_some_and(|current| current.satisfies(level)))
        })
        .await?;

        if reached {
            Ok(())
        } else {
            Err(SubmitterError::StatusTimeout {
                signature: *signature,
                level,
                waited: window,
            })
        }
    }
}
