use crate::common::{pubkey_var, TestContext};
use anyhow::{ensure, Context, Result};
use ibc_solana_submitter::advanced::chunking::chunk_count;
use ibc_solana_submitter::{MisbehaviourAccounts, UpdateClientOutcome};
use std::env;
use tracing::info;

fn required(name: &str) -> Result<solana_sdk::pubkey::Pubkey> {
    pubkey_var(name)?.with_context(|| format!("{} must be set", name))
}

/// Submit a recorded misbehaviour in chunks and expect the client to freeze.
///
/// Needs a deployed light client: skipped unless `LIGHT_CLIENT_PROGRAM_ID`
/// is set, in which case `CLIENT_STATE`, `CONSENSUS_STATE_1`,
/// `CONSENSUS_STATE_2` and `MISBEHAVIOUR_FILE` are required too.
pub async fn run(ctx: &TestContext) -> Result<()> {
    let Some(light_client_program_id) = pubkey_var("LIGHT_CLIENT_PROGRAM_ID")? else {
        info!("LIGHT_CLIENT_PROGRAM_ID not set, skipping misbehaviour scenario");
        return Ok(());
    };
    info!(%light_client_program_id, "running misbehaviour scenario");

    let accounts = MisbehaviourAccounts {
        light_client_program_id,
        client_state: required("CLIENT_STATE")?,
        trusted_consensus_state_1: required("CONSENSUS_STATE_1")?,
        trusted_consensus_state_2: required("CONSENSUS_STATE_2")?,
    };
    let path = env::var("MISBEHAVIOUR_FILE").context("MISBEHAVIOUR_FILE must be set")?;
    let misbehaviour = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read {}", path))?;

    let receipt = ctx
        .submitter
        .submit_misbehaviour(&accounts, &ctx.client_id, &misbehaviour)
        .await
        .context("misbehaviour submission failed")?;

    let expected_chunks = chunk_count(misbehaviour.len(), ctx.submitter.config().chunk_size);
    ensure!(
        receipt.chunk_accounts.len() == expected_chunks,
        "assembly referenced {} chunks, expected {}",
        receipt.chunk_accounts.len(),
        expected_chunks
    );
    ensure!(
        receipt.outcome == UpdateClientOutcome::Misbehaviour,
        "client was not frozen, outcome {:?}",
        receipt.outcome
    );

    info!(signature = %receipt.signature, chunks = expected_chunks, "misbehaviour scenario passed");
    Ok(())
}
