use crate::common::TestContext;
use anyhow::{anyhow, ensure, Context, Result};
use ibc_solana_submitter::{ConfirmationLevel, SolConnection};
use solana_sdk::signature::{Keypair, Signer};
use tracing::info;

/// A faucet holding exactly the requested amount funds a fresh wallet;
/// the wallet must read back that exact amount.
pub async fn run(ctx: &TestContext) -> Result<()> {
    info!("running funding scenario");
    let connection = ctx.submitter.connection();

    let amount = connection
        .get_minimum_balance_for_rent_exemption(0)
        .await
        .map_err(|e| anyhow!("rent query failed: {}", e))?
        * 2;

    let faucet = Keypair::new();
    ctx.submitter
        .fund_wallet(&*ctx.payer, &faucet.pubkey(), amount)
        .await
        .context("seeding faucet failed")?;

    let wallet = Keypair::new();
    ctx.submitter
        .fund_wallet(&faucet, &wallet.pubkey(), amount)
        .await
        .context("funding wallet from exact-balance faucet failed")?;

    let level = ConfirmationLevel::Confirmed;
    let wallet_balance = connection
        .get_balance(&wallet.pubkey(), level)
        .await
        .map_err(|e| anyhow!("balance query failed: {}", e))?;
    let faucet_balance = connection
        .get_balance(&faucet.pubkey(), level)
        .await
        .map_err(|e| anyhow!("balance query failed: {}", e))?;

    ensure!(
        wallet_balance == amount,
        "wallet holds {} lamports, expected {}",
        wallet_balance,
        amount
    );
    ensure!(faucet_balance == 0, "faucet still holds {} lamports", faucet_balance);

    info!(wallet = %wallet.pubkey(), amount, "funding scenario passed");
    Ok(())
}
