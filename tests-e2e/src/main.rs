mod common;
mod scenarios;

use anyhow::Result;
use common::TestContext;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ctx = TestContext::new()?;
    info!(
        payer = %ctx.submitter.payer(),
        rpc_url = %ctx.submitter.config().rpc_url,
        "test context initialized"
    );

    scenarios::funding::run(&ctx).await?;
    scenarios::concurrent_packets::run(&ctx).await?;
    scenarios::misbehaviour::run(&ctx).await?;

    let stats = ctx.submitter.stats().await;
    info!(
        transactions = stats.transactions,
        compute_units = stats.compute_units,
        fees = stats.fees,
        "all scenarios completed"
    );
    Ok(())
}
