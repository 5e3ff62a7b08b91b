use crate::common::TestContext;
use anyhow::{anyhow, ensure, Context, Result};
use ibc_solana_submitter::advanced::chunking::split_into_chunks;
use ibc_solana_submitter::{ConfirmationLevel, PacketTxs, RelayBatch, SolConnection};
use rand::RngCore;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction;
use tracing::info;

const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

fn memo(payer: &Pubkey, text: String) -> Instruction {
    Instruction {
        program_id: MEMO_PROGRAM_ID,
        accounts: vec![AccountMeta::new_readonly(*payer, true)],
        data: text.into_bytes(),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Two packets in one batch: the first uploads 3 chunks and pays 5
/// recipients through a lookup table, the second is a bare final
/// transaction. The second must never touch the chunk or table phases.
pub async fn run(ctx: &TestContext) -> Result<()> {
    info!("running concurrent packets scenario");
    let payer = ctx.submitter.payer();
    let connection = ctx.submitter.connection();

    let rent = connection
        .get_minimum_balance_for_rent_exemption(0)
        .await
        .map_err(|e| anyhow!("rent query failed: {}", e))?;

    let mut payload = vec![0u8; 900];
    rand::thread_rng().fill_bytes(&mut payload);
    let chunks = split_into_chunks(&payload, 300)?
        .into_iter()
        .map(|chunk| vec![memo(&payer, hex(chunk))])
        .collect::<Vec<_>>();

    let recipients: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
    let chunked = PacketTxs {
        chunks,
        lookup_table_accounts: recipients.clone(),
        final_instructions: recipients
            .iter()
            .map(|recipient| system_instruction::transfer(&payer, recipient, rent))
            .collect(),
        cleanup_instructions: Some(vec![memo(&payer, "cleanup packet 0".to_string())]),
        refund_claim_instructions: None,
    };
    let bare = PacketTxs {
        final_instructions: vec![memo(&payer, "packet 1".to_string())],
        ..PacketTxs::default()
    };

    let summary = ctx
        .submitter
        .submit_relay(RelayBatch {
            update_client: None,
            packets: vec![chunked, bare],
        })
        .await
        .context("relay batch failed")?;

    let (first, second) = match summary.packets.as_slice() {
        [first, second] => (first, second),
        other => return Err(anyhow!("expected 2 packet receipts, got {}", other.len())),
    };
    ensure!(first.chunks_uploaded == 3, "packet 0 uploaded {} chunks", first.chunks_uploaded);
    ensure!(first.lookup_table.is_some(), "packet 0 has no lookup table");
    ensure!(second.chunks_uploaded == 0, "packet 1 ran a chunk phase");
    ensure!(second.lookup_table_wait.is_none(), "packet 1 reports lookup table wait");

    for recipient in &recipients {
        let balance = connection
            .get_balance(recipient, ConfirmationLevel::Confirmed)
            .await
            .map_err(|e| anyhow!("balance query failed: {}", e))?;
        ensure!(balance == rent, "recipient {} holds {} lamports", recipient, balance);
    }

    info!(
        table = ?first.lookup_table,
        table_wait = ?first.lookup_table_wait,
        "concurrent packets scenario passed"
    );
    Ok(())
}
