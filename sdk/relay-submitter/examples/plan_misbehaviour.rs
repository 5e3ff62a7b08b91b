// Example: planning a chunked misbehaviour submission
//
// Shows how a payload is split and which accounts the assembly
// transaction will reference, without touching a cluster.

use ibc_solana_submitter::advanced::chunking::split_into_chunks;
use ibc_solana_submitter::advanced::instructions::{
    assemble_and_submit_misbehaviour, upload_misbehaviour_chunk, MisbehaviourAccounts,
};
use ibc_solana_submitter::core::constants::CHUNK_SIZE;
use ibc_solana_submitter::derive_misbehaviour_chunk_pda;
use solana_sdk::pubkey::Pubkey;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let submitter = Pubkey::new_unique(); // Replace with the relayer's payer
    let accounts = MisbehaviourAccounts {
        light_client_program_id: Pubkey::new_unique(),
        client_state: Pubkey::new_unique(),
        trusted_consensus_state_1: Pubkey::new_unique(),
        trusted_consensus_state_2: Pubkey::new_unique(),
    };
    let misbehaviour = rand::random::<[u8; 32]>().repeat(160);

    let chunks = split_into_chunks(&misbehaviour, CHUNK_SIZE)?;
    println!("{} bytes -> {} chunks", misbehaviour.len(), chunks.len());

    let mut chunk_accounts = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let index = index as u8;
        let (pda, _) =
            derive_misbehaviour_chunk_pda(&accounts.light_client_program_id, &submitter, index);
        let ix = upload_misbehaviour_chunk(&accounts, &submitter, "07-tendermint-0", index, chunk)?;
        println!("  chunk {}: {} ({} bytes of instruction data)", index, pda, ix.data.len());
        chunk_accounts.push(pda);
    }

    let assemble = assemble_and_submit_misbehaviour(
        &accounts,
        &submitter,
        "07-tendermint-0",
        &chunk_accounts,
    )?;
    println!("assembly references {} accounts", assemble.accounts.len());

    Ok(())
}
