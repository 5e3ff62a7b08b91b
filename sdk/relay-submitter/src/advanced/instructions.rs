use crate::core::constants::{
    ADDRESS_LOOKUP_TABLE_PROGRAM_ID, COMPUTE_BUDGET_PROGRAM_ID, CREATE_LOOKUP_TABLE_TAG,
    EXTEND_LOOKUP_TABLE_TAG, SET_COMPUTE_UNIT_LIMIT_TAG,
};
use crate::error::Result;
use crate::utils::{derive_lookup_table_address, derive_misbehaviour_chunk_pda};
use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

//=============================================================================
// Compute budget
//=============================================================================

/// `SetComputeUnitLimit`: `[0x02, units as u32 LE]`, no accounts.
pub fn set_compute_unit_limit(units: u32) -> Instruction {
    let mut data = Vec::with_capacity(5);
    data.push(SET_COMPUTE_UNIT_LIMIT_TAG);
    data.extend_from_slice(&units.to_le_bytes());

    Instruction {
        program_id: COMPUTE_BUDGET_PROGRAM_ID,
        accounts: vec![],
        data,
    }
}

//=============================================================================
// Address lookup tables
//=============================================================================

/// Build `CreateLookupTable` and return it with the derived table address.
///
/// Layout: `[0..4] tag 0 (u32 LE)`, `[4..12] recent_slot (u64 LE)`, `[12] bump`.
pub fn create_lookup_table(
    authority: &Pubkey,
    payer: &Pubkey,
    recent_slot: u64,
) -> (Instruction, Pubkey) {
    let (table, bump) = derive_lookup_table_address(authority, recent_slot);

    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&CREATE_LOOKUP_TABLE_TAG.to_le_bytes());
    data.extend_from_slice(&recent_slot.to_le_bytes());
    data.push(bump);

    let instruction = Instruction {
        program_id: ADDRESS_LOOKUP_TABLE_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(table, false),
            AccountMeta::new_readonly(*authority, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    };
    (instruction, table)
}

/// Build `ExtendLookupTable` appending `new_addresses`.
///
/// Layout: `[0..4] tag 2 (u32 LE)`, `[4..12] count (u64 LE)`, then 32 bytes per key.
pub fn extend_lookup_table(
    table: &Pubkey,
    authority: &Pubkey,
    payer: &Pubkey,
    new_addresses: &[Pubkey],
) -> Instruction {
    let mut data = Vec::with_capacity(12 + 32 * new_addresses.len());
    data.extend_from_slice(&EXTEND_LOOKUP_TABLE_TAG.to_le_bytes());
    data.extend_from_slice(&(new_addresses.len() as u64).to_le_bytes());
    for address in new_addresses {
        data.extend_from_slice(address.as_ref());
    }

    Instruction {
        program_id: ADDRESS_LOOKUP_TABLE_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*table, false),
            AccountMeta::new_readonly(*authority, true),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

//=============================================================================
// Light client misbehaviour
//=============================================================================

/// First 8 bytes of `sha256("global:<name>")`
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("global:{}", name).as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest[..8]);
    discriminator
}

fn anchor_data<T: BorshSerialize>(name: &str, args: &T) -> Result<Vec<u8>> {
    let mut data = anchor_discriminator(name).to_vec();
    args.serialize(&mut data)?;
    Ok(data)
}

#[derive(BorshSerialize)]
struct UploadMisbehaviourChunkArgs<'a> {
    client_id: &'a str,
    chunk_index: u8,
    chunk_data: &'a [u8],
}

#[derive(BorshSerialize)]
struct AssembleMisbehaviourArgs<'a> {
    client_id: &'a str,
    total_chunks: u8,
}

#[derive(BorshSerialize)]
struct CleanupMisbehaviourArgs<'a> {
    client_id: &'a str,
}

/// Accounts the light client reads when verifying a misbehaviour
#[derive(Debug, Clone, Copy)]
pub struct MisbehaviourAccounts {
    pub light_client_program_id: Pubkey,
    pub client_state: Pubkey,
    pub trusted_consensus_state_1: Pubkey,
    pub trusted_consensus_state_2: Pubkey,
}

pub fn upload_misbehaviour_chunk(
    accounts: &MisbehaviourAccounts,
    submitter: &Pubkey,
    client_id: &str,
    chunk_index: u8,
    chunk_data: &[u8],
) -> Result<Instruction> {
    let (chunk, _) =
        derive_misbehaviour_chunk_pda(&accounts.light_client_program_id, submitter, chunk_index);

    let data = anchor_data(
        "upload_misbehaviour_chunk",
        &UploadMisbehaviourChunkArgs {
            client_id,
            chunk_index,
            chunk_data,
        },
    )?;

    Ok(Instruction {
        program_id: accounts.light_client_program_id,
        accounts: vec![
            AccountMeta::new(chunk, false),
            AccountMeta::new_readonly(accounts.client_state, false),
            AccountMeta::new(*submitter, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    })
}

/// Assemble uploaded chunks and verify the misbehaviour.
///
/// Chunk accounts are appended as remaining accounts in index order.
pub fn assemble_and_submit_misbehaviour(
    accounts: &MisbehaviourAccounts,
    submitter: &Pubkey,
    client_id: &str,
    chunk_accounts: &[Pubkey],
) -> Result<Instruction> {
    let data = anchor_data(
        "assemble_and_submit_misbehaviour",
        &AssembleMisbehaviourArgs {
            client_id,
            total_chunks: chunk_accounts.len() as u8,
        },
    )?;

    let mut metas = vec![
        AccountMeta::new(accounts.client_state, false),
        AccountMeta::new_readonly(accounts.trusted_consensus_state_1, false),
        AccountMeta::new_readonly(accounts.trusted_consensus_state_2, false),
        AccountMeta::new(*submitter, true),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    metas.extend(chunk_accounts.iter().map(|chunk| AccountMeta::new(*chunk, false)));

    Ok(Instruction {
        program_id: accounts.light_client_program_id,
        accounts: metas,
        data,
    })
}

/// Close chunk accounts left behind by a failed submission
pub fn cleanup_incomplete_misbehaviour(
    accounts: &MisbehaviourAccounts,
    submitter: &Pubkey,
    client_id: &str,
    chunk_accounts: &[Pubkey],
) -> Result<Instruction> {
    let data = anchor_data(
        "cleanup_incomplete_misbehaviour",
        &CleanupMisbehaviourArgs { client_id },
    )?;

    let mut metas = vec![AccountMeta::new(*submitter, true)];
    metas.extend(chunk_accounts.iter().map(|chunk| AccountMeta::new(*chunk, false)));

    Ok(Instruction {
        program_id: accounts.light_client_program_id,
        accounts: metas,
        data,
    })
}
