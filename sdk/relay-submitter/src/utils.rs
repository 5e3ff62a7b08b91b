use crate::core::constants::{
    ADDRESS_LOOKUP_TABLE_PROGRAM_ID, GMP_RESULT_SEED, MISBEHAVIOUR_CHUNK_SEED, ROUTER_STATE_SEED,
};
use crate::error::Result;
use solana_sdk::pubkey::Pubkey;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

//=============================================================================
// PDA Derivation Helpers
//=============================================================================

/// Derive the router state PDA of the ICS26 router program
pub fn derive_router_state_pda(router_program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ROUTER_STATE_SEED], router_program_id)
}

/// Derive the PDA holding the result of a GMP call for `(client_id, sequence)`
pub fn derive_gmp_result_pda(program_id: &Pubkey, client_id: &str, sequence: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[GMP_RESULT_SEED, client_id.as_bytes(), &sequence.to_le_bytes()],
        program_id,
    )
}

/// Derive the account one misbehaviour chunk is uploaded to.
///
/// Keyed by submitter so concurrent submitters never collide.
pub fn derive_misbehaviour_chunk_pda(
    light_client_program_id: &Pubkey,
    submitter: &Pubkey,
    chunk_index: u8,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[MISBEHAVIOUR_CHUNK_SEED, submitter.as_ref(), &[chunk_index]],
        light_client_program_id,
    )
}

/// Derive the address of a lookup table created by `authority` at `recent_slot`
pub fn derive_lookup_table_address(authority: &Pubkey, recent_slot: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[authority.as_ref(), &recent_slot.to_le_bytes()],
        &ADDRESS_LOOKUP_TABLE_PROGRAM_ID,
    )
}

//=============================================================================
// Polling
//=============================================================================

/// Evaluate `condition` every `interval` until it holds or `timeout` elapses.
///
/// Returns `Ok(false)` on timeout. An error from `condition` ends the wait
/// immediately and is returned as is.
pub async fn wait_until<F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut condition: F,
) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    loop {
        if condition().await? {
            return Ok(true);
        }
        if start.elapsed() >= timeout {
            return Ok(false);
        }
        tokio::time::sleep(interval).await;
    }
}
