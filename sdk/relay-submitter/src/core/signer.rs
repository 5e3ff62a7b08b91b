use crate::error::{Result, SubmitterError};
use solana_sdk::message::VersionedMessage;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;

/// Signer usable from spawned submission tasks.
pub type DynSigner = dyn Signer + Send + Sync;

/// Keys that must sign `message`, in signature order.
pub fn required_signer_keys(message: &VersionedMessage) -> &[Pubkey] {
    let keys = message.static_account_keys();
    let required = message.header().num_required_signatures as usize;
    &keys[..required.min(keys.len())]
}

/// Look up the signer owning `key`.
///
/// # Panics
/// When none of `signers` owns `key`. The caller handed over a transaction
/// whose signer set does not match the keys it provided, which is a misuse
/// rather than an environmental failure.
pub fn resolve_signer<'a>(signers: &[&'a DynSigner], key: &Pubkey) -> &'a DynSigner {
    signers
        .iter()
        .copied()
        .find(|signer| signer.pubkey() == *key)
        .unwrap_or_else(|| panic!("signer {} not found among provided keys", key))
}

/// Sign `tx` in place with whatever blockhash its message currently carries.
pub fn sign_transaction(tx: &mut VersionedTransaction, signers: &[&DynSigner]) -> Result<()> {
    if signers.is_empty() {
        return Err(SubmitterError::NoSigners);
    }

    let message_data = tx.message.serialize();
    let signatures = required_signer_keys(&tx.message)
        .iter()
        .map(|key| {
            resolve_signer(signers, key)
                .try_sign_message(&message_data)
                .map_err(|e| SubmitterError::Signing(e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    tx.signatures = signatures;
    Ok(())
}
