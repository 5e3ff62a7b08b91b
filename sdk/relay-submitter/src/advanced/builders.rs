use crate::error::{Result, SubmitterError};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::{v0, AddressLookupTableAccount, Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

fn with_placeholder_signatures(message: VersionedMessage) -> VersionedTransaction {
    let required = message.header().num_required_signatures as usize;
    VersionedTransaction {
        signatures: vec![Signature::default(); required],
        message,
    }
}

/// Unsigned legacy transaction; the blockhash is filled in at broadcast time.
pub fn unsigned_transaction(instructions: &[Instruction], payer: &Pubkey) -> VersionedTransaction {
    let message = Message::new(instructions, Some(payer));
    with_placeholder_signatures(VersionedMessage::Legacy(message))
}

/// Unsigned v0 transaction resolving accounts through `lookup_tables`.
pub fn unsigned_v0_transaction(
    instructions: &[Instruction],
    payer: &Pubkey,
    lookup_tables: &[AddressLookupTableAccount],
) -> Result<VersionedTransaction> {
    let message = v0::Message::try_compile(payer, instructions, lookup_tables, Hash::default())
        .map_err(|e| SubmitterError::Compile(e.to_string()))?;
    Ok(with_placeholder_signatures(VersionedMessage::V0(message)))
}

/// Legacy unless a lookup table is supplied
pub fn unsigned_transaction_for(
    instructions: &[Instruction],
    payer: &Pubkey,
    lookup_table: Option<&AddressLookupTableAccount>,
) -> Result<VersionedTransaction> {
    match lookup_table {
        Some(table) => unsigned_v0_transaction(instructions, payer, std::slice::from_ref(table)),
        None => Ok(unsigned_transaction(instructions, payer)),
    }
}
