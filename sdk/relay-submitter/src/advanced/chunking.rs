use crate::core::constants::MAX_CHUNKS;
use crate::error::{Result, SubmitterError};

/// Split `payload` into consecutive slices of at most `chunk_size` bytes.
///
/// Yields `ceil(len / chunk_size)` chunks; concatenating them in index
/// order gives back `payload`.
pub fn split_into_chunks(payload: &[u8], chunk_size: usize) -> Result<Vec<&[u8]>> {
    if payload.is_empty() {
        return Err(SubmitterError::EmptyPayload);
    }
    if chunk_size == 0 {
        return Err(SubmitterError::Config("chunk_size must be positive".into()));
    }

    let chunks: Vec<&[u8]> = payload.chunks(chunk_size).collect();
    if chunks.len() > MAX_CHUNKS {
        return Err(SubmitterError::TooManyChunks {
            chunks: chunks.len(),
        });
    }
    Ok(chunks)
}

pub fn chunk_count(payload_len: usize, chunk_size: usize) -> usize {
    payload_len.div_ceil(chunk_size)
}

pub fn reassemble<T: AsRef<[u8]>>(chunks: &[T]) -> Vec<u8> {
    chunks.iter().flat_map(|c| c.as_ref().iter().copied()).collect()
}
