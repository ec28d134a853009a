use sha2::{Digest, Sha256};

const DIGEST_BYTES: usize = 32;

// H: N x {0,1}^* -> {0,1}^{8 * out_len}
//
// SHA-256 in counter mode over (counter, index, row). The batch index is part of every block so
// that a row can't be replayed at another position.
#[inline]
pub fn hash_position(index: usize, row: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(out_len.div_ceil(DIGEST_BYTES) * DIGEST_BYTES);
    let mut counter: u32 = 0;
    while out.len() < out_len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_le_bytes());
        hasher.update((index as u64).to_le_bytes());
        hasher.update(row);
        out.extend_from_slice(hasher.finalize().as_slice());
        counter += 1;
    }
    out.truncate(out_len);
    out
}
