//! Pseudorandom code.
//!
//! A pseudorandom code maps arbitrary byte strings to `ℓ`-bit codewords. It is public: the key is
//! chosen by the OPRF receiver and sent in the clear. What matters is that, for the number of
//! inputs the run was sized for, any two distinct inputs produce codewords at Hamming distance at
//! least [MIN_DISTANCE], except with probability `2^-STAT_SECURITY`.
//!
//! The codeword length comes from [codeword_bits], a table indexed by `⌈log2(capacity)⌉`.
//! Entry `k` is the smallest multiple of 8 such that
//!
//! ```math
//! 2^{2k} \cdot \Pr[\mathrm{Bin}(\ell, 1/2) < d] \le 2^{-\sigma}, \quad d = 128, \ \sigma = 40
//! ```
//!
//! i.e. a union bound over all pairs of `2^k` uniformly random codewords.

use crate::bit_matrix::{bytes_for_bits, clear_padding};
use crate::error::OprfError;
use anyhow::{bail, Result};
use rand::{RngCore, SeedableRng};
use scuttlebutt::{AesRng, Block};
use sha2::{Digest, Sha256};

/// Minimum pairwise Hamming distance guaranteed by [CODEWORD_BITS_TABLE].
pub const MIN_DISTANCE: usize = 128;

/// Statistical security parameter of [CODEWORD_BITS_TABLE].
pub const STAT_SECURITY: usize = 40;

/// Codeword bit length for capacities up to `2^k`, indexed by `k`.
pub const CODEWORD_BITS_TABLE: [usize; 33] = [
    400, 400, 408, 408, 416, 416, 424, 424, 432, 432, // 2^0 .. 2^9
    440, 440, 448, 448, 456, 456, 464, 464, 472, 472, // 2^10 .. 2^19
    480, 480, 488, 488, 488, 496, 496, 504, 504, 512, // 2^20 .. 2^29
    512, 512, 520, // 2^30 .. 2^32
];

/// Largest capacity covered by [CODEWORD_BITS_TABLE].
pub const MAX_CAPACITY: usize = 1 << (CODEWORD_BITS_TABLE.len() - 1);

/// Codeword bit length needed to evaluate `capacity` distinct inputs.
///
/// Both parties compute this independently, so it only depends on `capacity`.
pub fn codeword_bits(capacity: usize) -> Result<usize> {
    if capacity > MAX_CAPACITY {
        bail!(OprfError::CapacityExceeded {
            requested: capacity,
            max: MAX_CAPACITY,
        });
    }

    let log = if capacity <= 1 {
        0
    } else {
        (usize::BITS - (capacity - 1).leading_zeros()) as usize
    };

    Ok(CODEWORD_BITS_TABLE[log])
}

/// Keyed pseudorandom code producing `codeword_bits`-bit codewords.
#[derive(Clone, Debug)]
pub struct PseudorandomCode {
    key: Block,
    codeword_bits: usize,
}

impl PseudorandomCode {
    /// Creates the code instance for `key`.
    pub fn new(key: Block, codeword_bits: usize) -> Self {
        Self { key, codeword_bits }
    }

    /// The public code key.
    pub fn key(&self) -> Block {
        self.key
    }

    /// Codeword length in bits.
    pub fn codeword_bits(&self) -> usize {
        self.codeword_bits
    }

    /// Codeword length in bytes.
    pub fn codeword_bytes(&self) -> usize {
        bytes_for_bits(self.codeword_bits)
    }

    /// Encodes `input` into a packed codeword; padding bits are zero.
    pub fn encode(&self, input: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; self.codeword_bytes()];
        self.encode_into(input, &mut out);
        out
    }

    /// Encodes `input` into `out`, which must hold [PseudorandomCode::codeword_bytes] bytes.
    pub fn encode_into(&self, input: &[u8], out: &mut [u8]) {
        assert_eq!(out.len(), self.codeword_bytes(), "codeword length mismatch");

        let mut hasher = Sha256::new();
        hasher.update(self.key.as_ref());
        hasher.update(input);
        let digest = hasher.finalize();

        let mut seed = [0u8; 16];
        seed.copy_from_slice(&digest[..16]);

        AesRng::from_seed(Block::from(seed)).fill_bytes(out);
        clear_padding(out, self.codeword_bits);
    }
}
