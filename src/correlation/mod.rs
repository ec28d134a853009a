//! Correlated seeds between the two OPRF roles.
//!
//! For every codeword column $`j \in [0, \ell)`$ the OPRF receiver holds two independent seeds
//! $`(K^0_j, K^1_j)`$, while the OPRF sender holds a private bit string $`\Delta \in \{0,1\}^\ell`$
//! and exactly one seed per column:
//!
//! ```math
//! K_j = K^{\Delta_j}_j
//! ```
//!
//! The protocol never checks this equality; it is the job of the provider. Seeds are wrapped in
//! per-role opaque types whose only operation is expansion with the PRG, so a seed can't be fed
//! into an unrelated computation by accident.
//!
//! Providers:
//!
//! - [OtCorrelationForReceiver] / [OtCorrelationForSender]: any semi-honest 1-out-of-2 OT from
//!   [ocelot], the receiver acting as OT sender of random seed pairs and the sender acting as OT
//!   receiver with choice bits $`\Delta`$.
//! - [DealerCorrelation]: both roles expand a shared dealer seed, no communication. Useful for tests and
//!   benchmarks of the OPRF itself.

use crate::bit_matrix::{bytes_for_bits, clear_padding};
use crate::error::OprfError;
use anyhow::{bail, Error, Result};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use scuttlebutt::channel::AbstractChannel;
use scuttlebutt::{AesRng, Block};
use std::fmt;

pub mod dealer;
pub use dealer::DealerCorrelation;
pub mod ot_based;
pub use ot_based::{OtCorrelationForReceiver, OtCorrelationForSender};

/// Seed held by the OPRF receiver (one of a pair per column).
#[derive(Clone)]
pub struct ReceiverSeed(Block);

/// Seed held by the OPRF sender (the one selected by $`\Delta_j`$).
#[derive(Clone)]
pub struct SenderSeed(Block);

macro_rules! impl_seed {
    ($t:ident) => {
        impl $t {
            /// Wraps key material produced by a correlation provider.
            pub fn new(key: Block) -> Self {
                Self(key)
            }

            /// Expands the seed into `nbytes` pseudorandom bytes.
            pub fn expand(&self, nbytes: usize) -> Vec<u8> {
                let mut out = vec![0u8; nbytes];
                AesRng::from_seed(self.0).fill_bytes(&mut out);
                out
            }
        }

        impl fmt::Debug for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(..)", stringify!($t))
            }
        }
    };
}

impl_seed!(ReceiverSeed);
impl_seed!(SenderSeed);

/// The OPRF sender's private bit string, packed LSB first.
#[derive(Clone, PartialEq, Eq)]
pub struct Delta {
    bits: usize,
    bytes: Vec<u8>,
}

impl Delta {
    /// Samples a uniformly random $`\Delta`$ of `bits` bits.
    pub fn random<RNG: CryptoRng + Rng>(rng: &mut RNG, bits: usize) -> Self {
        let mut bytes = vec![0u8; bytes_for_bits(bits)];
        rng.fill_bytes(&mut bytes);
        clear_padding(&mut bytes, bits);
        Self { bits, bytes }
    }

    /// Builds $`\Delta`$ from packed bytes. Padding bits are cleared.
    pub fn from_bytes(mut bytes: Vec<u8>, bits: usize) -> Result<Self> {
        if bytes.len() != bytes_for_bits(bits) {
            bail!(OprfError::ParameterMismatch {
                what: "delta bytes",
                expected: bytes_for_bits(bits),
                actual: bytes.len(),
            });
        }
        clear_padding(&mut bytes, bits);
        Ok(Self { bits, bytes })
    }

    /// Builds $`\Delta`$ from individual bits.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut bytes = vec![0u8; bytes_for_bits(bits.len())];
        for (j, &b) in bits.iter().enumerate() {
            bytes[j / 8] |= (b as u8) << (j % 8);
        }
        Self {
            bits: bits.len(),
            bytes,
        }
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits
    }

    /// Whether $`\Delta`$ has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Bit `j`.
    pub fn bit(&self, j: usize) -> bool {
        assert!(j < self.bits, "bit {} out of range ({} bits)", j, self.bits);
        (self.bytes[j / 8] >> (j % 8)) & 1 == 1
    }

    /// All bits, in column order. These are the OT choice bits.
    pub fn to_bits(&self) -> Vec<bool> {
        (0..self.bits).map(|j| self.bit(j)).collect()
    }

    /// Packed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delta({} bits)", self.bits)
    }
}

/// Correlation provider for the OPRF receiver.
pub trait CorrelationForReceiver {
    /// Produce `count` seed pairs $`(K^0_j, K^1_j)`$.
    fn produce<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        count: usize,
    ) -> Result<Vec<(ReceiverSeed, ReceiverSeed)>, Error>;
}

/// Correlation provider for the OPRF sender.
pub trait CorrelationForSender {
    /// Obtain $`K^{\Delta_j}_j`$ for every bit of `delta`.
    fn consume<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut RNG,
        delta: &Delta,
    ) -> Result<Vec<SenderSeed>, Error>;
}
