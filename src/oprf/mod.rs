//! Batched, related-key oblivious PRF (BaRK-OPRF) on top of correlated seeds.
//!
//! Based on Kolesnikov, Kumaresan, Rosulek and Trieu, "Efficient Batched Oblivious PRF with
//! Applications to Private Set Intersection" (<https://eprint.iacr.org/2016/799>).
//!
//! The [Receiver] holds a batch of inputs $`x_0, \dots, x_{n-1}`$ and learns one opaque output per
//! position. The [Sender] learns nothing about the inputs but can evaluate the PRF of any
//! candidate *at a given position* through [SenderOutput::evaluate]. With $`C`$ the codeword
//! matrix, $`T`$ the receiver's matrix and $`Q`$ the sender's corrected matrix, every row satisfies
//!
//! ```math
//! Q_i \oplus (C(x_i) \wedge \Delta) = T_i
//! ```
//!
//! so `evaluate(i, x_i)` always equals the receiver's output `i`.
//!
//! Two variants produce the correction data:
//!
//! - [OprfVariant::Original]: the receiver draws $`T`$ at random and sends both masked columns
//!   $`(G(K^0_j) \oplus T_j, G(K^1_j) \oplus T_j \oplus C^\top_j)`$ for every column.
//! - [OprfVariant::Optimized]: the receiver sets $`T_j = G(K^0_j)`$ and sends a single
//!   $`U_j = G(K^1_j) \oplus T_j \oplus C^\top_j`$, halving the traffic.
//!
//! Both roles are sessions: `setup` runs the correlation provider and returns the session,
//! `evaluate` consumes it. A session can't be evaluated twice.

use crate::error::OprfError;
use crate::prc::codeword_bits;
use anyhow::{bail, Result};

pub mod msgs;
mod output;
pub use output::{ReceiverOutput, SenderOutput};
mod receiver;
pub use receiver::Receiver;
mod sender;
pub use sender::Sender;

/// How correction data is built and consumed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OprfVariant {
    /// Two masked messages per column.
    Original,
    /// One correction per column.
    #[default]
    Optimized,
}

impl OprfVariant {
    /// Number of `CORRECTION` entries sent for every codeword column.
    pub fn entries_per_column(&self) -> usize {
        match self {
            OprfVariant::Original => 2,
            OprfVariant::Optimized => 1,
        }
    }
}

/// Options shared by both roles. Both parties must use the same variant.
#[derive(Clone, Copy, Debug)]
pub struct OprfConfig {
    /// Correction variant.
    pub variant: OprfVariant,
    /// Worker threads used for encoding, per-column work and transposes. `1` runs everything on the
    /// calling thread.
    pub threads: usize,
}

impl Default for OprfConfig {
    fn default() -> Self {
        Self {
            variant: OprfVariant::default(),
            threads: 1,
        }
    }
}

impl OprfConfig {
    /// Single-threaded configuration for `variant`.
    pub fn new(variant: OprfVariant) -> Self {
        Self {
            variant,
            threads: 1,
        }
    }

    /// Sets the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}

/// Codeword length for a session able to evaluate `max(max_batch_size, max_future_evaluations)`
/// inputs.
pub fn session_codeword_bits(max_batch_size: usize, max_future_evaluations: usize) -> Result<usize> {
    codeword_bits(max_batch_size.max(max_future_evaluations))
}

pub(crate) fn check_batch_size(batch_size: usize, max_batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        bail!(OprfError::EmptyBatch);
    }
    if batch_size > max_batch_size {
        bail!(OprfError::BatchSizeExceeded {
            batch_size,
            max_batch_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
