use super::msgs::{receive_key, CorrectionMessage};
use super::{check_batch_size, session_codeword_bits, OprfConfig, OprfVariant, SenderOutput};
use crate::bit_matrix::{bytes_for_bits, BitMatrix};
use crate::correlation::{CorrelationForSender, Delta, SenderSeed};
use crate::error::OprfError;
use crate::parallel::map_indices;
use crate::prc::PseudorandomCode;
use anyhow::{bail, Context, Error, Result};
use ocelot::oprf::ObliviousPrf;
use rand::{CryptoRng, Rng};
use scuttlebutt::utils::xor_inplace;
use scuttlebutt::{AbstractChannel, Block, SemiHonest};
use tracing::debug;

/// OPRF sender session, ready to evaluate one batch.
pub struct Sender {
    config: OprfConfig,
    max_batch_size: usize,
    codeword_bits: usize,
    delta: Delta,
    seeds: Vec<SenderSeed>,
}

impl Sender {
    /// Draws a fresh $`\Delta`$ and runs the correlation provider. Parameters must match the
    /// receiver's.
    pub fn setup<C, RNG, P>(
        channel: &mut C,
        rng: &mut RNG,
        config: OprfConfig,
        max_batch_size: usize,
        max_future_evaluations: usize,
        provider: P,
    ) -> Result<Self, Error>
    where
        C: AbstractChannel,
        RNG: CryptoRng + Rng,
        P: CorrelationForSender,
    {
        let codeword_bits = session_codeword_bits(max_batch_size, max_future_evaluations)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        let delta = Delta::random(rng, codeword_bits);

        Self::setup_with_delta(
            channel,
            rng,
            config,
            max_batch_size,
            max_future_evaluations,
            delta,
            provider,
        )
    }

    /// Same as [Sender::setup] with a caller-chosen $`\Delta`$, which must have `ℓ` bits.
    ///
    /// Never reuse a $`\Delta`$ across sessions.
    pub fn setup_with_delta<C, RNG, P>(
        channel: &mut C,
        rng: &mut RNG,
        config: OprfConfig,
        max_batch_size: usize,
        max_future_evaluations: usize,
        delta: Delta,
        mut provider: P,
    ) -> Result<Self, Error>
    where
        C: AbstractChannel,
        RNG: CryptoRng + Rng,
        P: CorrelationForSender,
    {
        let codeword_bits = session_codeword_bits(max_batch_size, max_future_evaluations)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        if delta.len() != codeword_bits {
            bail!(OprfError::ParameterMismatch {
                what: "delta bits",
                expected: codeword_bits,
                actual: delta.len(),
            });
        }

        let seeds = provider
            .consume(channel, rng, &delta)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        if seeds.len() != codeword_bits {
            bail!(OprfError::ParameterMismatch {
                what: "correlated seeds",
                expected: codeword_bits,
                actual: seeds.len(),
            });
        }

        debug!(codeword_bits, max_batch_size, "sender setup done");

        Ok(Self {
            config,
            max_batch_size,
            codeword_bits,
            delta,
            seeds,
        })
    }

    /// Codeword length `ℓ` of this session.
    pub fn codeword_bits(&self) -> usize {
        self.codeword_bits
    }

    /// Largest batch this session accepts.
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Configuration of this session.
    pub fn config(&self) -> &OprfConfig {
        &self.config
    }

    /// Receives `KEY` and `CORRECTION` for a batch of `batch_size` positions and returns the
    /// position-bound evaluator.
    pub fn evaluate<C>(self, channel: &mut C, batch_size: usize) -> Result<SenderOutput, Error>
    where
        C: AbstractChannel,
    {
        check_batch_size(batch_size, self.max_batch_size)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        let Self {
            config,
            codeword_bits,
            delta,
            seeds,
            ..
        } = self;
        let OprfConfig { variant, threads } = config;
        let n = batch_size;
        let col_bytes = bytes_for_bits(n);

        let key = receive_key(channel).with_context(|| format!("@{}:{}", file!(), line!()))?;
        let code = PseudorandomCode::new(key, codeword_bits);

        let correction = CorrectionMessage::read_from(
            channel,
            codeword_bits * variant.entries_per_column(),
            col_bytes,
        )
        .with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!(?variant, n, codeword_bits, "sender received correction");

        let columns = map_indices(codeword_bits, threads, |j| {
            let mut q = seeds[j].expand(col_bytes);
            let bit = delta.bit(j);
            match variant {
                OprfVariant::Original => {
                    xor_inplace(&mut q, correction.entry(2 * j + bit as usize));
                }
                OprfVariant::Optimized => {
                    if bit {
                        xor_inplace(&mut q, correction.entry(j));
                    }
                }
            }
            Ok(q)
        })?;
        drop(correction);

        let q = BitMatrix::from_rows(n, &columns).transpose_par(threads);

        Ok(SenderOutput::new(delta, q.into_rows(), code))
    }
}

impl ObliviousPrf for Sender {
    type Seed = Block;
    type Input = Vec<u8>;
    type Output = Vec<u8>;
}

impl SemiHonest for Sender {}
