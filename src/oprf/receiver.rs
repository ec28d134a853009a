use super::msgs::{send_key, CorrectionMessage};
use super::{check_batch_size, session_codeword_bits, OprfConfig, OprfVariant, ReceiverOutput};
use crate::bit_matrix::{bytes_for_bits, BitMatrix};
use crate::correlation::{CorrelationForReceiver, ReceiverSeed};
use crate::error::OprfError;
use crate::hash_utils::hash_position;
use crate::parallel::map_indices;
use crate::prc::PseudorandomCode;
use anyhow::{bail, Context, Error, Result};
use ocelot::oprf::ObliviousPrf;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use scuttlebutt::utils::xor_inplace;
use scuttlebutt::{AbstractChannel, AesRng, Block, SemiHonest};
use tracing::debug;

/// OPRF receiver session, ready to evaluate one batch.
pub struct Receiver {
    config: OprfConfig,
    max_batch_size: usize,
    codeword_bits: usize,
    seeds: Vec<(ReceiverSeed, ReceiverSeed)>,
}

impl Receiver {
    /// Runs the correlation provider for a session able to evaluate up to `max_batch_size`
    /// inputs, sizing the code for `max(max_batch_size, max_future_evaluations)`.
    pub fn setup<C, RNG, P>(
        channel: &mut C,
        rng: &mut RNG,
        config: OprfConfig,
        max_batch_size: usize,
        max_future_evaluations: usize,
        mut provider: P,
    ) -> Result<Self, Error>
    where
        C: AbstractChannel,
        RNG: CryptoRng + Rng,
        P: CorrelationForReceiver,
    {
        let codeword_bits = session_codeword_bits(max_batch_size, max_future_evaluations)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        let seeds = provider
            .produce(channel, rng, codeword_bits)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        if seeds.len() != codeword_bits {
            bail!(OprfError::ParameterMismatch {
                what: "correlated seed pairs",
                expected: codeword_bits,
                actual: seeds.len(),
            });
        }

        debug!(codeword_bits, max_batch_size, "receiver setup done");

        Ok(Self {
            config,
            max_batch_size,
            codeword_bits,
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

    /// Commits to `inputs` (position `i` is `inputs[i]`), sends `KEY` and `CORRECTION`, and
    /// returns the outputs.
    pub fn evaluate<C, RNG, I>(
        self,
        channel: &mut C,
        inputs: &[I],
        rng: &mut RNG,
    ) -> Result<ReceiverOutput, Error>
    where
        C: AbstractChannel,
        RNG: CryptoRng + Rng,
        I: AsRef<[u8]> + Sync,
    {
        check_batch_size(inputs.len(), self.max_batch_size)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        let Self {
            config,
            codeword_bits,
            seeds,
            ..
        } = self;
        let OprfConfig { variant, threads } = config;
        let n = inputs.len();
        let col_bytes = bytes_for_bits(n);

        let key: Block = rng.gen();
        send_key(channel, key).with_context(|| format!("@{}:{}", file!(), line!()))?;
        let code = PseudorandomCode::new(key, codeword_bits);

        // C is n x ℓ, one codeword per position; its transpose has one row per column.
        let codewords = map_indices(n, threads, |i| Ok(code.encode(inputs[i].as_ref())))?;
        let ct = BitMatrix::from_rows(codeword_bits, &codewords).transpose_par(threads);
        drop(codewords);

        let fresh_seeds: Vec<Block> = match variant {
            OprfVariant::Original => (0..codeword_bits).map(|_| rng.gen::<Block>()).collect(),
            OprfVariant::Optimized => Vec::new(),
        };

        let columns = map_indices(codeword_bits, threads, |j| {
            let (k0, k1) = &seeds[j];
            let column = ct.row(j);
            let res = match variant {
                OprfVariant::Original => {
                    let mut t0 = vec![0u8; col_bytes];
                    AesRng::from_seed(fresh_seeds[j]).fill_bytes(&mut t0);

                    let mut m0 = k0.expand(col_bytes);
                    xor_inplace(&mut m0, &t0);

                    let mut m1 = k1.expand(col_bytes);
                    xor_inplace(&mut m1, &t0);
                    xor_inplace(&mut m1, column);

                    (t0, vec![m0, m1])
                }
                OprfVariant::Optimized => {
                    let t0 = k0.expand(col_bytes);

                    let mut u = k1.expand(col_bytes);
                    xor_inplace(&mut u, &t0);
                    xor_inplace(&mut u, column);

                    (t0, vec![u])
                }
            };
            Ok(res)
        })?;
        drop(ct);

        let mut tt = BitMatrix::new(codeword_bits, n);
        let mut entries = Vec::with_capacity(codeword_bits * variant.entries_per_column());
        for (j, (t0, msgs)) in columns.into_iter().enumerate() {
            tt.set_row(j, &t0);
            entries.extend(msgs);
        }

        let correction = CorrectionMessage::from_entries(col_bytes, entries)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        let sent = correction
            .write_to(channel)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        debug!(?variant, n, codeword_bits, sent, "receiver sent correction");

        let t = tt.transpose_par(threads);
        let output_len = bytes_for_bits(codeword_bits);
        let outputs = map_indices(n, threads, |i| Ok(hash_position(i, t.row(i), output_len)))?;

        let inputs = inputs.iter().map(|x| x.as_ref().to_vec()).collect();

        Ok(ReceiverOutput::new(inputs, outputs, output_len))
    }
}

impl ObliviousPrf for Receiver {
    type Seed = Block;
    type Input = Vec<u8>;
    type Output = Vec<u8>;
}

impl SemiHonest for Receiver {}
