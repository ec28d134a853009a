//! Utility functions for creating position-aligned inputs for the OPRF.
//!
//! The receiver holds `inputs[i]` at position `i`, the sender tests `candidates[i]` at the same
//! position. They agree exactly on the returned common positions.

use anyhow::{bail, Result};
use itertools::Itertools;
use rand::seq::index::sample;
use rand::{CryptoRng, Rng};

fn random_input<RNG: CryptoRng + Rng>(input_len: usize, rng: &mut RNG) -> Vec<u8> {
    (0..input_len).map(|_| rng.gen()).collect()
}

/// Create receiver inputs and sender candidates of `input_len` random bytes that are equal at
/// exactly `common_size` positions.
///
/// Return `(inputs, candidates, common_positions)`, positions sorted.
pub fn create_aligned_inputs<RNG>(
    batch_size: usize,
    common_size: usize,
    input_len: usize,
    rng: &mut RNG,
) -> Result<(Vec<Vec<u8>>, Vec<Vec<u8>>, Vec<usize>)>
where
    RNG: CryptoRng + Rng,
{
    if batch_size < common_size {
        bail!(
            "batch_size (={}) < common_size (={}) @{}:{}",
            batch_size,
            common_size,
            file!(),
            line!()
        );
    }

    if input_len == 0 && batch_size > common_size {
        bail!(
            "input_len (={}) leaves no room for distinct candidates @{}:{}",
            input_len,
            file!(),
            line!()
        );
    }

    let common = sample(rng, batch_size, common_size)
        .into_iter()
        .sorted()
        .collect_vec();

    let inputs = (0..batch_size)
        .map(|_| random_input(input_len, rng))
        .collect_vec();

    let mut candidates = inputs.clone();
    let mut common_iter = common.iter().peekable();
    for (i, c) in candidates.iter_mut().enumerate() {
        if common_iter.peek() == Some(&&i) {
            common_iter.next();
            continue;
        }

        while *c == inputs[i] {
            *c = random_input(input_len, rng);
        }
    }

    Ok((inputs, candidates, common))
}

/// Same as [create_aligned_inputs] with a random number of common positions.
pub fn create_aligned_inputs_random<RNG>(
    batch_size: usize,
    input_len: usize,
    rng: &mut RNG,
) -> Result<(Vec<Vec<u8>>, Vec<Vec<u8>>, Vec<usize>)>
where
    RNG: CryptoRng + Rng,
{
    let common_size = rng.gen_range(0..=batch_size);

    create_aligned_inputs(batch_size, common_size, input_len, rng)
}
