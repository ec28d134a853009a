use crate::correlation::Delta;
use crate::error::OprfError;
use crate::hash_utils::hash_position;
use crate::prc::PseudorandomCode;
use anyhow::{bail, Result};
use scuttlebutt::utils::{and_inplace, xor_inplace};
use std::fmt;

/// What the receiver learns: one opaque output per batch position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiverOutput {
    inputs: Vec<Vec<u8>>,
    outputs: Vec<Vec<u8>>,
    output_len: usize,
}

impl ReceiverOutput {
    pub(crate) fn new(inputs: Vec<Vec<u8>>, outputs: Vec<Vec<u8>>, output_len: usize) -> Self {
        debug_assert_eq!(inputs.len(), outputs.len());
        Self {
            inputs,
            outputs,
            output_len,
        }
    }

    /// Output for position `i`.
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        self.outputs.get(i).map(Vec::as_slice)
    }

    /// Input committed at position `i`.
    pub fn input(&self, i: usize) -> Option<&[u8]> {
        self.inputs.get(i).map(Vec::as_slice)
    }

    /// All inputs in position order.
    pub fn inputs(&self) -> &[Vec<u8>] {
        &self.inputs
    }

    /// `(input, output)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.inputs
            .iter()
            .zip(self.outputs.iter())
            .map(|(x, y)| (x.as_slice(), y.as_slice()))
    }

    /// Length of every output in bytes, `⌈ℓ / 8⌉`.
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Number of positions.
    pub fn batch_size(&self) -> usize {
        self.outputs.len()
    }
}

/// What the sender learns: enough to evaluate the PRF of a candidate at a given position.
#[derive(Clone)]
pub struct SenderOutput {
    delta: Delta,
    rows: Vec<Vec<u8>>,
    code: PseudorandomCode,
    output_len: usize,
}

impl SenderOutput {
    pub(crate) fn new(delta: Delta, rows: Vec<Vec<u8>>, code: PseudorandomCode) -> Self {
        let output_len = code.codeword_bytes();
        Self {
            delta,
            rows,
            code,
            output_len,
        }
    }

    /// PRF of `candidate` at position `i`.
    ///
    /// Equal to the receiver's output `i` iff `candidate` is the receiver's input at `i`, except
    /// with negligible probability.
    pub fn evaluate(&self, i: usize, candidate: &[u8]) -> Result<Vec<u8>> {
        let Some(row) = self.rows.get(i) else {
            bail!(OprfError::PositionOutOfRange {
                index: i,
                batch_size: self.rows.len(),
            });
        };

        let mut c = self.code.encode(candidate);
        and_inplace(&mut c, self.delta.as_bytes());
        xor_inplace(&mut c, row);

        Ok(hash_position(i, &c, self.output_len))
    }

    /// Length of every output in bytes, `⌈ℓ / 8⌉`.
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Number of positions.
    pub fn batch_size(&self) -> usize {
        self.rows.len()
    }

    /// The sender's private $`\Delta`$.
    pub fn delta(&self) -> &Delta {
        &self.delta
    }

    /// The code instance agreed on with the receiver.
    pub fn code(&self) -> &PseudorandomCode {
        &self.code
    }

    /// Corrected row $`Q_i`$.
    pub fn row(&self, i: usize) -> Option<&[u8]> {
        self.rows.get(i).map(Vec::as_slice)
    }
}

impl fmt::Debug for SenderOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderOutput")
            .field("delta", &self.delta)
            .field("batch_size", &self.rows.len())
            .field("codeword_bits", &self.code.codeword_bits())
            .finish()
    }
}
