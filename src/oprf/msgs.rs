//! Payloads exchanged by the OPRF roles after the correlation setup.
//!
//! - `KEY`: the pseudorandom code key, one [Block].
//! - `CORRECTION`: entry count, entry length, then the entries back to back.

use crate::error::OprfError;
use anyhow::{bail, Context, Result};
use scuttlebutt::{AbstractChannel, Block};

/// Sends the code key.
pub fn send_key<C: AbstractChannel>(channel: &mut C, key: Block) -> Result<()> {
    channel
        .write_block(&key)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    channel
        .flush()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(())
}

/// Receives the code key.
pub fn receive_key<C: AbstractChannel>(channel: &mut C) -> Result<Block> {
    let key = channel
        .read_block()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(key)
}

/// Correction data: a list of equally sized byte strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorrectionMessage {
    entry_len: usize,
    count: usize,
    data: Vec<u8>,
}

impl CorrectionMessage {
    /// Packs `entries`, each of which must be `entry_len` bytes long.
    pub fn from_entries(entry_len: usize, entries: Vec<Vec<u8>>) -> Result<Self> {
        let count = entries.len();
        let mut data = Vec::with_capacity(count * entry_len);
        for e in entries {
            if e.len() != entry_len {
                bail!(OprfError::ParameterMismatch {
                    what: "correction entry length",
                    expected: entry_len,
                    actual: e.len(),
                });
            }
            data.extend_from_slice(&e);
        }

        Ok(Self {
            entry_len,
            count,
            data,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Length of every entry in bytes.
    pub fn entry_len(&self) -> usize {
        self.entry_len
    }

    /// Entry `k`.
    pub fn entry(&self, k: usize) -> &[u8] {
        &self.data[k * self.entry_len..(k + 1) * self.entry_len]
    }

    /// Writes the message and flushes. Returns the number of payload bytes.
    pub fn write_to<C: AbstractChannel>(&self, channel: &mut C) -> Result<usize> {
        channel
            .write_usize(self.count)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        channel
            .write_usize(self.entry_len)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        channel
            .write_bytes(&self.data)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        channel
            .flush()
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        Ok(self.data.len())
    }

    /// Reads a message of exactly `expected_count` entries of `expected_entry_len` bytes.
    ///
    /// The header is checked before the payload is read; any disagreement aborts with
    /// [OprfError::ParameterMismatch].
    pub fn read_from<C: AbstractChannel>(
        channel: &mut C,
        expected_count: usize,
        expected_entry_len: usize,
    ) -> Result<Self> {
        let count = channel
            .read_usize()
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        if count != expected_count {
            bail!(OprfError::ParameterMismatch {
                what: "correction entries",
                expected: expected_count,
                actual: count,
            });
        }

        let entry_len = channel
            .read_usize()
            .with_context(|| format!("@{}:{}", file!(), line!()))?;
        if entry_len != expected_entry_len {
            bail!(OprfError::ParameterMismatch {
                what: "correction entry length",
                expected: expected_entry_len,
                actual: entry_len,
            });
        }

        let mut data = vec![0u8; count * entry_len];
        channel
            .read_bytes(&mut data)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        Ok(Self {
            entry_len,
            count,
            data,
        })
    }
}
