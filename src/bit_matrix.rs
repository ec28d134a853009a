//! Dense bit matrices with a word-parallel transpose.
//!
//! A [BitMatrix] stores `rows` rows of `cols` bits each. Every row is padded to a whole number of
//! bytes and bits are stored LSB first: bit `j` of a row lives in byte `j / 8` at position
//! `j % 8`. Padding bits are always zero, so two matrices with the same bits compare equal.
//!
//! The OPRF works on `n × ℓ` matrices (one row per batch position) but produces and consumes
//! them one column at a time. Instead of touching single bits, the protocol builds the
//! `ℓ × n` matrix row by row and calls [BitMatrix::transpose], which moves 8×8 bit tiles through
//! a single `u64`.

use crate::parallel::for_each_chunk_mut;

/// Bit matrix with byte-packed rows.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

/// Number of bytes needed to hold `bits` bits.
#[inline]
pub fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Clears the bits of `row` beyond `bits`.
#[inline]
pub(crate) fn clear_padding(row: &mut [u8], bits: usize) {
    let r = bits % 8;
    if r != 0 {
        if let Some(last) = row.last_mut() {
            *last &= (1u8 << r) - 1;
        }
    }
}

// Transposes an 8×8 bit tile where byte `k` of the word (little-endian) is row `k` and bit `m`
// of that byte is column `m`.
#[inline]
fn transpose8x8(mut x: u64) -> u64 {
    let t = (x ^ (x >> 7)) & 0x00aa_00aa_00aa_00aa;
    x ^= t ^ (t << 7);
    let t = (x ^ (x >> 14)) & 0x0000_cccc_0000_cccc;
    x ^= t ^ (t << 14);
    let t = (x ^ (x >> 28)) & 0x0000_0000_f0f0_f0f0;
    x ^= t ^ (t << 28);
    x
}

impl BitMatrix {
    /// Creates an all-zero `rows × cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0u8; rows * bytes_for_bits(cols)],
        }
    }

    /// Builds a matrix from byte-packed rows. Padding bits of each row are cleared.
    ///
    /// # Panics
    ///
    /// Panics if a row does not have exactly `⌈cols / 8⌉` bytes.
    pub fn from_rows<R: AsRef<[u8]>>(cols: usize, rows: &[R]) -> Self {
        let mut m = Self::new(rows.len(), cols);
        for (i, r) in rows.iter().enumerate() {
            m.set_row(i, r.as_ref());
        }
        m
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of bytes of one packed row.
    pub fn row_bytes(&self) -> usize {
        bytes_for_bits(self.cols)
    }

    /// Packed row `i`.
    pub fn row(&self, i: usize) -> &[u8] {
        assert!(i < self.rows, "row {} out of range ({} rows)", i, self.rows);
        let rb = self.row_bytes();
        &self.data[i * rb..(i + 1) * rb]
    }

    /// Replaces row `i` with the packed bits in `bits`.
    pub fn set_row(&mut self, i: usize, bits: &[u8]) {
        assert!(i < self.rows, "row {} out of range ({} rows)", i, self.rows);
        let rb = self.row_bytes();
        assert_eq!(bits.len(), rb, "row length mismatch");
        let row = &mut self.data[i * rb..(i + 1) * rb];
        row.copy_from_slice(bits);
        clear_padding(row, self.cols);
    }

    /// Iterates over the packed rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        // `chunks` panics on 0, empty rows are all skipped anyway.
        let rb = self.row_bytes().max(1);
        self.data.chunks(rb).take(self.rows)
    }

    /// Consumes the matrix and returns its packed rows.
    pub fn into_rows(self) -> Vec<Vec<u8>> {
        self.iter_rows().map(|r| r.to_vec()).collect()
    }

    /// Bit at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> bool {
        assert!(j < self.cols, "column {} out of range ({} cols)", j, self.cols);
        (self.row(i)[j / 8] >> (j % 8)) & 1 == 1
    }

    /// Sets the bit at `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, bit: bool) {
        assert!(i < self.rows, "row {} out of range ({} rows)", i, self.rows);
        assert!(j < self.cols, "column {} out of range ({} cols)", j, self.cols);
        let idx = i * self.row_bytes() + j / 8;
        let mask = 1u8 << (j % 8);
        if bit {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Column `j`, packed LSB first (`⌈rows / 8⌉` bytes).
    pub fn column(&self, j: usize) -> Vec<u8> {
        assert!(j < self.cols, "column {} out of range ({} cols)", j, self.cols);
        let mut out = vec![0u8; bytes_for_bits(self.rows)];
        let (byte, shift) = (j / 8, j % 8);
        for (i, row) in self.iter_rows().enumerate() {
            out[i / 8] |= ((row[byte] >> shift) & 1) << (i % 8);
        }
        out
    }

    /// Replaces column `j` with the packed bits in `bits` (`⌈rows / 8⌉` bytes).
    pub fn set_column(&mut self, j: usize, bits: &[u8]) {
        assert!(j < self.cols, "column {} out of range ({} cols)", j, self.cols);
        assert_eq!(bits.len(), bytes_for_bits(self.rows), "column length mismatch");
        let rb = self.row_bytes();
        let (byte, shift) = (j / 8, j % 8);
        for i in 0..self.rows {
            let bit = (bits[i / 8] >> (i % 8)) & 1;
            let b = &mut self.data[i * rb + byte];
            *b = (*b & !(1u8 << shift)) | (bit << shift);
        }
    }

    /// Returns the `cols × rows` transpose.
    pub fn transpose(&self) -> Self {
        self.transpose_par(1)
    }

    /// Same as [BitMatrix::transpose], spreading the output rows over `threads` workers.
    pub fn transpose_par(&self, threads: usize) -> Self {
        let mut out = Self::new(self.cols, self.rows);
        let in_rb = self.row_bytes();
        let out_rb = out.row_bytes();
        if self.rows == 0 || self.cols == 0 {
            return out;
        }

        let (rows, cols, data) = (self.rows, self.cols, &self.data);

        // Output rows `8 * bj .. 8 * bj + 8` are built from input byte column `bj`.
        for_each_chunk_mut(&mut out.data, 8 * out_rb, threads, |bj, chunk| {
            let out_rows = (cols - 8 * bj).min(8);
            for bi in 0..out_rb {
                let mut tile = [0u8; 8];
                let in_rows = (rows - 8 * bi).min(8);
                for (k, t) in tile.iter_mut().enumerate().take(in_rows) {
                    *t = data[(8 * bi + k) * in_rb + bj];
                }
                let tile = transpose8x8(u64::from_le_bytes(tile)).to_le_bytes();
                for (m, t) in tile.iter().enumerate().take(out_rows) {
                    chunk[m * out_rb + bi] = *t;
                }
            }
        });

        out
    }
}
