//! Canonical Huffman decoding.
//!
//! bzip2 multiplexes up to six tables, switching which one decodes the next
//! 50 MTF symbols via the selector stream. Each table is built from a
//! per-symbol code-length vector into `base`/`limit`/`perm` arrays that
//! support a length-limited canonical decode.

use bz_core::error::{DecodeError, Result};

/// Symbols decoded before the selector rotates to the next table.
pub const SYMBOLS_PER_GROUP: usize = 50;

/// Format invariant: no code length exceeds this.
pub const MAX_CODE_LEN: usize = 20;

/// A single group's canonical decode table.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Minimum code length present in this table.
    pub min_len: u32,
    /// Maximum code length present in this table.
    pub max_len: u32,
    /// `base[len]`: the running code-count offset at each length.
    base: [i64; MAX_CODE_LEN + 2],
    /// `limit[len]`: the last (highest) canonical code of that length.
    limit: [i64; MAX_CODE_LEN + 2],
    /// Symbols ordered by (length, original index); `perm[zvec - base[zn]]`
    /// recovers the decoded symbol.
    perm: Vec<u16>,
}

impl HuffmanTable {
    /// Build decode tables from a per-symbol length vector.
    ///
    /// Mirrors `BZ2_hbCreateDecodeTables`: first bucket symbols by length
    /// into `perm`, then derive `base`/`limit` from the per-length symbol
    /// counts.
    pub fn from_lengths(lengths: &[u8], alpha_size: usize) -> Result<Self> {
        if alpha_size == 0 || lengths.len() < alpha_size {
            return Err(DecodeError::internal("empty or truncated length vector"));
        }

        let min_len = *lengths[..alpha_size].iter().min().unwrap() as u32;
        let max_len = *lengths[..alpha_size].iter().max().unwrap() as u32;
        if min_len < 1 || max_len > MAX_CODE_LEN as u32 {
            return Err(DecodeError::data("huffman code length out of [1,20]"));
        }

        let mut perm = vec![0u16; alpha_size];
        let mut pp = 0usize;
        for len in min_len..=max_len {
            for (sym, &l) in lengths[..alpha_size].iter().enumerate() {
                if l as u32 == len {
                    perm[pp] = sym as u16;
                    pp += 1;
                }
            }
        }

        let mut base = [0i64; MAX_CODE_LEN + 2];
        for &l in &lengths[..alpha_size] {
            base[l as usize + 1] += 1;
        }
        for i in 1..base.len() {
            base[i] += base[i - 1];
        }

        let mut limit = [0i64; MAX_CODE_LEN + 2];
        let mut vec = 0i64;
        for len in min_len..=max_len {
            let len = len as usize;
            vec += base[len + 1] - base[len];
            limit[len] = vec - 1;
            vec <<= 1;
        }
        for len in (min_len as usize + 1)..=(max_len as usize) {
            base[len] = ((limit[len - 1] + 1) << 1) - base[len];
        }

        Ok(Self {
            min_len,
            max_len,
            base,
            limit,
            perm,
        })
    }

    /// Check whether `zvec`, accumulated over `zn` bits, already decodes a
    /// symbol at this length. `Ok(None)` means: shift in one more bit and
    /// call again at `zn + 1`.
    pub fn try_decode(&self, zvec: u32, zn: u32) -> Result<Option<u16>> {
        if zn > MAX_CODE_LEN as u32 {
            return Err(DecodeError::data("huffman code exceeds max length"));
        }
        if (zvec as i64) > self.limit[zn as usize] {
            return Ok(None);
        }
        let index = zvec as i64 - self.base[zn as usize];
        if index < 0 || index as usize >= self.perm.len() {
            return Err(DecodeError::data("huffman decode index out of range"));
        }
        Ok(Some(self.perm[index as usize]))
    }
}
