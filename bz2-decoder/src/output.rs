//! Output producer: walks the inverse BWT permutation and undoes the
//! byte-level run-length coding (RLE1) applied before the BWT at encode
//! time, re-applying block randomisation where the legacy flag is set.
//!
//! Unlike the header parser, this stage never needs to suspend on missing
//! *input* - by the time a block reaches this stage its entire compressed
//! representation has already been parsed into memory. The only
//! suspension point is a full caller-supplied output buffer, so
//! [`OutputProducer::produce`] is a plain push-style loop that returns as
//! soon as it runs out of room.

use crate::bwt::Bwt;
use crate::rand::Randomiser;
use bz_core::crc::Crc32Bzip2;
use bz_core::error::{DecodeError, Result};

/// Drains a decoded block into the caller's buffer, expanding RLE1 runs
/// and undoing randomisation as it goes.
#[derive(Debug)]
pub struct OutputProducer {
    state_out_len: u32,
    state_out_ch: u8,
    k0: u8,
    nblock_used: u32,
    nblock: u32,
    randomised: bool,
    randomiser: Randomiser,
    block_crc: Crc32Bzip2,
}

impl OutputProducer {
    /// Start draining a freshly BWT-inverted block of `nblock` bytes.
    /// `bwt` must already be positioned at `origPtr`; this primes `k0`
    /// with the first raw byte (and advances past it).
    pub fn start(bwt: &mut Bwt, nblock: u32, randomised: bool) -> Self {
        let mut producer = Self {
            state_out_len: 0,
            state_out_ch: 0,
            k0: 0,
            nblock_used: 0,
            nblock,
            randomised,
            randomiser: Randomiser::new(),
            block_crc: Crc32Bzip2::new(),
        };
        if nblock > 0 {
            producer.k0 = producer.fetch_raw(bwt);
        } else {
            producer.nblock_used = 1;
        }
        producer
    }

    fn fetch_raw(&mut self, bwt: &mut Bwt) -> u8 {
        let mut byte = bwt.next_byte();
        self.nblock_used += 1;
        if self.randomised && self.randomiser.advance() {
            byte ^= 1;
        }
        byte
    }

    /// Push as much decoded output into `out[*out_pos..]` as fits,
    /// advancing `*out_pos`. Returns `Ok(true)` once the whole block has
    /// been drained (the caller should compare [`Self::finalize`] against
    /// the stored block CRC next), or `Ok(false)` if the output buffer
    /// filled before the block was exhausted.
    pub fn produce(&mut self, bwt: &mut Bwt, out: &mut [u8], out_pos: &mut usize) -> Result<bool> {
        loop {
            while self.state_out_len > 0 {
                if *out_pos == out.len() {
                    return Ok(false);
                }
                out[*out_pos] = self.state_out_ch;
                self.block_crc.update_byte(self.state_out_ch);
                *out_pos += 1;
                self.state_out_len -= 1;
            }

            if self.nblock_used == self.nblock + 1 {
                return Ok(true);
            }
            if self.nblock_used > self.nblock + 1 {
                return Err(DecodeError::internal("nblock_used ran past block end"));
            }

            self.state_out_len = 1;
            self.state_out_ch = self.k0;
            let k1 = self.fetch_raw(bwt);
            if self.nblock_used == self.nblock + 1 {
                continue;
            }
            if k1 != self.k0 {
                self.k0 = k1;
                continue;
            }

            self.state_out_len = 2;
            let k1 = self.fetch_raw(bwt);
            if self.nblock_used == self.nblock + 1 {
                continue;
            }
            if k1 != self.k0 {
                self.k0 = k1;
                continue;
            }

            self.state_out_len = 3;
            let k1 = self.fetch_raw(bwt);
            if self.nblock_used == self.nblock + 1 {
                continue;
            }
            if k1 != self.k0 {
                self.k0 = k1;
                continue;
            }

            let run_extra = self.fetch_raw(bwt);
            self.state_out_len = run_extra as u32 + 4;
            self.k0 = self.fetch_raw(bwt);
        }
    }

    /// The running CRC over bytes emitted so far this block.
    pub fn calculated_crc(&self) -> u32 {
        self.block_crc.finalize()
    }
}
