//! Move-to-front buffer.
//!
//! The real bzip2 layout: 256 symbols live in a flat 4096-byte array split
//! into sixteen 16-byte blocks (`MTFL_SIZE`), with a head index per block
//! (`mtfbase`). Accessing position `n` shifts only the owning block's
//! prefix and then ripples the last byte of each earlier block forward by
//! one slot, rather than shifting a full 256-element list.

const MTFL_SIZE: usize = 16;
const MTFA_SIZE: usize = 4096;
const NUM_BLOCKS: usize = 256 / MTFL_SIZE;

/// The two-level MTF scratch structure, one per block being decoded.
#[derive(Debug, Clone)]
pub struct Mtf {
    mtfa: [u8; MTFA_SIZE],
    mtfbase: [usize; NUM_BLOCKS],
}

impl Mtf {
    /// Initialise the structure to the identity permutation 0..255.
    pub fn new() -> Self {
        let mut mtfa = [0u8; MTFA_SIZE];
        let mut mtfbase = [0usize; NUM_BLOCKS];
        let mut kk = MTFA_SIZE - 1;
        for ii in (0..NUM_BLOCKS).rev() {
            for jj in (0..MTFL_SIZE).rev() {
                mtfa[kk] = (ii * MTFL_SIZE + jj) as u8;
                kk -= 1;
            }
            mtfbase[ii] = kk + 1;
        }
        Self { mtfa, mtfbase }
    }

    /// Peek the current front symbol without promoting it. Used for
    /// RUNA/RUNB runs, which repeat whatever is already at the front.
    pub fn front(&self) -> u8 {
        self.mtfa[self.mtfbase[0]]
    }

    /// Fetch the symbol at MTF index `n` and promote it to the front.
    pub fn access(&mut self, n: usize) -> u8 {
        if n < MTFL_SIZE {
            let pp = self.mtfbase[0];
            let uc = self.mtfa[pp + n];
            for i in (0..n).rev() {
                self.mtfa[pp + i + 1] = self.mtfa[pp + i];
            }
            self.mtfa[pp] = uc;
            uc
        } else {
            let lno = n / MTFL_SIZE;
            let off = n % MTFL_SIZE;
            let pp = self.mtfbase[lno];
            let uc = self.mtfa[pp + off];
            for i in (0..off).rev() {
                self.mtfa[pp + i + 1] = self.mtfa[pp + i];
            }
            self.mtfbase[lno] += 1;
            for l in (1..=lno).rev() {
                let src = self.mtfbase[l - 1] + MTFL_SIZE - 1;
                self.mtfbase[l] -= 1;
                let dst = self.mtfbase[l];
                self.mtfa[dst] = self.mtfa[src];
            }
            self.mtfbase[0] -= 1;
            self.mtfa[self.mtfbase[0]] = uc;
            if self.mtfbase[0] == 0 {
                let mut kk = MTFA_SIZE - 1;
                for ii in (0..NUM_BLOCKS).rev() {
                    for jj in (0..MTFL_SIZE).rev() {
                        self.mtfa[kk] = self.mtfa[self.mtfbase[ii] + jj];
                        kk -= 1;
                    }
                    self.mtfbase[ii] = kk + 1;
                }
            }
            uc
        }
    }
}

impl Default for Mtf {
    fn default() -> Self {
        Self::new()
    }
}
