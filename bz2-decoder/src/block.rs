//! Per-block constants and the pieces of block-header parsing that don't
//! touch the bit reader directly.
//!
//! The resumable bit-by-bit parse itself lives in [`crate::decoder`], since
//! every field read there needs access to the shared bit reader and phase
//! state. This module holds the parts that can be expressed as ordinary
//! pure functions: the magic byte sequences and the small-alphabet MTF-undo
//! used to recover `selector[]` from `selectorMtf[]`.

/// Selectors beyond this many are read (to stay in sync with the bit
/// stream) but never stored or used; some encoders round the selector
/// count up without emitting extra useful data.
pub const MAX_SELECTORS: usize = 18002;

/// Coding tables per block are limited to this many groups.
pub const MAX_GROUPS: usize = 6;

/// MTF symbol meaning "repeat the front byte, weight 1x" in a zero run.
pub const RUNA: u16 = 0;
/// MTF symbol meaning "repeat the front byte, weight 2x" in a zero run.
pub const RUNB: u16 = 1;

/// Bytes following the first (disambiguating) byte of a block-open marker.
pub const BLOCK_MAGIC_TAIL: [u8; 5] = [0x41, 0x59, 0x26, 0x53, 0x59];
/// Bytes following the first byte of a stream-end marker.
pub const EOS_MAGIC_TAIL: [u8; 5] = [0x72, 0x45, 0x38, 0x50, 0x90];

/// Undo the move-to-front coding of the selector stream.
///
/// `selector_mtf[i]` is an index into a small, implicitly-MTF'd list of
/// group numbers `0..n_groups`; this recovers the actual group number used
/// for the i-th group of 50 MTF symbols.
pub fn undo_selector_mtf(n_groups: u8, selector_mtf: &[u8]) -> Vec<u8> {
    let mut pos: Vec<u8> = (0..n_groups).collect();
    let mut selectors = Vec::with_capacity(selector_mtf.len());
    for &v in selector_mtf {
        let v = v as usize;
        let tmp = pos[v];
        pos.copy_within(0..v, 1);
        pos[0] = tmp;
        selectors.push(tmp);
    }
    selectors
}
