//! Session-level resumable decompressor.
//!
//! [`Session::decompress`] is the driver: a loop over an explicit [`Phase`]
//! enum, each arm consuming exactly the next field the format defines and
//! then advancing to the next phase. Every field that survives a
//! suspend/resume boundary - partially-read multi-byte values, loop
//! indices, accumulators - lives directly on [`Session`] rather than as a
//! local, so a call that runs out of input can always be resumed by
//! calling `decompress` again with more bytes appended to `input` (or more
//! precisely, with a fresh slice picking up where the last one left off).

use bz_core::bitreader::BitReader;
use bz_core::crc;
use bz_core::error::{DecodeError, Result};

use crate::block::{self, BLOCK_MAGIC_TAIL, EOS_MAGIC_TAIL, MAX_GROUPS, MAX_SELECTORS, RUNA, RUNB};
use crate::bwt::Bwt;
use crate::huffman::{HuffmanTable, SYMBOLS_PER_GROUP};
use crate::mtf::Mtf;
use crate::output::OutputProducer;

/// Outcome of a single [`Session::decompress`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Consumed input and/or produced output; more calls may be needed.
    Ok,
    /// A complete stream (possibly one of several concatenated streams)
    /// was fully decoded, including trailer CRC verification. The session
    /// is ready to start a new stream on the next call.
    StreamEnd,
}

/// Byte/status accounting returned from [`Session::decompress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompressOutcome {
    /// Bytes consumed from the input slice passed to this call.
    pub bytes_consumed: usize,
    /// Bytes written into the output slice passed to this call.
    pub bytes_produced: usize,
    /// Whether this call completed a stream.
    pub status: DecodeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Magic1,
    Magic2,
    Magic3,
    Magic4,

    Marker,

    BlockCrc,
    RandBit,
    OrigPtr,

    MapUsed16,
    MapChunk,

    NGroups,
    NSelectors,
    SelectorRun,

    CodingInitLen,
    CodingContinue,
    CodingSign,
    CodingNextGroup,

    MtfSetup,
    GroupSelect,
    SymbolInit,
    SymbolExtend,
    ProcessSymbol,

    BlockSanity,
    BwtSetup,

    Output,

    TrailerCrc,

    Idle,
}

/// A resumable bzip2 block decompressor session.
///
/// Mirrors the classic `initDecompress` / `decompress` / `end` lifecycle:
/// [`Session::new`] is `initDecompress`, [`Session::decompress`] is the
/// repeatable step, and [`Session::finish`] is `end` (a no-op beyond
/// consuming `self`, since Rust has no separate free step).
#[derive(Debug)]
pub struct Session {
    small_mode: bool,
    phase: Phase,
    bits: BitReader,

    level: u8,

    marker_idx: usize,
    is_trailer: Option<bool>,

    crc_half: bool,
    crc_scratch: u32,
    stored_block_crc: u32,
    combined_crc: u32,
    stored_combined_crc: u32,

    block_randomised: bool,
    orig_ptr: u32,

    used16: [bool; 16],
    in_use: [bool; 256],
    map_chunk_idx: usize,
    seq_to_unseq: Vec<u8>,
    n_in_use: usize,
    alpha_size: usize,

    n_groups: u8,
    n_selectors: u16,
    selector_idx: u16,
    selector_run_j: u8,
    selector_mtf: Vec<u8>,
    selectors: Vec<u8>,

    coding_t: usize,
    coding_i: usize,
    coding_curr: i32,
    lens: Vec<Vec<u8>>,
    tables: Vec<HuffmanTable>,
    min_lens: Vec<u32>,

    eob: u16,
    nblock_max: u32,
    group_no: i32,
    group_pos: u32,
    zn: u32,
    zvec: u32,
    next_sym: u16,
    in_run: bool,
    es: i64,
    n_acc: u32,
    nblock: u32,
    unzftab: [u32; 256],
    mtf: Mtf,
    mtf_bytes: Vec<u8>,

    bwt: Option<Bwt>,
    output: Option<OutputProducer>,
}

impl Session {
    /// Start a new session. `small` selects the packed, slower BWT
    /// inversion mode over the faster, larger `tt[]`-based one.
    pub fn new(small: bool) -> Self {
        Self {
            small_mode: small,
            phase: Phase::Magic1,
            bits: BitReader::new(),
            level: 0,
            marker_idx: 0,
            is_trailer: None,
            crc_half: false,
            crc_scratch: 0,
            stored_block_crc: 0,
            combined_crc: 0,
            stored_combined_crc: 0,
            block_randomised: false,
            orig_ptr: 0,
            used16: [false; 16],
            in_use: [false; 256],
            map_chunk_idx: 0,
            seq_to_unseq: Vec::new(),
            n_in_use: 0,
            alpha_size: 0,
            n_groups: 0,
            n_selectors: 0,
            selector_idx: 0,
            selector_run_j: 0,
            selector_mtf: Vec::new(),
            selectors: Vec::new(),
            coding_t: 0,
            coding_i: 0,
            coding_curr: 0,
            lens: Vec::new(),
            tables: Vec::new(),
            min_lens: Vec::new(),
            eob: 0,
            nblock_max: 0,
            group_no: -1,
            group_pos: 0,
            zn: 0,
            zvec: 0,
            next_sym: 0,
            in_run: false,
            es: 0,
            n_acc: 0,
            nblock: 0,
            unzftab: [0; 256],
            mtf: Mtf::new(),
            mtf_bytes: Vec::new(),
            bwt: None,
            output: None,
        }
    }

    /// End the session. Provided for symmetry with the reference
    /// lifecycle; there is nothing to explicitly release.
    pub fn finish(self) -> Result<()> {
        Ok(())
    }

    /// Advance the session, consuming from `input` and writing decoded
    /// bytes into `output`. Returns as soon as `output` fills or `input`
    /// is exhausted mid-field; call again with fresh/continued input to
    /// resume exactly where parsing left off.
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<DecompressOutcome> {
        let mut in_pos = 0usize;
        let mut out_pos = 0usize;

        loop {
            if self.phase == Phase::Output {
                let bwt = self
                    .bwt
                    .as_mut()
                    .ok_or_else(|| DecodeError::internal("output phase with no bwt"))?;
                let out_producer = self
                    .output
                    .as_mut()
                    .ok_or_else(|| DecodeError::internal("output phase with no producer"))?;
                let done = out_producer.produce(bwt, output, &mut out_pos)?;
                if !done {
                    return Ok(DecompressOutcome {
                        bytes_consumed: in_pos,
                        bytes_produced: out_pos,
                        status: DecodeStatus::Ok,
                    });
                }
                if out_producer.calculated_crc() != self.stored_block_crc {
                    return Err(DecodeError::block_crc_mismatch(
                        self.stored_block_crc,
                        out_producer.calculated_crc(),
                    ));
                }
                self.combined_crc = crc::combine(self.combined_crc, self.stored_block_crc);
                self.output = None;
                self.bwt = None;
                self.phase = Phase::Marker;
                continue;
            }

            if self.phase == Phase::Idle {
                // Re-arm for a concatenated stream only once the caller
                // hands us more input; otherwise there is nothing to do.
                if in_pos >= input.len() {
                    return Ok(DecompressOutcome {
                        bytes_consumed: in_pos,
                        bytes_produced: out_pos,
                        status: DecodeStatus::Ok,
                    });
                }
                self.phase = Phase::Magic1;
                continue;
            }

            let Some(advance) = self.step(input, &mut in_pos)? else {
                return Ok(DecompressOutcome {
                    bytes_consumed: in_pos,
                    bytes_produced: out_pos,
                    status: DecodeStatus::Ok,
                });
            };
            if let StepResult::StreamEnd = advance {
                return Ok(DecompressOutcome {
                    bytes_consumed: in_pos,
                    bytes_produced: out_pos,
                    status: DecodeStatus::StreamEnd,
                });
            }
        }
    }

    /// Run one phase transition. `Ok(None)` means input was exhausted and
    /// the caller should return control; the phase is left unchanged so
    /// the next call resumes on the same field.
    fn step(&mut self, input: &[u8], pos: &mut usize) -> Result<Option<StepResult>> {
        macro_rules! bits {
            ($n:expr) => {
                match self.bits.need_bits($n, input, pos) {
                    Some(v) => v,
                    None => return Ok(None),
                }
            };
        }

        match self.phase {
            Phase::Magic1 => {
                let uc = bits!(8);
                if uc != 0x42 {
                    return Err(DecodeError::magic(vec![0x42], vec![uc as u8]));
                }
                self.phase = Phase::Magic2;
            }
            Phase::Magic2 => {
                let uc = bits!(8);
                if uc != 0x5A {
                    return Err(DecodeError::magic(vec![0x5A], vec![uc as u8]));
                }
                self.phase = Phase::Magic3;
            }
            Phase::Magic3 => {
                let uc = bits!(8);
                if uc != 0x68 {
                    return Err(DecodeError::magic(vec![0x68], vec![uc as u8]));
                }
                self.phase = Phase::Magic4;
            }
            Phase::Magic4 => {
                let uc = bits!(8);
                if !(0x31..=0x39).contains(&uc) {
                    return Err(DecodeError::magic(vec![0x31], vec![uc as u8]));
                }
                self.level = (uc - 0x30) as u8;
                self.marker_idx = 0;
                self.is_trailer = None;
                self.phase = Phase::Marker;
            }

            Phase::Marker => {
                let uc = bits!(8) as u8;
                if self.marker_idx == 0 {
                    self.is_trailer = match uc {
                        0x31 => Some(false),
                        0x17 => Some(true),
                        _ => return Err(DecodeError::data("bad block/trailer marker")),
                    };
                } else {
                    let expected = if self.is_trailer == Some(true) {
                        EOS_MAGIC_TAIL[self.marker_idx - 1]
                    } else {
                        BLOCK_MAGIC_TAIL[self.marker_idx - 1]
                    };
                    if uc != expected {
                        return Err(DecodeError::data("bad block/trailer marker"));
                    }
                }
                self.marker_idx += 1;
                if self.marker_idx == 6 {
                    self.marker_idx = 0;
                    self.crc_half = false;
                    if self.is_trailer == Some(true) {
                        self.phase = Phase::TrailerCrc;
                    } else {
                        self.stored_block_crc = 0;
                        self.phase = Phase::BlockCrc;
                    }
                }
            }

            Phase::BlockCrc => {
                let half = bits!(16);
                if !self.crc_half {
                    self.crc_scratch = half;
                    self.crc_half = true;
                } else {
                    self.stored_block_crc = (self.crc_scratch << 16) | half;
                    self.crc_half = false;
                    self.phase = Phase::RandBit;
                }
            }

            Phase::RandBit => {
                self.block_randomised = bits!(1) == 1;
                self.orig_ptr = 0;
                self.phase = Phase::OrigPtr;
            }

            Phase::OrigPtr => {
                self.orig_ptr = bits!(24);
                let limit = 10 + 100_000u32 * self.level as u32;
                if self.orig_ptr > limit {
                    return Err(DecodeError::data("origPtr out of range"));
                }
                self.used16 = [false; 16];
                self.in_use = [false; 256];
                self.phase = Phase::MapUsed16;
            }

            Phase::MapUsed16 => {
                let bitmap = bits!(16);
                for i in 0..16 {
                    self.used16[i] = (bitmap >> (15 - i)) & 1 == 1;
                }
                self.map_chunk_idx = 0;
                self.phase = Phase::MapChunk;
            }

            Phase::MapChunk => {
                if self.map_chunk_idx == 16 {
                    self.seq_to_unseq = (0u16..256)
                        .filter(|&i| self.in_use[i as usize])
                        .map(|i| i as u8)
                        .collect();
                    self.n_in_use = self.seq_to_unseq.len();
                    if self.n_in_use == 0 {
                        return Err(DecodeError::data("no symbols marked in use"));
                    }
                    self.alpha_size = self.n_in_use + 2;
                    self.phase = Phase::NGroups;
                } else if self.used16[self.map_chunk_idx] {
                    let chunk = bits!(16);
                    let base = self.map_chunk_idx << 4;
                    for j in 0..16 {
                        if (chunk >> (15 - j)) & 1 == 1 {
                            self.in_use[base + j] = true;
                        }
                    }
                    self.map_chunk_idx += 1;
                } else {
                    self.map_chunk_idx += 1;
                }
            }

            Phase::NGroups => {
                let n = bits!(3);
                if !(2..=MAX_GROUPS as u32).contains(&n) {
                    return Err(DecodeError::data("nGroups out of [2,6]"));
                }
                self.n_groups = n as u8;
                self.phase = Phase::NSelectors;
            }

            Phase::NSelectors => {
                let n = bits!(15);
                if n < 1 {
                    return Err(DecodeError::data("nSelectors must be >= 1"));
                }
                self.n_selectors = n as u16;
                self.selector_idx = 0;
                self.selector_run_j = 0;
                self.selector_mtf = Vec::with_capacity((n as usize).min(MAX_SELECTORS));
                self.phase = Phase::SelectorRun;
            }

            Phase::SelectorRun => {
                let bit = bits!(1);
                if bit == 0 {
                    if (self.selector_idx as usize) < MAX_SELECTORS {
                        self.selector_mtf.push(self.selector_run_j);
                    }
                    self.selector_idx += 1;
                    self.selector_run_j = 0;
                    if self.selector_idx == self.n_selectors {
                        if self.n_selectors as usize > MAX_SELECTORS {
                            self.n_selectors = MAX_SELECTORS as u16;
                        }
                        self.selectors =
                            block::undo_selector_mtf(self.n_groups, &self.selector_mtf);
                        self.coding_t = 0;
                        self.lens = vec![vec![0u8; self.alpha_size]; self.n_groups as usize];
                        self.phase = Phase::CodingInitLen;
                    }
                } else {
                    self.selector_run_j += 1;
                    if self.selector_run_j >= self.n_groups {
                        return Err(DecodeError::data("selector MTF run too long"));
                    }
                }
            }

            Phase::CodingInitLen => {
                if self.coding_t == self.n_groups as usize {
                    self.phase = Phase::MtfSetup;
                } else {
                    self.coding_curr = bits!(5) as i32;
                    self.coding_i = 0;
                    self.phase = Phase::CodingContinue;
                }
            }

            Phase::CodingContinue => {
                if !(1..=20).contains(&self.coding_curr) {
                    return Err(DecodeError::data("huffman code length out of [1,20]"));
                }
                let bit = bits!(1);
                if bit == 0 {
                    self.lens[self.coding_t][self.coding_i] = self.coding_curr as u8;
                    self.coding_i += 1;
                    if self.coding_i == self.alpha_size {
                        self.phase = Phase::CodingNextGroup;
                    }
                } else {
                    self.phase = Phase::CodingSign;
                }
            }

            Phase::CodingSign => {
                let bit = bits!(1);
                if bit == 0 {
                    self.coding_curr += 1;
                } else {
                    self.coding_curr -= 1;
                }
                self.phase = Phase::CodingContinue;
            }

            Phase::CodingNextGroup => {
                let table = HuffmanTable::from_lengths(&self.lens[self.coding_t], self.alpha_size)?;
                self.min_lens.push(table.min_len);
                self.tables.push(table);
                self.coding_t += 1;
                self.phase = Phase::CodingInitLen;
            }

            Phase::MtfSetup => {
                self.eob = self.n_in_use as u16 + 1;
                self.nblock_max = 100_000 * self.level as u32;
                self.group_no = -1;
                self.group_pos = 0;
                self.unzftab = [0; 256];
                self.mtf = Mtf::new();
                self.mtf_bytes = Vec::with_capacity(self.nblock_max as usize);
                self.in_run = false;
                self.nblock = 0;
                self.phase = Phase::GroupSelect;
            }

            Phase::GroupSelect => {
                if self.group_pos == 0 {
                    self.group_no += 1;
                    if self.group_no as u16 >= self.n_selectors {
                        return Err(DecodeError::data("ran out of selectors"));
                    }
                    self.group_pos = SYMBOLS_PER_GROUP as u32;
                }
                self.group_pos -= 1;
                let table_idx = self.selectors[self.group_no as usize] as usize;
                self.zn = self.min_lens[table_idx];
                self.phase = Phase::SymbolInit;
            }

            Phase::SymbolInit => {
                self.zvec = bits!(self.zn);
                self.phase = Phase::SymbolExtend;
            }

            Phase::SymbolExtend => {
                let table_idx = self.selectors[self.group_no as usize] as usize;
                loop {
                    if self.zn > 20 {
                        return Err(DecodeError::data("huffman code exceeds max length"));
                    }
                    match self.tables[table_idx].try_decode(self.zvec, self.zn)? {
                        Some(sym) => {
                            self.next_sym = sym;
                            self.phase = Phase::ProcessSymbol;
                            break;
                        }
                        None => {
                            let Some(bit) = self.bits.need_bits(1, input, pos) else {
                                return Ok(None);
                            };
                            self.zn += 1;
                            self.zvec = (self.zvec << 1) | bit;
                        }
                    }
                }
            }

            Phase::ProcessSymbol => {
                if self.in_run && self.next_sym != RUNA && self.next_sym != RUNB {
                    self.es += 1;
                    let front = self.mtf.front();
                    let byte = self.seq_to_unseq[front as usize];
                    self.unzftab[byte as usize] += self.es as u32;
                    for _ in 0..self.es {
                        if self.nblock >= self.nblock_max {
                            return Err(DecodeError::data("block size exceeded"));
                        }
                        self.mtf_bytes.push(byte);
                        self.nblock += 1;
                    }
                    self.in_run = false;
                }

                if !self.in_run {
                    if self.next_sym == self.eob {
                        self.phase = Phase::BlockSanity;
                        return Ok(Some(StepResult::Continue));
                    }
                    if self.next_sym == RUNA || self.next_sym == RUNB {
                        self.in_run = true;
                        self.es = -1;
                        self.n_acc = 1;
                    }
                }

                if self.in_run {
                    if self.n_acc >= 0x200000 {
                        return Err(DecodeError::data("zero-run length accumulator overflow"));
                    }
                    if self.next_sym == RUNA {
                        self.es += self.n_acc as i64;
                    } else {
                        self.es += (self.n_acc as i64) << 1;
                    }
                    self.n_acc <<= 1;
                } else {
                    if self.nblock >= self.nblock_max {
                        return Err(DecodeError::data("block size exceeded"));
                    }
                    let byte = self.seq_to_unseq[self.mtf.access(self.next_sym as usize - 1) as usize];
                    self.unzftab[byte as usize] += 1;
                    self.mtf_bytes.push(byte);
                    self.nblock += 1;
                }
                self.phase = Phase::GroupSelect;
            }

            Phase::BlockSanity => {
                if self.orig_ptr as usize >= self.nblock as usize {
                    return Err(DecodeError::data("origPtr out of range for block size"));
                }
                for &count in &self.unzftab {
                    if count > self.nblock {
                        return Err(DecodeError::data("unzftab entry out of range"));
                    }
                }
                self.phase = Phase::BwtSetup;
            }

            Phase::BwtSetup => {
                let mut bwt = if self.small_mode {
                    Bwt::build_small(&self.mtf_bytes, &self.unzftab, self.orig_ptr)?
                } else {
                    Bwt::build_fast(&self.mtf_bytes, &self.unzftab, self.orig_ptr)?
                };
                let producer = OutputProducer::start(&mut bwt, self.nblock, self.block_randomised);
                self.bwt = Some(bwt);
                self.output = Some(producer);
                self.mtf_bytes = Vec::new();
                self.tables.clear();
                self.min_lens.clear();
                self.selector_mtf.clear();
                self.selectors.clear();
                self.lens.clear();
                self.phase = Phase::Output;
            }

            Phase::TrailerCrc => {
                let half = bits!(16);
                if !self.crc_half {
                    self.crc_scratch = half;
                    self.crc_half = true;
                } else {
                    self.stored_combined_crc = (self.crc_scratch << 16) | half;
                    if self.stored_combined_crc != self.combined_crc {
                        return Err(DecodeError::stream_crc_mismatch(
                            self.stored_combined_crc,
                            self.combined_crc,
                        ));
                    }
                    self.crc_half = false;
                    self.combined_crc = 0;
                    self.phase = Phase::Idle;
                    return Ok(Some(StepResult::StreamEnd));
                }
            }

            Phase::Output | Phase::Idle => unreachable!("handled by caller"),
        }

        Ok(Some(StepResult::Continue))
    }
}

enum StepResult {
    Continue,
    StreamEnd,
}
