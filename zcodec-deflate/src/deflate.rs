//! DEFLATE compression engine.
//!
//! [`Deflater`] is a resumable state machine. Each call to
//! [`Deflater::deflate`] borrows the caller's input and output through a
//! [`StreamContext`], consumes as much input and produces as much output as
//! the two slices allow, and returns. Output that does not fit is staged in
//! the pending buffer and delivered first on the next call.
//!
//! The stream goes through the framing states below. The gzip states can
//! each suspend when the output fills up and pick up again where they left
//! off:
//!
//! ```text
//! Init ──(zlib header)──────────────────────────────┐
//! Gzip ─► Extra ─► Name ─► Comment ─► Hcrc ─────────┤
//!                                                   ▼
//!                                     Busy ──(Finish)──► Finish
//! ```
//!
//! Inside `Busy` one of five block functions does the work, picked by level
//! and strategy: stored, fast (greedy), slow (lazy), run-length and
//! Huffman-only.

use crate::consts::{Z_DEFAULT_COMPRESSION, Z_DEFLATED};
use crate::gzip::{CM_DEFLATE, GZIP_MAGIC, GzipHeader, OS_CODE};
use crate::lz77::{MatchParams, Window};
use crate::tables::{MAX_MATCH, MIN_LOOKAHEAD, MIN_MATCH};
use crate::trees::{self, Trees};
use log::{debug, trace};
use zcodec_core::adler32::adler32;
use zcodec_core::bitstream::PendingBuf;
use zcodec_core::crc::crc32;
use zcodec_core::error::{CodecError, ErrorKind, Result, Status};
use zcodec_core::stream::{StreamContext, StreamInfo, data_type};
use zcodec_core::traits::{Compressor, Flush, Strategy};

/// Largest stored block payload.
const MAX_STORED: usize = 65535;

/// Length-3 matches farther back than this are not worth it.
const TOO_FAR: usize = 4096;

/// FDICT bit of the zlib header.
const PRESET_DICT: u16 = 0x20;

/// Block function selected by the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockFunc {
    Stored,
    Fast,
    Slow,
}

#[derive(Debug, Clone, Copy)]
struct Config {
    params: MatchParams,
    func: BlockFunc,
}

const fn config(good: usize, lazy: usize, nice: usize, chain: usize, func: BlockFunc) -> Config {
    Config {
        params: MatchParams {
            good_length: good,
            max_lazy: lazy,
            nice_length: nice,
            max_chain: chain,
        },
        func,
    }
}

/// Tuning per level 0..=9: good, lazy, nice, chain.
const CONFIG_TABLE: [Config; 10] = [
    config(0, 0, 0, 0, BlockFunc::Stored),
    config(4, 4, 8, 4, BlockFunc::Fast),
    config(4, 5, 16, 8, BlockFunc::Fast),
    config(4, 6, 32, 32, BlockFunc::Fast),
    config(4, 4, 16, 16, BlockFunc::Slow),
    config(8, 16, 32, 32, BlockFunc::Slow),
    config(8, 16, 128, 128, BlockFunc::Slow),
    config(8, 32, 128, 256, BlockFunc::Slow),
    config(32, 128, 258, 1024, BlockFunc::Slow),
    config(32, 258, 258, 4096, BlockFunc::Slow),
];

/// Outer framing around the DEFLATE data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    /// No header or trailer.
    Raw,
    /// RFC 1950: 2-byte header, Adler-32 trailer.
    Zlib,
    /// RFC 1952: gzip member header, CRC-32 and length trailer.
    Gzip,
}

impl Wrap {
    /// Checksum selector understood by the window reader.
    #[inline]
    fn checksum_kind(self) -> i32 {
        match self {
            Self::Raw => 0,
            Self::Zlib => 1,
            Self::Gzip => 2,
        }
    }
}

/// Framing state. The gzip header states carry how far into their field
/// they have got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeflateStatus {
    Init,
    Gzip,
    Extra { index: usize },
    Name { index: usize },
    Comment { index: usize },
    Hcrc,
    Busy,
    Finish,
}

/// Outcome of one run of a block function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    /// Out of input or output.
    NeedMore,
    /// A block boundary was reached for the flush.
    BlockDone,
    /// The last block is started but did not fit in the output.
    FinishStarted,
    /// The last block is complete.
    FinishDone,
}

/// Flush mode of the previous call, for detecting calls that cannot make
/// progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastFlush {
    NotYet,
    OutputFull,
    Mode(Flush),
}

impl LastFlush {
    fn rank(self) -> i32 {
        match self {
            Self::NotYet => -4,
            Self::OutputFull => -2,
            Self::Mode(flush) => flush.rank(),
        }
    }
}

/// Move staged output to the caller and count it.
fn flush_pending(pending: &mut PendingBuf, strm: &mut StreamContext<'_>, info: &mut StreamInfo) {
    let n = pending.flush_to(strm);
    info.total_out += n as u64;
}

/// Fold the header bytes queued since `mark` into the header CRC.
fn hcrc_update(pending: &PendingBuf, info: &mut StreamInfo, hcrc: bool, mark: usize) {
    if hcrc {
        info.adler = crc32(info.adler, pending.since(mark));
    }
}

/// Stream a zero-terminated header field starting at `*index`.
///
/// Returns `false` if the output filled up first; `*index` then says where
/// to resume.
fn put_terminated(
    pending: &mut PendingBuf,
    strm: &mut StreamContext<'_>,
    info: &mut StreamInfo,
    field: &[u8],
    index: &mut usize,
    hcrc: bool,
) -> bool {
    let mut beg = pending.mark();
    loop {
        if pending.pending() >= pending.capacity() {
            hcrc_update(pending, info, hcrc, beg);
            flush_pending(pending, strm, info);
            if pending.pending() != 0 {
                return false;
            }
            beg = pending.mark();
        }
        let val = field.get(*index).copied().unwrap_or(0);
        *index += 1;
        pending.put_byte(val);
        if val == 0 {
            break;
        }
    }
    hcrc_update(pending, info, hcrc, beg);
    true
}

/// Run a block flush and return from the block function if the output is
/// full.
macro_rules! flush_block {
    ($self:ident, $strm:ident, $last:expr) => {{
        $self.flush_block_only($strm, $last);
        if $strm.avail_out() == 0 {
            return if $last {
                BlockState::FinishStarted
            } else {
                BlockState::NeedMore
            };
        }
    }};
}

/// Streaming DEFLATE compressor with zlib, gzip or no framing.
///
/// # Example
///
/// ```rust
/// use zcodec_core::{Flush, Status, StreamContext};
/// use zcodec_deflate::Deflater;
///
/// let mut deflater = Deflater::new(6).unwrap();
/// let mut out = [0u8; 64];
/// let mut strm = StreamContext::new(b"hello hello hello", &mut out);
/// let status = deflater.deflate(&mut strm, Flush::Finish).unwrap();
/// assert_eq!(status, Status::StreamEnd);
/// assert_eq!(&strm.written()[..2], &[0x78, 0x9C]);
/// ```
pub struct Deflater {
    info: StreamInfo,
    status: DeflateStatus,
    pending: PendingBuf,
    wrap: Wrap,
    trailer_written: bool,
    gzhead: Option<GzipHeader>,
    last_flush: LastFlush,
    level: i32,
    strategy: Strategy,
    mem_level: i32,
    w: Window,
    trees: Trees,
}

impl Deflater {
    /// zlib-wrapped compressor at `level` with default parameters.
    pub fn new(level: i32) -> Result<Self> {
        Self::init2(level, Z_DEFLATED, 15, 8, 0)
    }

    /// Raw DEFLATE compressor at `level`.
    pub fn raw(level: i32) -> Result<Self> {
        Self::init2(level, Z_DEFLATED, -15, 8, 0)
    }

    /// gzip-wrapped compressor at `level`.
    pub fn gzip(level: i32) -> Result<Self> {
        Self::init2(level, Z_DEFLATED, 31, 8, 0)
    }

    /// Create a compressor with full control over its parameters.
    ///
    /// `window_bits` selects the framing as well as the window size:
    /// `8..=15` zlib, `-15..=-8` raw, `24..=31` gzip. A zlib window of 8 is
    /// silently raised to 9.
    pub fn init2(
        level: i32,
        method: i32,
        window_bits: i32,
        mem_level: i32,
        strategy: i32,
    ) -> Result<Self> {
        let level = if level == Z_DEFAULT_COMPRESSION {
            6
        } else {
            level
        };

        let (wrap, mut w_bits) = if window_bits < 0 {
            if window_bits < -15 {
                return Err(CodecError::usage("invalid window size"));
            }
            (Wrap::Raw, -window_bits)
        } else if window_bits > 15 {
            (Wrap::Gzip, window_bits - 16)
        } else {
            (Wrap::Zlib, window_bits)
        };

        if method != Z_DEFLATED {
            return Err(CodecError::usage("invalid compression method"));
        }
        if !(1..=9).contains(&mem_level) {
            return Err(CodecError::usage("invalid memory level"));
        }
        if !(8..=15).contains(&w_bits) || (w_bits == 8 && wrap != Wrap::Zlib) {
            return Err(CodecError::usage("invalid window size"));
        }
        if !(0..=9).contains(&level) {
            return Err(CodecError::usage("invalid compression level"));
        }
        let strategy = Strategy::from_i32(strategy)?;
        if w_bits == 8 {
            w_bits = 9;
        }

        debug!(
            "deflate init: level={} window_bits={} mem_level={} strategy={:?} wrap={:?}",
            level, w_bits, mem_level, strategy, wrap
        );
        Ok(Self::build(level, w_bits as u32, mem_level, wrap, strategy))
    }

    fn build(level: i32, w_bits: u32, mem_level: i32, wrap: Wrap, strategy: Strategy) -> Self {
        let lit_bufsize = 1usize << (mem_level + 6);
        let mut deflater = Self {
            info: StreamInfo::default(),
            status: DeflateStatus::Init,
            pending: PendingBuf::with_capacity(lit_bufsize * 4),
            wrap,
            trailer_written: false,
            gzhead: None,
            last_flush: LastFlush::NotYet,
            level,
            strategy,
            mem_level,
            w: Window::new(w_bits, mem_level as u32, CONFIG_TABLE[level as usize].params),
            trees: Trees::new(lit_bufsize),
        };
        deflater.reset();
        deflater
    }

    /// Session counters, checksum and last message.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Total input consumed.
    pub fn total_in(&self) -> u64 {
        self.info.total_in
    }

    /// Total output produced.
    pub fn total_out(&self) -> u64 {
        self.info.total_out
    }

    /// Running checksum of the input (Adler-32 or CRC-32).
    pub fn adler(&self) -> u32 {
        self.info.adler
    }

    /// Last diagnostic message.
    pub fn msg(&self) -> Option<&'static str> {
        self.info.msg
    }

    /// Text/binary guess for the data seen so far.
    pub fn data_type(&self) -> i32 {
        self.info.data_type
    }

    /// Current level.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Current strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Framing in use.
    pub fn wrap(&self) -> Wrap {
        self.wrap
    }

    /// Hash memory level.
    pub fn mem_level(&self) -> i32 {
        self.mem_level
    }

    fn fail(&mut self, err: CodecError) -> CodecError {
        self.info.msg = Some(err.message());
        debug!("deflate error: {}", err.message());
        err
    }

    /// Restart the stream, keeping the parameters and the gzip header but
    /// not the hash tables.
    pub fn reset_keep(&mut self) {
        self.info.reset();
        self.info.data_type = data_type::UNKNOWN;
        self.pending.reset();
        self.trailer_written = false;
        self.status = if self.wrap == Wrap::Gzip {
            DeflateStatus::Gzip
        } else {
            DeflateStatus::Init
        };
        self.info.adler = if self.wrap == Wrap::Gzip { 0 } else { 1 };
        self.last_flush = LastFlush::NotYet;
        self.trees.init_block();
    }

    /// Restart the stream with the same parameters.
    pub fn reset(&mut self) {
        self.reset_keep();
        self.w.lm_init(CONFIG_TABLE[self.level as usize].params);
        debug!("deflate reset: level={} wrap={:?}", self.level, self.wrap);
    }

    /// Supply the gzip header to write. Only valid for gzip framing, before
    /// the first call to [`deflate`](Self::deflate).
    pub fn set_header(&mut self, head: GzipHeader) -> Result<()> {
        if self.wrap != Wrap::Gzip {
            return Err(CodecError::usage("gzip header requires gzip framing"));
        }
        self.gzhead = Some(head);
        Ok(())
    }

    /// Preload the window with `dictionary`.
    ///
    /// For zlib framing this must happen before the first call to
    /// [`deflate`](Self::deflate) and records the dictionary's Adler-32 in
    /// the header. Raw streams accept a dictionary at any block boundary.
    /// Not available for gzip.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        if self.wrap == Wrap::Gzip
            || (self.wrap == Wrap::Zlib && self.status != DeflateStatus::Init)
            || self.w.lookahead != 0
        {
            return Err(CodecError::usage("dictionary cannot be set now"));
        }

        if self.wrap == Wrap::Zlib {
            self.info.adler = adler32(self.info.adler, dictionary);
        }

        let mut dict = dictionary;
        let w_size = self.w.w_size;
        if dict.len() >= w_size {
            if self.wrap == Wrap::Raw {
                self.w.clear_hash();
                self.w.strstart = 0;
                self.w.block_start = 0;
                self.w.insert = 0;
            }
            dict = &dict[dict.len() - w_size..];
        }

        // The dictionary is not stream input: no checksum, no total_in.
        let mut no_output = [0u8; 0];
        let mut dstrm = StreamContext::new(dict, &mut no_output);
        let mut scratch = StreamInfo::default();
        self.w.fill_window(&mut dstrm, &mut scratch, 0);
        while self.w.lookahead >= MIN_MATCH {
            let mut pos = self.w.strstart;
            for _ in 0..self.w.lookahead - (MIN_MATCH - 1) {
                self.w.insert_string(pos);
                pos += 1;
            }
            self.w.strstart = pos;
            self.w.lookahead = MIN_MATCH - 1;
            self.w.fill_window(&mut dstrm, &mut scratch, 0);
        }
        self.w.strstart += self.w.lookahead;
        self.w.block_start = self.w.strstart as i64;
        self.w.insert = self.w.lookahead;
        self.w.lookahead = 0;
        self.w.match_length = MIN_MATCH - 1;
        self.w.prev_length = MIN_MATCH - 1;
        self.w.match_available = false;
        debug!("deflate dictionary: {} bytes", dict.len());
        Ok(())
    }

    /// Copy of the window contents usable as a dictionary, up to the window
    /// size.
    pub fn get_dictionary(&self) -> Vec<u8> {
        let end = self.w.strstart + self.w.lookahead;
        let len = end.min(self.w.w_size);
        self.w.window[end - len..end].to_vec()
    }

    /// Change level and strategy mid-stream.
    ///
    /// If the block function changes, the data so far is compressed with
    /// the old parameters first, using a `Block` flush. That flush needs room
    /// in `strm`'s output; if it cannot complete, `Buf` is returned and the
    /// call should be repeated with more output space.
    pub fn params(&mut self, strm: &mut StreamContext<'_>, level: i32, strategy: i32) -> Result<()> {
        let level = if level == Z_DEFAULT_COMPRESSION {
            6
        } else {
            level
        };
        if !(0..=9).contains(&level) {
            return Err(CodecError::usage("invalid compression level"));
        }
        let strategy = Strategy::from_i32(strategy)?;

        let func = CONFIG_TABLE[self.level as usize].func;
        if (strategy != self.strategy || func != CONFIG_TABLE[level as usize].func)
            && self.last_flush != LastFlush::NotYet
        {
            if let Err(err) = self.deflate(strm, Flush::Block) {
                if err.kind() == ErrorKind::Usage {
                    return Err(err);
                }
            }
            let unflushed = (self.w.strstart as i64 - self.w.block_start) as usize + self.w.lookahead;
            if strm.avail_in() != 0 || unflushed != 0 {
                return Err(CodecError::buf("flush before parameter change is incomplete"));
            }
        }

        if self.level != level {
            if self.level == 0 && self.trees.matches != 0 {
                if self.trees.matches == 1 {
                    self.w.slide_hash();
                } else {
                    self.w.clear_hash();
                }
                self.trees.matches = 0;
            }
            self.level = level;
            self.w.params = CONFIG_TABLE[level as usize].params;
        }
        self.strategy = strategy;
        debug!("deflate params: level={} strategy={:?}", level, strategy);
        Ok(())
    }

    /// Upper bound on the compressed size of `source_len` bytes with the
    /// current parameters and framing, for a single `Finish` call.
    pub fn bound(&self, source_len: u64) -> u64 {
        let s = source_len;
        let fixedlen = s + (s >> 3) + (s >> 8) + (s >> 9) + 4;
        let storelen = s + (s >> 5) + (s >> 7) + (s >> 11) + 7;

        let wraplen = match self.wrap {
            Wrap::Raw => 0,
            Wrap::Zlib => 6 + if self.w.strstart != 0 { 4 } else { 0 },
            Wrap::Gzip => {
                18 + self
                    .gzhead
                    .as_ref()
                    .map_or(0, |head| head.encoded_len() as u64 - 10)
            }
        };

        if self.w.w_bits != 15 || self.w.hash_bits() != 8 + 7 {
            let base = if self.w.w_bits <= self.w.hash_bits() && self.level != 0 {
                fixedlen
            } else {
                storelen
            };
            return base + wraplen;
        }
        s + (s >> 12) + (s >> 14) + (s >> 25) + 13 - 6 + wraplen
    }

    /// Compressed bytes and bits produced but not yet delivered.
    pub fn pending(&self) -> (usize, u32) {
        let bits = self.pending.bit_count();
        (self.pending.pending() + (bits / 8) as usize, bits % 8)
    }

    /// Release the compressor.
    ///
    /// Fails with a data error if the stream was released in the middle of
    /// compressed data, that is, after some input but before `Finish`.
    pub fn end(self) -> Result<()> {
        if self.status == DeflateStatus::Busy {
            return Err(CodecError::protocol("stream released before it was finished"));
        }
        Ok(())
    }

    fn is_huffman_class(&self) -> bool {
        matches!(
            self.strategy,
            Strategy::HuffmanOnly | Strategy::Rle | Strategy::Fixed
        )
    }

    /// Compress as much as `strm` allows.
    ///
    /// Returns `StreamEnd` once the stream is complete after `Finish`,
    /// `Ok` otherwise. `Buf` means no progress was possible; it is not
    /// fatal.
    pub fn deflate(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> Result<Status> {
        if flush == Flush::Trees {
            return Err(CodecError::usage("invalid flush value"));
        }
        if self.status == DeflateStatus::Finish && flush != Flush::Finish {
            return Err(self.fail(CodecError::usage("stream error")));
        }
        if strm.avail_out() == 0 {
            return Err(self.fail(CodecError::buf("buffer error")));
        }

        let old_flush = self.last_flush;
        self.last_flush = LastFlush::Mode(flush);

        self.pending.flush_bits();
        if self.pending.pending() != 0 {
            flush_pending(&mut self.pending, strm, &mut self.info);
            if strm.avail_out() == 0 {
                // Make sure a repeated flush is not refused as no-progress.
                self.last_flush = LastFlush::OutputFull;
                return Ok(Status::Ok);
            }
        } else if strm.avail_in() == 0 && flush.rank() <= old_flush.rank() && flush != Flush::Finish {
            return Err(self.fail(CodecError::buf("buffer error")));
        }

        if self.status == DeflateStatus::Finish && strm.avail_in() != 0 {
            return Err(self.fail(CodecError::buf("buffer error")));
        }

        if let Some(status) = self.write_header(strm) {
            return Ok(status);
        }

        if strm.avail_in() != 0
            || self.w.lookahead != 0
            || (flush != Flush::NoFlush && self.status != DeflateStatus::Finish)
        {
            let bstate = if self.level == 0 {
                self.deflate_stored(strm, flush)
            } else {
                match self.strategy {
                    Strategy::HuffmanOnly => self.deflate_huff(strm, flush),
                    Strategy::Rle => self.deflate_rle(strm, flush),
                    _ => match CONFIG_TABLE[self.level as usize].func {
                        BlockFunc::Stored => self.deflate_stored(strm, flush),
                        BlockFunc::Fast => self.deflate_fast(strm, flush),
                        BlockFunc::Slow => self.deflate_slow(strm, flush),
                    },
                }
            };

            if matches!(bstate, BlockState::FinishStarted | BlockState::FinishDone) {
                self.status = DeflateStatus::Finish;
            }
            match bstate {
                BlockState::NeedMore | BlockState::FinishStarted => {
                    if strm.avail_out() == 0 {
                        self.last_flush = LastFlush::OutputFull;
                    }
                    return Ok(Status::Ok);
                }
                BlockState::BlockDone => {
                    if flush == Flush::Partial {
                        trees::align(&mut self.pending);
                    } else if flush != Flush::Block {
                        trees::stored_block(&mut self.pending, &[], false);
                        if flush == Flush::Full {
                            self.w.clear_hash();
                            if self.w.lookahead == 0 {
                                self.w.strstart = 0;
                                self.w.block_start = 0;
                                self.w.insert = 0;
                            }
                        }
                    }
                    flush_pending(&mut self.pending, strm, &mut self.info);
                    if strm.avail_out() == 0 {
                        self.last_flush = LastFlush::OutputFull;
                        return Ok(Status::Ok);
                    }
                }
                BlockState::FinishDone => {}
            }
        }

        if flush != Flush::Finish {
            return Ok(Status::Ok);
        }
        if self.wrap == Wrap::Raw || self.trailer_written {
            return Ok(Status::StreamEnd);
        }

        let adler = self.info.adler;
        if self.wrap == Wrap::Gzip {
            self.pending.put_u32_le(adler);
            self.pending.put_u32_le(self.info.total_in as u32);
        } else {
            self.pending.put_short_msb((adler >> 16) as u16);
            self.pending.put_short_msb(adler as u16);
        }
        flush_pending(&mut self.pending, strm, &mut self.info);
        self.trailer_written = true;
        trace!("deflate trailer written, check={:08x}", adler);

        Ok(if self.pending.pending() != 0 {
            Status::Ok
        } else {
            Status::StreamEnd
        })
    }

    /// Emit whatever part of the zlib or gzip header is still due.
    ///
    /// Returns `Some(Ok)` when the output filled up before the header was
    /// complete.
    fn write_header(&mut self, strm: &mut StreamContext<'_>) -> Option<Status> {
        if self.status == DeflateStatus::Init && self.wrap == Wrap::Raw {
            self.status = DeflateStatus::Busy;
        }

        if self.status == DeflateStatus::Init {
            let mut header = (Z_DEFLATED as u16 + ((self.w.w_bits as u16 - 8) << 4)) << 8;
            let level_flags: u16 = if self.is_huffman_class() || self.level < 2 {
                0
            } else if self.level < 6 {
                1
            } else if self.level == 6 {
                2
            } else {
                3
            };
            header |= level_flags << 6;
            if self.w.strstart != 0 {
                header |= PRESET_DICT;
            }
            header += 31 - (header % 31);

            self.pending.put_short_msb(header);
            if self.w.strstart != 0 {
                self.pending.put_short_msb((self.info.adler >> 16) as u16);
                self.pending.put_short_msb(self.info.adler as u16);
            }
            self.info.adler = 1;
            self.status = DeflateStatus::Busy;

            flush_pending(&mut self.pending, strm, &mut self.info);
            if self.pending.pending() != 0 {
                self.last_flush = LastFlush::OutputFull;
                return Some(Status::Ok);
            }
        }

        if self.status == DeflateStatus::Gzip {
            self.info.adler = 0;
            let xfl = if self.level == 9 {
                2
            } else if self.is_huffman_class() || self.level < 2 {
                4
            } else {
                0
            };
            let mark = self.pending.mark();
            self.pending.put_bytes(&GZIP_MAGIC);
            self.pending.put_byte(CM_DEFLATE);

            match &self.gzhead {
                None => {
                    self.pending.put_byte(0);
                    self.pending.put_u32_le(0);
                    self.pending.put_byte(xfl);
                    self.pending.put_byte(OS_CODE);
                    self.status = DeflateStatus::Busy;

                    flush_pending(&mut self.pending, strm, &mut self.info);
                    if self.pending.pending() != 0 {
                        self.last_flush = LastFlush::OutputFull;
                        return Some(Status::Ok);
                    }
                }
                Some(head) => {
                    self.pending.put_byte(head.flags());
                    self.pending.put_u32_le(head.mtime);
                    self.pending.put_byte(xfl);
                    self.pending.put_byte(head.os);
                    if head.extra.is_some() {
                        self.pending.put_short(head.extra_len() as u16);
                    }
                    hcrc_update(&self.pending, &mut self.info, head.hcrc, mark);
                    self.status = DeflateStatus::Extra { index: 0 };
                }
            }
        }

        if let DeflateStatus::Extra { mut index } = self.status {
            if let Some(head) = &self.gzhead {
                if let Some(extra) = &head.extra {
                    let extra = &extra[..head.extra_len()];
                    let mut beg = self.pending.mark();
                    let mut left = extra.len() - index;
                    while self.pending.pending() + left > self.pending.capacity() {
                        let copy = self.pending.capacity().saturating_sub(self.pending.pending());
                        self.pending.put_bytes(&extra[index..index + copy]);
                        hcrc_update(&self.pending, &mut self.info, head.hcrc, beg);
                        index += copy;
                        flush_pending(&mut self.pending, strm, &mut self.info);
                        if self.pending.pending() != 0 {
                            self.status = DeflateStatus::Extra { index };
                            self.last_flush = LastFlush::OutputFull;
                            return Some(Status::Ok);
                        }
                        beg = self.pending.mark();
                        left -= copy;
                    }
                    self.pending.put_bytes(&extra[index..index + left]);
                    hcrc_update(&self.pending, &mut self.info, head.hcrc, beg);
                }
            }
            self.status = DeflateStatus::Name { index: 0 };
        }

        if let DeflateStatus::Name { mut index } = self.status {
            if let Some(head) = &self.gzhead {
                if let Some(name) = &head.filename {
                    let done = put_terminated(
                        &mut self.pending,
                        strm,
                        &mut self.info,
                        name,
                        &mut index,
                        head.hcrc,
                    );
                    if !done {
                        self.status = DeflateStatus::Name { index };
                        self.last_flush = LastFlush::OutputFull;
                        return Some(Status::Ok);
                    }
                }
            }
            self.status = DeflateStatus::Comment { index: 0 };
        }

        if let DeflateStatus::Comment { mut index } = self.status {
            if let Some(head) = &self.gzhead {
                if let Some(comment) = &head.comment {
                    let done = put_terminated(
                        &mut self.pending,
                        strm,
                        &mut self.info,
                        comment,
                        &mut index,
                        head.hcrc,
                    );
                    if !done {
                        self.status = DeflateStatus::Comment { index };
                        self.last_flush = LastFlush::OutputFull;
                        return Some(Status::Ok);
                    }
                }
            }
            self.status = DeflateStatus::Hcrc;
        }

        if self.status == DeflateStatus::Hcrc {
            if self.gzhead.as_ref().is_some_and(|head| head.hcrc) {
                if self.pending.pending() + 2 > self.pending.capacity() {
                    flush_pending(&mut self.pending, strm, &mut self.info);
                    if self.pending.pending() != 0 {
                        self.last_flush = LastFlush::OutputFull;
                        return Some(Status::Ok);
                    }
                }
                self.pending.put_short(self.info.adler as u16);
                self.info.adler = 0;
            }
            self.status = DeflateStatus::Busy;

            flush_pending(&mut self.pending, strm, &mut self.info);
            if self.pending.pending() != 0 {
                self.last_flush = LastFlush::OutputFull;
                return Some(Status::Ok);
            }
        }

        None
    }

    /// Emit the current block and deliver what fits.
    fn flush_block_only(&mut self, strm: &mut StreamContext<'_>, last: bool) {
        let stored_len = (self.w.strstart as i64 - self.w.block_start) as usize;
        let stored = if self.w.block_start >= 0 {
            let start = self.w.block_start as usize;
            Some(&self.w.window[start..start + stored_len])
        } else {
            None
        };
        self.trees.flush_block(
            &mut self.pending,
            stored,
            stored_len,
            last,
            self.level,
            self.strategy,
            &mut self.info.data_type,
        );
        self.w.block_start = self.w.strstart as i64;
        flush_pending(&mut self.pending, strm, &mut self.info);
    }

    /// Copy `len` input bytes straight to the output.
    fn copy_input_to_output(&mut self, strm: &mut StreamContext<'_>, len: usize) {
        let input: &[u8] = strm.input;
        let src = &input[strm.next_in..strm.next_in + len];
        match self.wrap {
            Wrap::Zlib => self.info.adler = adler32(self.info.adler, src),
            Wrap::Gzip => self.info.adler = crc32(self.info.adler, src),
            Wrap::Raw => {}
        }
        strm.write_output(src);
        strm.next_in += len;
        self.info.total_in += len as u64;
        self.info.total_out += len as u64;
    }

    /// Move the upper half of the window down. Slides are counted in
    /// `matches`, which a later level change uses to repair the hash.
    fn slide_for_stored(&mut self) {
        let w_size = self.w.w_size;
        self.w.block_start -= w_size as i64;
        self.w.strstart -= w_size;
        let strstart = self.w.strstart;
        self.w.window.copy_within(w_size..w_size + strstart, 0);
        if self.trees.matches < 2 {
            self.trees.matches += 1;
        }
        if self.w.insert > self.w.strstart {
            self.w.insert = self.w.strstart;
        }
    }

    /// Level 0: emit stored blocks, copying straight from input to output
    /// where possible and through the window otherwise.
    fn deflate_stored(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> BlockState {
        let w_size = self.w.w_size;
        let window_size = 2 * w_size;
        let pending_size = self.pending.capacity();
        let mut min_block = (pending_size - 5).min(w_size);
        let mut last = false;
        let used = strm.avail_in();

        self.pending.flush_bits();
        loop {
            let mut len = MAX_STORED;
            let header = (self.pending.bit_count() as usize + 42) >> 3;
            if strm.avail_out() < header {
                break;
            }
            let have = strm.avail_out() - header;
            let mut left = (self.w.strstart as i64 - self.w.block_start) as usize;
            let available = left + strm.avail_in();
            len = len.min(available).min(have);

            if len < min_block
                && ((len == 0 && flush != Flush::Finish)
                    || flush == Flush::NoFlush
                    || len != available)
            {
                break;
            }

            last = flush == Flush::Finish && len == available;
            trees::stored_header(&mut self.pending, len, last);
            flush_pending(&mut self.pending, strm, &mut self.info);

            if left > 0 {
                left = left.min(len);
                let start = self.w.block_start as usize;
                strm.write_output(&self.w.window[start..start + left]);
                self.info.total_out += left as u64;
                self.w.block_start += left as i64;
                len -= left;
            }
            if len > 0 {
                self.copy_input_to_output(strm, len);
            }
            if last {
                break;
            }
        }

        // Keep the last window of consumed input for a later level change.
        let used = used - strm.avail_in();
        if used > 0 {
            let input: &[u8] = strm.input;
            let next_in = strm.next_in;
            if used >= w_size {
                self.trees.matches = 2;
                self.w.window[..w_size].copy_from_slice(&input[next_in - w_size..next_in]);
                self.w.strstart = w_size;
                self.w.insert = w_size;
            } else {
                if window_size - self.w.strstart <= used {
                    self.slide_for_stored();
                }
                let start = self.w.strstart;
                self.w.window[start..start + used].copy_from_slice(&input[next_in - used..next_in]);
                self.w.strstart += used;
                self.w.insert += used.min(w_size - self.w.insert);
            }
            self.w.block_start = self.w.strstart as i64;
        }

        if last {
            return BlockState::FinishDone;
        }
        if flush != Flush::NoFlush
            && flush != Flush::Finish
            && strm.avail_in() == 0
            && self.w.strstart as i64 == self.w.block_start
        {
            return BlockState::BlockDone;
        }

        // Fill the window with whatever input is left.
        let mut have = window_size - self.w.strstart;
        if strm.avail_in() > have && self.w.block_start >= w_size as i64 {
            self.slide_for_stored();
            have += w_size;
        }
        have = have.min(strm.avail_in());
        if have > 0 {
            let at = self.w.strstart;
            let wrap = self.wrap.checksum_kind();
            self.w.read_buf(strm, &mut self.info, wrap, at, have);
            self.w.strstart += have;
            self.w.insert += have.min(w_size - self.w.insert);
        }

        // Emit a stored block if there is enough for one, or if flushing
        // and everything fits in the pending buffer.
        let header = (self.pending.bit_count() as usize + 42) >> 3;
        let have = (pending_size - header).min(MAX_STORED);
        min_block = have.min(w_size);
        let left = (self.w.strstart as i64 - self.w.block_start) as usize;
        if left >= min_block
            || ((left > 0 || flush == Flush::Finish)
                && flush != Flush::NoFlush
                && strm.avail_in() == 0
                && left <= have)
        {
            let len = left.min(have);
            last = flush == Flush::Finish && strm.avail_in() == 0 && len == left;
            let start = self.w.block_start as usize;
            trees::stored_block(&mut self.pending, &self.w.window[start..start + len], last);
            self.w.block_start += len as i64;
            flush_pending(&mut self.pending, strm, &mut self.info);
        }

        if last {
            BlockState::FinishStarted
        } else {
            BlockState::NeedMore
        }
    }

    /// Greedy matching: take the match at each position, no lazy
    /// evaluation. Short matches are inserted into the hash table in full.
    fn deflate_fast(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> BlockState {
        let wrap = self.wrap.checksum_kind();
        loop {
            if self.w.lookahead < MIN_LOOKAHEAD {
                self.w.fill_window(strm, &mut self.info, wrap);
                if self.w.lookahead < MIN_LOOKAHEAD && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.w.lookahead == 0 {
                    break;
                }
            }

            let mut hash_head = 0;
            if self.w.lookahead >= MIN_MATCH {
                hash_head = self.w.insert_string(self.w.strstart);
            }
            if hash_head != 0 && self.w.strstart - hash_head <= self.w.max_dist() {
                self.w.match_length = self.w.longest_match(hash_head);
            }

            let bflush = if self.w.match_length >= MIN_MATCH {
                let bflush = self.trees.tally_dist(
                    self.w.strstart - self.w.match_start,
                    self.w.match_length - MIN_MATCH,
                );
                self.w.lookahead -= self.w.match_length;

                if self.w.match_length <= self.w.params.max_lazy && self.w.lookahead >= MIN_MATCH {
                    self.w.match_length -= 1;
                    while self.w.match_length != 0 {
                        self.w.strstart += 1;
                        self.w.insert_string(self.w.strstart);
                        self.w.match_length -= 1;
                    }
                    self.w.strstart += 1;
                } else {
                    self.w.strstart += self.w.match_length;
                    self.w.match_length = 0;
                    let s = self.w.strstart;
                    self.w.ins_h = self.w.window[s] as usize;
                    self.w.ins_h = self.w.update_hash(self.w.ins_h, self.w.window[s + 1]);
                }
                bflush
            } else {
                let bflush = self.trees.tally_lit(self.w.window[self.w.strstart]);
                self.w.lookahead -= 1;
                self.w.strstart += 1;
                bflush
            };

            if bflush {
                flush_block!(self, strm, false);
            }
        }

        self.w.insert = self.w.strstart.min(MIN_MATCH - 1);
        if flush == Flush::Finish {
            flush_block!(self, strm, true);
            return BlockState::FinishDone;
        }
        if self.trees.has_symbols() {
            flush_block!(self, strm, false);
        }
        BlockState::BlockDone
    }

    /// Lazy matching: a match is only taken if the next position does not
    /// start a longer one.
    fn deflate_slow(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> BlockState {
        let wrap = self.wrap.checksum_kind();
        loop {
            if self.w.lookahead < MIN_LOOKAHEAD {
                self.w.fill_window(strm, &mut self.info, wrap);
                if self.w.lookahead < MIN_LOOKAHEAD && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.w.lookahead == 0 {
                    break;
                }
            }

            let mut hash_head = 0;
            if self.w.lookahead >= MIN_MATCH {
                hash_head = self.w.insert_string(self.w.strstart);
            }

            self.w.prev_length = self.w.match_length;
            self.w.prev_match = self.w.match_start;
            self.w.match_length = MIN_MATCH - 1;

            if hash_head != 0
                && self.w.prev_length < self.w.params.max_lazy
                && self.w.strstart - hash_head <= self.w.max_dist()
            {
                self.w.match_length = self.w.longest_match(hash_head);
                if self.w.match_length <= 5
                    && (self.strategy == Strategy::Filtered
                        || (self.w.match_length == MIN_MATCH
                            && self.w.strstart - self.w.match_start > TOO_FAR))
                {
                    self.w.match_length = MIN_MATCH - 1;
                }
            }

            if self.w.prev_length >= MIN_MATCH && self.w.match_length <= self.w.prev_length {
                let max_insert = self.w.strstart + self.w.lookahead - MIN_MATCH;
                let bflush = self.trees.tally_dist(
                    self.w.strstart - 1 - self.w.prev_match,
                    self.w.prev_length - MIN_MATCH,
                );
                self.w.lookahead -= self.w.prev_length - 1;
                self.w.prev_length -= 2;
                while self.w.prev_length != 0 {
                    self.w.strstart += 1;
                    if self.w.strstart <= max_insert {
                        self.w.insert_string(self.w.strstart);
                    }
                    self.w.prev_length -= 1;
                }
                self.w.match_available = false;
                self.w.match_length = MIN_MATCH - 1;
                self.w.strstart += 1;

                if bflush {
                    flush_block!(self, strm, false);
                }
            } else if self.w.match_available {
                let bflush = self.trees.tally_lit(self.w.window[self.w.strstart - 1]);
                if bflush {
                    self.flush_block_only(strm, false);
                }
                self.w.strstart += 1;
                self.w.lookahead -= 1;
                if strm.avail_out() == 0 {
                    return BlockState::NeedMore;
                }
            } else {
                self.w.match_available = true;
                self.w.strstart += 1;
                self.w.lookahead -= 1;
            }
        }

        if self.w.match_available {
            self.trees.tally_lit(self.w.window[self.w.strstart - 1]);
            self.w.match_available = false;
        }
        self.w.insert = self.w.strstart.min(MIN_MATCH - 1);
        if flush == Flush::Finish {
            flush_block!(self, strm, true);
            return BlockState::FinishDone;
        }
        if self.trees.has_symbols() {
            flush_block!(self, strm, false);
        }
        BlockState::BlockDone
    }

    /// Run-length encoding: only matches at distance one.
    fn deflate_rle(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> BlockState {
        let wrap = self.wrap.checksum_kind();
        loop {
            if self.w.lookahead <= MAX_MATCH {
                self.w.fill_window(strm, &mut self.info, wrap);
                if self.w.lookahead <= MAX_MATCH && flush == Flush::NoFlush {
                    return BlockState::NeedMore;
                }
                if self.w.lookahead == 0 {
                    break;
                }
            }

            self.w.match_length = 0;
            if self.w.lookahead >= MIN_MATCH && self.w.strstart > 0 {
                let s = self.w.strstart;
                let prev = self.w.window[s - 1];
                let run = self.w.window[s..s + MAX_MATCH]
                    .iter()
                    .take_while(|&&b| b == prev)
                    .count();
                if run >= MIN_MATCH {
                    self.w.match_length = run.min(self.w.lookahead);
                }
            }

            let bflush = if self.w.match_length >= MIN_MATCH {
                let bflush = self.trees.tally_dist(1, self.w.match_length - MIN_MATCH);
                self.w.lookahead -= self.w.match_length;
                self.w.strstart += self.w.match_length;
                self.w.match_length = 0;
                bflush
            } else {
                let bflush = self.trees.tally_lit(self.w.window[self.w.strstart]);
                self.w.lookahead -= 1;
                self.w.strstart += 1;
                bflush
            };
            if bflush {
                flush_block!(self, strm, false);
            }
        }

        self.w.insert = 0;
        if flush == Flush::Finish {
            flush_block!(self, strm, true);
            return BlockState::FinishDone;
        }
        if self.trees.has_symbols() {
            flush_block!(self, strm, false);
        }
        BlockState::BlockDone
    }

    /// Huffman coding of literals only.
    fn deflate_huff(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> BlockState {
        let wrap = self.wrap.checksum_kind();
        loop {
            if self.w.lookahead == 0 {
                self.w.fill_window(strm, &mut self.info, wrap);
                if self.w.lookahead == 0 {
                    if flush == Flush::NoFlush {
                        return BlockState::NeedMore;
                    }
                    break;
                }
            }

            self.w.match_length = 0;
            let bflush = self.trees.tally_lit(self.w.window[self.w.strstart]);
            self.w.lookahead -= 1;
            self.w.strstart += 1;
            if bflush {
                flush_block!(self, strm, false);
            }
        }

        self.w.insert = 0;
        if flush == Flush::Finish {
            flush_block!(self, strm, true);
            return BlockState::FinishDone;
        }
        if self.trees.has_symbols() {
            flush_block!(self, strm, false);
        }
        BlockState::BlockDone
    }

    /// Whether the stream is complete and fully delivered.
    pub fn is_done(&self) -> bool {
        self.status == DeflateStatus::Finish
            && self.pending.is_empty()
            && (self.wrap == Wrap::Raw || self.trailer_written)
    }
}

impl Default for Deflater {
    fn default() -> Self {
        Self::build(6, 15, 8, Wrap::Zlib, Strategy::Default)
    }
}

impl std::fmt::Debug for Deflater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deflater")
            .field("level", &self.level)
            .field("strategy", &self.strategy)
            .field("wrap", &self.wrap)
            .field("status", &self.status)
            .field("total_in", &self.info.total_in)
            .field("total_out", &self.info.total_out)
            .finish()
    }
}

impl Compressor for Deflater {
    fn compress(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> Result<Status> {
        self.deflate(strm, flush)
    }

    fn reset(&mut self) {
        Deflater::reset(self);
    }

    fn is_finished(&self) -> bool {
        self.is_done()
    }
}
