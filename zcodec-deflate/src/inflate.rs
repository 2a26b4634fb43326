//! DEFLATE decompression engine.
//!
//! [`Inflater`] decodes raw, zlib or gzip streams (or picks between the
//! latter two from the first bytes). It is a resumable state machine: a
//! call consumes what input it can, writes what output fits, and records
//! in [`Mode`] exactly where it stopped, down to a half-read code length
//! table or a partially copied match. Feeding the same stream one byte at
//! a time produces the same output as feeding it all at once.
//!
//! Up to 32 KiB of recent output is kept in a [`SlidingWindow`] so that
//! back-references can reach past the start of the caller's output
//! buffer. The window is only allocated once output actually has to be
//! remembered.

use crate::consts::Z_DEFLATED;
use crate::gzip::{GzipHeader, HEADER_FIELD_MAX, flags, push_capped};
use crate::huffman::{Code, CodeType, ENOUGH, FIXED_DISTBITS, FIXED_LENBITS, fixed_tables, inflate_table};
use crate::inffast::{FAST_MIN_INPUT, FAST_MIN_OUTPUT, FastContext, FastExit, inflate_fast};
use crate::tables::{BL_ORDER, OP_END, OP_INVALID};
use log::{debug, trace};
use zcodec_core::adler32::adler32;
use zcodec_core::bitstream::BitAccumulator;
use zcodec_core::crc::crc32;
use zcodec_core::error::{CodecError, Result, Status};
use zcodec_core::ringbuffer::SlidingWindow;
use zcodec_core::stream::{StreamContext, StreamInfo};
use zcodec_core::traits::{Decompressor, Flush};

/// Largest distance allowed before a header says otherwise.
const DEFAULT_DMAX: usize = 32768;

/// Where the decoder is in the stream. Variants carry the counters of the
/// step they are in the middle of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Waiting for a zlib or gzip header.
    Head,
    /// gzip: method and flag bytes.
    Flags,
    /// gzip: modification time.
    Time,
    /// gzip: extra flags and operating system.
    Os,
    /// gzip: extra field length.
    ExLen,
    /// gzip: extra field bytes.
    Extra { remaining: usize },
    /// gzip: zero-terminated file name.
    Name,
    /// gzip: zero-terminated comment.
    Comment,
    /// gzip: header CRC.
    Hcrc,
    /// zlib: dictionary id.
    DictId,
    /// Waiting for the caller to supply the dictionary.
    Dict,
    /// Block boundary; a `Block` flush stops here.
    Type,
    /// Block header, without the stop check.
    TypeDo,
    /// Stored block length and its complement.
    Stored,
    /// Stored block header read; a `Trees` flush stops here.
    CopyStart { length: usize },
    /// Copying stored bytes.
    Copy { length: usize },
    /// Dynamic block table sizes.
    Table,
    /// Reading the code length code lengths.
    LenLens {
        nlen: usize,
        ndist: usize,
        ncode: usize,
        have: usize,
    },
    /// Reading literal/length and distance code lengths.
    CodeLens { nlen: usize, ndist: usize, have: usize },
    /// Tables ready; a `Trees` flush stops here.
    LenStart,
    /// Decoding a literal/length code.
    Len,
    /// Length extra bits.
    LenExt { length: usize, extra: u32 },
    /// Decoding a distance code.
    Dist { length: usize },
    /// Distance extra bits.
    DistExt {
        length: usize,
        offset: usize,
        extra: u32,
    },
    /// Copying a match.
    Match { length: usize, offset: usize },
    /// Writing a literal.
    Lit { value: u8 },
    /// Trailer check value.
    Check,
    /// gzip trailer length.
    Length,
    /// Stream complete.
    Done,
    /// Corrupt stream; every further call fails the same way.
    Bad(CodecError),
    /// Window allocation failed.
    Mem,
}

impl Mode {
    /// Before the trailer.
    fn before_check(self) -> bool {
        !matches!(
            self,
            Mode::Check | Mode::Length | Mode::Done | Mode::Bad(_) | Mode::Mem
        )
    }

    fn is_failed(self) -> bool {
        matches!(self, Mode::Bad(_) | Mode::Mem)
    }
}

/// Which header has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Unknown,
    Zlib,
    Gzip { flags: u8 },
}

/// Where the current literal/length or distance table lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableRef {
    FixedLen,
    FixedDist,
    Dynamic(usize),
}

fn table_slice(codes: &[Code], table: TableRef) -> &[Code] {
    match table {
        TableRef::FixedLen => &fixed_tables().lencode,
        TableRef::FixedDist => &fixed_tables().distcode,
        TableRef::Dynamic(offset) => &codes[offset..],
    }
}

/// Pull input until `$n` bits are held or leave the state machine.
macro_rules! need_bits {
    ($self:ident, $strm:ident, $n:expr, $leave:lifetime) => {
        if !$self.acc.need($strm, $n) {
            break $leave;
        }
    };
}

/// Pull exactly one more byte or leave the state machine.
macro_rules! pull_byte {
    ($self:ident, $strm:ident, $leave:lifetime) => {
        match $strm.next_byte() {
            Some(byte) => $self.acc.pull_byte(byte),
            None => break $leave,
        }
    };
}

/// Mark the stream corrupt and go round once more to report it.
macro_rules! bad {
    ($self:ident, $err:expr) => {{
        let err: CodecError = $err;
        debug!("inflate error: {}", err.message());
        $self.info.msg = Some(err.message());
        $self.mode = Mode::Bad(err);
        continue;
    }};
}

/// Take bytes up to and including a zero terminator from the input.
/// Returns the bytes consumed and whether the terminator was among them.
fn take_terminated<'a>(strm: &mut StreamContext<'a>) -> (&'a [u8], bool) {
    let input: &'a [u8] = strm.input;
    let avail = &input[strm.next_in..];
    let (len, terminated) = match avail.iter().position(|&b| b == 0) {
        Some(pos) => (pos + 1, true),
        None => (avail.len(), false),
    };
    strm.next_in += len;
    (&avail[..len], terminated)
}

/// Append a header string chunk, without its terminator, to a captured
/// field.
fn capture_string(field: &mut Option<Vec<u8>>, chunk: &[u8], terminated: bool) {
    let text = if terminated {
        &chunk[..chunk.len() - 1]
    } else {
        chunk
    };
    let buf = field.get_or_insert_with(Vec::new);
    let room = HEADER_FIELD_MAX.saturating_sub(buf.len());
    buf.extend_from_slice(&text[..text.len().min(room)]);
}

/// DEFLATE decompressor with optional zlib or gzip framing.
pub struct Inflater {
    info: StreamInfo,
    mode: Mode,
    /// Current block is the final one.
    last: bool,
    accept_zlib: bool,
    accept_gzip: bool,
    /// Compute and verify trailer check values.
    validate: bool,
    havedict: bool,
    framing: Framing,
    dmax: usize,
    check: u32,
    /// Output length for the gzip trailer.
    total: u64,
    head: Option<GzipHeader>,
    /// Window size in bits, 0 until a header supplies it.
    wbits: u32,
    window: SlidingWindow,
    acc: BitAccumulator,
    lencode: TableRef,
    distcode: TableRef,
    lenbits: u32,
    distbits: u32,
    lens: [u16; 320],
    codes: Vec<Code>,
    /// Reject distances reaching before the start of the output.
    sane: bool,
}

impl Inflater {
    /// zlib-wrapped decompressor with a 32 KiB window.
    pub fn new() -> Self {
        Self::build(true, false, 15)
    }

    /// Raw DEFLATE decompressor with a 32 KiB window.
    pub fn raw() -> Self {
        Self::build(false, false, 15)
    }

    /// gzip-wrapped decompressor.
    pub fn gzip() -> Self {
        Self::build(false, true, 0)
    }

    /// Decompressor accepting either a zlib or a gzip header.
    pub fn auto() -> Self {
        Self::build(true, true, 0)
    }

    /// Create a decompressor for the framing and window selected by
    /// `window_bits`.
    ///
    /// * `8..=15`: zlib, window at most `2^window_bits`
    /// * `0`: zlib, window size taken from the header
    /// * `-15..=-8`: raw DEFLATE
    /// * `+16`: gzip only
    /// * `+32`: zlib or gzip, detected from the header
    pub fn init2(window_bits: i32) -> Result<Self> {
        let mut inflater = Self::new();
        inflater.reset2(window_bits)?;
        Ok(inflater)
    }

    fn build(accept_zlib: bool, accept_gzip: bool, wbits: u32) -> Self {
        let mut inflater = Self {
            info: StreamInfo::default(),
            mode: Mode::Head,
            last: false,
            accept_zlib,
            accept_gzip,
            validate: accept_zlib || accept_gzip,
            havedict: false,
            framing: Framing::Unknown,
            dmax: DEFAULT_DMAX,
            check: 0,
            total: 0,
            head: None,
            wbits,
            window: SlidingWindow::new(wbits),
            acc: BitAccumulator::new(),
            lencode: TableRef::Dynamic(0),
            distcode: TableRef::Dynamic(0),
            lenbits: 0,
            distbits: 0,
            lens: [0; 320],
            codes: vec![Code::default(); ENOUGH],
            sane: true,
        };
        inflater.reset();
        inflater
    }

    /// Stream counters and check value.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Total input bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.info.total_in
    }

    /// Total output bytes produced.
    pub fn total_out(&self) -> u64 {
        self.info.total_out
    }

    /// Running check value of the output, or the dictionary id while a
    /// dictionary is wanted.
    pub fn adler(&self) -> u32 {
        self.info.adler
    }

    /// Message for the last error.
    pub fn msg(&self) -> Option<&'static str> {
        self.info.msg
    }

    /// Decoder position bits, as after the last call: bits held in the
    /// accumulator, `64` if the final block has started, `128` at a block
    /// boundary, `256` right after a block header.
    pub fn data_type(&self) -> i32 {
        self.info.data_type
    }

    /// Whether the stream has ended.
    pub fn is_done(&self) -> bool {
        self.mode == Mode::Done
    }

    fn wraps(&self) -> bool {
        self.accept_zlib || self.accept_gzip
    }

    fn gz_flags(&self) -> u8 {
        match self.framing {
            Framing::Gzip { flags } => flags,
            _ => 0,
        }
    }

    /// Fold header bytes into the header CRC if the member carries one.
    fn header_crc(&mut self, bytes: &[u8]) {
        if self.gz_flags() & flags::FHCRC != 0 && self.validate {
            self.check = crc32(self.check, bytes);
        }
    }

    fn update_check(&self, check: u32, data: &[u8]) -> u32 {
        match self.framing {
            Framing::Gzip { .. } => crc32(check, data),
            _ => adler32(check, data),
        }
    }

    /// Reset the stream state, keeping the window contents.
    pub fn reset_keep(&mut self) {
        self.info.reset();
        self.total = 0;
        if self.wraps() {
            self.info.adler = u32::from(self.accept_zlib);
        }
        self.mode = Mode::Head;
        self.last = false;
        self.havedict = false;
        self.framing = Framing::Unknown;
        self.dmax = DEFAULT_DMAX;
        self.head = None;
        self.acc.clear();
        self.lencode = TableRef::Dynamic(0);
        self.distcode = TableRef::Dynamic(0);
        self.sane = true;
    }

    /// Start a new stream with the same configuration.
    pub fn reset(&mut self) {
        self.window.clear();
        self.reset_keep();
        debug!(
            "inflate reset: zlib={} gzip={} wbits={}",
            self.accept_zlib, self.accept_gzip, self.wbits
        );
    }

    /// Start a new stream with a different framing or window size. See
    /// [`Inflater::init2`] for `window_bits`.
    pub fn reset2(&mut self, window_bits: i32) -> Result<()> {
        let (accept_zlib, accept_gzip, wbits) = if window_bits < 0 {
            if window_bits < -15 {
                return Err(CodecError::usage("invalid window size"));
            }
            (false, false, -window_bits)
        } else {
            let wrap = (window_bits >> 4) + 5;
            let wbits = if window_bits < 48 {
                window_bits & 15
            } else {
                window_bits
            };
            (wrap & 1 != 0, wrap & 2 != 0, wbits)
        };
        if wbits != 0 && !(8..=15).contains(&wbits) {
            return Err(CodecError::usage("invalid window size"));
        }

        let wbits = wbits as u32;
        if wbits != self.wbits {
            self.window.release();
        }
        self.accept_zlib = accept_zlib;
        self.accept_gzip = accept_gzip;
        self.validate = accept_zlib || accept_gzip;
        self.wbits = wbits;
        self.reset();
        Ok(())
    }

    /// Supply the preset dictionary.
    ///
    /// For zlib streams this is only accepted right after
    /// [`Inflater::inflate`] returned [`Status::NeedDict`], and the
    /// dictionary must match the id in the header. Raw streams accept one
    /// at any time.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        if self.wraps() && self.mode != Mode::Dict {
            return Err(CodecError::usage("dictionary not expected"));
        }
        if self.mode == Mode::Dict && adler32(1, dictionary) != self.check {
            debug!("inflate dictionary rejected: id {:08x}", self.check);
            return Err(CodecError::protocol("incorrect dictionary"));
        }
        if let Err(err) = self.update_window(dictionary) {
            self.mode = Mode::Mem;
            return Err(err);
        }
        self.havedict = true;
        debug!("inflate dictionary: {} bytes", dictionary.len());
        Ok(())
    }

    /// Copy of the current window contents, oldest byte first.
    pub fn get_dictionary(&self) -> Vec<u8> {
        self.window.contents()
    }

    /// Capture the next gzip member header. The record fills in as the
    /// header is parsed; [`GzipHeader::done`] is set once it is complete.
    pub fn get_header(&mut self) -> Result<()> {
        if !self.accept_gzip {
            return Err(CodecError::usage("header capture needs gzip framing"));
        }
        self.head = Some(GzipHeader {
            os: 0,
            ..GzipHeader::default()
        });
        Ok(())
    }

    /// The captured gzip header, if one was requested.
    pub fn header(&self) -> Option<&GzipHeader> {
        self.head.as_ref()
    }

    /// Allow distances reaching before the start of the output and fill
    /// those bytes with zeros instead of failing. Lasts until the next
    /// reset.
    pub fn undermine(&mut self, subvert: bool) {
        self.sane = !subvert;
    }

    /// Turn trailer check value verification on or off. Has no effect on
    /// raw streams.
    pub fn validate(&mut self, check: bool) {
        self.validate = check && self.wraps();
    }

    /// Release the decompressor.
    pub fn end(self) -> Result<()> {
        debug!("inflate end: total_out={}", self.info.total_out);
        Ok(())
    }

    fn update_window(&mut self, data: &[u8]) -> Result<()> {
        if self.window.wsize() == 0 && self.window.wbits() != self.wbits {
            self.window.set_wbits(self.wbits);
        }
        self.window.update(data)
    }

    /// Decode as much of `strm` as possible.
    ///
    /// Returns [`Status::StreamEnd`] once the trailer has been checked,
    /// [`Status::NeedDict`] when the zlib header asks for a dictionary and
    /// none has been set, and a buffer error when no progress was possible
    /// or when `Finish` was asked for but the stream is not complete.
    ///
    /// `Block` returns at the next block boundary; `Trees` also returns
    /// right after each block header.
    pub fn inflate(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> Result<Status> {
        if self.mode == Mode::Type {
            self.mode = Mode::TypeDo;
        }
        let in_start = strm.next_in;
        let mut out_mark = strm.next_out;
        let mut ret: Result<Status> = Ok(Status::Ok);

        'leave: loop {
            match self.mode {
                Mode::Head => {
                    if !self.wraps() {
                        self.mode = Mode::TypeDo;
                        continue;
                    }
                    need_bits!(self, strm, 16, 'leave);
                    let hold = self.acc.peek(16);
                    if self.accept_gzip && hold == 0x8B1F {
                        if self.wbits == 0 {
                            self.wbits = 15;
                        }
                        self.check = crc32(0, &(hold as u16).to_le_bytes());
                        self.acc.clear();
                        self.framing = Framing::Gzip { flags: 0 };
                        self.mode = Mode::Flags;
                        continue;
                    }
                    let cmf = hold & 0xFF;
                    if !self.accept_zlib || ((cmf << 8) | (hold >> 8)) % 31 != 0 {
                        bad!(self, CodecError::protocol("incorrect header check"));
                    }
                    if cmf & 0x0F != Z_DEFLATED as u32 {
                        bad!(self, CodecError::protocol("unknown compression method"));
                    }
                    let len = (cmf >> 4) + 8;
                    if self.wbits == 0 {
                        self.wbits = len;
                    }
                    if len > 15 || len > self.wbits {
                        bad!(self, CodecError::protocol("invalid window size"));
                    }
                    self.dmax = 1 << len;
                    self.framing = Framing::Zlib;
                    self.check = 1;
                    self.info.adler = 1;
                    trace!("inflate zlib header ok, window bits {}", len);
                    self.mode = if hold & 0x2000 != 0 {
                        Mode::DictId
                    } else {
                        Mode::Type
                    };
                    self.acc.clear();
                }
                Mode::Flags => {
                    need_bits!(self, strm, 16, 'leave);
                    let hold = self.acc.peek(16);
                    if hold & 0xFF != Z_DEFLATED as u32 {
                        bad!(self, CodecError::protocol("unknown compression method"));
                    }
                    let flg = (hold >> 8) as u8;
                    if flg & flags::RESERVED != 0 {
                        bad!(self, CodecError::protocol("unknown header flags set"));
                    }
                    self.framing = Framing::Gzip { flags: flg };
                    if let Some(head) = &mut self.head {
                        head.text = flg & flags::FTEXT != 0;
                    }
                    self.header_crc(&(hold as u16).to_le_bytes());
                    self.acc.clear();
                    self.mode = Mode::Time;
                }
                Mode::Time => {
                    need_bits!(self, strm, 32, 'leave);
                    let mtime = self.acc.peek(32);
                    if let Some(head) = &mut self.head {
                        head.mtime = mtime;
                    }
                    self.header_crc(&mtime.to_le_bytes());
                    self.acc.clear();
                    self.mode = Mode::Os;
                }
                Mode::Os => {
                    need_bits!(self, strm, 16, 'leave);
                    let hold = self.acc.peek(16);
                    if let Some(head) = &mut self.head {
                        head.xfl = hold as u8;
                        head.os = (hold >> 8) as u8;
                    }
                    self.header_crc(&(hold as u16).to_le_bytes());
                    self.acc.clear();
                    self.mode = Mode::ExLen;
                }
                Mode::ExLen => {
                    if self.gz_flags() & flags::FEXTRA != 0 {
                        need_bits!(self, strm, 16, 'leave);
                        let hold = self.acc.peek(16);
                        if let Some(head) = &mut self.head {
                            head.extra = Some(Vec::with_capacity(hold as usize));
                        }
                        self.header_crc(&(hold as u16).to_le_bytes());
                        self.acc.clear();
                        self.mode = Mode::Extra {
                            remaining: hold as usize,
                        };
                    } else {
                        if let Some(head) = &mut self.head {
                            head.extra = None;
                        }
                        self.mode = Mode::Extra { remaining: 0 };
                    }
                }
                Mode::Extra { remaining } => {
                    if remaining > 0 {
                        let copy = remaining.min(strm.avail_in());
                        if copy == 0 {
                            break 'leave;
                        }
                        let input: &[u8] = strm.input;
                        let bytes = &input[strm.next_in..strm.next_in + copy];
                        if let Some(head) = &mut self.head {
                            for &byte in bytes {
                                push_capped(&mut head.extra, byte);
                            }
                        }
                        self.header_crc(bytes);
                        strm.next_in += copy;
                        self.mode = Mode::Extra {
                            remaining: remaining - copy,
                        };
                        continue;
                    }
                    self.mode = Mode::Name;
                }
                Mode::Name => {
                    if self.gz_flags() & flags::FNAME != 0 {
                        if strm.avail_in() == 0 {
                            break 'leave;
                        }
                        let (chunk, terminated) = take_terminated(strm);
                        if let Some(head) = &mut self.head {
                            capture_string(&mut head.filename, chunk, terminated);
                        }
                        self.header_crc(chunk);
                        if !terminated {
                            break 'leave;
                        }
                    } else if let Some(head) = &mut self.head {
                        head.filename = None;
                    }
                    self.mode = Mode::Comment;
                }
                Mode::Comment => {
                    if self.gz_flags() & flags::FCOMMENT != 0 {
                        if strm.avail_in() == 0 {
                            break 'leave;
                        }
                        let (chunk, terminated) = take_terminated(strm);
                        if let Some(head) = &mut self.head {
                            capture_string(&mut head.comment, chunk, terminated);
                        }
                        self.header_crc(chunk);
                        if !terminated {
                            break 'leave;
                        }
                    } else if let Some(head) = &mut self.head {
                        head.comment = None;
                    }
                    self.mode = Mode::Hcrc;
                }
                Mode::Hcrc => {
                    let has_hcrc = self.gz_flags() & flags::FHCRC != 0;
                    if has_hcrc {
                        need_bits!(self, strm, 16, 'leave);
                        if self.validate && self.acc.peek(16) != self.check & 0xFFFF {
                            bad!(self, CodecError::protocol("header crc mismatch"));
                        }
                        self.acc.clear();
                    }
                    if let Some(head) = &mut self.head {
                        head.hcrc = has_hcrc;
                        head.done = true;
                    }
                    trace!("inflate gzip header ok, flags {:02x}", self.gz_flags());
                    self.check = 0;
                    self.info.adler = 0;
                    self.mode = Mode::Type;
                }
                Mode::DictId => {
                    need_bits!(self, strm, 32, 'leave);
                    let id = self.acc.peek(32).swap_bytes();
                    self.check = id;
                    self.info.adler = id;
                    self.acc.clear();
                    self.mode = Mode::Dict;
                }
                Mode::Dict => {
                    if !self.havedict {
                        ret = Ok(Status::NeedDict);
                        break 'leave;
                    }
                    self.check = 1;
                    self.info.adler = 1;
                    self.mode = Mode::Type;
                }
                Mode::Type => {
                    if matches!(flush, Flush::Block | Flush::Trees) {
                        break 'leave;
                    }
                    self.mode = Mode::TypeDo;
                }
                Mode::TypeDo => {
                    if self.last {
                        self.acc.byte_align();
                        self.mode = Mode::Check;
                        continue;
                    }
                    need_bits!(self, strm, 3, 'leave);
                    self.last = self.acc.take(1) == 1;
                    match self.acc.peek(2) {
                        0 => {
                            trace!("inflate stored block{}", if self.last { " (last)" } else { "" });
                            self.mode = Mode::Stored;
                        }
                        1 => {
                            trace!("inflate fixed block{}", if self.last { " (last)" } else { "" });
                            self.lencode = TableRef::FixedLen;
                            self.lenbits = FIXED_LENBITS;
                            self.distcode = TableRef::FixedDist;
                            self.distbits = FIXED_DISTBITS;
                            self.mode = Mode::LenStart;
                            if flush == Flush::Trees {
                                self.acc.drop_bits(2);
                                break 'leave;
                            }
                        }
                        2 => {
                            trace!("inflate dynamic block{}", if self.last { " (last)" } else { "" });
                            self.mode = Mode::Table;
                        }
                        _ => bad!(self, CodecError::encoding("invalid block type")),
                    }
                    self.acc.drop_bits(2);
                }
                Mode::Stored => {
                    self.acc.byte_align();
                    need_bits!(self, strm, 32, 'leave);
                    let hold = self.acc.peek(32);
                    if hold & 0xFFFF != (hold >> 16) ^ 0xFFFF {
                        bad!(self, CodecError::encoding("invalid stored block lengths"));
                    }
                    let length = (hold & 0xFFFF) as usize;
                    self.acc.clear();
                    self.mode = Mode::CopyStart { length };
                    if flush == Flush::Trees {
                        break 'leave;
                    }
                }
                Mode::CopyStart { length } => {
                    self.mode = Mode::Copy { length };
                }
                Mode::Copy { length } => {
                    if length > 0 {
                        let copy = length.min(strm.avail_in()).min(strm.avail_out());
                        if copy == 0 {
                            break 'leave;
                        }
                        let input: &[u8] = strm.input;
                        let (from, to) = (strm.next_in, strm.next_out);
                        strm.output[to..to + copy].copy_from_slice(&input[from..from + copy]);
                        strm.next_in += copy;
                        strm.next_out += copy;
                        self.mode = Mode::Copy {
                            length: length - copy,
                        };
                        continue;
                    }
                    self.mode = Mode::Type;
                }
                Mode::Table => {
                    need_bits!(self, strm, 14, 'leave);
                    let nlen = self.acc.take(5) as usize + 257;
                    let ndist = self.acc.take(5) as usize + 1;
                    let ncode = self.acc.take(4) as usize + 4;
                    if nlen > 286 || ndist > 30 {
                        bad!(self, CodecError::encoding("too many length or distance symbols"));
                    }
                    self.mode = Mode::LenLens {
                        nlen,
                        ndist,
                        ncode,
                        have: 0,
                    };
                }
                Mode::LenLens {
                    nlen,
                    ndist,
                    ncode,
                    have,
                } => {
                    if have < ncode {
                        need_bits!(self, strm, 3, 'leave);
                        self.lens[BL_ORDER[have] as usize] = self.acc.take(3) as u16;
                        self.mode = Mode::LenLens {
                            nlen,
                            ndist,
                            ncode,
                            have: have + 1,
                        };
                        continue;
                    }
                    for &order in &BL_ORDER[ncode..] {
                        self.lens[order as usize] = 0;
                    }
                    match inflate_table(CodeType::Codes, &self.lens[..19], &mut self.codes, 7) {
                        Ok((_, root)) => {
                            self.lencode = TableRef::Dynamic(0);
                            self.lenbits = root;
                        }
                        Err(_) => bad!(self, CodecError::encoding("invalid code lengths set")),
                    }
                    self.mode = Mode::CodeLens {
                        nlen,
                        ndist,
                        have: 0,
                    };
                }
                Mode::CodeLens { nlen, ndist, have } => {
                    let total = nlen + ndist;
                    if have < total {
                        let here = loop {
                            let index = self.acc.peek(self.lenbits) as usize;
                            let here = table_slice(&self.codes, self.lencode)[index];
                            if u32::from(here.bits) <= self.acc.bits() {
                                break here;
                            }
                            pull_byte!(self, strm, 'leave);
                        };
                        let code_bits = u32::from(here.bits);
                        if here.val < 16 {
                            self.acc.drop_bits(code_bits);
                            self.lens[have] = here.val;
                            self.mode = Mode::CodeLens {
                                nlen,
                                ndist,
                                have: have + 1,
                            };
                            continue;
                        }
                        let (len, copy) = match here.val {
                            16 => {
                                need_bits!(self, strm, code_bits + 2, 'leave);
                                self.acc.drop_bits(code_bits);
                                if have == 0 {
                                    bad!(self, CodecError::encoding("invalid bit length repeat"));
                                }
                                (self.lens[have - 1], 3 + self.acc.take(2) as usize)
                            }
                            17 => {
                                need_bits!(self, strm, code_bits + 3, 'leave);
                                self.acc.drop_bits(code_bits);
                                (0, 3 + self.acc.take(3) as usize)
                            }
                            _ => {
                                need_bits!(self, strm, code_bits + 7, 'leave);
                                self.acc.drop_bits(code_bits);
                                (0, 11 + self.acc.take(7) as usize)
                            }
                        };
                        if have + copy > total {
                            bad!(self, CodecError::encoding("invalid bit length repeat"));
                        }
                        self.lens[have..have + copy].fill(len);
                        self.mode = Mode::CodeLens {
                            nlen,
                            ndist,
                            have: have + copy,
                        };
                        continue;
                    }

                    if self.lens[256] == 0 {
                        bad!(self, CodecError::encoding("invalid code -- missing end-of-block"));
                    }
                    let used = match inflate_table(CodeType::Lens, &self.lens[..nlen], &mut self.codes, 9) {
                        Ok((used, root)) => {
                            self.lencode = TableRef::Dynamic(0);
                            self.lenbits = root;
                            used
                        }
                        Err(_) => bad!(self, CodecError::encoding("invalid literal/lengths set")),
                    };
                    match inflate_table(
                        CodeType::Dists,
                        &self.lens[nlen..total],
                        &mut self.codes[used..],
                        6,
                    ) {
                        Ok((_, root)) => {
                            self.distcode = TableRef::Dynamic(used);
                            self.distbits = root;
                        }
                        Err(_) => bad!(self, CodecError::encoding("invalid distances set")),
                    }
                    trace!("inflate dynamic tables: nlen={} ndist={}", nlen, ndist);
                    self.mode = Mode::LenStart;
                    if flush == Flush::Trees {
                        break 'leave;
                    }
                }
                Mode::LenStart => {
                    self.mode = Mode::Len;
                }
                Mode::Len => {
                    if strm.avail_in() >= FAST_MIN_INPUT && strm.avail_out() >= FAST_MIN_OUTPUT {
                        let ctx = FastContext {
                            lencode: table_slice(&self.codes, self.lencode),
                            distcode: table_slice(&self.codes, self.distcode),
                            lenbits: self.lenbits,
                            distbits: self.distbits,
                            window: &self.window,
                            dmax: self.dmax,
                            sane: self.sane,
                        };
                        match inflate_fast(strm, &mut self.acc, &ctx, out_mark) {
                            FastExit::Len => {}
                            FastExit::EndOfBlock => self.mode = Mode::Type,
                            FastExit::Bad(message) => bad!(self, CodecError::encoding(message)),
                        }
                        continue;
                    }

                    let mut here = loop {
                        let index = self.acc.peek(self.lenbits) as usize;
                        let here = table_slice(&self.codes, self.lencode)[index];
                        if u32::from(here.bits) <= self.acc.bits() {
                            break here;
                        }
                        pull_byte!(self, strm, 'leave);
                    };
                    if here.op != 0 && here.op & 0xF0 == 0 {
                        let link = here;
                        let link_bits = u32::from(link.bits);
                        here = loop {
                            let index = usize::from(link.val)
                                + (self.acc.peek(link_bits + u32::from(link.op)) >> link_bits) as usize;
                            let here = table_slice(&self.codes, self.lencode)[index];
                            if link_bits + u32::from(here.bits) <= self.acc.bits() {
                                break here;
                            }
                            pull_byte!(self, strm, 'leave);
                        };
                        self.acc.drop_bits(link_bits);
                    }
                    self.acc.drop_bits(u32::from(here.bits));

                    if here.op == 0 {
                        self.mode = Mode::Lit {
                            value: here.val as u8,
                        };
                        continue;
                    }
                    if here.op & OP_END != 0 {
                        self.mode = Mode::Type;
                        continue;
                    }
                    if here.op & OP_INVALID != 0 {
                        bad!(self, CodecError::encoding("invalid literal/length code"));
                    }
                    self.mode = Mode::LenExt {
                        length: usize::from(here.val),
                        extra: u32::from(here.op & 15),
                    };
                }
                Mode::LenExt { mut length, extra } => {
                    if extra > 0 {
                        need_bits!(self, strm, extra, 'leave);
                        length += self.acc.take(extra) as usize;
                    }
                    self.mode = Mode::Dist { length };
                }
                Mode::Dist { length } => {
                    let mut here = loop {
                        let index = self.acc.peek(self.distbits) as usize;
                        let here = table_slice(&self.codes, self.distcode)[index];
                        if u32::from(here.bits) <= self.acc.bits() {
                            break here;
                        }
                        pull_byte!(self, strm, 'leave);
                    };
                    if here.op & 0xF0 == 0 {
                        let link = here;
                        let link_bits = u32::from(link.bits);
                        here = loop {
                            let index = usize::from(link.val)
                                + (self.acc.peek(link_bits + u32::from(link.op)) >> link_bits) as usize;
                            let here = table_slice(&self.codes, self.distcode)[index];
                            if link_bits + u32::from(here.bits) <= self.acc.bits() {
                                break here;
                            }
                            pull_byte!(self, strm, 'leave);
                        };
                        self.acc.drop_bits(link_bits);
                    }
                    self.acc.drop_bits(u32::from(here.bits));
                    if here.op & OP_INVALID != 0 {
                        bad!(self, CodecError::encoding("invalid distance code"));
                    }
                    self.mode = Mode::DistExt {
                        length,
                        offset: usize::from(here.val),
                        extra: u32::from(here.op & 15),
                    };
                }
                Mode::DistExt {
                    length,
                    mut offset,
                    extra,
                } => {
                    if extra > 0 {
                        need_bits!(self, strm, extra, 'leave);
                        offset += self.acc.take(extra) as usize;
                    }
                    if offset > self.dmax {
                        bad!(self, CodecError::encoding("invalid distance too far back"));
                    }
                    self.mode = Mode::Match { length, offset };
                }
                Mode::Match { length, offset } => {
                    let left = strm.avail_out();
                    if left == 0 {
                        break 'leave;
                    }
                    let put = strm.next_out;
                    let produced = put - out_mark;
                    let copied = if offset > produced {
                        let back = offset - produced;
                        let whave = self.window.whave();
                        if back > whave {
                            if self.sane {
                                bad!(self, CodecError::encoding("invalid distance too far back"));
                            }
                            let n = (back - whave).min(length).min(left);
                            strm.output[put..put + n].fill(0);
                            n
                        } else {
                            let run = self.window.history(back);
                            let n = run.len().min(length).min(left);
                            strm.output[put..put + n].copy_from_slice(&run[..n]);
                            n
                        }
                    } else {
                        let n = length.min(left);
                        for i in put..put + n {
                            strm.output[i] = strm.output[i - offset];
                        }
                        n
                    };
                    strm.next_out += copied;
                    let length = length - copied;
                    self.mode = if length == 0 {
                        Mode::Len
                    } else {
                        Mode::Match { length, offset }
                    };
                }
                Mode::Lit { value } => {
                    if strm.avail_out() == 0 {
                        break 'leave;
                    }
                    strm.output[strm.next_out] = value;
                    strm.next_out += 1;
                    self.mode = Mode::Len;
                }
                Mode::Check => {
                    if self.wraps() {
                        need_bits!(self, strm, 32, 'leave);
                        let produced = &strm.output[out_mark..strm.next_out];
                        self.info.total_out += produced.len() as u64;
                        self.total += produced.len() as u64;
                        if self.validate && !produced.is_empty() {
                            self.check = self.update_check(self.check, produced);
                            self.info.adler = self.check;
                        }
                        out_mark = strm.next_out;
                        let hold = self.acc.peek(32);
                        let expected = match self.framing {
                            Framing::Gzip { .. } => hold,
                            _ => hold.swap_bytes(),
                        };
                        if self.validate && expected != self.check {
                            bad!(self, CodecError::protocol("incorrect data check"));
                        }
                        self.acc.clear();
                        trace!("inflate check ok: {:08x}", self.check);
                    }
                    self.mode = Mode::Length;
                }
                Mode::Length => {
                    if self.wraps() && matches!(self.framing, Framing::Gzip { .. }) {
                        need_bits!(self, strm, 32, 'leave);
                        if self.validate && self.acc.peek(32) != self.total as u32 {
                            bad!(self, CodecError::protocol("incorrect length check"));
                        }
                        self.acc.clear();
                    }
                    self.mode = Mode::Done;
                }
                Mode::Done => {
                    ret = Ok(Status::StreamEnd);
                    break 'leave;
                }
                Mode::Bad(err) => {
                    ret = Err(err);
                    break 'leave;
                }
                Mode::Mem => return Err(CodecError::Mem),
            }
        }

        // Remember this call's output in the window unless the stream
        // failed, or finished under Finish with nothing left to refer back to.
        let produced = strm.next_out - out_mark;
        if self.window.wsize() != 0
            || (produced != 0
                && !self.mode.is_failed()
                && (self.mode.before_check() || flush != Flush::Finish))
        {
            let output: &[u8] = &strm.output[out_mark..strm.next_out];
            if let Err(err) = self.update_window(output) {
                self.mode = Mode::Mem;
                return Err(err);
            }
        }

        let consumed = strm.next_in - in_start;
        self.info.total_in += consumed as u64;
        self.info.total_out += produced as u64;
        self.total += produced as u64;
        if self.validate && produced != 0 {
            self.check = self.update_check(self.check, &strm.output[out_mark..strm.next_out]);
            self.info.adler = self.check;
        }
        self.info.data_type = self.acc.bits() as i32
            + if self.last { 64 } else { 0 }
            + if self.mode == Mode::Type { 128 } else { 0 }
            + if matches!(self.mode, Mode::LenStart | Mode::CopyStart { .. }) {
                256
            } else {
                0
            };

        if ((consumed == 0 && produced == 0) || flush == Flush::Finish) && matches!(ret, Ok(Status::Ok)) {
            ret = Err(CodecError::buf("buffer error"));
        }
        ret
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Inflater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inflater")
            .field("mode", &self.mode)
            .field("framing", &self.framing)
            .field("wbits", &self.wbits)
            .field("total_in", &self.info.total_in)
            .field("total_out", &self.info.total_out)
            .finish_non_exhaustive()
    }
}

impl Decompressor for Inflater {
    fn decompress(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> Result<Status> {
        self.inflate(strm, flush)
    }

    fn reset(&mut self) {
        Inflater::reset(self);
    }

    fn is_finished(&self) -> bool {
        self.is_done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::Deflater;
    use zcodec_core::traits::Compressor;

    fn sample(len: usize) -> Vec<u8> {
        let words: &[&[u8]] = &[b"alpha ", b"beta ", b"gamma ", b"delta\n", b"epsilon "];
        let mut out = Vec::with_capacity(len);
        let mut seed = 12345u32;
        while out.len() < len {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            out.extend_from_slice(words[(seed >> 16) as usize % words.len()]);
            if seed % 7 == 0 {
                out.push((seed >> 8) as u8);
            }
        }
        out.truncate(len);
        out
    }

    fn inflate_all(inflater: &mut Inflater, input: &[u8], capacity: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; capacity];
        let mut strm = StreamContext::new(input, &mut out);
        let status = inflater.inflate(&mut strm, Flush::NoFlush)?;
        assert_eq!(status, Status::StreamEnd);
        let n = strm.next_out;
        out.truncate(n);
        Ok(out)
    }

    #[test]
    fn test_inflate_zlib_roundtrip_all_levels() {
        let data = sample(20_000);
        for level in 0..=9 {
            let compressed = Deflater::new(level).unwrap().compress_all(&data).unwrap();
            let mut inflater = Inflater::new();
            let out = inflate_all(&mut inflater, &compressed, data.len() + 10).unwrap();
            assert_eq!(out, data, "level {}", level);
            assert_eq!(inflater.total_in(), compressed.len() as u64);
            assert_eq!(inflater.total_out(), data.len() as u64);
            assert_eq!(inflater.adler(), adler32(1, &data));
        }
    }

    #[test]
    fn test_inflate_known_zlib_stream() {
        // "hello" at the default level.
        let stream = [
            0x78, 0x9C, 0xCB, 0x48, 0xCD, 0xC9, 0xC9, 0x07, 0x00, 0x06, 0x2C, 0x02, 0x15,
        ];
        let out = inflate_all(&mut Inflater::new(), &stream, 16).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_inflate_raw_stored() {
        let stream = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'a', b'b', b'c'];
        let out = inflate_all(&mut Inflater::raw(), &stream, 8).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_inflate_one_byte_at_a_time() {
        let data = sample(5000);
        let compressed = Deflater::gzip(6).unwrap().compress_all(&data).unwrap();

        let mut inflater = Inflater::gzip();
        let mut out = vec![0u8; data.len()];
        let mut in_pos = 0;
        let mut out_pos = 0;
        loop {
            let in_end = (in_pos + 1).min(compressed.len());
            let out_end = (out_pos + 1).min(out.len());
            let mut strm = StreamContext::new(&compressed[in_pos..in_end], &mut out[out_pos..out_end]);
            let status = inflater.inflate(&mut strm, Flush::NoFlush);
            in_pos += strm.next_in;
            out_pos += strm.next_out;
            match status {
                Ok(Status::StreamEnd) => break,
                Ok(_) => {}
                Err(err) => assert_eq!(err, CodecError::buf("buffer error")),
            }
        }
        assert_eq!(out, data);
        assert_eq!(in_pos, compressed.len());
    }

    #[test]
    fn test_inflate_small_output_uses_window() {
        let data = sample(100_000);
        let compressed = Deflater::new(9).unwrap().compress_all(&data).unwrap();
        let mut inflater = Inflater::new();
        let mut out = Vec::new();
        let mut buf = [0u8; 1000];
        let mut pos = 0;
        loop {
            let mut strm = StreamContext::new(&compressed[pos..], &mut buf);
            let status = inflater.inflate(&mut strm, Flush::NoFlush).unwrap();
            pos += strm.next_in;
            let n = strm.next_out;
            out.extend_from_slice(&buf[..n]);
            if status == Status::StreamEnd {
                break;
            }
        }
        assert_eq!(out, data);
    }

    #[test]
    fn test_inflate_auto_detects_framing() {
        let data = sample(3000);
        for compressed in [
            Deflater::new(6).unwrap().compress_all(&data).unwrap(),
            Deflater::gzip(6).unwrap().compress_all(&data).unwrap(),
        ] {
            let out = inflate_all(&mut Inflater::auto(), &compressed, data.len()).unwrap();
            assert_eq!(out, data);
        }
    }

    #[test]
    fn test_inflate_bad_header() {
        let mut inflater = Inflater::new();
        let err = inflate_all(&mut inflater, &[0x78, 0x9D, 0x00], 16).unwrap_err();
        assert_eq!(err.message(), "incorrect header check");
        assert_eq!(err.code(), -3);
        assert_eq!(inflater.msg(), Some("incorrect header check"));

        // The error sticks.
        let err2 = inflate_all(&mut inflater, &[0x78, 0x9C], 16).unwrap_err();
        assert_eq!(err, err2);
    }

    #[test]
    fn test_inflate_unknown_method() {
        // CM=7 with a valid FCHECK.
        let cmf = 0x77u32;
        let flg = 31 - ((cmf << 8) % 31);
        let err = inflate_all(&mut Inflater::new(), &[cmf as u8, flg as u8, 0], 16).unwrap_err();
        assert_eq!(err.message(), "unknown compression method");
    }

    #[test]
    fn test_inflate_window_too_large() {
        let compressed = Deflater::new(6).unwrap().compress_all(b"window").unwrap();
        let mut inflater = Inflater::init2(9).unwrap();
        let err = inflate_all(&mut inflater, &compressed, 16).unwrap_err();
        assert_eq!(err.message(), "invalid window size");
    }

    #[test]
    fn test_inflate_invalid_block_type() {
        let err = inflate_all(&mut Inflater::raw(), &[0x07], 16).unwrap_err();
        assert_eq!(err.message(), "invalid block type");
    }

    #[test]
    fn test_inflate_invalid_stored_lengths() {
        let err = inflate_all(&mut Inflater::raw(), &[0x01, 0x03, 0x00, 0xFC, 0xFE], 16).unwrap_err();
        assert_eq!(err.message(), "invalid stored block lengths");
    }

    #[test]
    fn test_inflate_distance_too_far_back() {
        // Fixed block: literal 'a', then length 3 distance 2, end of block.
        let stream = [0x4B, 0x04, 0x42, 0x00];
        let err = inflate_all(&mut Inflater::raw(), &stream, 16).unwrap_err();
        assert_eq!(err.message(), "invalid distance too far back");

        let mut inflater = Inflater::raw();
        inflater.undermine(true);
        let out = inflate_all(&mut inflater, &stream, 16).unwrap();
        assert_eq!(out, [b'a', 0, b'a', 0]);
    }

    #[test]
    fn test_inflate_corrupt_check() {
        let mut compressed = Deflater::new(6).unwrap().compress_all(b"checksum").unwrap();
        let last = compressed.len() - 1;
        compressed[last] ^= 1;
        let err = inflate_all(&mut Inflater::new(), &compressed, 16).unwrap_err();
        assert_eq!(err.message(), "incorrect data check");

        let mut inflater = Inflater::new();
        inflater.validate(false);
        let out = inflate_all(&mut inflater, &compressed, 16).unwrap();
        assert_eq!(out, b"checksum");
    }

    #[test]
    fn test_inflate_gzip_length_check() {
        let mut compressed = Deflater::gzip(6).unwrap().compress_all(b"length").unwrap();
        let len = compressed.len();
        compressed[len - 4] ^= 1;
        let err = inflate_all(&mut Inflater::gzip(), &compressed, 16).unwrap_err();
        assert_eq!(err.message(), "incorrect length check");
    }

    #[test]
    fn test_inflate_gzip_reserved_flags() {
        let mut compressed = Deflater::gzip(6).unwrap().compress_all(b"flags").unwrap();
        compressed[3] = 0x20;
        let err = inflate_all(&mut Inflater::gzip(), &compressed, 16).unwrap_err();
        assert_eq!(err.message(), "unknown header flags set");
    }

    #[test]
    fn test_inflate_captures_gzip_header() {
        let mut deflater = Deflater::gzip(6).unwrap();
        let header = GzipHeader::with_filename("notes.txt")
            .with_comment("kept")
            .with_extra(&[9, 8, 7])
            .with_hcrc()
            .with_mtime(1_700_000_000);
        deflater.set_header(header).unwrap();
        let compressed = deflater.compress_all(b"header capture").unwrap();

        let mut inflater = Inflater::gzip();
        inflater.get_header().unwrap();
        let out = inflate_all(&mut inflater, &compressed, 32).unwrap();
        assert_eq!(out, b"header capture");

        let head = inflater.header().unwrap();
        assert!(head.done);
        assert!(head.hcrc);
        assert_eq!(head.filename_lossy().as_deref(), Some("notes.txt"));
        assert_eq!(head.comment_lossy().as_deref(), Some("kept"));
        assert_eq!(head.extra.as_deref(), Some(&[9u8, 8, 7][..]));
        assert_eq!(head.mtime, 1_700_000_000);
    }

    #[test]
    fn test_inflate_header_crc_mismatch() {
        let mut deflater = Deflater::gzip(6).unwrap();
        deflater.set_header(GzipHeader::new().with_hcrc()).unwrap();
        let mut compressed = deflater.compress_all(b"hcrc").unwrap();
        compressed[10] ^= 0xFF;
        let err = inflate_all(&mut Inflater::gzip(), &compressed, 16).unwrap_err();
        assert_eq!(err.message(), "header crc mismatch");
    }

    #[test]
    fn test_get_header_requires_gzip() {
        assert!(Inflater::new().get_header().is_err());
        assert!(Inflater::auto().get_header().is_ok());
    }

    #[test]
    fn test_inflate_with_dictionary() {
        let dictionary = b"the quick brown fox jumps over the lazy dog";
        let data = b"the lazy dog jumps over the quick brown fox";
        let mut deflater = Deflater::new(9).unwrap();
        deflater.set_dictionary(dictionary).unwrap();
        let compressed = deflater.compress_all(data).unwrap();

        let mut inflater = Inflater::new();
        let mut out = vec![0u8; 64];
        let mut strm = StreamContext::new(&compressed, &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::NoFlush), Ok(Status::NeedDict));
        assert_eq!(inflater.adler(), adler32(1, dictionary));
        let consumed = strm.next_in;

        assert!(inflater.set_dictionary(b"wrong").is_err());
        inflater.set_dictionary(dictionary).unwrap();

        let mut strm = StreamContext::new(&compressed[consumed..], &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::NoFlush), Ok(Status::StreamEnd));
        let n = strm.next_out;
        assert_eq!(&out[..n], data);
    }

    #[test]
    fn test_set_dictionary_rejected_outside_dict_mode() {
        let mut inflater = Inflater::new();
        assert!(inflater.set_dictionary(b"early").is_err());

        let mut raw = Inflater::raw();
        raw.set_dictionary(b"early").unwrap();
        assert_eq!(raw.get_dictionary(), b"early");
    }

    #[test]
    fn test_inflate_finish_incomplete_is_buf_error() {
        let compressed = Deflater::new(6).unwrap().compress_all(&sample(1000)).unwrap();
        let mut inflater = Inflater::new();
        let mut out = vec![0u8; 2000];
        let mut strm = StreamContext::new(&compressed[..compressed.len() / 2], &mut out);
        let err = inflater.inflate(&mut strm, Flush::Finish).unwrap_err();
        assert_eq!(err.code(), -5);
    }

    #[test]
    fn test_inflate_block_flush_stops_at_boundary() {
        let mut deflater = Deflater::raw(6).unwrap();
        let mut compressed = vec![0u8; 256];
        let mut strm = StreamContext::new(b"first block", &mut compressed);
        deflater.deflate(&mut strm, Flush::Full).unwrap();
        let first_len = strm.next_out;
        let mut strm = StreamContext::new(b"second", &mut compressed[first_len..]);
        assert_eq!(deflater.deflate(&mut strm, Flush::Finish), Ok(Status::StreamEnd));
        let total_len = first_len + strm.next_out;
        compressed.truncate(total_len);

        let mut inflater = Inflater::raw();
        let mut out = vec![0u8; 64];
        let mut strm = StreamContext::new(&compressed, &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::Block), Ok(Status::Ok));
        assert_eq!(strm.written(), b"first block");
        assert_eq!(inflater.data_type() & 128, 128);
    }

    #[test]
    fn test_inflate_trees_flush_stops_after_header() {
        let data = sample(20_000);
        let compressed = Deflater::new(6).unwrap().compress_all(&data).unwrap();

        let mut inflater = Inflater::new();
        let mut out = vec![0u8; data.len() + 10];
        let mut pos = 0;
        for _ in 0..4 {
            let mut strm = StreamContext::new(&compressed[pos..], &mut out);
            assert_eq!(inflater.inflate(&mut strm, Flush::Trees), Ok(Status::Ok));
            assert_eq!(strm.next_out, 0);
            pos += strm.next_in;
            if inflater.data_type() & 256 != 0 {
                break;
            }
        }
        assert_eq!(inflater.data_type() & 256, 256);
        assert_eq!(inflater.mode, Mode::LenStart);
        assert!(matches!(inflater.lencode, TableRef::Dynamic(_)));
        assert_eq!(inflater.total_out(), 0);

        let mut strm = StreamContext::new(&compressed[pos..], &mut out);
        assert_eq!(inflater.inflate(&mut strm, Flush::NoFlush), Ok(Status::StreamEnd));
        let n = strm.next_out;
        let next_in = strm.next_in;
        assert_eq!(&out[..n], &data[..]);
        assert_eq!(pos + next_in, compressed.len());
    }

    #[test]
    fn test_reset_reuses_configuration() {
        let compressed = Deflater::gzip(6).unwrap().compress_all(b"again").unwrap();
        let mut inflater = Inflater::gzip();
        assert_eq!(inflate_all(&mut inflater, &compressed, 16).unwrap(), b"again");
        assert!(inflater.is_finished());
        inflater.reset();
        assert!(!inflater.is_finished());
        assert_eq!(inflate_all(&mut inflater, &compressed, 16).unwrap(), b"again");
    }

    #[test]
    fn test_init2_rejects_bad_window() {
        assert!(Inflater::init2(7).is_err());
        assert!(Inflater::init2(-16).is_err());
        assert!(Inflater::init2(64).is_err());
        assert!(Inflater::init2(0).is_ok());
        assert!(Inflater::init2(-8).is_ok());
        assert!(Inflater::init2(47).is_ok());
    }
}
