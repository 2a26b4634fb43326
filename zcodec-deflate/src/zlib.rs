//! One-shot compression and decompression of whole buffers.
//!
//! Each `*_sync` function builds an engine from its options and drives it
//! over the input with an output buffer of `chunk_size` bytes, collecting
//! the chunks as they fill. The loop keeps calling while the engine fills
//! the whole buffer, the same way a streaming caller would.
//!
//! | compress           | decompress         | framing                 |
//! |--------------------|--------------------|-------------------------|
//! | [`deflate_sync`]   | [`inflate_sync`]   | zlib (RFC 1950)         |
//! | [`gzip_sync`]      | [`gunzip_sync`]    | gzip (RFC 1952)         |
//! | [`deflate_raw_sync`] | [`inflate_raw_sync`] | none (RFC 1951)     |
//! |                    | [`unzip_sync`]     | zlib or gzip, detected  |
//!
//! `gunzip_sync` and `unzip_sync` keep going across concatenated gzip
//! members.

use crate::config::{DeflateOptions, InflateOptions};
use crate::consts::{Z_DEFAULT_WINDOWBITS, Z_DEFLATED};
use crate::deflate::{Deflater, Wrap};
use crate::gzip::GZIP_MAGIC;
use crate::inflate::Inflater;
use log::debug;
use zcodec_core::error::{CodecError, Result, Status};
use zcodec_core::stream::StreamContext;
use zcodec_core::traits::Flush;

/// Output collected under a size cap.
struct OutputSink {
    data: Vec<u8>,
    limit: usize,
}

impl OutputSink {
    fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<()> {
        if self.data.len() + chunk.len() > self.limit {
            debug!("one-shot output over limit of {} bytes", self.limit);
            return Err(CodecError::OutputLimit { limit: self.limit });
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }
}

fn compress_with(input: &[u8], options: &DeflateOptions, wrap: Wrap) -> Result<Vec<u8>> {
    options.validate(wrap)?;
    let mut deflater = Deflater::init2(
        options.level,
        Z_DEFLATED,
        options.encoded_window_bits(wrap),
        options.mem_level,
        options.strategy as i32,
    )?;
    if let Some(dictionary) = &options.dictionary {
        deflater.set_dictionary(dictionary)?;
    }

    let flush = options.finish_flush;
    let mut sink = OutputSink::new(options.max_output_length);
    let mut buffer = vec![0u8; options.chunk_size];
    let mut pos = 0;

    loop {
        let mut strm = StreamContext::new(&input[pos..], &mut buffer);
        let result = deflater.deflate(&mut strm, flush);
        pos += strm.next_in;
        let (produced, avail_out) = (strm.next_out, strm.avail_out());
        sink.push(&buffer[..produced])?;

        match result {
            Ok(Status::StreamEnd) => break,
            Ok(_) | Err(CodecError::Buf { .. }) => {
                if avail_out != 0 {
                    break;
                }
            }
            Err(err) => return Err(err),
        }
    }

    deflater.end().or_else(|err| {
        // Ending mid-stream is expected with a non-finishing flush.
        if flush == Flush::Finish { Err(err) } else { Ok(()) }
    })?;
    Ok(sink.data)
}

fn decompress_with(
    input: &[u8],
    options: &InflateOptions,
    window_bits: i32,
    multi_member: bool,
) -> Result<Vec<u8>> {
    options.validate()?;
    let mut inflater = Inflater::init2(window_bits)?;
    if window_bits < 0 {
        if let Some(dictionary) = &options.dictionary {
            inflater.set_dictionary(dictionary)?;
        }
    }

    let flush = options.finish_flush;
    let mut sink = OutputSink::new(options.max_output_length);
    let mut buffer = vec![0u8; options.chunk_size];
    let mut pos = 0;

    loop {
        let mut strm = StreamContext::new(&input[pos..], &mut buffer);
        let result = inflater.inflate(&mut strm, flush);
        pos += strm.next_in;
        let (produced, avail_out) = (strm.next_out, strm.avail_out());
        sink.push(&buffer[..produced])?;

        match result {
            Ok(Status::StreamEnd) => {
                let rest = &input[pos..];
                let next_member = rest.first() == Some(&GZIP_MAGIC[0])
                    && rest.get(1).is_none_or(|&b| b == GZIP_MAGIC[1]);
                if multi_member && next_member {
                    debug!("gunzip: next member at offset {}", pos);
                    inflater.reset();
                    continue;
                }
                break;
            }
            Ok(Status::NeedDict) => match &options.dictionary {
                Some(dictionary) => {
                    inflater
                        .set_dictionary(dictionary)
                        .map_err(|_| CodecError::protocol("Bad dictionary"))?;
                }
                None => return Err(CodecError::protocol("Missing dictionary")),
            },
            Ok(Status::Ok) | Err(CodecError::Buf { .. }) => {
                if avail_out != 0 {
                    if flush == Flush::Finish {
                        return Err(CodecError::buf("unexpected end of file"));
                    }
                    break;
                }
            }
            Err(err) => return Err(err),
        }
    }

    inflater.end()?;
    Ok(sink.data)
}

/// Compress `input` with zlib framing.
pub fn deflate_sync(input: &[u8], options: &DeflateOptions) -> Result<Vec<u8>> {
    compress_with(input, options, Wrap::Zlib)
}

/// Decompress a zlib stream.
pub fn inflate_sync(input: &[u8], options: &InflateOptions) -> Result<Vec<u8>> {
    decompress_with(input, options, options.window_bits, false)
}

/// Compress `input` as a single gzip member.
pub fn gzip_sync(input: &[u8], options: &DeflateOptions) -> Result<Vec<u8>> {
    compress_with(input, options, Wrap::Gzip)
}

/// Decompress one or more concatenated gzip members.
pub fn gunzip_sync(input: &[u8], options: &InflateOptions) -> Result<Vec<u8>> {
    decompress_with(input, options, options.window_bits + 16, true)
}

/// Compress `input` as raw DEFLATE data.
pub fn deflate_raw_sync(input: &[u8], options: &DeflateOptions) -> Result<Vec<u8>> {
    compress_with(input, options, Wrap::Raw)
}

/// Decompress raw DEFLATE data.
pub fn inflate_raw_sync(input: &[u8], options: &InflateOptions) -> Result<Vec<u8>> {
    let window_bits = match options.window_bits {
        0 => -Z_DEFAULT_WINDOWBITS,
        bits => -bits,
    };
    decompress_with(input, options, window_bits, false)
}

/// Decompress a zlib stream or gzip members, whichever the header says.
pub fn unzip_sync(input: &[u8], options: &InflateOptions) -> Result<Vec<u8>> {
    let gzip = input.starts_with(&GZIP_MAGIC);
    decompress_with(input, options, options.window_bits + 32, gzip)
}

/// Compress `input` as raw DEFLATE data at `level`.
///
/// # Example
///
/// ```
/// use zcodec_deflate::{deflate, inflate};
///
/// let data = b"Hello, World! Hello, World!";
/// let compressed = deflate(data, 6).unwrap();
/// assert_eq!(inflate(&compressed).unwrap(), data);
/// ```
pub fn deflate(input: &[u8], level: u8) -> Result<Vec<u8>> {
    deflate_raw_sync(input, &DeflateOptions::with_level(i32::from(level)))
}

/// Decompress raw DEFLATE data.
pub fn inflate(input: &[u8]) -> Result<Vec<u8>> {
    inflate_raw_sync(input, &InflateOptions::default())
}

/// Compress data using zlib format.
///
/// # Example
///
/// ```
/// use zcodec_deflate::zlib::{zlib_compress, zlib_decompress};
///
/// let data = b"Hello, World! Hello, World!";
/// let compressed = zlib_compress(data, 6).unwrap();
/// assert_eq!(compressed[0], 0x78);
/// assert_eq!(zlib_decompress(&compressed).unwrap(), data);
/// ```
pub fn zlib_compress(input: &[u8], level: u8) -> Result<Vec<u8>> {
    deflate_sync(input, &DeflateOptions::with_level(i32::from(level)))
}

/// Decompress zlib format data.
pub fn zlib_decompress(input: &[u8]) -> Result<Vec<u8>> {
    inflate_sync(input, &InflateOptions::default())
}

/// Compress data using zlib format with a preset dictionary.
///
/// The dictionary's Adler-32 goes into the header so the decompressor can
/// tell which dictionary it needs.
pub fn zlib_compress_with_dict(input: &[u8], level: u8, dictionary: &[u8]) -> Result<Vec<u8>> {
    deflate_sync(
        input,
        &DeflateOptions::with_level(i32::from(level)).dictionary(dictionary),
    )
}

/// Decompress zlib data compressed against `dictionary`.
pub fn zlib_decompress_with_dict(input: &[u8], dictionary: &[u8]) -> Result<Vec<u8>> {
    inflate_sync(input, &InflateOptions::default().dictionary(dictionary))
}

/// Compress data as a gzip member.
pub fn gzip_compress(input: &[u8], level: u8) -> Result<Vec<u8>> {
    gzip_sync(input, &DeflateOptions::with_level(i32::from(level)))
}

/// Decompress gzip data, all members.
pub fn gzip_decompress(input: &[u8]) -> Result<Vec<u8>> {
    gunzip_sync(input, &InflateOptions::default())
}

/// CRC-32 of `data`, continuing from `value` (0 to start).
pub fn crc32(data: &[u8], value: u32) -> u32 {
    zcodec_core::crc::crc32(value, data)
}
