//! # zcodec Deflate
//!
//! zlib-compatible DEFLATE compression and decompression (RFC 1951), with
//! zlib (RFC 1950) and gzip (RFC 1952) framing.
//!
//! The engines are resumable: [`Deflater`] and [`Inflater`] take whatever
//! input and output space the caller has through a
//! [`StreamContext`](zcodec_core::StreamContext), do as much work as fits,
//! and pick up exactly where they stopped on the next call. Their output is
//! byte-for-byte what zlib 1.2.13 produces for the same parameters.
//!
//! ## Features
//!
//! - **Compression**: levels 0-9, five strategies (default, filtered,
//!   Huffman-only, RLE, fixed), preset dictionaries, all flush modes,
//!   mid-stream parameter changes and a gzip header with optional fields.
//! - **Decompression**: all block types, zlib/gzip/raw or auto-detected
//!   framing, gzip header capture, dictionaries, checksum verification.
//! - **One-shot helpers** in [`zlib`] with size limits and multi-member gzip.
//!
//! ## Example
//!
//! ```rust
//! use zcodec_deflate::{deflate, inflate};
//!
//! let original = b"Hello, World! Hello, World!";
//! let compressed = deflate(original, 6).unwrap();
//! let decompressed = inflate(&compressed).unwrap();
//! assert_eq!(&decompressed, original);
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use zcodec_deflate::{Deflater, Inflater};
//! use zcodec_core::{Flush, Status, StreamContext};
//!
//! let mut deflater = Deflater::gzip(9).unwrap();
//! let mut compressed = vec![0u8; 128];
//! let mut strm = StreamContext::new(b"streamed", &mut compressed);
//! assert_eq!(deflater.deflate(&mut strm, Flush::Finish).unwrap(), Status::StreamEnd);
//! let len = strm.next_out;
//!
//! let mut inflater = Inflater::gzip();
//! let mut out = [0u8; 16];
//! let mut strm = StreamContext::new(&compressed[..len], &mut out);
//! assert_eq!(inflater.inflate(&mut strm, Flush::NoFlush).unwrap(), Status::StreamEnd);
//! assert_eq!(strm.written(), b"streamed");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod consts;
pub mod deflate;
pub mod gzip;
pub mod huffman;
mod inffast;
pub mod inflate;
mod lz77;
pub mod tables;
mod trees;
pub mod zlib;

// Re-exports
pub use config::{DeflateOptions, InflateOptions};
pub use deflate::{Deflater, Wrap};
pub use gzip::GzipHeader;
pub use inflate::Inflater;
pub use zlib::{
    crc32, deflate, deflate_raw_sync, deflate_sync, gunzip_sync, gzip_compress, gzip_decompress,
    gzip_sync, inflate, inflate_raw_sync, inflate_sync, unzip_sync, zlib_compress,
    zlib_decompress,
};
