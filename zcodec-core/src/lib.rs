//! # zcodec Core
//!
//! Building blocks shared by the zcodec compressor and decompressor.
//!
//! - [`adler32`] / [`crc`]: the two stream checksums (zlib and gzip)
//! - [`bitstream`]: bit-level staging for encoder output and decoder input
//! - [`ringbuffer`]: the decoder's sliding history window
//! - [`stream`]: per-call cursor record and persistent session counters
//! - [`traits`]: streaming `Compressor`/`Decompressor`, flush modes, strategies
//! - [`error`]: status values, error type and zlib return codes
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ One-shot API                                            │
//! │     deflate_sync / gunzip_sync / ...                    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Framing                                                 │
//! │     zlib (RFC 1950), gzip (RFC 1952), raw               │
//! ├─────────────────────────────────────────────────────────┤
//! │ Codec                                                   │
//! │     Deflater / Inflater state machines (RFC 1951)       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Core (this crate)                                       │
//! │     PendingBuf, BitAccumulator, SlidingWindow, checksums│
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use zcodec_core::adler32::adler32;
//! use zcodec_core::crc::Crc32;
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! assert_eq!(adler32(1, b"Wikipedia"), 0x11E60398);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adler32;
pub mod bitstream;
pub mod crc;
pub mod error;
pub mod ringbuffer;
pub mod stream;
pub mod traits;

// Re-exports for convenience
pub use adler32::Adler32;
pub use bitstream::{BitAccumulator, PendingBuf};
pub use crc::Crc32;
pub use error::{CodecError, ErrorKind, Result, ReturnCode, Status};
pub use ringbuffer::SlidingWindow;
pub use stream::{StreamContext, StreamInfo};
pub use traits::{Compressor, Decompressor, Flush, Strategy};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CodecError, Result, Status};
    pub use crate::stream::{StreamContext, StreamInfo};
    pub use crate::traits::{Compressor, Decompressor, Flush, Strategy};
}
