//! Error and status types for zcodec operations.
//!
//! Every engine call returns either a [`Status`] (progress was made or a
//! boundary was reached) or a [`CodecError`]. Both map onto the numeric
//! zlib return codes through [`ReturnCode`], which is what compatibility
//! callers see on the wire.

use thiserror::Error;

/// Non-error outcome of a `deflate`/`inflate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Progress was made; call again.
    Ok,
    /// The end of the stream was reached (all output produced).
    StreamEnd,
    /// A preset dictionary is needed before decompression can continue.
    NeedDict,
}

impl Status {
    /// zlib numeric value for this status.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::StreamEnd => 1,
            Self::NeedDict => 2,
        }
    }
}

/// Broad category of a [`CodecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed header or trailer, bad magic, checksum mismatch.
    Protocol,
    /// Invalid Huffman code set, block type or distance.
    Encoding,
    /// Caller misuse: bad parameters, bad flush, wrong call order.
    Usage,
    /// No progress possible, or an allocation failed.
    ResourceExhaustion,
}

/// The error type for zcodec operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Framing problem: header check, method, trailer check.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the problem.
        message: &'static str,
    },

    /// Bad compressed data inside a block.
    #[error("invalid compressed data: {message}")]
    Encoding {
        /// Description of the problem.
        message: &'static str,
    },

    /// Inconsistent stream state or bad parameter.
    #[error("stream error: {message}")]
    Usage {
        /// Description of the problem.
        message: &'static str,
    },

    /// No progress was possible with the buffers supplied.
    #[error("buffer error: {message}")]
    Buf {
        /// Description of the problem.
        message: &'static str,
    },

    /// Internal allocation failed.
    #[error("insufficient memory")]
    Mem,

    /// Incompatible library version.
    #[error("incompatible version")]
    Version,

    /// Output grew past the configured limit.
    #[error("output exceeds the configured maximum of {limit} bytes")]
    OutputLimit {
        /// Maximum output length.
        limit: usize,
    },
}

/// Result type alias for zcodec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Create a protocol (framing) error.
    pub fn protocol(message: &'static str) -> Self {
        Self::Protocol { message }
    }

    /// Create an encoding (bitstream) error.
    pub fn encoding(message: &'static str) -> Self {
        Self::Encoding { message }
    }

    /// Create a usage error.
    pub fn usage(message: &'static str) -> Self {
        Self::Usage { message }
    }

    /// Create a buffer error.
    pub fn buf(message: &'static str) -> Self {
        Self::Buf { message }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Encoding { .. } => ErrorKind::Encoding,
            Self::Usage { .. } | Self::Version => ErrorKind::Usage,
            Self::Buf { .. } | Self::Mem | Self::OutputLimit { .. } => {
                ErrorKind::ResourceExhaustion
            }
        }
    }

    /// zlib numeric value for this error.
    pub fn code(&self) -> i32 {
        ReturnCode::from(self) as i32
    }

    /// Diagnostic text, as stored in the stream's message slot.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Protocol { message }
            | Self::Encoding { message }
            | Self::Usage { message }
            | Self::Buf { message } => *message,
            Self::Mem => "insufficient memory",
            Self::Version => "incompatible version",
            Self::OutputLimit { .. } => "output length exceeded",
        }
    }

    /// Whether the caller may retry with more buffer space or input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Buf { .. })
    }
}

/// zlib return codes, with their wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReturnCode {
    /// `Z_OK`
    Ok = 0,
    /// `Z_STREAM_END`
    StreamEnd = 1,
    /// `Z_NEED_DICT`
    NeedDict = 2,
    /// `Z_STREAM_ERROR`
    StreamError = -2,
    /// `Z_DATA_ERROR`
    DataError = -3,
    /// `Z_MEM_ERROR`
    MemError = -4,
    /// `Z_BUF_ERROR`
    BufError = -5,
    /// `Z_VERSION_ERROR`
    VersionError = -6,
}

impl From<Status> for ReturnCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => Self::Ok,
            Status::StreamEnd => Self::StreamEnd,
            Status::NeedDict => Self::NeedDict,
        }
    }
}

impl From<&CodecError> for ReturnCode {
    fn from(err: &CodecError) -> Self {
        match err {
            CodecError::Protocol { .. } | CodecError::Encoding { .. } => Self::DataError,
            CodecError::Usage { .. } => Self::StreamError,
            CodecError::Buf { .. } | CodecError::OutputLimit { .. } => Self::BufError,
            CodecError::Mem => Self::MemError,
            CodecError::Version => Self::VersionError,
        }
    }
}

impl From<&Result<Status>> for ReturnCode {
    fn from(result: &Result<Status>) -> Self {
        match result {
            Ok(status) => (*status).into(),
            Err(err) => err.into(),
        }
    }
}
