//! GZIP member header (RFC 1952).
//!
//! The same record is used in both directions: the compressor streams a
//! caller-supplied header in front of the deflate data, and the decompressor
//! can be asked to fill one in while it parses a member.

use std::time::{SystemTime, UNIX_EPOCH};

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Operating system byte written when no header is supplied.
pub const OS_CODE: u8 = if cfg!(windows) {
    10
} else if cfg!(target_os = "macos") {
    19
} else {
    3
};

/// Operating system byte meaning "unknown".
pub const OS_UNKNOWN: u8 = 255;

/// Largest extra/name/comment field kept when capturing a header.
/// Longer fields are parsed in full but truncated in the record.
pub const HEADER_FIELD_MAX: usize = 65536;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits that must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// GZIP member header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipHeader {
    /// Data is probably text.
    pub text: bool,
    /// Modification time (Unix timestamp).
    pub mtime: u32,
    /// Extra flags. Ignored when compressing; the level decides.
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
    /// Extra field, at most 65535 bytes.
    pub extra: Option<Vec<u8>>,
    /// Original filename, without the terminating zero.
    pub filename: Option<Vec<u8>>,
    /// Comment, without the terminating zero.
    pub comment: Option<Vec<u8>>,
    /// Header carries a CRC-16.
    pub hcrc: bool,
    /// Set by the decompressor once the header has been parsed.
    pub done: bool,
}

impl Default for GzipHeader {
    fn default() -> Self {
        Self {
            text: false,
            mtime: 0,
            xfl: 0,
            os: OS_UNKNOWN,
            extra: None,
            filename: None,
            comment: None,
            hcrc: false,
            done: false,
        }
    }
}

impl GzipHeader {
    /// Create a new GZIP header with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a header with filename.
    pub fn with_filename(filename: &str) -> Self {
        Self {
            filename: Some(filename.as_bytes().to_vec()),
            ..Self::default()
        }
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.as_bytes().to_vec());
        self
    }

    /// Set the extra field.
    pub fn with_extra(mut self, extra: &[u8]) -> Self {
        self.extra = Some(extra.to_vec());
        self
    }

    /// Request a header CRC.
    pub fn with_hcrc(mut self) -> Self {
        self.hcrc = true;
        self
    }

    /// Set the modification time.
    pub fn with_mtime(mut self, mtime: u32) -> Self {
        self.mtime = mtime;
        self
    }

    /// Set the modification time to now.
    pub fn with_mtime_now(mut self) -> Self {
        self.mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        self
    }

    /// The FLG byte describing this header.
    pub fn flags(&self) -> u8 {
        let mut flg = 0;
        if self.text {
            flg |= flags::FTEXT;
        }
        if self.hcrc {
            flg |= flags::FHCRC;
        }
        if self.extra.is_some() {
            flg |= flags::FEXTRA;
        }
        if self.filename.is_some() {
            flg |= flags::FNAME;
        }
        if self.comment.is_some() {
            flg |= flags::FCOMMENT;
        }
        flg
    }

    /// Filename as text, if present.
    pub fn filename_lossy(&self) -> Option<String> {
        self.filename
            .as_ref()
            .map(|name| String::from_utf8_lossy(name).into_owned())
    }

    /// Comment as text, if present.
    pub fn comment_lossy(&self) -> Option<String> {
        self.comment
            .as_ref()
            .map(|c| String::from_utf8_lossy(c).into_owned())
    }

    /// Extra field length as written (the field is capped at 16 bits).
    pub(crate) fn extra_len(&self) -> usize {
        self.extra.as_ref().map_or(0, |e| e.len() & 0xFFFF)
    }

    /// Size of the encoded header in bytes.
    pub fn encoded_len(&self) -> usize {
        let mut len = 10;
        if self.extra.is_some() {
            len += 2 + self.extra_len();
        }
        if let Some(name) = &self.filename {
            len += name.len() + 1;
        }
        if let Some(comment) = &self.comment {
            len += comment.len() + 1;
        }
        if self.hcrc {
            len += 2;
        }
        len
    }
}

/// Append `byte` to a captured field unless it is already at the cap.
pub(crate) fn push_capped(field: &mut Option<Vec<u8>>, byte: u8) {
    if let Some(buf) = field {
        if buf.len() < HEADER_FIELD_MAX {
            buf.push(byte);
        }
    }
}
