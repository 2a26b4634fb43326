//! Options for the one-shot API.
//!
//! Defaults match zlib's. [`DeflateOptions::validate`] and
//! [`InflateOptions::validate`] check every field against the limits in
//! [`crate::consts`] before an engine is built.

use crate::consts::{
    Z_DEFAULT_CHUNK, Z_DEFAULT_COMPRESSION, Z_DEFAULT_MEMLEVEL, Z_DEFAULT_WINDOWBITS, Z_MAX_LEVEL,
    Z_MAX_MEMLEVEL, Z_MAX_WINDOWBITS, Z_MIN_CHUNK, Z_MIN_LEVEL, Z_MIN_MEMLEVEL, Z_MIN_WINDOWBITS,
};
use crate::deflate::Wrap;
use zcodec_core::error::{CodecError, Result};
use zcodec_core::traits::{Flush, Strategy};

fn check_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size < Z_MIN_CHUNK {
        return Err(CodecError::usage("chunk size out of range"));
    }
    Ok(())
}

/// Compression options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeflateOptions {
    /// Compression level, `-1` for the default (6).
    pub level: i32,
    /// Window size exponent, 8 to 15 (9 to 15 without zlib framing). The
    /// framing comes from the function called, not from this value.
    pub window_bits: i32,
    /// Hash table memory level, 1 to 9.
    pub mem_level: i32,
    /// Match strategy.
    pub strategy: Strategy,
    /// Preset dictionary (zlib and raw only).
    pub dictionary: Option<Vec<u8>>,
    /// Output buffer size per engine call.
    pub chunk_size: usize,
    /// Flush used with the whole input.
    pub finish_flush: Flush,
    /// Largest output accepted before giving up.
    pub max_output_length: usize,
}

impl Default for DeflateOptions {
    fn default() -> Self {
        Self {
            level: Z_DEFAULT_COMPRESSION,
            window_bits: Z_DEFAULT_WINDOWBITS,
            mem_level: Z_DEFAULT_MEMLEVEL,
            strategy: Strategy::Default,
            dictionary: None,
            chunk_size: Z_DEFAULT_CHUNK,
            finish_flush: Flush::Finish,
            max_output_length: usize::MAX,
        }
    }
}

impl DeflateOptions {
    /// Default options at `level`.
    pub fn with_level(level: i32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Set the window size exponent.
    #[must_use]
    pub fn window_bits(mut self, window_bits: i32) -> Self {
        self.window_bits = window_bits;
        self
    }

    /// Set the memory level.
    #[must_use]
    pub fn mem_level(mut self, mem_level: i32) -> Self {
        self.mem_level = mem_level;
        self
    }

    /// Set the strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set a preset dictionary.
    #[must_use]
    pub fn dictionary(mut self, dictionary: &[u8]) -> Self {
        self.dictionary = Some(dictionary.to_vec());
        self
    }

    /// Set the output chunk size.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the flush used with the whole input.
    #[must_use]
    pub fn finish_flush(mut self, flush: Flush) -> Self {
        self.finish_flush = flush;
        self
    }

    /// Cap the output size.
    #[must_use]
    pub fn max_output_length(mut self, limit: usize) -> Self {
        self.max_output_length = limit;
        self
    }

    /// Check every field for use with `wrap` framing.
    pub fn validate(&self, wrap: Wrap) -> Result<()> {
        check_chunk_size(self.chunk_size)?;
        let min_window = if wrap == Wrap::Zlib {
            Z_MIN_WINDOWBITS
        } else {
            Z_MIN_WINDOWBITS + 1
        };
        if !(min_window..=Z_MAX_WINDOWBITS).contains(&self.window_bits) {
            return Err(CodecError::usage("window bits out of range"));
        }
        if !(Z_MIN_LEVEL..=Z_MAX_LEVEL).contains(&self.level) {
            return Err(CodecError::usage("compression level out of range"));
        }
        if !(Z_MIN_MEMLEVEL..=Z_MAX_MEMLEVEL).contains(&self.mem_level) {
            return Err(CodecError::usage("memory level out of range"));
        }
        if self.finish_flush == Flush::Trees {
            return Err(CodecError::usage("invalid flush value"));
        }
        if self.dictionary.is_some() && wrap == Wrap::Gzip {
            return Err(CodecError::usage("dictionary not supported with gzip framing"));
        }
        Ok(())
    }

    /// `window_bits` encoded for `wrap`, as taken by
    /// [`Deflater::init2`](crate::deflate::Deflater::init2).
    pub(crate) fn encoded_window_bits(&self, wrap: Wrap) -> i32 {
        match wrap {
            Wrap::Raw => -self.window_bits,
            Wrap::Zlib => self.window_bits,
            Wrap::Gzip => self.window_bits + 16,
        }
    }
}

/// Decompression options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InflateOptions {
    /// Window size exponent, 8 to 15, or 0 to take it from the header.
    pub window_bits: i32,
    /// Dictionary supplied when the stream asks for one (raw streams use
    /// it from the start).
    pub dictionary: Option<Vec<u8>>,
    /// Output buffer size per engine call.
    pub chunk_size: usize,
    /// Flush used with the whole input.
    pub finish_flush: Flush,
    /// Largest output accepted before giving up.
    pub max_output_length: usize,
}

impl Default for InflateOptions {
    fn default() -> Self {
        Self {
            window_bits: Z_DEFAULT_WINDOWBITS,
            dictionary: None,
            chunk_size: Z_DEFAULT_CHUNK,
            finish_flush: Flush::Finish,
            max_output_length: usize::MAX,
        }
    }
}

impl InflateOptions {
    /// Set the window size exponent.
    #[must_use]
    pub fn window_bits(mut self, window_bits: i32) -> Self {
        self.window_bits = window_bits;
        self
    }

    /// Set the dictionary.
    #[must_use]
    pub fn dictionary(mut self, dictionary: &[u8]) -> Self {
        self.dictionary = Some(dictionary.to_vec());
        self
    }

    /// Set the output chunk size.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the flush used with the whole input.
    #[must_use]
    pub fn finish_flush(mut self, flush: Flush) -> Self {
        self.finish_flush = flush;
        self
    }

    /// Cap the output size.
    #[must_use]
    pub fn max_output_length(mut self, limit: usize) -> Self {
        self.max_output_length = limit;
        self
    }

    /// Check every field.
    pub fn validate(&self) -> Result<()> {
        check_chunk_size(self.chunk_size)?;
        if self.window_bits != 0
            && !(Z_MIN_WINDOWBITS..=Z_MAX_WINDOWBITS).contains(&self.window_bits)
        {
            return Err(CodecError::usage("window bits out of range"));
        }
        Ok(())
    }
}
