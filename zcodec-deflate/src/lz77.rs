//! LZ77 window and match finder for DEFLATE compression.
//!
//! The window holds `2 * w_size` bytes. Input is appended at
//! `strstart + lookahead`; once `strstart` passes `w_size + MAX_DIST` the
//! upper half is moved down and every hash position is rebased, so matches
//! never have to wrap.
//!
//! # Hash chains
//!
//! Each position is hashed on its next [`MIN_MATCH`] bytes. `head[h]` holds
//! the most recent position with hash `h` and `prev[pos & w_mask]` links to
//! the previous one, so walking `prev` visits candidates newest first.
//! Position 0 doubles as the end-of-chain marker.

use crate::tables::{MAX_MATCH, MIN_LOOKAHEAD, MIN_MATCH};
use zcodec_core::adler32::adler32;
use zcodec_core::crc::crc32;
use zcodec_core::stream::{StreamContext, StreamInfo};

/// Tuning parameters for one compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchParams {
    /// Reduce lazy search above this match length.
    pub good_length: usize,
    /// Do not perform lazy search above this match length; for the fast
    /// strategy, the longest match still inserted into the hash table.
    pub max_lazy: usize,
    /// Quit search above this match length.
    pub nice_length: usize,
    /// Maximum hash chain length to walk.
    pub max_chain: usize,
}

/// Sliding window, hash chains and match state of the compressor.
#[derive(Debug, Clone)]
pub struct Window {
    /// log2 of the window size.
    pub w_bits: u32,
    /// Window size.
    pub w_size: usize,
    /// `w_size - 1`.
    pub w_mask: usize,
    /// Twice the window size.
    pub window: Vec<u8>,
    /// Hash chain links, indexed by `pos & w_mask`.
    pub prev: Vec<u16>,
    /// Chain heads, indexed by hash.
    pub head: Vec<u16>,

    hash_bits: u32,
    hash_mask: usize,
    hash_shift: u32,
    /// Rolling hash of the string being inserted.
    pub ins_h: usize,

    /// Start of the current block, may go negative after a slide.
    pub block_start: i64,
    /// Current match length.
    pub match_length: usize,
    /// Start of the previous match, for lazy evaluation.
    pub prev_match: usize,
    /// Whether a literal is held back for lazy evaluation.
    pub match_available: bool,
    /// Start of the string to insert.
    pub strstart: usize,
    /// Start of the best match found.
    pub match_start: usize,
    /// Valid bytes ahead of `strstart`.
    pub lookahead: usize,
    /// Best match length at the previous step.
    pub prev_length: usize,
    /// Bytes at the end of the last read not yet inserted into the hash.
    pub insert: usize,

    /// Level tuning.
    pub params: MatchParams,
}

impl Window {
    /// Allocate a window of `2^w_bits` bytes with `2^(mem_level + 7)` hash
    /// chains.
    pub fn new(w_bits: u32, mem_level: u32, params: MatchParams) -> Self {
        let w_size = 1usize << w_bits;
        let hash_bits = mem_level + 7;
        let hash_size = 1usize << hash_bits;
        Self {
            w_bits,
            w_size,
            w_mask: w_size - 1,
            window: vec![0; 2 * w_size],
            prev: vec![0; w_size],
            head: vec![0; hash_size],
            hash_bits,
            hash_mask: hash_size - 1,
            hash_shift: (hash_bits + MIN_MATCH as u32 - 1) / MIN_MATCH as u32,
            ins_h: 0,
            block_start: 0,
            match_length: MIN_MATCH - 1,
            prev_match: 0,
            match_available: false,
            strstart: 0,
            match_start: 0,
            lookahead: 0,
            prev_length: MIN_MATCH - 1,
            insert: 0,
            params,
        }
    }

    /// Farthest distance a match may reach back.
    #[inline]
    pub fn max_dist(&self) -> usize {
        self.w_size - MIN_LOOKAHEAD
    }

    /// Number of hash bits.
    #[inline]
    pub fn hash_bits(&self) -> u32 {
        self.hash_bits
    }

    /// Reset for a new stream with the given level tuning.
    pub fn lm_init(&mut self, params: MatchParams) {
        self.clear_hash();
        self.params = params;
        self.strstart = 0;
        self.block_start = 0;
        self.lookahead = 0;
        self.insert = 0;
        self.match_length = MIN_MATCH - 1;
        self.prev_length = MIN_MATCH - 1;
        self.match_available = false;
        self.match_start = 0;
        self.prev_match = 0;
        self.ins_h = 0;
    }

    /// Empty every hash chain.
    pub fn clear_hash(&mut self) {
        self.head.fill(0);
    }

    /// Roll `c` into hash `h`.
    #[inline]
    pub fn update_hash(&self, h: usize, c: u8) -> usize {
        ((h << self.hash_shift) ^ c as usize) & self.hash_mask
    }

    /// Insert the string at `pos` and return the previous head of its
    /// chain.
    #[inline]
    pub fn insert_string(&mut self, pos: usize) -> usize {
        self.ins_h = self.update_hash(self.ins_h, self.window[pos + MIN_MATCH - 1]);
        let head = self.head[self.ins_h];
        self.prev[pos & self.w_mask] = head;
        self.head[self.ins_h] = pos as u16;
        head as usize
    }

    /// Rebase hash positions after the window moved down by `w_size`.
    pub fn slide_hash(&mut self) {
        let w_size = self.w_size;
        for entry in self.head.iter_mut().chain(self.prev.iter_mut()) {
            let m = *entry as usize;
            *entry = if m >= w_size { (m - w_size) as u16 } else { 0 };
        }
    }

    /// Copy up to `size` input bytes into the window at `at`, updating the
    /// running checksum for the wrapper in use.
    pub(crate) fn read_buf(
        &mut self,
        strm: &mut StreamContext<'_>,
        info: &mut StreamInfo,
        wrap: i32,
        at: usize,
        size: usize,
    ) -> usize {
        let len = strm.avail_in().min(size);
        if len == 0 {
            return 0;
        }
        let input: &[u8] = strm.input;
        let src = &input[strm.next_in..strm.next_in + len];
        self.window[at..at + len].copy_from_slice(src);
        match wrap {
            1 => info.adler = adler32(info.adler, src),
            2 => info.adler = crc32(info.adler, src),
            _ => {}
        }
        strm.next_in += len;
        info.total_in += len as u64;
        len
    }

    /// Fill the window when the lookahead runs low, sliding it down first
    /// if `strstart` is too far up.
    ///
    /// On return `lookahead >= MIN_LOOKAHEAD` unless the input is
    /// exhausted.
    pub fn fill_window(&mut self, strm: &mut StreamContext<'_>, info: &mut StreamInfo, wrap: i32) {
        let wsize = self.w_size;
        let window_size = 2 * wsize;

        loop {
            let mut more = window_size - self.lookahead - self.strstart;

            if self.strstart >= wsize + self.max_dist() {
                self.window.copy_within(wsize..wsize + wsize - more, 0);
                self.match_start = self.match_start.saturating_sub(wsize);
                self.strstart -= wsize;
                self.block_start -= wsize as i64;
                if self.insert > self.strstart {
                    self.insert = self.strstart;
                }
                self.slide_hash();
                more += wsize;
            }
            if strm.avail_in() == 0 {
                break;
            }

            let at = self.strstart + self.lookahead;
            let n = self.read_buf(strm, info, wrap, at, more);
            self.lookahead += n;

            // Insert the strings left over from the previous read.
            if self.lookahead + self.insert >= MIN_MATCH {
                let mut pos = self.strstart - self.insert;
                self.ins_h = self.window[pos] as usize;
                self.ins_h = self.update_hash(self.ins_h, self.window[pos + 1]);
                while self.insert > 0 {
                    self.insert_string(pos);
                    pos += 1;
                    self.insert -= 1;
                    if self.lookahead + self.insert < MIN_MATCH {
                        break;
                    }
                }
            }

            if self.lookahead >= MIN_LOOKAHEAD || strm.avail_in() == 0 {
                break;
            }
        }
    }

    /// Walk the hash chain from `cur_match` and return the length of the
    /// longest match at `strstart`, setting `match_start`.
    ///
    /// Only matches longer than `prev_length` are considered. The chain
    /// walk is cut to a quarter once a good match is in hand and stops as
    /// soon as a match reaches `nice_length`. The result never exceeds
    /// `lookahead`.
    pub fn longest_match(&mut self, mut cur_match: usize) -> usize {
        let mut chain_length = self.params.max_chain;
        let scan = self.strstart;
        let mut best_len = self.prev_length;
        let mut nice_match = self.params.nice_length;
        let limit = self.strstart.saturating_sub(self.max_dist());

        if self.prev_length >= self.params.good_length {
            chain_length >>= 2;
        }
        nice_match = nice_match.min(self.lookahead);

        let window = &self.window;
        let strend = scan + MAX_MATCH;
        let mut scan_end1 = window[scan + best_len - 1];
        let mut scan_end = window[scan + best_len];

        loop {
            let m = cur_match;
            if window[m + best_len] == scan_end
                && window[m + best_len - 1] == scan_end1
                && window[m] == window[scan]
                && window[m + 1] == window[scan + 1]
            {
                let len = 2 + window[scan + 2..strend]
                    .iter()
                    .zip(&window[m + 2..m + MAX_MATCH])
                    .take_while(|(a, b)| a == b)
                    .count();

                if len > best_len {
                    self.match_start = cur_match;
                    best_len = len;
                    if len >= nice_match {
                        break;
                    }
                    scan_end1 = window[scan + best_len - 1];
                    scan_end = window[scan + best_len];
                }
            }

            cur_match = self.prev[cur_match & self.w_mask] as usize;
            if cur_match <= limit {
                break;
            }
            chain_length -= 1;
            if chain_length == 0 {
                break;
            }
        }

        best_len.min(self.lookahead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: MatchParams = MatchParams {
        good_length: 8,
        max_lazy: 16,
        nice_length: 128,
        max_chain: 128,
    };

    fn filled(data: &[u8]) -> (Window, StreamInfo) {
        let mut window = Window::new(9, 1, PARAMS);
        let mut info = StreamInfo::default();
        let mut out = [0u8; 0];
        let mut strm = StreamContext::new(data, &mut out);
        window.fill_window(&mut strm, &mut info, 0);
        (window, info)
    }

    #[test]
    fn test_hash_parameters() {
        let window = Window::new(15, 8, PARAMS);
        assert_eq!(window.hash_bits(), 15);
        assert_eq!(window.head.len(), 32768);
        assert_eq!(window.window.len(), 65536);
        assert_eq!(window.max_dist(), 32768 - MIN_LOOKAHEAD);
    }

    #[test]
    fn test_fill_window_reads_input() {
        let data: Vec<u8> = (0..100u8).collect();
        let (window, info) = filled(&data);
        assert_eq!(window.lookahead, 100);
        assert_eq!(&window.window[..100], &data[..]);
        assert_eq!(info.total_in, 100);
    }

    #[test]
    fn test_fill_window_updates_checksum() {
        let mut window = Window::new(9, 1, PARAMS);
        let mut info = StreamInfo {
            adler: 1,
            ..StreamInfo::default()
        };
        let mut out = [0u8; 0];
        let mut strm = StreamContext::new(b"Wikipedia", &mut out);
        window.fill_window(&mut strm, &mut info, 1);
        assert_eq!(info.adler, 0x11E60398);
    }

    #[test]
    fn test_longest_match_finds_repeat() {
        let data = b"#abcdefgh--abcdefgh--";
        let (mut window, _) = filled(data);
        window.strstart = 11;
        window.lookahead = data.len() - 11;
        window.prev_length = MIN_MATCH - 1;

        assert_eq!(window.longest_match(1), 10);
        assert_eq!(window.match_start, 1);
    }

    #[test]
    fn test_longest_match_clamped_to_lookahead() {
        let data = vec![b'z'; 300];
        let (mut window, _) = filled(&data);
        window.strstart = 2;
        window.lookahead = 5;
        window.prev_length = MIN_MATCH - 1;
        let len = window.longest_match(1);
        assert_eq!(len, 5);
        assert_eq!(window.match_start, 1);
    }

    #[test]
    fn test_slide_hash() {
        let mut window = Window::new(9, 1, PARAMS);
        window.head[0] = 700;
        window.head[1] = 100;
        window.prev[3] = 512;
        window.slide_hash();
        assert_eq!(window.head[0], 188);
        assert_eq!(window.head[1], 0);
        assert_eq!(window.prev[3], 0);
    }
}
