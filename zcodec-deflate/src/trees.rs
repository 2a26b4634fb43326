//! Huffman block encoder.
//!
//! The match finder records literals and (length, distance) pairs in a symbol
//! buffer while counting symbol frequencies. When a block is flushed, three
//! encodings are costed: stored, fixed codes and dynamic codes built from the
//! frequencies. The cheapest is emitted, ties going to the fixed codes.
//!
//! Dynamic trees are built with a binary heap ordered by frequency, ties
//! broken by subtree depth so that equal-frequency merges stay shallow. If a
//! code would exceed the maximum length, the overflow is redistributed the
//! way zlib does it, which is a heuristic rather than optimal
//! length-limited coding.

use crate::tables::{
    BASE_DIST, BASE_LENGTH, BL_CODES, BL_ORDER, D_CODES, DYN_TREES, END_BLOCK, EXTRA_BLBITS,
    EXTRA_DBITS, EXTRA_LBITS, HEAP_SIZE, L_CODES, LENGTH_CODE, LITERALS, MAX_BITS, MAX_BL_BITS,
    REP_3_6, REPZ_3_10, REPZ_11_138, STATIC_DTREE, STATIC_LTREE, STATIC_TREES, STORED_BLOCK,
    StaticCode, bi_reverse, d_code,
};
use log::trace;
use zcodec_core::bitstream::PendingBuf;
use zcodec_core::stream::data_type;
use zcodec_core::traits::Strategy;

/// A node of a dynamic tree.
///
/// Leaves are the alphabet symbols; internal nodes follow them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeNode {
    /// Symbol or subtree frequency.
    pub freq: u16,
    /// Bit-reversed code, valid after code generation.
    pub code: u16,
    /// Parent node, valid during tree construction.
    pub dad: u16,
    /// Code length.
    pub len: u16,
}

/// Static description of one alphabet.
struct StaticDesc {
    static_tree: Option<&'static [StaticCode]>,
    extra_bits: &'static [u8],
    extra_base: usize,
    elems: usize,
    max_length: usize,
}

static L_DESC: StaticDesc = StaticDesc {
    static_tree: Some(&STATIC_LTREE),
    extra_bits: &EXTRA_LBITS,
    extra_base: LITERALS + 1,
    elems: L_CODES,
    max_length: MAX_BITS,
};

static D_DESC: StaticDesc = StaticDesc {
    static_tree: Some(&STATIC_DTREE),
    extra_bits: &EXTRA_DBITS,
    extra_base: 0,
    elems: D_CODES,
    max_length: MAX_BITS,
};

static BL_DESC: StaticDesc = StaticDesc {
    static_tree: None,
    extra_bits: &EXTRA_BLBITS,
    extra_base: 0,
    elems: BL_CODES,
    max_length: MAX_BL_BITS,
};

/// Anything a block can be coded with.
trait CodeLookup {
    fn lookup(&self, symbol: usize) -> (u32, u32);
}

impl CodeLookup for [StaticCode] {
    #[inline]
    fn lookup(&self, symbol: usize) -> (u32, u32) {
        let c = self[symbol];
        (u32::from(c.code), u32::from(c.len))
    }
}

impl CodeLookup for [TreeNode] {
    #[inline]
    fn lookup(&self, symbol: usize) -> (u32, u32) {
        let c = self[symbol];
        (u32::from(c.code), u32::from(c.len))
    }
}

#[inline]
fn send_code<T: CodeLookup + ?Sized>(pending: &mut PendingBuf, symbol: usize, tree: &T) {
    let (code, len) = tree.lookup(symbol);
    pending.send_bits(code, len);
}

/// Heap and bookkeeping shared by the three tree builds of one block.
struct Heap {
    /// 1-based heap of node indexes; the tail holds nodes in merge order.
    heap: [usize; HEAP_SIZE],
    len: usize,
    max: usize,
    /// Subtree depth, used to break frequency ties.
    depth: [u8; HEAP_SIZE],
    /// Number of codes of each length.
    bl_count: [u16; MAX_BITS + 1],
    /// Bit length of the block with dynamic trees.
    opt_len: i64,
    /// Bit length of the block with fixed trees.
    static_len: i64,
}

impl Heap {
    fn new() -> Self {
        Self {
            heap: [0; HEAP_SIZE],
            len: 0,
            max: 0,
            depth: [0; HEAP_SIZE],
            bl_count: [0; MAX_BITS + 1],
            opt_len: 0,
            static_len: 0,
        }
    }

    #[inline]
    fn smaller(&self, tree: &[TreeNode], n: usize, m: usize) -> bool {
        tree[n].freq < tree[m].freq
            || (tree[n].freq == tree[m].freq && self.depth[n] <= self.depth[m])
    }

    /// Restore the heap property by sifting node `k` down.
    fn pqdownheap(&mut self, tree: &[TreeNode], mut k: usize) {
        let v = self.heap[k];
        let mut j = k << 1;
        while j <= self.len {
            if j < self.len && self.smaller(tree, self.heap[j + 1], self.heap[j]) {
                j += 1;
            }
            if self.smaller(tree, v, self.heap[j]) {
                break;
            }
            self.heap[k] = self.heap[j];
            k = j;
            j <<= 1;
        }
        self.heap[k] = v;
    }

    fn pqremove(&mut self, tree: &[TreeNode]) -> usize {
        let top = self.heap[1];
        self.heap[1] = self.heap[self.len];
        self.len -= 1;
        self.pqdownheap(tree, 1);
        top
    }

    /// Compute code lengths from the merged tree, limiting them to the
    /// alphabet's maximum, and accumulate the block cost.
    fn gen_bitlen(&mut self, tree: &mut [TreeNode], max_code: usize, desc: &StaticDesc) {
        let max_length = desc.max_length;
        let mut overflow = 0i32;

        self.bl_count = [0; MAX_BITS + 1];

        // The root has length zero; parents always precede children here.
        tree[self.heap[self.max]].len = 0;

        for h in self.max + 1..HEAP_SIZE {
            let n = self.heap[h];
            let mut bits = tree[tree[n].dad as usize].len as usize + 1;
            if bits > max_length {
                bits = max_length;
                overflow += 1;
            }
            tree[n].len = bits as u16;

            if n > max_code {
                continue;
            }

            self.bl_count[bits] += 1;
            let xbits = if n >= desc.extra_base {
                desc.extra_bits[n - desc.extra_base] as i64
            } else {
                0
            };
            let f = i64::from(tree[n].freq);
            self.opt_len += f * (bits as i64 + xbits);
            if let Some(stree) = desc.static_tree {
                self.static_len += f * (i64::from(stree[n].len) + xbits);
            }
        }
        if overflow == 0 {
            return;
        }

        trace!("bit length overflow: {} codes", overflow);

        // Find the first bit length which could increase.
        loop {
            let mut bits = max_length - 1;
            while self.bl_count[bits] == 0 {
                bits -= 1;
            }
            // Move one leaf down the tree and one overflow item as its
            // brother; the overflow item's parent moves up.
            self.bl_count[bits] -= 1;
            self.bl_count[bits + 1] += 2;
            self.bl_count[max_length] -= 1;
            overflow -= 2;
            if overflow <= 0 {
                break;
            }
        }

        // Reassign lengths in frequency order.
        let mut h = HEAP_SIZE;
        for bits in (1..=max_length).rev() {
            let mut n = self.bl_count[bits];
            while n != 0 {
                h -= 1;
                let m = self.heap[h];
                if m > max_code {
                    continue;
                }
                if tree[m].len as usize != bits {
                    self.opt_len += (bits as i64 - i64::from(tree[m].len)) * i64::from(tree[m].freq);
                    tree[m].len = bits as u16;
                }
                n -= 1;
            }
        }
    }

    /// Build a Huffman tree for `tree`'s frequencies and assign codes.
    /// Returns the largest code with non-zero frequency.
    fn build_tree(&mut self, tree: &mut [TreeNode], desc: &StaticDesc) -> usize {
        let elems = desc.elems;
        let mut max_code: isize = -1;

        self.len = 0;
        self.max = HEAP_SIZE;

        for (n, node) in tree.iter_mut().enumerate().take(elems) {
            if node.freq != 0 {
                self.len += 1;
                self.heap[self.len] = n;
                max_code = n as isize;
                self.depth[n] = 0;
            } else {
                node.len = 0;
            }
        }

        // The pkzip format requires at least one distance code and at least
        // two codes of any kind; force nodes of frequency one.
        while self.len < 2 {
            let node = if max_code < 2 {
                max_code += 1;
                max_code as usize
            } else {
                0
            };
            self.len += 1;
            self.heap[self.len] = node;
            tree[node].freq = 1;
            self.depth[node] = 0;
            self.opt_len -= 1;
            if let Some(stree) = desc.static_tree {
                self.static_len -= i64::from(stree[node].len);
            }
        }
        let max_code = max_code as usize;

        for n in (1..=self.len / 2).rev() {
            self.pqdownheap(tree, n);
        }

        // Repeatedly merge the two least frequent nodes.
        let mut node = elems;
        loop {
            let n = self.pqremove(tree);
            let m = self.heap[1];

            self.max -= 1;
            self.heap[self.max] = n;
            self.max -= 1;
            self.heap[self.max] = m;

            tree[node].freq = tree[n].freq + tree[m].freq;
            self.depth[node] = self.depth[n].max(self.depth[m]) + 1;
            tree[n].dad = node as u16;
            tree[m].dad = node as u16;

            self.heap[1] = node;
            node += 1;
            self.pqdownheap(tree, 1);

            if self.len < 2 {
                break;
            }
        }

        self.max -= 1;
        self.heap[self.max] = self.heap[1];

        self.gen_bitlen(tree, max_code, desc);
        gen_codes(tree, max_code, &self.bl_count);
        max_code
    }
}

/// Assign canonical codes given the per-length counts.
fn gen_codes(tree: &mut [TreeNode], max_code: usize, bl_count: &[u16; MAX_BITS + 1]) {
    let mut next_code = [0u32; MAX_BITS + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_BITS {
        code = (code + u32::from(bl_count[bits - 1])) << 1;
        next_code[bits] = code;
    }

    for node in tree.iter_mut().take(max_code + 1) {
        let len = node.len as usize;
        if len == 0 {
            continue;
        }
        node.code = bi_reverse(next_code[len], len as u32) as u16;
        next_code[len] += 1;
    }
}

/// Run-length shape of a code length sequence.
struct RunLimits {
    max_count: usize,
    min_count: usize,
}

impl RunLimits {
    fn start(nextlen: u16) -> Self {
        if nextlen == 0 {
            Self {
                max_count: 138,
                min_count: 3,
            }
        } else {
            Self {
                max_count: 7,
                min_count: 4,
            }
        }
    }

    fn after(curlen: u16, nextlen: u16) -> Self {
        if nextlen == 0 {
            Self {
                max_count: 138,
                min_count: 3,
            }
        } else if curlen == nextlen {
            Self {
                max_count: 6,
                min_count: 3,
            }
        } else {
            Self {
                max_count: 7,
                min_count: 4,
            }
        }
    }
}

/// Count the bit length codes needed to send `tree`.
fn scan_tree(bl_tree: &mut [TreeNode], tree: &mut [TreeNode], max_code: usize) {
    let mut prevlen: i32 = -1;
    let mut nextlen = tree[0].len;
    let mut count = 0usize;
    let mut limits = RunLimits::start(nextlen);

    // Guard so the run always ends at max_code.
    tree[max_code + 1].len = 0xFFFF;

    for n in 0..=max_code {
        let curlen = nextlen;
        nextlen = tree[n + 1].len;
        count += 1;
        if count < limits.max_count && curlen == nextlen {
            continue;
        } else if count < limits.min_count {
            bl_tree[curlen as usize].freq += count as u16;
        } else if curlen != 0 {
            if i32::from(curlen) != prevlen {
                bl_tree[curlen as usize].freq += 1;
            }
            bl_tree[REP_3_6].freq += 1;
        } else if count <= 10 {
            bl_tree[REPZ_3_10].freq += 1;
        } else {
            bl_tree[REPZ_11_138].freq += 1;
        }
        count = 0;
        prevlen = i32::from(curlen);
        limits = RunLimits::after(curlen, nextlen);
    }
}

/// Send `tree` in compressed form using the bit length codes.
fn send_tree(pending: &mut PendingBuf, bl_tree: &[TreeNode], tree: &[TreeNode], max_code: usize) {
    let mut prevlen: i32 = -1;
    let mut nextlen = tree[0].len;
    let mut count = 0usize;
    let mut limits = RunLimits::start(nextlen);

    for n in 0..=max_code {
        let curlen = nextlen;
        nextlen = tree[n + 1].len;
        count += 1;
        if count < limits.max_count && curlen == nextlen {
            continue;
        } else if count < limits.min_count {
            for _ in 0..count {
                send_code(pending, curlen as usize, bl_tree);
            }
        } else if curlen != 0 {
            if i32::from(curlen) != prevlen {
                send_code(pending, curlen as usize, bl_tree);
                count -= 1;
            }
            send_code(pending, REP_3_6, bl_tree);
            pending.send_bits((count - 3) as u32, 2);
        } else if count <= 10 {
            send_code(pending, REPZ_3_10, bl_tree);
            pending.send_bits((count - 3) as u32, 3);
        } else {
            send_code(pending, REPZ_11_138, bl_tree);
            pending.send_bits((count - 11) as u32, 7);
        }
        count = 0;
        prevlen = i32::from(curlen);
        limits = RunLimits::after(curlen, nextlen);
    }
}

/// Emit the symbols recorded in `sym_buf` with the given trees.
fn compress_block<L, D>(pending: &mut PendingBuf, sym_buf: &[u8], ltree: &L, dtree: &D)
where
    L: CodeLookup + ?Sized,
    D: CodeLookup + ?Sized,
{
    for sym in sym_buf.chunks_exact(3) {
        let mut dist = usize::from(sym[0]) | (usize::from(sym[1]) << 8);
        let mut lc = usize::from(sym[2]);
        if dist == 0 {
            send_code(pending, lc, ltree);
        } else {
            let code = LENGTH_CODE[lc] as usize;
            send_code(pending, code + LITERALS + 1, ltree);
            let extra = u32::from(EXTRA_LBITS[code]);
            if extra != 0 {
                lc -= BASE_LENGTH[code] as usize;
                pending.send_bits(lc as u32, extra);
            }
            dist -= 1;
            let code = d_code(dist);
            send_code(pending, code, dtree);
            let extra = u32::from(EXTRA_DBITS[code]);
            if extra != 0 {
                dist -= BASE_DIST[code] as usize;
                pending.send_bits(dist as u32, extra);
            }
        }
    }
    send_code(pending, END_BLOCK, ltree);
}

/// Emit the header of a stored block of `len` bytes. The payload follows
/// separately.
pub fn stored_header(pending: &mut PendingBuf, len: usize, last: bool) {
    pending.send_bits((STORED_BLOCK << 1) + u32::from(last), 3);
    pending.windup();
    let len = len as u16;
    pending.put_short(len);
    pending.put_short(!len);
}

/// Emit a stored block holding `buf`.
pub fn stored_block(pending: &mut PendingBuf, buf: &[u8], last: bool) {
    stored_header(pending, buf.len(), last);
    pending.put_bytes(buf);
}

/// Emit an empty fixed-code block to give the decoder enough lookahead to
/// finish the previous block.
pub fn align(pending: &mut PendingBuf) {
    pending.send_bits(STATIC_TREES << 1, 3);
    send_code(pending, END_BLOCK, &STATIC_LTREE[..]);
    pending.flush_bits();
}

/// Per-stream encoder trees and symbol buffer.
pub struct Trees {
    dyn_ltree: [TreeNode; HEAP_SIZE],
    dyn_dtree: [TreeNode; 2 * D_CODES + 1],
    bl_tree: [TreeNode; 2 * BL_CODES + 1],
    l_max_code: usize,
    d_max_code: usize,
    heap: Heap,
    /// Three bytes per symbol: distance (LE, 0 for a literal), then the
    /// literal or normalized length.
    sym_buf: Vec<u8>,
    sym_end: usize,
    /// Number of string matches in the current block.
    pub matches: usize,
}

impl Trees {
    /// Create trees for a symbol buffer of `lit_bufsize` entries.
    pub fn new(lit_bufsize: usize) -> Self {
        let mut trees = Self {
            dyn_ltree: [TreeNode::default(); HEAP_SIZE],
            dyn_dtree: [TreeNode::default(); 2 * D_CODES + 1],
            bl_tree: [TreeNode::default(); 2 * BL_CODES + 1],
            l_max_code: 0,
            d_max_code: 0,
            heap: Heap::new(),
            sym_buf: Vec::with_capacity(lit_bufsize * 3),
            sym_end: (lit_bufsize - 1) * 3,
            matches: 0,
        };
        trees.init_block();
        trees
    }

    /// Start a new block.
    pub fn init_block(&mut self) {
        for node in self.dyn_ltree.iter_mut().take(L_CODES) {
            node.freq = 0;
        }
        for node in self.dyn_dtree.iter_mut().take(D_CODES) {
            node.freq = 0;
        }
        for node in self.bl_tree.iter_mut().take(BL_CODES) {
            node.freq = 0;
        }
        self.dyn_ltree[END_BLOCK].freq = 1;
        self.heap.opt_len = 0;
        self.heap.static_len = 0;
        self.sym_buf.clear();
        self.matches = 0;
    }

    /// Whether any symbol has been recorded for the current block.
    #[inline]
    pub fn has_symbols(&self) -> bool {
        !self.sym_buf.is_empty()
    }

    /// Whether the symbol buffer is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.sym_buf.len() >= self.sym_end
    }

    /// Record a literal. Returns `true` when the block must be flushed.
    #[inline]
    pub fn tally_lit(&mut self, c: u8) -> bool {
        self.sym_buf.extend_from_slice(&[0, 0, c]);
        self.dyn_ltree[c as usize].freq += 1;
        self.is_full()
    }

    /// Record a match of `dist` bytes back and normalized length `len`
    /// (`length - MIN_MATCH`). Returns `true` when the block must be flushed.
    #[inline]
    pub fn tally_dist(&mut self, dist: usize, len: usize) -> bool {
        self.sym_buf
            .extend_from_slice(&[dist as u8, (dist >> 8) as u8, len as u8]);
        self.matches += 1;
        self.dyn_ltree[LENGTH_CODE[len] as usize + LITERALS + 1].freq += 1;
        self.dyn_dtree[d_code(dist - 1)].freq += 1;
        self.is_full()
    }

    /// Classify the block's literals as text or binary.
    ///
    /// Binary if any of the "block-listed" control bytes (0..6, 14..25,
    /// 28..31) occur; otherwise text if any of TAB, LF, CR or a byte from
    /// 32 up occurs.
    fn detect_data_type(&self) -> i32 {
        let mut block_mask: u32 = 0xF3FF_C07F;
        for n in 0..=31 {
            if block_mask & 1 != 0 && self.dyn_ltree[n].freq != 0 {
                return data_type::BINARY;
            }
            block_mask >>= 1;
        }

        if self.dyn_ltree[9].freq != 0
            || self.dyn_ltree[10].freq != 0
            || self.dyn_ltree[13].freq != 0
        {
            return data_type::TEXT;
        }
        if self.dyn_ltree[32..LITERALS].iter().any(|n| n.freq != 0) {
            return data_type::TEXT;
        }
        data_type::BINARY
    }

    /// Build the bit length tree and return the index in `BL_ORDER` of the
    /// last bit length code to send.
    fn build_bl_tree(&mut self) -> usize {
        scan_tree(&mut self.bl_tree, &mut self.dyn_ltree, self.l_max_code);
        scan_tree(&mut self.bl_tree, &mut self.dyn_dtree, self.d_max_code);

        self.heap.build_tree(&mut self.bl_tree, &BL_DESC);

        // At least four bit length codes are always sent.
        let mut max_blindex = BL_CODES - 1;
        while max_blindex >= 3 {
            if self.bl_tree[BL_ORDER[max_blindex] as usize].len != 0 {
                break;
            }
            max_blindex -= 1;
        }
        self.heap.opt_len += 3 * (max_blindex as i64 + 1) + 5 + 5 + 4;
        max_blindex
    }

    fn send_all_trees(&self, pending: &mut PendingBuf, lcodes: usize, dcodes: usize, blcodes: usize) {
        pending.send_bits((lcodes - 257) as u32, 5);
        pending.send_bits((dcodes - 1) as u32, 5);
        pending.send_bits((blcodes - 4) as u32, 4);
        for &order in BL_ORDER.iter().take(blcodes) {
            pending.send_bits(u32::from(self.bl_tree[order as usize].len), 3);
        }
        send_tree(pending, &self.bl_tree, &self.dyn_ltree, lcodes - 1);
        send_tree(pending, &self.bl_tree, &self.dyn_dtree, dcodes - 1);
    }

    /// Finish the current block with whichever encoding is cheapest.
    ///
    /// `stored` is the raw block input, if it is still available in the
    /// window; `stored_len` is its length either way.
    #[allow(clippy::too_many_arguments)]
    pub fn flush_block(
        &mut self,
        pending: &mut PendingBuf,
        stored: Option<&[u8]>,
        stored_len: usize,
        last: bool,
        level: i32,
        strategy: Strategy,
        data_type: &mut i32,
    ) {
        let mut max_blindex = 0;
        let (opt_lenb, static_lenb);

        if level > 0 {
            if *data_type == data_type::UNKNOWN {
                *data_type = self.detect_data_type();
            }

            self.l_max_code = self.heap.build_tree(&mut self.dyn_ltree, &L_DESC);
            self.d_max_code = self.heap.build_tree(&mut self.dyn_dtree, &D_DESC);
            max_blindex = self.build_bl_tree();

            let opt = ((self.heap.opt_len + 3 + 7) >> 3) as usize;
            let stat = ((self.heap.static_len + 3 + 7) >> 3) as usize;
            trace!(
                "block: stored {} bytes, dynamic {} bytes, fixed {} bytes, {} symbols",
                stored_len,
                opt,
                stat,
                self.sym_buf.len() / 3
            );
            static_lenb = stat;
            opt_lenb = if stat <= opt || strategy == Strategy::Fixed {
                stat
            } else {
                opt
            };
        } else {
            opt_lenb = stored_len + 5;
            static_lenb = opt_lenb;
        }

        match stored {
            Some(buf) if stored_len + 4 <= opt_lenb => {
                trace!("emit stored block, last={}", last);
                stored_block(pending, buf, last);
            }
            _ if static_lenb == opt_lenb => {
                trace!("emit fixed block, last={}", last);
                pending.send_bits((STATIC_TREES << 1) + u32::from(last), 3);
                compress_block(pending, &self.sym_buf, &STATIC_LTREE[..], &STATIC_DTREE[..]);
            }
            _ => {
                trace!("emit dynamic block, last={}", last);
                pending.send_bits((DYN_TREES << 1) + u32::from(last), 3);
                self.send_all_trees(
                    pending,
                    self.l_max_code + 1,
                    self.d_max_code + 1,
                    max_blindex + 1,
                );
                compress_block(pending, &self.sym_buf, &self.dyn_ltree[..], &self.dyn_dtree[..]);
            }
        }

        self.init_block();

        if last {
            pending.windup();
        }
    }
}
