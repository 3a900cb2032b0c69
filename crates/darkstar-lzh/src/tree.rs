//! Adaptive Huffman tree shared by the decoder and encoder.
//!
//! Nodes live in one array ordered by non-decreasing frequency. `son[n]` is
//! the left child of an internal node (the right child is `son[n] + 1`), or
//! `symbol + TABLE_SIZE` for a leaf. `prnt` maps nodes and leaves back to
//! their parent, with leaves stored at `symbol + TABLE_SIZE`.

/// Size of the sliding window.
pub const BUF_SIZE: usize = 4096;
/// Longest match length.
pub const LOOK_AHEAD: usize = 60;
/// Matches must be longer than this to be coded.
pub const THRESHOLD: usize = 2;
/// Number of symbols: 256 literals plus one per match length.
pub const N_CHAR: usize = 256 - THRESHOLD + LOOK_AHEAD;
/// Number of nodes in the code tree.
pub const TABLE_SIZE: usize = N_CHAR * 2 - 1;
/// Index of the root node.
pub const ROOT: usize = TABLE_SIZE - 1;
/// Root frequency that triggers a rebuild.
pub const MAX_FREQ: u32 = 0x8000;

/// Upper 6 bits of a match position, keyed by the first byte of its code.
pub(crate) const D_CODE: [u8; 256] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02,
    0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03,
    0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x05, 0x05, 0x05, 0x05, 0x05, 0x05, 0x05, 0x05,
    0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x07, 0x07, 0x07, 0x07, 0x07, 0x07, 0x07, 0x07,
    0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x09, 0x09, 0x09, 0x09, 0x09, 0x09, 0x09, 0x09,
    0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0B, 0x0B, 0x0B, 0x0B, 0x0B, 0x0B, 0x0B, 0x0B,
    0x0C, 0x0C, 0x0C, 0x0C, 0x0D, 0x0D, 0x0D, 0x0D, 0x0E, 0x0E, 0x0E, 0x0E, 0x0F, 0x0F, 0x0F, 0x0F,
    0x10, 0x10, 0x10, 0x10, 0x11, 0x11, 0x11, 0x11, 0x12, 0x12, 0x12, 0x12, 0x13, 0x13, 0x13, 0x13,
    0x14, 0x14, 0x14, 0x14, 0x15, 0x15, 0x15, 0x15, 0x16, 0x16, 0x16, 0x16, 0x17, 0x17, 0x17, 0x17,
    0x18, 0x18, 0x19, 0x19, 0x1A, 0x1A, 0x1B, 0x1B, 0x1C, 0x1C, 0x1D, 0x1D, 0x1E, 0x1E, 0x1F, 0x1F,
    0x20, 0x20, 0x21, 0x21, 0x22, 0x22, 0x23, 0x23, 0x24, 0x24, 0x25, 0x25, 0x26, 0x26, 0x27, 0x27,
    0x28, 0x28, 0x29, 0x29, 0x2A, 0x2A, 0x2B, 0x2B, 0x2C, 0x2C, 0x2D, 0x2D, 0x2E, 0x2E, 0x2F, 0x2F,
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F,
];

/// Total bit length of a position code, keyed by its first byte.
#[inline]
pub(crate) const fn decode_dlen(byte: usize) -> u32 {
    match byte {
        0..=31 => 3,
        32..=79 => 4,
        80..=143 => 5,
        144..=191 => 6,
        192..=239 => 7,
        _ => 8,
    }
}

/// Self-adjusting Huffman tree over the literal/length alphabet.
#[derive(Debug, Clone)]
pub(crate) struct AdaptiveTree {
    freq: Vec<u32>,
    prnt: Vec<usize>,
    son: Vec<usize>,
}

impl AdaptiveTree {
    /// Build the initial tree with every symbol at frequency 1.
    pub(crate) fn new() -> Self {
        let mut freq = vec![0u32; TABLE_SIZE + 1];
        let mut prnt = vec![0usize; TABLE_SIZE + N_CHAR];
        let mut son = vec![0usize; TABLE_SIZE];

        for i in 0..N_CHAR {
            freq[i] = 1;
            son[i] = i + TABLE_SIZE;
            prnt[i + TABLE_SIZE] = i;
        }

        let mut i = 0;
        for j in N_CHAR..=ROOT {
            freq[j] = freq[i] + freq[i + 1];
            son[j] = i;
            prnt[i] = j;
            prnt[i + 1] = j;
            i += 2;
        }

        // Sentinel that stops the re-sort scan in `update`.
        freq[TABLE_SIZE] = 0xFFFF;
        prnt[ROOT] = 0;

        Self { freq, prnt, son }
    }

    /// Left child of `node`, or `symbol + TABLE_SIZE` for a leaf.
    #[inline]
    pub(crate) fn son(&self, node: usize) -> usize {
        self.son[node]
    }

    /// Parent of `node`; leaves are addressed as `symbol + TABLE_SIZE`.
    #[inline]
    pub(crate) fn parent(&self, node: usize) -> usize {
        self.prnt[node]
    }

    #[cfg(test)]
    pub(crate) fn root_frequency(&self) -> u32 {
        self.freq[ROOT]
    }

    /// Count one more occurrence of `symbol` and restore frequency order.
    pub(crate) fn update(&mut self, symbol: usize) {
        if self.freq[ROOT] == MAX_FREQ {
            self.reconst();
        }

        let mut c = self.prnt[symbol + TABLE_SIZE];
        loop {
            self.freq[c] += 1;
            let k = self.freq[c];

            let mut l = c + 1;
            if k > self.freq[l] {
                while k > self.freq[l] {
                    l += 1;
                }
                l -= 1;
                self.freq.swap(c, l);

                let i = self.son[c];
                self.prnt[i] = l;
                if i < TABLE_SIZE {
                    self.prnt[i + 1] = l;
                }

                let j = self.son[l];
                self.son[l] = i;
                self.prnt[j] = c;
                if j < TABLE_SIZE {
                    self.prnt[j + 1] = c;
                }
                self.son[c] = j;

                c = l;
            }

            c = self.prnt[c];
            if c == 0 {
                break;
            }
        }
    }

    /// Halve all leaf frequencies and rebuild the tree from scratch.
    fn reconst(&mut self) {
        log::trace!("LZH tree rebuild at root frequency {}", self.freq[ROOT]);

        // Collect leaves into the front of the table.
        let mut j = 0;
        for i in 0..TABLE_SIZE {
            if self.son[i] >= TABLE_SIZE {
                self.freq[j] = (self.freq[i] + 1) / 2;
                self.son[j] = self.son[i];
                j += 1;
            }
        }

        // Join pairs, inserting each new node at its sorted position.
        let mut i = 0;
        for j in N_CHAR..TABLE_SIZE {
            let f = self.freq[i] + self.freq[i + 1];
            self.freq[j] = f;

            let mut k = j;
            while k > 0 && f < self.freq[k - 1] {
                k -= 1;
            }

            self.freq.copy_within(k..j, k + 1);
            self.son.copy_within(k..j, k + 1);
            self.freq[k] = f;
            self.son[k] = i;
            i += 2;
        }

        for i in 0..TABLE_SIZE {
            let k = self.son[i];
            self.prnt[k] = i;
            if k < TABLE_SIZE {
                self.prnt[k + 1] = i;
            }
        }
    }
}
