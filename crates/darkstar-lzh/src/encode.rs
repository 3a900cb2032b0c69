//! LZH encoder.
//!
//! Produces streams the decoder in this crate (and the engine) expands. Match
//! search is a greedy scan of the whole window, which is slow but keeps the
//! output deterministic.

use crate::tree::{decode_dlen, AdaptiveTree, BUF_SIZE, D_CODE, LOOK_AHEAD, ROOT, TABLE_SIZE, THRESHOLD};

/// MSB-first bit packer.
#[derive(Default)]
struct BitWriter {
    out: Vec<u8>,
    acc: u8,
    len: u32,
}

impl BitWriter {
    fn put_bit(&mut self, bit: bool) {
        self.acc = (self.acc << 1) | bit as u8;
        self.len += 1;
        if self.len == 8 {
            self.out.push(self.acc);
            self.acc = 0;
            self.len = 0;
        }
    }

    fn put_bits(&mut self, value: u32, count: u32) {
        for shift in (0..count).rev() {
            self.put_bit((value >> shift) & 1 != 0);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.len > 0 {
            self.out.push(self.acc << (8 - self.len));
        }
        self.out
    }
}

/// First code byte for each upper-position value.
fn position_prefixes() -> [usize; 64] {
    let mut first = [0usize; 64];
    for byte in (0..256).rev() {
        first[D_CODE[byte] as usize] = byte;
    }
    first
}

struct Encoder {
    bits: BitWriter,
    tree: AdaptiveTree,
    prefixes: [usize; 64],
    path: Vec<bool>,
}

impl Encoder {
    fn encode_char(&mut self, symbol: usize) {
        self.path.clear();
        let mut node = self.tree.parent(symbol + TABLE_SIZE);
        loop {
            self.path.push(node & 1 != 0);
            node = self.tree.parent(node);
            if node == ROOT {
                break;
            }
        }
        for &bit in self.path.iter().rev() {
            self.bits.put_bit(bit);
        }
        self.tree.update(symbol);
    }

    fn encode_position(&mut self, position: usize) {
        let first = self.prefixes[position >> 6];
        let len = decode_dlen(first);
        self.bits.put_bits((first >> (8 - len)) as u32, len);
        self.bits.put_bits((position & 0x3F) as u32, 6);
    }
}

/// Longest earlier occurrence of the bytes at `pos`, as `(distance - 1, length)`.
fn find_match(data: &[u8], pos: usize) -> (usize, usize) {
    let max_len = LOOK_AHEAD.min(data.len() - pos);
    let mut best = (0, 0);
    if max_len <= THRESHOLD {
        return best;
    }

    for p in 0..BUF_SIZE.min(pos) {
        let src = pos - (p + 1);
        let len = (0..max_len)
            .take_while(|&k| data[src + k] == data[pos + k])
            .count();
        if len > best.1 {
            best = (p, len);
            if len == max_len {
                break;
            }
        }
    }
    best
}

/// Compress `data` into an LZH stream.
///
/// The result carries no length; callers must store the uncompressed size
/// alongside it.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder {
        bits: BitWriter::default(),
        tree: AdaptiveTree::new(),
        prefixes: position_prefixes(),
        path: Vec::with_capacity(32),
    };

    let mut pos = 0;
    while pos < data.len() {
        let (position, len) = find_match(data, pos);
        if len > THRESHOLD {
            encoder.encode_char(len + 255 - THRESHOLD);
            encoder.encode_position(position);
            pos += len;
        } else {
            encoder.encode_char(data[pos] as usize);
            pos += 1;
        }
    }

    encoder.bits.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompress_to_vec;

    #[test]
    fn test_known_encodings() {
        assert_eq!(compress(b"A"), [0xE6, 0x80]);
        assert_eq!(compress(&[0, 0, 0]), [0xC6, 0x62, 0xE1]);
        assert_eq!(
            compress(b"hello hello hello world"),
            [0xFA, 0x7C, 0x7F, 0x18, 0x7F, 0xBD, 0x64, 0xA8, 0x14, 0x0F, 0x0B, 0xFD, 0x7B, 0xE0]
        );
    }

    #[test]
    fn test_empty() {
        assert!(compress(&[]).is_empty());
    }

    #[test]
    fn test_runs_and_window_edges() {
        let mut data = vec![0x5Au8; 300];
        data.extend((0..5000u32).map(|i| (i % 251) as u8));
        let repeat = data[..BUF_SIZE].to_vec();
        data.extend_from_slice(&repeat);

        let packed = compress(&data);
        assert!(packed.len() < data.len());
        assert_eq!(decompress_to_vec(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_position_prefixes_cover_all_values() {
        let prefixes = position_prefixes();
        for (value, &first) in prefixes.iter().enumerate() {
            assert_eq!(D_CODE[first] as usize, value);
            assert!(first == 0 || D_CODE[first - 1] as usize != value);
        }
    }
}
