//! LZH decoder.

use darkstar_common::MemStream;

use crate::tree::{decode_dlen, AdaptiveTree, BUF_SIZE, D_CODE, LOOK_AHEAD, ROOT, TABLE_SIZE, THRESHOLD};
use crate::{Error, Result};

/// Initial write position in the window.
const WINDOW_START: usize = BUF_SIZE - LOOK_AHEAD;

/// MSB-first bit reader that zero-pads past the end of its input.
///
/// Padding bits may be buffered but never consumed: taking a bit beyond the
/// real input is reported as an underrun by the caller.
struct BitReader<'s, B> {
    stream: &'s mut MemStream<B>,
    buf: u32,
    len: u32,
    available: u64,
    consumed: u64,
}

impl<'s, B: AsRef<[u8]>> BitReader<'s, B> {
    fn new(stream: &'s mut MemStream<B>) -> Self {
        let available = stream.remaining() as u64 * 8;
        Self {
            stream,
            buf: 0,
            len: 0,
            available,
            consumed: 0,
        }
    }

    fn fill(&mut self) {
        while self.len <= 8 {
            let byte = self.stream.read_u8().unwrap_or(0) as u32;
            self.buf = (self.buf | (byte << (8 - self.len))) & 0xFFFF;
            self.len += 8;
        }
    }

    /// Take `count` bits (at most 8), or `None` if they run past the input.
    fn take(&mut self, count: u32) -> Option<u32> {
        self.consumed += count as u64;
        if self.consumed > self.available {
            return None;
        }
        self.fill();
        let value = self.buf >> (16 - count);
        self.buf = (self.buf << count) & 0xFFFF;
        self.len -= count;
        Some(value)
    }
}

struct Decoder<'s, B> {
    bits: BitReader<'s, B>,
    tree: AdaptiveTree,
}

impl<B: AsRef<[u8]>> Decoder<'_, B> {
    fn decode_char(&mut self) -> Option<usize> {
        let mut c = self.tree.son(ROOT);
        while c < TABLE_SIZE {
            c += self.bits.take(1)? as usize;
            c = self.tree.son(c);
        }
        c -= TABLE_SIZE;
        self.tree.update(c);
        Some(c)
    }

    fn decode_position(&mut self) -> Option<usize> {
        let mut i = self.bits.take(8)? as usize;
        let upper = (D_CODE[i] as usize) << 6;
        for _ in 0..decode_dlen(i) - 2 {
            i = (i << 1) + self.bits.take(1)? as usize;
        }
        Some(upper | (i & 0x3F))
    }
}

/// Expand LZH data from `input` into `output`.
///
/// Exactly `output_size` bytes are written at the output's current
/// position. The input may carry trailing bytes; at most two bytes of
/// read-ahead are consumed past the last bit used.
pub fn decompress<I, O>(
    output_size: usize,
    input: &mut MemStream<I>,
    output: &mut MemStream<O>,
) -> Result<()>
where
    I: AsRef<[u8]>,
    O: AsRef<[u8]> + AsMut<[u8]>,
{
    if output.remaining() < output_size {
        return Err(darkstar_common::Error::OutOfBounds {
            needed: output_size,
            available: output.remaining(),
        }
        .into());
    }

    let mut decoder = Decoder {
        bits: BitReader::new(input),
        tree: AdaptiveTree::new(),
    };
    let mut window = [0u8; BUF_SIZE];
    let mut r = WINDOW_START;
    let mut produced = 0;

    let underrun = |produced| Error::DecompressionUnderrun {
        produced,
        expected: output_size,
    };

    while produced < output_size {
        let c = decoder.decode_char().ok_or_else(|| underrun(produced))?;
        if c < 256 {
            let byte = c as u8;
            output.write_u8(byte)?;
            window[r] = byte;
            r = (r + 1) & (BUF_SIZE - 1);
            produced += 1;
        } else {
            let position = decoder.decode_position().ok_or_else(|| underrun(produced))?;
            let start = r.wrapping_sub(position + 1) & (BUF_SIZE - 1);
            let length = (c - 255 + THRESHOLD).min(output_size - produced);
            for k in 0..length {
                let byte = window[(start + k) & (BUF_SIZE - 1)];
                output.write_u8(byte)?;
                window[r] = byte;
                r = (r + 1) & (BUF_SIZE - 1);
            }
            produced += length;
        }
    }

    log::trace!(
        "LZH expanded {} bits into {} bytes",
        decoder.bits.consumed,
        produced
    );
    Ok(())
}

/// Expand a complete LZH buffer into a new vector of `output_size` bytes.
///
/// Sizes no bitstream of this length could reach fail as an underrun before
/// anything is allocated.
pub fn decompress_to_vec(input: &[u8], output_size: usize) -> Result<Vec<u8>> {
    // Each symbol costs at least one bit and yields at most one match.
    let ceiling = input.len().saturating_mul(8 * LOOK_AHEAD);
    if output_size > ceiling {
        return Err(Error::DecompressionUnderrun {
            produced: 0,
            expected: output_size,
        });
    }

    let mut output = vec![0u8; output_size];
    let mut in_stream = MemStream::new(input);
    let mut out_stream = MemStream::new(&mut output[..]);
    decompress(output_size, &mut in_stream, &mut out_stream)?;
    Ok(output)
}
