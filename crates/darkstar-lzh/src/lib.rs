//! LZH codec for Darkstar compressed payloads.
//!
//! LZH combines a 4 KiB sliding-window LZ77 with an adaptive Huffman code:
//! literals and match lengths share one self-adjusting code tree, while match
//! positions use a fixed prefix code for their upper 6 bits followed by 6 raw
//! bits.
//!
//! # Example
//!
//! ```
//! use darkstar_lzh::{compress, decompress_to_vec};
//!
//! let original = b"tribes tribes tribes";
//! let packed = compress(original);
//! let unpacked = decompress_to_vec(&packed, original.len())?;
//! assert_eq!(unpacked, original);
//! # Ok::<(), darkstar_lzh::Error>(())
//! ```

mod decode;
mod encode;
mod error;
mod tree;

pub use decode::{decompress, decompress_to_vec};
pub use encode::compress;
pub use error::{Error, Result};
pub use tree::{BUF_SIZE, LOOK_AHEAD, MAX_FREQ, N_CHAR, ROOT, TABLE_SIZE, THRESHOLD};
