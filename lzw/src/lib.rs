//! Streaming LZW encoder and decoder, GIF variation.
//!
//! Codes have a variable width, starting at `min_code_size + 1` bits and growing up to 12 bits,
//! and are packed least significant bit first. Two codes are reserved:
//!
//!  * `clear code == 1 << min_code_size` resets the dictionary,
//!  * `end code   == clear code + 1` terminates the stream.
//!
//! Unlike a one-shot compressor, both [Decoder] and [Encoder] are incremental state machines.
//! The decoder accepts compressed bytes in chunks of any size and returns the indices it could
//! fully decode so far. The encoder accepts indices in chunks and yields the compressed stream
//! as sub-blocks of at most [SUB_BLOCK_SIZE] bytes, ready to be framed in a GIF image.
//!
//! An instance is meant to be owned by a single session at a time. It can be reused (or pooled)
//! across sessions: `initialize` resets every piece of carried state.
//!
//! # Examples
//!
//! ```
//! use gifstream_lzw::{Decoder, Encoder};
//!
//! let data = [0, 0, 1, 3];
//!
//! let compressed = Encoder::encode_to_vec(&data, 2).unwrap();
//! assert_eq!(compressed, [0x04, 0x32, 0x05]);
//!
//! let mut decoder = Decoder::new();
//! decoder.initialize(2).unwrap();
//! assert_eq!(decoder.decode(&compressed).unwrap(), data);
//! ```

pub mod decoder;
pub mod encoder;
mod io;

pub use decoder::{Decoder, DecoderState, DecodingError};
pub use encoder::{Encoder, EncoderState, EncodingError, SUB_BLOCK_SIZE};

/// Largest code width, in bits.
pub(crate) const MAX_CODESIZE: u8 = 12;
/// Largest dictionary, reserved codes included.
pub(crate) const MAX_ENTRIES: usize = 1 << MAX_CODESIZE as usize;

/// Alias for a LZW code point.
pub(crate) type Code = u16;

/// Smallest and largest accepted minimum code size.
pub(crate) const CODE_SIZES: std::ops::RangeInclusive<u8> = 2..=8;
