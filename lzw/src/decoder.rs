//! Incremental LZW decoder with variable code size.

use thiserror::Error;
use tracing::trace;

use crate::{io::BitReader, Code, CODE_SIZES, MAX_CODESIZE, MAX_ENTRIES};

/// The error type for decoding operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodingError {
    /// Code size out of bounds. It should be between 2 and 8 included.
    #[error("code size must be between 2 and 8, was {0}")]
    CodeSize(u8),
    /// [Decoder::decode] was called before [Decoder::initialize].
    #[error("decoder used before initialization")]
    NotInitialized,
    /// The end code was already decoded; the decoder must be initialized again.
    #[error("end code already reached")]
    Ended,
    /// A code that is neither in the dictionary nor the next entry to be defined.
    #[error("invalid code {code}, next dictionary entry is {next}")]
    InvalidCode { code: u16, next: u16 },
}

/// Lifecycle of a [Decoder].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Created, but [Decoder::initialize] was never called.
    Uninitialized,
    /// Accepting compressed data.
    Ready,
    /// The end code was decoded.
    Ended,
}

/// Where the sequence of an entry continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    /// Literal of the initial table, first symbol of every sequence built on it.
    Root,
    Clear,
    End,
    Prefix(Code),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    link: Link,
    value: u8,
}

/// The dictionary, stored as back references towards a root literal.
///
/// Its length is the next free code.
struct Table {
    entries: Vec<Entry>,
    /// Sequence under reconstruction, last symbol first. Never deeper than the dictionary.
    stack: Vec<u8>,
}

impl Table {
    fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_ENTRIES),
            stack: Vec::with_capacity(MAX_ENTRIES),
        }
    }

    fn reset(&mut self, code_size: u8) {
        self.entries.clear();
        self.entries.extend((0..1u16 << code_size).map(|k| Entry {
            link: Link::Root,
            value: k as u8,
        }));
        self.entries.push(Entry {
            link: Link::Clear,
            value: 0,
        });
        self.entries.push(Entry {
            link: Link::End,
            value: 0,
        });
    }

    #[inline]
    fn next(&self) -> Code {
        self.entries.len() as Code
    }

    #[inline]
    fn add(&mut self, prefix: Code, value: u8) {
        if self.entries.len() < MAX_ENTRIES {
            self.entries.push(Entry {
                link: Link::Prefix(prefix),
                value,
            });
        }
    }

    /// Appends the sequence of `code` to `into`, and returns its first symbol.
    fn write_word(&mut self, code: Code, into: &mut Vec<u8>) -> u8 {
        self.stack.clear();

        let mut code = code;
        loop {
            let entry = self.entries[code as usize];
            self.stack.push(entry.value);
            match entry.link {
                Link::Prefix(prefix) => code = prefix,
                _ => break,
            }
        }

        into.extend(self.stack.iter().rev());
        self.stack[self.stack.len() - 1]
    }
}

/// LZW decoder for GIF image data.
///
/// Compressed bytes can be fed in blocks of any size, typically the sub-blocks of an image.
/// Bits of a code split across two blocks are carried over, so the output does not depend on how
/// the stream is cut.
///
/// # Examples
///
/// ```
/// use gifstream_lzw::{Decoder, DecoderState};
///
/// let mut decoder = Decoder::new();
/// decoder.initialize(2).unwrap();
///
/// let mut decoded = decoder.decode(&[0x04, 0x32]).unwrap();
/// decoded.extend(decoder.decode(&[0x05]).unwrap());
///
/// assert_eq!(decoded, [0, 0, 1, 3]);
/// assert_eq!(decoder.state(), DecoderState::Ended);
/// ```
pub struct Decoder {
    table: Table,
    reader: BitReader,
    code_size: u8,
    read_size: u8,
    previous: Option<Code>,
    state: DecoderState,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Creates an uninitialized decoder. The dictionary is allocated once, here.
    pub fn new() -> Self {
        Self {
            table: Table::new(),
            reader: BitReader::default(),
            code_size: 0,
            read_size: 0,
            previous: None,
            state: DecoderState::Uninitialized,
        }
    }

    /// Prepares the decoder for a new stream, dropping everything left from a previous one.
    ///
    /// # Arguments
    ///
    /// * `code_size` - Between 2 and 8, the minimum code size stored before the image data.
    ///
    /// # Errors
    ///
    /// Fails with [DecodingError::CodeSize] if `code_size` is out of bounds.
    pub fn initialize(&mut self, code_size: u8) -> Result<(), DecodingError> {
        if !CODE_SIZES.contains(&code_size) {
            return Err(DecodingError::CodeSize(code_size));
        }

        self.code_size = code_size;
        self.reader.reset();
        self.clear();
        self.state = DecoderState::Ready;
        Ok(())
    }

    /// Where the decoder is in its lifecycle.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Whether the end code was decoded.
    pub fn has_ended(&self) -> bool {
        self.state == DecoderState::Ended
    }

    /// Decodes `data` and returns the indices it completes.
    ///
    /// See [Decoder::decode_into].
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>, DecodingError> {
        let mut decoded = Vec::with_capacity(data.len() * 2);
        self.decode_into(data, &mut decoded)?;
        Ok(decoded)
    }

    /// Decodes as many whole codes as `data`, plus the bits carried from the previous call,
    /// contain, appending the indices to `into`.
    ///
    /// Decoding stops at the end code; the rest of `data` is ignored and the decoder moves to
    /// [DecoderState::Ended]. Running out of data is not an error: the partial code is kept
    /// until more data arrives.
    ///
    /// # Errors
    ///
    /// Fails if the decoder is not [DecoderState::Ready], or on a code that can't be resolved.
    pub fn decode_into(&mut self, data: &[u8], into: &mut Vec<u8>) -> Result<(), DecodingError> {
        match self.state {
            DecoderState::Uninitialized => return Err(DecodingError::NotInitialized),
            DecoderState::Ended => return Err(DecodingError::Ended),
            DecoderState::Ready => {}
        }

        let clear_code: Code = 1 << self.code_size;
        let end_of_information = clear_code + 1;

        let mut data = data;
        while let Some(code) = self.reader.read(self.read_size, &mut data) {
            if code == clear_code {
                trace!(read_size = self.read_size, "clear code");
                self.clear();
                continue;
            }
            if code == end_of_information {
                self.state = DecoderState::Ended;
                return Ok(());
            }

            let next = self.table.next();
            match self.previous {
                None if code < next => {
                    self.table.write_word(code, into);
                }
                Some(previous) if code < next => {
                    let first_k = self.table.write_word(code, into);
                    self.table.add(previous, first_k);
                }
                Some(previous) if code == next => {
                    let first_k = self.table.write_word(previous, into);
                    into.push(first_k);
                    self.table.add(previous, first_k);
                }
                _ => return Err(DecodingError::InvalidCode { code, next }),
            }
            self.previous = Some(code);

            if self.table.next() == 1 << self.read_size && self.read_size < MAX_CODESIZE {
                self.read_size += 1;
            }
        }

        Ok(())
    }

    fn clear(&mut self) {
        self.table.reset(self.code_size);
        self.read_size = self.code_size + 1;
        self.previous = None;
    }
}
