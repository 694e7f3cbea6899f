//! Incremental LZW encoder with variable code size, emitting GIF sized sub-blocks.

use thiserror::Error;
use tracing::trace;

use crate::{io::BitWriter, Code, CODE_SIZES, MAX_CODESIZE, MAX_ENTRIES};

/// Largest payload of a GIF sub-block.
pub const SUB_BLOCK_SIZE: usize = 255;

/// The error type for encoding operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Code size out of bounds. It should be between 2 and 8 included.
    #[error("code size must be between 2 and 8, was {0}")]
    CodeSize(u8),
    /// The encoder was used before [Encoder::initialize].
    #[error("encoder used before initialization")]
    NotInitialized,
    /// Data was accepted after the end of input was signalled.
    #[error("encoder already wrote the end code")]
    Finished,
    /// An unexpected code was read.
    ///
    /// For a code size of 4 for example, we expect the data to be between 0 and 2.pow(4) = 16.
    /// Encoding 42 would then fail with this error.
    #[error("unexpected code {code} for code size {code_size}")]
    UnexpectedCode { code: u8, code_size: u8 },
}

/// Lifecycle of an [Encoder].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Created, but [Encoder::initialize] was never called.
    Uninitialized,
    /// Accepting data.
    Encoding,
    /// The end code was written, only buffered output is left to drain.
    Finished,
}

/// Checking the tree after encoding, most items had zero or one child, and the count then reduces
/// logarithmically. The enum spares a vec allocation until an item gets a second child.
#[derive(Debug, Clone)]
enum Node {
    NoChild,
    OneChild(u8, Code),
    ManyChildren(Vec<Code>),
}

/// Trie of the dictionary: the child of a code for a symbol is the code of the longer sequence.
///
/// Sequences in the dictionary are unique, so walking the trie finds the same longest match as
/// scanning every entry.
struct Tree {
    nodes: Vec<Node>,
    code_count: usize,
}

impl Tree {
    fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(MAX_ENTRIES),
            code_count: 0,
        }
    }

    /// Leaves the roots, the clear code and the end code.
    #[inline]
    fn reset(&mut self, code_size: u8) {
        self.code_count = 1 << code_size;
        self.nodes.clear();
        self.nodes.resize(self.code_count + 2, Node::NoChild);
    }

    #[inline]
    fn find_word(&self, prefix_index: Code, next_char: u8) -> Option<Code> {
        match &self.nodes[prefix_index as usize] {
            Node::NoChild => None,
            &Node::OneChild(child_char, child_index) => {
                if child_char == next_char {
                    Some(child_index)
                } else {
                    None
                }
            }
            // Zero is a root, never a child, so it marks a missing child.
            Node::ManyChildren(child_indices) => match child_indices[next_char as usize] {
                0 => None,
                child_index => Some(child_index),
            },
        }
    }

    #[inline]
    fn add(&mut self, prefix_index: Code, k: u8) -> Code {
        let new_index = self.nodes.len() as Code;
        let code_count = self.code_count;

        let node = &mut self.nodes[prefix_index as usize];
        match *node {
            Node::NoChild => *node = Node::OneChild(k, new_index),
            Node::OneChild(other_k, other_index) => {
                let mut children = vec![0; code_count];
                children[other_k as usize] = other_index;
                children[k as usize] = new_index;
                *node = Node::ManyChildren(children);
            }
            Node::ManyChildren(ref mut children) => children[k as usize] = new_index,
        }
        self.nodes.push(Node::NoChild);
        new_index
    }

    #[inline]
    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// LZW encoder for GIF image data.
///
/// Indices are staged with [Encoder::accept] and compressed by [Encoder::encode], which yields
/// one sub-block of at most [SUB_BLOCK_SIZE] bytes per call. Callers drain every sub-block before
/// staging more data:
///
/// ```
/// use gifstream_lzw::Encoder;
///
/// fn main() -> Result<(), gifstream_lzw::EncodingError> {
///     let mut encoder = Encoder::new();
///     encoder.initialize(2)?;
///
///     let mut sub_blocks = vec![];
///     for chunk in [&[0, 0][..], &[1, 3][..]] {
///         encoder.accept(chunk)?;
///         while let Some(sub_block) = encoder.encode(false)? {
///             sub_blocks.push(sub_block);
///         }
///     }
///     while let Some(sub_block) = encoder.encode(true)? {
///         sub_blocks.push(sub_block);
///     }
///
///     assert_eq!(sub_blocks, [[0x04, 0x32, 0x05]]);
///     Ok(())
/// }
/// ```
pub struct Encoder {
    tree: Tree,
    writer: BitWriter,
    code_size: u8,
    write_size: u8,
    current_prefix: Option<Code>,
    input: Vec<u8>,
    position: usize,
    /// Packed bytes not handed out yet. Grows past [SUB_BLOCK_SIZE] by the tail of the code that
    /// completed a sub-block; that tail opens the next one.
    output: Vec<u8>,
    state: EncoderState,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Creates an uninitialized encoder. The dictionary is allocated once, here.
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            writer: BitWriter::default(),
            code_size: 0,
            write_size: 0,
            current_prefix: None,
            input: Vec::new(),
            position: 0,
            output: Vec::with_capacity(SUB_BLOCK_SIZE + 4),
            state: EncoderState::Uninitialized,
        }
    }

    /// Compress data in one go, returning the code stream without sub-block framing.
    ///
    /// # Arguments
    ///
    /// * `data` - The source data to be compressed.
    /// * `code_size` - Between 2 and 8, the initial code size to use.
    ///   Initial code size correspond to the range of expected data: a code size of 7 means
    ///   that we expect 2.pow(7) == 128 possibilities.
    ///   The initial write size will be equal to code size + 1.
    ///
    /// # Errors
    ///
    /// This function can fail for unexpected codes or code sizes.
    pub fn encode_to_vec(data: &[u8], code_size: u8) -> Result<Vec<u8>, EncodingError> {
        let mut encoder = Encoder::new();
        encoder.initialize(code_size)?;
        encoder.accept(data)?;

        let mut output = vec![];
        while let Some(sub_block) = encoder.encode(true)? {
            output.extend_from_slice(&sub_block);
        }
        Ok(output)
    }

    /// Prepares the encoder for a new stream and writes the leading clear code.
    ///
    /// Everything left from a previous stream is dropped.
    ///
    /// # Errors
    ///
    /// Fails with [EncodingError::CodeSize] if `code_size` is not between 2 and 8.
    pub fn initialize(&mut self, code_size: u8) -> Result<(), EncodingError> {
        if !CODE_SIZES.contains(&code_size) {
            return Err(EncodingError::CodeSize(code_size));
        }

        self.code_size = code_size;
        self.writer.reset();
        self.output.clear();
        self.input.clear();
        self.position = 0;
        self.current_prefix = None;
        self.reset_dictionary();
        self.state = EncoderState::Encoding;

        self.write_code(self.clear_code());
        Ok(())
    }

    /// Where the encoder is in its lifecycle.
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Stages a chunk of indices, behind whatever is left of the previous chunks.
    ///
    /// # Errors
    ///
    /// Fails if the encoder is not initialized, or already finished.
    pub fn accept(&mut self, chunk: &[u8]) -> Result<(), EncodingError> {
        match self.state {
            EncoderState::Uninitialized => return Err(EncodingError::NotInitialized),
            EncoderState::Finished => return Err(EncodingError::Finished),
            EncoderState::Encoding => {}
        }

        self.input.drain(..self.position);
        self.position = 0;
        self.input.extend_from_slice(chunk);
        Ok(())
    }

    /// Compresses staged indices until a sub-block is complete.
    ///
    /// Returns `None` when more input is needed to fill another sub-block. With `end_of_input`,
    /// the pending sequence and the end code are written once the staged indices are consumed,
    /// and the last, possibly shorter, sub-block is returned; then `None`.
    ///
    /// # Errors
    ///
    /// Fails if the encoder is not initialized, or on an index outside the code size range.
    pub fn encode(&mut self, end_of_input: bool) -> Result<Option<Vec<u8>>, EncodingError> {
        match self.state {
            EncoderState::Uninitialized => return Err(EncodingError::NotInitialized),
            EncoderState::Finished => return Ok(self.take_sub_block()),
            EncoderState::Encoding => {}
        }

        while self.output.len() < SUB_BLOCK_SIZE {
            let Some(&k) = self.input.get(self.position) else {
                break;
            };
            self.position += 1;
            self.push(k)?;
        }

        if end_of_input && self.output.len() < SUB_BLOCK_SIZE {
            self.finish();
        }

        Ok(self.take_sub_block())
    }

    #[inline]
    fn push(&mut self, k: u8) -> Result<(), EncodingError> {
        if (k as usize) >= self.tree.code_count {
            return Err(EncodingError::UnexpectedCode {
                code: k,
                code_size: self.code_size,
            });
        }

        let Some(current_prefix) = self.current_prefix else {
            self.current_prefix = Some(k as Code);
            return Ok(());
        };

        if let Some(word) = self.tree.find_word(current_prefix, k) {
            self.current_prefix = Some(word);
            return Ok(());
        }

        self.write_code(current_prefix);
        if self.tree.len() == MAX_ENTRIES {
            trace!("dictionary full, clear code");
            self.write_code(self.clear_code());
            self.reset_dictionary();
        } else {
            let index_of_new_entry = self.tree.add(current_prefix, k);
            if index_of_new_entry == 1 << self.write_size && self.write_size < MAX_CODESIZE {
                self.write_size += 1;
            }
        }
        self.current_prefix = Some(k as Code);

        Ok(())
    }

    fn finish(&mut self) {
        if let Some(current_prefix) = self.current_prefix.take() {
            self.write_code(current_prefix);
        }
        self.write_code(self.clear_code() + 1);
        self.writer.fill(&mut self.output);

        self.input.clear();
        self.position = 0;
        self.state = EncoderState::Finished;
    }

    fn take_sub_block(&mut self) -> Option<Vec<u8>> {
        if self.output.len() >= SUB_BLOCK_SIZE {
            Some(self.output.drain(..SUB_BLOCK_SIZE).collect())
        } else if self.state == EncoderState::Finished && !self.output.is_empty() {
            Some(std::mem::take(&mut self.output))
        } else {
            None
        }
    }

    #[inline]
    fn write_code(&mut self, code: Code) {
        self.writer.write(self.write_size, code, &mut self.output);
    }

    #[inline]
    fn clear_code(&self) -> Code {
        1 << self.code_size
    }

    fn reset_dictionary(&mut self) {
        self.tree.reset(self.code_size);
        self.write_size = self.code_size + 1;
    }
}
