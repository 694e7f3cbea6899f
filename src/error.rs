use std::io;

use thiserror::Error;

use crate::lzw::{DecodingError, EncodingError};

/// The error type for parsing and encoding GIF streams.
#[derive(Debug, Error)]
pub enum Error {
    /// The input ended inside a field, a record or a sub-block.
    #[error("unexpected end of input")]
    Truncated,
    /// Bytes that don't follow the GIF grammar.
    #[error("malformed input: {0}")]
    Malformed(&'static str),
    #[error(transparent)]
    Decoding(#[from] DecodingError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("i/o error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated,
            _ => Error::Io(error),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
