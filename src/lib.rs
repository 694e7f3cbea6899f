//! Streaming GIF codec.
//!
//! A [Parser] walks a GIF stream once, from the header to the trailer, and reports each element
//! to a [Visitor]: header, screen descriptor, color tables, extensions and images. Image data is
//! forwarded as compressed sub-blocks; an [ImageDecoder] turns them into color indices on the
//! fly, with the incremental LZW decoder of [lzw]. Nothing is buffered beyond one sub-block.
//!
//! The [Encoder] is a [Visitor] too, writing every event back as bytes. Forwarding a parse
//! into an encoder copies a stream; putting an [ImageDecoder] and an [ImageEncoder] in between
//! recompresses its images.
//!
//! # Examples
//!
//! Count the pixels of every image:
//!
//! ```
//! use gifstream::{ImageDecoder, ImageVisitor, Parser, RawImageVisitor, Result, Visitor};
//! use gifstream::records::ImageDescriptor;
//!
//! #[derive(Default)]
//! struct Pixels(usize);
//!
//! impl ImageVisitor for Pixels {
//!     fn visit_data(&mut self, indices: &[u8]) -> Result<()> {
//!         self.0 += indices.len();
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Counter {
//!     decoder: gifstream::lzw::Decoder,
//!     pixels: Pixels,
//! }
//!
//! impl Visitor for Counter {
//!     fn visit_image(
//!         &mut self,
//!         _descriptor: &ImageDescriptor,
//!     ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
//!         let image = ImageDecoder::new(&mut self.decoder, &mut self.pixels);
//!         Ok(Some(Box::new(image)))
//!     }
//! }
//!
//! let gif = b"GIF89a\x02\x00\x02\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff\
//!             \x2c\x00\x00\x00\x00\x02\x00\x02\x00\x00\x02\x03\x44\x34\x05\x00\
//!             \x3b";
//!
//! let mut counter = Counter::default();
//! Parser::from_reader(&gif[..]).accept(&mut counter)?;
//!
//! assert_eq!(counter.pixels.0, 4);
//! # Ok::<(), gifstream::Error>(())
//! ```

pub use gifstream_lzw as lzw;

mod applications;
mod encoder;
mod error;
mod image;
mod parser;
pub mod records;
mod visitor;

pub use applications::{Applications, NetscapeLoop, NETSCAPE};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use image::{min_code_size, ImageDecoder, ImageEncoder};
pub use parser::Parser;
pub use visitor::{BlockVisitor, ImageVisitor, RawImageVisitor, Tee, Visitor};
