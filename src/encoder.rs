use std::io;

use bitstream_io::{ByteWrite, ByteWriter, LittleEndian};
use tracing::{debug, trace};

use crate::{
    lzw::SUB_BLOCK_SIZE,
    records::{
        ApplicationDescriptor, GraphicsControlExtension, ImageDescriptor,
        LogicalScreenDescriptor, Version, APPLICATION_LABEL, COMMENT_LABEL, EXTENSION_INTRODUCER,
        GRAPHICS_CONTROL_LABEL, IMAGE_SEPARATOR, PLAIN_TEXT_LABEL, TRAILER,
    },
    visitor::{BlockVisitor, RawImageVisitor, Visitor},
    Error, Result,
};

/// Writes a GIF stream back from the events of a [Visitor].
///
/// Each event produces exactly the bytes the [Parser](crate::Parser) consumed for it, so
/// forwarding a parse straight into an encoder copies the stream. Image data is written as it
/// is received: pair the image visitor with an [ImageEncoder](crate::ImageEncoder) to compress
/// color indices.
///
/// The encoder does not check the order of events.
pub struct Encoder<W> {
    sink: W,
}

impl<W: io::Write> Encoder<ByteWriter<W, LittleEndian>> {
    pub fn from_writer(writer: W) -> Self {
        Self::new(ByteWriter::endian(writer, LittleEndian))
    }
}

impl<W: ByteWrite> Encoder<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn extension(&mut self, label: u8) -> Result<()> {
        self.sink.write(EXTENSION_INTRODUCER)?;
        self.sink.write(label)?;
        Ok(())
    }
}

impl<W: ByteWrite> Visitor for Encoder<W> {
    fn visit_header(&mut self, version: Version) -> Result<()> {
        version.encode(&mut self.sink)?;
        Ok(())
    }

    fn visit_logical_screen_descriptor(
        &mut self,
        descriptor: &LogicalScreenDescriptor,
    ) -> Result<()> {
        descriptor.encode(&mut self.sink)?;
        Ok(())
    }

    fn visit_global_color_table(&mut self, _index: usize, color: [u8; 3]) -> Result<()> {
        self.sink.write_bytes(&color)?;
        Ok(())
    }

    fn visit_graphics_control_extension(
        &mut self,
        extension: &GraphicsControlExtension,
    ) -> Result<()> {
        self.extension(GRAPHICS_CONTROL_LABEL)?;
        extension.encode(&mut self.sink)?;
        Ok(())
    }

    fn visit_application(
        &mut self,
        descriptor: &ApplicationDescriptor,
    ) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        self.extension(APPLICATION_LABEL)?;
        descriptor.encode(&mut self.sink)?;
        Ok(Some(Box::new(SubBlocks(&mut self.sink))))
    }

    fn visit_comment(&mut self) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        self.extension(COMMENT_LABEL)?;
        Ok(Some(Box::new(SubBlocks(&mut self.sink))))
    }

    fn visit_plain_text(&mut self, header: &[u8]) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        let header_size =
            u8::try_from(header.len()).map_err(|_| Error::Malformed("plain text header size"))?;

        self.extension(PLAIN_TEXT_LABEL)?;
        self.sink.write(header_size)?;
        self.sink.write_bytes(header)?;
        Ok(Some(Box::new(SubBlocks(&mut self.sink))))
    }

    fn visit_image(
        &mut self,
        descriptor: &ImageDescriptor,
    ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
        debug!(
            width = descriptor.width,
            height = descriptor.height,
            "writing image"
        );
        self.sink.write(IMAGE_SEPARATOR)?;
        descriptor.encode(&mut self.sink)?;
        Ok(Some(Box::new(SubBlocks(&mut self.sink))))
    }

    fn visit_end(&mut self) -> Result<()> {
        self.sink.write(TRAILER)?;
        Ok(())
    }
}

/// Frames data as sub-blocks, followed by the terminator.
struct SubBlocks<'a, W>(&'a mut W);

impl<W: ByteWrite> SubBlocks<'_, W> {
    /// Blocks longer than [SUB_BLOCK_SIZE] are split; empty blocks write nothing.
    fn write_blocks(&mut self, data: &[u8]) -> Result<()> {
        for block in data.chunks(SUB_BLOCK_SIZE) {
            trace!(size = block.len(), "sub-block");
            self.0.write(block.len() as u8)?;
            self.0.write_bytes(block)?;
        }
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        self.0.write(0u8)?;
        Ok(())
    }
}

impl<W: ByteWrite> BlockVisitor for SubBlocks<'_, W> {
    fn visit_block(&mut self, block: &[u8]) -> Result<()> {
        self.write_blocks(block)
    }

    fn visit_end(&mut self) -> Result<()> {
        self.terminate()
    }
}

impl<W: ByteWrite> RawImageVisitor for SubBlocks<'_, W> {
    fn visit_color_table(&mut self, _index: usize, color: [u8; 3]) -> Result<()> {
        self.0.write_bytes(&color)?;
        Ok(())
    }

    fn visit_data_start(&mut self, min_code_size: u8) -> Result<()> {
        self.0.write(min_code_size)?;
        Ok(())
    }

    fn visit_data_block(&mut self, block: &[u8]) -> Result<()> {
        self.write_blocks(block)
    }

    fn visit_end(&mut self) -> Result<()> {
        self.terminate()
    }
}
