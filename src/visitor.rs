//! Events of a GIF stream, in the order the [Parser](crate::Parser) emits them.
//!
//! Every method has a default that ignores the event, so a visitor only implements what it
//! listens to. Methods returning a sub-visitor select what gets dispatched: `None` means the
//! parser still consumes the bytes of that element, but reports nothing about them.
//!
//! Behaviors compose by wrapping: a visitor holds another one and delegates the events it does
//! not handle itself.

use crate::{
    records::{
        ApplicationDescriptor, GraphicsControlExtension, ImageDescriptor,
        LogicalScreenDescriptor, Version,
    },
    Result,
};

/// Top level events of a stream.
pub trait Visitor {
    fn visit_header(&mut self, _version: Version) -> Result<()> {
        Ok(())
    }

    fn visit_logical_screen_descriptor(
        &mut self,
        _descriptor: &LogicalScreenDescriptor,
    ) -> Result<()> {
        Ok(())
    }

    /// One entry of the global color table, in index order.
    fn visit_global_color_table(&mut self, _index: usize, _color: [u8; 3]) -> Result<()> {
        Ok(())
    }

    fn visit_graphics_control_extension(
        &mut self,
        _extension: &GraphicsControlExtension,
    ) -> Result<()> {
        Ok(())
    }

    /// An application extension. The returned visitor receives its sub-blocks.
    fn visit_application(
        &mut self,
        _descriptor: &ApplicationDescriptor,
    ) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        Ok(None)
    }

    /// A comment extension. The returned visitor receives its sub-blocks.
    fn visit_comment(&mut self) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        Ok(None)
    }

    /// A plain text extension, with its fixed size header block. The returned visitor receives
    /// the text sub-blocks.
    fn visit_plain_text(&mut self, _header: &[u8]) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        Ok(None)
    }

    /// An image. The returned visitor receives its color table and compressed data.
    fn visit_image(
        &mut self,
        _descriptor: &ImageDescriptor,
    ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
        Ok(None)
    }

    /// The trailer, last event of a stream.
    fn visit_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Data sub-blocks of an extension.
pub trait BlockVisitor {
    fn visit_block(&mut self, _block: &[u8]) -> Result<()> {
        Ok(())
    }

    /// The zero length block terminating the extension.
    fn visit_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// An image as stored in the stream: local color table, then LZW compressed sub-blocks.
pub trait RawImageVisitor {
    /// One entry of the local color table, in index order.
    fn visit_color_table(&mut self, _index: usize, _color: [u8; 3]) -> Result<()> {
        Ok(())
    }

    fn visit_data_start(&mut self, _min_code_size: u8) -> Result<()> {
        Ok(())
    }

    /// One sub-block of compressed data, at most 255 bytes.
    fn visit_data_block(&mut self, _block: &[u8]) -> Result<()> {
        Ok(())
    }

    fn visit_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// An image with its data decoded to color indices.
pub trait ImageVisitor {
    fn visit_color_table(&mut self, _index: usize, _color: [u8; 3]) -> Result<()> {
        Ok(())
    }

    fn visit_data_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Color indices, in the order they are stored, as they get decoded.
    fn visit_data(&mut self, _indices: &[u8]) -> Result<()> {
        Ok(())
    }

    fn visit_data_end(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn visit_header(&mut self, version: Version) -> Result<()> {
        (**self).visit_header(version)
    }

    fn visit_logical_screen_descriptor(
        &mut self,
        descriptor: &LogicalScreenDescriptor,
    ) -> Result<()> {
        (**self).visit_logical_screen_descriptor(descriptor)
    }

    fn visit_global_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        (**self).visit_global_color_table(index, color)
    }

    fn visit_graphics_control_extension(
        &mut self,
        extension: &GraphicsControlExtension,
    ) -> Result<()> {
        (**self).visit_graphics_control_extension(extension)
    }

    fn visit_application(
        &mut self,
        descriptor: &ApplicationDescriptor,
    ) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        (**self).visit_application(descriptor)
    }

    fn visit_comment(&mut self) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        (**self).visit_comment()
    }

    fn visit_plain_text(&mut self, header: &[u8]) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        (**self).visit_plain_text(header)
    }

    fn visit_image(
        &mut self,
        descriptor: &ImageDescriptor,
    ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
        (**self).visit_image(descriptor)
    }

    fn visit_end(&mut self) -> Result<()> {
        (**self).visit_end()
    }
}

impl<V: Visitor + ?Sized> Visitor for Box<V> {
    fn visit_header(&mut self, version: Version) -> Result<()> {
        (**self).visit_header(version)
    }

    fn visit_logical_screen_descriptor(
        &mut self,
        descriptor: &LogicalScreenDescriptor,
    ) -> Result<()> {
        (**self).visit_logical_screen_descriptor(descriptor)
    }

    fn visit_global_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        (**self).visit_global_color_table(index, color)
    }

    fn visit_graphics_control_extension(
        &mut self,
        extension: &GraphicsControlExtension,
    ) -> Result<()> {
        (**self).visit_graphics_control_extension(extension)
    }

    fn visit_application(
        &mut self,
        descriptor: &ApplicationDescriptor,
    ) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        (**self).visit_application(descriptor)
    }

    fn visit_comment(&mut self) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        (**self).visit_comment()
    }

    fn visit_plain_text(&mut self, header: &[u8]) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        (**self).visit_plain_text(header)
    }

    fn visit_image(
        &mut self,
        descriptor: &ImageDescriptor,
    ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
        (**self).visit_image(descriptor)
    }

    fn visit_end(&mut self) -> Result<()> {
        (**self).visit_end()
    }
}

impl<V: BlockVisitor + ?Sized> BlockVisitor for &mut V {
    fn visit_block(&mut self, block: &[u8]) -> Result<()> {
        (**self).visit_block(block)
    }

    fn visit_end(&mut self) -> Result<()> {
        (**self).visit_end()
    }
}

impl<V: BlockVisitor + ?Sized> BlockVisitor for Box<V> {
    fn visit_block(&mut self, block: &[u8]) -> Result<()> {
        (**self).visit_block(block)
    }

    fn visit_end(&mut self) -> Result<()> {
        (**self).visit_end()
    }
}

impl<V: RawImageVisitor + ?Sized> RawImageVisitor for &mut V {
    fn visit_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        (**self).visit_color_table(index, color)
    }

    fn visit_data_start(&mut self, min_code_size: u8) -> Result<()> {
        (**self).visit_data_start(min_code_size)
    }

    fn visit_data_block(&mut self, block: &[u8]) -> Result<()> {
        (**self).visit_data_block(block)
    }

    fn visit_end(&mut self) -> Result<()> {
        (**self).visit_end()
    }
}

impl<V: RawImageVisitor + ?Sized> RawImageVisitor for Box<V> {
    fn visit_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        (**self).visit_color_table(index, color)
    }

    fn visit_data_start(&mut self, min_code_size: u8) -> Result<()> {
        (**self).visit_data_start(min_code_size)
    }

    fn visit_data_block(&mut self, block: &[u8]) -> Result<()> {
        (**self).visit_data_block(block)
    }

    fn visit_end(&mut self) -> Result<()> {
        (**self).visit_end()
    }
}

impl<V: ImageVisitor + ?Sized> ImageVisitor for &mut V {
    fn visit_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        (**self).visit_color_table(index, color)
    }

    fn visit_data_start(&mut self) -> Result<()> {
        (**self).visit_data_start()
    }

    fn visit_data(&mut self, indices: &[u8]) -> Result<()> {
        (**self).visit_data(indices)
    }

    fn visit_data_end(&mut self) -> Result<()> {
        (**self).visit_data_end()
    }
}

impl<V: ImageVisitor + ?Sized> ImageVisitor for Box<V> {
    fn visit_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        (**self).visit_color_table(index, color)
    }

    fn visit_data_start(&mut self) -> Result<()> {
        (**self).visit_data_start()
    }

    fn visit_data(&mut self, indices: &[u8]) -> Result<()> {
        (**self).visit_data(indices)
    }

    fn visit_data_end(&mut self) -> Result<()> {
        (**self).visit_data_end()
    }
}

/// Forwards every event to two visitors, the first one first.
///
/// Sub-visitors are paired the same way; an element only one side listens to goes to that side
/// alone.
pub struct Tee<A, B>(pub A, pub B);

struct TeeBlocks<'a>(Pair<dyn BlockVisitor + 'a>);

struct TeeImage<'a>(Pair<dyn RawImageVisitor + 'a>);

type Pair<T> = (Option<Box<T>>, Option<Box<T>>);

/// `None` when neither side listens.
fn tee_blocks<'a>(
    a: Option<Box<dyn BlockVisitor + 'a>>,
    b: Option<Box<dyn BlockVisitor + 'a>>,
) -> Option<Box<dyn BlockVisitor + 'a>> {
    if a.is_none() && b.is_none() {
        return None;
    }
    Some(Box::new(TeeBlocks((a, b))))
}

fn tee_image<'a>(
    a: Option<Box<dyn RawImageVisitor + 'a>>,
    b: Option<Box<dyn RawImageVisitor + 'a>>,
) -> Option<Box<dyn RawImageVisitor + 'a>> {
    if a.is_none() && b.is_none() {
        return None;
    }
    Some(Box::new(TeeImage((a, b))))
}

impl<A: Visitor, B: Visitor> Visitor for Tee<A, B> {
    fn visit_header(&mut self, version: Version) -> Result<()> {
        self.0.visit_header(version)?;
        self.1.visit_header(version)
    }

    fn visit_logical_screen_descriptor(
        &mut self,
        descriptor: &LogicalScreenDescriptor,
    ) -> Result<()> {
        self.0.visit_logical_screen_descriptor(descriptor)?;
        self.1.visit_logical_screen_descriptor(descriptor)
    }

    fn visit_global_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        self.0.visit_global_color_table(index, color)?;
        self.1.visit_global_color_table(index, color)
    }

    fn visit_graphics_control_extension(
        &mut self,
        extension: &GraphicsControlExtension,
    ) -> Result<()> {
        self.0.visit_graphics_control_extension(extension)?;
        self.1.visit_graphics_control_extension(extension)
    }

    fn visit_application(
        &mut self,
        descriptor: &ApplicationDescriptor,
    ) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        let a = self.0.visit_application(descriptor)?;
        let b = self.1.visit_application(descriptor)?;
        Ok(tee_blocks(a, b))
    }

    fn visit_comment(&mut self) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        let a = self.0.visit_comment()?;
        let b = self.1.visit_comment()?;
        Ok(tee_blocks(a, b))
    }

    fn visit_plain_text(&mut self, header: &[u8]) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
        let a = self.0.visit_plain_text(header)?;
        let b = self.1.visit_plain_text(header)?;
        Ok(tee_blocks(a, b))
    }

    fn visit_image(
        &mut self,
        descriptor: &ImageDescriptor,
    ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
        let a = self.0.visit_image(descriptor)?;
        let b = self.1.visit_image(descriptor)?;
        Ok(tee_image(a, b))
    }

    fn visit_end(&mut self) -> Result<()> {
        self.0.visit_end()?;
        self.1.visit_end()
    }
}

impl BlockVisitor for TeeBlocks<'_> {
    fn visit_block(&mut self, block: &[u8]) -> Result<()> {
        for visitor in [&mut self.0 .0, &mut self.0 .1].into_iter().flatten() {
            visitor.visit_block(block)?;
        }
        Ok(())
    }

    fn visit_end(&mut self) -> Result<()> {
        for visitor in [&mut self.0 .0, &mut self.0 .1].into_iter().flatten() {
            visitor.visit_end()?;
        }
        Ok(())
    }
}

impl RawImageVisitor for TeeImage<'_> {
    fn visit_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        for visitor in [&mut self.0 .0, &mut self.0 .1].into_iter().flatten() {
            visitor.visit_color_table(index, color)?;
        }
        Ok(())
    }

    fn visit_data_start(&mut self, min_code_size: u8) -> Result<()> {
        for visitor in [&mut self.0 .0, &mut self.0 .1].into_iter().flatten() {
            visitor.visit_data_start(min_code_size)?;
        }
        Ok(())
    }

    fn visit_data_block(&mut self, block: &[u8]) -> Result<()> {
        for visitor in [&mut self.0 .0, &mut self.0 .1].into_iter().flatten() {
            visitor.visit_data_block(block)?;
        }
        Ok(())
    }

    fn visit_end(&mut self) -> Result<()> {
        for visitor in [&mut self.0 .0, &mut self.0 .1].into_iter().flatten() {
            visitor.visit_end()?;
        }
        Ok(())
    }
}
