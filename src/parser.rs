use std::io;

use bitstream_io::{ByteRead, ByteReader, LittleEndian};
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

/// Single forward pass over a GIF stream, reporting every element to a [Visitor].
///
/// The parser never decompresses image data: sub-blocks are forwarded as they are stored. Wrap
/// the image visitor in an [ImageDecoder](crate::ImageDecoder) to get color indices.
///
/// Elements nobody listens to are still read, so the stream stays in sync.
pub struct Parser<R> {
    source: R,
    buffer: [u8; SUB_BLOCK_SIZE],
}

impl<R: io::Read> Parser<ByteReader<R, LittleEndian>> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(ByteReader::endian(reader, LittleEndian))
    }
}

impl<R: ByteRead> Parser<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            buffer: [0; SUB_BLOCK_SIZE],
        }
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Parses a whole stream, from the header to the trailer.
    ///
    /// # Errors
    ///
    /// Fails with [Error::Truncated] if the source ends before the trailer, with
    /// [Error::Malformed] on bytes that break the grammar, and with whatever error the visitor
    /// returns. Parsing stops at the first error.
    pub fn accept<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> Result<()> {
        let version = Version::decode(&mut self.source)?;
        debug!(?version, "header");
        visitor.visit_header(version)?;

        let screen = LogicalScreenDescriptor::decode(&mut self.source)?;
        debug!(
            width = screen.width,
            height = screen.height,
            global_color_table = screen.global_color_table,
            "logical screen"
        );
        visitor.visit_logical_screen_descriptor(&screen)?;
        if screen.global_color_table {
            for index in 0..screen.color_table_size() {
                let color = self.color()?;
                visitor.visit_global_color_table(index, color)?;
            }
        }

        loop {
            let tag: u8 = self.source.read()?;
            match tag {
                EXTENSION_INTRODUCER => self.extension(visitor)?,
                IMAGE_SEPARATOR => self.image(visitor)?,
                TRAILER => {
                    debug!("trailer");
                    return visitor.visit_end();
                }
                _ => return Err(Error::Malformed("unknown block")),
            }
        }
    }

    fn extension<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> Result<()> {
        let label: u8 = self.source.read()?;
        match label {
            GRAPHICS_CONTROL_LABEL => {
                let extension = GraphicsControlExtension::decode(&mut self.source)?;
                visitor.visit_graphics_control_extension(&extension)
            }
            APPLICATION_LABEL => {
                let descriptor = ApplicationDescriptor::decode(&mut self.source)?;
                debug!(
                    identifier = %String::from_utf8_lossy(&descriptor.identifier),
                    "application extension"
                );
                let blocks = visitor.visit_application(&descriptor)?;
                self.blocks(blocks)
            }
            COMMENT_LABEL => {
                let blocks = visitor.visit_comment()?;
                self.blocks(blocks)
            }
            PLAIN_TEXT_LABEL => {
                let header_size: u8 = self.source.read()?;
                let mut header = vec![0; header_size as usize];
                self.source.read_bytes(&mut header)?;
                let blocks = visitor.visit_plain_text(&header)?;
                self.blocks(blocks)
            }
            _ => {
                debug!(label, "skipping unknown extension");
                self.skip_sub_blocks()
            }
        }
    }

    fn image<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> Result<()> {
        let descriptor = ImageDescriptor::decode(&mut self.source)?;
        let mut image = visitor.visit_image(&descriptor)?;

        if descriptor.local_color_table {
            for index in 0..descriptor.color_table_size() {
                let color = self.color()?;
                if let Some(image) = image.as_mut() {
                    image.visit_color_table(index, color)?;
                }
            }
        }

        let min_code_size: u8 = self.source.read()?;
        debug!(
            left = descriptor.left,
            top = descriptor.top,
            width = descriptor.width,
            height = descriptor.height,
            min_code_size,
            "image"
        );

        let Some(mut image) = image else {
            return self.skip_sub_blocks();
        };
        image.visit_data_start(min_code_size)?;
        while let Some(block) = self.sub_block()? {
            image.visit_data_block(block)?;
        }
        image.visit_end()
    }

    /// Forwards the sub-blocks of an extension, or skips them.
    fn blocks(&mut self, visitor: Option<Box<dyn BlockVisitor + '_>>) -> Result<()> {
        let Some(mut visitor) = visitor else {
            return self.skip_sub_blocks();
        };
        while let Some(block) = self.sub_block()? {
            visitor.visit_block(block)?;
        }
        visitor.visit_end()
    }

    /// Reads the next sub-block, `None` at the terminator.
    fn sub_block(&mut self) -> Result<Option<&[u8]>> {
        let size: u8 = self.source.read()?;
        if size == 0 {
            return Ok(None);
        }
        trace!(size, "sub-block");

        let size = size as usize;
        self.source.read_bytes(&mut self.buffer[..size])?;
        Ok(Some(&self.buffer[..size]))
    }

    fn skip_sub_blocks(&mut self) -> Result<()> {
        loop {
            let size: u8 = self.source.read()?;
            if size == 0 {
                return Ok(());
            }
            self.source.skip(u32::from(size))?;
        }
    }

    fn color(&mut self) -> Result<[u8; 3]> {
        let mut color = [0; 3];
        self.source.read_bytes(&mut color)?;
        Ok(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DisposalMethod;

    /// Writes every event down, and listens to every sub-element.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip_images: bool,
    }

    struct Blocks<'a>(&'a mut Vec<String>);

    impl BlockVisitor for Blocks<'_> {
        fn visit_block(&mut self, block: &[u8]) -> Result<()> {
            self.0.push(format!("block {block:?}"));
            Ok(())
        }

        fn visit_end(&mut self) -> Result<()> {
            self.0.push("blocks end".to_string());
            Ok(())
        }
    }

    impl RawImageVisitor for Blocks<'_> {
        fn visit_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
            self.0.push(format!("local color {index} {color:?}"));
            Ok(())
        }

        fn visit_data_start(&mut self, min_code_size: u8) -> Result<()> {
            self.0.push(format!("data start {min_code_size}"));
            Ok(())
        }

        fn visit_data_block(&mut self, block: &[u8]) -> Result<()> {
            self.0.push(format!("data {block:?}"));
            Ok(())
        }

        fn visit_end(&mut self) -> Result<()> {
            self.0.push("image end".to_string());
            Ok(())
        }
    }

    impl Visitor for Recorder {
        fn visit_header(&mut self, version: Version) -> Result<()> {
            self.events.push(format!("{version:?}"));
            Ok(())
        }

        fn visit_logical_screen_descriptor(
            &mut self,
            descriptor: &LogicalScreenDescriptor,
        ) -> Result<()> {
            self.events
                .push(format!("screen {}x{}", descriptor.width, descriptor.height));
            Ok(())
        }

        fn visit_global_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
            self.events.push(format!("global color {index} {color:?}"));
            Ok(())
        }

        fn visit_graphics_control_extension(
            &mut self,
            extension: &GraphicsControlExtension,
        ) -> Result<()> {
            self.events.push(format!(
                "graphics control {:?} {}",
                extension.disposal(),
                extension.delay
            ));
            Ok(())
        }

        fn visit_application(
            &mut self,
            descriptor: &ApplicationDescriptor,
        ) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
            self.events.push(format!(
                "application {}",
                String::from_utf8_lossy(&descriptor.identifier)
            ));
            Ok(Some(Box::new(Blocks(&mut self.events))))
        }

        fn visit_comment(&mut self) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
            self.events.push("comment".to_string());
            Ok(Some(Box::new(Blocks(&mut self.events))))
        }

        fn visit_plain_text(
            &mut self,
            header: &[u8],
        ) -> Result<Option<Box<dyn BlockVisitor + '_>>> {
            self.events.push(format!("plain text {}", header.len()));
            Ok(Some(Box::new(Blocks(&mut self.events))))
        }

        fn visit_image(
            &mut self,
            descriptor: &ImageDescriptor,
        ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
            self.events
                .push(format!("image {}x{}", descriptor.width, descriptor.height));
            if self.skip_images {
                return Ok(None);
            }
            Ok(Some(Box::new(Blocks(&mut self.events))))
        }

        fn visit_end(&mut self) -> Result<()> {
            self.events.push("end".to_string());
            Ok(())
        }
    }

    /// A visitor listening to nothing.
    struct Deaf;

    impl Visitor for Deaf {}

    const HEADER: &[u8] = b"GIF89a\x02\x00\x01\x00\x00\x00\x00";

    fn stream(blocks: &[&[u8]]) -> Vec<u8> {
        let mut stream = HEADER.to_vec();
        for block in blocks {
            stream.extend_from_slice(block);
        }
        stream
    }

    fn record(stream: &[u8]) -> Result<Vec<String>> {
        let mut recorder = Recorder::default();
        Parser::from_reader(stream).accept(&mut recorder)?;
        Ok(recorder.events)
    }

    #[test]
    fn empty_stream() -> Result<()> {
        let events = record(&stream(&[b"\x3b"]))?;

        assert_eq!(events, ["Gif89a", "screen 2x1", "end"]);
        Ok(())
    }

    #[test]
    fn global_color_table() -> Result<()> {
        let stream = b"GIF87a\x01\x00\x01\x00\x80\x00\x00\x01\x02\x03\x04\x05\x06\x3b";

        let events = record(stream)?;

        assert_eq!(
            events,
            [
                "Gif87a",
                "screen 1x1",
                "global color 0 [1, 2, 3]",
                "global color 1 [4, 5, 6]",
                "end"
            ]
        );
        Ok(())
    }

    #[test]
    fn image_with_local_color_table() -> Result<()> {
        let stream = stream(&[
            b"\x2c\x00\x00\x00\x00\x02\x00\x01\x00\x80",
            b"\x00\x00\x00\xff\xff\xff",
            b"\x02\x02\x4c\x01\x00",
            b"\x3b",
        ]);

        let events = record(&stream)?;

        assert_eq!(
            events[2..],
            [
                "image 2x1",
                "local color 0 [0, 0, 0]",
                "local color 1 [255, 255, 255]",
                "data start 2",
                "data [76, 1]",
                "image end",
                "end"
            ]
        );
        Ok(())
    }

    #[test]
    fn skipped_image_is_consumed() -> Result<()> {
        let stream = stream(&[
            b"\x2c\x00\x00\x00\x00\x02\x00\x01\x00\x80",
            b"\x00\x00\x00\xff\xff\xff",
            b"\x02\x02\x4c\x01\x00",
            b"\x21\xfe\x02hi\x00",
            b"\x3b",
        ]);
        let mut recorder = Recorder {
            skip_images: true,
            ..Default::default()
        };

        Parser::from_reader(&stream[..]).accept(&mut recorder)?;

        assert_eq!(
            recorder.events[2..],
            ["image 2x1", "comment", "block [104, 105]", "blocks end", "end"]
        );
        Ok(())
    }

    #[test]
    fn extensions() -> Result<()> {
        let stream = stream(&[
            b"\x21\xf9\x04\x08\x0a\x00\x00\x00",
            b"\x21\xff\x0bNETSCAPE2.0\x03\x01\x00\x00\x00",
            b"\x21\x01\x0c\x00\x00\x00\x00\x10\x00\x10\x00\x08\x08\x00\x00\x03abc\x00",
            b"\x3b",
        ]);

        let events = record(&stream)?;

        assert_eq!(
            events[2..],
            [
                format!("graphics control {:?} 10", Some(DisposalMethod::Background)),
                "application NETSCAPE".to_string(),
                "block [1, 0, 0]".to_string(),
                "blocks end".to_string(),
                "plain text 12".to_string(),
                "block [97, 98, 99]".to_string(),
                "blocks end".to_string(),
                "end".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn nothing_listened_to_is_still_consumed() -> Result<()> {
        let stream = stream(&[
            b"\x21\xf9\x04\x00\x00\x00\x00\x00",
            b"\x21\xff\x0bNETSCAPE2.0\x03\x01\x00\x00\x00",
            b"\x21\x01\x0c\x00\x00\x00\x00\x10\x00\x10\x00\x08\x08\x00\x00\x03abc\x00",
            b"\x21\xfe\x02hi\x00",
            b"\x2c\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x4c\x01\x00",
            b"\x3b",
        ]);

        let mut parser = Parser::from_reader(&stream[..]);
        parser.accept(&mut Deaf)?;

        assert!(parser.into_inner().into_reader().is_empty());
        Ok(())
    }

    #[test]
    fn unknown_extension_is_skipped() -> Result<()> {
        let stream = stream(&[b"\x21\x42\x02ab\x01c\x00", b"\x3b"]);

        let events = record(&stream)?;

        assert_eq!(events, ["Gif89a", "screen 2x1", "end"]);
        Ok(())
    }

    #[test]
    fn unknown_block() {
        let stream = stream(&[b"\x42", b"\x3b"]);

        assert!(matches!(record(&stream), Err(Error::Malformed("unknown block"))));
    }

    #[test]
    fn not_a_gif() {
        assert!(matches!(record(b"PNG89a"), Err(Error::Malformed(_))));
    }

    #[test]
    fn truncated_in_sub_block() {
        let stream = stream(&[b"\x21\xfe\x05hi"]);

        assert!(matches!(record(&stream), Err(Error::Truncated)));
    }

    #[test]
    fn missing_trailer() {
        let stream = stream(&[b"\x21\xfe\x02hi\x00"]);

        assert!(matches!(record(&stream), Err(Error::Truncated)));
    }

    #[test]
    fn visitor_error_stops_parsing() {
        struct Refuse;

        impl Visitor for Refuse {
            fn visit_logical_screen_descriptor(
                &mut self,
                _descriptor: &LogicalScreenDescriptor,
            ) -> Result<()> {
                Err(Error::Malformed("refused"))
            }
        }

        let result = Parser::from_reader(&stream(&[b"\x3b"])[..]).accept(&mut Refuse);

        assert!(matches!(result, Err(Error::Malformed("refused"))));
    }
}
