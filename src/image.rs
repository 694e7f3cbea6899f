//! Adapters between compressed image data and color indices.
//!
//! Both adapters take their LZW codec as anything that borrows one mutably, so a codec can be
//! owned by a single image or lent by a caller who reuses it across images.

use std::borrow::BorrowMut;

use tracing::{debug, trace};

use crate::{
    lzw,
    records::{ImageDescriptor, LogicalScreenDescriptor},
    visitor::{ImageVisitor, RawImageVisitor},
    Result,
};

/// Minimum code size for a color table of `2^(1 + color_table_size_bits)` entries.
pub fn min_code_size(color_table_size_bits: u8) -> u8 {
    (1 + (color_table_size_bits & 0b111)).max(2)
}

/// Decompresses the data sub-blocks of an image, and passes color indices on to an
/// [ImageVisitor].
///
/// Sub-blocks following the end code are ignored.
pub struct ImageDecoder<D, V> {
    decoder: D,
    visitor: V,
    indices: Vec<u8>,
}

impl<D: BorrowMut<lzw::Decoder>, V: ImageVisitor> ImageDecoder<D, V> {
    pub fn new(decoder: D, visitor: V) -> Self {
        Self {
            decoder,
            visitor,
            indices: Vec::new(),
        }
    }

    pub fn into_inner(self) -> V {
        self.visitor
    }
}

impl<D: BorrowMut<lzw::Decoder>, V: ImageVisitor> RawImageVisitor for ImageDecoder<D, V> {
    fn visit_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        self.visitor.visit_color_table(index, color)
    }

    fn visit_data_start(&mut self, min_code_size: u8) -> Result<()> {
        let decoder: &mut lzw::Decoder = self.decoder.borrow_mut();
        decoder.initialize(min_code_size)?;
        self.visitor.visit_data_start()
    }

    fn visit_data_block(&mut self, block: &[u8]) -> Result<()> {
        let decoder: &mut lzw::Decoder = self.decoder.borrow_mut();
        if decoder.has_ended() {
            trace!(size = block.len(), "sub-block after end code");
            return Ok(());
        }

        self.indices.clear();
        decoder.decode_into(block, &mut self.indices)?;
        if self.indices.is_empty() {
            return Ok(());
        }
        self.visitor.visit_data(&self.indices)
    }

    fn visit_end(&mut self) -> Result<()> {
        let decoder: &mut lzw::Decoder = self.decoder.borrow_mut();
        if !decoder.has_ended() {
            debug!("image data without end code");
        }
        self.visitor.visit_data_end()
    }
}

/// Compresses color indices, and passes the data sub-blocks on to a [RawImageVisitor].
pub struct ImageEncoder<E, V> {
    encoder: E,
    visitor: V,
    min_code_size: u8,
}

impl<E: BorrowMut<lzw::Encoder>, V: RawImageVisitor> ImageEncoder<E, V> {
    /// An encoder for indices below `2^min_code_size`.
    pub fn new(encoder: E, min_code_size: u8, visitor: V) -> Self {
        Self {
            encoder,
            visitor,
            min_code_size,
        }
    }

    /// An encoder sized for the color table that applies to `image`: its local table if it has
    /// one, the global table otherwise.
    pub fn for_image(
        encoder: E,
        screen: &LogicalScreenDescriptor,
        image: &ImageDescriptor,
        visitor: V,
    ) -> Self {
        let color_table_size_bits = if image.local_color_table {
            image.color_table_size_bits
        } else {
            screen.color_table_size_bits
        };
        Self::new(encoder, min_code_size(color_table_size_bits), visitor)
    }

    pub fn min_code_size(&self) -> u8 {
        self.min_code_size
    }

    pub fn into_inner(self) -> V {
        self.visitor
    }
}

impl<E: BorrowMut<lzw::Encoder>, V: RawImageVisitor> ImageVisitor for ImageEncoder<E, V> {
    fn visit_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        self.visitor.visit_color_table(index, color)
    }

    fn visit_data_start(&mut self) -> Result<()> {
        let encoder: &mut lzw::Encoder = self.encoder.borrow_mut();
        encoder.initialize(self.min_code_size)?;
        self.visitor.visit_data_start(self.min_code_size)
    }

    fn visit_data(&mut self, indices: &[u8]) -> Result<()> {
        let encoder: &mut lzw::Encoder = self.encoder.borrow_mut();
        encoder.accept(indices)?;
        while let Some(block) = encoder.encode(false)? {
            self.visitor.visit_data_block(&block)?;
        }
        Ok(())
    }

    fn visit_data_end(&mut self) -> Result<()> {
        let encoder: &mut lzw::Encoder = self.encoder.borrow_mut();
        while let Some(block) = encoder.encode(true)? {
            self.visitor.visit_data_block(&block)?;
        }
        self.visitor.visit_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lzw::{DecodingError, EncodingError},
        Error,
    };

    const COMPRESSED: [u8; 22] = [
        0x8c, 0x2d, 0x99, 0x87, 0x2a, 0x1c, 0xdc, 0x33, 0xa0, 0x02, 0x75, 0xec, 0x95, 0xfa, 0xa8,
        0xde, 0x60, 0x8c, 0x04, 0x91, 0x4c, 0x01,
    ];

    const INDICES: [u8; 100] = [
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
        1, 1, 1, 0, 0, 0, 0, 2, 2, 2, //
        1, 1, 1, 0, 0, 0, 0, 2, 2, 2, //
        2, 2, 2, 0, 0, 0, 0, 1, 1, 1, //
        2, 2, 2, 0, 0, 0, 0, 1, 1, 1, //
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
    ];

    #[derive(Default)]
    struct Indices {
        colors: Vec<[u8; 3]>,
        data: Vec<u8>,
        calls: usize,
        ended: bool,
    }

    impl ImageVisitor for Indices {
        fn visit_color_table(&mut self, _index: usize, color: [u8; 3]) -> Result<()> {
            self.colors.push(color);
            Ok(())
        }

        fn visit_data(&mut self, indices: &[u8]) -> Result<()> {
            self.data.extend_from_slice(indices);
            self.calls += 1;
            Ok(())
        }

        fn visit_data_end(&mut self) -> Result<()> {
            self.ended = true;
            Ok(())
        }
    }

    #[derive(Default)]
    struct SubBlocks {
        min_code_size: Option<u8>,
        blocks: Vec<Vec<u8>>,
        ended: bool,
    }

    impl RawImageVisitor for SubBlocks {
        fn visit_data_start(&mut self, min_code_size: u8) -> Result<()> {
            self.min_code_size = Some(min_code_size);
            Ok(())
        }

        fn visit_data_block(&mut self, block: &[u8]) -> Result<()> {
            self.blocks.push(block.to_vec());
            Ok(())
        }

        fn visit_end(&mut self) -> Result<()> {
            self.ended = true;
            Ok(())
        }
    }

    fn decode(blocks: &[&[u8]], decoder: &mut lzw::Decoder) -> Result<Indices> {
        let mut indices = Indices::default();
        let mut image = ImageDecoder::new(decoder, &mut indices);

        image.visit_color_table(0, [1, 2, 3])?;
        image.visit_data_start(2)?;
        for block in blocks {
            image.visit_data_block(block)?;
        }
        image.visit_end()?;
        drop(image);
        Ok(indices)
    }

    #[test]
    fn decode_fixture() -> Result<()> {
        let indices = decode(&[&COMPRESSED], &mut lzw::Decoder::new())?;

        assert_eq!(indices.colors, [[1, 2, 3]]);
        assert_eq!(indices.data, INDICES);
        assert!(indices.ended);
        Ok(())
    }

    #[test]
    fn decode_byte_per_sub_block() -> Result<()> {
        let blocks: Vec<&[u8]> = COMPRESSED.chunks(1).collect();

        let indices = decode(&blocks, &mut lzw::Decoder::new())?;

        assert_eq!(indices.data, INDICES);
        Ok(())
    }

    #[test]
    fn sub_blocks_after_end_code_are_ignored() -> Result<()> {
        let indices = decode(&[&COMPRESSED, &[0xff, 0xff]], &mut lzw::Decoder::new())?;

        assert_eq!(indices.data, INDICES);
        assert_eq!(indices.calls, 1);
        Ok(())
    }

    #[test]
    fn decoder_is_reused_across_images() -> Result<()> {
        let mut decoder = lzw::Decoder::new();

        let first = decode(&[&COMPRESSED], &mut decoder)?;
        let second = decode(&[&COMPRESSED[..10], &COMPRESSED[10..]], &mut decoder)?;

        assert_eq!(first.data, second.data);
        Ok(())
    }

    #[test]
    fn invalid_min_code_size() {
        let mut image = ImageDecoder::new(lzw::Decoder::new(), Indices::default());

        assert!(matches!(
            image.visit_data_start(12),
            Err(Error::Decoding(DecodingError::CodeSize(12)))
        ));
    }

    #[test]
    fn encode_fixture() -> Result<()> {
        let mut sub_blocks = SubBlocks::default();
        let mut image = ImageEncoder::new(lzw::Encoder::new(), 2, &mut sub_blocks);

        image.visit_data_start()?;
        for row in INDICES.chunks(10) {
            image.visit_data(row)?;
        }
        image.visit_data_end()?;
        drop(image);

        assert_eq!(sub_blocks.min_code_size, Some(2));
        assert_eq!(sub_blocks.blocks, [COMPRESSED.to_vec()]);
        assert!(sub_blocks.ended);
        Ok(())
    }

    #[test]
    fn encode_then_decode_large_image() -> Result<()> {
        let data: Vec<u8> = (0..64 * 1024).map(|i| ((i / 7) % 256) as u8).collect();
        let mut sub_blocks = SubBlocks::default();
        let mut image = ImageEncoder::new(lzw::Encoder::new(), 8, &mut sub_blocks);

        image.visit_data_start()?;
        for chunk in data.chunks(1000) {
            image.visit_data(chunk)?;
        }
        image.visit_data_end()?;
        drop(image);

        assert!(sub_blocks.blocks.len() > 1);
        assert!(sub_blocks.blocks.iter().all(|block| block.len() <= 255));

        let mut indices = Indices::default();
        let mut image = ImageDecoder::new(lzw::Decoder::new(), &mut indices);
        image.visit_data_start(8)?;
        for block in &sub_blocks.blocks {
            image.visit_data_block(block)?;
        }
        image.visit_end()?;
        drop(image);

        assert_eq!(indices.data, data);
        Ok(())
    }

    #[test]
    fn index_outside_color_table() -> Result<()> {
        let mut image = ImageEncoder::new(lzw::Encoder::new(), 2, SubBlocks::default());

        image.visit_data_start()?;

        assert!(matches!(
            image.visit_data(&[0, 4]),
            Err(Error::Encoding(EncodingError::UnexpectedCode { code: 4, .. }))
        ));
        Ok(())
    }

    #[test]
    fn min_code_size_from_color_table() {
        let screen = LogicalScreenDescriptor {
            global_color_table: true,
            color_table_size_bits: 7,
            ..Default::default()
        };
        let local = ImageDescriptor {
            local_color_table: true,
            color_table_size_bits: 0,
            ..Default::default()
        };
        let global = ImageDescriptor::default();

        let image = |descriptor: &ImageDescriptor| {
            ImageEncoder::for_image(lzw::Encoder::new(), &screen, descriptor, SubBlocks::default())
        };

        assert_eq!(image(&local).min_code_size(), 2);
        assert_eq!(image(&global).min_code_size(), 8);

        assert_eq!(min_code_size(2), 3);
    }
}
