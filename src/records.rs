//! Fixed layout records of a GIF stream.
//!
//! Every record decodes from a [ByteRead] and encodes back to a [ByteWrite] bit for bit: flags,
//! reserved bits and sort flags included, so that any descriptor survives a round trip.

use std::io;

use bitstream_io::{ByteRead, ByteWrite};

use crate::{Error, Result};

pub(crate) const EXTENSION_INTRODUCER: u8 = 0x21;
pub(crate) const IMAGE_SEPARATOR: u8 = 0x2C;
pub(crate) const TRAILER: u8 = 0x3B;

pub(crate) const PLAIN_TEXT_LABEL: u8 = 0x01;
pub(crate) const GRAPHICS_CONTROL_LABEL: u8 = 0xF9;
pub(crate) const COMMENT_LABEL: u8 = 0xFE;
pub(crate) const APPLICATION_LABEL: u8 = 0xFF;

/// Reads a 16 bits field, stored low byte first.
pub(crate) fn read_u16<R: ByteRead>(source: &mut R) -> io::Result<u16> {
    let low: u8 = source.read()?;
    let high: u8 = source.read()?;
    Ok(u16::from(low) | u16::from(high) << 8)
}

pub(crate) fn write_u16<W: ByteWrite>(sink: &mut W, value: u16) -> io::Result<()> {
    sink.write_bytes(&value.to_le_bytes())
}

#[inline]
fn flag(packed: u8, bit: u8) -> bool {
    packed & (1 << bit) != 0
}

/// Number of entries of a color table, from the size stored in a packed field.
#[inline]
pub fn color_table_size(size_bits: u8) -> usize {
    1 << (1 + (size_bits & 0b111))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Gif87a,
    Gif89a,
}

impl Version {
    pub fn tag(self) -> &'static [u8; 6] {
        match self {
            Version::Gif87a => b"GIF87a",
            Version::Gif89a => b"GIF89a",
        }
    }

    pub fn decode<R: ByteRead>(source: &mut R) -> Result<Self> {
        let mut tag = [0; 6];
        source.read_bytes(&mut tag)?;
        match &tag {
            b"GIF87a" => Ok(Version::Gif87a),
            b"GIF89a" => Ok(Version::Gif89a),
            _ => Err(Error::Malformed("not a GIF header")),
        }
    }

    pub fn encode<W: ByteWrite>(self, sink: &mut W) -> io::Result<()> {
        sink.write_bytes(self.tag())
    }
}

/// Size of the canvas and presence of the global color table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub global_color_table: bool,
    /// Bits per primary color available to the original image, minus one.
    pub color_resolution: u8,
    /// The global color table is sorted by decreasing importance.
    pub sorted: bool,
    /// The global color table holds `2^(1 + color_table_size_bits)` entries.
    pub color_table_size_bits: u8,
    pub background_color_index: u8,
    pub pixel_aspect_ratio: u8,
}

impl LogicalScreenDescriptor {
    pub fn color_table_size(&self) -> usize {
        color_table_size(self.color_table_size_bits)
    }

    pub fn decode<R: ByteRead>(source: &mut R) -> Result<Self> {
        let width = read_u16(source)?;
        let height = read_u16(source)?;
        let packed: u8 = source.read()?;
        Ok(Self {
            width,
            height,
            global_color_table: flag(packed, 7),
            color_resolution: (packed >> 4) & 0b111,
            sorted: flag(packed, 3),
            color_table_size_bits: packed & 0b111,
            background_color_index: source.read()?,
            pixel_aspect_ratio: source.read()?,
        })
    }

    pub fn encode<W: ByteWrite>(&self, sink: &mut W) -> io::Result<()> {
        let packed = u8::from(self.global_color_table) << 7
            | (self.color_resolution & 0b111) << 4
            | u8::from(self.sorted) << 3
            | self.color_table_size_bits & 0b111;

        write_u16(sink, self.width)?;
        write_u16(sink, self.height)?;
        sink.write(packed)?;
        sink.write(self.background_color_index)?;
        sink.write(self.pixel_aspect_ratio)
    }
}

/// Position and size of an image on the canvas, and presence of its local color table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub local_color_table: bool,
    pub interlaced: bool,
    pub sorted: bool,
    /// Bits 3 and 4 of the packed field.
    pub reserved: u8,
    pub color_table_size_bits: u8,
}

impl ImageDescriptor {
    pub fn color_table_size(&self) -> usize {
        color_table_size(self.color_table_size_bits)
    }

    pub fn decode<R: ByteRead>(source: &mut R) -> Result<Self> {
        let left = read_u16(source)?;
        let top = read_u16(source)?;
        let width = read_u16(source)?;
        let height = read_u16(source)?;
        let packed: u8 = source.read()?;
        Ok(Self {
            left,
            top,
            width,
            height,
            local_color_table: flag(packed, 7),
            interlaced: flag(packed, 6),
            sorted: flag(packed, 5),
            reserved: (packed >> 3) & 0b11,
            color_table_size_bits: packed & 0b111,
        })
    }

    pub fn encode<W: ByteWrite>(&self, sink: &mut W) -> io::Result<()> {
        let packed = u8::from(self.local_color_table) << 7
            | u8::from(self.interlaced) << 6
            | u8::from(self.sorted) << 5
            | (self.reserved & 0b11) << 3
            | self.color_table_size_bits & 0b111;

        write_u16(sink, self.left)?;
        write_u16(sink, self.top)?;
        write_u16(sink, self.width)?;
        write_u16(sink, self.height)?;
        sink.write(packed)
    }
}

/// What happens to an image once its delay is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisposalMethod {
    /// No disposal specified, the decoder is not required to take any action.
    Unspecified = 0,
    /// Leave the image in place.
    Keep = 1,
    /// Restore to the background color.
    Background = 2,
    /// Restore to what was there before the image.
    Previous = 3,
}

impl DisposalMethod {
    pub fn from_u8(n: u8) -> Option<DisposalMethod> {
        match n {
            0 => Some(DisposalMethod::Unspecified),
            1 => Some(DisposalMethod::Keep),
            2 => Some(DisposalMethod::Background),
            3 => Some(DisposalMethod::Previous),
            _ => None,
        }
    }
}

/// Rendering parameters of the next image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphicsControlExtension {
    /// Bits 5 to 7 of the packed field.
    pub reserved: u8,
    /// Raw 3 bits field, see [GraphicsControlExtension::disposal].
    pub disposal_method: u8,
    pub user_input: bool,
    pub transparency: bool,
    /// In hundredths of a second.
    pub delay: u16,
    pub transparency_index: u8,
}

impl GraphicsControlExtension {
    const BLOCK_SIZE: u8 = 4;

    /// The disposal method, `None` for values the format leaves undefined.
    pub fn disposal(&self) -> Option<DisposalMethod> {
        DisposalMethod::from_u8(self.disposal_method)
    }

    /// Decodes the body following the extension label, block terminator included.
    pub fn decode<R: ByteRead>(source: &mut R) -> Result<Self> {
        let block_size: u8 = source.read()?;
        if block_size != Self::BLOCK_SIZE {
            return Err(Error::Malformed("graphics control extension size"));
        }
        let packed: u8 = source.read()?;
        let delay = read_u16(source)?;
        let transparency_index: u8 = source.read()?;
        let terminator: u8 = source.read()?;
        if terminator != 0 {
            return Err(Error::Malformed("graphics control extension terminator"));
        }

        Ok(Self {
            reserved: packed >> 5,
            disposal_method: (packed >> 2) & 0b111,
            user_input: flag(packed, 1),
            transparency: flag(packed, 0),
            delay,
            transparency_index,
        })
    }

    pub fn encode<W: ByteWrite>(&self, sink: &mut W) -> io::Result<()> {
        let packed = (self.reserved & 0b111) << 5
            | (self.disposal_method & 0b111) << 2
            | u8::from(self.user_input) << 1
            | u8::from(self.transparency);

        sink.write(Self::BLOCK_SIZE)?;
        sink.write(packed)?;
        write_u16(sink, self.delay)?;
        sink.write(self.transparency_index)?;
        sink.write(0u8)
    }
}

/// Identifies the application an application extension is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApplicationDescriptor {
    pub identifier: [u8; 8],
    pub authentication_code: [u8; 3],
}

impl ApplicationDescriptor {
    const BLOCK_SIZE: u8 = 11;

    pub const fn new(identifier: [u8; 8], authentication_code: [u8; 3]) -> Self {
        Self {
            identifier,
            authentication_code,
        }
    }

    pub fn decode<R: ByteRead>(source: &mut R) -> Result<Self> {
        let block_size: u8 = source.read()?;
        if block_size != Self::BLOCK_SIZE {
            return Err(Error::Malformed("application extension size"));
        }
        let mut descriptor = Self::new([0; 8], [0; 3]);
        source.read_bytes(&mut descriptor.identifier)?;
        source.read_bytes(&mut descriptor.authentication_code)?;
        Ok(descriptor)
    }

    pub fn encode<W: ByteWrite>(&self, sink: &mut W) -> io::Result<()> {
        sink.write(Self::BLOCK_SIZE)?;
        sink.write_bytes(&self.identifier)?;
        sink.write_bytes(&self.authentication_code)
    }
}
