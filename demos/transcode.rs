//! Decodes every image of a GIF file and compresses it again.
//!
//! ```text
//! RUST_LOG=debug cargo run --example transcode -- input.gif output.gif
//! ```

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use bitstream_io::{ByteWrite, ByteWriter, LittleEndian};
use gifstream::{
    lzw,
    records::{
        ApplicationDescriptor, GraphicsControlExtension, ImageDescriptor,
        LogicalScreenDescriptor, Version,
    },
    Applications, BlockVisitor, Encoder, ImageDecoder, ImageEncoder, NetscapeLoop, Parser,
    RawImageVisitor, Tee, Visitor, NETSCAPE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Listens to nothing.
struct Ignore;

impl Visitor for Ignore {}

struct Transcoder<W> {
    encoder: Encoder<W>,
    screen: LogicalScreenDescriptor,
    decoder: lzw::Decoder,
    lzw: lzw::Encoder,
    images: usize,
}

impl<W: ByteWrite> Transcoder<W> {
    fn new(encoder: Encoder<W>) -> Self {
        Self {
            encoder,
            screen: LogicalScreenDescriptor::default(),
            decoder: lzw::Decoder::new(),
            lzw: lzw::Encoder::new(),
            images: 0,
        }
    }
}

impl<W: ByteWrite> Visitor for Transcoder<W> {
    fn visit_header(&mut self, version: Version) -> gifstream::Result<()> {
        self.encoder.visit_header(version)
    }

    fn visit_logical_screen_descriptor(
        &mut self,
        descriptor: &LogicalScreenDescriptor,
    ) -> gifstream::Result<()> {
        self.screen = *descriptor;
        self.encoder.visit_logical_screen_descriptor(descriptor)
    }

    fn visit_global_color_table(&mut self, index: usize, color: [u8; 3]) -> gifstream::Result<()> {
        self.encoder.visit_global_color_table(index, color)
    }

    fn visit_graphics_control_extension(
        &mut self,
        extension: &GraphicsControlExtension,
    ) -> gifstream::Result<()> {
        self.encoder.visit_graphics_control_extension(extension)
    }

    fn visit_application(
        &mut self,
        descriptor: &ApplicationDescriptor,
    ) -> gifstream::Result<Option<Box<dyn BlockVisitor + '_>>> {
        self.encoder.visit_application(descriptor)
    }

    fn visit_comment(&mut self) -> gifstream::Result<Option<Box<dyn BlockVisitor + '_>>> {
        self.encoder.visit_comment()
    }

    fn visit_plain_text(
        &mut self,
        header: &[u8],
    ) -> gifstream::Result<Option<Box<dyn BlockVisitor + '_>>> {
        self.encoder.visit_plain_text(header)
    }

    fn visit_image(
        &mut self,
        descriptor: &ImageDescriptor,
    ) -> gifstream::Result<Option<Box<dyn RawImageVisitor + '_>>> {
        self.images += 1;
        let Some(raw) = self.encoder.visit_image(descriptor)? else {
            return Ok(None);
        };
        let image = ImageEncoder::for_image(&mut self.lzw, &self.screen, descriptor, raw);
        Ok(Some(Box::new(ImageDecoder::new(&mut self.decoder, image))))
    }

    fn visit_end(&mut self) -> gifstream::Result<()> {
        self.encoder.visit_end()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        bail!("usage: transcode <input.gif> <output.gif>");
    };

    let reader = BufReader::new(
        File::open(&input).with_context(|| format!("opening {}", input.display()))?,
    );
    let writer = BufWriter::new(
        File::create(&output).with_context(|| format!("creating {}", output.display()))?,
    );

    let mut netscape = NetscapeLoop::default();
    let mut applications = Applications::new(Ignore);
    applications.register(NETSCAPE, &mut netscape);
    let mut transcoder = Transcoder::new(Encoder::new(ByteWriter::endian(writer, LittleEndian)));

    Parser::from_reader(reader)
        .accept(&mut Tee(&mut transcoder, &mut applications))
        .with_context(|| format!("transcoding {}", input.display()))?;
    drop(applications);

    let images = transcoder.images;
    transcoder.encoder.into_inner().into_writer().flush()?;

    info!(
        images,
        loop_count = ?netscape.loop_count(),
        output = %output.display(),
        "done"
    );
    Ok(())
}
