use bitstream_io::{ByteWriter, LittleEndian};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gifstream::{
    lzw,
    records::{ImageDescriptor, LogicalScreenDescriptor, Version},
    Encoder, ImageDecoder, ImageEncoder, ImageVisitor, Parser, RawImageVisitor, Result, Visitor,
};
use rand::{prelude::StdRng, Rng, SeedableRng};

const SIZE: u16 = 512;
const FRAMES: usize = 4;

/// A few frames of noisy horizontal runs over a 256 color palette.
fn prepare_animation() -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    let screen = LogicalScreenDescriptor {
        width: SIZE,
        height: SIZE,
        global_color_table: true,
        color_resolution: 7,
        color_table_size_bits: 7,
        ..Default::default()
    };
    let descriptor = ImageDescriptor {
        width: SIZE,
        height: SIZE,
        ..Default::default()
    };

    let mut encoder = Encoder::from_writer(Vec::new());
    let mut lzw = lzw::Encoder::new();
    encoder.visit_header(Version::Gif89a).unwrap();
    encoder.visit_logical_screen_descriptor(&screen).unwrap();
    for index in 0..screen.color_table_size() {
        let level = index as u8;
        encoder
            .visit_global_color_table(index, [level, level / 2, 255 - level])
            .unwrap();
    }

    let mut row = vec![0; SIZE as usize];
    for _ in 0..FRAMES {
        let raw = encoder.visit_image(&descriptor).unwrap().unwrap();
        let mut image = ImageEncoder::for_image(&mut lzw, &screen, &descriptor, raw);
        image.visit_data_start().unwrap();
        for _ in 0..SIZE {
            let mut color: u8 = rng.gen();
            for pixel in row.iter_mut() {
                if rng.gen_ratio(1, 12) {
                    color = rng.gen();
                }
                *pixel = color;
            }
            image.visit_data(&row).unwrap();
        }
        image.visit_data_end().unwrap();
    }
    encoder.visit_end().unwrap();
    encoder.into_inner().into_writer()
}

struct Discard;

impl ImageVisitor for Discard {
    fn visit_data(&mut self, indices: &[u8]) -> Result<()> {
        black_box(indices);
        Ok(())
    }
}

struct Decode {
    decoder: lzw::Decoder,
}

impl Visitor for Decode {
    fn visit_image(
        &mut self,
        _descriptor: &ImageDescriptor,
    ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
        Ok(Some(Box::new(ImageDecoder::new(&mut self.decoder, Discard))))
    }
}

struct Transcode {
    encoder: Encoder<ByteWriter<Vec<u8>, LittleEndian>>,
    screen: LogicalScreenDescriptor,
    decoder: lzw::Decoder,
    lzw: lzw::Encoder,
}

impl Visitor for Transcode {
    fn visit_header(&mut self, version: Version) -> Result<()> {
        self.encoder.visit_header(version)
    }

    fn visit_logical_screen_descriptor(
        &mut self,
        descriptor: &LogicalScreenDescriptor,
    ) -> Result<()> {
        self.screen = *descriptor;
        self.encoder.visit_logical_screen_descriptor(descriptor)
    }

    fn visit_global_color_table(&mut self, index: usize, color: [u8; 3]) -> Result<()> {
        self.encoder.visit_global_color_table(index, color)
    }

    fn visit_image(
        &mut self,
        descriptor: &ImageDescriptor,
    ) -> Result<Option<Box<dyn RawImageVisitor + '_>>> {
        let Some(raw) = self.encoder.visit_image(descriptor)? else {
            return Ok(None);
        };
        let image = ImageEncoder::for_image(&mut self.lzw, &self.screen, descriptor, raw);
        Ok(Some(Box::new(ImageDecoder::new(&mut self.decoder, image))))
    }

    fn visit_end(&mut self) -> Result<()> {
        self.encoder.visit_end()
    }
}

fn bench_animation(c: &mut Criterion) {
    let gif = prepare_animation();

    let mut group = c.benchmark_group("Animation");
    group.throughput(Throughput::Bytes(gif.len() as u64));

    group.bench_with_input(BenchmarkId::new("Structure", "Copy"), &gif, |b, gif| {
        b.iter(|| {
            let mut encoder = Encoder::from_writer(Vec::with_capacity(gif.len()));
            Parser::from_reader(&gif[..]).accept(&mut encoder).unwrap();
            black_box(encoder.into_inner().into_writer())
        })
    });

    let mut decode = Decode {
        decoder: lzw::Decoder::new(),
    };
    group.bench_with_input(BenchmarkId::new("Images", "Decode"), &gif, |b, gif| {
        b.iter(|| Parser::from_reader(&gif[..]).accept(&mut decode).unwrap())
    });

    let mut decoder = lzw::Decoder::new();
    let mut lzw = lzw::Encoder::new();
    group.bench_with_input(BenchmarkId::new("Images", "Transcode"), &gif, |b, gif| {
        b.iter(|| {
            let mut transcode = Transcode {
                encoder: Encoder::from_writer(Vec::with_capacity(gif.len())),
                screen: LogicalScreenDescriptor::default(),
                decoder: std::mem::take(&mut decoder),
                lzw: std::mem::take(&mut lzw),
            };
            Parser::from_reader(&gif[..]).accept(&mut transcode).unwrap();
            decoder = transcode.decoder;
            lzw = transcode.lzw;
            black_box(transcode.encoder.into_inner().into_writer())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_animation);
criterion_main!(benches);
