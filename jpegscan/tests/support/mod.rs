#![allow(dead_code)]

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jpegscan::{Backend, ErrorKind, ErrorMessage, ImageInfo, LibjpegBackend, Session};

/// Encode a deterministic gradient as an 8-bit JPEG.
pub fn encode(width: u16, height: u16, color: jpeg_encoder::ColorType) -> Vec<u8> {
    let channels = match color {
        jpeg_encoder::ColorType::Luma => 1,
        _ => 3,
    };
    let pixels: Vec<u8> = (0..width as usize * height as usize * channels)
        .map(|i| (i * 31 % 251) as u8)
        .collect();
    let mut out = Vec::new();
    jpeg_encoder::Encoder::new(&mut out, 90)
        .encode(&pixels, width, height, color)
        .expect("encode fixture");
    out
}

pub fn rgb(width: u16, height: u16) -> Vec<u8> {
    encode(width, height, jpeg_encoder::ColorType::Rgb)
}

pub fn gray(width: u16, height: u16) -> Vec<u8> {
    encode(width, height, jpeg_encoder::ColorType::Luma)
}

/// 20x20 white frame, 12-bit precision, arithmetic coded.
pub const ARITHMETIC_12BIT_WHITE: [u8; 126] = [
    0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0x4a, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xff, 0xdb, 0x00, 0x43, 0x00, 0x08, 0x06, 0x06, 0x07, 0x06,
    0x05, 0x08, 0x07, 0x07, 0x07, 0x09, 0x09, 0x08, 0x0a, 0x0c, 0x14, 0x0d, 0x0c, 0x0b, 0x0b,
    0x0c, 0x19, 0x12, 0x13, 0x0f, 0x14, 0x1d, 0x1a, 0x1f, 0x1e, 0x1d, 0x1a, 0x1c, 0x1c, 0x20,
    0x24, 0x2e, 0x27, 0x20, 0x22, 0x2c, 0x23, 0x1c, 0x1c, 0x28, 0x37, 0x29, 0x2c, 0x30, 0x31,
    0x34, 0x34, 0x34, 0x1f, 0x27, 0x39, 0x3d, 0x38, 0x32, 0x3c, 0x2e, 0x33, 0x34, 0x32, 0xff,
    0xc9, 0x00, 0x0b, 0x0c, 0x00, 0x14, 0x00, 0x14, 0x01, 0x01, 0x11, 0x00, 0xff, 0xcc, 0x00,
    0x06, 0x00, 0x10, 0x10, 0x05, 0xff, 0xda, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3f, 0x00,
    0xd2, 0xed, 0xbc, 0x8c, 0xff, 0xd9,
];

/// 4x2 lossless (SOF3) frame, 12-bit precision, predictor 1.
pub const LOSSLESS_12BIT: [u8; 59] = [
    0xff, 0xd8, 0xff, 0xc3, 0x00, 0x0b, 0x0c, 0x00, 0x02, 0x00, 0x04, 0x01, 0x01, 0x11, 0x00,
    0xff, 0xc4, 0x00, 0x19, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0xff, 0xda, 0x00,
    0x08, 0x01, 0x01, 0x00, 0x01, 0x00, 0x00, 0x06, 0xa4, 0x28, 0x29, 0x9f, 0xff, 0xd9,
];

/// Samples of [`LOSSLESS_12BIT`], row-major.
pub const LOSSLESS_12BIT_SAMPLES: [u16; 8] = [2048, 2049, 2051, 2048, 2050, 2050, 2052, 2046];

/// Wraps another backend and counts sessions, to catch leaks.
#[derive(Debug, Clone, Default)]
pub struct CountingBackend<B = LibjpegBackend> {
    inner: B,
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    /// Panic inside `read_scanline` once this many rows have been read.
    panic_after: Option<u32>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::wrapping(LibjpegBackend)
    }

    pub fn panicking_after(rows: u32) -> Self {
        Self {
            panic_after: Some(rows),
            ..Self::new()
        }
    }
}

impl<B> CountingBackend<B> {
    pub fn wrapping(inner: B) -> Self {
        Self {
            inner,
            opened: Arc::default(),
            live: Arc::default(),
            panic_after: None,
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

pub struct CountingSession<S> {
    inner: S,
    live: Arc<AtomicUsize>,
    panic_after: Option<u32>,
}

impl<B: Backend> Backend for CountingBackend<B> {
    type Session<R: Read> = CountingSession<B::Session<R>>;

    fn open<R: Read>(&self, source: R) -> Self::Session<R> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        CountingSession {
            inner: self.inner.open(source),
            live: Arc::clone(&self.live),
            panic_after: self.panic_after,
        }
    }
}

impl<S: Session> Session for CountingSession<S> {
    fn read_header(&mut self) -> Result<ImageInfo, ErrorMessage> {
        self.inner.read_header()
    }

    fn start_decompress(&mut self) -> Result<ImageInfo, ErrorMessage> {
        self.inner.start_decompress()
    }

    fn read_scanline(&mut self) -> Result<(), ErrorMessage> {
        if self.panic_after == Some(self.inner.output_scanline()) {
            panic!("simulated decoder abort at row {}", self.inner.output_scanline());
        }
        self.inner.read_scanline()
    }

    fn scanline(&self) -> &[u8] {
        self.inner.scanline()
    }

    fn output_scanline(&self) -> u32 {
        self.inner.output_scanline()
    }

    fn finish_decompress(&mut self) -> Result<(), ErrorMessage> {
        self.inner.finish_decompress()
    }
}

impl<S> Drop for CountingSession<S> {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A backend outside the crate that rejects every stream with its own message.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingBackend;

pub struct RejectingSession;

impl Backend for RejectingBackend {
    type Session<R: Read> = RejectingSession;

    fn open<R: Read>(&self, _source: R) -> RejectingSession {
        RejectingSession
    }
}

impl Session for RejectingSession {
    fn read_header(&mut self) -> Result<ImageInfo, ErrorMessage> {
        Err(ErrorMessage::new(
            ErrorKind::Unsupported,
            "hierarchical frames are not supported",
        ))
    }

    fn start_decompress(&mut self) -> Result<ImageInfo, ErrorMessage> {
        unreachable!("header always fails")
    }

    fn read_scanline(&mut self) -> Result<(), ErrorMessage> {
        unreachable!("header always fails")
    }

    fn scanline(&self) -> &[u8] {
        &[]
    }

    fn output_scanline(&self) -> u32 {
        0
    }

    fn finish_decompress(&mut self) -> Result<(), ErrorMessage> {
        unreachable!("header always fails")
    }
}
