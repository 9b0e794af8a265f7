//! The boundary to the external JPEG decoder.
//!
//! A [`Backend`] opens one [`Session`] per decode call. The session exposes the
//! decoder the way libjpeg does: header, start, one scanline at a time, finish.
//! Dropping the session destroys it and releases everything it allocated.

use std::io::Read;

use tracing::debug;

use crate::error::{ErrorKind, ErrorMessage};
use crate::types::{CodingProcess, ImageInfo, PixelFormat};

/// Factory for decoder sessions.
pub trait Backend {
    type Session<R: Read>: Session;

    /// Create a session reading compressed data from `source`.
    fn open<R: Read>(&self, source: R) -> Self::Session<R>;
}

/// Per-decode mutable decoder state. Not meant to be shared between threads
/// or reused across decodes.
pub trait Session {
    /// Parse markers up to the first frame header.
    fn read_header(&mut self) -> Result<ImageInfo, ErrorMessage>;

    /// Begin decompression; returns the output geometry.
    fn start_decompress(&mut self) -> Result<ImageInfo, ErrorMessage>;

    /// Decode the next row into the session's scratch row.
    fn read_scanline(&mut self) -> Result<(), ErrorMessage>;

    /// The scratch row filled by the last [`read_scanline`](Session::read_scanline).
    /// Only valid until the next call on the session.
    fn scanline(&self) -> &[u8];

    /// Number of rows read so far.
    fn output_scanline(&self) -> u32;

    /// Complete decompression. Fails if rows are left unread.
    fn finish_decompress(&mut self) -> Result<(), ErrorMessage>;
}

/// Sessions backed by the `jpeg-decoder` crate.
///
/// Unlike [`LibjpegBackend`](crate::LibjpegBackend) this decodes lossless and
/// 9 to 16-bit frames, which come out as [`PixelFormat::Gray16`]. The cost is
/// that `jpeg-decoder` has no scanline interface: the whole frame is decoded
/// in `start_decompress` and kept in the session, and frames larger than
/// 128x128 are decoded on a worker thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegDecoderBackend;

impl Backend for JpegDecoderBackend {
    type Session<R: Read> = JpegDecoderSession<R>;

    fn open<R: Read>(&self, source: R) -> JpegDecoderSession<R> {
        debug!("decoder session created");
        JpegDecoderSession {
            decoder: jpeg_decoder::Decoder::new(source),
            info: None,
            frame: Vec::new(),
            stride: 0,
            row: 0,
            started: false,
        }
    }
}

/// Holds the frame decoded by `jpeg-decoder` and hands out one row per
/// scanline read.
pub struct JpegDecoderSession<R: Read> {
    decoder: jpeg_decoder::Decoder<R>,
    info: Option<ImageInfo>,
    frame: Vec<u8>,
    stride: usize,
    row: u32,
    started: bool,
}

impl<R: Read> JpegDecoderSession<R> {
    fn info(&self) -> Result<ImageInfo, ErrorMessage> {
        self.info
            .ok_or_else(|| ErrorMessage::new(ErrorKind::Internal, "frame header not read"))
    }
}

impl<R: Read> Session for JpegDecoderSession<R> {
    fn read_header(&mut self) -> Result<ImageInfo, ErrorMessage> {
        if let Some(info) = self.info {
            return Ok(info);
        }
        self.decoder.read_info()?;
        let raw = self
            .decoder
            .info()
            .ok_or_else(|| ErrorMessage::new(ErrorKind::Malformed, "no frame header found"))?;
        let info = ImageInfo {
            width: u32::from(raw.width),
            height: u32::from(raw.height),
            pixel_format: PixelFormat::from_decoder(raw.pixel_format),
            coding_process: Some(CodingProcess::from_decoder(raw.coding_process)),
        };
        debug!(
            width = info.width,
            height = info.height,
            format = ?info.pixel_format,
            process = ?info.coding_process,
            "frame header"
        );
        self.info = Some(info);
        Ok(info)
    }

    fn start_decompress(&mut self) -> Result<ImageInfo, ErrorMessage> {
        let info = self.info()?;
        if self.started {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                "decompression already started",
            ));
        }
        let expected = info.buffer_len()?;
        let frame = self.decoder.decode()?;
        if frame.len() != expected {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                format!(
                    "decoder produced {} bytes, expected {expected}",
                    frame.len()
                ),
            ));
        }
        self.frame = frame;
        self.stride = info.stride()?;
        self.started = true;
        Ok(info)
    }

    fn read_scanline(&mut self) -> Result<(), ErrorMessage> {
        let info = self.info()?;
        if !self.started {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                "scanline requested before decompression started",
            ));
        }
        if self.row >= info.height {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                "scanline requested past end of image",
            ));
        }
        self.row += 1;
        Ok(())
    }

    fn scanline(&self) -> &[u8] {
        if self.row == 0 {
            return &[];
        }
        let start = (self.row - 1) as usize * self.stride;
        &self.frame[start..start + self.stride]
    }

    fn output_scanline(&self) -> u32 {
        self.row
    }

    fn finish_decompress(&mut self) -> Result<(), ErrorMessage> {
        let info = self.info()?;
        if self.row < info.height {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                format!("finished after {} of {} scanlines", self.row, info.height),
            ));
        }
        self.frame = Vec::new();
        Ok(())
    }
}

impl<R: Read> Drop for JpegDecoderSession<R> {
    fn drop(&mut self) {
        debug!(rows_read = self.row, "decoder session destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn encode_rgb(width: u16, height: u16) -> Vec<u8> {
        let pixels: Vec<u8> = (0..width as usize * height as usize * 3)
            .map(|i| (i * 7 % 256) as u8)
            .collect();
        let mut out = Vec::new();
        jpeg_encoder::Encoder::new(&mut out, 90)
            .encode(&pixels, width, height, jpeg_encoder::ColorType::Rgb)
            .unwrap();
        out
    }

    #[test]
    fn header_then_rows_then_finish() {
        let jpeg = encode_rgb(3, 4);
        let mut session = JpegDecoderBackend.open(&jpeg[..]);
        let info = session.read_header().unwrap();
        assert_eq!((info.width, info.height), (3, 4));
        assert_eq!(info.pixel_format, PixelFormat::Rgb8);
        assert_eq!(session.scanline(), &[] as &[u8]);

        session.start_decompress().unwrap();
        for expected in 1..=4 {
            session.read_scanline().unwrap();
            assert_eq!(session.output_scanline(), expected);
            assert_eq!(session.scanline().len(), 9);
        }
        assert!(session.read_scanline().is_err());
        session.finish_decompress().unwrap();
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let jpeg = encode_rgb(2, 2);
        let mut session = JpegDecoderBackend.open(&jpeg[..]);
        assert!(session.start_decompress().is_err());
        session.read_header().unwrap();
        assert!(session.read_scanline().is_err());
        session.start_decompress().unwrap();
        assert!(session.start_decompress().is_err());
        session.read_scanline().unwrap();
        let err = session.finish_decompress().unwrap_err();
        assert!(err.as_str().contains("1 of 2"));
    }

    #[test]
    fn garbage_fails_in_header() {
        let mut session = JpegDecoderBackend.open(&b"not a jpeg"[..]);
        let err = session.read_header().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
    }
}
