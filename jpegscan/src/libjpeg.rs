//! Scanline sessions over libjpeg, through the `mozjpeg` crate.
//!
//! This is the default backend. libjpeg decodes one row per
//! `jpeg_read_scanlines` call into a caller-owned buffer, so a session holds a
//! single row of output plus libjpeg's own MCU-row state. libjpeg reports fatal
//! errors through `error_exit`, which `mozjpeg` raises as a panic; the
//! checkpoint around every session call turns it back into an error.

use std::io::{BufReader, Read};
use std::mem;

use mozjpeg::decompress::DecompressStarted;
use mozjpeg::{ColorSpace, Decompress};
use tracing::debug;

use crate::error::{ErrorKind, ErrorMessage};
use crate::session::{Backend, Session};
use crate::types::{ImageInfo, PixelFormat};

/// Sessions backed by libjpeg (8-bit sequential and progressive frames).
#[derive(Debug, Clone, Copy, Default)]
pub struct LibjpegBackend;

impl Backend for LibjpegBackend {
    type Session<R: Read> = LibjpegSession<R>;

    fn open<R: Read>(&self, source: R) -> LibjpegSession<R> {
        debug!("libjpeg session created");
        LibjpegSession {
            stage: Stage::Pending(BufReader::new(source)),
            info: None,
            row: Vec::new(),
            rows_read: 0,
        }
    }
}

enum Stage<R: Read> {
    Pending(BufReader<R>),
    Header(Decompress<BufReader<R>>),
    Started(DecompressStarted<BufReader<R>>),
    Finished,
    /// A call failed or unwound half way; the session is unusable.
    Broken,
}

/// One libjpeg decompress object and its scratch row.
pub struct LibjpegSession<R: Read> {
    stage: Stage<R>,
    info: Option<ImageInfo>,
    row: Vec<u8>,
    rows_read: u32,
}

fn out_of_order(what: &str) -> ErrorMessage {
    ErrorMessage::new(ErrorKind::Internal, format!("{what} called out of order"))
}

/// Output layout libjpeg is asked for, given the color space of the stream.
fn output_format(space: ColorSpace) -> PixelFormat {
    match space {
        ColorSpace::JCS_GRAYSCALE => PixelFormat::Gray8,
        ColorSpace::JCS_CMYK | ColorSpace::JCS_YCCK => PixelFormat::Cmyk8,
        _ => PixelFormat::Rgb8,
    }
}

fn dimension(value: usize, axis: &str) -> Result<u32, ErrorMessage> {
    u32::try_from(value)
        .map_err(|_| ErrorMessage::limits(format!("{axis} {value} does not fit in 32 bits")))
}

impl<R: Read> LibjpegSession<R> {
    fn info(&self) -> Result<ImageInfo, ErrorMessage> {
        self.info
            .ok_or_else(|| ErrorMessage::new(ErrorKind::Internal, "frame header not read"))
    }
}

impl<R: Read> Session for LibjpegSession<R> {
    fn read_header(&mut self) -> Result<ImageInfo, ErrorMessage> {
        if let Some(info) = self.info {
            return Ok(info);
        }
        let Stage::Pending(reader) = mem::replace(&mut self.stage, Stage::Broken) else {
            return Err(out_of_order("read_header"));
        };
        let decompress = Decompress::new_reader(reader)?;
        let info = ImageInfo {
            width: dimension(decompress.width(), "width")?,
            height: dimension(decompress.height(), "height")?,
            pixel_format: output_format(decompress.color_space()),
            coding_process: None,
        };
        debug!(
            width = info.width,
            height = info.height,
            format = ?info.pixel_format,
            "frame header"
        );
        self.stage = Stage::Header(decompress);
        self.info = Some(info);
        Ok(info)
    }

    fn start_decompress(&mut self) -> Result<ImageInfo, ErrorMessage> {
        let info = self.info()?;
        let Stage::Header(decompress) = mem::replace(&mut self.stage, Stage::Broken) else {
            return Err(out_of_order("start_decompress"));
        };
        let started = match info.pixel_format {
            PixelFormat::Gray8 => decompress.grayscale()?,
            PixelFormat::Cmyk8 => decompress.to_colorspace(ColorSpace::JCS_CMYK)?,
            PixelFormat::Rgb8 | PixelFormat::Gray16 => decompress.rgb()?,
        };
        if (started.width(), started.height()) != (info.width as usize, info.height as usize) {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                format!(
                    "output is {}x{}, header said {}x{}",
                    started.width(),
                    started.height(),
                    info.width,
                    info.height
                ),
            ));
        }
        self.row = vec![0u8; info.stride()?];
        self.stage = Stage::Started(started);
        Ok(info)
    }

    fn read_scanline(&mut self) -> Result<(), ErrorMessage> {
        let info = self.info()?;
        if self.rows_read >= info.height {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                "scanline requested past end of image",
            ));
        }
        let Stage::Started(started) = &mut self.stage else {
            return Err(out_of_order("read_scanline"));
        };
        let filled = started.read_scanlines_into(&mut self.row[..])?.len();
        if filled != self.row.len() {
            return Err(ErrorMessage::new(
                ErrorKind::Truncated,
                format!("no data for scanline {}", self.rows_read),
            ));
        }
        self.rows_read += 1;
        Ok(())
    }

    fn scanline(&self) -> &[u8] {
        if self.rows_read == 0 {
            return &[];
        }
        &self.row
    }

    fn output_scanline(&self) -> u32 {
        self.rows_read
    }

    fn finish_decompress(&mut self) -> Result<(), ErrorMessage> {
        let info = self.info()?;
        if self.rows_read < info.height {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                format!("finished after {} of {} scanlines", self.rows_read, info.height),
            ));
        }
        let Stage::Started(started) = mem::replace(&mut self.stage, Stage::Broken) else {
            return Err(out_of_order("finish_decompress"));
        };
        started.finish()?;
        self.stage = Stage::Finished;
        self.row = Vec::new();
        Ok(())
    }
}

impl<R: Read> Drop for LibjpegSession<R> {
    fn drop(&mut self) {
        debug!(rows_read = self.rows_read, "libjpeg session destroyed");
    }
}
