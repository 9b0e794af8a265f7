use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jpegscan::{
    Backend, BufferedDecoder, DecodeOptions, Image, ImageInfo, JpegDecoderBackend,
    LibjpegBackend, RecoverableDecoder, StreamingDecoder,
};
use tracing::debug;

use crate::cli::{BackendKind, Mode};
use crate::pnm;

/// Decode `input` with the chosen adapter and write it to `out` as PNM.
pub fn run_decode(
    input: &Path,
    out: &Path,
    mode: Mode,
    backend: BackendKind,
    options: DecodeOptions,
) -> Result<()> {
    debug!(?mode, ?backend, input = %input.display(), out = %out.display(), "decoding");
    match backend {
        BackendKind::Libjpeg => decode_with(LibjpegBackend, input, out, mode, options),
        BackendKind::JpegDecoder => decode_with(JpegDecoderBackend, input, out, mode, options),
    }
}

/// Read the frame header of `input`.
pub fn probe(input: &Path, backend: BackendKind, options: DecodeOptions) -> Result<ImageInfo> {
    let info = match backend {
        BackendKind::Libjpeg => StreamingDecoder::with_backend(LibjpegBackend)
            .options(options)
            .probe_file(input),
        BackendKind::JpegDecoder => StreamingDecoder::with_backend(JpegDecoderBackend)
            .options(options)
            .probe_file(input),
    };
    info.with_context(|| format!("Failed to read JPEG header of {}", input.display()))
}

fn decode_with<B: Backend>(
    backend: B,
    input: &Path,
    out: &Path,
    mode: Mode,
    options: DecodeOptions,
) -> Result<()> {
    match mode {
        Mode::Buffered => {
            let bytes = read_input(input)?;
            let image = BufferedDecoder::with_backend(backend)
                .options(options)
                .decode(&bytes);
            write_image(&image, out)
        }
        Mode::Recoverable => {
            let bytes = read_input(input)?;
            let image = RecoverableDecoder::with_backend(backend)
                .options(options)
                .decode(&bytes)
                .map_err(|msg| anyhow!("Failed to decode {}: {msg}", input.display()))?;
            write_image(&image, out)
        }
        Mode::Streaming => {
            let decoder = StreamingDecoder::with_backend(backend).options(options);
            let result = stream_to(&decoder, input, out);
            if result.is_err() {
                // Partial output is not a valid PNM.
                let _ = fs::remove_file(out);
            }
            result
        }
    }
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    fs::read(input).with_context(|| format!("Failed to read JPEG file {}", input.display()))
}

fn write_image(image: &Image, out: &Path) -> Result<()> {
    let mut writer = create_output(out)?;
    writer.write_all(pnm::header(image.width, image.height, image.pixel_format).as_bytes())?;
    for row in image.rows() {
        pnm::write_row(&mut writer, row, image.pixel_format)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", out.display()))
}

fn stream_to<B: Backend>(decoder: &StreamingDecoder<B>, input: &Path, out: &Path) -> Result<()> {
    let info = decoder
        .probe_file(input)
        .with_context(|| format!("Failed to read JPEG header of {}", input.display()))?;

    let mut writer = create_output(out)?;
    writer.write_all(pnm::header(info.width, info.height, info.pixel_format).as_bytes())?;

    let mut write_error: Option<io::Error> = None;
    decoder
        .decode_file(input, |row, _stride| {
            if write_error.is_none() {
                if let Err(err) = pnm::write_row(&mut writer, row, info.pixel_format) {
                    write_error = Some(err);
                }
            }
        })
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    if let Some(err) = write_error {
        return Err(err).with_context(|| format!("Failed to write {}", out.display()));
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", out.display()))
}

fn create_output(out: &Path) -> Result<BufWriter<File>> {
    File::create(out)
        .map(BufWriter::new)
        .with_context(|| format!("Failed to create {}", out.display()))
}
