use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::checkpoint::Checkpoint;
use crate::error::{Error, Result};
use crate::options::DecodeOptions;
use crate::scan::drive;
use crate::libjpeg::LibjpegBackend;
use crate::session::{Backend, Session};
use crate::types::ImageInfo;

/// Row-at-a-time decoder.
///
/// Each decoded scanline is handed to the callback as `(row, stride)` and then
/// discarded; no full-image buffer is allocated by this adapter, and the
/// default [`LibjpegBackend`] keeps only the current row. The row slice is only
/// borrowed for the duration of the call.
///
/// Decoder failures are returned as [`Error::Decode`] under the default
/// [`ErrorPolicy::Recover`](crate::ErrorPolicy::Recover). With
/// [`ErrorPolicy::Abort`](crate::ErrorPolicy::Abort) they panic instead. Panics
/// raised by the callback itself always propagate unchanged.
#[derive(Debug, Clone, Default)]
pub struct StreamingDecoder<B = LibjpegBackend> {
    backend: B,
    options: DecodeOptions,
}

impl StreamingDecoder {
    /// A decoder over the default [`LibjpegBackend`] with no limits.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: Backend> StreamingDecoder<B> {
    /// A decoder over a custom [`Backend`], e.g.
    /// [`JpegDecoderBackend`](crate::JpegDecoderBackend) for 16-bit frames.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            options: DecodeOptions::default(),
        }
    }

    /// Replace the limits and error policy.
    pub fn options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Decode the file at `path`.
    ///
    /// Fails with [`Error::Open`] before any decoder session exists if the file
    /// cannot be opened. The file is closed before this returns.
    pub fn decode_file<F>(&self, path: impl AsRef<Path>, on_row: F) -> Result<()>
    where
        F: FnMut(&[u8], usize),
    {
        let path = path.as_ref();
        let source = open_file(path)?;
        debug!(path = %path.display(), "streaming decode from file");
        self.decode_reader(source, on_row)
    }

    /// Read only the frame header of the file at `path`.
    pub fn probe_file(&self, path: impl AsRef<Path>) -> Result<ImageInfo> {
        self.probe_reader(open_file(path.as_ref())?)
    }

    /// Read only the frame header from `source`.
    pub fn probe_reader<R: Read>(&self, source: R) -> Result<ImageInfo> {
        let checkpoint = Checkpoint::new(self.options.policy);
        let mut session = self.backend.open(source);
        let info = checkpoint.call(|| session.read_header());
        info.map_err(Error::Decode)
    }

    /// Decode an in-memory JPEG stream. The bytes are read in place.
    pub fn decode_bytes<F>(&self, data: &[u8], on_row: F) -> Result<()>
    where
        F: FnMut(&[u8], usize),
    {
        self.decode_reader(data, on_row)
    }

    /// Decode from any reader; the reader is dropped together with the session.
    pub fn decode_reader<R, F>(&self, source: R, mut on_row: F) -> Result<()>
    where
        R: Read,
        F: FnMut(&[u8], usize),
    {
        let checkpoint = Checkpoint::new(self.options.policy);
        let limits = &self.options.limits;
        let result = {
            let mut session = self.backend.open(source);
            drive(
                &mut session,
                checkpoint,
                limits,
                |info| info.stride(),
                |stride, _, row| on_row(row, *stride),
            )
        };
        match checkpoint.settle(result) {
            Ok(stride) => {
                debug!(stride, "streaming decode complete");
                Ok(())
            }
            Err(msg) => {
                warn!(kind = ?msg.kind, %msg, "streaming decode failed");
                Err(Error::Decode(msg))
            }
        }
    }
}

fn open_file(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}
