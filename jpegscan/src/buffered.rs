use tracing::debug;

use crate::checkpoint::{Checkpoint, abort};
use crate::options::{DecodeOptions, ErrorPolicy};
use crate::scan::decode_image;
use crate::libjpeg::LibjpegBackend;
use crate::session::Backend;
use crate::types::Image;

/// Whole-image decoder for trusted input.
///
/// Failures are not recovered: the decoder diagnostic is raised as a panic.
/// Use [`RecoverableDecoder`](crate::RecoverableDecoder) for untrusted data.
#[derive(Debug, Clone, Default)]
pub struct BufferedDecoder<B = LibjpegBackend> {
    backend: B,
    options: DecodeOptions,
}

impl BufferedDecoder {
    /// A decoder over the default [`LibjpegBackend`] with no limits.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: Backend> BufferedDecoder<B> {
    /// A decoder over a custom [`Backend`], e.g.
    /// [`JpegDecoderBackend`](crate::JpegDecoderBackend) for 16-bit frames.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            options: DecodeOptions::default(),
        }
    }

    /// Limits apply; the error policy is always [`ErrorPolicy::Abort`].
    pub fn options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Decode `data` into an [`Image`].
    ///
    /// # Panics
    ///
    /// Panics with the decoder's diagnostic if `data` is not a decodable JPEG
    /// stream or exceeds the configured limits.
    pub fn decode(&self, data: &[u8]) -> Image {
        let checkpoint = Checkpoint::new(ErrorPolicy::Abort);
        let mut session = self.backend.open(data);
        let result = decode_image(&mut session, checkpoint, &self.options.limits);
        drop(session);
        match result {
            Ok(image) => {
                debug!(width = image.width, height = image.height, "buffered decode complete");
                image
            }
            Err(msg) => abort(msg),
        }
    }
}
