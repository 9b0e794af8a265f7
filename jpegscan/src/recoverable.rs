use tracing::{debug, warn};

use crate::checkpoint::Checkpoint;
use crate::error::ErrorMessage;
use crate::options::{DecodeOptions, ErrorPolicy};
use crate::scan::decode_image;
use crate::libjpeg::LibjpegBackend;
use crate::session::{Backend, Session};
use crate::types::{Image, ImageInfo};

/// Whole-image decoder that returns decoder failures instead of aborting.
///
/// Every call either returns a fully populated [`Image`] or an [`ErrorMessage`],
/// and in both cases the decoder session has been dropped before it returns.
#[derive(Debug, Clone, Default)]
pub struct RecoverableDecoder<B = LibjpegBackend> {
    backend: B,
    options: DecodeOptions,
}

impl RecoverableDecoder {
    /// A decoder over the default [`LibjpegBackend`] with no limits.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: Backend> RecoverableDecoder<B> {
    /// A decoder over a custom [`Backend`], e.g.
    /// [`JpegDecoderBackend`](crate::JpegDecoderBackend) for 16-bit frames.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            options: DecodeOptions::default(),
        }
    }

    /// Limits apply; the error policy is always [`ErrorPolicy::Recover`].
    pub fn options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Decode `data` into an [`Image`], or report why it could not be decoded.
    pub fn decode(&self, data: &[u8]) -> Result<Image, ErrorMessage> {
        let checkpoint = Checkpoint::new(ErrorPolicy::Recover);
        let result = {
            let mut session = self.backend.open(data);
            decode_image(&mut session, checkpoint, &self.options.limits)
        };
        match &result {
            Ok(image) => debug!(
                width = image.width,
                height = image.height,
                "recoverable decode complete"
            ),
            Err(msg) => warn!(kind = ?msg.kind, %msg, "recoverable decode failed"),
        }
        result
    }

    /// Read only the frame header.
    pub fn probe(&self, data: &[u8]) -> Result<ImageInfo, ErrorMessage> {
        let checkpoint = Checkpoint::new(ErrorPolicy::Recover);
        let mut session = self.backend.open(data);
        checkpoint.call(|| session.read_header())
    }
}
