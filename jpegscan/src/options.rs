use crate::error::ErrorMessage;
use crate::types::ImageInfo;

/// Resource limits checked after the frame header is read.
///
/// All fields default to `None` (no limit).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for a decoded frame.
    pub max_memory_bytes: Option<usize>,
}

impl Limits {
    pub(crate) fn check(&self, info: &ImageInfo) -> Result<(), ErrorMessage> {
        let ImageInfo { width, height, .. } = *info;
        if let Some(max_w) = self.max_width {
            if width > max_w {
                return Err(ErrorMessage::limits(format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if height > max_h {
                return Err(ErrorMessage::limits(format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(ErrorMessage::limits(format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        if let Some(max_mem) = self.max_memory_bytes {
            let bytes = info.buffer_len()?;
            if bytes > max_mem {
                return Err(ErrorMessage::limits(format!(
                    "frame of {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}

/// What happens when the decoder hits a fatal condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Panic with the decoder diagnostic. Only for trusted input.
    Abort,
    /// Return the diagnostic to the caller and tear the session down.
    #[default]
    Recover,
}

/// Options shared by all decoders.
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    pub limits: Limits,
    pub policy: ErrorPolicy,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.limits.max_width = Some(width);
        self.limits.max_height = Some(height);
        self
    }

    pub fn max_memory_bytes(mut self, bytes: usize) -> Self {
        self.limits.max_memory_bytes = Some(bytes);
        self
    }

    /// Only consulted by [`StreamingDecoder`](crate::StreamingDecoder); the other
    /// decoders have a fixed policy.
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }
}
