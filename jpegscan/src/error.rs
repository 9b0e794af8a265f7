use std::any::Any;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Upper bound on the length of a decoder diagnostic, in bytes.
///
/// Matches libjpeg's `JMSG_LENGTH_MAX`; longer messages are cut on a char boundary.
pub const MAX_MESSAGE_LEN: usize = 200;

/// Classification of a decode failure reported by the external decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad markers or otherwise invalid bitstream.
    Malformed,
    /// A valid JPEG feature the decoder does not implement.
    Unsupported,
    /// The stream ended before the image was complete.
    Truncated,
    /// The configured [`Limits`](crate::Limits) were exceeded.
    Limits,
    /// Reading the source failed for a reason other than end of data.
    Io,
    /// Internal decoder failure.
    Internal,
    /// The decoder aborted (panicked) mid-call.
    Aborted,
}

/// Bounded diagnostic copied out of a decoder session.
///
/// The message is owned by the caller and outlives the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    /// What went wrong, coarsely.
    pub kind: ErrorKind,
    text: String,
}

impl ErrorMessage {
    /// Build a diagnostic, cutting `text` to [`MAX_MESSAGE_LEN`] bytes.
    ///
    /// This is how a custom [`Session`](crate::Session) reports its own failures.
    /// An empty `text` is replaced by a generic message so a failure never
    /// reads as blank.
    pub fn new(kind: ErrorKind, text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.len() > MAX_MESSAGE_LEN {
            let mut end = MAX_MESSAGE_LEN;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        if text.is_empty() {
            text.push_str("unknown decoder error");
        }
        Self { kind, text }
    }

    pub(crate) fn limits(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Limits, msg)
    }

    /// Build a message from a panic payload raised inside the decoder.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let text = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "decoder aborted".to_string()
        };
        Self::new(ErrorKind::Aborted, text)
    }

    /// The formatted diagnostic, at most [`MAX_MESSAGE_LEN`] bytes.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Take the diagnostic text, dropping the kind.
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.text)
    }
}

impl std::error::Error for ErrorMessage {}

impl From<jpeg_decoder::Error> for ErrorMessage {
    fn from(err: jpeg_decoder::Error) -> Self {
        match err {
            jpeg_decoder::Error::Format(msg) => Self::new(ErrorKind::Malformed, msg),
            jpeg_decoder::Error::Unsupported(feature) => {
                Self::new(ErrorKind::Unsupported, format!("unsupported feature: {feature:?}"))
            }
            jpeg_decoder::Error::Io(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
                Self::new(ErrorKind::Truncated, format!("premature end of data: {io}"))
            }
            jpeg_decoder::Error::Io(io) => Self::new(ErrorKind::Io, io.to_string()),
            other => Self::new(ErrorKind::Internal, other.to_string()),
        }
    }
}

/// Errors surfaced by libjpeg through `mozjpeg` that are not panics.
impl From<io::Error> for ErrorMessage {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::UnexpectedEof => ErrorKind::Truncated,
            io::ErrorKind::InvalidData | io::ErrorKind::Other => ErrorKind::Malformed,
            io::ErrorKind::Unsupported => ErrorKind::Unsupported,
            _ => ErrorKind::Io,
        };
        Self::new(kind, err.to_string())
    }
}

/// Error returned by the streaming decoder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source file could not be opened; no decoder session was created.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The decoder reported a fatal condition.
    #[error(transparent)]
    Decode(#[from] ErrorMessage),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
