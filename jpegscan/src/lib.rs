//! JPEG decoding adapters over libjpeg (through [`mozjpeg`](https://docs.rs/mozjpeg))
//! and the [`jpeg-decoder`](https://docs.rs/jpeg-decoder) crate.
//!
//! The crate drives an external decoder one scanline at a time and offers three
//! ways to consume the result:
//! - [`BufferedDecoder`] decodes into an [`Image`] and panics on bad input. Meant for
//!   trusted, pre-validated data.
//! - [`RecoverableDecoder`] decodes into an [`Image`] or returns an [`ErrorMessage`];
//!   decoder panics are caught and converted as well.
//! - [`StreamingDecoder`] hands each row to a callback as it is decoded, from a byte
//!   slice or a file.
//!
//! Every decode call opens its own decoder [`Session`] and drops it before returning,
//! on success and on failure alike. The default [`LibjpegBackend`] keeps a single
//! row in memory while streaming. [`JpegDecoderBackend`] also handles lossless
//! and 16-bit frames but buffers the whole frame internally. Stride math uses the
//! sample width the decoder reports ([`PixelFormat::bytes_per_sample`]), so 16-bit
//! output is sized correctly.
//!
//! ```no_run
//! use jpegscan::{RecoverableDecoder, StreamingDecoder};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! match RecoverableDecoder::new().decode(&bytes) {
//!     Ok(image) => println!("{}x{} {:?}", image.width, image.height, image.pixel_format),
//!     Err(msg) => eprintln!("not decodable: {msg}"),
//! }
//!
//! let mut rows = 0;
//! StreamingDecoder::new()
//!     .decode_file("photo.jpg", |_row, _stride| rows += 1)
//!     .unwrap();
//! ```

mod buffered;
mod checkpoint;
mod error;
mod libjpeg;
mod options;
mod recoverable;
mod scan;
mod session;
mod streaming;
mod types;

pub use buffered::BufferedDecoder;
pub use error::{Error, ErrorKind, ErrorMessage, MAX_MESSAGE_LEN, Result};
pub use libjpeg::{LibjpegBackend, LibjpegSession};
pub use options::{DecodeOptions, ErrorPolicy, Limits};
pub use recoverable::RecoverableDecoder;
pub use session::{Backend, JpegDecoderBackend, JpegDecoderSession, Session};
pub use streaming::StreamingDecoder;
pub use types::*;
