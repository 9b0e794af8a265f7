use std::path::PathBuf;

use clap::{Parser, ValueEnum, builder::ValueHint};

/// Command-line arguments for jpegscan.
#[derive(Parser, Debug)]
#[command(
    name = "jpegscan",
    about = "Decode a JPEG into a binary PNM, buffered or one row at a time.",
    author,
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// JPEG file to decode
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output PNM path (defaults to the input with a .pgm/.ppm/.pam extension)
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Decoding mode
    #[arg(long, value_enum, default_value_t = Mode::Streaming)]
    pub mode: Mode,

    /// Decoder backend
    #[arg(long, value_enum, default_value_t = BackendKind::Libjpeg)]
    pub backend: BackendKind,

    /// Print the frame header and exit without decoding
    #[arg(long)]
    pub info: bool,

    /// Reject frames wider than this many pixels
    #[arg(long = "max-width", value_name = "PX")]
    pub max_width: Option<u32>,

    /// Reject frames taller than this many pixels
    #[arg(long = "max-height", value_name = "PX")]
    pub max_height: Option<u32>,

    /// Reject frames whose decoded size exceeds this many bytes
    #[arg(long = "max-memory", value_name = "BYTES")]
    pub max_memory: Option<usize>,

    /// Panic on malformed input instead of reporting it (streaming mode)
    #[arg(long = "abort-on-error")]
    pub abort_on_error: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Whole image in memory; panics on malformed input
    Buffered,
    /// Whole image in memory; reports malformed input as an error
    Recoverable,
    /// Rows are written to the output as they are decoded
    Streaming,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// libjpeg, one row in memory at a time (8-bit frames)
    Libjpeg,
    /// jpeg-decoder, whole frame in memory (also lossless and 16-bit frames)
    JpegDecoder,
}
