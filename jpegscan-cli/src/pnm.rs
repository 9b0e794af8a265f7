//! Binary PNM output for decoded frames: P5 (gray), P6 (RGB), P7 (CMYK).
//!
//! PNM stores 16-bit samples big endian; decoded 16-bit rows are in native
//! order and are swapped on the way out.

use std::io::{self, Write};

use jpegscan::PixelFormat;

pub fn header(width: u32, height: u32, format: PixelFormat) -> String {
    match format {
        PixelFormat::Gray8 => format!("P5\n{width} {height}\n255\n"),
        PixelFormat::Gray16 => format!("P5\n{width} {height}\n65535\n"),
        PixelFormat::Rgb8 => format!("P6\n{width} {height}\n255\n"),
        PixelFormat::Cmyk8 => format!(
            "P7\nWIDTH {width}\nHEIGHT {height}\nDEPTH 4\nMAXVAL 255\nTUPLTYPE CMYK\nENDHDR\n"
        ),
    }
}

/// Write one decoded row in PNM sample order.
pub fn write_row<W: Write>(out: &mut W, row: &[u8], format: PixelFormat) -> io::Result<()> {
    if format != PixelFormat::Gray16 {
        return out.write_all(row);
    }
    let big_endian: Vec<u8> = row
        .chunks_exact(2)
        .flat_map(|sample| u16::from_ne_bytes([sample[0], sample[1]]).to_be_bytes())
        .collect();
    out.write_all(&big_endian)
}

pub fn extension(format: PixelFormat) -> &'static str {
    match format {
        PixelFormat::Gray8 | PixelFormat::Gray16 => "pgm",
        PixelFormat::Rgb8 => "ppm",
        PixelFormat::Cmyk8 => "pam",
    }
}
