use crate::error::ErrorMessage;

/// Layout of one decoded pixel, as produced by the external decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One 8-bit luminance sample.
    Gray8,
    /// One 16-bit luminance sample (lossless and >8-bit precision frames).
    ///
    /// Samples are stored in native byte order; use [`Image::samples_u16`] to
    /// read them as integers.
    Gray16,
    /// Three 8-bit samples, R G B.
    Rgb8,
    /// Four 8-bit samples, C M Y K.
    Cmyk8,
}

impl PixelFormat {
    /// Samples per pixel.
    pub fn components(self) -> usize {
        match self {
            PixelFormat::Gray8 | PixelFormat::Gray16 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Cmyk8 => 4,
        }
    }

    /// Width of one sample in bytes, 2 for [`PixelFormat::Gray16`].
    pub fn bytes_per_sample(self) -> usize {
        match self {
            PixelFormat::Gray16 => 2,
            _ => 1,
        }
    }

    /// `components() * bytes_per_sample()`.
    pub fn bytes_per_pixel(self) -> usize {
        self.components() * self.bytes_per_sample()
    }

    pub(crate) fn from_decoder(fmt: jpeg_decoder::PixelFormat) -> Self {
        match fmt {
            jpeg_decoder::PixelFormat::L8 => PixelFormat::Gray8,
            jpeg_decoder::PixelFormat::L16 => PixelFormat::Gray16,
            jpeg_decoder::PixelFormat::RGB24 => PixelFormat::Rgb8,
            jpeg_decoder::PixelFormat::CMYK32 => PixelFormat::Cmyk8,
        }
    }
}

/// How the frame was entropy coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodingProcess {
    /// Baseline or extended sequential DCT.
    Sequential,
    Progressive,
    Lossless,
}

impl CodingProcess {
    pub(crate) fn from_decoder(process: jpeg_decoder::CodingProcess) -> Self {
        match process {
            jpeg_decoder::CodingProcess::DctSequential => CodingProcess::Sequential,
            jpeg_decoder::CodingProcess::DctProgressive => CodingProcess::Progressive,
            jpeg_decoder::CodingProcess::Lossless => CodingProcess::Lossless,
        }
    }
}

/// Frame header metadata, available once the header has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// `None` when the backend does not report it.
    pub coding_process: Option<CodingProcess>,
}

impl ImageInfo {
    /// Bytes per output row: `width * components * bytes_per_sample`.
    pub fn stride(&self) -> Result<usize, ErrorMessage> {
        (self.width as usize)
            .checked_mul(self.pixel_format.bytes_per_pixel())
            .ok_or_else(|| ErrorMessage::limits("row stride overflow"))
    }

    /// Size of a fully decoded frame in bytes.
    pub fn buffer_len(&self) -> Result<usize, ErrorMessage> {
        self.stride()?
            .checked_mul(self.height as usize)
            .ok_or_else(|| ErrorMessage::limits("buffer size overflow"))
    }
}

/// A fully decoded image. The pixel buffer is row-major with no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    data: Vec<u8>,
}

impl Image {
    /// Allocate a zeroed buffer sized for `info`.
    pub(crate) fn for_info(info: &ImageInfo) -> Result<Self, ErrorMessage> {
        let len = info.buffer_len()?;
        Ok(Self {
            width: info.width,
            height: info.height,
            pixel_format: info.pixel_format,
            data: vec![0u8; len],
        })
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.pixel_format.bytes_per_pixel()
    }

    /// The whole buffer, `height * stride()` bytes. 16-bit samples are in
    /// native byte order.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.data
    }

    /// Borrow row `y`, or `None` when out of range.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.stride();
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    /// Iterate rows from top to bottom.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        // chunks_exact panics on a zero chunk size; a zero-width image has no row bytes.
        self.data
            .chunks_exact(self.stride().max(1))
            .take(self.height as usize)
    }

    /// Samples of a [`PixelFormat::Gray16`] image as integers, row-major.
    ///
    /// Returns `None` for 8-bit formats.
    pub fn samples_u16(&self) -> Option<Vec<u16>> {
        if self.pixel_format != PixelFormat::Gray16 {
            return None;
        }
        Some(
            self.data
                .chunks_exact(2)
                .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                .collect(),
        )
    }

    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn info(width: u32, height: u32, pixel_format: PixelFormat) -> ImageInfo {
        ImageInfo {
            width,
            height,
            pixel_format,
            coding_process: Some(CodingProcess::Sequential),
        }
    }

    #[test]
    fn stride_scales_with_sample_width() {
        assert_eq!(info(2, 2, PixelFormat::Rgb8).stride().unwrap(), 6);
        assert_eq!(info(2, 2, PixelFormat::Rgb8).buffer_len().unwrap(), 12);
        assert_eq!(info(20, 20, PixelFormat::Gray16).stride().unwrap(), 40);
        assert_eq!(info(20, 20, PixelFormat::Gray16).buffer_len().unwrap(), 800);
        assert_eq!(info(3, 1, PixelFormat::Cmyk8).stride().unwrap(), 12);
    }

    #[test]
    fn rows_partition_the_buffer() {
        let mut image = Image::for_info(&info(2, 3, PixelFormat::Gray8)).unwrap();
        image.row_mut(1).copy_from_slice(&[7, 8]);
        assert_eq!(image.pixels().len(), 6);
        assert_eq!(image.row(1), Some(&[7u8, 8][..]));
        assert_eq!(image.row(3), None);
        let rows: Vec<_> = image.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], &[7, 8]);
    }

    #[test]
    fn gray16_samples_use_native_order() {
        let mut image = Image::for_info(&info(2, 1, PixelFormat::Gray16)).unwrap();
        let row: Vec<u8> = [0x0123u16, 0xfedc]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        image.row_mut(0).copy_from_slice(&row);
        assert_eq!(image.samples_u16(), Some(vec![0x0123, 0xfedc]));

        let gray8 = Image::for_info(&info(2, 1, PixelFormat::Gray8)).unwrap();
        assert_eq!(gray8.samples_u16(), None);
    }
}
