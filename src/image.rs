use ::image::RgbaImage;

use super::error::{IconError, IconResult};

/// A decoded icon image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    pub(crate) format: PixelFormat,
    width: u32,
    height: u32,
    pub(crate) data: Box<[u8]>,
}

impl Image {
    /// Creates a new image with all pixel data set to zero.
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Image {
        let data_bytes = format.data_length(width, height);
        Image {
            format,
            width,
            height,
            data: vec![0u8; data_bytes].into_boxed_slice(),
        }
    }

    /// Creates a new image using the given pixel data.  Returns an error if
    /// the data array is not the correct length for the pixel format and
    /// dimensions.
    pub fn from_data(
        format: PixelFormat,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> IconResult<Image> {
        let expected = format.data_length(width, height);
        if data.len() != expected {
            let msg = format!(
                "pixel data has wrong length for {}x{} {:?} ({} instead of {})",
                width,
                height,
                format,
                data.len(),
                expected
            );
            return Err(IconError::InvalidSource(msg));
        }
        Ok(Image {
            format,
            width,
            height,
            data: data.into_boxed_slice(),
        })
    }

    /// Creates a copy of this image using the given pixel format.  Color
    /// channels are dropped or synthesized as needed; missing alpha becomes
    /// fully opaque.
    pub fn convert_to(&self, format: PixelFormat) -> Image {
        if format == self.format {
            return self.clone();
        }
        let rgba = self.to_rgba_data();
        let data: Vec<u8> = match format {
            PixelFormat::RGBA => rgba,
            PixelFormat::RGB => rgba
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            PixelFormat::GrayAlpha => rgba
                .chunks_exact(4)
                .flat_map(|px| [luminance(px[0], px[1], px[2]), px[3]])
                .collect(),
            PixelFormat::Gray => rgba
                .chunks_exact(4)
                .map(|px| luminance(px[0], px[1], px[2]))
                .collect(),
            PixelFormat::Alpha => rgba.chunks_exact(4).map(|px| px[3]).collect(),
        };
        Image {
            format,
            width: self.width,
            height: self.height,
            data: data.into_boxed_slice(),
        }
    }

    /// Creates a copy of this image using the RGBA pixel format (that is,
    /// `foo.to_rgba().pixel_format()` will always return `PixelFormat::RGBA`).
    /// If the source image is already in RGBA format, this is equivalant to
    /// simply calling `clone()`.
    pub fn to_rgba(&self) -> Image {
        self.convert_to(PixelFormat::RGBA)
    }

    fn to_rgba_data(&self) -> Vec<u8> {
        let num_pixels = (self.width * self.height) as usize;
        let mut rgba = Vec::with_capacity(num_pixels * 4);
        match self.format {
            PixelFormat::RGBA => rgba.extend_from_slice(&self.data),
            PixelFormat::RGB => {
                for px in self.data.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
                }
            }
            PixelFormat::GrayAlpha => {
                for px in self.data.chunks_exact(2) {
                    rgba.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
                }
            }
            PixelFormat::Gray => {
                for &value in self.data.iter() {
                    rgba.extend_from_slice(&[value, value, value, u8::MAX]);
                }
            }
            PixelFormat::Alpha => {
                for &value in self.data.iter() {
                    rgba.extend_from_slice(&[0, 0, 0, value]);
                }
            }
        }
        rgba
    }

    /// Converts the image into an `image::RgbaImage` for use with the
    /// `image` crate's processing routines.
    pub fn to_rgba_image(&self) -> IconResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.to_rgba_data()).ok_or_else(|| {
            IconError::InvalidSource(format!(
                "cannot rasterize {}x{} image",
                self.width, self.height
            ))
        })
    }

    /// Wraps an `image::RgbaImage` as an RGBA icon image.
    pub fn from_rgba_image(image: RgbaImage) -> Image {
        let (width, height) = image.dimensions();
        Image {
            format: PixelFormat::RGBA,
            width,
            height,
            data: image.into_raw().into_boxed_slice(),
        }
    }

    /// Returns the format in which this image's pixel data is stored.
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns a reference to the image's pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a mutable reference to the image's pixel data.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// A format for storing pixel data in an image.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelFormat {
    /// 32-bit color with (non-premultiplied) alpha channel.
    RGBA,
    /// 24-bit color with no alpha.
    RGB,
    /// 16-bit grayscale with alpha channel.
    GrayAlpha,
    /// 8-bit grayscale with no alpha.
    Gray,
    /// 8-bit alpha mask with no color.
    Alpha,
}

impl PixelFormat {
    /// Returns the number of bits needed to store a single pixel in this
    /// format.
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::RGBA => 32,
            PixelFormat::RGB => 24,
            PixelFormat::GrayAlpha => 16,
            PixelFormat::Gray | PixelFormat::Alpha => 8,
        }
    }

    fn data_length(self, width: u32, height: u32) -> usize {
        let data_bits = self.bits_per_pixel() as usize * width as usize * height as usize;
        (data_bits + 7) / 8
    }
}

/// Rec. 601 luma, as used for grayscale conversion.
pub(crate) fn luminance(red: u8, green: u8, blue: u8) -> u8 {
    ((299 * u32::from(red) + 587 * u32::from(green) + 114 * u32::from(blue) + 500) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_data_checks_length() {
        assert!(Image::from_data(PixelFormat::RGB, 2, 2, vec![0; 12]).is_ok());
        let err = Image::from_data(PixelFormat::RGBA, 2, 2, vec![0; 12]).unwrap_err();
        assert!(matches!(err, IconError::InvalidSource(_)));
    }

    #[test]
    fn gray_to_rgba() {
        let image = Image::from_data(PixelFormat::Gray, 2, 1, vec![10, 200]).unwrap();
        let rgba = image.to_rgba();
        assert_eq!(rgba.pixel_format(), PixelFormat::RGBA);
        assert_eq!(rgba.data(), &[10, 10, 10, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn rgba_to_alpha_and_gray() {
        let image =
            Image::from_data(PixelFormat::RGBA, 1, 1, vec![255, 255, 255, 77]).unwrap();
        assert_eq!(image.convert_to(PixelFormat::Alpha).data(), &[77]);
        assert_eq!(image.convert_to(PixelFormat::GrayAlpha).data(), &[255, 77]);
    }

    #[test]
    fn rgba_image_round_trip() {
        let image = Image::from_data(PixelFormat::RGB, 1, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let converted = Image::from_rgba_image(image.to_rgba_image().unwrap());
        assert_eq!(converted, image.to_rgba());
    }
}
