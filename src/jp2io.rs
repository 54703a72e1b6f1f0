use hayro_jpeg2000::{ColorSpace, DecodeSettings};

use super::error::{IconError, IconResult};
use super::image::{Image, PixelFormat};

impl Image {
    /// Reads an image from a JPEG 2000 file (as stored in `ic08`/`ic09`
    /// elements written by newer tools).
    pub fn read_jp2(input: &[u8]) -> IconResult<Image> {
        let settings = DecodeSettings {
            resolve_palette_indices: true,
            strict: false,
            target_resolution: None,
        };
        let jp2 = hayro_jpeg2000::Image::new(input, &settings)
            .map_err(|err| IconError::Format(format!("invalid JPEG 2000 data: {}", err)))?;
        let has_alpha = jp2.has_alpha();
        let pixel_format = match jp2.color_space() {
            ColorSpace::Gray if has_alpha => PixelFormat::GrayAlpha,
            ColorSpace::Gray => PixelFormat::Gray,
            ColorSpace::RGB if has_alpha => PixelFormat::RGBA,
            ColorSpace::RGB => PixelFormat::RGB,
            ColorSpace::CMYK => {
                return Err(IconError::format("JPEG 2000 CMYK color space not supported"));
            }
            ColorSpace::Unknown { num_channels } => {
                return Err(IconError::Format(format!(
                    "JPEG 2000 color space with {num_channels} channels not supported"
                )));
            }
            ColorSpace::Icc { .. } => {
                return Err(IconError::format("JPEG 2000 ICC color space not supported"));
            }
        };
        let (width, height) = (jp2.width(), jp2.height());
        let pixels = jp2
            .decode()
            .map_err(|err| IconError::Format(format!("cannot decode JPEG 2000 data: {}", err)))?;
        Image::from_data(pixel_format, width, height, pixels)
            .map_err(|_| IconError::format("JPEG 2000 pixel data does not match its header"))
    }
}
