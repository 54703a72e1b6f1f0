use std::io::{BufRead, Seek, Write};

use super::error::{IconError, IconResult};
use super::image::{Image, PixelFormat};

impl Image {
    /// Reads an image from a PNG file.
    pub fn read_png<R: BufRead + Seek>(input: R) -> IconResult<Image> {
        let mut decoder = png::Decoder::new(input);
        decoder.set_transformations(png::Transformations::STRIP_16 | png::Transformations::EXPAND);
        let info = decoder.read_header_info().map_err(png_error)?;
        let (width, height) = (info.width, info.height);
        let mut reader = decoder.read_info().map_err(png_error)?;

        let (color_type, bit_depth) = reader.output_color_type();
        if bit_depth != png::BitDepth::Eight {
            return Err(IconError::format(format!("unsupported PNG bit depth {:?}", bit_depth)));
        }
        let pixel_format = match color_type {
            png::ColorType::Rgba => PixelFormat::RGBA,
            png::ColorType::Rgb => PixelFormat::RGB,
            png::ColorType::GrayscaleAlpha => PixelFormat::GrayAlpha,
            png::ColorType::Grayscale => PixelFormat::Gray,
            png::ColorType::Indexed => {
                return Err(IconError::format("PNG palette was not expanded"));
            }
        };

        let mut image = Image::new(pixel_format, width, height);
        if reader.output_buffer_size() != Some(image.data().len()) {
            return Err(IconError::format("PNG frame size does not match its header"));
        }
        reader.next_frame(image.data_mut()).map_err(png_error)?;
        reader.finish().map_err(png_error)?;
        Ok(image)
    }

    /// Writes the image to a PNG file.  Alpha-only images are written as
    /// gray with alpha.
    pub fn write_png<W: Write>(&self, output: W) -> IconResult<()> {
        let color_type = match self.format {
            PixelFormat::RGBA => png::ColorType::Rgba,
            PixelFormat::RGB => png::ColorType::Rgb,
            PixelFormat::GrayAlpha => png::ColorType::GrayscaleAlpha,
            PixelFormat::Gray => png::ColorType::Grayscale,
            PixelFormat::Alpha => {
                return self.convert_to(PixelFormat::GrayAlpha).write_png(output);
            }
        };
        let mut encoder = png::Encoder::new(output, self.width(), self.height());
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(png_encoding_error)?;
        writer.write_image_data(&self.data).map_err(png_encoding_error)?;
        writer.finish().map_err(png_encoding_error)?;
        Ok(())
    }
}

fn png_error(error: png::DecodingError) -> IconError {
    match error {
        png::DecodingError::IoError(error) => IconError::from_read(error),
        other => IconError::Format(format!("invalid PNG data: {}", other)),
    }
}

fn png_encoding_error(error: png::EncodingError) -> IconError {
    match error {
        png::EncodingError::IoError(error) => IconError::Io(error),
        other => IconError::InvalidSource(format!("cannot encode PNG: {}", other)),
    }
}
