use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use super::error::{IconError, IconResult};
use super::icontype::{Encoding, IconType, OSType};
use super::image::{Image, PixelFormat};
use super::planar::{mono_mask, planarize, unplanarize};

/// The length of an icon element header, in bytes:
pub(crate) const ICON_ELEMENT_HEADER_LENGTH: u32 = 8;

/// Leading bytes of a PNG file.
const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Leading bytes of a JPEG 2000 file (JP2 container or raw codestream).
const JP2_SIGNATURE: &[u8; 12] = b"\0\0\0\x0cjP  \r\n\x87\n";
const J2K_SIGNATURE: &[u8; 4] = b"\xff\x4f\xff\x51";

/// One entry in an ICNS file.  Depending on the resource type, this may
/// represent an icon, or part of an icon (such as an alpha mask, or color
/// data without the mask).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IconElement {
    /// The OSType for this element (e.g. `it32` or `t8mk`).
    pub ostype: OSType,
    /// The raw data payload for this element.
    pub data: Vec<u8>,
}

impl IconElement {
    /// Creates an icon element with the given OSType and data payload.
    pub fn new(ostype: OSType, data: Vec<u8>) -> IconElement {
        IconElement { ostype, data }
    }

    /// Creates an icon element that encodes the image with the given icon
    /// type (image color data only; masks are separate elements).  Returns an
    /// error if the image dimensions do not match the icon type.
    pub fn encode_image_with_type(image: &Image, icon_type: IconType) -> IconResult<IconElement> {
        let data = planarize(image, icon_type)?;
        Ok(IconElement::new(icon_type.ostype(), data))
    }

    /// Decodes the icon element into an image.  Returns an error if this
    /// element does not represent an icon type supported by this library, or
    /// if the data is malformed.
    ///
    /// Mask elements decode to `PixelFormat::Alpha` images; everything else
    /// decodes to RGBA.
    pub fn decode_image(&self) -> IconResult<Image> {
        let icon_type = self.icon_type().ok_or_else(|| {
            IconError::format(format!("unsupported OSType: {}", self.ostype))
        })?;
        match icon_type.encoding() {
            Encoding::ARGB32 => self.decode_argb(icon_type),
            Encoding::Data32 => {
                if self.data.len() == icon_type.data_length() {
                    unplanarize(&self.data, icon_type)
                } else {
                    let width = icon_type.pixel_width();
                    let height = icon_type.pixel_height();
                    let mut image = Image::new(PixelFormat::RGB, width, height);
                    decode_rle_rgb(self.rle_payload(icon_type), image.data_mut())?;
                    Ok(image.to_rgba())
                }
            }
            Encoding::Mask8 => {
                Ok(unplanarize(&self.data, icon_type)?.convert_to(PixelFormat::Alpha))
            }
            Encoding::Indexed8 | Encoding::Indexed4 | Encoding::Mono1 => {
                unplanarize(&self.data, icon_type)
            }
        }
    }

    /// Decodes this element and applies the alpha channel of the given mask
    /// element.  Returns an error if either element cannot be decoded or the
    /// two have different dimensions.
    pub fn decode_image_with_mask(&self, mask: &IconElement) -> IconResult<Image> {
        let mut image = self.decode_image()?.to_rgba();
        let mask_type = mask.icon_type().ok_or_else(|| {
            IconError::format(format!("unsupported mask OSType: {}", mask.ostype))
        })?;
        let alpha = match mask_type.encoding() {
            Encoding::Mask8 => mask.decode_image()?,
            Encoding::Mono1 => mono_mask(&mask.data, mask_type)?,
            _ => {
                let msg = format!("'{}' is not a mask element", mask.ostype);
                return Err(IconError::Format(msg));
            }
        };
        if alpha.width() != image.width() || alpha.height() != image.height() {
            let msg = format!(
                "mask '{}' is {}x{}, but image '{}' is {}x{}",
                mask.ostype,
                alpha.width(),
                alpha.height(),
                self.ostype,
                image.width(),
                image.height()
            );
            return Err(IconError::Format(msg));
        }
        for (pixel, &value) in image.data_mut().chunks_exact_mut(4).zip(alpha.data()) {
            pixel[3] = value;
        }
        Ok(image)
    }

    fn decode_argb(&self, icon_type: IconType) -> IconResult<Image> {
        if self.data.len() == icon_type.data_length() {
            return unplanarize(&self.data, icon_type);
        }
        let image = if self.data.starts_with(PNG_SIGNATURE) {
            decode_png(&self.data)?
        } else if self.data.starts_with(JP2_SIGNATURE) || self.data.starts_with(J2K_SIGNATURE) {
            decode_jp2(&self.data)?
        } else {
            let msg = format!(
                "'{}' payload is neither raw ARGB, PNG nor JPEG 2000 ({} bytes)",
                self.ostype,
                self.data.len()
            );
            return Err(IconError::Format(msg));
        };
        let width = icon_type.pixel_width();
        let height = icon_type.pixel_height();
        if image.width() != width || image.height() != height {
            let msg = format!(
                "decoded image has wrong dimensions ({}x{} instead of {}x{})",
                image.width(),
                image.height(),
                width,
                height
            );
            return Err(IconError::Format(msg));
        }
        Ok(image.to_rgba())
    }

    /// `it32` data may carry four zero bytes ahead of the RLE stream.
    fn rle_payload(&self, icon_type: IconType) -> &[u8] {
        if icon_type == IconType::Data32_128x128 && self.data.starts_with(&[0, 0, 0, 0]) {
            &self.data[4..]
        } else {
            &self.data
        }
    }

    /// Returns the type of icon encoded by this element, or `None` if this
    /// element does not encode a supported icon type.
    pub fn icon_type(&self) -> Option<IconType> {
        IconType::from_ostype(self.ostype)
    }

    /// Returns the encoded length of the element, in bytes, including the
    /// length of the header.
    pub fn total_length(&self) -> u32 {
        ICON_ELEMENT_HEADER_LENGTH + (self.data.len() as u32)
    }

    /// Reads an icon element from within an ICNS file.  At most `available`
    /// bytes (header included) may be consumed.
    pub fn read<R: Read>(mut reader: R, available: u32) -> IconResult<IconElement> {
        if available < ICON_ELEMENT_HEADER_LENGTH {
            return Err(IconError::format("truncated element header"));
        }
        let mut raw_ostype = [0u8; 4];
        reader.read_exact(&mut raw_ostype).map_err(IconError::from_read)?;
        let element_length = reader.read_u32::<BigEndian>().map_err(IconError::from_read)?;
        if element_length < ICON_ELEMENT_HEADER_LENGTH {
            let msg = format!(
                "invalid element length {} for '{}'",
                element_length,
                OSType(raw_ostype)
            );
            return Err(IconError::Format(msg));
        }
        if element_length > available {
            let msg = format!(
                "element '{}' ({} bytes) overruns the family ({} bytes left)",
                OSType(raw_ostype),
                element_length,
                available
            );
            return Err(IconError::Format(msg));
        }
        let data_length = element_length - ICON_ELEMENT_HEADER_LENGTH;
        // The declared length is untrusted; never allocate it up front.
        let mut data = Vec::new();
        reader.take(u64::from(data_length)).read_to_end(&mut data)?;
        if data.len() != data_length as usize {
            let msg = format!(
                "element '{}' is truncated ({} of {} payload bytes)",
                OSType(raw_ostype),
                data.len(),
                data_length
            );
            return Err(IconError::Format(msg));
        }
        Ok(IconElement::new(OSType(raw_ostype), data))
    }

    /// Writes the icon element to within an ICNS file.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let OSType(ref raw_ostype) = self.ostype;
        writer.write_all(raw_ostype)?;
        writer.write_u32::<BigEndian>(self.total_length())?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

#[cfg(feature = "pngio")]
fn decode_png(data: &[u8]) -> IconResult<Image> {
    Image::read_png(io::Cursor::new(data))
}

#[cfg(not(feature = "pngio"))]
fn decode_png(_data: &[u8]) -> IconResult<Image> {
    Err(IconError::format("PNG payloads need the `pngio` feature"))
}

#[cfg(feature = "jp2io")]
fn decode_jp2(data: &[u8]) -> IconResult<Image> {
    Image::read_jp2(data)
}

#[cfg(not(feature = "jp2io"))]
fn decode_jp2(_data: &[u8]) -> IconResult<Image> {
    Err(IconError::format("JPEG 2000 payloads need the `jp2io` feature"))
}

fn decode_rle_rgb(input: &[u8], output: &mut [u8]) -> IconResult<()> {
    debug_assert_eq!(output.len() % 3, 0);
    let num_pixels = output.len() / 3;
    let mut iter = input.iter();
    let mut remaining: usize = 0;
    let mut within_run = false;
    let mut run_value: u8 = 0;
    for channel in 0..3 {
        for pixel in 0..num_pixels {
            if remaining == 0 {
                let next: u8 = *iter.next().ok_or_else(rle_error)?;
                if next < 128 {
                    remaining = (next as usize) + 1;
                    within_run = false;
                } else {
                    remaining = (next as usize) - 125;
                    within_run = true;
                    run_value = *iter.next().ok_or_else(rle_error)?;
                }
            }
            output[3 * pixel + channel] = if within_run {
                run_value
            } else {
                *iter.next().ok_or_else(rle_error)?
            };
            remaining -= 1;
        }
        if remaining != 0 {
            return Err(rle_error());
        }
    }
    if iter.next().is_some() {
        Err(rle_error())
    } else {
        Ok(())
    }
}

fn rle_error() -> IconError {
    IconError::format("invalid RLE-compressed data")
}
