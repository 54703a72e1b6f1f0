//! Conversion between interleaved RGBA bitmaps and the fixed-depth payloads
//! stored in icon elements.

use super::error::{IconError, IconResult};
use super::icontype::{Encoding, IconType};
use super::image::{luminance, Image, PixelFormat};
use super::palette::{nearest_index, SYSTEM_PALETTE_4, SYSTEM_PALETTE_8};

/// Alpha at or above this value sets a bit in a 1-bit mask.
const MASK_THRESHOLD: u8 = 128;

/// Converts an image of exactly the icon type's dimensions into the payload
/// for that type.  Returns an error if the dimensions do not match.
pub fn planarize(image: &Image, icon_type: IconType) -> IconResult<Vec<u8>> {
    let width = icon_type.pixel_width();
    let height = icon_type.pixel_height();
    if image.width() != width || image.height() != height {
        let msg = format!(
            "image is {}x{}, but '{}' requires {}x{}",
            image.width(),
            image.height(),
            icon_type.ostype(),
            width,
            height
        );
        return Err(IconError::InvalidSource(msg));
    }
    let rgba = image.to_rgba();
    let pixels = rgba.data().chunks_exact(4);
    let data = match icon_type.encoding() {
        Encoding::ARGB32 | Encoding::Data32 => pixels
            .flat_map(|px| [px[3], px[0], px[1], px[2]])
            .collect(),
        Encoding::Mask8 => pixels.map(|px| px[3]).collect(),
        Encoding::Indexed8 => pixels
            .map(|px| nearest_index(&SYSTEM_PALETTE_8, over_white(px)))
            .collect(),
        Encoding::Indexed4 => {
            let indices: Vec<u8> = pixels
                .map(|px| nearest_index(&SYSTEM_PALETTE_4, over_white(px)))
                .collect();
            indices
                .chunks(2)
                .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
                .collect()
        }
        Encoding::Mono1 => {
            let ink: Vec<bool> = rgba
                .data()
                .chunks_exact(4)
                .map(|px| {
                    let [r, g, b] = over_white(px);
                    luminance(r, g, b) < 128
                })
                .collect();
            let opaque: Vec<bool> = rgba
                .data()
                .chunks_exact(4)
                .map(|px| px[3] >= MASK_THRESHOLD)
                .collect();
            let mut data = pack_bits(&ink);
            data.extend(pack_bits(&opaque));
            data
        }
    };
    Ok(data)
}

/// Converts an uncompressed payload for the given icon type back into an
/// RGBA image.  Returns an error if the payload has the wrong length.
pub fn unplanarize(data: &[u8], icon_type: IconType) -> IconResult<Image> {
    let expected = icon_type.data_length();
    if data.len() != expected {
        let msg = format!(
            "wrong data payload length for '{}' ({} instead of {})",
            icon_type.ostype(),
            data.len(),
            expected
        );
        return Err(IconError::Format(msg));
    }
    let width = icon_type.pixel_width();
    let height = icon_type.pixel_height();
    let num_pixels = (width * height) as usize;
    let mut rgba = Vec::with_capacity(num_pixels * 4);
    match icon_type.encoding() {
        Encoding::ARGB32 | Encoding::Data32 => {
            for px in data.chunks_exact(4) {
                rgba.extend_from_slice(&[px[1], px[2], px[3], px[0]]);
            }
        }
        Encoding::Mask8 => {
            let image = Image::from_data(PixelFormat::Alpha, width, height, data.to_vec())?;
            return Ok(image.to_rgba());
        }
        Encoding::Indexed8 => {
            for &index in data {
                let [r, g, b] = SYSTEM_PALETTE_8[index as usize];
                rgba.extend_from_slice(&[r, g, b, u8::MAX]);
            }
        }
        Encoding::Indexed4 => {
            for &byte in data {
                for index in [byte >> 4, byte & 0x0f] {
                    let [r, g, b] = SYSTEM_PALETTE_4[index as usize];
                    rgba.extend_from_slice(&[r, g, b, u8::MAX]);
                }
            }
        }
        Encoding::Mono1 => {
            let (ink, opaque) = data.split_at(data.len() / 2);
            for pixel in 0..num_pixels {
                let value = if bit_at(ink, pixel) { 0 } else { u8::MAX };
                let alpha = if bit_at(opaque, pixel) { u8::MAX } else { 0 };
                rgba.extend_from_slice(&[value, value, value, alpha]);
            }
        }
    }
    Image::from_data(PixelFormat::RGBA, width, height, rgba)
}

/// Extracts the 1-bit mask plane of a `Mono1` payload as an alpha image.
pub(crate) fn mono_mask(data: &[u8], icon_type: IconType) -> IconResult<Image> {
    let image = unplanarize(data, icon_type)?;
    Ok(image.convert_to(PixelFormat::Alpha))
}

/// Composites a straight-alpha pixel over a white background.
fn over_white(px: &[u8]) -> [u8; 3] {
    let alpha = u32::from(px[3]);
    let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
    [blend(px[0]), blend(px[1]), blend(px[2])]
}

/// Packs booleans into bytes, most significant bit first.
fn pack_bits(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &set)| if set { byte | (0x80 >> i) } else { byte })
        })
        .collect()
}

fn bit_at(plane: &[u8], index: usize) -> bool {
    plane[index / 8] & (0x80 >> (index % 8)) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Image {
        let data = rgba.repeat((width * height) as usize);
        Image::from_data(PixelFormat::RGBA, width, height, data).unwrap()
    }

    #[test]
    fn data32_is_argb() {
        let image = solid(16, 16, [10, 20, 30, 40]);
        let data = planarize(&image, IconType::Data32_16x16).unwrap();
        assert_eq!(data.len(), 16 * 16 * 4);
        assert_eq!(&data[0..4], &[40, 10, 20, 30]);
        assert_eq!(unplanarize(&data, IconType::Data32_16x16).unwrap(), image);
    }

    #[test]
    fn mask8_keeps_alpha() {
        let image = solid(32, 32, [1, 2, 3, 200]);
        let data = planarize(&image, IconType::Mask8_32x32).unwrap();
        assert_eq!(data, vec![200; 32 * 32]);
    }

    #[test]
    fn indexed_payloads_survive_a_round_trip() {
        let mut data = Vec::new();
        for i in 0..(32 * 32) {
            data.push((i % 256) as u8);
        }
        let image = unplanarize(&data, IconType::Indexed8_32x32).unwrap();
        assert_eq!(planarize(&image, IconType::Indexed8_32x32).unwrap(), data);

        let nibbles: Vec<u8> = (0..(16 * 12 / 2)).map(|i| (i * 37 % 256) as u8).collect();
        let image = unplanarize(&nibbles, IconType::Indexed4_16x12).unwrap();
        assert_eq!(planarize(&image, IconType::Indexed4_16x12).unwrap(), nibbles);
    }

    #[test]
    fn mono_planes() {
        let mut image = solid(16, 16, [0, 0, 0, 255]);
        // Make the first pixel a transparent white one.
        image.data_mut()[0..4].copy_from_slice(&[255, 255, 255, 0]);
        let data = planarize(&image, IconType::Mono1_16x16).unwrap();
        assert_eq!(data.len(), 64);
        assert_eq!(data[0], 0x7f);
        assert_eq!(data[1], 0xff);
        assert_eq!(data[32], 0x7f);
        assert_eq!(data[33], 0xff);
        let decoded = unplanarize(&data, IconType::Mono1_16x16).unwrap();
        assert_eq!(&decoded.data()[0..8], &[255, 255, 255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn transparent_pixels_index_as_white() {
        let image = solid(16, 16, [0, 0, 0, 0]);
        let data = planarize(&image, IconType::Indexed8_16x16).unwrap();
        assert!(data.iter().all(|&index| index == 0));
    }

    #[test]
    fn wrong_sizes_are_rejected() {
        let image = solid(16, 16, [0, 0, 0, 255]);
        assert!(matches!(
            planarize(&image, IconType::Data32_32x32),
            Err(IconError::InvalidSource(_))
        ));
        assert!(matches!(
            unplanarize(&[0; 10], IconType::Mask8_16x16),
            Err(IconError::Format(_))
        ));
    }
}
