//! Resizing source images to icon element sizes and generating whole icon
//! families from a single source image.

use ::image::imageops::{self, FilterType};
use ::image::{Rgba, RgbaImage};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

use super::error::{IconError, IconResult};
use super::family::IconFamily;
use super::image::{Image, PixelFormat};
use super::planar::planarize;
use super::selector::ElementSpecSet;

/// Scales a source image to an exact pixel size.
///
/// Implementations must return an image of exactly `width` by `height`
/// pixels; any pixel format is accepted and converted to RGBA afterwards.
pub trait ResizeStrategy {
    /// Produces a `width` by `height` rendition of `source`.
    fn resize(&self, source: &Image, width: u32, height: u32) -> IconResult<Image>;
}

/// Resampling filter used by [`DefaultResizer`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Interpolation {
    /// Nearest neighbor.
    Nearest,
    /// Bilinear.
    Bilinear,
    /// Bicubic (Catmull-Rom).
    Bicubic,
    /// Lanczos with a window of 3.
    #[default]
    Lanczos,
}

impl Interpolation {
    fn filter_type(self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Bilinear => FilterType::Triangle,
            Interpolation::Bicubic => FilterType::CatmullRom,
            Interpolation::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// How a source image is fitted into a target of a different aspect ratio.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Fit {
    /// Scale proportionally and center on a transparent canvas.
    #[default]
    Contain,
    /// Scale each axis independently to fill the target.
    Stretch,
}

/// The built-in resize strategy, backed by the `image` crate.
///
/// Scaling happens on premultiplied pixels so that fully transparent areas
/// do not bleed into their neighbours.  A source that already has the target
/// size is returned unchanged.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DefaultResizer {
    /// Resampling filter.
    pub interpolation: Interpolation,
    /// Aspect ratio handling.
    pub fit: Fit,
}

impl DefaultResizer {
    /// Creates a resizer with the given filter and the default fit.
    pub fn with_interpolation(interpolation: Interpolation) -> DefaultResizer {
        DefaultResizer {
            interpolation,
            ..DefaultResizer::default()
        }
    }
}

impl ResizeStrategy for DefaultResizer {
    fn resize(&self, source: &Image, width: u32, height: u32) -> IconResult<Image> {
        if source.width() == width && source.height() == height {
            return Ok(source.to_rgba());
        }
        let mut premultiplied = source.to_rgba_image()?;
        premultiplied.pixels_mut().for_each(premultiply);
        let filter = self.interpolation.filter_type();
        let mut scaled = match self.fit {
            Fit::Stretch => imageops::resize(&premultiplied, width, height, filter),
            Fit::Contain => {
                let scale = f64::min(
                    f64::from(width) / f64::from(source.width()),
                    f64::from(height) / f64::from(source.height()),
                );
                let scaled_width = scaled_extent(source.width(), scale, width);
                let scaled_height = scaled_extent(source.height(), scale, height);
                let resized = imageops::resize(&premultiplied, scaled_width, scaled_height, filter);
                let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
                let dx = i64::from((width - scaled_width) / 2);
                let dy = i64::from((height - scaled_height) / 2);
                imageops::replace(&mut canvas, &resized, dx, dy);
                canvas
            }
        };
        scaled.pixels_mut().for_each(unpremultiply);
        Ok(Image::from_rgba_image(scaled))
    }
}

fn scaled_extent(extent: u32, scale: f64, limit: u32) -> u32 {
    ((f64::from(extent) * scale).round() as u32).clamp(1, limit)
}

fn premultiply(pixel: &mut Rgba<u8>) {
    let alpha = u32::from(pixel[3]);
    for channel in 0..3 {
        pixel[channel] = ((u32::from(pixel[channel]) * alpha + 127) / 255) as u8;
    }
}

fn unpremultiply(pixel: &mut Rgba<u8>) {
    let alpha = u32::from(pixel[3]);
    if alpha == 0 {
        pixel.0 = [0, 0, 0, 0];
        return;
    }
    for channel in 0..3 {
        let value = (u32::from(pixel[channel]) * 255 + alpha / 2) / alpha;
        pixel[channel] = value.min(255) as u8;
    }
}

/// Checks that a source image can be rasterized at all.
fn check_source(source: &Image) -> IconResult<()> {
    if source.width() == 0 || source.height() == 0 {
        let msg = format!(
            "source image has zero area ({}x{})",
            source.width(),
            source.height()
        );
        return Err(IconError::InvalidSource(msg));
    }
    Ok(())
}

/// Resizes `source` to exactly `width` by `height` pixels using `strategy`
/// and returns the result as an RGBA image.  Fails if the source has zero
/// area, or if the strategy does not honor the requested size.
pub fn resample(
    source: &Image,
    width: u32,
    height: u32,
    strategy: &dyn ResizeStrategy,
) -> IconResult<Image> {
    check_source(source)?;
    let resized = strategy.resize(source, width, height)?;
    if resized.width() != width || resized.height() != height {
        return Err(IconError::ResizeContractViolation {
            expected_width: width,
            expected_height: height,
            actual_width: resized.width(),
            actual_height: resized.height(),
        });
    }
    if resized.pixel_format() == PixelFormat::RGBA {
        Ok(resized)
    } else {
        Ok(resized.to_rgba())
    }
}

/// Builds an icon family holding exactly the element types in `selector`,
/// each rendered from `source`.  Every distinct pixel size is resampled only
/// once per call.
pub fn generate_elements(
    source: &Image,
    selector: ElementSpecSet,
    strategy: &dyn ResizeStrategy,
) -> IconResult<IconFamily> {
    check_source(source)?;
    let mut bitmaps: HashMap<(u32, u32), Image> = HashMap::new();
    let mut family = IconFamily::new();
    for icon_type in selector.icon_types() {
        let size = (icon_type.pixel_width(), icon_type.pixel_height());
        let bitmap = match bitmaps.entry(size) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(
                    "Resampling {}x{} source to {}x{}",
                    source.width(),
                    source.height(),
                    size.0,
                    size.1
                );
                entry.insert(resample(source, size.0, size.1, strategy)?)
            }
        };
        let data = planarize(bitmap, icon_type)?;
        family.set_element(icon_type.ostype(), data);
    }
    debug!(
        "Generated {} icon element(s) for selector {:?}",
        family.elements().len(),
        selector
    );
    Ok(family)
}
