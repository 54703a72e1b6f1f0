//! Library for reading, writing and generating Apple Icon Image (.icns)
//! families, and for attaching them to files and folders as custom icons.
//!
//! See https://en.wikipedia.org/wiki/Apple_Icon_Image_format for more
//! information about the file format.
//!
//! # Generating a family
//!
//! ```
//! use wonderbox_icons::{ElementSpecSet, IconFamily, Image, PixelFormat};
//!
//! let source = Image::new(PixelFormat::RGBA, 64, 64);
//! let family = IconFamily::from_image(&source, ElementSpecSet::ALL_LARGE).unwrap();
//! assert_eq!(family.elements().len(), 5);
//! let bytes = family.to_bytes().unwrap();
//! assert_eq!(IconFamily::from_bytes(&bytes).unwrap(), family);
//! ```
//!
//! # Custom icons
//!
//! [`IconBinder`] attaches a family to a path through a [`CustomIconStore`].
//! [`FsIconStore`] writes the layout macOS uses on volumes without native
//! resource forks: an AppleDouble sidecar for files, a hidden `Icon\r` file
//! for folders and `.VolumeIcon.icns` at the root of a volume.

#![warn(missing_docs)]

pub mod appledouble;
mod binder;
mod element;
mod error;
mod family;
mod icontype;
mod image;
#[cfg(feature = "jp2io")]
mod jp2io;
pub mod palette;
mod planar;
#[cfg(feature = "pngio")]
mod pngio;
mod resample;
pub mod resfork;
mod selector;
mod store;

pub use self::binder::{remove_custom_icon, set_custom_icon, IconBinder};
pub use self::element::IconElement;
pub use self::error::{BindStep, IconError, IconResult};
pub use self::family::IconFamily;
pub use self::icontype::{Encoding, IconType, OSType, Tier, VariantKind};
pub use self::image::{Image, PixelFormat};
pub use self::planar::{planarize, unplanarize};
pub use self::resample::{
    generate_elements, resample, DefaultResizer, Fit, Interpolation, ResizeStrategy,
};
pub use self::selector::ElementSpecSet;
pub use self::store::{
    CustomIconStore, FsIconStore, IconSlot, MemoryIconStore, TargetKind, FOLDER_ICON_FILE_NAME,
    VOLUME_ICON_FILE_NAME,
};
