use std::fmt;
use std::str::FromStr;

/// Types of icon elements that can be decoded as images or masks.
///
/// Each type corresponds to one legacy `.icns` element tag and fixes the
/// pixel size, depth and role of the element's payload.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum IconType {
    /// 512x512 32-bit ARGB icon, alpha included.
    ARGB32_512x512,
    /// 256x256 32-bit ARGB icon, alpha included.
    ARGB32_256x256,
    /// 128x128 32-bit "thumbnail" icon data (masked by `Mask8_128x128`).
    Data32_128x128,
    /// 128x128 8-bit alpha mask.
    Mask8_128x128,
    /// 48x48 32-bit icon data (masked by `Mask8_48x48`).
    Data32_48x48,
    /// 48x48 8-bit alpha mask.
    Mask8_48x48,
    /// 48x48 8-bit indexed icon data.
    Indexed8_48x48,
    /// 48x48 4-bit indexed icon data.
    Indexed4_48x48,
    /// 48x48 1-bit icon data followed by its 1-bit mask.
    Mono1_48x48,
    /// 32x32 32-bit icon data (masked by `Mask8_32x32`).
    Data32_32x32,
    /// 32x32 8-bit alpha mask.
    Mask8_32x32,
    /// 32x32 8-bit indexed icon data.
    Indexed8_32x32,
    /// 32x32 4-bit indexed icon data.
    Indexed4_32x32,
    /// 32x32 1-bit icon data followed by its 1-bit mask.
    Mono1_32x32,
    /// 16x16 32-bit icon data (masked by `Mask8_16x16`).
    Data32_16x16,
    /// 16x16 8-bit alpha mask.
    Mask8_16x16,
    /// 16x16 8-bit indexed icon data.
    Indexed8_16x16,
    /// 16x16 4-bit indexed icon data.
    Indexed4_16x16,
    /// 16x16 1-bit icon data followed by its 1-bit mask.
    Mono1_16x16,
    /// 16x12 "mini" 8-bit indexed icon data.
    Indexed8_16x12,
    /// 16x12 "mini" 4-bit indexed icon data.
    Indexed4_16x12,
    /// 16x12 "mini" 1-bit icon data followed by its 1-bit mask.
    Mono1_16x12,
}

impl IconType {
    /// Every supported icon type, largest tier first.  Icon families are
    /// generated in this order.
    pub const ALL: [IconType; 22] = [
        IconType::ARGB32_512x512,
        IconType::ARGB32_256x256,
        IconType::Data32_128x128,
        IconType::Mask8_128x128,
        IconType::Data32_48x48,
        IconType::Mask8_48x48,
        IconType::Indexed8_48x48,
        IconType::Indexed4_48x48,
        IconType::Mono1_48x48,
        IconType::Data32_32x32,
        IconType::Mask8_32x32,
        IconType::Indexed8_32x32,
        IconType::Indexed4_32x32,
        IconType::Mono1_32x32,
        IconType::Data32_16x16,
        IconType::Mask8_16x16,
        IconType::Indexed8_16x16,
        IconType::Indexed4_16x16,
        IconType::Mono1_16x16,
        IconType::Indexed8_16x12,
        IconType::Indexed4_16x12,
        IconType::Mono1_16x12,
    ];

    /// Get the icon type associated with the given OSType, if any.
    pub fn from_ostype(ostype: OSType) -> Option<IconType> {
        IconType::ALL.iter().copied().find(|icon_type| icon_type.ostype() == ostype)
    }

    /// Get the OSType that represents this icon type.
    pub fn ostype(self) -> OSType {
        let raw = match self {
            IconType::ARGB32_512x512 => b"ic09",
            IconType::ARGB32_256x256 => b"ic08",
            IconType::Data32_128x128 => b"it32",
            IconType::Mask8_128x128 => b"t8mk",
            IconType::Data32_48x48 => b"ih32",
            IconType::Mask8_48x48 => b"h8mk",
            IconType::Indexed8_48x48 => b"ich8",
            IconType::Indexed4_48x48 => b"ich4",
            IconType::Mono1_48x48 => b"ich#",
            IconType::Data32_32x32 => b"il32",
            IconType::Mask8_32x32 => b"l8mk",
            IconType::Indexed8_32x32 => b"icl8",
            IconType::Indexed4_32x32 => b"icl4",
            IconType::Mono1_32x32 => b"ICN#",
            IconType::Data32_16x16 => b"is32",
            IconType::Mask8_16x16 => b"s8mk",
            IconType::Indexed8_16x16 => b"ics8",
            IconType::Indexed4_16x16 => b"ics4",
            IconType::Mono1_16x16 => b"ics#",
            IconType::Indexed8_16x12 => b"icm8",
            IconType::Indexed4_16x12 => b"icm4",
            IconType::Mono1_16x12 => b"icm#",
        };
        OSType(*raw)
    }

    /// Returns the size tier this icon type belongs to.
    pub fn tier(self) -> Tier {
        match self {
            IconType::ARGB32_512x512 => Tier::Thumbnail512,
            IconType::ARGB32_256x256 => Tier::Thumbnail256,
            IconType::Data32_128x128 | IconType::Mask8_128x128 => Tier::Thumbnail,
            IconType::Data32_48x48
            | IconType::Mask8_48x48
            | IconType::Indexed8_48x48
            | IconType::Indexed4_48x48
            | IconType::Mono1_48x48 => Tier::Huge,
            IconType::Data32_32x32
            | IconType::Mask8_32x32
            | IconType::Indexed8_32x32
            | IconType::Indexed4_32x32
            | IconType::Mono1_32x32 => Tier::Large,
            IconType::Data32_16x16
            | IconType::Mask8_16x16
            | IconType::Indexed8_16x16
            | IconType::Indexed4_16x16
            | IconType::Mono1_16x16 => Tier::Small,
            IconType::Indexed8_16x12 | IconType::Indexed4_16x12 | IconType::Mono1_16x12 => {
                Tier::Mini
            }
        }
    }

    /// Returns the pixel width of this icon type.
    ///
    /// # Examples
    /// ```
    /// use wonderbox_icons::IconType;
    /// assert_eq!(IconType::Mask8_128x128.pixel_width(), 128);
    /// assert_eq!(IconType::Indexed8_16x12.pixel_width(), 16);
    /// ```
    pub fn pixel_width(self) -> u32 {
        self.tier().pixel_width()
    }

    /// Returns the pixel height of this icon type.
    ///
    /// # Examples
    /// ```
    /// use wonderbox_icons::IconType;
    /// assert_eq!(IconType::ARGB32_256x256.pixel_height(), 256);
    /// assert_eq!(IconType::Mono1_16x12.pixel_height(), 12);
    /// ```
    pub fn pixel_height(self) -> u32 {
        self.tier().pixel_height()
    }

    /// Returns the encoding used within an ICNS file for this icon type.
    pub fn encoding(self) -> Encoding {
        match self {
            IconType::ARGB32_512x512 | IconType::ARGB32_256x256 => Encoding::ARGB32,
            IconType::Data32_128x128
            | IconType::Data32_48x48
            | IconType::Data32_32x32
            | IconType::Data32_16x16 => Encoding::Data32,
            IconType::Mask8_128x128
            | IconType::Mask8_48x48
            | IconType::Mask8_32x32
            | IconType::Mask8_16x16 => Encoding::Mask8,
            IconType::Indexed8_48x48
            | IconType::Indexed8_32x32
            | IconType::Indexed8_16x16
            | IconType::Indexed8_16x12 => Encoding::Indexed8,
            IconType::Indexed4_48x48
            | IconType::Indexed4_32x32
            | IconType::Indexed4_16x16
            | IconType::Indexed4_16x12 => Encoding::Indexed4,
            IconType::Mono1_48x48
            | IconType::Mono1_32x32
            | IconType::Mono1_16x16
            | IconType::Mono1_16x12 => Encoding::Mono1,
        }
    }

    /// Returns the number of bits stored per pixel for the image plane of
    /// this icon type.
    pub fn depth(self) -> u32 {
        match self.encoding() {
            Encoding::ARGB32 | Encoding::Data32 => 32,
            Encoding::Mask8 | Encoding::Indexed8 => 8,
            Encoding::Indexed4 => 4,
            Encoding::Mono1 => 1,
        }
    }

    /// Returns true if this is a pure mask type.
    pub fn is_mask(self) -> bool {
        self.encoding() == Encoding::Mask8
    }

    /// Returns the type of the element that holds the mask for this icon
    /// type, if it is stored separately.  ARGB and 1-bit types carry their
    /// own mask; masks have no mask.
    pub fn mask_type(self) -> Option<IconType> {
        match self {
            IconType::Data32_128x128 => Some(IconType::Mask8_128x128),
            IconType::Data32_48x48 => Some(IconType::Mask8_48x48),
            IconType::Data32_32x32 => Some(IconType::Mask8_32x32),
            IconType::Data32_16x16 => Some(IconType::Mask8_16x16),
            IconType::Indexed8_48x48 | IconType::Indexed4_48x48 => Some(IconType::Mono1_48x48),
            IconType::Indexed8_32x32 | IconType::Indexed4_32x32 => Some(IconType::Mono1_32x32),
            IconType::Indexed8_16x16 | IconType::Indexed4_16x16 => Some(IconType::Mono1_16x16),
            IconType::Indexed8_16x12 | IconType::Indexed4_16x12 => Some(IconType::Mono1_16x12),
            _ => None,
        }
    }

    /// Returns the length in bytes of an uncompressed payload for this icon
    /// type.
    ///
    /// # Examples
    /// ```
    /// use wonderbox_icons::IconType;
    /// assert_eq!(IconType::Data32_32x32.data_length(), 32 * 32 * 4);
    /// assert_eq!(IconType::Indexed4_16x16.data_length(), 128);
    /// assert_eq!(IconType::Mono1_32x32.data_length(), 256);
    /// ```
    pub fn data_length(self) -> usize {
        let pixels = (self.pixel_width() * self.pixel_height()) as usize;
        match self.encoding() {
            Encoding::ARGB32 | Encoding::Data32 => pixels * 4,
            Encoding::Mask8 | Encoding::Indexed8 => pixels,
            Encoding::Indexed4 => pixels / 2,
            Encoding::Mono1 => pixels / 4,
        }
    }
}

/// Size tiers of an icon family.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Tier {
    /// 16x12 pixels.
    Mini,
    /// 16x16 pixels.
    Small,
    /// 32x32 pixels.
    Large,
    /// 48x48 pixels.
    Huge,
    /// 128x128 pixels.
    Thumbnail,
    /// 256x256 pixels.
    Thumbnail256,
    /// 512x512 pixels.
    Thumbnail512,
}

impl Tier {
    /// Returns the pixel width of icons in this tier.
    pub fn pixel_width(self) -> u32 {
        match self {
            Tier::Mini | Tier::Small => 16,
            Tier::Large => 32,
            Tier::Huge => 48,
            Tier::Thumbnail => 128,
            Tier::Thumbnail256 => 256,
            Tier::Thumbnail512 => 512,
        }
    }

    /// Returns the pixel height of icons in this tier.
    pub fn pixel_height(self) -> u32 {
        match self {
            Tier::Mini => 12,
            _ => self.pixel_width(),
        }
    }
}

/// Named overlay variants that an icon family can nest.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VariantKind {
    /// Tile variant (`tile`).
    Tile,
    /// Rollover variant (`over`).
    Rollover,
    /// Drop target variant (`drop`).
    Drop,
    /// Open variant (`open`).
    Open,
    /// Open drop target variant (`odrp`).
    OpenDrop,
}

impl VariantKind {
    /// Every variant kind.
    pub const ALL: [VariantKind; 5] = [
        VariantKind::Tile,
        VariantKind::Rollover,
        VariantKind::Drop,
        VariantKind::Open,
        VariantKind::OpenDrop,
    ];

    /// Get the variant kind associated with the given OSType, if any.
    pub fn from_ostype(ostype: OSType) -> Option<VariantKind> {
        VariantKind::ALL.iter().copied().find(|kind| kind.ostype() == ostype)
    }

    /// Get the OSType of the element holding this variant.
    pub fn ostype(self) -> OSType {
        let raw = match self {
            VariantKind::Tile => b"tile",
            VariantKind::Rollover => b"over",
            VariantKind::Drop => b"drop",
            VariantKind::Open => b"open",
            VariantKind::OpenDrop => b"odrp",
        };
        OSType(*raw)
    }
}

/// A Macintosh OSType (also known as a ResType), used in ICNS files to
/// identify the type of each icon element.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OSType(pub [u8; 4]);

impl fmt::Display for OSType {
    fn fmt(&self, out: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let &OSType(raw) = self;
        for &byte in &raw {
            write!(out, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

impl FromStr for OSType {
    type Err = String;

    fn from_str(input: &str) -> Result<OSType, String> {
        let bytes = input.as_bytes();
        if bytes.len() != 4 {
            Err(format!("OSType string must be 4 bytes (was {})", bytes.len()))
        } else {
            let mut raw = [0u8; 4];
            raw.clone_from_slice(bytes);
            Ok(OSType(raw))
        }
    }
}

/// Method of encoding an image within an icon element.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Encoding {
    /// Uncompressed ARGB with a meaningful alpha byte; PNG or JPEG 2000
    /// payloads are also accepted when decoding.
    ARGB32,
    /// Uncompressed ARGB, alpha normally supplied by a separate 8-bit mask;
    /// RLE-compressed 24-bit RGB is also accepted when decoding.
    Data32,
    /// Uncompressed 8-bit alpha mask.
    Mask8,
    /// 8-bit indices into the system palette.
    Indexed8,
    /// 4-bit indices into the system palette, two pixels per byte.
    Indexed4,
    /// 1-bit image plane followed by a 1-bit mask plane.
    Mono1,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn icon_type_ostype_round_trip() {
        for icon_type in &IconType::ALL {
            let ostype = icon_type.ostype();
            let from = IconType::from_ostype(ostype);
            assert_eq!(Some(*icon_type), from);
        }
    }

    #[test]
    fn unknown_ostype_is_not_an_icon_type() {
        assert_eq!(IconType::from_ostype(OSType(*b"quux")), None);
        assert_eq!(IconType::from_ostype(OSType(*b"tile")), None);
    }

    #[test]
    fn masks_share_tier_with_their_data() {
        for icon_type in &IconType::ALL {
            if let Some(mask_type) = icon_type.mask_type() {
                assert_eq!(icon_type.tier(), mask_type.tier());
                assert!(mask_type.mask_type().is_none());
            }
        }
    }

    #[test]
    fn variant_kind_round_trip() {
        for kind in &VariantKind::ALL {
            assert_eq!(VariantKind::from_ostype(kind.ostype()), Some(*kind));
        }
        assert_eq!(VariantKind::OpenDrop.ostype(), OSType(*b"odrp"));
    }

    #[test]
    fn ostype_to_and_from_str() {
        let ostype = OSType::from_str("abcd").expect("failed to parse OSType");
        assert_eq!(ostype.to_string(), "abcd".to_string());
        assert_eq!(OSType(*b"ICN#").to_string(), "ICN#");
    }

    #[test]
    fn ostype_from_str_failure() {
        assert_eq!(
            OSType::from_str("abc"),
            Err("OSType string must be 4 bytes (was 3)".to_string())
        );
        assert_eq!(
            OSType::from_str("abcde"),
            Err("OSType string must be 4 bytes (was 5)".to_string())
        );
    }
}
