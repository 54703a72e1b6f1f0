//! Selection of the element types an icon family should be generated with.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::icontype::{IconType, Tier};

/// A set of icon element types, built from the named selectors below.
///
/// Each tier owns one byte of the set: bit 0 is 32-bit data, bit 1 is 8-bit
/// indexed data, bit 2 is the 8-bit mask, bit 3 is 1-bit data with its mask
/// and bit 4 is 4-bit indexed data.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct ElementSpecSet(u64);

impl ElementSpecSet {
    /// No elements at all.
    pub const EMPTY: ElementSpecSet = ElementSpecSet(0);

    /// The 32x32 32-bit data element.
    pub const LARGE_32BIT_DATA: ElementSpecSet = ElementSpecSet(0x01);
    /// The 32x32 8-bit indexed data element.
    pub const LARGE_8BIT_DATA: ElementSpecSet = ElementSpecSet(0x02);
    /// The 32x32 8-bit mask element.
    pub const LARGE_8BIT_MASK: ElementSpecSet = ElementSpecSet(0x04);
    /// The 32x32 1-bit data and mask element.
    pub const LARGE_1BIT_MASK: ElementSpecSet = ElementSpecSet(0x08);
    /// The 32x32 4-bit indexed data element.
    pub const LARGE_4BIT_DATA: ElementSpecSet = ElementSpecSet(0x10);
    /// Every 32x32 element.
    pub const ALL_LARGE: ElementSpecSet = ElementSpecSet(0x1f);

    /// The 16x16 32-bit data element.
    pub const SMALL_32BIT_DATA: ElementSpecSet = ElementSpecSet(0x01 << 8);
    /// The 16x16 8-bit indexed data element.
    pub const SMALL_8BIT_DATA: ElementSpecSet = ElementSpecSet(0x02 << 8);
    /// The 16x16 8-bit mask element.
    pub const SMALL_8BIT_MASK: ElementSpecSet = ElementSpecSet(0x04 << 8);
    /// The 16x16 1-bit data and mask element.
    pub const SMALL_1BIT_MASK: ElementSpecSet = ElementSpecSet(0x08 << 8);
    /// The 16x16 4-bit indexed data element.
    pub const SMALL_4BIT_DATA: ElementSpecSet = ElementSpecSet(0x10 << 8);
    /// Every 16x16 element.
    pub const ALL_SMALL: ElementSpecSet = ElementSpecSet(0x1f << 8);

    /// The 16x12 8-bit indexed data element.
    pub const MINI_8BIT_DATA: ElementSpecSet = ElementSpecSet(0x02 << 16);
    /// The 16x12 1-bit data and mask element.
    pub const MINI_1BIT_MASK: ElementSpecSet = ElementSpecSet(0x08 << 16);
    /// The 16x12 4-bit indexed data element.
    pub const MINI_4BIT_DATA: ElementSpecSet = ElementSpecSet(0x10 << 16);
    /// Every 16x12 element.
    pub const ALL_MINI: ElementSpecSet = ElementSpecSet(0x1a << 16);

    /// The 48x48 32-bit data element.
    pub const HUGE_32BIT_DATA: ElementSpecSet = ElementSpecSet(0x01 << 24);
    /// The 48x48 8-bit indexed data element.
    pub const HUGE_8BIT_DATA: ElementSpecSet = ElementSpecSet(0x02 << 24);
    /// The 48x48 8-bit mask element.
    pub const HUGE_8BIT_MASK: ElementSpecSet = ElementSpecSet(0x04 << 24);
    /// The 48x48 1-bit data and mask element.
    pub const HUGE_1BIT_MASK: ElementSpecSet = ElementSpecSet(0x08 << 24);
    /// The 48x48 4-bit indexed data element.
    pub const HUGE_4BIT_DATA: ElementSpecSet = ElementSpecSet(0x10 << 24);
    /// Every 48x48 element.
    pub const ALL_HUGE: ElementSpecSet = ElementSpecSet(0x1f << 24);

    /// The 128x128 32-bit data element.
    pub const THUMBNAIL_32BIT_DATA: ElementSpecSet = ElementSpecSet(0x01 << 32);
    /// The 128x128 8-bit mask element.
    pub const THUMBNAIL_8BIT_MASK: ElementSpecSet = ElementSpecSet(0x04 << 32);
    /// Every 128x128 element.
    pub const ALL_THUMBNAIL: ElementSpecSet = ElementSpecSet(0x05 << 32);

    /// The 256x256 ARGB element.
    pub const ARGB_256: ElementSpecSet = ElementSpecSet(0x01 << 40);
    /// The 512x512 ARGB element.
    pub const ARGB_512: ElementSpecSet = ElementSpecSet(0x01 << 48);

    /// The 32-bit data and 8-bit mask pairs of every tier that has them.
    pub const ALL_NEW_AVAILABLE: ElementSpecSet = ElementSpecSet(
        Self::LARGE_32BIT_DATA.0
            | Self::LARGE_8BIT_MASK.0
            | Self::SMALL_32BIT_DATA.0
            | Self::SMALL_8BIT_MASK.0
            | Self::HUGE_32BIT_DATA.0
            | Self::HUGE_8BIT_MASK.0
            | Self::THUMBNAIL_32BIT_DATA.0
            | Self::THUMBNAIL_8BIT_MASK.0,
    );

    /// The indexed and 1-bit elements understood by the oldest systems.
    pub const ALL_OLD_AVAILABLE: ElementSpecSet = ElementSpecSet(
        Self::LARGE_8BIT_DATA.0
            | Self::LARGE_1BIT_MASK.0
            | Self::LARGE_4BIT_DATA.0
            | Self::SMALL_8BIT_DATA.0
            | Self::SMALL_1BIT_MASK.0
            | Self::SMALL_4BIT_DATA.0
            | Self::ALL_MINI.0
            | Self::HUGE_8BIT_DATA.0
            | Self::HUGE_1BIT_MASK.0
            | Self::HUGE_4BIT_DATA.0,
    );

    /// Every element type this library can generate.
    pub const ALL_AVAILABLE: ElementSpecSet = ElementSpecSet(
        Self::ALL_LARGE.0
            | Self::ALL_SMALL.0
            | Self::ALL_MINI.0
            | Self::ALL_HUGE.0
            | Self::ALL_THUMBNAIL.0
            | Self::ARGB_256.0
            | Self::ARGB_512.0,
    );

    /// Returns the selector for a single icon type.
    pub fn of(icon_type: IconType) -> ElementSpecSet {
        let shift = match icon_type.tier() {
            Tier::Large => 0,
            Tier::Small => 8,
            Tier::Mini => 16,
            Tier::Huge => 24,
            Tier::Thumbnail => 32,
            Tier::Thumbnail256 => 40,
            Tier::Thumbnail512 => 48,
        };
        let bit: u64 = match icon_type.depth() {
            32 => 0x01,
            8 if icon_type.is_mask() => 0x04,
            8 => 0x02,
            4 => 0x10,
            _ => 0x08,
        };
        ElementSpecSet(bit << shift)
    }

    /// Builds a selector from raw bits.  Bits that name no icon type are
    /// dropped.
    pub fn from_bits(bits: u64) -> ElementSpecSet {
        ElementSpecSet(bits & Self::ALL_AVAILABLE.0)
    }

    /// Returns the raw bits of this selector.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if no icon type is selected.
    pub fn is_empty(self) -> bool {
        self.0 & Self::ALL_AVAILABLE.0 == 0
    }

    /// Returns true if every type in `other` is also in `self`.
    pub fn contains(self, other: ElementSpecSet) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if the given icon type is selected.
    pub fn includes(self, icon_type: IconType) -> bool {
        self.contains(ElementSpecSet::of(icon_type))
    }

    /// Returns the selected icon types, largest tier first.
    pub fn icon_types(self) -> Vec<IconType> {
        IconType::ALL
            .iter()
            .copied()
            .filter(|&icon_type| self.includes(icon_type))
            .collect()
    }
}

impl BitOr for ElementSpecSet {
    type Output = ElementSpecSet;

    fn bitor(self, rhs: ElementSpecSet) -> ElementSpecSet {
        ElementSpecSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for ElementSpecSet {
    fn bitor_assign(&mut self, rhs: ElementSpecSet) {
        self.0 |= rhs.0;
    }
}

impl From<IconType> for ElementSpecSet {
    fn from(icon_type: IconType) -> ElementSpecSet {
        ElementSpecSet::of(icon_type)
    }
}

impl fmt::Debug for ElementSpecSet {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<String> =
            self.icon_types().iter().map(|icon_type| icon_type.ostype().to_string()).collect();
        write!(out, "ElementSpecSet({:#x}: {})", self.0, names.join(" "))
    }
}
