use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

use super::element::IconElement;
use super::error::{IconError, IconResult};
use super::icontype::{IconType, OSType, VariantKind};
use super::image::Image;
use super::resample::{generate_elements, resample, DefaultResizer, ResizeStrategy};
use super::selector::ElementSpecSet;

/// The first four bytes of an ICNS file:
const ICNS_MAGIC_LITERAL: &[u8; 4] = b"icns";

/// The length of an icon family header, in bytes:
const ICON_FAMILY_HEADER_LENGTH: u32 = 8;

/// A set of icons stored in a single ICNS file.
///
/// Elements keep the order in which they were read or added.  A family read
/// from disk may hold several elements with the same OSType; lookups then
/// see the last one, and [`set_element`](#method.set_element) collapses them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IconFamily {
    elements: Vec<IconElement>,
}

impl IconFamily {
    /// Creates a new, empty icon family.
    pub fn new() -> IconFamily {
        IconFamily { elements: Vec::new() }
    }

    /// Generates an icon family from a single source image, containing
    /// exactly the element types in `selector`.  Uses the default resize
    /// strategy.
    pub fn from_image(source: &Image, selector: ElementSpecSet) -> IconResult<IconFamily> {
        generate_elements(source, selector, &DefaultResizer::default())
    }

    /// Like [`from_image`](#method.from_image), with a caller-supplied
    /// resize strategy.
    pub fn from_image_with(
        source: &Image,
        selector: ElementSpecSet,
        strategy: &dyn ResizeStrategy,
    ) -> IconResult<IconFamily> {
        generate_elements(source, selector, strategy)
    }

    /// Returns true if the icon family contains no icons nor any other
    /// elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the elements of the family, in file order.
    pub fn elements(&self) -> &[IconElement] {
        &self.elements
    }

    /// Returns the element with the given OSType, if any.  If the family
    /// holds duplicates, the last one wins.
    pub fn element(&self, ostype: OSType) -> Option<&IconElement> {
        self.elements.iter().rev().find(|el| el.ostype == ostype)
    }

    /// Returns the payload of the element with the given OSType.
    pub fn get_element(&self, ostype: OSType) -> IconResult<&[u8]> {
        self.element(ostype)
            .map(|el| el.data.as_slice())
            .ok_or(IconError::NotFound(ostype))
    }

    /// Stores `data` under `ostype`.  An existing element with that OSType
    /// is replaced in place and any duplicates of it are dropped; otherwise
    /// the element is appended.
    pub fn set_element(&mut self, ostype: OSType, data: Vec<u8>) {
        match self.elements.iter().position(|el| el.ostype == ostype) {
            Some(index) => {
                self.elements[index].data = data;
                let mut position = 0;
                self.elements.retain(|el| {
                    let keep = position <= index || el.ostype != ostype;
                    position += 1;
                    keep
                });
            }
            None => self.elements.push(IconElement::new(ostype, data)),
        }
    }

    /// Removes every element with the given OSType, returning the last one
    /// removed.
    pub fn remove_element(&mut self, ostype: OSType) -> Option<IconElement> {
        let mut removed = None;
        let mut kept = Vec::with_capacity(self.elements.len());
        for element in self.elements.drain(..) {
            if element.ostype == ostype {
                removed = Some(element);
            } else {
                kept.push(element);
            }
        }
        self.elements = kept;
        removed
    }

    /// Resamples the image to the size of the given icon type and encodes it
    /// into the family.  If the selected type has an associated mask type,
    /// the image mask is stored as well.
    pub fn add_icon_with_type(&mut self, image: &Image, icon_type: IconType) -> IconResult<()> {
        let bitmap = resample(
            image,
            icon_type.pixel_width(),
            icon_type.pixel_height(),
            &DefaultResizer::default(),
        )?;
        let element = IconElement::encode_image_with_type(&bitmap, icon_type)?;
        self.set_element(element.ostype, element.data);
        if let Some(mask_type) = icon_type.mask_type() {
            let mask = IconElement::encode_image_with_type(&bitmap, mask_type)?;
            self.set_element(mask.ostype, mask.data);
        }
        Ok(())
    }

    /// Returns a list of all (non-mask) icon types for which the icon family
    /// contains the necessary element(s) for a complete icon image (including
    /// alpha channel).  These icon types can be passed to the
    /// [`get_icon_with_type`](#method.get_icon_with_type) method to decode the
    /// icons.
    pub fn available_icons(&self) -> Vec<IconType> {
        IconType::ALL
            .iter()
            .copied()
            .filter(|&icon_type| !icon_type.is_mask() && self.has_icon_with_type(icon_type))
            .collect()
    }

    /// Determines whether the icon family contains a complete icon with the
    /// given type (including the mask, if the given icon type has an
    /// associated mask type).
    pub fn has_icon_with_type(&self, icon_type: IconType) -> bool {
        if self.element(icon_type.ostype()).is_none() {
            return false;
        } else if let Some(mask_type) = icon_type.mask_type() {
            return self.element(mask_type.ostype()).is_some();
        }
        true
    }

    /// Decodes an image from the family with the given icon type.  If the
    /// selected type has an associated mask type, the two elements will be
    /// decoded together into a single image.  Returns an error if the
    /// element(s) for the selected type are not present in the icon family, or
    /// the if the encoded data is malformed.
    pub fn get_icon_with_type(&self, icon_type: IconType) -> IconResult<Image> {
        let element = self.find_element(icon_type)?;
        if let Some(mask_type) = icon_type.mask_type() {
            let mask = self.find_element(mask_type)?;
            element.decode_image_with_mask(mask)
        } else {
            element.decode_image()
        }
    }

    fn find_element(&self, icon_type: IconType) -> IconResult<&IconElement> {
        let ostype = icon_type.ostype();
        self.element(ostype).ok_or(IconError::NotFound(ostype))
    }

    /// Returns true if the family nests any variant families.
    pub fn has_variants(&self) -> bool {
        self.elements
            .iter()
            .any(|el| VariantKind::from_ostype(el.ostype).is_some())
    }

    /// Decodes the nested family for the given variant, if present.
    pub fn variant(&self, kind: VariantKind) -> IconResult<Option<IconFamily>> {
        match self.element(kind.ostype()) {
            None => Ok(None),
            Some(element) => {
                let nested = IconFamily::from_bytes(&element.data)?;
                if nested.has_variants() {
                    let msg = format!("variant '{}' nests further variants", kind.ostype());
                    return Err(IconError::Format(msg));
                }
                Ok(Some(nested))
            }
        }
    }

    /// Stores `family` as the given variant.  Variant families may not nest
    /// variants of their own.
    pub fn set_variant(&mut self, kind: VariantKind, family: &IconFamily) -> IconResult<()> {
        if family.has_variants() {
            let msg = format!("variant '{}' may not nest further variants", kind.ostype());
            return Err(IconError::Format(msg));
        }
        self.set_element(kind.ostype(), family.to_bytes()?);
        Ok(())
    }

    /// Removes the given variant and returns its family, or `None` if it was
    /// absent.  A malformed variant is reported as an error and left in
    /// place; use `remove_element` to drop it regardless.
    pub fn remove_variant(&mut self, kind: VariantKind) -> IconResult<Option<IconFamily>> {
        let nested = self.variant(kind)?;
        if nested.is_some() {
            self.remove_element(kind.ostype());
        }
        Ok(nested)
    }

    /// Reads an icon family from an ICNS file.
    pub fn read<R: Read>(mut reader: R) -> IconResult<IconFamily> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(IconError::from_read)?;
        if magic != *ICNS_MAGIC_LITERAL {
            let msg = format!("not an icns file (wrong magic literal '{}')", OSType(magic));
            return Err(IconError::Format(msg));
        }
        let file_length = reader.read_u32::<BigEndian>().map_err(IconError::from_read)?;
        if file_length < ICON_FAMILY_HEADER_LENGTH {
            let msg = format!("invalid icns file length {}", file_length);
            return Err(IconError::Format(msg));
        }
        let mut file_position: u32 = ICON_FAMILY_HEADER_LENGTH;
        let mut family = IconFamily::new();
        while file_position < file_length {
            let element = IconElement::read(reader.by_ref(), file_length - file_position)?;
            file_position += element.total_length();
            family.elements.push(element);
        }
        debug!(
            "Read icon family with {} element(s), {} bytes",
            family.elements.len(),
            file_length
        );
        Ok(family)
    }

    /// Parses an icon family from an in-memory ICNS blob.
    pub fn from_bytes(bytes: &[u8]) -> IconResult<IconFamily> {
        IconFamily::read(bytes)
    }

    /// Reads an icon family from the ICNS file at `path`.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> IconResult<IconFamily> {
        let file = File::open(path)?;
        IconFamily::read(BufReader::new(file))
    }

    /// Writes the icon family to an ICNS file.
    pub fn write<W: Write>(&self, mut writer: W) -> IconResult<()> {
        let total_length = self.total_length()?;
        writer.write_all(ICNS_MAGIC_LITERAL)?;
        writer.write_u32::<BigEndian>(total_length)?;
        for element in &self.elements {
            element.write(writer.by_ref())?;
        }
        Ok(())
    }

    /// Serializes the icon family into an in-memory ICNS blob.
    pub fn to_bytes(&self) -> IconResult<Vec<u8>> {
        let mut output = Vec::with_capacity(self.total_length()? as usize);
        self.write(&mut output)?;
        Ok(output)
    }

    /// Writes the icon family to an ICNS file at `path`.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> IconResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(writer.by_ref())?;
        writer.flush()?;
        Ok(())
    }

    /// Returns the encoded length of the file, in bytes, including the
    /// length of the header.  Fails if the family is too large to encode.
    pub fn total_length(&self) -> IconResult<u32> {
        let mut length = u64::from(ICON_FAMILY_HEADER_LENGTH);
        for element in &self.elements {
            length += 8 + element.data.len() as u64;
        }
        u32::try_from(length).map_err(|_| {
            IconError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("icon family too large to encode ({} bytes)", length),
            ))
        })
    }
}
