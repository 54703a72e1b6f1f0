//! Classic Mac OS resource fork encoding, limited to what custom icons need.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::error::{IconError, IconResult};
use super::icontype::OSType;

/// Resource ID under which custom icons are stored.
pub const CUSTOM_ICON_RESOURCE_ID: i16 = -16455;

/// Resource type of a custom icon family.
pub const ICNS_RESOURCE_TYPE: OSType = OSType(*b"icns");

/// Offset of the resource data area; everything before it is the header and
/// reserved space.
const DATA_OFFSET: u32 = 256;

/// Resource map header: copy of the fork header, next-map handle, file
/// reference number, attributes, then the type and name list offsets.
const MAP_HEADER_LENGTH: u16 = 28;

const TYPE_ENTRY_LENGTH: usize = 8;
const REFERENCE_ENTRY_LENGTH: usize = 12;

/// One resource stored in a fork.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resource {
    /// Resource type code.
    pub restype: OSType,
    /// Resource ID.
    pub id: i16,
    /// Resource payload.
    pub data: Vec<u8>,
}

/// Encodes a resource fork holding the given resources.  Resources with the
/// same type are grouped together in the map.
pub fn encode(resources: &[Resource]) -> IconResult<Vec<u8>> {
    let mut types: Vec<OSType> = Vec::new();
    for resource in resources {
        if !types.contains(&resource.restype) {
            types.push(resource.restype);
        }
    }

    let mut data = Vec::new();
    let mut data_offsets = Vec::with_capacity(resources.len());
    for resource in resources {
        data_offsets.push(data.len() as u32);
        data.write_u32::<BigEndian>(resource.data.len() as u32)?;
        data.extend_from_slice(&resource.data);
    }
    if data.len() >= 1 << 24 {
        return Err(IconError::format("resource data too large for a resource fork"));
    }

    let type_list_length = 2 + TYPE_ENTRY_LENGTH * types.len();
    let map_length =
        MAP_HEADER_LENGTH as usize + type_list_length + REFERENCE_ENTRY_LENGTH * resources.len();
    let map_offset = DATA_OFFSET + data.len() as u32;

    let mut header = Vec::with_capacity(16);
    header.write_u32::<BigEndian>(DATA_OFFSET)?;
    header.write_u32::<BigEndian>(map_offset)?;
    header.write_u32::<BigEndian>(data.len() as u32)?;
    header.write_u32::<BigEndian>(map_length as u32)?;

    let mut fork = Vec::with_capacity(map_offset as usize + map_length);
    fork.extend_from_slice(&header);
    fork.resize(DATA_OFFSET as usize, 0);
    fork.extend_from_slice(&data);

    // Resource map.
    fork.extend_from_slice(&header);
    fork.write_u32::<BigEndian>(0)?;
    fork.write_u16::<BigEndian>(0)?;
    fork.write_u16::<BigEndian>(0)?;
    fork.write_u16::<BigEndian>(MAP_HEADER_LENGTH)?;
    fork.write_u16::<BigEndian>(map_length as u16)?;

    // Type list; the count is stored minus one (0xffff for none).
    fork.write_u16::<BigEndian>((types.len() as u16).wrapping_sub(1))?;
    let mut reference_offset = type_list_length;
    for restype in &types {
        let count = resources.iter().filter(|r| r.restype == *restype).count();
        fork.extend_from_slice(&restype.0);
        fork.write_u16::<BigEndian>((count as u16).wrapping_sub(1))?;
        fork.write_u16::<BigEndian>(reference_offset as u16)?;
        reference_offset += REFERENCE_ENTRY_LENGTH * count;
    }

    // Reference lists, grouped by type in type list order.
    for restype in &types {
        for (resource, &offset) in resources.iter().zip(&data_offsets) {
            if resource.restype != *restype {
                continue;
            }
            fork.write_i16::<BigEndian>(resource.id)?;
            fork.write_u16::<BigEndian>(0xffff)?;
            // Attributes byte, then a 24-bit data offset.
            fork.write_u32::<BigEndian>(offset)?;
            fork.write_u32::<BigEndian>(0)?;
        }
    }
    Ok(fork)
}

/// Encodes a resource fork holding just a custom icon family.
pub fn encode_custom_icon(icns: &[u8]) -> IconResult<Vec<u8>> {
    encode(&[Resource {
        restype: ICNS_RESOURCE_TYPE,
        id: CUSTOM_ICON_RESOURCE_ID,
        data: icns.to_vec(),
    }])
}

/// Decodes every resource in a resource fork.
pub fn decode(fork: &[u8]) -> IconResult<Vec<Resource>> {
    let data_offset = read_u32(fork, 0)? as usize;
    let map_offset = read_u32(fork, 4)? as usize;
    let type_list = map_offset + read_u16(fork, map_offset + 24)? as usize;
    let type_count = read_u16(fork, type_list)?.wrapping_add(1) as usize;
    let mut resources = Vec::new();
    for type_index in 0..type_count {
        let entry = type_list + 2 + type_index * TYPE_ENTRY_LENGTH;
        let restype = OSType(read_array(fork, entry)?);
        let count = read_u16(fork, entry + 4)?.wrapping_add(1) as usize;
        let references = type_list + read_u16(fork, entry + 6)? as usize;
        for index in 0..count {
            let reference = references + index * REFERENCE_ENTRY_LENGTH;
            let id = read_u16(fork, reference)? as i16;
            let offset = (read_u32(fork, reference + 4)? & 0x00ff_ffff) as usize;
            let start = data_offset + offset;
            let length = read_u32(fork, start)? as usize;
            let data = slice(fork, start + 4, length)?.to_vec();
            resources.push(Resource { restype, id, data });
        }
    }
    Ok(resources)
}

/// Returns the custom icon family stored in a resource fork, if any.
pub fn decode_custom_icon(fork: &[u8]) -> IconResult<Option<Vec<u8>>> {
    let resources = decode(fork)?;
    Ok(resources
        .into_iter()
        .find(|r| r.restype == ICNS_RESOURCE_TYPE && r.id == CUSTOM_ICON_RESOURCE_ID)
        .map(|r| r.data))
}

fn slice(fork: &[u8], offset: usize, length: usize) -> IconResult<&[u8]> {
    offset
        .checked_add(length)
        .and_then(|end| fork.get(offset..end))
        .ok_or_else(|| {
            IconError::Format(format!(
                "resource fork truncated ({} bytes, needed {} at offset {})",
                fork.len(),
                length,
                offset
            ))
        })
}

fn read_u32(fork: &[u8], offset: usize) -> IconResult<u32> {
    Ok(BigEndian::read_u32(slice(fork, offset, 4)?))
}

fn read_u16(fork: &[u8], offset: usize) -> IconResult<u16> {
    Ok(BigEndian::read_u16(slice(fork, offset, 2)?))
}

fn read_array(fork: &[u8], offset: usize) -> IconResult<[u8; 4]> {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(slice(fork, offset, 4)?);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_icon_layout() {
        let icns = b"icns\0\0\0\x08".to_vec();
        let fork = encode_custom_icon(&icns).unwrap();
        // 256-byte preamble, 4-byte length prefix, 50-byte map.
        assert_eq!(fork.len(), 256 + 4 + 8 + 50);
        assert_eq!(BigEndian::read_u32(&fork[0..4]), 256);
        assert_eq!(BigEndian::read_u32(&fork[4..8]), 256 + 12);
        assert_eq!(BigEndian::read_u32(&fork[12..16]), 50);
        assert_eq!(&fork[256..260], &[0, 0, 0, 8]);
        let map = 268;
        assert_eq!(&fork[map..map + 16], &fork[0..16]);
        assert_eq!(&fork[map + 30..map + 34], b"icns");
        assert_eq!(BigEndian::read_i16(&fork[map + 38..map + 40]), -16455);
        assert_eq!(decode_custom_icon(&fork).unwrap(), Some(icns));
    }

    #[test]
    fn several_resources() {
        let resources = vec![
            Resource {
                restype: OSType(*b"icns"),
                id: 128,
                data: b"one".to_vec(),
            },
            Resource {
                restype: OSType(*b"STR "),
                id: 5,
                data: b"two".to_vec(),
            },
            Resource {
                restype: OSType(*b"icns"),
                id: CUSTOM_ICON_RESOURCE_ID,
                data: b"three".to_vec(),
            },
        ];
        let fork = encode(&resources).unwrap();
        let mut decoded = decode(&fork).unwrap();
        decoded.sort_by_key(|r| r.id);
        let mut expected = resources.clone();
        expected.sort_by_key(|r| r.id);
        assert_eq!(decoded, expected);
        assert_eq!(decode_custom_icon(&fork).unwrap(), Some(b"three".to_vec()));
    }

    #[test]
    fn missing_icon_and_truncation() {
        let fork = encode(&[Resource {
            restype: OSType(*b"STR "),
            id: 1,
            data: vec![],
        }])
        .unwrap();
        assert_eq!(decode_custom_icon(&fork).unwrap(), None);
        assert!(matches!(decode(&fork[..100]), Err(IconError::Format(_))));
    }
}
