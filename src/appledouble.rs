//! AppleDouble (`._name`) sidecar files, which carry Finder metadata and
//! resource forks on filesystems that have neither.
//!
//! A sidecar usually belongs to the user, not to us: macOS stores extended
//! attributes after the Finder info and may add entries of its own.  Decoding
//! therefore keeps every entry verbatim, and only the first 32 bytes of the
//! Finder info entry and the resource fork entry are ever rewritten.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::error::{IconError, IconResult};
use super::icontype::OSType;

const APPLE_DOUBLE_MAGIC: u32 = 0x0005_1607;
const APPLE_DOUBLE_VERSION: u32 = 0x0002_0000;
const HOME_FILESYSTEM: &[u8; 16] = b"Mac OS X        ";

const HEADER_LENGTH: usize = 26;
const ENTRY_DESCRIPTOR_LENGTH: usize = 12;

/// Entry ID of the resource fork.
pub const ENTRY_RESOURCE_FORK: u32 = 2;
/// Entry ID of the original file name.
pub const ENTRY_REAL_NAME: u32 = 3;
/// Entry ID of the Finder information.
pub const ENTRY_FINDER_INFO: u32 = 9;

const FINDER_INFO_LENGTH: usize = 32;

/// Offset of the extended attribute header within the Finder info entry.
const ATTR_HEADER_OFFSET: usize = FINDER_INFO_LENGTH + 2;
const ATTR_MAGIC: &[u8; 4] = b"ATTR";
const ATTR_ENTRIES_OFFSET: usize = ATTR_HEADER_OFFSET + 36;

/// Finder flag: the item has a custom icon.
pub const HAS_CUSTOM_ICON: u16 = 0x0400;
/// Finder flag: the item is hidden.
pub const IS_INVISIBLE: u16 = 0x4000;

/// The 32 bytes of Finder information attached to a file or folder.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FinderInfo(pub [u8; FINDER_INFO_LENGTH]);

impl FinderInfo {
    /// Returns the Finder flags word.
    pub fn flags(&self) -> u16 {
        BigEndian::read_u16(&self.0[8..10])
    }

    /// Replaces the Finder flags word.
    pub fn set_flags(&mut self, flags: u16) {
        BigEndian::write_u16(&mut self.0[8..10], flags);
    }

    /// Sets or clears one Finder flag.
    pub fn set_flag(&mut self, flag: u16, on: bool) {
        let flags = self.flags();
        self.set_flags(if on { flags | flag } else { flags & !flag });
    }

    /// Returns true if the custom icon flag is set.
    pub fn has_custom_icon(&self) -> bool {
        self.flags() & HAS_CUSTOM_ICON != 0
    }

    /// Sets the file type and creator codes.
    pub fn set_type_and_creator(&mut self, file_type: OSType, creator: OSType) {
        self.0[0..4].copy_from_slice(&file_type.0);
        self.0[4..8].copy_from_slice(&creator.0);
    }

    /// Returns the file type code.
    pub fn file_type(&self) -> OSType {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.0[0..4]);
        OSType(raw)
    }

    /// Returns true if every byte is zero.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&byte| byte == 0)
    }
}

/// One entry of an AppleDouble file, body included.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// Entry ID (2 for the resource fork, 9 for the Finder info, ...).
    pub id: u32,
    /// Entry body.
    pub data: Vec<u8>,
}

/// The decoded content of an AppleDouble sidecar.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppleDouble {
    filler: [u8; 16],
    entries: Vec<Entry>,
    /// File offset the Finder info entry was decoded from.
    finder_info_offset: Option<usize>,
}

impl Default for AppleDouble {
    fn default() -> AppleDouble {
        AppleDouble {
            filler: *HOME_FILESYSTEM,
            entries: Vec::new(),
            finder_info_offset: None,
        }
    }
}

impl AppleDouble {
    /// Returns every entry, in file order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn entry(&self, id: u32) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    fn entry_mut(&mut self, id: u32) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    /// Returns the Finder information, zero-filled if absent or short.
    pub fn finder_info(&self) -> FinderInfo {
        let mut info = FinderInfo::default();
        if let Some(entry) = self.entry(ENTRY_FINDER_INFO) {
            let used = entry.data.len().min(FINDER_INFO_LENGTH);
            info.0[..used].copy_from_slice(&entry.data[..used]);
        }
        info
    }

    /// Applies `update` to the Finder information.  Bytes past the first 32
    /// of the entry are left alone.
    pub fn update_finder_info<F: FnOnce(&mut FinderInfo)>(&mut self, update: F) {
        let mut info = self.finder_info();
        update(&mut info);
        if self.entry(ENTRY_FINDER_INFO).is_none() {
            let entry = Entry {
                id: ENTRY_FINDER_INFO,
                data: Vec::new(),
            };
            self.entries.insert(0, entry);
        }
        if let Some(entry) = self.entry_mut(ENTRY_FINDER_INFO) {
            if entry.data.len() < FINDER_INFO_LENGTH {
                entry.data.resize(FINDER_INFO_LENGTH, 0);
            }
            entry.data[..FINDER_INFO_LENGTH].copy_from_slice(&info.0);
        }
    }

    /// Returns the resource fork, if present and non-empty.
    pub fn resource_fork(&self) -> Option<&[u8]> {
        self.entry(ENTRY_RESOURCE_FORK)
            .map(|entry| entry.data.as_slice())
            .filter(|fork| !fork.is_empty())
    }

    /// Replaces the resource fork.  A new fork entry goes last.
    pub fn set_resource_fork(&mut self, fork: Vec<u8>) {
        match self.entry_mut(ENTRY_RESOURCE_FORK) {
            Some(entry) => entry.data = fork,
            None => self.entries.push(Entry {
                id: ENTRY_RESOURCE_FORK,
                data: fork,
            }),
        }
    }

    /// Empties the resource fork, keeping its entry in place.  Returns true
    /// if the fork held any data.
    pub fn clear_resource_fork(&mut self) -> bool {
        match self.entry_mut(ENTRY_RESOURCE_FORK) {
            Some(entry) if !entry.data.is_empty() => {
                entry.data.clear();
                true
            }
            _ => false,
        }
    }

    /// Returns true if the sidecar carries no information: at most zeroed
    /// Finder info and an empty resource fork.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|entry| match entry.id {
            ENTRY_FINDER_INFO => {
                entry.data.len() <= FINDER_INFO_LENGTH && entry.data.iter().all(|&b| b == 0)
            }
            ENTRY_RESOURCE_FORK => entry.data.is_empty(),
            _ => false,
        })
    }

    /// Encodes the sidecar.  Entry bodies are laid out in entry order right
    /// after the entry table.
    pub fn encode(&self) -> IconResult<Vec<u8>> {
        let table_length = HEADER_LENGTH + ENTRY_DESCRIPTOR_LENGTH * self.entries.len();
        let body_length: usize = self.entries.iter().map(|entry| entry.data.len()).sum();

        let mut output = Vec::with_capacity(table_length + body_length);
        output.write_u32::<BigEndian>(APPLE_DOUBLE_MAGIC)?;
        output.write_u32::<BigEndian>(APPLE_DOUBLE_VERSION)?;
        output.extend_from_slice(&self.filler);
        output.write_u16::<BigEndian>(self.entries.len() as u16)?;

        let mut offset = table_length;
        let mut offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            output.write_u32::<BigEndian>(entry.id)?;
            output.write_u32::<BigEndian>(offset as u32)?;
            output.write_u32::<BigEndian>(entry.data.len() as u32)?;
            offsets.push(offset);
            offset += entry.data.len();
        }
        if offset > u32::MAX as usize {
            return Err(IconError::format("AppleDouble file too large"));
        }

        for (entry, &offset) in self.entries.iter().zip(&offsets) {
            match self.finder_info_offset {
                Some(old) if entry.id == ENTRY_FINDER_INFO && old != offset => {
                    let mut body = entry.data.clone();
                    rebase_attr_header(&mut body, offset as i64 - old as i64);
                    output.extend_from_slice(&body);
                }
                _ => output.extend_from_slice(&entry.data),
            }
        }
        Ok(output)
    }

    /// Decodes an AppleDouble sidecar.
    pub fn decode(input: &[u8]) -> IconResult<AppleDouble> {
        if input.len() < HEADER_LENGTH {
            return Err(IconError::format("AppleDouble header truncated"));
        }
        if BigEndian::read_u32(&input[0..4]) != APPLE_DOUBLE_MAGIC {
            return Err(IconError::format("not an AppleDouble file (wrong magic)"));
        }
        let mut sidecar = AppleDouble::default();
        sidecar.filler.copy_from_slice(&input[8..24]);
        let num_entries = BigEndian::read_u16(&input[24..26]) as usize;
        for index in 0..num_entries {
            let start = HEADER_LENGTH + index * ENTRY_DESCRIPTOR_LENGTH;
            let descriptor = input
                .get(start..start + ENTRY_DESCRIPTOR_LENGTH)
                .ok_or_else(|| IconError::format("AppleDouble entry list truncated"))?;
            let id = BigEndian::read_u32(&descriptor[0..4]);
            let offset = BigEndian::read_u32(&descriptor[4..8]) as usize;
            let length = BigEndian::read_u32(&descriptor[8..12]) as usize;
            let body = offset
                .checked_add(length)
                .and_then(|end| input.get(offset..end))
                .ok_or_else(|| IconError::Format(format!("AppleDouble entry {} truncated", id)))?;
            if id == ENTRY_FINDER_INFO {
                sidecar.finder_info_offset = Some(offset);
            }
            sidecar.entries.push(Entry {
                id,
                data: body.to_vec(),
            });
        }
        Ok(sidecar)
    }
}

/// Moves the absolute file offsets stored in a macOS extended attribute
/// header by `delta`.  Bodies without such a header are left untouched.
fn rebase_attr_header(body: &mut [u8], delta: i64) {
    if body.get(ATTR_HEADER_OFFSET..ATTR_HEADER_OFFSET + 4) != Some(&ATTR_MAGIC[..]) {
        return;
    }
    // Header: magic, debug tag, total size, data start, data length,
    // three reserved words, flags, attribute count.
    shift_u32(body, ATTR_HEADER_OFFSET + 8, delta);
    shift_u32(body, ATTR_HEADER_OFFSET + 12, delta);
    let count = match body.get(ATTR_ENTRIES_OFFSET - 2..ATTR_ENTRIES_OFFSET) {
        Some(raw) => BigEndian::read_u16(raw),
        None => return,
    };
    // Entry: offset, length, flags, name length, name; padded to 4 bytes.
    let mut position = ATTR_ENTRIES_OFFSET;
    for _ in 0..count {
        let name_length = match body.get(position + 10) {
            Some(&length) => length as usize,
            None => return,
        };
        shift_u32(body, position, delta);
        position += (11 + name_length + 3) & !3;
    }
}

fn shift_u32(body: &mut [u8], at: usize, delta: i64) {
    if let Some(field) = body.get_mut(at..at + 4) {
        let value = i64::from(BigEndian::read_u32(field)) + delta;
        BigEndian::write_u32(field, value as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Finder info followed by a macOS extended attribute block holding one
    /// attribute named "x", for an entry that starts at `entry_offset`.
    fn finder_info_with_xattr(entry_offset: u32) -> Vec<u8> {
        let mut body = vec![0u8; FINDER_INFO_LENGTH];
        body[0..4].copy_from_slice(b"TEXT");
        body.extend_from_slice(&[0, 0]);
        let data_start = entry_offset + ATTR_ENTRIES_OFFSET as u32 + 12;
        body.extend_from_slice(ATTR_MAGIC);
        body.write_u32::<BigEndian>(0).unwrap();
        body.write_u32::<BigEndian>(data_start + 4).unwrap();
        body.write_u32::<BigEndian>(data_start).unwrap();
        body.write_u32::<BigEndian>(4).unwrap();
        body.extend_from_slice(&[0; 12]);
        body.write_u16::<BigEndian>(0).unwrap();
        body.write_u16::<BigEndian>(1).unwrap();
        body.write_u32::<BigEndian>(data_start).unwrap();
        body.write_u32::<BigEndian>(4).unwrap();
        body.write_u16::<BigEndian>(0).unwrap();
        body.extend_from_slice(&[1, b'x']);
        body.extend_from_slice(b"data");
        body
    }

    fn sidecar_bytes(entries: &[(u32, &[u8])]) -> Vec<u8> {
        let mut input = Vec::new();
        input.write_u32::<BigEndian>(APPLE_DOUBLE_MAGIC).unwrap();
        input.write_u32::<BigEndian>(APPLE_DOUBLE_VERSION).unwrap();
        input.extend_from_slice(HOME_FILESYSTEM);
        input.write_u16::<BigEndian>(entries.len() as u16).unwrap();
        let mut offset = HEADER_LENGTH + ENTRY_DESCRIPTOR_LENGTH * entries.len();
        for &(id, body) in entries {
            input.write_u32::<BigEndian>(id).unwrap();
            input.write_u32::<BigEndian>(offset as u32).unwrap();
            input.write_u32::<BigEndian>(body.len() as u32).unwrap();
            offset += body.len();
        }
        for &(_, body) in entries {
            input.extend_from_slice(body);
        }
        input
    }

    #[test]
    fn flags() {
        let mut info = FinderInfo::default();
        assert!(!info.has_custom_icon());
        info.set_flag(HAS_CUSTOM_ICON, true);
        info.set_flag(IS_INVISIBLE, true);
        assert_eq!(info.flags(), 0x4400);
        assert!(info.has_custom_icon());
        info.set_flag(HAS_CUSTOM_ICON, false);
        assert_eq!(info.flags(), IS_INVISIBLE);
    }

    #[test]
    fn encode_and_decode() {
        let mut sidecar = AppleDouble::default();
        sidecar.update_finder_info(|info| {
            info.set_type_and_creator(OSType(*b"icon"), OSType(*b"MACS"));
            info.set_flag(IS_INVISIBLE, true);
        });
        sidecar.set_resource_fork(b"fork".to_vec());
        let encoded = sidecar.encode().unwrap();
        assert_eq!(&encoded[0..4], &[0x00, 0x05, 0x16, 0x07]);
        assert_eq!(&encoded[8..24], b"Mac OS X        ");
        assert_eq!(encoded.len(), 26 + 24 + 32 + 4);
        assert_eq!(&encoded[50..54], b"icon");
        let decoded = AppleDouble::decode(&encoded).unwrap();
        assert_eq!(decoded.finder_info(), sidecar.finder_info());
        assert_eq!(decoded.resource_fork(), Some(&b"fork"[..]));
        assert_eq!(decoded.encode().unwrap(), encoded);
    }

    #[test]
    fn foreign_entries_and_xattrs_are_kept() {
        let finder_info = finder_info_with_xattr(26 + 36);
        let input = sidecar_bytes(&[
            (ENTRY_FINDER_INFO, &finder_info[..]),
            (ENTRY_REAL_NAME, &b"notes.txt"[..]),
            (ENTRY_RESOURCE_FORK, &b""[..]),
        ]);
        let mut sidecar = AppleDouble::decode(&input).unwrap();
        assert_eq!(sidecar.encode().unwrap(), input);
        assert_eq!(sidecar.resource_fork(), None);
        assert!(!sidecar.is_empty());

        sidecar.update_finder_info(|info| info.set_flag(HAS_CUSTOM_ICON, true));
        sidecar.set_resource_fork(b"fork".to_vec());
        let encoded = sidecar.encode().unwrap();
        let decoded = AppleDouble::decode(&encoded).unwrap();
        assert!(decoded.finder_info().has_custom_icon());
        assert_eq!(decoded.finder_info().file_type(), OSType(*b"TEXT"));
        assert_eq!(decoded.entries()[0].data[32..], finder_info[32..]);
        assert_eq!(decoded.entries()[1].data, b"notes.txt");
        assert_eq!(decoded.resource_fork(), Some(&b"fork"[..]));

        let mut cleared = decoded.clone();
        cleared.update_finder_info(|info| info.set_flag(HAS_CUSTOM_ICON, false));
        assert!(cleared.clear_resource_fork());
        assert_eq!(cleared.encode().unwrap(), input);
    }

    #[test]
    fn xattr_offsets_follow_the_finder_info_entry() {
        // A sidecar with Finder info only; adding a fork entry moves the
        // Finder info body down by one descriptor.
        let old_offset = 26 + 12;
        let finder_info = finder_info_with_xattr(old_offset);
        let input = sidecar_bytes(&[(ENTRY_FINDER_INFO, &finder_info[..])]);
        let mut sidecar = AppleDouble::decode(&input).unwrap();
        sidecar.set_resource_fork(b"fork".to_vec());
        let encoded = sidecar.encode().unwrap();
        assert_eq!(encoded.len(), input.len() + 12 + 4);

        let decoded = AppleDouble::decode(&encoded).unwrap();
        let body = &decoded.entries()[0].data;
        let data_start = BigEndian::read_u32(&body[ATTR_HEADER_OFFSET + 12..]) as usize;
        let first_offset = BigEndian::read_u32(&body[ATTR_ENTRIES_OFFSET..]) as usize;
        assert_eq!(data_start, first_offset);
        assert_eq!(&encoded[data_start..data_start + 4], b"data");
    }

    #[test]
    fn empty_only_without_foreign_data() {
        let mut sidecar = AppleDouble::default();
        assert!(sidecar.is_empty());
        sidecar.set_resource_fork(b"fork".to_vec());
        assert!(!sidecar.is_empty());
        assert!(sidecar.clear_resource_fork());
        assert!(!sidecar.clear_resource_fork());
        sidecar.update_finder_info(|info| info.set_flag(HAS_CUSTOM_ICON, true));
        assert!(!sidecar.is_empty());
        sidecar.update_finder_info(|info| info.set_flag(HAS_CUSTOM_ICON, false));
        assert!(sidecar.is_empty());

        let input = sidecar_bytes(&[(ENTRY_FINDER_INFO, &[0u8; 40][..])]);
        assert!(!AppleDouble::decode(&input).unwrap().is_empty());
    }

    #[test]
    fn bad_input() {
        assert!(matches!(AppleDouble::decode(b"short"), Err(IconError::Format(_))));
        let mut encoded = AppleDouble::default().encode().unwrap();
        encoded[0] = 1;
        assert!(matches!(AppleDouble::decode(&encoded), Err(IconError::Format(_))));
    }
}
