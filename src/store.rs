//! Persistence of custom icons for filesystem entries.
//!
//! [`CustomIconStore`] abstracts the platform mechanism; the binder only
//! talks to this trait.  Two stores are provided: [`MemoryIconStore`] keeps
//! everything in memory, and [`FsIconStore`] writes the on-disk layout macOS
//! uses on volumes without native resource forks.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::appledouble::{AppleDouble, HAS_CUSTOM_ICON, IS_INVISIBLE};
use super::error::IconResult;
use super::icontype::OSType;
use super::resfork;

/// Name of the hidden file that holds a folder's custom icon.
pub const FOLDER_ICON_FILE_NAME: &str = "Icon\r";

/// Name of the hidden file that holds a volume's custom icon.
pub const VOLUME_ICON_FILE_NAME: &str = ".VolumeIcon.icns";

/// Prefix of AppleDouble sidecar files.
const APPLE_DOUBLE_PREFIX: &str = "._";

/// What kind of filesystem entry a path refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TargetKind {
    /// A regular file.
    File,
    /// A folder that is not the root of a volume.
    Folder,
    /// The root folder of a volume.
    VolumeRoot,
    /// Anything else (devices, sockets, ...).
    Other,
}

/// A place where serialized icon families are kept.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum IconSlot {
    /// The resource side channel of a file.
    File(PathBuf),
    /// The hidden icon file inside a folder.
    FolderIconFile(PathBuf),
    /// The hidden icon file at the root of a volume.
    VolumeIconFile(PathBuf),
}

impl IconSlot {
    /// Returns the filesystem entry this slot belongs to.
    pub fn target(&self) -> &Path {
        match self {
            IconSlot::File(path)
            | IconSlot::FolderIconFile(path)
            | IconSlot::VolumeIconFile(path) => path,
        }
    }
}

/// Platform-specific storage for custom icons.
///
/// Slot contents are serialized icon families.  Implementations do no
/// locking; callers serialize access to a given target.
pub trait CustomIconStore {
    /// Classifies `path`, or returns `None` if it does not exist.
    fn target_kind(&self, path: &Path) -> io::Result<Option<TargetKind>>;

    /// Reads a slot, returning `None` if it is empty.
    fn read_slot(&self, slot: &IconSlot) -> io::Result<Option<Vec<u8>>>;

    /// Stores `data` in a slot, replacing any previous content.
    fn write_slot(&mut self, slot: &IconSlot, data: &[u8]) -> io::Result<()>;

    /// Empties a slot.  Returns true if it held anything.
    fn remove_slot(&mut self, slot: &IconSlot) -> io::Result<bool>;

    /// Returns the "has custom icon" metadata flag of `path`.
    fn custom_icon_flag(&self, path: &Path) -> io::Result<bool>;

    /// Sets or clears the "has custom icon" metadata flag of `path`.
    fn set_custom_icon_flag(&mut self, path: &Path, on: bool) -> io::Result<()>;

    /// Asks the desktop shell to redraw `path`.
    fn notify_changed(&mut self, path: &Path) -> io::Result<()>;
}

/// An in-memory icon store.  Targets must be registered before use.
#[derive(Clone, Debug, Default)]
pub struct MemoryIconStore {
    targets: HashMap<PathBuf, TargetKind>,
    slots: HashMap<IconSlot, Vec<u8>>,
    flags: HashSet<PathBuf>,
    notifications: Vec<PathBuf>,
}

impl MemoryIconStore {
    /// Creates an empty store with no known targets.
    pub fn new() -> MemoryIconStore {
        MemoryIconStore::default()
    }

    /// Registers a target of the given kind.
    pub fn add_target<P: Into<PathBuf>>(&mut self, path: P, kind: TargetKind) {
        self.targets.insert(path.into(), kind);
    }

    /// Returns true if the slot holds data.
    pub fn has_slot(&self, slot: &IconSlot) -> bool {
        self.slots.contains_key(slot)
    }

    /// Returns every path passed to `notify_changed`, in order.
    pub fn notifications(&self) -> &[PathBuf] {
        &self.notifications
    }
}

impl CustomIconStore for MemoryIconStore {
    fn target_kind(&self, path: &Path) -> io::Result<Option<TargetKind>> {
        Ok(self.targets.get(path).copied())
    }

    fn read_slot(&self, slot: &IconSlot) -> io::Result<Option<Vec<u8>>> {
        Ok(self.slots.get(slot).cloned())
    }

    fn write_slot(&mut self, slot: &IconSlot, data: &[u8]) -> io::Result<()> {
        if !self.targets.contains_key(slot.target()) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a registered target", slot.target().display()),
            ));
        }
        self.slots.insert(slot.clone(), data.to_vec());
        Ok(())
    }

    fn remove_slot(&mut self, slot: &IconSlot) -> io::Result<bool> {
        Ok(self.slots.remove(slot).is_some())
    }

    fn custom_icon_flag(&self, path: &Path) -> io::Result<bool> {
        Ok(self.flags.contains(path))
    }

    fn set_custom_icon_flag(&mut self, path: &Path, on: bool) -> io::Result<()> {
        if on {
            self.flags.insert(path.to_path_buf());
        } else {
            self.flags.remove(path);
        }
        Ok(())
    }

    fn notify_changed(&mut self, path: &Path) -> io::Result<()> {
        self.notifications.push(path.to_path_buf());
        Ok(())
    }
}

/// An icon store that keeps custom icons in plain files:
///
/// * a file's icon lives in the resource fork of its `._name` AppleDouble
///   sidecar, as an `'icns'` resource with the custom icon ID;
/// * a folder's icon lives in the resource fork of its hidden `Icon\r` file
///   (stored in `._Icon\r`);
/// * a volume's icon is the `.VolumeIcon.icns` file at its root;
/// * the custom icon flag is the Finder flag in the entry's AppleDouble
///   sidecar (`._.` inside a volume root).
#[derive(Clone, Debug, Default)]
pub struct FsIconStore {
    volume_roots: Vec<PathBuf>,
}

impl FsIconStore {
    /// Creates a store that detects volume roots from the filesystem.
    pub fn new() -> FsIconStore {
        FsIconStore::default()
    }

    /// Treats `path` as the root of a volume in addition to detected roots.
    pub fn with_volume_root<P: AsRef<Path>>(mut self, path: P) -> FsIconStore {
        let path = path.as_ref();
        self.volume_roots
            .push(fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
        self
    }

    fn is_volume_root(&self, path: &Path) -> io::Result<bool> {
        let canonical = fs::canonicalize(path)?;
        if self.volume_roots.iter().any(|root| *root == canonical) {
            return Ok(true);
        }
        match canonical.parent() {
            None => Ok(true),
            Some(parent) => is_mount_point(&canonical, parent),
        }
    }

    /// Path of the AppleDouble sidecar carrying the Finder info of `path`.
    fn finder_info_path(&self, path: &Path) -> io::Result<PathBuf> {
        if self.is_dir_volume_root(path)? {
            return Ok(path.join(format!("{}.", APPLE_DOUBLE_PREFIX)));
        }
        sidecar_path(path)
    }

    fn is_dir_volume_root(&self, path: &Path) -> io::Result<bool> {
        Ok(path.is_dir() && self.is_volume_root(path)?)
    }
}

#[cfg(unix)]
fn is_mount_point(path: &Path, parent: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    Ok(fs::metadata(path)?.dev() != fs::metadata(parent)?.dev())
}

#[cfg(not(unix))]
fn is_mount_point(_path: &Path, _parent: &Path) -> io::Result<bool> {
    Ok(false)
}

/// Returns `dir/._name` for `dir/name`.
fn sidecar_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    let mut sidecar_name = std::ffi::OsString::from(APPLE_DOUBLE_PREFIX);
    sidecar_name.push(name);
    Ok(path.with_file_name(sidecar_name))
}

fn read_sidecar(path: &Path) -> io::Result<Option<AppleDouble>> {
    match fs::read(path) {
        Ok(bytes) => AppleDouble::decode(&bytes).map(Some).map_err(invalid_data),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Writes the sidecar, or deletes it once it carries nothing.
fn write_sidecar(path: &Path, sidecar: &AppleDouble) -> io::Result<()> {
    if sidecar.is_empty() {
        return remove_if_present(path).map(|_| ());
    }
    let bytes = sidecar.encode().map_err(invalid_data)?;
    fs::write(path, bytes)
}

fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn invalid_data<E: std::fmt::Display>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

fn read_fork_icon(sidecar: &Path) -> io::Result<Option<Vec<u8>>> {
    let sidecar = match read_sidecar(sidecar)? {
        Some(sidecar) => sidecar,
        None => return Ok(None),
    };
    match sidecar.resource_fork() {
        Some(fork) => resfork::decode_custom_icon(fork).map_err(invalid_data),
        None => Ok(None),
    }
}

fn write_fork_icon(sidecar_file: &Path, data: &[u8]) -> IconResult<AppleDouble> {
    let mut sidecar = read_sidecar(sidecar_file)?.unwrap_or_default();
    sidecar.set_resource_fork(resfork::encode_custom_icon(data)?);
    Ok(sidecar)
}

impl CustomIconStore for FsIconStore {
    fn target_kind(&self, path: &Path) -> io::Result<Option<TargetKind>> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let kind = if metadata.is_file() {
            TargetKind::File
        } else if metadata.is_dir() {
            if self.is_volume_root(path)? {
                TargetKind::VolumeRoot
            } else {
                TargetKind::Folder
            }
        } else {
            TargetKind::Other
        };
        Ok(Some(kind))
    }

    fn read_slot(&self, slot: &IconSlot) -> io::Result<Option<Vec<u8>>> {
        match slot {
            IconSlot::File(path) => read_fork_icon(&sidecar_path(path)?),
            IconSlot::FolderIconFile(dir) => {
                read_fork_icon(&sidecar_path(&dir.join(FOLDER_ICON_FILE_NAME))?)
            }
            IconSlot::VolumeIconFile(root) => match fs::read(root.join(VOLUME_ICON_FILE_NAME)) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err),
            },
        }
    }

    fn write_slot(&mut self, slot: &IconSlot, data: &[u8]) -> io::Result<()> {
        match slot {
            IconSlot::File(path) => {
                let sidecar_file = sidecar_path(path)?;
                let sidecar = write_fork_icon(&sidecar_file, data).map_err(invalid_data)?;
                write_sidecar(&sidecar_file, &sidecar)
            }
            IconSlot::FolderIconFile(dir) => {
                let icon_file = dir.join(FOLDER_ICON_FILE_NAME);
                let sidecar_file = sidecar_path(&icon_file)?;
                let mut sidecar = write_fork_icon(&sidecar_file, data).map_err(invalid_data)?;
                sidecar.update_finder_info(|info| {
                    info.set_type_and_creator(OSType(*b"icon"), OSType(*b"MACS"));
                    info.set_flag(IS_INVISIBLE, true);
                });
                write_sidecar(&sidecar_file, &sidecar)?;
                // The icon file only appears once its sidecar is complete.
                if !icon_file.exists() {
                    fs::write(&icon_file, b"")?;
                }
                Ok(())
            }
            IconSlot::VolumeIconFile(root) => fs::write(root.join(VOLUME_ICON_FILE_NAME), data),
        }
    }

    fn remove_slot(&mut self, slot: &IconSlot) -> io::Result<bool> {
        match slot {
            IconSlot::File(path) => {
                let sidecar_file = sidecar_path(path)?;
                let mut sidecar = match read_sidecar(&sidecar_file)? {
                    Some(sidecar) => sidecar,
                    None => return Ok(false),
                };
                if !sidecar.clear_resource_fork() {
                    return Ok(false);
                }
                write_sidecar(&sidecar_file, &sidecar)?;
                Ok(true)
            }
            IconSlot::FolderIconFile(dir) => {
                let icon_file = dir.join(FOLDER_ICON_FILE_NAME);
                let removed_sidecar = remove_if_present(&sidecar_path(&icon_file)?)?;
                let removed_file = remove_if_present(&icon_file)?;
                Ok(removed_sidecar || removed_file)
            }
            IconSlot::VolumeIconFile(root) => remove_if_present(&root.join(VOLUME_ICON_FILE_NAME)),
        }
    }

    fn custom_icon_flag(&self, path: &Path) -> io::Result<bool> {
        let sidecar = read_sidecar(&self.finder_info_path(path)?)?;
        Ok(sidecar.is_some_and(|sidecar| sidecar.finder_info().has_custom_icon()))
    }

    fn set_custom_icon_flag(&mut self, path: &Path, on: bool) -> io::Result<()> {
        let sidecar_file = self.finder_info_path(path)?;
        let mut sidecar = read_sidecar(&sidecar_file)?.unwrap_or_default();
        sidecar.update_finder_info(|info| info.set_flag(HAS_CUSTOM_ICON, on));
        write_sidecar(&sidecar_file, &sidecar)
    }

    fn notify_changed(&mut self, path: &Path) -> io::Result<()> {
        // There is no desktop shell to reach from here; record the request.
        debug!("Custom icon of {} changed", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_names() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/dir/file.txt")).unwrap(),
            PathBuf::from("/tmp/dir/._file.txt")
        );
        assert!(sidecar_path(Path::new("/")).is_err());
    }

    #[test]
    fn memory_store_tracks_everything() {
        let mut store = MemoryIconStore::new();
        let path = PathBuf::from("/a");
        store.add_target(&path, TargetKind::File);
        assert_eq!(store.target_kind(&path).unwrap(), Some(TargetKind::File));
        assert_eq!(store.target_kind(Path::new("/b")).unwrap(), None);

        let slot = IconSlot::File(path.clone());
        store.write_slot(&slot, b"x").unwrap();
        assert_eq!(store.read_slot(&slot).unwrap(), Some(b"x".to_vec()));
        assert!(store.remove_slot(&slot).unwrap());
        assert!(!store.remove_slot(&slot).unwrap());
        assert!(store.write_slot(&IconSlot::File(PathBuf::from("/b")), b"x").is_err());

        store.set_custom_icon_flag(&path, true).unwrap();
        assert!(store.custom_icon_flag(&path).unwrap());
        store.notify_changed(&path).unwrap();
        assert_eq!(store.notifications(), &[path]);
    }

    #[test]
    fn fs_store_file_slot_and_flag_share_a_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.txt");
        fs::write(&file, b"hello").unwrap();
        let mut store = FsIconStore::new();
        assert_eq!(store.target_kind(&file).unwrap(), Some(TargetKind::File));

        let slot = IconSlot::File(file.clone());
        store.write_slot(&slot, b"icns\0\0\0\x08").unwrap();
        store.set_custom_icon_flag(&file, true).unwrap();
        let sidecar_file = dir.path().join("._doc.txt");
        let sidecar = AppleDouble::decode(&fs::read(&sidecar_file).unwrap()).unwrap();
        assert!(sidecar.finder_info().has_custom_icon());
        assert_eq!(store.read_slot(&slot).unwrap(), Some(b"icns\0\0\0\x08".to_vec()));

        assert!(store.remove_slot(&slot).unwrap());
        store.set_custom_icon_flag(&file, false).unwrap();
        assert!(!sidecar_file.exists());
        assert_eq!(fs::read(&file).unwrap(), b"hello");
    }

    #[test]
    fn fs_store_folder_slot() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Folder");
        fs::create_dir(&folder).unwrap();
        let mut store = FsIconStore::new();
        assert_eq!(store.target_kind(&folder).unwrap(), Some(TargetKind::Folder));

        let slot = IconSlot::FolderIconFile(folder.clone());
        store.write_slot(&slot, b"data").unwrap();
        assert!(folder.join("Icon\r").exists());
        let sidecar = AppleDouble::decode(&fs::read(folder.join("._Icon\r")).unwrap()).unwrap();
        assert_eq!(sidecar.finder_info().flags() & IS_INVISIBLE, IS_INVISIBLE);
        assert_eq!(store.read_slot(&slot).unwrap(), Some(b"data".to_vec()));
        assert!(store.remove_slot(&slot).unwrap());
        assert!(!folder.join("Icon\r").exists());
        assert_eq!(store.read_slot(&slot).unwrap(), None);
    }

    #[test]
    fn fs_store_keeps_foreign_sidecar_content() {
        use byteorder::{BigEndian, WriteBytesExt};

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.txt");
        fs::write(&file, b"hello").unwrap();
        // Finder info with a 32-byte attribute trailer, then a real name.
        let mut finder_info = b"TEXTttxt".to_vec();
        finder_info.resize(32, 0);
        finder_info.extend_from_slice(&[0xab; 32]);
        let mut existing = Vec::new();
        existing.write_u32::<BigEndian>(0x0005_1607).unwrap();
        existing.write_u32::<BigEndian>(0x0002_0000).unwrap();
        existing.extend_from_slice(b"Mac OS X        ");
        existing.write_u16::<BigEndian>(2).unwrap();
        for (id, offset, length) in [(9, 50, 64), (3, 114, 7)] {
            existing.write_u32::<BigEndian>(id).unwrap();
            existing.write_u32::<BigEndian>(offset).unwrap();
            existing.write_u32::<BigEndian>(length).unwrap();
        }
        existing.extend_from_slice(&finder_info);
        existing.extend_from_slice(b"doc.txt");
        let sidecar_file = dir.path().join("._doc.txt");
        fs::write(&sidecar_file, &existing).unwrap();

        let mut store = FsIconStore::new();
        let slot = IconSlot::File(file.clone());
        store.write_slot(&slot, b"icns\0\0\0\x08").unwrap();
        store.set_custom_icon_flag(&file, true).unwrap();
        let sidecar = AppleDouble::decode(&fs::read(&sidecar_file).unwrap()).unwrap();
        assert!(sidecar.finder_info().has_custom_icon());
        assert_eq!(sidecar.finder_info().file_type(), OSType(*b"TEXT"));
        assert_eq!(sidecar.entries()[0].data[32..], finder_info[32..]);
        assert_eq!(sidecar.entries()[1].data, b"doc.txt");
        assert_eq!(store.read_slot(&slot).unwrap(), Some(b"icns\0\0\0\x08".to_vec()));

        assert!(store.remove_slot(&slot).unwrap());
        store.set_custom_icon_flag(&file, false).unwrap();
        let sidecar = AppleDouble::decode(&fs::read(&sidecar_file).unwrap()).unwrap();
        assert_eq!(sidecar.entries()[0].data, finder_info);
        assert_eq!(sidecar.entries()[1].data, b"doc.txt");
        assert_eq!(sidecar.resource_fork(), None);
        assert_eq!(store.read_slot(&slot).unwrap(), None);
    }

    #[test]
    fn failed_folder_sidecar_leaves_no_icon_file() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Folder");
        fs::create_dir(&folder).unwrap();
        // A directory where the sidecar should be makes writing it fail.
        fs::create_dir(folder.join("._Icon\r")).unwrap();
        let mut store = FsIconStore::new();
        let slot = IconSlot::FolderIconFile(folder.clone());
        assert!(store.write_slot(&slot, b"data").is_err());
        assert!(!folder.join("Icon\r").exists());
    }

    #[test]
    fn registered_volume_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsIconStore::new().with_volume_root(dir.path());
        assert_eq!(store.target_kind(dir.path()).unwrap(), Some(TargetKind::VolumeRoot));
        store.set_custom_icon_flag(dir.path(), true).unwrap();
        assert!(dir.path().join("._.").exists());
        assert!(store.custom_icon_flag(dir.path()).unwrap());
    }
}
