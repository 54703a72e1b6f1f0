//! Attaching icon families to files and folders as their custom icons.

use std::io;
use std::path::Path;
use tracing::{info, warn};

use super::error::{BindStep, IconError, IconResult};
use super::family::IconFamily;
use super::store::{CustomIconStore, FsIconStore, IconSlot, TargetKind};

/// Sets, removes and queries custom icons through a [`CustomIconStore`].
///
/// A target moves between "no custom icon" and "has custom icon".  Setting
/// an icon writes the serialized family to the target's slot(s), raises the
/// custom icon flag and notifies the shell; removing reverses each step.
/// The folder at the root of a volume has two slots, its own icon file and
/// the volume icon file, which are written and removed together.
///
/// Updates are not transactional: if a step fails, the error names the step
/// and the steps before it stay applied.
#[derive(Debug)]
pub struct IconBinder<S: CustomIconStore> {
    store: S,
}

impl<S: CustomIconStore> IconBinder<S> {
    /// Creates a binder backed by the given store.
    pub fn new(store: S) -> IconBinder<S> {
        IconBinder { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the binder, returning the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Attaches `family` to `path` as its custom icon, replacing any previous
    /// custom icon.
    pub fn set_icon<P: AsRef<Path>>(&mut self, path: P, family: &IconFamily) -> IconResult<()> {
        let path = path.as_ref();
        let kind = self.resolve(path)?;
        let data = family.to_bytes()?;
        for (slot, step, _) in slots_for(path, kind) {
            self.run(step, path, |store| store.write_slot(&slot, &data))?;
        }
        self.run(BindStep::UpdateFlag, path, |store| {
            store.set_custom_icon_flag(path, true)
        })?;
        self.run(BindStep::Notify, path, |store| store.notify_changed(path))?;
        info!(
            "Set custom icon of {} ({:?}, {} bytes)",
            path.display(),
            kind,
            data.len()
        );
        Ok(())
    }

    /// Removes the custom icon of `path`.  Returns true if any icon data was
    /// present.  Removing from a target without a custom icon succeeds.
    pub fn remove_icon<P: AsRef<Path>>(&mut self, path: P) -> IconResult<bool> {
        let path = path.as_ref();
        let kind = self.resolve(path)?;
        let mut removed = false;
        for (slot, _, step) in slots_for(path, kind) {
            removed |= self.run(step, path, |store| store.remove_slot(&slot))?;
        }
        self.run(BindStep::UpdateFlag, path, |store| {
            store.set_custom_icon_flag(path, false)
        })?;
        self.run(BindStep::Notify, path, |store| store.notify_changed(path))?;
        info!("Removed custom icon of {} ({:?})", path.display(), kind);
        Ok(removed)
    }

    /// Returns true if the custom icon flag of `path` is set.
    pub fn has_custom_icon<P: AsRef<Path>>(&self, path: P) -> IconResult<bool> {
        let path = path.as_ref();
        self.resolve(path)?;
        Ok(self.store.custom_icon_flag(path)?)
    }

    /// Reads the custom icon family attached to `path`, if any.  For a volume
    /// root, the folder icon file is preferred over the volume icon file.
    pub fn icon_of<P: AsRef<Path>>(&self, path: P) -> IconResult<Option<IconFamily>> {
        let path = path.as_ref();
        let kind = self.resolve(path)?;
        for (slot, _, _) in slots_for(path, kind) {
            if let Some(data) = self.store.read_slot(&slot)? {
                return IconFamily::from_bytes(&data).map(Some);
            }
        }
        Ok(None)
    }

    fn resolve(&self, path: &Path) -> IconResult<TargetKind> {
        match self.store.target_kind(path)? {
            None => Err(IconError::TargetNotFound(path.to_path_buf())),
            Some(TargetKind::Other) => Err(IconError::UnsupportedTarget(path.to_path_buf())),
            Some(kind) => Ok(kind),
        }
    }

    fn run<T, F>(&mut self, step: BindStep, path: &Path, action: F) -> IconResult<T>
    where
        F: FnOnce(&mut S) -> io::Result<T>,
    {
        action(&mut self.store).map_err(|source| {
            warn!(
                "Custom icon update of {} stopped: cannot {}: {}",
                path.display(),
                step,
                source
            );
            IconError::Bind {
                step,
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

impl IconBinder<FsIconStore> {
    /// Creates a binder that keeps icons in the filesystem.
    pub fn filesystem() -> IconBinder<FsIconStore> {
        IconBinder::new(FsIconStore::new())
    }
}

/// The slots of a target, each with its write and remove step, in the order
/// they are updated.
fn slots_for(path: &Path, kind: TargetKind) -> Vec<(IconSlot, BindStep, BindStep)> {
    let path = path.to_path_buf();
    match kind {
        TargetKind::File => vec![(
            IconSlot::File(path),
            BindStep::WriteFileIcon,
            BindStep::RemoveFileIcon,
        )],
        TargetKind::Folder => vec![(
            IconSlot::FolderIconFile(path),
            BindStep::WriteFolderIcon,
            BindStep::RemoveFolderIcon,
        )],
        TargetKind::VolumeRoot => vec![
            (
                IconSlot::FolderIconFile(path.clone()),
                BindStep::WriteFolderIcon,
                BindStep::RemoveFolderIcon,
            ),
            (
                IconSlot::VolumeIconFile(path),
                BindStep::WriteVolumeIcon,
                BindStep::RemoveVolumeIcon,
            ),
        ],
        TargetKind::Other => Vec::new(),
    }
}

/// Attaches `family` to the file or folder at `path` using the filesystem
/// store.
pub fn set_custom_icon<P: AsRef<Path>>(path: P, family: &IconFamily) -> IconResult<()> {
    IconBinder::filesystem().set_icon(path, family)
}

/// Removes the custom icon of the file or folder at `path` using the
/// filesystem store.
pub fn remove_custom_icon<P: AsRef<Path>>(path: P) -> IconResult<bool> {
    IconBinder::filesystem().remove_icon(path)
}
