//! Error types for icon family handling.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::icontype::OSType;

/// Result type for icon family operations.
pub type IconResult<T> = Result<T, IconError>;

/// Errors that can occur while reading, generating or attaching icons.
#[derive(Error, Debug)]
pub enum IconError {
    /// Malformed or truncated icon data.
    #[error("Malformed icon data: {0}")]
    Format(String),

    /// The family has no element with the requested tag.
    #[error("The icon family does not contain a '{0}' element")]
    NotFound(OSType),

    /// The source image has zero area or cannot be rasterized.
    #[error("Invalid source image: {0}")]
    InvalidSource(String),

    /// A resize strategy returned a bitmap of the wrong size.
    #[error(
        "Resize strategy returned {actual_width}x{actual_height} \
         instead of {expected_width}x{expected_height}"
    )]
    ResizeContractViolation {
        /// Requested width.
        expected_width: u32,
        /// Requested height.
        expected_height: u32,
        /// Width of the returned bitmap.
        actual_width: u32,
        /// Height of the returned bitmap.
        actual_height: u32,
    },

    /// The binder target does not exist.
    #[error("Target not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    /// The binder target is neither a file nor a folder.
    #[error("Unsupported target (neither file nor folder): {}", .0.display())]
    UnsupportedTarget(PathBuf),

    /// One step of a custom icon update failed.  Earlier steps of the same
    /// update are not rolled back.
    #[error("Failed to {step} for {path}: {source}", path = .path.display())]
    Bind {
        /// The step that failed.
        step: BindStep,
        /// The target being updated.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IconError {
    /// Converts an I/O error raised while decoding into the matching icon
    /// error: running out of input means the data is truncated.
    pub(crate) fn from_read(error: io::Error) -> IconError {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            IconError::Format("unexpected end of data".to_string())
        } else {
            IconError::Io(error)
        }
    }

    pub(crate) fn format<S: Into<String>>(msg: S) -> IconError {
        IconError::Format(msg.into())
    }
}

/// One side effect in a custom icon update.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BindStep {
    /// Writing the resource side channel of a file.
    WriteFileIcon,
    /// Writing the hidden icon file inside a folder.
    WriteFolderIcon,
    /// Writing the hidden icon file at the root of a volume.
    WriteVolumeIcon,
    /// Removing the resource side channel of a file.
    RemoveFileIcon,
    /// Removing the hidden icon file inside a folder.
    RemoveFolderIcon,
    /// Removing the hidden icon file at the root of a volume.
    RemoveVolumeIcon,
    /// Setting or clearing the "has custom icon" metadata flag.
    UpdateFlag,
    /// Asking the desktop shell to redraw the target.
    Notify,
}

impl fmt::Display for BindStep {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        let text = match *self {
            BindStep::WriteFileIcon => "write file icon",
            BindStep::WriteFolderIcon => "write folder icon file",
            BindStep::WriteVolumeIcon => "write volume icon file",
            BindStep::RemoveFileIcon => "remove file icon",
            BindStep::RemoveFolderIcon => "remove folder icon file",
            BindStep::RemoveVolumeIcon => "remove volume icon file",
            BindStep::UpdateFlag => "update custom icon flag",
            BindStep::Notify => "notify shell",
        };
        out.write_str(text)
    }
}
