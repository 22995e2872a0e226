use std::path::Path;
use std::time::SystemTime;

use crate::VfsError;

/// Trait for file access backends.
///
/// All operations are blocking and complete before returning. The editor
/// runs every reload step on its single UI thread, so there is no need for
/// the futures-based interface a streaming asset system would use.
///
/// # Path Contract
///
/// Paths are passed through unchanged. The native provider hands them to
/// `std::fs`; the memory provider uses them as map keys, so two spellings
/// of the same file are two different entries there.
pub trait FileProvider {
    /// Read the entire contents of a file.
    fn read(&self, path: &Path) -> Result<Vec<u8>, VfsError>;

    /// Write data to a file, creating or overwriting it.
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), VfsError>;

    /// Last modification time of a file.
    fn modified(&self, path: &Path) -> Result<SystemTime, VfsError>;

    /// Check whether a file exists.
    fn exists(&self, path: &Path) -> bool {
        self.modified(path).is_ok()
    }

    /// Read a file and decode it as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> Result<String, VfsError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|_| VfsError::InvalidUtf8(path.to_path_buf()))
    }
}

impl<P: FileProvider + ?Sized> FileProvider for &P {
    fn read(&self, path: &Path) -> Result<Vec<u8>, VfsError> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), VfsError> {
        (**self).write(path, data)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime, VfsError> {
        (**self).modified(path)
    }
}
