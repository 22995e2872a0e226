use std::path::Path;
use std::time::SystemTime;

use crate::provider::FileProvider;
use crate::VfsError;

/// Native file system provider.
///
/// Paths are used as given (relative paths resolve against the process
/// working directory). Writes create missing parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemProvider;

impl FileSystemProvider {
    /// Create a native file system provider.
    pub fn new() -> Self {
        Self
    }
}

impl FileProvider for FileSystemProvider {
    fn read(&self, path: &Path) -> Result<Vec<u8>, VfsError> {
        std::fs::read(path).map_err(|e| VfsError::from_io(path, e))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), VfsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| VfsError::from_io(parent, e))?;
        }
        log::trace!("FileSystemProvider: writing {} bytes to {:?}", data.len(), path);
        std::fs::write(path, data).map_err(|e| VfsError::from_io(path, e))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime, VfsError> {
        std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|e| VfsError::from_io(path, e))
    }
}
