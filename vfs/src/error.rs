use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while accessing files through a [`FileProvider`](crate::FileProvider).
#[derive(Debug, Error)]
pub enum VfsError {
    /// The requested path does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    /// An IO error occurred while accessing the path.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not valid UTF-8 text.
    #[error("{} is not valid UTF-8", .0.display())]
    InvalidUtf8(PathBuf),
}

impl VfsError {
    /// Wrap an IO error for `path`, mapping `ErrorKind::NotFound` to [`VfsError::NotFound`].
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            VfsError::NotFound(path)
        } else {
            VfsError::Io { path, source: err }
        }
    }

    /// Whether this error means the file simply is not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}
