//! Error types for the Fragedit core.
//!
//! None of these escape the [`ShaderController`](crate::controller::ShaderController):
//! it turns them into log lines, the compile error overlay text, or a
//! silent no-op, depending on the kind.

use fragedit_vfs::VfsError;
use thiserror::Error;

/// A fragment shader failed to compile or link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("shader compilation failed:\n{diagnostics}")]
pub struct CompileError {
    /// Compiler output, suitable for showing to the user verbatim.
    pub diagnostics: String,
}

impl CompileError {
    pub fn new(diagnostics: impl Into<String>) -> Self {
        Self {
            diagnostics: diagnostics.into(),
        }
    }
}

/// Errors reading or writing a uniformdata snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot could not be read or written.
    #[error("snapshot IO failed: {0}")]
    Io(#[from] VfsError),
    /// The file does not start with the `UDAT` magic.
    #[error("not a uniformdata file (magic {0:02x?})")]
    BadMagic([u8; 4]),
    /// The file uses a format version this build cannot read.
    #[error("unsupported uniformdata version {0}")]
    UnsupportedVersion(u32),
    /// The file ends before a field that must be present.
    #[error("uniformdata file truncated: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },
    /// The header's counts do not add up to the file's length.
    #[error("uniformdata size mismatch: header describes {expected} bytes, file has {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}

/// Errors filling a texture slot.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Slot index past the last texture slot.
    #[error("texture slot {0} does not exist")]
    NoSuchSlot(usize),
    /// The image file could not be read.
    #[error("cannot read image: {0}")]
    Io(#[from] VfsError),
    /// The file is not an image format this build can decode.
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
    /// A cube map source must be a horizontal cross, four faces wide and three tall.
    #[error("{width}x{height} image is not a 4x3 cube cross")]
    NotACubeCross { width: u32, height: u32 },
}

/// Errors loading or saving controller settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CompileError::new("1:5 unexpected token");
        assert_eq!(
            err.to_string(),
            "shader compilation failed:\n1:5 unexpected token"
        );

        let err = SnapshotError::UnsupportedVersion(7);
        assert_eq!(err.to_string(), "unsupported uniformdata version 7");

        let err = SnapshotError::BadMagic(*b"ABCD");
        assert_eq!(
            err.to_string(),
            "not a uniformdata file (magic [41, 42, 43, 44])"
        );

        let err = TextureError::NotACubeCross {
            width: 64,
            height: 64,
        };
        assert_eq!(err.to_string(), "64x64 image is not a 4x3 cube cross");
    }
}
