use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

use crate::provider::FileProvider;
use crate::VfsError;

struct MemoryFile {
    data: Vec<u8>,
    modified: SystemTime,
}

#[derive(Default)]
struct MemoryState {
    files: HashMap<PathBuf, MemoryFile>,
    /// Logical clock, advanced by one second on every mutation.
    clock: u64,
}

impl MemoryState {
    fn tick(&mut self) -> SystemTime {
        self.clock += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.clock)
    }
}

/// In-memory file provider for tests and headless tooling.
///
/// Cloning is cheap and clones share the same storage, so a test can keep a
/// handle while the controller owns another one.
///
/// Modification times come from a logical clock that advances on every
/// write, insert or [`touch`](Self::touch), which makes "the file changed
/// on disk" deterministic to simulate.
///
/// # Example
///
/// ```ignore
/// let mem = MemoryProvider::new();
/// mem.insert("shaders/plasma.wgsl", source.as_bytes().to_vec());
/// let mut controller = ShaderController::new(NagaBackend::new(), mem.clone(), config);
/// ```
#[derive(Clone, Default)]
pub struct MemoryProvider {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryProvider {
    /// Create an empty in-memory provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, data: Vec<u8>) {
        let mut state = self.state.write();
        let modified = state.tick();
        state.files.insert(path.into(), MemoryFile { data, modified });
    }

    /// Remove a file, returning its data if it existed.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state
            .write()
            .files
            .remove(path.as_ref())
            .map(|file| file.data)
    }

    /// Bump the modification time of a file without changing its contents.
    ///
    /// Returns `false` if the file does not exist.
    pub fn touch(&self, path: impl AsRef<Path>) -> bool {
        let mut state = self.state.write();
        let modified = state.tick();
        match state.files.get_mut(path.as_ref()) {
            Some(file) => {
                file.modified = modified;
                true
            }
            None => false,
        }
    }

    /// Snapshot of a file's contents, if present.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state
            .read()
            .files
            .get(path.as_ref())
            .map(|file| file.data.clone())
    }
}

impl FileProvider for MemoryProvider {
    fn read(&self, path: &Path) -> Result<Vec<u8>, VfsError> {
        self.get(path)
            .ok_or_else(|| VfsError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), VfsError> {
        self.insert(path, data.to_vec());
        Ok(())
    }

    fn modified(&self, path: &Path) -> Result<SystemTime, VfsError> {
        self.state
            .read()
            .files
            .get(path)
            .map(|file| file.modified)
            .ok_or_else(|| VfsError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_existing_file() {
        let mem = MemoryProvider::new();
        mem.insert("plasma.wgsl", b"fn main() {}".to_vec());
        let result = mem.read(Path::new("plasma.wgsl")).unwrap();
        assert_eq!(result, b"fn main() {}");
    }

    #[test]
    fn read_missing_file() {
        let mem = MemoryProvider::new();
        let err = mem.read(Path::new("nope.wgsl")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn write_and_read() {
        let mem = MemoryProvider::new();
        mem.write(Path::new("new.txt"), b"hello").unwrap();
        assert_eq!(mem.read(Path::new("new.txt")).unwrap(), b"hello");
    }

    #[test]
    fn writes_advance_modification_time() {
        let mem = MemoryProvider::new();
        mem.insert("a.wgsl", vec![]);
        let first = mem.modified(Path::new("a.wgsl")).unwrap();

        mem.write(Path::new("a.wgsl"), b"changed").unwrap();
        let second = mem.modified(Path::new("a.wgsl")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn touch_bumps_time_only() {
        let mem = MemoryProvider::new();
        mem.insert("a.wgsl", b"data".to_vec());
        let before = mem.modified(Path::new("a.wgsl")).unwrap();

        assert!(mem.touch("a.wgsl"));
        assert!(mem.modified(Path::new("a.wgsl")).unwrap() > before);
        assert_eq!(mem.get("a.wgsl").unwrap(), b"data");
        assert!(!mem.touch("missing.wgsl"));
    }

    #[test]
    fn clones_share_storage() {
        let mem = MemoryProvider::new();
        let other = mem.clone();
        other.insert("shared.wgsl", b"x".to_vec());
        assert!(mem.exists(Path::new("shared.wgsl")));
    }

    #[test]
    fn remove_returns_data() {
        let mem = MemoryProvider::new();
        mem.insert("file.txt", b"data".to_vec());
        assert_eq!(mem.remove("file.txt"), Some(b"data".to_vec()));
        assert!(mem.remove("file.txt").is_none());
    }

    #[test]
    fn read_to_string_through_reference() {
        let mem = MemoryProvider::new();
        mem.insert("a.wgsl", b"text".to_vec());
        let by_ref: &MemoryProvider = &mem;
        assert_eq!(by_ref.read_to_string(Path::new("a.wgsl")).unwrap(), "text");
    }
}
