use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches the directory of a shader file and reports when the shader changes.
///
/// Editors often save by writing a temporary file and renaming it over the
/// original, so the parent directory is watched rather than the file itself.
pub struct ShaderWatcher {
    /// The underlying file watcher (kept alive).
    _watcher: RecommendedWatcher,
    /// Receives raw notify events from the background thread.
    event_rx: mpsc::Receiver<notify::Event>,
    /// Absolute path of the watched shader.
    target: PathBuf,
}

impl ShaderWatcher {
    /// Start watching `shader_path`. Returns `None` if the watcher cannot be set up.
    pub fn new(shader_path: &Path) -> Option<Self> {
        let (tx, rx) = mpsc::channel::<notify::Event>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        })
        .ok()?;

        let target = absolute(shader_path)?;
        let dir = target.parent()?.to_path_buf();
        if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
            log::warn!("Failed to watch {:?}: {e}", dir);
            return None;
        }
        log::info!("Watching {:?} for changes", target);

        Some(Self {
            _watcher: watcher,
            event_rx: rx,
            target,
        })
    }

    /// Drain pending events. Returns `true` if any of them touched the shader.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.event_rx.try_recv() {
            changed |= is_shader_change(&event, &self.target);
        }
        changed
    }
}

fn absolute(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        Some(std::env::current_dir().ok()?.join(path))
    }
}

fn is_shader_change(event: &notify::Event, target: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|path| same_file(path, target))
}

/// Compare by file name and parent, tolerating a canonicalized parent on one side.
fn same_file(path: &Path, target: &Path) -> bool {
    if path == target {
        return true;
    }
    if path.file_name() != target.file_name() {
        return false;
    }
    match (
        path.parent().and_then(|p| p.canonicalize().ok()),
        target.parent().and_then(|p| p.canonicalize().ok()),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn modify_of_target_counts() {
        let target = Path::new("/work/shaders/plasma.wgsl");
        let modify = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/work/shaders/plasma.wgsl",
        );
        assert!(is_shader_change(&modify, target));

        let create = event(
            EventKind::Create(CreateKind::File),
            "/work/shaders/plasma.wgsl",
        );
        assert!(is_shader_change(&create, target));
    }

    #[test]
    fn other_files_and_removals_are_ignored() {
        let target = Path::new("/work/shaders/plasma.wgsl");
        let sibling = event(
            EventKind::Modify(ModifyKind::Any),
            "/work/shaders/plasma.wgsl.uniformdata",
        );
        assert!(!is_shader_change(&sibling, target));

        let removed = event(
            EventKind::Remove(RemoveKind::File),
            "/work/shaders/plasma.wgsl",
        );
        assert!(!is_shader_change(&removed, target));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let path = absolute(Path::new("shaders/plasma.wgsl")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("shaders/plasma.wgsl"));
    }
}
