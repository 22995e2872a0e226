use std::path::Path;

use fragedit_core::ControllerConfig;
use fragedit_vfs::FileProvider;
use serde::{Deserialize, Serialize};

use crate::args::RunArgs;

/// Top-level settings loaded from `fragedit.toml`.
///
/// ```toml
/// [controller]
/// autoreload = true
/// poll_interval_frames = 60
/// frames_per_second = 60.0
///
/// [controller.builtin_uniforms]
/// time = "u_time"
///
/// [window]
/// width = 1280
/// height = 720
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub controller: ControllerConfig,
    pub window: WindowSettings,
}

/// Framebuffer size reported through the resolution uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or cannot be parsed.
    pub fn load_or_default<F: FileProvider + ?Sized>(fs: &F, path: &Path) -> Self {
        let content = match fs.read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.is_not_found() => {
                log::debug!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
            Err(err) => {
                log::warn!("Failed to read {}: {err}", path.display());
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Failed to parse {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Command line flags win over the settings file.
    pub fn apply_run_args(&mut self, args: &RunArgs) {
        if let Some(fps) = args.fps {
            self.controller.frames_per_second = fps;
        }
        if args.no_autoreload {
            self.controller.autoreload = false;
        }
        if let (Some(width), Some(height)) = (args.width, args.height) {
            self.window = WindowSettings { width, height };
        }
    }
}
