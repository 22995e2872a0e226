use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Names of the uniforms the controller feeds every frame.
///
/// Editable at run time; uniforms with these names are hidden from the
/// inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinUniformNames {
    /// `float`, seconds since the animation started.
    pub time: String,
    /// `vec2`, framebuffer size in pixels.
    pub resolution: String,
    /// `mat4`, inverse of the camera view matrix.
    pub view_matrix: String,
}

impl Default for BuiltinUniformNames {
    fn default() -> Self {
        Self {
            time: "u_time".into(),
            resolution: "u_resolution".into(),
            view_matrix: "u_view_mat".into(),
        }
    }
}

impl BuiltinUniformNames {
    /// Whether `name` is one of the built-in uniforms.
    pub fn contains(&self, name: &str) -> bool {
        name == self.time || name == self.resolution || name == self.view_matrix
    }
}

/// Settings of the [`ShaderController`](crate::controller::ShaderController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Poll the shader file and reload it when it changes on disk.
    pub autoreload: bool,
    /// Frames between two modification-time checks.
    pub poll_interval_frames: u32,
    /// Frame rate the animation clock assumes.
    pub frames_per_second: f32,
    pub builtin_uniforms: BuiltinUniformNames,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            autoreload: true,
            poll_interval_frames: 60,
            frames_per_second: 60.0,
            builtin_uniforms: BuiltinUniformNames::default(),
        }
    }
}

impl ControllerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Poll interval, never zero.
    pub fn poll_interval(&self) -> u32 {
        self.poll_interval_frames.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ControllerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.builtin_uniforms.time, "u_time");
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = ControllerConfig::from_toml_str(
            r#"
autoreload = false

[builtin_uniforms]
time = "iTime"
"#,
        )
        .unwrap();
        assert!(!config.autoreload);
        assert_eq!(config.poll_interval_frames, 60);
        assert_eq!(config.builtin_uniforms.time, "iTime");
        assert_eq!(config.builtin_uniforms.resolution, "u_resolution");
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = ControllerConfig::default();
        config.poll_interval_frames = 15;
        let text = config.to_toml_string().unwrap();
        assert_eq!(ControllerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let config = ControllerConfig {
            poll_interval_frames: 0,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), 1);
    }

    #[test]
    fn builtin_lookup() {
        let names = BuiltinUniformNames::default();
        assert!(names.contains("u_view_mat"));
        assert!(!names.contains("u_color"));
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(ControllerConfig::from_toml_str("autoreload = 3").is_err());
    }
}
