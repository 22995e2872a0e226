//! Shader reload controller.
//!
//! The controller owns the live [`UniformTable`] and is its only mutator. It
//! drives the load cycle:
//!
//! ```text
//! NoShader ─► Compiling ─┬─► Linked ─► Ready
//!                ▲       └─► CompileFailed
//!                └──────── reload ────────┘
//! ```
//!
//! A failed compile binds the backend's error-flash shader and leaves the
//! live table exactly as it was. A successful initial load builds a fresh
//! table and restores the shader's snapshot into it; a successful hot
//! reload builds a fresh table and carries the old values across.
//!
//! Snapshot saves and loads are refused until the current shader has
//! compiled, so a failed open never writes one shader's values into another
//! shader's snapshot.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fragedit_vfs::FileProvider;
use glam::{Mat4, Vec2};

use crate::backend::{upload_by_name, ShaderBackend};
use crate::config::ControllerConfig;
use crate::error::{CompileError, TextureError};
use crate::snapshot;
use crate::texture::{TextureImage, TextureSlots, TextureTarget};
use crate::uniform::{UniformTable, UniformType};

/// Where the controller is in the load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShaderState {
    /// Nothing has been loaded successfully yet.
    #[default]
    NoShader,
    /// A compile is in progress.
    Compiling,
    /// The new program is linked; its uniform table is being built.
    Linked,
    /// The last compile failed. The previous table, if any, is still live.
    CompileFailed,
    /// The live table matches the linked program.
    Ready,
}

/// Result of one [`ShaderController::load_shader`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The source could not be read. Nothing changed.
    Unreadable,
    /// The source did not compile. The previous table is still live.
    CompileFailed,
    /// A new table is live; `transferred` values were carried over from the
    /// previous table or restored from the snapshot.
    Loaded { transferred: usize },
}

/// User actions on the live uniform values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAction {
    /// Reset every value to zero.
    Clear,
    /// Write the snapshot file.
    Save,
    /// Restore values from the snapshot file.
    Load,
}

/// Per-frame values for the built-in uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    /// Framebuffer size in pixels.
    pub resolution: Vec2,
    /// Camera view matrix. Its inverse is uploaded.
    pub view_matrix: Mat4,
}

impl Default for FrameInputs {
    fn default() -> Self {
        Self {
            resolution: Vec2::new(1280.0, 720.0),
            view_matrix: Mat4::IDENTITY,
        }
    }
}

/// Owns the live uniform table and keeps it in sync with the shader on disk.
pub struct ShaderController<B: ShaderBackend, F: FileProvider> {
    backend: B,
    fs: F,
    config: ControllerConfig,
    shader_path: Option<PathBuf>,
    source: String,
    modified: Option<SystemTime>,
    uniforms: UniformTable,
    textures: TextureSlots,
    compile_error: Option<CompileError>,
    state: ShaderState,
    /// Whether the current shader has loaded successfully at least once.
    loaded: bool,
    frame_count: u64,
    playing: bool,
    /// Frames seen by [`update`](Self::update), paused or not. Drives polling.
    ticks: u64,
}

impl<B: ShaderBackend, F: FileProvider> ShaderController<B, F> {
    pub fn new(backend: B, fs: F, config: ControllerConfig) -> Self {
        Self {
            backend,
            fs,
            config,
            shader_path: None,
            source: String::new(),
            modified: None,
            uniforms: UniformTable::new(),
            textures: TextureSlots::new(),
            compile_error: None,
            state: ShaderState::NoShader,
            loaded: false,
            frame_count: 0,
            playing: true,
            ticks: 0,
        }
    }

    /// Make `path` the current shader and load it from scratch.
    ///
    /// Records the file's modification time so that auto-reload only fires
    /// on later changes.
    pub fn open_shader(&mut self, path: impl Into<PathBuf>) -> LoadOutcome {
        let path = path.into();
        self.modified = self.fs.modified(&path).ok();
        self.shader_path = Some(path.clone());
        self.loaded = false;
        log::info!("Opening shader {}", path.display());
        self.load_shader(&path, true)
    }

    /// Read, compile and bind the shader at `path`.
    ///
    /// With `initial` set the new table is populated from the snapshot;
    /// otherwise values are carried over from the current table.
    pub fn load_shader(&mut self, path: &Path, initial: bool) -> LoadOutcome {
        let source = match self.fs.read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                log::warn!("Cannot read shader {}: {err}", path.display());
                return LoadOutcome::Unreadable;
            }
        };
        self.source = source;

        self.set_state(ShaderState::Compiling);
        if let Err(err) = self.backend.compile_fragment(&self.source) {
            log::error!("{}: {err}", path.display());
            let error_time = self.time();
            self.backend.use_error_shader(error_time);
            self.compile_error = Some(err);
            self.set_state(ShaderState::CompileFailed);
            return LoadOutcome::CompileFailed;
        }
        self.compile_error = None;
        self.set_state(ShaderState::Linked);

        let transferred = if initial {
            self.uniforms = UniformTable::build(&self.backend);
            match snapshot::load_snapshot(&self.fs, Some(path), &mut self.uniforms) {
                Ok(restored) => restored,
                Err(err) => {
                    log::warn!(
                        "Ignoring {}: {err}",
                        snapshot::snapshot_path(path).display()
                    );
                    0
                }
            }
        } else {
            let old = std::mem::replace(&mut self.uniforms, UniformTable::build(&self.backend));
            self.uniforms.transfer_from(&old)
        };

        self.loaded = true;
        self.set_state(ShaderState::Ready);
        log::info!(
            "Loaded {} ({} uniforms, {} values kept)",
            path.display(),
            self.uniforms.len(),
            transferred
        );
        LoadOutcome::Loaded { transferred }
    }

    /// Hot-reload the current shader. `None` when no shader is open.
    ///
    /// If the shader never loaded successfully since it was opened, this is
    /// an initial load and restores the snapshot.
    pub fn reload(&mut self) -> Option<LoadOutcome> {
        let path = self.shader_path.clone()?;
        let initial = !self.loaded;
        Some(self.load_shader(&path, initial))
    }

    /// Reload the current shader if its file is newer than the last load.
    pub fn poll_for_changes(&mut self) -> Option<LoadOutcome> {
        let path = self.shader_path.as_deref()?;
        let modified = self.fs.modified(path).ok()?;
        if self.modified.is_some_and(|seen| modified <= seen) {
            return None;
        }
        log::debug!("{} changed on disk", path.display());
        self.modified = Some(modified);
        self.reload()
    }

    /// Advance one frame: tick the clock, poll for changes, upload uniforms.
    ///
    /// Returns the outcome of a reload if one happened this frame.
    pub fn update(&mut self, inputs: &FrameInputs) -> Option<LoadOutcome> {
        if self.playing {
            self.frame_count += 1;
        }
        self.ticks += 1;

        let outcome = if self.config.autoreload
            && self.ticks % u64::from(self.config.poll_interval()) == 0
        {
            self.poll_for_changes()
        } else {
            None
        };

        self.apply_uniforms(inputs);
        outcome
    }

    /// Upload the live values, then the built-in uniforms.
    ///
    /// User values are skipped while a compile error is active; the built-ins
    /// still reach the error-flash shader.
    pub fn apply_uniforms(&mut self, inputs: &FrameInputs) {
        for (unit, slot) in (0u32..).zip(self.textures.iter()) {
            self.backend.bind_texture(unit, slot.target(), slot.texture());
        }

        if self.compile_error.is_none() {
            for descriptor in self.uniforms.descriptors() {
                let (Some(handle), Some(value)) = (
                    descriptor.handle(),
                    self.uniforms.buffer().get(descriptor.value_range()),
                ) else {
                    continue;
                };
                self.backend.set_uniform_value(
                    handle,
                    descriptor.ty(),
                    descriptor.array_length(),
                    value,
                );
            }
        }

        let time = self.time();
        let inverse_view = inputs.view_matrix.inverse();
        let names = &self.config.builtin_uniforms;
        upload_by_name(
            &mut self.backend,
            &names.time,
            UniformType::Float,
            bytemuck::bytes_of(&time),
        );
        upload_by_name(
            &mut self.backend,
            &names.resolution,
            UniformType::Vec2,
            bytemuck::bytes_of(&inputs.resolution),
        );
        upload_by_name(
            &mut self.backend,
            &names.view_matrix,
            UniformType::Mat4,
            bytemuck::bytes_of(&inverse_view),
        );
    }

    /// Whether the live table belongs to the current shader.
    ///
    /// False before the first successful load and while a compile error is
    /// active; the table then still holds a previous program's uniforms.
    pub fn has_live_uniforms(&self) -> bool {
        self.loaded && self.compile_error.is_none()
    }

    /// Write the live values to the shader's snapshot. Returns whether a file was written.
    pub fn save_uniforms(&self) -> bool {
        if !self.has_live_uniforms() {
            log::warn!("Not saving uniform values: the shader has not compiled");
            return false;
        }
        match snapshot::write_snapshot(&self.fs, self.shader_path.as_deref(), &self.uniforms) {
            Ok(written) => {
                if written {
                    log::info!("Saved {} uniform values", self.uniforms.len());
                }
                written
            }
            Err(err) => {
                log::warn!("Failed to save uniform values: {err}");
                false
            }
        }
    }

    /// Restore live values from the shader's snapshot. Returns the number restored.
    pub fn load_uniforms(&mut self) -> usize {
        if !self.has_live_uniforms() {
            log::warn!("Not loading uniform values: the shader has not compiled");
            return 0;
        }
        match snapshot::load_snapshot(&self.fs, self.shader_path.as_deref(), &mut self.uniforms) {
            Ok(restored) => {
                log::info!("Restored {restored} uniform values");
                restored
            }
            Err(err) => {
                log::warn!("Failed to load uniform values: {err}");
                0
            }
        }
    }

    /// Zero every live value.
    pub fn clear_uniforms(&mut self) {
        self.uniforms.clear_values();
        log::debug!("Cleared {} uniform values", self.uniforms.len());
    }

    pub fn apply_data_action(&mut self, action: DataAction) {
        match action {
            DataAction::Clear => self.clear_uniforms(),
            DataAction::Save => {
                self.save_uniforms();
            }
            DataAction::Load => {
                self.load_uniforms();
            }
        }
    }

    /// Decode the image at `path` into texture slot `slot`.
    ///
    /// On failure the slot keeps its previous texture.
    pub fn load_texture(
        &mut self,
        slot: usize,
        path: &Path,
        target: TextureTarget,
    ) -> Result<(), TextureError> {
        if self.textures.get(slot).is_none() {
            return Err(TextureError::NoSuchSlot(slot));
        }
        let image = TextureImage::decode(&self.fs.read(path)?, target)?;
        let texture = self.backend.create_texture(&image);
        match self.textures.assign(slot, path, &image, texture) {
            Ok(previous) => {
                if let Some(previous) = previous {
                    self.backend.release_texture(previous);
                }
            }
            Err(err) => {
                self.backend.release_texture(texture);
                return Err(err);
            }
        }
        log::info!(
            "Texture slot {slot}: {} {}x{} from {}",
            target.label(),
            image.width,
            image.height,
            path.display()
        );
        Ok(())
    }

    /// Empty texture slot `slot`. Returns whether it held a texture.
    pub fn clear_texture_slot(&mut self, slot: usize) -> bool {
        match self.textures.clear(slot) {
            Some(texture) => {
                self.backend.release_texture(texture);
                log::debug!("Cleared texture slot {slot}");
                true
            }
            None => false,
        }
    }

    pub fn texture_slots(&self) -> &TextureSlots {
        &self.textures
    }

    /// Write edited source to the current shader path and hot-reload it.
    ///
    /// `None` when no shader is open or the write failed.
    pub fn save_source(&mut self, source: &str) -> Option<LoadOutcome> {
        let path = self.shader_path.clone()?;
        if let Err(err) = self.fs.write(&path, source.as_bytes()) {
            log::warn!("Failed to save shader source: {err}");
            return None;
        }
        self.modified = self.fs.modified(&path).ok();
        self.reload()
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Restart the animation clock from zero.
    pub fn reset_animation(&mut self) {
        self.frame_count = 0;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Animation time in seconds.
    pub fn time(&self) -> f32 {
        let fps = if self.config.frames_per_second > 0.0 {
            self.config.frames_per_second
        } else {
            ControllerConfig::default().frames_per_second
        };
        self.frame_count as f32 / fps
    }

    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    /// The live table, for editing values in place.
    pub fn uniforms_mut(&mut self) -> &mut UniformTable {
        &mut self.uniforms
    }

    /// Diagnostics of the last failed compile, until the next successful one.
    pub fn compile_error(&self) -> Option<&CompileError> {
        self.compile_error.as_ref()
    }

    pub fn state(&self) -> ShaderState {
        self.state
    }

    pub fn shader_path(&self) -> Option<&Path> {
        self.shader_path.as_deref()
    }

    /// Source text of the last shader read from disk.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ControllerConfig {
        &mut self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn file_provider(&self) -> &F {
        &self.fs
    }

    fn set_state(&mut self, state: ShaderState) {
        log::debug!("Shader state {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActiveUniform, DummyBackend};
    use crate::texture::tests::png;
    use crate::texture::TEXTURE_SLOT_COUNT;
    use fragedit_vfs::MemoryProvider;

    const SHADER: &str = "shaders/plasma.wgsl";

    fn program() -> Vec<ActiveUniform> {
        vec![
            ActiveUniform::new("u_time", UniformType::Float, 1),
            ActiveUniform::new("u_scale", UniformType::Float, 1),
            ActiveUniform::new("u_tint_color", UniformType::Vec3, 1),
        ]
    }

    fn controller() -> (ShaderController<DummyBackend, MemoryProvider>, MemoryProvider) {
        let fs = MemoryProvider::new();
        fs.insert(SHADER, b"// plasma".to_vec());
        let backend = DummyBackend::with_program(program());
        let controller = ShaderController::new(backend, fs.clone(), ControllerConfig::default());
        (controller, fs)
    }

    #[test]
    fn open_builds_table() {
        let (mut controller, _fs) = controller();
        assert_eq!(controller.state(), ShaderState::NoShader);

        let outcome = controller.open_shader(SHADER);
        assert_eq!(outcome, LoadOutcome::Loaded { transferred: 0 });
        assert_eq!(controller.state(), ShaderState::Ready);
        assert_eq!(controller.uniforms().len(), 3);
        assert_eq!(controller.source(), "// plasma");
    }

    #[test]
    fn open_restores_snapshot() {
        let (mut controller, fs) = controller();
        controller.open_shader(SHADER);
        controller.uniforms_mut().set_element(1, 0, 4.0f32);
        assert!(controller.save_uniforms());

        let backend = DummyBackend::with_program(program());
        let mut reopened = ShaderController::new(backend, fs, ControllerConfig::default());
        let outcome = reopened.open_shader(SHADER);
        assert_eq!(outcome, LoadOutcome::Loaded { transferred: 3 });
        assert_eq!(reopened.uniforms().element::<f32>(1, 0), Some(4.0));
    }

    #[test]
    fn hot_reload_carries_values() {
        let (mut controller, _fs) = controller();
        controller.open_shader(SHADER);
        controller
            .uniforms_mut()
            .set_element(2, 0, [0.2f32, 0.4, 0.6]);

        controller.backend_mut().set_program(vec![
            ActiveUniform::new("u_tint_color", UniformType::Vec3, 1),
            ActiveUniform::new("u_speed", UniformType::Float, 1),
        ]);
        let outcome = controller.reload();
        assert_eq!(outcome, Some(LoadOutcome::Loaded { transferred: 1 }));

        let table = controller.uniforms();
        assert_eq!(table.len(), 2);
        assert_eq!(table.element::<[f32; 3]>(0, 0), Some([0.2, 0.4, 0.6]));
        assert_eq!(table.element::<f32>(1, 0), Some(0.0));
    }

    #[test]
    fn compile_failure_keeps_live_table() {
        let (mut controller, _fs) = controller();
        controller.open_shader(SHADER);
        controller.uniforms_mut().set_element(1, 0, 3.0f32);
        controller
            .uniforms_mut()
            .set_element(2, 0, [1.0f32, 0.5, 0.25]);
        for _ in 0..30 {
            controller.update(&FrameInputs::default());
        }
        let before = controller.uniforms().clone();

        controller.backend_mut().set_program(Vec::new());
        controller.backend_mut().fail_compilation("0:1: syntax error");
        let outcome = controller.reload();

        assert_eq!(outcome, Some(LoadOutcome::CompileFailed));
        assert_eq!(controller.state(), ShaderState::CompileFailed);
        assert_eq!(controller.uniforms(), &before);
        assert_eq!(
            controller.compile_error().map(|e| e.diagnostics.as_str()),
            Some("0:1: syntax error")
        );
        assert_eq!(controller.backend().error_time(), Some(0.5));

        controller.backend_mut().succeed_compilation();
        controller.backend_mut().set_program(program());
        controller.reload();
        assert!(controller.compile_error().is_none());
        assert_eq!(controller.uniforms().buffer(), before.buffer());
    }

    #[test]
    fn unreadable_source_changes_nothing() {
        let (mut controller, fs) = controller();
        controller.open_shader(SHADER);
        controller.backend_mut().fail_compilation("broken");
        controller.reload();
        fs.remove(SHADER);

        assert_eq!(controller.reload(), Some(LoadOutcome::Unreadable));
        assert_eq!(controller.state(), ShaderState::CompileFailed);
        assert!(controller.compile_error().is_some());
        assert_eq!(controller.backend().compile_count(), 2);
    }

    #[test]
    fn first_successful_reload_restores_snapshot() {
        let (mut controller, fs) = controller();
        controller.open_shader(SHADER);
        controller.uniforms_mut().set_element(1, 0, 5.0f32);
        controller.save_uniforms();

        let backend = DummyBackend::with_program(program());
        let mut reopened = ShaderController::new(backend, fs, ControllerConfig::default());
        reopened.backend_mut().fail_compilation("broken");
        assert_eq!(reopened.open_shader(SHADER), LoadOutcome::CompileFailed);
        assert!(reopened.uniforms().is_empty());

        reopened.backend_mut().succeed_compilation();
        assert_eq!(
            reopened.reload(),
            Some(LoadOutcome::Loaded { transferred: 3 })
        );
        assert_eq!(reopened.uniforms().element::<f32>(1, 0), Some(5.0));
    }

    #[test]
    fn reload_without_shader_is_none() {
        let (mut controller, _fs) = controller();
        assert_eq!(controller.reload(), None);
        assert_eq!(controller.poll_for_changes(), None);
        assert!(!controller.save_uniforms());
    }

    #[test]
    fn autoreload_polls_on_interval() {
        let (mut controller, fs) = controller();
        controller.config_mut().poll_interval_frames = 3;
        controller.open_shader(SHADER);
        fs.touch(SHADER);

        let inputs = FrameInputs::default();
        assert_eq!(controller.update(&inputs), None);
        assert_eq!(controller.update(&inputs), None);
        assert_eq!(
            controller.update(&inputs),
            Some(LoadOutcome::Loaded { transferred: 3 })
        );
        assert_eq!(controller.backend().compile_count(), 2);

        for _ in 0..6 {
            assert_eq!(controller.update(&inputs), None);
        }
    }

    #[test]
    fn autoreload_can_be_disabled() {
        let (mut controller, fs) = controller();
        controller.config_mut().poll_interval_frames = 1;
        controller.config_mut().autoreload = false;
        controller.open_shader(SHADER);
        fs.touch(SHADER);

        controller.update(&FrameInputs::default());
        assert_eq!(controller.backend().compile_count(), 1);
    }

    #[test]
    fn polling_continues_while_paused() {
        let (mut controller, fs) = controller();
        controller.config_mut().poll_interval_frames = 2;
        controller.open_shader(SHADER);
        controller.set_playing(false);
        fs.touch(SHADER);

        controller.update(&FrameInputs::default());
        controller.update(&FrameInputs::default());
        assert_eq!(controller.frame_count(), 0);
        assert_eq!(controller.backend().compile_count(), 2);
    }

    #[test]
    fn builtins_are_uploaded_after_user_values() {
        let (mut controller, _fs) = controller();
        controller.open_shader(SHADER);
        controller.uniforms_mut().set_element(0, 0, 99.0f32);
        controller.uniforms_mut().set_element(1, 0, 2.0f32);

        for _ in 0..120 {
            controller.update(&FrameInputs::default());
        }

        let backend = controller.backend();
        assert_eq!(
            backend.uploaded_by_name("u_time").unwrap().data,
            2.0f32.to_ne_bytes()
        );
        assert_eq!(
            backend.uploaded_by_name("u_scale").unwrap().data,
            2.0f32.to_ne_bytes()
        );
    }

    #[test]
    fn user_values_are_not_uploaded_during_compile_error() {
        let (mut controller, _fs) = controller();
        controller.open_shader(SHADER);
        controller.uniforms_mut().set_element(1, 0, 2.0f32);
        controller.backend_mut().fail_compilation("broken");
        controller.reload();

        controller.update(&FrameInputs::default());
        let backend = controller.backend();
        assert!(backend.uploaded_by_name("u_scale").is_none());
        assert!(backend.uploaded_by_name("u_time").is_some());
    }

    #[test]
    fn data_actions() {
        let (mut controller, _fs) = controller();
        controller.open_shader(SHADER);
        controller.uniforms_mut().set_element(1, 0, 7.0f32);

        controller.apply_data_action(DataAction::Save);
        controller.apply_data_action(DataAction::Clear);
        assert!(controller.uniforms().buffer().iter().all(|&b| b == 0));

        controller.apply_data_action(DataAction::Load);
        assert_eq!(controller.uniforms().element::<f32>(1, 0), Some(7.0));
    }

    #[test]
    fn failed_open_keeps_other_snapshot_intact() {
        const OTHER: &str = "shaders/tunnel.wgsl";
        let speed_program = || vec![ActiveUniform::new("u_speed", UniformType::Float, 1)];

        let (mut controller, fs) = controller();
        fs.insert(OTHER, b"// tunnel".to_vec());
        controller.backend_mut().set_program(speed_program());
        controller.open_shader(OTHER);
        controller.uniforms_mut().set_element(0, 0, 9.0f32);
        assert!(controller.save_uniforms());
        let saved = fs.get(snapshot::snapshot_path(Path::new(OTHER)));

        let backend = DummyBackend::with_program(program());
        let mut session = ShaderController::new(backend, fs.clone(), ControllerConfig::default());
        session.open_shader(SHADER);
        session.uniforms_mut().set_element(1, 0, 4.0f32);
        session.backend_mut().fail_compilation("broken");
        assert_eq!(session.open_shader(OTHER), LoadOutcome::CompileFailed);
        assert!(!session.has_live_uniforms());

        assert!(!session.save_uniforms());
        session.apply_data_action(DataAction::Save);
        assert_eq!(session.load_uniforms(), 0);
        assert_eq!(fs.get(snapshot::snapshot_path(Path::new(OTHER))), saved);

        session.backend_mut().succeed_compilation();
        session.backend_mut().set_program(speed_program());
        assert_eq!(session.reload(), Some(LoadOutcome::Loaded { transferred: 1 }));
        assert!(session.has_live_uniforms());
        assert_eq!(session.uniforms().element::<f32>(0, 0), Some(9.0));
    }

    #[test]
    fn data_actions_wait_for_a_compiled_shader() {
        let (mut controller, fs) = controller();
        controller.open_shader(SHADER);
        controller.uniforms_mut().set_element(1, 0, 2.0f32);
        controller.backend_mut().fail_compilation("broken");
        controller.reload();

        assert!(!controller.save_uniforms());
        assert!(fs.get(snapshot::snapshot_path(Path::new(SHADER))).is_none());
    }

    // ========================================================================
    // Texture slots
    // ========================================================================

    fn with_images() -> (ShaderController<DummyBackend, MemoryProvider>, MemoryProvider) {
        let (controller, fs) = controller();
        fs.insert("textures/wood.png", png(8, 4, 1));
        fs.insert("textures/sky.png", png(16, 12, 4));
        (controller, fs)
    }

    #[test]
    fn slots_bind_to_matching_units_every_frame() {
        let (mut controller, _fs) = with_images();
        controller.open_shader(SHADER);
        controller
            .load_texture(2, Path::new("textures/wood.png"), TextureTarget::Texture2D)
            .unwrap();
        controller
            .load_texture(5, Path::new("textures/sky.png"), TextureTarget::Cube)
            .unwrap();
        controller.update(&FrameInputs::default());

        let slots = controller.texture_slots();
        assert_eq!(slots.get(2).unwrap().size(), (8, 4));
        assert_eq!(slots.get(5).unwrap().size(), (4, 4));

        let textures = controller.backend().textures();
        for unit in 0..TEXTURE_SLOT_COUNT as u32 {
            let binding = textures.binding(unit).unwrap();
            let slot = slots.get(unit as usize).unwrap();
            assert_eq!(binding.texture, slot.texture());
            assert_eq!(binding.target, slot.target());
        }
        assert_eq!(textures.binding(5).unwrap().target, TextureTarget::Cube);
        assert!(textures.binding(0).unwrap().texture.is_none());
    }

    #[test]
    fn slots_stay_bound_during_compile_error() {
        let (mut controller, _fs) = with_images();
        controller.open_shader(SHADER);
        controller
            .load_texture(0, Path::new("textures/wood.png"), TextureTarget::Texture2D)
            .unwrap();
        controller.backend_mut().fail_compilation("broken");
        controller.reload();
        controller.update(&FrameInputs::default());

        let binding = controller.backend().textures().binding(0).unwrap();
        assert_eq!(binding.texture, controller.texture_slots().get(0).unwrap().texture());
        assert!(binding.texture.is_some());
    }

    #[test]
    fn replacing_and_clearing_release_textures() {
        let (mut controller, _fs) = with_images();
        let wood = Path::new("textures/wood.png");
        controller.load_texture(1, wood, TextureTarget::Texture2D).unwrap();
        controller.load_texture(1, wood, TextureTarget::Texture2D).unwrap();
        assert_eq!(controller.backend().textures().len(), 1);

        assert!(controller.clear_texture_slot(1));
        assert!(!controller.clear_texture_slot(1));
        assert!(controller.backend().textures().is_empty());
        assert!(controller.texture_slots().get(1).unwrap().is_empty());

        controller.update(&FrameInputs::default());
        assert!(controller.backend().textures().binding(1).unwrap().texture.is_none());
    }

    #[test]
    fn failed_texture_load_keeps_slot() {
        let (mut controller, fs) = with_images();
        fs.insert("textures/notes.txt", b"not an image".to_vec());
        let wood = Path::new("textures/wood.png");
        controller.load_texture(3, wood, TextureTarget::Texture2D).unwrap();
        let before = controller.texture_slots().clone();

        let flat = TextureTarget::Texture2D;
        let missing = controller.load_texture(3, Path::new("textures/none.png"), flat);
        assert!(matches!(missing, Err(TextureError::Io(_))));
        let garbage = controller.load_texture(3, Path::new("textures/notes.txt"), flat);
        assert!(matches!(garbage, Err(TextureError::Decode(_))));
        let not_cross = controller.load_texture(3, wood, TextureTarget::Cube);
        assert!(matches!(not_cross, Err(TextureError::NotACubeCross { .. })));
        let no_slot = controller.load_texture(TEXTURE_SLOT_COUNT, wood, flat);
        assert!(matches!(no_slot, Err(TextureError::NoSuchSlot(8))));

        assert_eq!(controller.texture_slots(), &before);
        assert_eq!(controller.backend().textures().len(), 1);
    }

    #[test]
    fn save_source_writes_and_reloads() {
        let (mut controller, fs) = controller();
        controller.open_shader(SHADER);

        let outcome = controller.save_source("// edited");
        assert_eq!(outcome, Some(LoadOutcome::Loaded { transferred: 3 }));
        assert_eq!(fs.get(SHADER), Some(b"// edited".to_vec()));
        assert_eq!(controller.source(), "// edited");

        // The save itself must not trigger another reload.
        assert_eq!(controller.poll_for_changes(), None);
    }

    #[test]
    fn animation_clock() {
        let (mut controller, _fs) = controller();
        controller.config_mut().frames_per_second = 30.0;
        for _ in 0..45 {
            controller.update(&FrameInputs::default());
        }
        assert_eq!(controller.time(), 1.5);

        controller.set_playing(false);
        controller.update(&FrameInputs::default());
        assert_eq!(controller.frame_count(), 45);

        controller.reset_animation();
        assert_eq!(controller.time(), 0.0);
    }
}
