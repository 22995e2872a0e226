//! Dummy shader backend for testing and headless tooling.
//!
//! This backend never looks at shader source. The program it "links" is
//! whatever uniform list was scripted with [`DummyBackend::set_program`],
//! and compilation fails only when a failure was requested with
//! [`DummyBackend::fail_compilation`].

use std::collections::HashMap;

use super::{ActiveUniform, ShaderBackend, UniformUpload};
use crate::error::CompileError;
use crate::texture::{TextureHandle, TextureImage, TextureStore, TextureTarget};
use crate::uniform::{UniformHandle, UniformType};

/// Dummy shader backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    /// Uniforms the next successful compile links.
    program: Vec<ActiveUniform>,
    /// Uniforms of the currently linked program.
    linked: Vec<ActiveUniform>,
    compile_failure: Option<String>,
    error_time: Option<f32>,
    compile_count: usize,
    uploads: HashMap<UniformHandle, UniformUpload>,
    textures: TextureStore,
}

impl DummyBackend {
    /// Create a backend with an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend whose compiles link `uniforms`.
    pub fn with_program(uniforms: Vec<ActiveUniform>) -> Self {
        Self {
            program: uniforms,
            ..Self::default()
        }
    }

    /// Replace the uniform list linked by subsequent compiles.
    pub fn set_program(&mut self, uniforms: Vec<ActiveUniform>) {
        self.program = uniforms;
    }

    /// Make subsequent compiles fail with `diagnostics`.
    pub fn fail_compilation(&mut self, diagnostics: impl Into<String>) {
        self.compile_failure = Some(diagnostics.into());
    }

    /// Make subsequent compiles succeed again.
    pub fn succeed_compilation(&mut self) {
        self.compile_failure = None;
    }

    /// Number of compile attempts so far.
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    /// Failure time passed to the error shader, while it is bound.
    pub fn error_time(&self) -> Option<f32> {
        self.error_time
    }

    /// Last value uploaded to `handle` in the current program.
    pub fn uploaded(&self, handle: UniformHandle) -> Option<&UniformUpload> {
        self.uploads.get(&handle)
    }

    /// Last value uploaded to the uniform called `name` in the current program.
    pub fn uploaded_by_name(&self, name: &str) -> Option<&UniformUpload> {
        self.uniform_handle(name)
            .and_then(|handle| self.uploads.get(&handle))
    }

    /// Textures created and not yet released, with their unit bindings.
    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }
}

impl ShaderBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn compile_fragment(&mut self, _source: &str) -> Result<(), CompileError> {
        self.compile_count += 1;
        if let Some(diagnostics) = &self.compile_failure {
            log::trace!("DummyBackend: failing compile #{}", self.compile_count);
            return Err(CompileError::new(diagnostics.clone()));
        }
        log::trace!(
            "DummyBackend: linking program with {} uniforms",
            self.program.len()
        );
        self.linked = self.program.clone();
        self.error_time = None;
        self.uploads.clear();
        Ok(())
    }

    fn active_uniform_count(&self) -> usize {
        self.linked.len()
    }

    fn active_uniform_info(&self, index: usize) -> Option<ActiveUniform> {
        self.linked.get(index).cloned()
    }

    fn uniform_handle(&self, name: &str) -> Option<UniformHandle> {
        self.linked
            .iter()
            .position(|u| u.name == name)
            .map(|index| UniformHandle::new(index as u64))
    }

    fn set_uniform_value(
        &mut self,
        handle: UniformHandle,
        ty: UniformType,
        array_length: u32,
        data: &[u8],
    ) {
        self.uploads.insert(
            handle,
            UniformUpload {
                ty,
                array_length,
                data: data.to_vec(),
            },
        );
    }

    fn use_error_shader(&mut self, error_time: f32) {
        self.error_time = Some(error_time);
    }

    fn create_texture(&mut self, image: &TextureImage) -> TextureHandle {
        let handle = self.textures.create(image);
        log::trace!(
            "DummyBackend: created {} texture {}x{} as {:?}",
            image.target.label(),
            image.width,
            image.height,
            handle
        );
        handle
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if !self.textures.release(texture) {
            log::warn!("DummyBackend: release of unknown texture {texture:?}");
        }
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureHandle>) {
        self.textures.bind(unit, target, texture);
    }
}
