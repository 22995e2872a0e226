//! Graphics backend abstraction.
//!
//! The reload controller never talks to a graphics API directly. Everything
//! it needs from one (compile a fragment stage, enumerate the active
//! uniforms of the linked program, resolve binding handles, upload values,
//! fall back to an error indicator, create and bind textures) goes through
//! the [`ShaderBackend`] trait.
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: scripted program for tests and headless tooling
//! - [`NagaBackend`] (`naga-backend` feature): compiles and reflects WGSL with naga

pub mod dummy;
#[cfg(feature = "naga-backend")]
pub mod naga_backend;

pub use dummy::DummyBackend;
#[cfg(feature = "naga-backend")]
pub use naga_backend::NagaBackend;

use crate::error::CompileError;
use crate::texture::{TextureHandle, TextureImage, TextureTarget};
use crate::uniform::{UniformHandle, UniformType};

/// Type of an active uniform as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectedType {
    /// A type the value table can hold.
    Known(UniformType),
    /// Anything else, with a backend-specific description for diagnostics.
    Unsupported(String),
}

/// Introspection result for one active uniform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    pub name: String,
    pub ty: ReflectedType,
    /// Number of array elements (1 for non-arrays).
    pub array_length: u32,
}

impl ActiveUniform {
    pub fn new(name: impl Into<String>, ty: UniformType, array_length: u32) -> Self {
        Self {
            name: name.into(),
            ty: ReflectedType::Known(ty),
            array_length,
        }
    }

    pub fn unsupported(
        name: impl Into<String>,
        description: impl Into<String>,
        array_length: u32,
    ) -> Self {
        Self {
            name: name.into(),
            ty: ReflectedType::Unsupported(description.into()),
            array_length,
        }
    }
}

/// A value handed to [`ShaderBackend::set_uniform_value`], as recorded by the
/// CPU-side backends.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformUpload {
    pub ty: UniformType,
    pub array_length: u32,
    pub data: Vec<u8>,
}

/// Graphics API operations consumed by the reload controller.
///
/// The vertex stage is a fixed full-screen pass-through owned by the
/// backend; only the fragment stage is ever recompiled.
pub trait ShaderBackend {
    /// Backend name for log messages.
    fn name(&self) -> &'static str;

    /// Compile `source` as the fragment stage and link it into the active program.
    ///
    /// On failure the previously linked program must stay intact.
    fn compile_fragment(&mut self, source: &str) -> Result<(), CompileError>;

    /// Number of active uniforms in the linked program.
    fn active_uniform_count(&self) -> usize;

    /// Name, type and array length of the active uniform at `index`.
    fn active_uniform_info(&self, index: usize) -> Option<ActiveUniform>;

    /// Binding handle of the uniform called `name` in the active program.
    fn uniform_handle(&self, name: &str) -> Option<UniformHandle>;

    /// Upload `array_length` elements of `ty` from `data` to `handle`.
    fn set_uniform_value(
        &mut self,
        handle: UniformHandle,
        ty: UniformType,
        array_length: u32,
        data: &[u8],
    );

    /// Bind the built-in error-flash program.
    ///
    /// `error_time` is the animation time at which compilation failed; the
    /// flash fades out from there.
    fn use_error_shader(&mut self, error_time: f32);

    /// Create a texture object from decoded pixels.
    fn create_texture(&mut self, image: &TextureImage) -> TextureHandle;

    /// Destroy a texture made by [`create_texture`](Self::create_texture).
    fn release_texture(&mut self, texture: TextureHandle);

    /// Bind `texture` to texture `unit`, or unbind the unit with `None`.
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureHandle>);
}

/// Upload a single-element value to the uniform called `name`, if the active
/// program has one.
pub(crate) fn upload_by_name<B: ShaderBackend + ?Sized>(
    backend: &mut B,
    name: &str,
    ty: UniformType,
    data: &[u8],
) -> bool {
    match backend.uniform_handle(name) {
        Some(handle) => {
            backend.set_uniform_value(handle, ty, 1, data);
            true
        }
        None => false,
    }
}
