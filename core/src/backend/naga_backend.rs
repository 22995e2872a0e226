//! WGSL shader backend built on naga.
//!
//! Compilation means parsing and validating the fragment shader with naga.
//! Reflection walks the module's global variables and reports the ones the
//! `@fragment` entry point actually uses:
//!
//! | WGSL declaration | Reported as |
//! |------------------|-------------|
//! | `var<uniform> x: f32` / `i32` | `float` / `int` |
//! | `var<uniform> x: vecN<f32>` / `vecN<i32>` | `vecN` / `ivecN` |
//! | `var<uniform> x: matNxN<f32>` | `matN` |
//! | `var<uniform> x: array<T, N>` | `T`, array length `N` |
//! | `var x: texture_2d<f32>` / `texture_cube<f32>` | `sampler2D` / `samplerCube` |
//! | any other `var<uniform>` | unsupported |
//!
//! Handles are derived from `@group`/`@binding`. Uploaded values are kept
//! per handle until a renderer drains them with [`NagaBackend::take_uploads`].

use std::collections::HashMap;

use naga::{AddressSpace, ImageClass, ImageDimension, Scalar, TypeInner, VectorSize};

use super::{upload_by_name, ActiveUniform, ReflectedType, ShaderBackend, UniformUpload};
use crate::error::CompileError;
use crate::texture::{TextureHandle, TextureImage, TextureStore, TextureTarget};
use crate::uniform::{UniformHandle, UniformType};

/// Fullscreen red flash that fades out after a failed compile.
pub const ERROR_FLASH_WGSL: &str = r#"
@group(0) @binding(0) var<uniform> u_time: f32;
@group(0) @binding(1) var<uniform> u_error_time: f32;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let alpha = exp2(-10.0 * (u_time - u_error_time));
    return vec4<f32>(0.9, 0.1, 0.08, alpha);
}
"#;

#[derive(Debug, Clone)]
struct ReflectedUniform {
    info: ActiveUniform,
    handle: UniformHandle,
}

/// Active uniforms of one successfully validated fragment shader.
#[derive(Debug, Clone, Default)]
struct ReflectedProgram {
    uniforms: Vec<ReflectedUniform>,
}

impl ReflectedProgram {
    fn compile(source: &str) -> Result<Self, CompileError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| CompileError::new(e.emit_to_string(source)))?;
        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| CompileError::new(e.emit_to_string(source)))?;

        let entry_index = module
            .entry_points
            .iter()
            .position(|ep| ep.stage == naga::ShaderStage::Fragment)
            .ok_or_else(|| CompileError::new("no @fragment entry point found"))?;
        let usage = info.get_entry_point(entry_index);

        let mut uniforms = Vec::new();
        for (handle, var) in module.global_variables.iter() {
            if usage[handle].is_empty() {
                continue;
            }
            let (Some(name), Some(binding)) = (var.name.as_deref(), var.binding.as_ref()) else {
                continue;
            };
            let (ty, array_length) = match var.space {
                AddressSpace::Uniform => reflect_value(&module, var.ty),
                AddressSpace::Handle => match reflect_texture(&module.types[var.ty].inner) {
                    Some(ty) => (ReflectedType::Known(ty), 1),
                    None => continue,
                },
                _ => continue,
            };
            uniforms.push(ReflectedUniform {
                info: ActiveUniform {
                    name: name.to_owned(),
                    ty,
                    array_length,
                },
                handle: UniformHandle::new(
                    (u64::from(binding.group) << 32) | u64::from(binding.binding),
                ),
            });
        }

        Ok(Self { uniforms })
    }

    fn find(&self, name: &str) -> Option<&ReflectedUniform> {
        self.uniforms.iter().find(|u| u.info.name == name)
    }
}

fn reflect_value(module: &naga::Module, ty: naga::Handle<naga::Type>) -> (ReflectedType, u32) {
    match module.types[ty].inner {
        TypeInner::Array {
            base,
            size: naga::ArraySize::Constant(length),
            ..
        } => (reflect_element(&module.types[base].inner), length.get()),
        ref inner => (reflect_element(inner), 1),
    }
}

fn reflect_element(inner: &TypeInner) -> ReflectedType {
    let vector = |size: VectorSize, [two, three, four]: [UniformType; 3]| match size {
        VectorSize::Bi => two,
        VectorSize::Tri => three,
        VectorSize::Quad => four,
    };

    let known = match *inner {
        TypeInner::Scalar(scalar) if scalar == Scalar::F32 => Some(UniformType::Float),
        TypeInner::Scalar(scalar) if scalar == Scalar::I32 => Some(UniformType::Int),
        TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => Some(vector(
            size,
            [UniformType::Vec2, UniformType::Vec3, UniformType::Vec4],
        )),
        TypeInner::Vector { size, scalar } if scalar == Scalar::I32 => Some(vector(
            size,
            [UniformType::IVec2, UniformType::IVec3, UniformType::IVec4],
        )),
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } if scalar == Scalar::F32 && columns == rows => Some(vector(
            columns,
            [UniformType::Mat2, UniformType::Mat3, UniformType::Mat4],
        )),
        _ => None,
    };

    match known {
        Some(ty) => ReflectedType::Known(ty),
        None => ReflectedType::Unsupported(format!("{inner:?}")),
    }
}

fn reflect_texture(inner: &TypeInner) -> Option<UniformType> {
    match *inner {
        TypeInner::Image {
            dim: ImageDimension::D2,
            arrayed: false,
            class: ImageClass::Sampled { .. },
        } => Some(UniformType::Sampler2D),
        TypeInner::Image {
            dim: ImageDimension::Cube,
            arrayed: false,
            class: ImageClass::Sampled { .. },
        } => Some(UniformType::SamplerCube),
        _ => None,
    }
}

/// naga-based WGSL backend.
///
/// Keeps the last successfully compiled program; a failed compile leaves it
/// untouched. While the error shader is bound, introspection and uploads
/// refer to the error program instead.
#[derive(Debug, Default)]
pub struct NagaBackend {
    program: Option<ReflectedProgram>,
    error_program: Option<ReflectedProgram>,
    error_active: bool,
    uploads: HashMap<UniformHandle, UniformUpload>,
    textures: TextureStore,
}

impl NagaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the error-flash program is currently bound.
    pub fn is_error_shader_active(&self) -> bool {
        self.error_active
    }

    /// Last value uploaded to `handle` in the active program.
    pub fn uploaded(&self, handle: UniformHandle) -> Option<&UniformUpload> {
        self.uploads.get(&handle)
    }

    /// Last value uploaded to the uniform called `name` in the active program.
    pub fn uploaded_by_name(&self, name: &str) -> Option<&UniformUpload> {
        self.uniform_handle(name)
            .and_then(|handle| self.uploads.get(&handle))
    }

    /// Drain all recorded uploads, for a renderer to write into GPU buffers.
    pub fn take_uploads(&mut self) -> HashMap<UniformHandle, UniformUpload> {
        std::mem::take(&mut self.uploads)
    }

    /// Textures created and not yet released, with their unit bindings.
    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    fn active_program(&self) -> Option<&ReflectedProgram> {
        if self.error_active {
            self.error_program.as_ref()
        } else {
            self.program.as_ref()
        }
    }
}

impl ShaderBackend for NagaBackend {
    fn name(&self) -> &'static str {
        "naga"
    }

    fn compile_fragment(&mut self, source: &str) -> Result<(), CompileError> {
        let program = ReflectedProgram::compile(source)?;
        log::debug!(
            "naga: fragment shader validated, {} active uniforms",
            program.uniforms.len()
        );
        self.program = Some(program);
        self.error_active = false;
        self.uploads.clear();
        Ok(())
    }

    fn active_uniform_count(&self) -> usize {
        self.active_program().map_or(0, |p| p.uniforms.len())
    }

    fn active_uniform_info(&self, index: usize) -> Option<ActiveUniform> {
        self.active_program()?
            .uniforms
            .get(index)
            .map(|u| u.info.clone())
    }

    fn uniform_handle(&self, name: &str) -> Option<UniformHandle> {
        self.active_program()?.find(name).map(|u| u.handle)
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
        if self.error_program.is_none() {
            match ReflectedProgram::compile(ERROR_FLASH_WGSL) {
                Ok(program) => self.error_program = Some(program),
                Err(err) => {
                    log::error!("Built-in error shader failed to compile: {err}");
                    return;
                }
            }
        }
        self.error_active = true;
        self.uploads.clear();
        upload_by_name(
            self,
            "u_error_time",
            UniformType::Float,
            bytemuck::bytes_of(&error_time),
        );
    }

    fn create_texture(&mut self, image: &TextureImage) -> TextureHandle {
        let handle = self.textures.create(image);
        log::trace!(
            "naga: created {} texture {}x{} as {:?}",
            image.target.label(),
            image.width,
            image.height,
            handle
        );
        handle
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if !self.textures.release(texture) {
            log::warn!("naga: release of unknown texture {texture:?}");
        }
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureHandle>) {
        self.textures.bind(unit, target, texture);
    }
}
