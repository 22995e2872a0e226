//! Uniform type tags, flags and binding handles.

use std::fmt;

use bitflags::bitflags;

/// Value type of a shader uniform.
///
/// Sizes follow the tightly packed CPU layout used by the value buffer
/// (`mat3` is nine floats, not three padded columns). Samplers store the
/// texture unit index as a 32-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    SamplerCube,
}

impl UniformType {
    /// Every supported type, in type-code order.
    pub const ALL: [UniformType; 13] = [
        UniformType::Float,
        UniformType::Vec2,
        UniformType::Vec3,
        UniformType::Vec4,
        UniformType::Int,
        UniformType::IVec2,
        UniformType::IVec3,
        UniformType::IVec4,
        UniformType::Mat2,
        UniformType::Mat3,
        UniformType::Mat4,
        UniformType::Sampler2D,
        UniformType::SamplerCube,
    ];

    /// Size in bytes of a single element of this type.
    pub const fn size(self) -> usize {
        match self {
            Self::Float | Self::Int => 4,
            Self::Vec2 | Self::IVec2 => 8,
            Self::Vec3 | Self::IVec3 => 12,
            Self::Vec4 | Self::IVec4 => 16,
            Self::Mat2 => 16,
            Self::Mat3 => 36,
            Self::Mat4 => 64,
            Self::Sampler2D | Self::SamplerCube => 4,
        }
    }

    /// Stable numeric tag used in the uniformdata file format.
    pub const fn code(self) -> u32 {
        match self {
            Self::Float => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::Int => 5,
            Self::IVec2 => 6,
            Self::IVec3 => 7,
            Self::IVec4 => 8,
            Self::Mat2 => 9,
            Self::Mat3 => 10,
            Self::Mat4 => 11,
            Self::Sampler2D => 12,
            Self::SamplerCube => 13,
        }
    }

    /// Inverse of [`code`](Self::code).
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.code() == code)
    }

    /// GLSL-style type name, used for display.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Int => "int",
            Self::IVec2 => "ivec2",
            Self::IVec3 => "ivec3",
            Self::IVec4 => "ivec4",
            Self::Mat2 => "mat2",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::Sampler2D => "sampler2D",
            Self::SamplerCube => "samplerCube",
        }
    }

    /// Whether a uniform of this type can be presented as a color.
    ///
    /// Only float `vec3` (RGB) and `vec4` (RGBA) qualify.
    pub const fn supports_color(self) -> bool {
        matches!(self, Self::Vec3 | Self::Vec4)
    }

    /// Whether the element is made of 32-bit floats (as opposed to integers).
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            Self::Float
                | Self::Vec2
                | Self::Vec3
                | Self::Vec4
                | Self::Mat2
                | Self::Mat3
                | Self::Mat4
        )
    }

    /// Number of 32-bit scalars in one element.
    pub const fn component_count(self) -> usize {
        self.size() / 4
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Presentation flags attached to a uniform descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UniformFlags: u32 {
        /// Edit the value with a color picker (float `vec3`/`vec4` only).
        const IS_COLOR = 1 << 0;
    }
}

impl Default for UniformFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Opaque binding handle issued by a [`ShaderBackend`](crate::backend::ShaderBackend).
///
/// Only meaningful for the program that was linked when it was issued.
/// Handles are re-queried on every table rebuild and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformHandle(u64);

impl UniformHandle {
    /// Wrap a backend-specific raw handle value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The backend-specific raw handle value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}
