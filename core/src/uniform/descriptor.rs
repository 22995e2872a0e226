use std::ops::Range;

use super::types::{UniformFlags, UniformHandle, UniformType};

/// Longest uniform name kept, in bytes.
///
/// Names are stored in 64-byte NUL-terminated slots on disk; longer names
/// are truncated on a character boundary.
pub const MAX_UNIFORM_NAME_LEN: usize = 63;

/// Description of one active uniform and where its value lives.
///
/// `value_offset` is a byte offset into the owning [`UniformTable`](super::UniformTable)'s
/// buffer. The value occupies [`total_byte_size`](Self::total_byte_size) bytes from there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDescriptor {
    pub(crate) name: String,
    pub(crate) ty: UniformType,
    pub(crate) array_length: u32,
    pub(crate) handle: Option<UniformHandle>,
    pub(crate) value_offset: usize,
    pub(crate) flags: UniformFlags,
}

impl UniformDescriptor {
    pub(crate) fn new(
        name: &str,
        ty: UniformType,
        array_length: u32,
        handle: Option<UniformHandle>,
        flags: UniformFlags,
    ) -> Self {
        Self {
            name: clamp_name(name).to_owned(),
            ty,
            array_length,
            handle,
            value_offset: 0,
            flags,
        }
    }

    /// Uniform name as reported by the shader program.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element type.
    pub fn ty(&self) -> UniformType {
        self.ty
    }

    /// Number of consecutive elements (1 for non-array uniforms).
    pub fn array_length(&self) -> u32 {
        self.array_length
    }

    /// Binding handle in the currently linked program, if it resolved.
    pub fn handle(&self) -> Option<UniformHandle> {
        self.handle
    }

    /// Byte offset of the value inside the table's buffer.
    pub fn value_offset(&self) -> usize {
        self.value_offset
    }

    pub fn flags(&self) -> UniformFlags {
        self.flags
    }

    pub fn is_color(&self) -> bool {
        self.flags.contains(UniformFlags::IS_COLOR)
    }

    /// Size in bytes of one element.
    pub fn element_byte_size(&self) -> usize {
        self.ty.size()
    }

    /// Size in bytes of the whole value (`array_length` elements).
    pub fn total_byte_size(&self) -> usize {
        self.array_length as usize * self.element_byte_size()
    }

    /// Byte range of the value inside the table's buffer.
    pub fn value_range(&self) -> Range<usize> {
        self.value_offset..self.value_offset + self.total_byte_size()
    }

    /// Byte range of a single array element, if `element` is in bounds.
    pub fn element_range(&self, element: u32) -> Option<Range<usize>> {
        if element >= self.array_length {
            return None;
        }
        let start = self.value_offset + element as usize * self.element_byte_size();
        Some(start..start + self.element_byte_size())
    }

    /// Whether `other` describes the same uniform: same name, type and array length.
    ///
    /// Values are only ever carried between descriptors with the same identity.
    pub fn same_identity(&self, other: &UniformDescriptor) -> bool {
        self.name == other.name && self.ty == other.ty && self.array_length == other.array_length
    }
}

/// Flags a freshly introspected uniform starts with.
///
/// A float `vec3`/`vec4` whose name mentions "color" is shown as a color picker.
pub(crate) fn default_flags(name: &str, ty: UniformType) -> UniformFlags {
    if ty.supports_color() && name.contains("color") {
        UniformFlags::IS_COLOR
    } else {
        UniformFlags::empty()
    }
}

pub(crate) fn clamp_name(name: &str) -> &str {
    if name.len() <= MAX_UNIFORM_NAME_LEN {
        return name;
    }
    let mut end = MAX_UNIFORM_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, ty: UniformType, len: u32) -> UniformDescriptor {
        UniformDescriptor::new(name, ty, len, None, UniformFlags::empty())
    }

    #[test]
    fn total_size_is_length_times_element() {
        assert_eq!(descriptor("m", UniformType::Mat4, 3).total_byte_size(), 192);
        assert_eq!(descriptor("v", UniformType::Vec3, 5).total_byte_size(), 60);
        assert_eq!(descriptor("f", UniformType::Float, 1).total_byte_size(), 4);
    }

    #[test]
    fn element_ranges_follow_offset() {
        let mut d = descriptor("v", UniformType::Vec2, 3);
        d.value_offset = 16;
        assert_eq!(d.value_range(), 16..40);
        assert_eq!(d.element_range(0), Some(16..24));
        assert_eq!(d.element_range(2), Some(32..40));
        assert_eq!(d.element_range(3), None);
    }

    #[test]
    fn identity_requires_name_type_and_length() {
        let a = descriptor("a", UniformType::Float, 1);
        assert!(a.same_identity(&descriptor("a", UniformType::Float, 1)));
        assert!(!a.same_identity(&descriptor("a", UniformType::Vec2, 1)));
        assert!(!a.same_identity(&descriptor("a", UniformType::Float, 2)));
        assert!(!a.same_identity(&descriptor("A", UniformType::Float, 1)));
    }

    #[test]
    fn color_heuristic_needs_name_and_type() {
        assert_eq!(
            default_flags("u_color", UniformType::Vec3),
            UniformFlags::IS_COLOR
        );
        assert_eq!(
            default_flags("base_color_tint", UniformType::Vec4),
            UniformFlags::IS_COLOR
        );
        assert!(default_flags("u_color", UniformType::Float).is_empty());
        assert!(default_flags("u_color", UniformType::IVec3).is_empty());
        assert!(default_flags("u_Color", UniformType::Vec3).is_empty());
        assert!(default_flags("u_offset", UniformType::Vec3).is_empty());
    }

    #[test]
    fn long_names_are_truncated_on_char_boundary() {
        let long = "é".repeat(40);
        let clamped = clamp_name(&long);
        assert!(clamped.len() <= MAX_UNIFORM_NAME_LEN);
        assert_eq!(clamped.len(), 62);
        assert_eq!(clamp_name("short"), "short");
    }
}
