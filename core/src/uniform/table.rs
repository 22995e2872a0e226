use bytemuck::Pod;

use super::descriptor::{default_flags, UniformDescriptor};
use super::types::{UniformFlags, UniformType};
use crate::backend::{ReflectedType, ShaderBackend};

/// Descriptors of a program's active uniforms plus the packed buffer holding their values.
///
/// Descriptors keep the order in which the backend reported them; the
/// order never changes for the lifetime of a table. Values are packed back
/// to back without padding, in descriptor order, and zero-initialized.
///
/// The table hands out values by index and never lets callers add, remove
/// or reorder descriptors, so a UI can edit values in place without being
/// able to break the layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformTable {
    pub(crate) descriptors: Vec<UniformDescriptor>,
    pub(crate) buffer: Vec<u8>,
}

impl UniformTable {
    /// Create an empty table (no uniforms, empty buffer).
    pub fn new() -> Self {
        Self::default()
    }

    /// Introspect the backend's currently linked program and build a fresh table.
    ///
    /// Uniforms whose type is not supported are logged and left out, so they
    /// never shift the offsets of the uniforms that follow. A program with no
    /// active uniforms yields an empty table.
    pub fn build<B: ShaderBackend + ?Sized>(backend: &B) -> Self {
        let count = backend.active_uniform_count();
        if count == 0 {
            log::debug!("{}: program has no active uniforms", backend.name());
            return Self::new();
        }

        let mut descriptors: Vec<UniformDescriptor> = Vec::with_capacity(count);
        for index in 0..count {
            let Some(info) = backend.active_uniform_info(index) else {
                log::warn!("{}: no info for active uniform {index}", backend.name());
                continue;
            };
            let ty = match info.ty {
                ReflectedType::Known(ty) => ty,
                ReflectedType::Unsupported(description) => {
                    log::error!(
                        "Uniform '{}' has unsupported type {description}, skipping it",
                        info.name
                    );
                    continue;
                }
            };
            if info.array_length == 0 {
                log::error!("Uniform '{}' reports zero elements, skipping it", info.name);
                continue;
            }

            let descriptor = UniformDescriptor::new(
                &info.name,
                ty,
                info.array_length,
                backend.uniform_handle(&info.name),
                default_flags(&info.name, ty),
            );
            if descriptor.name != info.name {
                log::warn!(
                    "Uniform name '{}' truncated to '{}'",
                    info.name,
                    descriptor.name
                );
            }
            if descriptors.iter().any(|d| d.name == descriptor.name) {
                log::warn!("Duplicate uniform '{}', skipping it", descriptor.name);
                continue;
            }
            descriptors.push(descriptor);
        }

        let table = Self::pack(descriptors);
        log::debug!(
            "{}: built uniform table with {} uniforms ({} bytes)",
            backend.name(),
            table.len(),
            table.buffer_size()
        );
        table
    }

    /// Build a table from `(name, type, array_length)` declarations.
    ///
    /// Handles are left unresolved. Useful for tooling and tests that have no
    /// backend at hand. Declarations with zero elements or a duplicate name
    /// are ignored.
    pub fn from_declarations<'a, I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, UniformType, u32)>,
    {
        let mut descriptors: Vec<UniformDescriptor> = Vec::new();
        for (name, ty, array_length) in declarations {
            let descriptor =
                UniformDescriptor::new(name, ty, array_length, None, default_flags(name, ty));
            if array_length == 0 || descriptors.iter().any(|d| d.name == descriptor.name) {
                continue;
            }
            descriptors.push(descriptor);
        }
        Self::pack(descriptors)
    }

    /// Assign cumulative offsets and allocate a zeroed buffer of the total size.
    fn pack(mut descriptors: Vec<UniformDescriptor>) -> Self {
        let mut offset = 0;
        for descriptor in &mut descriptors {
            descriptor.value_offset = offset;
            offset += descriptor.total_byte_size();
        }
        Self {
            descriptors,
            buffer: vec![0; offset],
        }
    }

    /// Assemble a table whose descriptors already carry offsets.
    ///
    /// Every descriptor's value range must lie inside `buffer`.
    pub(crate) fn from_parts(descriptors: Vec<UniformDescriptor>, buffer: Vec<u8>) -> Self {
        debug_assert!(descriptors
            .iter()
            .all(|d| d.value_range().end <= buffer.len()));
        Self {
            descriptors,
            buffer,
        }
    }

    /// Number of uniforms.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All descriptors, in introspection order.
    pub fn descriptors(&self) -> &[UniformDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, index: usize) -> Option<&UniformDescriptor> {
        self.descriptors.get(index)
    }

    /// Index of the uniform called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.name == name)
    }

    /// The whole value buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Total size of the value buffer in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Raw bytes of a uniform's value (all elements).
    pub fn value(&self, index: usize) -> Option<&[u8]> {
        let range = self.descriptors.get(index)?.value_range();
        self.buffer.get(range)
    }

    /// Mutable raw bytes of a uniform's value (all elements).
    pub fn value_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let range = self.descriptors.get(index)?.value_range();
        self.buffer.get_mut(range)
    }

    /// Read one array element as `T`.
    ///
    /// Returns `None` if the index or element is out of range or `T` does not
    /// have exactly the element's size (e.g. read a `vec3` as `[f32; 3]`, a
    /// `mat4` as `[f32; 16]`, a sampler as `i32`).
    pub fn element<T: Pod>(&self, index: usize, element: u32) -> Option<T> {
        let range = self.typed_element_range::<T>(index, element)?;
        Some(bytemuck::pod_read_unaligned(&self.buffer[range]))
    }

    /// Overwrite one array element with `value`. Same rules as [`element`](Self::element).
    ///
    /// Returns `false` if nothing was written.
    pub fn set_element<T: Pod>(&mut self, index: usize, element: u32, value: T) -> bool {
        match self.typed_element_range::<T>(index, element) {
            Some(range) => {
                self.buffer[range].copy_from_slice(bytemuck::bytes_of(&value));
                true
            }
            None => false,
        }
    }

    fn typed_element_range<T: Pod>(
        &self,
        index: usize,
        element: u32,
    ) -> Option<std::ops::Range<usize>> {
        let descriptor = self.descriptors.get(index)?;
        if std::mem::size_of::<T>() != descriptor.element_byte_size() {
            return None;
        }
        descriptor
            .element_range(element)
            .filter(|range| range.end <= self.buffer.len())
    }

    /// Set or clear the "is color" presentation flag.
    ///
    /// Only float `vec3`/`vec4` uniforms can be colors; returns `false` for
    /// anything else.
    pub fn set_color(&mut self, index: usize, is_color: bool) -> bool {
        match self.descriptors.get_mut(index) {
            Some(descriptor) if descriptor.ty.supports_color() => {
                descriptor.flags.set(UniformFlags::IS_COLOR, is_color);
                true
            }
            _ => false,
        }
    }

    /// Reset every value to zero.
    pub fn clear_values(&mut self) {
        self.buffer.fill(0);
    }

    /// Copy matching values from `old` into this table. See [`transfer_values`](super::transfer_values).
    pub fn transfer_from(&mut self, old: &UniformTable) -> usize {
        super::transfer_values(old, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ActiveUniform, DummyBackend};
    use crate::uniform::UniformHandle;

    #[test]
    fn empty_program_gives_empty_table() {
        let backend = DummyBackend::new();
        let table = UniformTable::build(&backend);
        assert!(table.is_empty());
        assert_eq!(table.buffer_size(), 0);
        assert!(table.buffer().is_empty());
    }

    #[test]
    fn offsets_accumulate_in_introspection_order() {
        let mut backend = DummyBackend::with_program(vec![
            ActiveUniform::new("u_scale", UniformType::Float, 1),
            ActiveUniform::new("u_points", UniformType::Vec3, 5),
            ActiveUniform::new("u_xforms", UniformType::Mat4, 3),
            ActiveUniform::new("u_tex", UniformType::Sampler2D, 1),
        ]);
        backend.compile_fragment("").unwrap();

        let table = UniformTable::build(&backend);
        let layout: Vec<_> = table
            .descriptors()
            .iter()
            .map(|d| (d.name(), d.value_offset(), d.total_byte_size()))
            .collect();
        assert_eq!(
            layout,
            vec![
                ("u_scale", 0, 4),
                ("u_points", 4, 60),
                ("u_xforms", 64, 192),
                ("u_tex", 256, 4),
            ]
        );
        assert_eq!(table.buffer_size(), 260);
        assert!(table.buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn handles_are_resolved_per_name() {
        let mut backend = DummyBackend::with_program(vec![
            ActiveUniform::new("a", UniformType::Float, 1),
            ActiveUniform::new("b", UniformType::Float, 1),
        ]);
        backend.compile_fragment("").unwrap();

        let table = UniformTable::build(&backend);
        assert_eq!(table.get(0).unwrap().handle(), Some(UniformHandle::new(0)));
        assert_eq!(table.get(1).unwrap().handle(), Some(UniformHandle::new(1)));
    }

    #[test]
    fn unsupported_types_are_skipped_without_shifting_offsets() {
        let mut backend = DummyBackend::with_program(vec![
            ActiveUniform::new("before", UniformType::Vec2, 1),
            ActiveUniform::unsupported("weird", "bvec3", 1),
            ActiveUniform::new("after", UniformType::Float, 1),
        ]);
        backend.compile_fragment("").unwrap();

        let table = UniformTable::build(&backend);
        assert_eq!(table.len(), 2);
        assert_eq!(table.find("weird"), None);
        let after = table.get(table.find("after").unwrap()).unwrap();
        assert_eq!(after.value_offset(), 8);
        assert_eq!(table.buffer_size(), 12);
    }

    #[test]
    fn color_flag_is_derived_at_build_time() {
        let mut backend = DummyBackend::with_program(vec![
            ActiveUniform::new("u_color", UniformType::Vec3, 1),
            ActiveUniform::new("u_color_scale", UniformType::Float, 1),
            ActiveUniform::new("u_position", UniformType::Vec4, 1),
        ]);
        backend.compile_fragment("").unwrap();

        let table = UniformTable::build(&backend);
        assert!(table.get(0).unwrap().is_color());
        assert!(!table.get(1).unwrap().is_color());
        assert!(!table.get(2).unwrap().is_color());
    }

    #[test]
    fn typed_element_access() {
        let mut table = UniformTable::from_declarations([
            ("u_tint", UniformType::Vec3, 2),
            ("u_count", UniformType::Int, 1),
        ]);

        assert!(table.set_element(0, 1, [0.25f32, 0.5, 0.75]));
        assert!(table.set_element(1, 0, 7i32));

        assert_eq!(table.element::<[f32; 3]>(0, 0), Some([0.0; 3]));
        assert_eq!(table.element::<[f32; 3]>(0, 1), Some([0.25, 0.5, 0.75]));
        assert_eq!(table.element::<i32>(1, 0), Some(7));

        // Wrong size, element or index.
        assert_eq!(table.element::<[f32; 4]>(0, 0), None);
        assert_eq!(table.element::<[f32; 3]>(0, 2), None);
        assert_eq!(table.element::<i32>(5, 0), None);
        assert!(!table.set_element(1, 0, 1.0f64));
    }

    #[test]
    fn set_color_only_applies_to_color_types() {
        let mut table = UniformTable::from_declarations([
            ("u_tint", UniformType::Vec3, 1),
            ("u_speed", UniformType::Float, 1),
        ]);
        assert!(table.set_color(0, true));
        assert!(table.get(0).unwrap().is_color());
        assert!(table.set_color(0, false));
        assert!(!table.get(0).unwrap().is_color());
        assert!(!table.set_color(1, true));
        assert!(!table.set_color(9, true));
    }

    #[test]
    fn clear_values_zeroes_buffer() {
        let mut table = UniformTable::from_declarations([("u_speed", UniformType::Float, 1)]);
        table.set_element(0, 0, 3.5f32);
        table.clear_values();
        assert_eq!(table.element::<f32>(0, 0), Some(0.0));
    }

    #[test]
    fn declarations_skip_zero_length_and_duplicates() {
        let table = UniformTable::from_declarations([
            ("a", UniformType::Float, 1),
            ("b", UniformType::Float, 0),
            ("a", UniformType::Vec2, 1),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.buffer_size(), 4);
    }
}
