use super::table::UniformTable;
use super::types::UniformFlags;

/// Copy values from `old` into `new` for every uniform present in both.
///
/// Uniforms match when name, type and array length are all equal; the value
/// bytes are copied verbatim and the "is color" flag follows the value.
/// Old uniforms without a match are dropped, new uniforms without a match
/// keep whatever they held (zero for a freshly built table). Matching
/// tolerates any reordering between the two tables.
///
/// The scan is `old.len() * new.len()`. Shader programs carry tens of
/// uniforms, not thousands; a `(name, type, length)` hash map built once per
/// call would be the replacement if that ever changes.
///
/// Returns the number of uniforms whose value was carried over.
pub fn transfer_values(old: &UniformTable, new: &mut UniformTable) -> usize {
    let mut transferred = 0;
    for old_descriptor in &old.descriptors {
        let Some(target) = new
            .descriptors
            .iter()
            .position(|d| d.same_identity(old_descriptor))
        else {
            continue;
        };
        let Some(source) = old.buffer.get(old_descriptor.value_range()) else {
            continue;
        };

        let range = new.descriptors[target].value_range();
        if let Some(destination) = new.buffer.get_mut(range) {
            destination.copy_from_slice(source);
            let flags = &mut new.descriptors[target].flags;
            flags.set(
                UniformFlags::IS_COLOR,
                old_descriptor.flags.contains(UniformFlags::IS_COLOR),
            );
            transferred += 1;
        }
    }
    transferred
}
