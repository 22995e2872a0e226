//! Uniformdata snapshots: the on-disk copy of a uniform table.
//!
//! A snapshot lives next to its shader as `<shader path>.uniformdata`. It
//! stores the descriptors (name, type, array length, flags, buffer-relative
//! offset) followed by the raw value buffer, all integers little-endian:
//!
//! ```text
//! offset 0:  [u8; 4]  magic = "UDAT"
//! offset 4:  u32      version = 1
//! offset 8:  u32      uniform_count
//! offset 12: u64      buffer_size
//! offset 20: record[uniform_count], 84 bytes each:
//!              [u8; 64] name, NUL padded
//!              u32      type code
//!              u32      array_length
//!              u32      flags
//!              u64      value_offset
//! then:      u8[buffer_size]
//! ```
//!
//! Loading never replaces the live table. The decoded table is only a
//! staging copy that feeds [`transfer_values`](crate::uniform::transfer_values).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use fragedit_vfs::FileProvider;

use crate::error::SnapshotError;
use crate::uniform::{
    UniformDescriptor, UniformFlags, UniformTable, UniformType, MAX_UNIFORM_NAME_LEN,
};

/// Suffix appended to the shader path.
pub const SNAPSHOT_EXTENSION: &str = "uniformdata";
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"UDAT";
pub const SNAPSHOT_VERSION: u32 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 20;
/// Size of one descriptor record in bytes.
pub const RECORD_SIZE: usize = 84;

const NAME_FIELD_SIZE: usize = MAX_UNIFORM_NAME_LEN + 1;

/// Snapshot location for a shader: the shader path with `.uniformdata` appended.
pub fn snapshot_path(shader_path: &Path) -> PathBuf {
    let mut path = OsString::from(shader_path.as_os_str());
    path.push(".");
    path.push(SNAPSHOT_EXTENSION);
    PathBuf::from(path)
}

/// Serialize a table into snapshot bytes.
pub fn encode(table: &UniformTable) -> Vec<u8> {
    let mut out =
        Vec::with_capacity(HEADER_SIZE + RECORD_SIZE * table.len() + table.buffer_size());
    out.extend_from_slice(&SNAPSHOT_MAGIC);
    out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    out.extend_from_slice(&(table.len() as u32).to_le_bytes());
    out.extend_from_slice(&(table.buffer_size() as u64).to_le_bytes());

    for descriptor in table.descriptors() {
        let mut name = [0u8; NAME_FIELD_SIZE];
        let bytes = descriptor.name().as_bytes();
        name[..bytes.len()].copy_from_slice(bytes);
        out.extend_from_slice(&name);
        out.extend_from_slice(&descriptor.ty().code().to_le_bytes());
        out.extend_from_slice(&descriptor.array_length().to_le_bytes());
        out.extend_from_slice(&descriptor.flags().bits().to_le_bytes());
        out.extend_from_slice(&(descriptor.value_offset() as u64).to_le_bytes());
    }

    out.extend_from_slice(table.buffer());
    out
}

/// Why a single record was dropped while decoding.
#[derive(Debug, thiserror::Error)]
enum RecordError {
    #[error("name is not NUL terminated UTF-8")]
    BadName,
    #[error("empty name")]
    EmptyName,
    #[error("unknown type code {0}")]
    UnknownType(u32),
    #[error("zero array length")]
    ZeroLength,
    #[error("value range lies outside the {0} byte buffer")]
    OutOfBounds(usize),
    #[error("duplicate of an earlier record")]
    Duplicate,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SnapshotError> {
        let end = self.pos + N;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(SnapshotError::Truncated {
                needed: end,
                actual: self.bytes.len(),
            })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32, SnapshotError> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Result<u64, SnapshotError> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Parse snapshot bytes into a staging table.
///
/// The header and overall length are checked before anything else is read;
/// a file that fails them is rejected whole. Records that are individually
/// unusable are skipped with a warning.
pub fn decode(bytes: &[u8]) -> Result<UniformTable, SnapshotError> {
    let mut reader = Reader::new(bytes);

    let magic: [u8; 4] = reader.read_array()?;
    if magic != SNAPSHOT_MAGIC {
        return Err(SnapshotError::BadMagic(magic));
    }
    let version = reader.read_u32()?;
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    let count = reader.read_u32()?;
    let buffer_size = reader.read_u64()?;

    let expected = (HEADER_SIZE as u64 + RECORD_SIZE as u64 * u64::from(count))
        .checked_add(buffer_size)
        .unwrap_or(u64::MAX);
    if expected != bytes.len() as u64 {
        return Err(SnapshotError::SizeMismatch {
            expected,
            actual: bytes.len() as u64,
        });
    }
    // The length check above bounds buffer_size by the slice length.
    let buffer_size = buffer_size as usize;

    let mut descriptors: Vec<UniformDescriptor> = Vec::with_capacity(count as usize);
    for index in 0..count {
        let name: [u8; NAME_FIELD_SIZE] = reader.read_array()?;
        let code = reader.read_u32()?;
        let array_length = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let offset = reader.read_u64()?;

        match decode_record(&name, code, array_length, flags, offset, buffer_size) {
            Ok(descriptor) if descriptors.iter().any(|d| d.name == descriptor.name) => {
                log::warn!(
                    "Skipping uniformdata record {index} ('{}'): {}",
                    descriptor.name,
                    RecordError::Duplicate
                );
            }
            Ok(descriptor) => descriptors.push(descriptor),
            Err(err) => log::warn!("Skipping uniformdata record {index}: {err}"),
        }
    }

    Ok(UniformTable::from_parts(descriptors, reader.rest().to_vec()))
}

fn decode_record(
    name: &[u8; NAME_FIELD_SIZE],
    code: u32,
    array_length: u32,
    flags: u32,
    offset: u64,
    buffer_size: usize,
) -> Result<UniformDescriptor, RecordError> {
    let end = name
        .iter()
        .position(|&b| b == 0)
        .ok_or(RecordError::BadName)?;
    let name = std::str::from_utf8(&name[..end]).map_err(|_| RecordError::BadName)?;
    if name.is_empty() {
        return Err(RecordError::EmptyName);
    }
    let ty = UniformType::from_code(code).ok_or(RecordError::UnknownType(code))?;
    if array_length == 0 {
        return Err(RecordError::ZeroLength);
    }

    let mut flags = UniformFlags::from_bits_truncate(flags);
    if !ty.supports_color() {
        flags.remove(UniformFlags::IS_COLOR);
    }
    let mut descriptor = UniformDescriptor::new(name, ty, array_length, None, flags);

    let in_bounds = usize::try_from(offset)
        .ok()
        .and_then(|offset| {
            offset
                .checked_add(descriptor.total_byte_size())
                .map(|end| (offset, end))
        })
        .filter(|&(_, end)| end <= buffer_size);
    let (offset, _) = in_bounds.ok_or(RecordError::OutOfBounds(buffer_size))?;
    descriptor.value_offset = offset;
    Ok(descriptor)
}

/// Write `table` as the snapshot of `shader_path`.
///
/// Returns `Ok(false)` without touching the file system when there is no
/// shader path or the table has no uniforms.
pub fn write_snapshot<F: FileProvider + ?Sized>(
    fs: &F,
    shader_path: Option<&Path>,
    table: &UniformTable,
) -> Result<bool, SnapshotError> {
    let Some(shader_path) = shader_path else {
        return Ok(false);
    };
    if table.is_empty() {
        return Ok(false);
    }
    let path = snapshot_path(shader_path);
    fs.write(&path, &encode(table))?;
    log::debug!(
        "Wrote {} uniforms ({} bytes of values) to {}",
        table.len(),
        table.buffer_size(),
        path.display()
    );
    Ok(true)
}

/// Read the snapshot of `shader_path` into a staging table.
///
/// A missing file or an unset path is `Ok(None)`.
pub fn read_snapshot<F: FileProvider + ?Sized>(
    fs: &F,
    shader_path: Option<&Path>,
) -> Result<Option<UniformTable>, SnapshotError> {
    let Some(shader_path) = shader_path else {
        return Ok(None);
    };
    let path = snapshot_path(shader_path);
    let bytes = match fs.read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    decode(&bytes).map(Some)
}

/// Read the snapshot of `shader_path` and transfer its values into `live`.
///
/// `live` is only written once the whole file has been validated. Returns
/// the number of uniforms whose value was restored.
pub fn load_snapshot<F: FileProvider + ?Sized>(
    fs: &F,
    shader_path: Option<&Path>,
    live: &mut UniformTable,
) -> Result<usize, SnapshotError> {
    match read_snapshot(fs, shader_path)? {
        Some(staging) => Ok(live.transfer_from(&staging)),
        None => Ok(0),
    }
}
