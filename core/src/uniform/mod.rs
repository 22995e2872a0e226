//! Uniform descriptors, the packed value table and value transfer.
//!
//! A compiled shader program exposes a set of active uniforms. The editor
//! mirrors them in a [`UniformTable`]: an ordered list of
//! [`UniformDescriptor`]s plus one contiguous byte buffer holding every
//! uniform's live value. Descriptors refer into the buffer by byte offset,
//! never by address, so the table can be cloned, serialized and rebuilt
//! without any pointer fix-ups.
//!
//! # Lifecycle
//!
//! ```text
//! compile ok ──► UniformTable::build(backend) ──► transfer_values(old, new)
//!                         │                              ▲
//!                         └── snapshot::load_snapshot ───┘
//! ```
//!
//! Descriptors and buffer are always created and dropped together. Borrowed
//! views handed to UI or rendering code are only valid until the next
//! rebuild.

mod descriptor;
mod table;
mod transfer;
mod types;

pub use descriptor::{UniformDescriptor, MAX_UNIFORM_NAME_LEN};
pub use table::UniformTable;
pub use transfer::transfer_values;
pub use types::{UniformFlags, UniformHandle, UniformType};
