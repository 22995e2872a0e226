//! File access layer for the Fragedit shader editor.
//!
//! The editor touches the disk in exactly three ways: it reads shader source,
//! writes shader source and uniform snapshots, and stats the shader file to
//! decide whether an auto-reload is due. All three go through the
//! [`FileProvider`] trait so the reload controller can be driven from tests
//! without touching the real file system.
//!
//! # Providers
//!
//! - [`FileSystemProvider`] — Native file system access (blocking `std::fs`)
//! - [`MemoryProvider`] — In-memory storage with a logical modification clock
//!
//! # Absence vs failure
//!
//! A missing file is reported as [`VfsError::NotFound`], separate from other
//! I/O failures. Callers that treat "no file yet" as a normal first-run
//! condition match on that variant and carry on.

mod error;
#[cfg(feature = "filesystem")]
mod filesystem;
mod memory;
mod provider;

pub use error::VfsError;
#[cfg(feature = "filesystem")]
pub use filesystem::FileSystemProvider;
pub use memory::MemoryProvider;
pub use provider::FileProvider;
