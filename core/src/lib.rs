//! # Fragedit Core
//!
//! Uniform binding, live reload and persistence for the Fragedit fragment
//! shader editor.
//!
//! - [`uniform`]: descriptors, the packed value table and value transfer
//! - [`snapshot`]: the `.uniformdata` file next to each shader
//! - [`controller`]: compile / rebuild / transfer / restore cycle
//! - [`texture`]: the texture slots bound to units 0..8
//! - [`backend`]: the graphics API seam, with naga and dummy backends
//! - [`inspector`] (feature `inspector`): egui controls for the live table

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
#[cfg(feature = "inspector")]
pub mod inspector;
pub mod snapshot;
pub mod texture;
pub mod uniform;

pub use backend::{ActiveUniform, DummyBackend, ReflectedType, ShaderBackend, UniformUpload};
#[cfg(feature = "naga-backend")]
pub use backend::NagaBackend;
pub use config::{BuiltinUniformNames, ControllerConfig};
pub use controller::{DataAction, FrameInputs, LoadOutcome, ShaderController, ShaderState};
pub use error::{CompileError, ConfigError, SnapshotError, TextureError};
pub use texture::{
    TextureHandle, TextureImage, TextureSlot, TextureSlots, TextureTarget, TEXTURE_SLOT_COUNT,
};
pub use uniform::{
    transfer_values, UniformDescriptor, UniformFlags, UniformHandle, UniformTable, UniformType,
};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
