//! Texture slots.
//!
//! The editor has a fixed bank of [`TEXTURE_SLOT_COUNT`] slots. Slot `i` is
//! bound to texture unit `i` every frame, so the value of a sampler uniform
//! picks a slot. Images are decoded to RGBA8 here and handed to the backend,
//! which owns the texture objects.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::TextureError;

/// Number of texture slots, and of texture units they bind to.
pub const TEXTURE_SLOT_COUNT: usize = 8;

/// Cell of each cube face in a horizontal cross, as (column, row), in
/// +X, -X, +Y, -Y, +Z, -Z order.
const CROSS_FACES: [(u32, u32); 6] = [(2, 1), (0, 1), (1, 0), (1, 2), (1, 1), (3, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTarget {
    #[default]
    Texture2D,
    Cube,
}

impl TextureTarget {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Texture2D => "2D",
            Self::Cube => "Cube",
        }
    }
}

/// Backend texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Decoded RGBA8 pixels ready for upload.
///
/// A 2D texture has one face. A cube map has six square faces in
/// +X, -X, +Y, -Y, +Z, -Z order; `width` and `height` are the face size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub target: TextureTarget,
    pub width: u32,
    pub height: u32,
    pub faces: Vec<Vec<u8>>,
}

impl TextureImage {
    /// Decode an encoded image file (PNG, JPEG, BMP, TGA or HDR).
    pub fn decode(bytes: &[u8], target: TextureTarget) -> Result<Self, TextureError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        match target {
            TextureTarget::Texture2D => Ok(Self {
                target,
                width: rgba.width(),
                height: rgba.height(),
                faces: vec![rgba.into_raw()],
            }),
            TextureTarget::Cube => Self::from_cross(&rgba),
        }
    }

    fn from_cross(cross: &RgbaImage) -> Result<Self, TextureError> {
        let (width, height) = cross.dimensions();
        let size = width / 4;
        if size == 0 || width != size * 4 || height != size * 3 {
            return Err(TextureError::NotACubeCross { width, height });
        }
        let faces = CROSS_FACES
            .iter()
            .map(|&(column, row)| {
                image::imageops::crop_imm(cross, column * size, row * size, size, size)
                    .to_image()
                    .into_raw()
            })
            .collect();
        Ok(Self {
            target: TextureTarget::Cube,
            width: size,
            height: size,
            faces,
        })
    }
}

/// One texture slot: a target and, when filled, the texture loaded into it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureSlot {
    target: TextureTarget,
    texture: Option<TextureHandle>,
    size: (u32, u32),
    image_path: Option<PathBuf>,
}

impl TextureSlot {
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Image size in pixels (face size for cube maps).
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.texture.is_none()
    }
}

/// The fixed bank of texture slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureSlots {
    slots: [TextureSlot; TEXTURE_SLOT_COUNT],
}

impl TextureSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&TextureSlot> {
        self.slots.get(index)
    }

    /// Slots in texture unit order.
    pub fn iter(&self) -> impl Iterator<Item = &TextureSlot> {
        self.slots.iter()
    }

    /// Put a freshly created texture into slot `index`.
    ///
    /// Returns the texture it replaced, which the caller must release.
    pub(crate) fn assign(
        &mut self,
        index: usize,
        image_path: &Path,
        image: &TextureImage,
        texture: TextureHandle,
    ) -> Result<Option<TextureHandle>, TextureError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(TextureError::NoSuchSlot(index))?;
        let previous = slot.texture.replace(texture);
        slot.target = image.target;
        slot.size = (image.width, image.height);
        slot.image_path = Some(image_path.to_path_buf());
        Ok(previous)
    }

    /// Empty slot `index`. Returns the texture it held.
    ///
    /// The target is kept, so the unit stays bound to the same kind of texture.
    pub(crate) fn clear(&mut self, index: usize) -> Option<TextureHandle> {
        let slot = self.slots.get_mut(index)?;
        slot.image_path = None;
        slot.size = (0, 0);
        slot.texture.take()
    }
}

/// What a texture unit is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub target: TextureTarget,
    pub texture: Option<TextureHandle>,
}

/// Size and kind of a created texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub target: TextureTarget,
    pub width: u32,
    pub height: u32,
}

/// CPU-side record of texture objects and unit bindings, for backends that
/// hand the actual GPU work to a renderer.
#[derive(Debug, Default)]
pub struct TextureStore {
    next: u64,
    textures: HashMap<TextureHandle, TextureInfo>,
    bindings: HashMap<u32, TextureBinding>,
}

impl TextureStore {
    pub fn create(&mut self, image: &TextureImage) -> TextureHandle {
        self.next += 1;
        let handle = TextureHandle::new(self.next);
        self.textures.insert(
            handle,
            TextureInfo {
                target: image.target,
                width: image.width,
                height: image.height,
            },
        );
        handle
    }

    /// Forget `texture`. Returns `false` if it did not exist.
    pub fn release(&mut self, texture: TextureHandle) -> bool {
        self.textures.remove(&texture).is_some()
    }

    pub fn bind(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureHandle>) {
        self.bindings.insert(unit, TextureBinding { target, texture });
    }

    pub fn texture(&self, texture: TextureHandle) -> Option<&TextureInfo> {
        self.textures.get(&texture)
    }

    /// Number of live texture objects.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn binding(&self, unit: u32) -> Option<&TextureBinding> {
        self.bindings.get(&unit)
    }
}
