//! Texture types and descriptors.

use super::Extent3d;
use bitflags::bitflags;

// Re-export CPU-side types from core.
pub use texcache_core::texture::{TextureDimension, TextureFormat};
use texcache_core::texture::{utils, CpuTexture};

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Size of the texture. `depth` is the layer count for array textures.
    pub size: Extent3d,
    /// Texture dimension.
    pub dimension: TextureDimension,
    /// Mip level count.
    pub mip_level_count: u32,
    /// Texture format.
    pub format: TextureFormat,
    /// Usage flags.
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3d::new_2d(width, height),
            dimension: TextureDimension::D2,
            mip_level_count: 1,
            format,
            usage,
        }
    }

    /// Create a new 3D texture descriptor.
    pub fn new_3d(width: u32, height: u32, depth: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            size: Extent3d::new_3d(width, height, depth),
            dimension: TextureDimension::D3,
            ..Self::new_2d(width, height, format, usage)
        }
    }

    /// Descriptor for uploading `texture`, sampled by shaders.
    ///
    /// Allocates a full mip chain if the texture asks for generated mips.
    pub fn for_upload(texture: &CpuTexture) -> Self {
        let mip_level_count = if texture.generate_mipmaps {
            texture.full_mip_level_count()
        } else {
            1
        };
        Self {
            label: texture.name.clone(),
            size: Extent3d::new_3d(texture.width, texture.height, texture.depth),
            dimension: texture.dimension,
            mip_level_count,
            format: texture.format,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the mip level count.
    pub fn with_mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    /// Bytes of device memory the texture occupies, all mips included.
    pub fn memory_size(&self) -> usize {
        utils::texture_memory_size(
            self.size.width,
            self.size.height,
            self.size.depth,
            self.dimension,
            self.format,
            self.mip_level_count,
        )
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            size: Extent3d::default(),
            dimension: TextureDimension::D2,
            mip_level_count: 1,
            format: TextureFormat::default(),
            usage: TextureUsage::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_upload_with_mips() {
        let texture = CpuTexture::filled_2d(8, 8, TextureFormat::R8Unorm, &[0]).with_generate_mipmaps(true);
        let desc = TextureDescriptor::for_upload(&texture);
        assert_eq!(desc.mip_level_count, 4);
        assert_eq!(desc.memory_size(), 64 + 16 + 4 + 1);
        assert!(desc.usage.contains(TextureUsage::COPY_DST));
    }

    #[test]
    fn test_array_keeps_layers() {
        let texture = CpuTexture::new_2d_array(2, 2, 5, TextureFormat::R8Unorm, vec![0; 20]);
        let desc = TextureDescriptor::for_upload(&texture);
        assert_eq!(desc.dimension, TextureDimension::D2Array);
        assert_eq!(desc.size.depth, 5);
        assert_eq!(desc.memory_size(), 20);
    }
}
