//! GPU texture resource.

use std::sync::Arc;

use crate::backend::GpuTexture;
use crate::device::GraphicsDevice;
use crate::types::{Extent3d, TextureDescriptor, TextureDimension, TextureFormat};

/// A GPU texture resource.
///
/// Textures are created by [`GraphicsDevice::create_texture`] and are reference-counted.
/// They hold a strong reference to their parent device, keeping it alive.
/// Every texture gets a device-unique [`id`](Self::id), which consumers use
/// to notice that a texture object swapped its GPU texture.
///
/// # Example
///
/// ```ignore
/// let texture = device.create_texture(&TextureDescriptor::new_2d(
///     1920, 1080,
///     TextureFormat::Rgba8Unorm,
///     TextureUsage::TEXTURE_BINDING,
/// ))?;
/// println!("Texture size: {}x{}", texture.width(), texture.height());
/// ```
pub struct Texture {
    device: Arc<GraphicsDevice>,
    id: u64,
    descriptor: TextureDescriptor,
    gpu: GpuTexture,
}

impl Texture {
    /// Create a new texture (called by GraphicsDevice).
    pub(crate) fn new(device: Arc<GraphicsDevice>, id: u64, descriptor: TextureDescriptor, gpu: GpuTexture) -> Self {
        Self {
            device,
            id,
            descriptor,
            gpu,
        }
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Device-unique resource id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the backend texture.
    pub fn gpu(&self) -> &GpuTexture {
        &self.gpu
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Get the texture size.
    pub fn size(&self) -> Extent3d {
        self.descriptor.size
    }

    /// Get the texture width.
    pub fn width(&self) -> u32 {
        self.descriptor.size.width
    }

    /// Get the texture height.
    pub fn height(&self) -> u32 {
        self.descriptor.size.height
    }

    /// Get the texture depth, or layer count for array textures.
    pub fn depth(&self) -> u32 {
        self.descriptor.size.depth
    }

    /// Get the texture dimension.
    pub fn dimension(&self) -> TextureDimension {
        self.descriptor.dimension
    }

    /// Get the texture format.
    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    /// Get the mip level count.
    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count
    }

    /// Bytes of device memory this texture occupies.
    pub fn memory_size(&self) -> usize {
        self.descriptor.memory_size()
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        log::trace!("Texture {} ({:?}) destroyed", self.id, self.descriptor.label);
        self.device.backend().destroy_texture(&self.gpu);
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("size", &self.descriptor.size)
            .field("format", &self.descriptor.format)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Texture is Send + Sync
static_assertions::assert_impl_all!(Texture: Send, Sync);
