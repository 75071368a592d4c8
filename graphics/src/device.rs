//! Graphics device.
//!
//! The [`GraphicsDevice`] is the interface the texture cache uses to create
//! GPU resources. It wraps a [`GpuBackend`], validates requests against the
//! backend's [`DeviceCapabilities`] and keeps weak references to everything
//! it created so live resources can be counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::backend::dummy::DummyBackend;
use crate::backend::GpuBackend;
use crate::error::GraphicsError;
use crate::resources::{BindlessHandle, Sampler, Texture};
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureDimension};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum width and height of 2D textures.
    pub max_texture_dimension_2d: u32,
    /// Maximum extent of 3D textures.
    pub max_texture_dimension_3d: u32,
    /// Maximum layer count of array textures.
    pub max_texture_array_layers: u32,
    /// Whether resident texture+sampler tokens are supported.
    pub bindless_textures: bool,
    /// Whether mip levels can be generated on the GPU.
    pub gpu_mipmap_generation: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension_2d: 16384,
            max_texture_dimension_3d: 2048,
            max_texture_array_layers: 2048,
            bindless_textures: false,
            gpu_mipmap_generation: false,
        }
    }
}

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
/// The texture cache only creates resources from its commit phase, but
/// resources may be dropped from any thread.
///
/// # Example
///
/// ```ignore
/// let device = GraphicsDevice::new(create_backend()?);
/// let texture = device.create_texture(&TextureDescriptor::new_2d(
///     512, 512,
///     TextureFormat::Rgba8Unorm,
///     TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
/// ))?;
/// device.write_texture(&texture, 0, &pixels)?;
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    capabilities: DeviceCapabilities,
    next_resource_id: AtomicU64,
    // Track allocated resources (weak references for counting)
    textures: RwLock<Vec<Weak<Texture>>>,
    samplers: RwLock<Vec<Weak<Sampler>>>,
}

impl GraphicsDevice {
    /// Create a device on top of `backend`.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        let capabilities = backend.capabilities();
        log::info!("GraphicsDevice: using {} ({:?})", backend.name(), capabilities);
        Arc::new(Self {
            backend,
            capabilities,
            next_resource_id: AtomicU64::new(1),
            textures: RwLock::new(Vec::new()),
            samplers: RwLock::new(Vec::new()),
        })
    }

    /// Create a device on a fresh [`DummyBackend`].
    pub fn dummy() -> Arc<Self> {
        Self::new(Arc::new(DummyBackend::new()))
    }

    /// Get the backend.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Get the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Create a GPU texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture dimensions exceed device limits or allocation fails.
    pub fn create_texture(self: &Arc<Self>, descriptor: &TextureDescriptor) -> Result<Arc<Texture>, GraphicsError> {
        let size = descriptor.size;
        if size.width == 0 || size.height == 0 || size.depth == 0 {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }

        let caps = &self.capabilities;
        let (max_extent, max_depth) = match descriptor.dimension {
            TextureDimension::D1 | TextureDimension::D2 => (caps.max_texture_dimension_2d, 1),
            TextureDimension::D2Array => (caps.max_texture_dimension_2d, caps.max_texture_array_layers),
            TextureDimension::D3 => (caps.max_texture_dimension_3d, caps.max_texture_dimension_3d),
        };
        if size.width > max_extent || size.height > max_extent || size.depth > max_depth {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture size {}x{}x{} exceeds maximum {max_extent}x{max_extent}x{max_depth}",
                size.width, size.height, size.depth
            )));
        }

        let max_mips = texcache_core::texture::utils::mip_level_count(
            size.width,
            size.height,
            if descriptor.dimension == TextureDimension::D3 {
                size.depth
            } else {
                1
            },
        );
        if descriptor.mip_level_count == 0 || descriptor.mip_level_count > max_mips {
            return Err(GraphicsError::InvalidParameter(format!(
                "mip level count {} out of range 1..={max_mips}",
                descriptor.mip_level_count
            )));
        }

        let gpu = self.backend.create_texture(descriptor)?;
        let id = self.next_resource_id.fetch_add(1, Ordering::Relaxed);
        let texture = Arc::new(Texture::new(Arc::clone(self), id, descriptor.clone(), gpu));

        // Track it
        if let Ok(mut textures) = self.textures.write() {
            textures.retain(|w| w.strong_count() > 0);
            textures.push(Arc::downgrade(&texture));
        }

        log::trace!(
            "GraphicsDevice: created texture {:?}, size={}x{}x{}, mips={}",
            descriptor.label,
            size.width,
            size.height,
            size.depth,
            descriptor.mip_level_count
        );

        Ok(texture)
    }

    /// Upload one whole mip level of `texture`.
    ///
    /// # Errors
    ///
    /// Returns an error if the level does not exist or `data` has the wrong size.
    pub fn write_texture(&self, texture: &Texture, mip_level: u32, data: &[u8]) -> Result<(), GraphicsError> {
        let descriptor = texture.descriptor();
        if mip_level >= descriptor.mip_level_count {
            return Err(GraphicsError::InvalidParameter(format!(
                "mip level {mip_level} out of range for {} levels",
                descriptor.mip_level_count
            )));
        }

        let size = descriptor
            .size
            .mip_level_size(mip_level, descriptor.dimension == TextureDimension::D3);
        let expected = size.width as usize
            * size.height as usize
            * size.depth as usize
            * descriptor.format.block_size() as usize;
        if data.len() != expected {
            return Err(GraphicsError::InvalidParameter(format!(
                "mip level {mip_level} expects {expected} bytes, got {}",
                data.len()
            )));
        }

        self.backend.write_texture(texture.gpu(), descriptor, mip_level, data)
    }

    /// Fill mip levels 1 and up of `texture` from level 0.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::FeatureNotSupported`] when the backend cannot
    /// generate mips.
    pub fn generate_mipmaps(&self, texture: &Texture) -> Result<(), GraphicsError> {
        if texture.mip_level_count() <= 1 {
            return Ok(());
        }
        self.backend.generate_mipmaps(texture.gpu(), texture.descriptor())
    }

    /// Create a texture sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if sampler creation fails.
    pub fn create_sampler(self: &Arc<Self>, descriptor: &SamplerDescriptor) -> Result<Arc<Sampler>, GraphicsError> {
        let gpu = self.backend.create_sampler(descriptor)?;
        let sampler = Arc::new(Sampler::new(Arc::clone(self), descriptor.clone(), gpu));

        // Track it
        if let Ok(mut samplers) = self.samplers.write() {
            samplers.retain(|w| w.strong_count() > 0);
            samplers.push(Arc::downgrade(&sampler));
        }

        log::trace!("GraphicsDevice: created sampler {:?}", descriptor.label);

        Ok(sampler)
    }

    /// Make `texture` sampled through `sampler` resident and return its token.
    ///
    /// The handle keeps both resources alive and releases the token on drop.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::FeatureNotSupported`] without bindless support.
    pub fn create_bindless_handle(
        self: &Arc<Self>,
        texture: &Arc<Texture>,
        sampler: &Arc<Sampler>,
    ) -> Result<BindlessHandle, GraphicsError> {
        if !self.capabilities.bindless_textures {
            return Err(GraphicsError::FeatureNotSupported("bindless textures".to_string()));
        }
        let value = self.backend.create_bindless_handle(texture.gpu(), sampler.gpu())?;
        log::trace!(
            "GraphicsDevice: bindless handle {} for texture {}",
            value,
            texture.id()
        );
        Ok(BindlessHandle::new(
            Arc::clone(self),
            value,
            Arc::clone(texture),
            Arc::clone(sampler),
        ))
    }

    /// Get the number of live textures created by this device.
    pub fn texture_count(&self) -> usize {
        self.textures
            .read()
            .map(|t| t.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Get the number of live samplers created by this device.
    pub fn sampler_count(&self) -> usize {
        self.samplers
            .read()
            .map(|s| s.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TextureFormat, TextureUsage};

    fn rgba_2d(width: u32, height: u32) -> TextureDescriptor {
        TextureDescriptor::new_2d(
            width,
            height,
            TextureFormat::Rgba8Unorm,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        )
    }

    #[test]
    fn test_create_texture() {
        let device = GraphicsDevice::dummy();
        let texture = device.create_texture(&rgba_2d(512, 256)).unwrap();
        assert_eq!(texture.width(), 512);
        assert_eq!(texture.height(), 256);
        assert_eq!(device.texture_count(), 1);
        drop(texture);
        assert_eq!(device.texture_count(), 0);
    }

    #[test]
    fn test_resource_ids_are_unique() {
        let device = GraphicsDevice::dummy();
        let a = device.create_texture(&rgba_2d(4, 4)).unwrap();
        let b = device.create_texture(&rgba_2d(4, 4)).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_create_texture_zero_size() {
        let device = GraphicsDevice::dummy();
        assert!(device.create_texture(&rgba_2d(0, 512)).is_err());
    }

    #[test]
    fn test_create_texture_over_limit() {
        let device = GraphicsDevice::dummy();
        assert!(device.create_texture(&rgba_2d(32768, 4)).is_err());

        let volume = TextureDescriptor::new_3d(8, 8, 4096, TextureFormat::R32Float, TextureUsage::COPY_DST);
        assert!(device.create_texture(&volume).is_err());
    }

    #[test]
    fn test_too_many_mips() {
        let device = GraphicsDevice::dummy();
        assert!(device.create_texture(&rgba_2d(4, 4).with_mip_levels(4)).is_err());
        assert!(device.create_texture(&rgba_2d(4, 4).with_mip_levels(3)).is_ok());
    }

    #[test]
    fn test_write_texture_validates_size() {
        let device = GraphicsDevice::dummy();
        let texture = device.create_texture(&rgba_2d(4, 4).with_mip_levels(2)).unwrap();
        assert!(device.write_texture(&texture, 0, &[0; 64]).is_ok());
        assert!(device.write_texture(&texture, 1, &[0; 16]).is_ok());
        assert!(device.write_texture(&texture, 1, &[0; 64]).is_err());
        assert!(device.write_texture(&texture, 2, &[0; 4]).is_err());
    }

    #[test]
    fn test_create_sampler() {
        let device = GraphicsDevice::dummy();
        let sampler = device.create_sampler(&SamplerDescriptor::new()).unwrap();
        assert!(sampler.label().is_none());
        assert_eq!(device.sampler_count(), 1);
    }

    #[test]
    fn test_bindless_requires_capability() {
        let device = GraphicsDevice::new(Arc::new(DummyBackend::with_capabilities(
            DeviceCapabilities::default(),
        )));
        let texture = device.create_texture(&rgba_2d(4, 4)).unwrap();
        let sampler = device.create_sampler(&SamplerDescriptor::new()).unwrap();
        let result = device.create_bindless_handle(&texture, &sampler);
        assert!(matches!(result, Err(GraphicsError::FeatureNotSupported(_))));
    }
}
