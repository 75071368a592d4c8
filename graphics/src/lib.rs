//! # Texcache Graphics
//!
//! GPU-side texture and sampler cache.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsDevice`] - Validating front end over a [`GpuBackend`]
//! - [`Texture`], [`Sampler`], [`BindlessHandle`] - Reference-counted device resources
//! - [`TextureCache`] - Deduplicated textures with memory budgets, reload and garbage collection
//! - [`textures::binder`] - Shader buffer fields and bindings for texture handles
//! - Backends: wgpu (feature `wgpu-backend`) and Dummy (for testing)
//!
//! ## Example
//!
//! ```ignore
//! use texcache_graphics::{GraphicsDevice, TextureCache, TextureCacheConfig};
//!
//! let cache = TextureCache::new(GraphicsDevice::dummy(), loader, TextureCacheConfig::default());
//! let handle = cache.allocate_texture_handle(&id, TextureType::Uv, params, 0, false, None);
//! // Once per frame:
//! cache.commit();
//! ```

pub mod backend;
mod device;
mod error;
pub mod parallel;
pub mod resources;
pub mod textures;
pub mod types;

// Re-export main types for convenience
pub use backend::dummy::{DummyBackend, DummyStats};
pub use backend::GpuBackend;
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use parallel::ParConfig;
pub use resources::{BindlessHandle, Sampler, Texture};
pub use textures::{
    NamedTextureHandle, SamplerObject, TextureCache, TextureCacheConfig, TextureCacheStats, TextureConsumer,
    TextureHandle, TextureObject,
};
pub use types::{
    AddressMode, BorderColor, CompareFunction, Extent3d, FilterMode, SamplerDescriptor, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsage,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
pub fn init() {
    log::info!("Texcache Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_device() {
        let device = GraphicsDevice::dummy();
        assert_eq!(device.backend_name(), "Dummy Backend");
        assert!(device.capabilities().bindless_textures);
    }
}
