//! Common utilities for texture cache integration tests.
//!
//! Builds caches over an in-memory loader and a counting dummy backend so
//! tests can observe both file opens and device calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use texcache_core::identifier::TextureIdentifier;
use texcache_core::io::{MemoryImage, MemoryLoader};
use texcache_core::sampler::SamplerParameters;
use texcache_core::texture::{CpuTexture, TextureFormat, TextureType};
use texcache_graphics::{
    DeviceCapabilities, DummyBackend, GraphicsDevice, TextureCache, TextureCacheConfig, TextureConsumer, TextureHandle,
};

pub const MIB: usize = 1024 * 1024;

/// A cache together with the loader and backend it runs on.
pub struct TestCache {
    pub loader: Arc<MemoryLoader>,
    pub backend: Arc<DummyBackend>,
    pub cache: TextureCache,
}

impl TestCache {
    /// Cache on a dummy backend with bindless textures and GPU mipmaps.
    pub fn new() -> Self {
        Self::with_backend(DummyBackend::new())
    }

    /// Cache on a dummy backend with no optional features.
    pub fn without_features() -> Self {
        Self::with_backend(DummyBackend::with_capabilities(DeviceCapabilities::default()))
    }

    fn with_backend(backend: DummyBackend) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let loader = Arc::new(MemoryLoader::new());
        let backend = Arc::new(backend);
        let device = GraphicsDevice::new(backend.clone());
        let config = TextureCacheConfig::new().with_load_threads(4);
        let cache = TextureCache::new(device, loader.clone(), config);
        Self { loader, backend, cache }
    }

    /// Register a solid RGBA8 image.
    pub fn insert_rgba(&self, path: &str, width: u32, height: u32) {
        self.loader.insert_image(
            path,
            MemoryImage::new(CpuTexture::filled_2d(width, height, TextureFormat::Rgba8Unorm, &[128; 4])),
        );
    }

    /// Lease `path` as a uv texture.
    pub fn uv_handle(&self, path: &str, memory_request: usize) -> Arc<TextureHandle> {
        self.handle(TextureIdentifier::new(path), TextureType::Uv, memory_request)
    }

    /// Lease `identifier` with default sampling and no consumer.
    pub fn handle(&self, identifier: TextureIdentifier, texture_type: TextureType, memory_request: usize) -> Arc<TextureHandle> {
        self.cache
            .allocate_texture_handle(
                &identifier,
                texture_type,
                SamplerParameters::linear(),
                memory_request,
                false,
                None,
            )
            .expect("texture handle")
    }
}

/// Consumer counting how often it was asked to rebuild.
#[derive(Default)]
pub struct CountingConsumer {
    refreshes: AtomicUsize,
}

impl CountingConsumer {
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::Acquire)
    }

    pub fn weak(self: &Arc<Self>) -> Weak<dyn TextureConsumer> {
        Arc::downgrade(self) as Weak<dyn TextureConsumer>
    }
}

impl TextureConsumer for CountingConsumer {
    fn add_resources_from_textures(&self) {
        self.refreshes.fetch_add(1, Ordering::AcqRel);
    }
}
