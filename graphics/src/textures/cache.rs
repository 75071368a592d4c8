//! The texture cache facade.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use texcache_core::identifier::TextureIdentifier;
use texcache_core::io::TextureLoader;
use texcache_core::sampler::SamplerParameters;
use texcache_core::texture::TextureType;

use crate::device::GraphicsDevice;
use crate::parallel::ParConfig;

use super::{
    SamplerObjectRegistry, TextureConsumer, TextureHandle, TextureHandleRegistry, TextureObject,
    TextureObjectRegistry,
};

/// Configuration of a [`TextureCache`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureCacheConfig {
    /// Load worker threads; `None` uses the available parallelism.
    pub load_threads: Option<usize>,
    /// Smallest number of textures one load worker takes.
    pub min_load_batch_size: usize,
    /// Initial per-type memory budgets in bytes.
    pub memory_requests: HashMap<TextureType, usize>,
}

impl TextureCacheConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of load worker threads.
    pub fn with_load_threads(mut self, threads: usize) -> Self {
        self.load_threads = Some(threads);
        self
    }

    /// Set the smallest load batch.
    pub fn with_min_load_batch_size(mut self, size: usize) -> Self {
        self.min_load_batch_size = size;
        self
    }

    /// Set the default memory budget of `texture_type`.
    pub fn with_memory_request(mut self, texture_type: TextureType, bytes: usize) -> Self {
        self.memory_requests.insert(texture_type, bytes);
        self
    }

    fn par_config(&self) -> ParConfig {
        ParConfig {
            min_batch_size: self.min_load_batch_size.max(1),
            num_threads: self.load_threads,
        }
    }
}

/// Counters describing a [`TextureCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureCacheStats {
    /// Texture objects in the object table.
    pub texture_objects: usize,
    /// Live texture handles.
    pub texture_handles: usize,
    /// Sampler objects in the sampler registry.
    pub samplers: usize,
    /// Device memory held by committed textures, in bytes.
    pub texture_memory: usize,
}

/// Shared, deduplicated device textures and samplers.
///
/// Consumers lease textures through [`TextureHandle`]s. Nothing touches the
/// device until [`commit`](Self::commit), which loads dirty textures on
/// worker threads, uploads them, refreshes sampler state and notifies the
/// consumers whose resources changed.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use texcache_core::identifier::TextureIdentifier;
/// use texcache_core::io::MemoryLoader;
/// use texcache_core::sampler::SamplerParameters;
/// use texcache_core::texture::TextureType;
/// use texcache_graphics::{GraphicsDevice, TextureCache, TextureCacheConfig};
///
/// let cache = TextureCache::new(
///     GraphicsDevice::dummy(),
///     Arc::new(MemoryLoader::new()),
///     TextureCacheConfig::default(),
/// );
/// let handle = cache
///     .allocate_texture_handle(
///         &TextureIdentifier::new("missing.png"),
///         TextureType::Uv,
///         SamplerParameters::default(),
///         0,
///         false,
///         None,
///     )
///     .unwrap();
/// cache.commit();
/// assert!(!handle.is_valid());
/// ```
pub struct TextureCache {
    registry: TextureHandleRegistry,
}

impl TextureCache {
    /// Create a cache loading through `loader` and uploading to `device`.
    pub fn new(device: Arc<GraphicsDevice>, loader: Arc<dyn TextureLoader>, config: TextureCacheConfig) -> Self {
        let object_registry = TextureObjectRegistry::new(Arc::clone(&device), loader, config.par_config());
        let sampler_registry = SamplerObjectRegistry::new(device);
        let registry = TextureHandleRegistry::new(object_registry, sampler_registry);
        for (texture_type, bytes) in &config.memory_requests {
            registry.set_memory_request_for_texture_type(*texture_type, *bytes);
        }
        log::info!("TextureCache: created with {:?}", config);
        Self { registry }
    }

    /// The device textures are committed to.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        self.registry.object_registry().device()
    }

    /// The handle registry behind the cache.
    pub fn registry(&self) -> &TextureHandleRegistry {
        &self.registry
    }

    /// Lease a texture. See
    /// [`TextureHandleRegistry::allocate_texture_handle`].
    pub fn allocate_texture_handle(
        &self,
        identifier: &TextureIdentifier,
        texture_type: TextureType,
        sampler_parameters: SamplerParameters,
        memory_request: usize,
        create_bindless_handle: bool,
        consumer: Option<Weak<dyn TextureConsumer>>,
    ) -> Option<Arc<TextureHandle>> {
        self.registry.allocate_texture_handle(
            identifier,
            texture_type,
            sampler_parameters,
            memory_request,
            create_bindless_handle,
            consumer,
        )
    }

    /// Get the texture object for `identifier` without a handle.
    pub fn allocate_texture_object(
        &self,
        identifier: &TextureIdentifier,
        texture_type: TextureType,
    ) -> Option<Arc<TextureObject>> {
        self.registry.object_registry().allocate_texture_object(identifier, texture_type)
    }

    /// Set the default memory budget of `texture_type`.
    pub fn set_memory_request_for_texture_type(&self, texture_type: TextureType, bytes: usize) {
        self.registry.set_memory_request_for_texture_type(texture_type, bytes);
    }

    /// Reload every texture read from `path` on the next commit.
    pub fn reload_resource(&self, path: &str) {
        log::debug!("Reloading texture resource {path}");
        self.registry.object_registry().mark_texture_file_path_dirty(path);
    }

    /// Commit all pending changes and notify affected consumers.
    ///
    /// Returns the notified consumers.
    pub fn commit(&self) -> Vec<Arc<dyn TextureConsumer>> {
        let consumers = self.registry.commit();
        for consumer in &consumers {
            consumer.add_resources_from_textures();
        }
        consumers
    }

    /// Current counters.
    pub fn stats(&self) -> TextureCacheStats {
        TextureCacheStats {
            texture_objects: self.registry.object_registry().len(),
            texture_handles: self.registry.handle_count(),
            samplers: self.registry.sampler_registry().len(),
            texture_memory: self.registry.object_registry().total_texture_memory(),
        }
    }
}

impl std::fmt::Debug for TextureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureCache").field("stats", &self.stats()).finish()
    }
}

static_assertions::assert_impl_all!(TextureCache: Send, Sync);
