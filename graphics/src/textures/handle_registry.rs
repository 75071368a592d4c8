//! Owner of texture handles and the commit pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use texcache_core::identifier::TextureIdentifier;
use texcache_core::sampler::SamplerParameters;
use texcache_core::texture::TextureType;

use super::handle::{HandleDirtyState, TextureConsumer, TextureHandle};
use super::{SamplerObjectRegistry, TextureObject, TextureObjectRegistry};

/// Handles leasing one texture object.
struct TextureHandles {
    texture: Weak<TextureObject>,
    handles: Vec<Weak<TextureHandle>>,
}

/// Hands out [`TextureHandle`]s and turns their requests into committed
/// textures and samplers.
///
/// A texture object's memory budget is the largest request of its live
/// handles, falling back to the default for its texture type.
pub struct TextureHandleRegistry {
    object_registry: TextureObjectRegistry,
    sampler_registry: SamplerObjectRegistry,
    handles_by_texture: Mutex<HashMap<usize, TextureHandles>>,
    new_handles: Mutex<Vec<Weak<TextureHandle>>>,
    dirty: Arc<HandleDirtyState>,
    memory_requests: RwLock<HashMap<TextureType, usize>>,
    dirty_texture_types: Mutex<HashSet<TextureType>>,
}

fn texture_key(texture: &Arc<TextureObject>) -> usize {
    Arc::as_ptr(texture) as usize
}

fn consumer_key(consumer: &Arc<dyn TextureConsumer>) -> usize {
    Arc::as_ptr(consumer) as *const () as usize
}

impl TextureHandleRegistry {
    /// Create a registry on top of the object and sampler registries.
    pub fn new(object_registry: TextureObjectRegistry, sampler_registry: SamplerObjectRegistry) -> Self {
        Self {
            object_registry,
            sampler_registry,
            handles_by_texture: Mutex::new(HashMap::new()),
            new_handles: Mutex::new(Vec::new()),
            dirty: Arc::new(HandleDirtyState::default()),
            memory_requests: RwLock::new(HashMap::new()),
            dirty_texture_types: Mutex::new(HashSet::new()),
        }
    }

    /// The texture object registry.
    pub fn object_registry(&self) -> &TextureObjectRegistry {
        &self.object_registry
    }

    /// The sampler object registry.
    pub fn sampler_registry(&self) -> &SamplerObjectRegistry {
        &self.sampler_registry
    }

    /// Lease the texture `identifier` as `texture_type`.
    ///
    /// Textures and samplers of the new handle are ready after the next
    /// [`commit`](Self::commit). A `memory_request` of 0 means the consumer
    /// has no opinion. Returns `None` if the texture object cannot be
    /// created.
    pub fn allocate_texture_handle(
        &self,
        identifier: &TextureIdentifier,
        texture_type: TextureType,
        sampler_parameters: SamplerParameters,
        memory_request: usize,
        create_bindless_handle: bool,
        consumer: Option<Weak<dyn TextureConsumer>>,
    ) -> Option<Arc<TextureHandle>> {
        let texture = self.object_registry.allocate_texture_object(identifier, texture_type)?;
        let handle = Arc::new(TextureHandle::new(
            Arc::clone(&texture),
            sampler_parameters,
            memory_request,
            create_bindless_handle,
            consumer,
            Arc::downgrade(&self.dirty),
        ));

        self.handles_by_texture
            .lock()
            .entry(texture_key(&texture))
            .or_insert_with(|| TextureHandles {
                texture: Arc::downgrade(&texture),
                handles: Vec::new(),
            })
            .handles
            .push(Arc::downgrade(&handle));
        self.new_handles.lock().push(Arc::downgrade(&handle));
        Some(handle)
    }

    /// Set the budget used by textures of `texture_type` whose handles
    /// request none.
    pub fn set_memory_request_for_texture_type(&self, texture_type: TextureType, bytes: usize) {
        let previous = self.memory_requests.write().insert(texture_type, bytes);
        if previous.unwrap_or(0) != bytes {
            self.dirty_texture_types.lock().insert(texture_type);
        }
    }

    /// The default budget of `texture_type`, 0 if unset.
    pub fn memory_request_for_texture_type(&self, texture_type: TextureType) -> usize {
        self.memory_requests.read().get(&texture_type).copied().unwrap_or(0)
    }

    /// Live handles across all textures.
    pub fn handle_count(&self) -> usize {
        self.handles_by_texture
            .lock()
            .values()
            .map(|entry| entry.handles.iter().filter(|h| h.strong_count() > 0).count())
            .sum()
    }

    /// Run a full commit cycle.
    ///
    /// Recomputes memory budgets, loads and commits dirty textures, creates
    /// sampler state for affected handles and collects garbage. Returns the
    /// consumers whose resources must be rebuilt, each once.
    pub fn commit(&self) -> Vec<Arc<dyn TextureConsumer>> {
        let new_handles: Vec<Arc<TextureHandle>> = std::mem::take(&mut *self.new_handles.lock())
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        let (dropped_textures, dropped_consumers) = self.dirty.take();
        let dirty_types = std::mem::take(&mut *self.dirty_texture_types.lock());

        self.update_memory_requests(&new_handles, &dropped_textures, &dirty_types);

        let committed = self.object_registry.commit();

        let mut seen_handles = HashSet::new();
        let mut affected = Vec::new();
        {
            let handles_by_texture = self.handles_by_texture.lock();
            for texture in &committed {
                if let Some(entry) = handles_by_texture.get(&texture_key(texture)) {
                    affected.extend(entry.handles.iter().filter_map(Weak::upgrade));
                }
            }
        }
        let committed_count = committed.len();
        drop(committed);
        affected.extend(new_handles);
        affected.retain(|handle| seen_handles.insert(Arc::as_ptr(handle) as usize));

        let mut seen_consumers = HashSet::new();
        let mut consumers: Vec<Arc<dyn TextureConsumer>> = Vec::new();
        let mut samplers_allocated = 0usize;
        for handle in &affected {
            if handle.reallocate_sampler(&self.sampler_registry) {
                samplers_allocated += 1;
            }
            if let Some(consumer) = handle.consumer() {
                if seen_consumers.insert(consumer_key(&consumer)) {
                    consumers.push(consumer);
                }
            }
        }
        for consumer in dropped_consumers.iter().filter_map(Weak::upgrade) {
            if seen_consumers.insert(consumer_key(&consumer)) {
                consumers.push(consumer);
            }
        }
        drop(affected);

        if self.dirty.take_sampler_garbage_collection_needed() || samplers_allocated > 0 {
            self.sampler_registry.mark_garbage_collection_needed();
        }
        self.sampler_registry.garbage_collect();
        self.object_registry.garbage_collect();
        self.prune();

        log::debug!(
            "Texture commit: {} textures, {} samplers allocated, {} consumers to refresh",
            committed_count,
            samplers_allocated,
            consumers.len()
        );
        consumers
    }

    fn update_memory_requests(
        &self,
        new_handles: &[Arc<TextureHandle>],
        dropped_textures: &[Weak<TextureObject>],
        dirty_types: &HashSet<TextureType>,
    ) {
        let mut seen = HashSet::new();
        let mut textures = Vec::new();
        let mut add = |texture: Arc<TextureObject>| {
            if seen.insert(texture_key(&texture)) {
                textures.push(texture);
            }
        };
        new_handles.iter().map(|h| Arc::clone(h.texture_object())).for_each(&mut add);
        dropped_textures.iter().filter_map(Weak::upgrade).for_each(&mut add);
        if !dirty_types.is_empty() {
            let handles_by_texture = self.handles_by_texture.lock();
            handles_by_texture
                .values()
                .filter_map(|entry| entry.texture.upgrade())
                .filter(|texture| dirty_types.contains(&texture.texture_type()))
                .for_each(&mut add);
        }

        for texture in &textures {
            let requested = {
                let handles_by_texture = self.handles_by_texture.lock();
                handles_by_texture.get(&texture_key(texture)).and_then(|entry| {
                    entry
                        .handles
                        .iter()
                        .filter_map(Weak::upgrade)
                        .map(|h| h.memory_request())
                        .max()
                })
            };
            // Textures without live handles keep their budget until collected.
            let Some(requested) = requested else {
                continue;
            };
            let target = if requested > 0 {
                requested
            } else {
                self.memory_request_for_texture_type(texture.texture_type())
            };
            texture.set_target_memory(target);
        }
    }

    fn prune(&self) {
        let mut handles_by_texture = self.handles_by_texture.lock();
        handles_by_texture.retain(|_, entry| {
            entry.handles.retain(|h| h.strong_count() > 0);
            entry.texture.strong_count() > 0 && !entry.handles.is_empty()
        });
    }
}

impl std::fmt::Debug for TextureHandleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureHandleRegistry")
            .field("handles", &self.handle_count())
            .field("objects", &self.object_registry)
            .field("samplers", &self.sampler_registry)
            .finish()
    }
}

static_assertions::assert_impl_all!(TextureHandleRegistry: Send, Sync);
