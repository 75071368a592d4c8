//! Per-consumer texture leases.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use texcache_core::sampler::SamplerParameters;

use super::{SamplerObject, SamplerObjectRegistry, TextureObject};

/// Something whose shader resources are built from texture handles.
///
/// Consumers are told to rebuild after a commit changed one of their
/// textures or samplers, or dropped one of their handles.
pub trait TextureConsumer: Send + Sync {
    /// Rebuild shader resources from the current textures and samplers.
    fn add_resources_from_textures(&self);
}

/// Changes recorded by dropped handles, consumed by the next commit.
#[derive(Default)]
pub(crate) struct HandleDirtyState {
    textures: Mutex<Vec<Weak<TextureObject>>>,
    consumers: Mutex<Vec<Weak<dyn TextureConsumer>>>,
    sampler_garbage_collection_needed: AtomicBool,
}

impl HandleDirtyState {
    pub(crate) fn take(&self) -> (Vec<Weak<TextureObject>>, Vec<Weak<dyn TextureConsumer>>) {
        let textures = std::mem::take(&mut *self.textures.lock());
        let consumers = std::mem::take(&mut *self.consumers.lock());
        (textures, consumers)
    }

    pub(crate) fn take_sampler_garbage_collection_needed(&self) -> bool {
        self.sampler_garbage_collection_needed.swap(false, Ordering::AcqRel)
    }
}

/// A consumer's lease on a texture object.
///
/// The handle keeps its texture object alive and carries what the consumer
/// asked for: sampling parameters, a memory budget and bindless access.
/// The sampler is created by the commit that first sees the handle.
/// Dropping the handle schedules a budget update for the texture and a
/// refresh of the consumer.
pub struct TextureHandle {
    texture_object: Arc<TextureObject>,
    sampler_parameters: SamplerParameters,
    memory_request: usize,
    create_bindless_handle: bool,
    consumer: Option<Weak<dyn TextureConsumer>>,
    sampler_object: Mutex<Option<Arc<SamplerObject>>>,
    dirty_state: Weak<HandleDirtyState>,
}

impl TextureHandle {
    pub(crate) fn new(
        texture_object: Arc<TextureObject>,
        sampler_parameters: SamplerParameters,
        memory_request: usize,
        create_bindless_handle: bool,
        consumer: Option<Weak<dyn TextureConsumer>>,
        dirty_state: Weak<HandleDirtyState>,
    ) -> Self {
        Self {
            texture_object,
            sampler_parameters,
            memory_request,
            create_bindless_handle,
            consumer,
            sampler_object: Mutex::new(None),
            dirty_state,
        }
    }

    /// The leased texture object.
    pub fn texture_object(&self) -> &Arc<TextureObject> {
        &self.texture_object
    }

    /// Requested sampling parameters.
    pub fn sampler_parameters(&self) -> &SamplerParameters {
        &self.sampler_parameters
    }

    /// Requested memory budget in bytes; 0 means no request.
    pub fn memory_request(&self) -> usize {
        self.memory_request
    }

    /// Returns true if the consumer samples through bindless tokens.
    pub fn create_bindless_handle(&self) -> bool {
        self.create_bindless_handle
    }

    /// The consumer, if it is still alive.
    pub fn consumer(&self) -> Option<Arc<dyn TextureConsumer>> {
        self.consumer.as_ref().and_then(Weak::upgrade)
    }

    /// Sampler state created by the last commit.
    pub fn sampler_object(&self) -> Option<Arc<SamplerObject>> {
        self.sampler_object.lock().clone()
    }

    /// Returns true if the texture has usable device resources.
    pub fn is_valid(&self) -> bool {
        self.texture_object.is_valid()
    }

    /// Create new sampler state unless the current one still fits.
    ///
    /// Returns true if a sampler was allocated.
    pub(crate) fn reallocate_sampler(&self, registry: &SamplerObjectRegistry) -> bool {
        let mut slot = self.sampler_object.lock();
        if let Some(current) = slot.as_ref() {
            if current.is_current(&self.texture_object, &self.sampler_parameters, self.create_bindless_handle) {
                return false;
            }
        }
        *slot = registry.allocate_sampler(&self.texture_object, &self.sampler_parameters, self.create_bindless_handle);
        true
    }
}

impl Drop for TextureHandle {
    fn drop(&mut self) {
        let Some(state) = self.dirty_state.upgrade() else {
            return;
        };
        state.textures.lock().push(Arc::downgrade(&self.texture_object));
        if let Some(consumer) = self.consumer.take() {
            state.consumers.lock().push(consumer);
        }
        state.sampler_garbage_collection_needed.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureHandle")
            .field("texture", self.texture_object.identifier())
            .field("memory_request", &self.memory_request)
            .field("create_bindless_handle", &self.create_bindless_handle)
            .finish()
    }
}

static_assertions::assert_impl_all!(TextureHandle: Send, Sync);
