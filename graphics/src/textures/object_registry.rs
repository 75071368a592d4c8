//! Deduplicating owner of texture objects.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use texcache_core::identifier::TextureIdentifier;
use texcache_core::io::TextureLoader;
use texcache_core::texture::TextureType;

use crate::device::GraphicsDevice;
use crate::parallel::{par_for_each, ParConfig};

use super::TextureObject;

/// Objects and file paths waiting for the next commit.
///
/// Pushing never touches the object table, so it is safe from any thread
/// and from drop handlers.
#[derive(Default)]
pub(crate) struct DirtyQueue {
    objects: Mutex<Vec<Weak<TextureObject>>>,
    file_paths: Mutex<Vec<String>>,
}

impl DirtyQueue {
    pub(crate) fn push_object(&self, object: Weak<TextureObject>) {
        self.objects.lock().push(object);
    }

    pub(crate) fn push_file_path(&self, path: String) {
        self.file_paths.lock().push(path);
    }

    fn take(&self) -> (Vec<Weak<TextureObject>>, Vec<String>) {
        let objects = std::mem::take(&mut *self.objects.lock());
        let file_paths = std::mem::take(&mut *self.file_paths.lock());
        (objects, file_paths)
    }
}

/// Creates, loads, commits and garbage-collects [`TextureObject`]s.
///
/// The registry holds the only long-lived strong reference to each object.
/// Objects nobody else references are dropped by
/// [`garbage_collect`](Self::garbage_collect).
pub struct TextureObjectRegistry {
    device: Arc<GraphicsDevice>,
    loader: Arc<dyn TextureLoader>,
    par_config: ParConfig,
    objects: Mutex<HashMap<TextureIdentifier, Arc<TextureObject>>>,
    objects_by_path: Mutex<HashMap<String, Vec<Weak<TextureObject>>>>,
    dirty: Arc<DirtyQueue>,
    total_memory: Arc<AtomicUsize>,
}

impl TextureObjectRegistry {
    /// Create an empty registry.
    pub fn new(device: Arc<GraphicsDevice>, loader: Arc<dyn TextureLoader>, par_config: ParConfig) -> Self {
        Self {
            device,
            loader,
            par_config,
            objects: Mutex::new(HashMap::new()),
            objects_by_path: Mutex::new(HashMap::new()),
            dirty: Arc::new(DirtyQueue::default()),
            total_memory: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The device objects are committed to.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the object for `identifier`, creating it on first use.
    ///
    /// New objects are loaded by the next [`commit`](Self::commit). Returns
    /// `None` if `texture_type` cannot serve `identifier`, or if the object
    /// already exists with another type.
    pub fn allocate_texture_object(
        &self,
        identifier: &TextureIdentifier,
        texture_type: TextureType,
    ) -> Option<Arc<TextureObject>> {
        let mut objects = self.objects.lock();
        if let Some(existing) = objects.get(identifier) {
            if existing.texture_type() != texture_type {
                log::error!(
                    "Texture {identifier} requested as {:?} but cached as {:?}",
                    texture_type,
                    existing.texture_type()
                );
                return None;
            }
            return Some(Arc::clone(existing));
        }

        let object = match TextureObject::new(
            identifier.clone(),
            texture_type,
            Arc::clone(&self.total_memory),
            Arc::downgrade(&self.dirty),
        ) {
            Ok(object) => object,
            Err(e) => {
                log::error!("Cannot create texture object for {identifier}: {e}");
                return None;
            }
        };
        objects.insert(identifier.clone(), Arc::clone(&object));
        drop(objects);

        if !object.is_dynamic() {
            self.objects_by_path
                .lock()
                .entry(identifier.file_path.clone())
                .or_default()
                .push(Arc::downgrade(&object));
        }
        self.dirty.push_object(Arc::downgrade(&object));

        log::trace!("Created {:?} texture object {identifier}", texture_type);
        Some(object)
    }

    /// Reload every object backed by `path` on the next commit.
    pub fn mark_texture_file_path_dirty(&self, path: impl Into<String>) {
        self.dirty.push_file_path(path.into());
    }

    /// Reload `object` on the next commit.
    pub fn mark_texture_object_dirty(&self, object: Weak<TextureObject>) {
        self.dirty.push_object(object);
    }

    /// Load and commit all dirty objects.
    ///
    /// Loads run in parallel; commits run on the calling thread, in a
    /// deterministic order, after every load finished. Returns the
    /// committed objects.
    pub fn commit(&self) -> Vec<Arc<TextureObject>> {
        let (dirty_objects, dirty_paths) = self.dirty.take();
        if dirty_objects.is_empty() && dirty_paths.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut working_set = Vec::new();
        let mut add = |object: Arc<TextureObject>| {
            if seen.insert(Arc::as_ptr(&object) as usize) {
                working_set.push(object);
            }
        };

        {
            let objects_by_path = self.objects_by_path.lock();
            for path in &dirty_paths {
                let Some(objects) = objects_by_path.get(path) else {
                    log::trace!("No texture objects for dirty path {path}");
                    continue;
                };
                objects.iter().filter_map(Weak::upgrade).for_each(&mut add);
            }
        }
        dirty_objects.iter().filter_map(Weak::upgrade).for_each(&mut add);

        let loader = self.loader.as_ref();
        par_for_each(&working_set, &self.par_config, &|object: &Arc<TextureObject>| object.load(loader));
        for object in &working_set {
            object.commit(&self.device);
        }

        log::debug!(
            "Committed {} texture objects, {} bytes of texture memory",
            working_set.len(),
            self.total_texture_memory()
        );
        working_set
    }

    /// Drop objects only the registry references.
    ///
    /// Must not run while objects are being allocated on other threads.
    pub fn garbage_collect(&self) {
        let mut objects = self.objects.lock();
        let before = objects.len();
        objects.retain(|_, object| Arc::strong_count(object) > 1);
        let removed = before - objects.len();
        drop(objects);

        let mut objects_by_path = self.objects_by_path.lock();
        objects_by_path.retain(|_, objects| {
            objects.retain(|object| object.strong_count() > 0);
            !objects.is_empty()
        });

        if removed > 0 {
            log::debug!("Garbage collected {removed} texture objects");
        }
    }

    /// Number of live objects in the table.
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }

    /// Device memory held by all committed objects.
    pub fn total_texture_memory(&self) -> usize {
        self.total_memory.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for TextureObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureObjectRegistry")
            .field("objects", &self.len())
            .field("total_memory", &self.total_texture_memory())
            .finish()
    }
}

static_assertions::assert_impl_all!(TextureObjectRegistry: Send, Sync);
