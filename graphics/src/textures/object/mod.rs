//! Texture objects.
//!
//! A [`TextureObject`] owns the device texture(s) for one
//! [`TextureIdentifier`]. Objects are created and deduplicated by the
//! [`TextureObjectRegistry`](super::TextureObjectRegistry) and go through a
//! two-phase update:
//!
//! 1. [`load`](TextureObject::load) reads and filters texels into a staging
//!    buffer. It runs on load workers, in parallel with other objects, and
//!    never touches the device.
//! 2. [`commit`](TextureObject::commit) replaces the device resources with
//!    the staged texels. It runs serially on the commit thread.
//!
//! The staging buffer and the committed resources sit behind separate
//! locks, so consumers can read the committed texture while a load is in
//! progress.

mod field;
mod ptex;
mod udim;
mod upload;
mod uv;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use texcache_core::identifier::{DynamicTextureSource, GridSelector, SubtextureIdentifier, TextureIdentifier};
use texcache_core::io::TextureLoader;
use texcache_core::math::{BBox3d, Mat4d};
use texcache_core::sampler::WrapMode;
use texcache_core::texture::TextureType;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::types::TextureDescriptor;

use super::object_registry::DirtyQueue;

pub(crate) use upload::upload_texture;
pub use udim::{tile_path, FIRST_TILE, TILE_COUNT, UDIM_PATTERN};

/// How an object gets its texels. Fixed at creation.
enum TextureSource {
    /// 2D image file.
    UvAsset,
    /// Application-provided texels.
    UvDynamic(Option<Arc<dyn DynamicTextureSource>>),
    /// Grid of a volume file.
    Field(GridSelector),
    /// Per-face atlas file.
    Ptex,
    /// `<UDIM>` tile set.
    Udim,
}

/// Texels read by the last load, waiting for commit.
enum Staged {
    Uv(uv::UvStaging),
    Field(field::FieldStaging),
    Ptex(ptex::PtexStaging),
    Udim(udim::UdimStaging),
}

/// Device state after the last commit.
#[derive(Clone)]
struct Committed {
    texture: Option<Arc<Texture>>,
    layout: Option<Arc<Texture>>,
    wrap: [WrapMode; 2],
    bounding_box: BBox3d,
    sampling_transform: Mat4d,
}

impl Default for Committed {
    fn default() -> Self {
        Self {
            texture: None,
            layout: None,
            wrap: [WrapMode::NoOpinion; 2],
            bounding_box: BBox3d::default(),
            sampling_transform: Mat4d::identity(),
        }
    }
}

impl Committed {
    fn memory_size(&self) -> usize {
        self.texture.iter().chain(&self.layout).map(|t| t.memory_size()).sum()
    }
}

/// The cached device texture(s) for one identifier.
pub struct TextureObject {
    identifier: TextureIdentifier,
    texture_type: TextureType,
    source: TextureSource,
    target_memory: AtomicUsize,
    committed_memory: AtomicUsize,
    total_memory: Arc<AtomicUsize>,
    dirty_queue: Weak<DirtyQueue>,
    self_ref: Weak<TextureObject>,
    staging: Mutex<Option<Staged>>,
    committed: RwLock<Committed>,
}

impl TextureObject {
    /// Build the variant serving `texture_type`.
    ///
    /// Returns an error for identifiers the type cannot serve: a field
    /// without a grid, or dynamic texels for anything but a uv texture.
    pub(crate) fn new(
        identifier: TextureIdentifier,
        texture_type: TextureType,
        total_memory: Arc<AtomicUsize>,
        dirty_queue: Weak<DirtyQueue>,
    ) -> Result<Arc<Self>, GraphicsError> {
        let dynamic = match &identifier.subtexture {
            Some(SubtextureIdentifier::DynamicallyPopulated { source }) => Some(source.clone()),
            _ => None,
        };

        let source = match (texture_type, dynamic) {
            (TextureType::Uv, Some(source)) => TextureSource::UvDynamic(source),
            (_, Some(_)) => {
                return Err(GraphicsError::InvalidParameter(format!(
                    "dynamically populated textures must be {:?}, not {:?}",
                    TextureType::Uv,
                    texture_type
                )));
            }
            (TextureType::Uv, None) => TextureSource::UvAsset,
            (TextureType::Field, None) => {
                let grid = identifier
                    .subtexture
                    .as_ref()
                    .and_then(SubtextureIdentifier::grid_selector)
                    .ok_or_else(|| {
                        GraphicsError::InvalidParameter(format!("field texture {identifier} names no grid"))
                    })?;
                TextureSource::Field(grid)
            }
            (TextureType::Ptex, None) => TextureSource::Ptex,
            (TextureType::Udim, None) => TextureSource::Udim,
        };

        Ok(Arc::new_cyclic(|self_ref| Self {
            identifier,
            texture_type,
            source,
            target_memory: AtomicUsize::new(0),
            committed_memory: AtomicUsize::new(0),
            total_memory,
            dirty_queue,
            self_ref: self_ref.clone(),
            staging: Mutex::new(None),
            committed: RwLock::new(Committed::default()),
        }))
    }

    /// The identifier this object was created for.
    pub fn identifier(&self) -> &TextureIdentifier {
        &self.identifier
    }

    /// The texture type tag.
    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    /// Returns true for dynamically populated textures.
    pub fn is_dynamic(&self) -> bool {
        matches!(self.source, TextureSource::UvDynamic(_))
    }

    /// Memory budget in bytes; 0 means unbounded.
    pub fn target_memory(&self) -> usize {
        self.target_memory.load(Ordering::Acquire)
    }

    /// Set the memory budget. A changed value schedules a reload.
    ///
    /// A change made while a commit is running is picked up by the next one.
    pub fn set_target_memory(&self, bytes: usize) {
        if self.target_memory.swap(bytes, Ordering::AcqRel) == bytes {
            return;
        }
        log::trace!("{}: target memory {} bytes", self.identifier, bytes);
        if let Some(queue) = self.dirty_queue.upgrade() {
            queue.push_object(self.self_ref.clone());
        }
    }

    /// Bytes of device memory held after the last commit.
    pub fn committed_memory(&self) -> usize {
        self.committed_memory.load(Ordering::Acquire)
    }

    /// Returns true if the last commit produced a usable device texture.
    pub fn is_valid(&self) -> bool {
        let committed = self.committed.read();
        committed.texture.is_some() && (!self.texture_type.has_layout() || committed.layout.is_some())
    }

    /// The texel texture.
    pub fn texture(&self) -> Option<Arc<Texture>> {
        self.committed.read().texture.clone()
    }

    /// The layout table of ptex and udim textures.
    pub fn layout_texture(&self) -> Option<Arc<Texture>> {
        self.committed.read().layout.clone()
    }

    /// Wrap hints for s and t stored in the file.
    pub fn wrap_parameters(&self) -> [WrapMode; 2] {
        self.committed.read().wrap
    }

    /// Bounds of a field grid.
    pub fn bounding_box(&self) -> BBox3d {
        self.committed.read().bounding_box
    }

    /// Maps grid-space points of a field into texture coordinates.
    pub fn sampling_transform(&self) -> Mat4d {
        self.committed.read().sampling_transform
    }

    /// Read texels into the staging buffer.
    ///
    /// Safe to call from any thread. Failures leave an empty staging buffer,
    /// so the next commit drops the device texture.
    pub fn load(&self, loader: &dyn TextureLoader) {
        let target_memory = self.target_memory();
        let path = self.identifier.file_path.as_str();
        let options = texcache_core::io::ImageOptions::from_subtexture(self.identifier.subtexture.as_ref());

        let staged = match &self.source {
            TextureSource::UvAsset => Some(Staged::Uv(uv::load_asset(loader, path, &options, target_memory))),
            TextureSource::UvDynamic(Some(source)) => Some(Staged::Uv(uv::load_dynamic(source.as_ref(), target_memory))),
            // Texels are pushed by the application.
            TextureSource::UvDynamic(None) => None,
            TextureSource::Field(grid) => Some(Staged::Field(field::load(loader, path, grid, target_memory))),
            TextureSource::Ptex => Some(Staged::Ptex(ptex::load(loader, path, &options, target_memory))),
            TextureSource::Udim => Some(Staged::Udim(udim::load(loader, path, &options, target_memory))),
        };

        *self.staging.lock() = staged;
    }

    /// Replace the device resources with the staged texels.
    ///
    /// Must only run on the commit thread. Device errors are logged and leave
    /// the object invalid until it is dirtied again.
    pub fn commit(&self, device: &Arc<GraphicsDevice>) {
        let Some(staged) = self.staging.lock().take() else {
            return;
        };

        let label = self.identifier.to_string();
        let mut committed = self.committed.write();
        // Release the previous resources before allocating new ones.
        let previous_wrap = committed.wrap;
        *committed = Committed::default();

        let result = match staged {
            Staged::Uv(staging) => uv::commit(staging, device, &label, &mut committed),
            Staged::Field(staging) => field::commit(staging, device, &label, &mut committed),
            Staged::Ptex(staging) => ptex::commit(staging, device, &label, &mut committed),
            Staged::Udim(staging) => udim::commit(staging, device, &label, &mut committed),
        };

        if let Err(e) = result {
            log::error!("{label}: failed to create device texture: {e}");
            *committed = Committed {
                wrap: previous_wrap,
                ..Default::default()
            };
        }

        self.update_committed_memory(committed.memory_size());
        let valid = committed.texture.is_some();
        drop(committed);

        log::trace!("{label}: committed, valid={valid}");
        if let TextureSource::UvDynamic(Some(source)) = &self.source {
            source.committed(valid);
        }
    }

    /// Replace the texture of a dynamic object with a new, empty one.
    ///
    /// `data`, if given, is uploaded as mip level 0.
    ///
    /// # Errors
    ///
    /// Fails for objects that are not dynamically populated and for device
    /// errors.
    pub fn create_texture(
        &self,
        device: &Arc<GraphicsDevice>,
        descriptor: &TextureDescriptor,
        data: Option<&[u8]>,
    ) -> Result<(), GraphicsError> {
        self.require_dynamic("create_texture")?;

        let mut committed = self.committed.write();
        committed.texture = None;
        let result = device.create_texture(descriptor).and_then(|texture| {
            if let Some(data) = data {
                device.write_texture(&texture, 0, data)?;
            }
            Ok(texture)
        });
        committed.texture = result.as_ref().ok().cloned();
        self.update_committed_memory(committed.memory_size());
        result.map(|_| ())
    }

    /// Fill the mip levels of a dynamic object's texture from level 0.
    ///
    /// # Errors
    ///
    /// Fails for objects that are not dynamically populated, without a
    /// texture, or on backends that cannot generate mipmaps.
    pub fn generate_mipmaps(&self, device: &GraphicsDevice) -> Result<(), GraphicsError> {
        self.require_dynamic("generate_mipmaps")?;
        let texture = self
            .texture()
            .ok_or_else(|| GraphicsError::InvalidParameter(format!("{}: no texture to mipmap", self.identifier)))?;
        device.generate_mipmaps(&texture)
    }

    fn require_dynamic(&self, operation: &str) -> Result<(), GraphicsError> {
        if self.is_dynamic() {
            return Ok(());
        }
        log::error!("{}: {operation} is only valid for dynamic textures", self.identifier);
        Err(GraphicsError::InvalidParameter(format!(
            "{operation} on non-dynamic texture {}",
            self.identifier
        )))
    }

    fn update_committed_memory(&self, bytes: usize) {
        let previous = self.committed_memory.swap(bytes, Ordering::AcqRel);
        if bytes >= previous {
            self.total_memory.fetch_add(bytes - previous, Ordering::AcqRel);
        } else {
            self.total_memory.fetch_sub(previous - bytes, Ordering::AcqRel);
        }
    }
}

impl Drop for TextureObject {
    fn drop(&mut self) {
        let bytes = *self.committed_memory.get_mut();
        self.total_memory.fetch_sub(bytes, Ordering::AcqRel);
        log::trace!("{}: released {} bytes", self.identifier, bytes);
    }
}

impl std::fmt::Debug for TextureObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureObject")
            .field("identifier", &self.identifier)
            .field("texture_type", &self.texture_type)
            .field("target_memory", &self.target_memory())
            .field("committed_memory", &self.committed_memory())
            .finish()
    }
}

static_assertions::assert_impl_all!(TextureObject: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use texcache_core::io::{MemoryImage, MemoryLoader};
    use texcache_core::texture::{CpuTexture, TextureFormat};

    fn object(identifier: TextureIdentifier, texture_type: TextureType) -> Result<Arc<TextureObject>, GraphicsError> {
        TextureObject::new(identifier, texture_type, Arc::new(AtomicUsize::new(0)), Weak::new())
    }

    struct Checker;

    impl DynamicTextureSource for Checker {
        fn load(&self, _target_memory: usize) -> Option<CpuTexture> {
            Some(CpuTexture::filled_2d(2, 2, TextureFormat::Rgba8Unorm, &[255; 4]))
        }
    }

    #[test]
    fn test_field_requires_grid() {
        assert!(object(TextureIdentifier::new("smoke.vdb"), TextureType::Field).is_err());
        let grid = TextureIdentifier::with_subtexture("smoke.vdb", SubtextureIdentifier::open_vdb("density", 0));
        assert!(object(grid, TextureType::Field).is_ok());
    }

    #[test]
    fn test_dynamic_requires_uv() {
        let id = TextureIdentifier::with_subtexture("aov", SubtextureIdentifier::dynamic(Arc::new(Checker)));
        assert!(object(id.clone(), TextureType::Udim).is_err());
        assert!(object(id, TextureType::Uv).unwrap().is_dynamic());
    }

    #[test]
    fn test_load_then_commit() {
        let loader = MemoryLoader::new();
        loader.insert_image(
            "a.png",
            MemoryImage::new(CpuTexture::filled_2d(4, 4, TextureFormat::Rgba8Unorm, &[1, 2, 3, 4])),
        );
        let device = GraphicsDevice::dummy();
        let total = Arc::new(AtomicUsize::new(0));
        let object = TextureObject::new(TextureIdentifier::new("a.png"), TextureType::Uv, total.clone(), Weak::new()).unwrap();

        object.load(&loader);
        assert!(!object.is_valid());
        object.commit(&device);
        assert!(object.is_valid());
        assert_eq!(object.committed_memory(), total.load(Ordering::Acquire));
        assert!(object.committed_memory() >= 64);

        drop(object);
        assert_eq!(total.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_dynamic_source_is_loaded() {
        let device = GraphicsDevice::dummy();
        let id = TextureIdentifier::with_subtexture("aov", SubtextureIdentifier::dynamic(Arc::new(Checker)));
        let object = object(id, TextureType::Uv).unwrap();
        object.load(&MemoryLoader::new());
        object.commit(&device);
        assert_eq!(object.texture().unwrap().width(), 2);
    }

    #[test]
    fn test_dynamic_push() {
        let device = GraphicsDevice::dummy();
        let id = TextureIdentifier::with_subtexture(
            "render_target",
            SubtextureIdentifier::DynamicallyPopulated { source: None },
        );
        let object = object(id, TextureType::Uv).unwrap();
        let descriptor = TextureDescriptor::for_upload(
            &CpuTexture::filled_2d(8, 8, TextureFormat::Rgba8Unorm, &[0; 4]).with_generate_mipmaps(true),
        );
        object.create_texture(&device, &descriptor, Some(&[0; 256])).unwrap();
        object.generate_mipmaps(&device).unwrap();
        assert!(object.is_valid());

        // Load and commit keep pushed texels.
        object.load(&MemoryLoader::new());
        object.commit(&device);
        assert!(object.is_valid());
    }

    #[test]
    fn test_push_rejected_for_assets() {
        let device = GraphicsDevice::dummy();
        let object = object(TextureIdentifier::new("a.png"), TextureType::Uv).unwrap();
        let descriptor = TextureDescriptor::for_upload(&CpuTexture::filled_2d(1, 1, TextureFormat::R8Unorm, &[0]));
        assert!(object.create_texture(&device, &descriptor, None).is_err());
        assert!(object.generate_mipmaps(&device).is_err());
    }
}
