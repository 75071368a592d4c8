//! In-memory texture sources.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};

use super::{
    degrade, FaceAtlas, FieldMetadata, FieldReader, ImageMetadata, ImageOptions, ImageReader, TextureIoError,
    TextureLoader,
};
use crate::identifier::GridSelector;
use crate::math::BBox3d;
use crate::sampler::WrapMode;
use crate::texture::{CpuTexture, TextureDimension};

/// An image registered with a [`MemoryLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryImage {
    /// Level 0 texels.
    pub texture: CpuTexture,
    /// Wrap hint for s.
    pub wrap_s: WrapMode,
    /// Wrap hint for t.
    pub wrap_t: WrapMode,
}

impl MemoryImage {
    /// Image without wrap hints.
    pub fn new(texture: CpuTexture) -> Self {
        Self {
            texture,
            wrap_s: WrapMode::NoOpinion,
            wrap_t: WrapMode::NoOpinion,
        }
    }

    /// Set the wrap hints.
    pub fn with_wrap(mut self, wrap_s: WrapMode, wrap_t: WrapMode) -> Self {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self
    }
}

#[derive(Debug, Clone)]
struct MemoryField {
    name: String,
    index: u32,
    texture: CpuTexture,
    bounding_box: BBox3d,
}

/// Loader serving textures registered at runtime.
///
/// Paths are plain keys. Every open is counted so reload behavior can be
/// observed.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    images: RwLock<HashMap<String, MemoryImage>>,
    fields: RwLock<HashMap<String, Vec<MemoryField>>>,
    face_atlases: RwLock<HashMap<String, FaceAtlas>>,
    open_counts: Mutex<HashMap<String, usize>>,
}

impl MemoryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an image.
    pub fn insert_image(&self, path: impl Into<String>, image: MemoryImage) {
        self.images.write().insert(path.into(), image);
    }

    /// Register or replace a grid of a volume file.
    pub fn insert_field(
        &self,
        path: impl Into<String>,
        name: impl Into<String>,
        index: u32,
        texture: CpuTexture,
        bounding_box: BBox3d,
    ) {
        let name = name.into();
        let mut fields = self.fields.write();
        let grids = fields.entry(path.into()).or_default();
        grids.retain(|grid| !(grid.name == name && grid.index == index));
        grids.push(MemoryField {
            name,
            index,
            texture,
            bounding_box,
        });
    }

    /// Register or replace a face atlas.
    pub fn insert_face_atlas(&self, path: impl Into<String>, atlas: FaceAtlas) {
        self.face_atlases.write().insert(path.into(), atlas);
    }

    /// Forget everything registered at `path`.
    pub fn remove(&self, path: &str) {
        self.images.write().remove(path);
        self.fields.write().remove(path);
        self.face_atlases.write().remove(path);
    }

    /// Number of successful and failed opens of `path`.
    pub fn open_count(&self, path: &str) -> usize {
        self.open_counts.lock().get(path).copied().unwrap_or(0)
    }

    fn count_open(&self, path: &str) {
        *self.open_counts.lock().entry(path.to_string()).or_insert(0) += 1;
    }
}

impl TextureLoader for MemoryLoader {
    fn open_image(&self, path: &str, options: &ImageOptions) -> Result<Box<dyn ImageReader>, TextureIoError> {
        self.count_open(path);
        let image = self
            .images
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| TextureIoError::NotFound(path.to_string()))?;

        let mut texture = image.texture;
        if !texture.is_valid() {
            return Err(TextureIoError::InvalidData {
                path: path.to_string(),
                message: format!(
                    "{} bytes for {}x{}x{} {:?}",
                    texture.data.len(),
                    texture.width,
                    texture.height,
                    texture.depth,
                    texture.format
                ),
            });
        }
        if texture.name.is_none() {
            texture.name = Some(path.to_string());
        }
        options.apply(&mut texture);

        let metadata = ImageMetadata {
            width: texture.width,
            height: texture.height,
            format: texture.format,
            wrap_s: image.wrap_s,
            wrap_t: image.wrap_t,
            mip_count: 1,
        };
        Ok(Box::new(MemoryImageReader { metadata, texture }))
    }

    fn open_field(&self, path: &str, grid: &GridSelector) -> Result<Box<dyn FieldReader>, TextureIoError> {
        self.count_open(path);
        let fields = self.fields.read();
        let grids = fields
            .get(path)
            .ok_or_else(|| TextureIoError::NotFound(path.to_string()))?;
        let field = grids
            .iter()
            .find(|field| field.name == grid.name && field.index == grid.index)
            .ok_or_else(|| TextureIoError::GridNotFound {
                path: path.to_string(),
                name: grid.name.clone(),
                index: grid.index,
            })?;

        if field.texture.dimension != TextureDimension::D3 || !field.texture.is_valid() {
            return Err(TextureIoError::InvalidData {
                path: path.to_string(),
                message: format!("grid '{}' is not a valid 3D texture", grid.name),
            });
        }

        let metadata = FieldMetadata {
            width: field.texture.width,
            height: field.texture.height,
            depth: field.texture.depth,
            format: field.texture.format,
            bounding_box: field.bounding_box,
        };
        Ok(Box::new(MemoryFieldReader {
            metadata,
            texture: field.texture.clone(),
        }))
    }

    fn open_face_atlas(&self, path: &str, options: &ImageOptions) -> Result<FaceAtlas, TextureIoError> {
        self.count_open(path);
        let mut atlas = self
            .face_atlases
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| TextureIoError::NotFound(path.to_string()))?;
        for face in &mut atlas.faces {
            options.apply(face);
        }
        Ok(atlas)
    }
}

struct MemoryImageReader {
    metadata: ImageMetadata,
    texture: CpuTexture,
}

impl ImageReader for MemoryImageReader {
    fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    fn read(&mut self, degrade_level: u32, generate_mipmaps: bool) -> Result<CpuTexture, TextureIoError> {
        Ok(degrade(&self.texture, degrade_level).with_generate_mipmaps(generate_mipmaps))
    }
}

struct MemoryFieldReader {
    metadata: FieldMetadata,
    texture: CpuTexture,
}

impl FieldReader for MemoryFieldReader {
    fn metadata(&self) -> &FieldMetadata {
        &self.metadata
    }

    fn read(&mut self, degrade_level: u32) -> Result<CpuTexture, TextureIoError> {
        Ok(degrade(&self.texture, degrade_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Range3d;
    use crate::texture::TextureFormat;

    #[test]
    fn test_missing_image_is_not_found() {
        let loader = MemoryLoader::new();
        let err = loader
            .open_image("missing.png", &ImageOptions::default())
            .err()
            .unwrap();
        assert!(err.is_not_found());
        assert_eq!(loader.open_count("missing.png"), 1);
    }

    #[test]
    fn test_image_degrade_and_options() {
        let loader = MemoryLoader::new();
        let texture = CpuTexture::filled_2d(4, 4, TextureFormat::Rgba8Unorm, &[10, 20, 30, 255]);
        loader.insert_image("a.png", MemoryImage::new(texture).with_wrap(WrapMode::Clamp, WrapMode::Mirror));

        let options = ImageOptions {
            color_space: crate::identifier::ColorSpace::Srgb,
            ..Default::default()
        };
        let mut reader = loader.open_image("a.png", &options).unwrap();
        assert_eq!(reader.metadata().wrap_s, WrapMode::Clamp);
        assert_eq!(reader.metadata().format, TextureFormat::Rgba8UnormSrgb);

        let texels = reader.read(1, true).unwrap();
        assert_eq!((texels.width, texels.height), (2, 2));
        assert!(texels.generate_mipmaps);
        assert_eq!(texels.name.as_deref(), Some("a.png"));
    }

    #[test]
    fn test_field_lookup_by_name_and_index() {
        let loader = MemoryLoader::new();
        let grid = CpuTexture::new_3d(2, 2, 2, TextureFormat::R32Float, vec![0; 32]);
        let bbox = BBox3d::from_range(Range3d::new(Default::default(), crate::math::Vec3d::repeat(1.0)));
        loader.insert_field("smoke.vdb", "density", 0, grid.clone(), bbox);
        loader.insert_field("smoke.vdb", "temperature", 0, grid, bbox);

        let selector = |name: &str, index| GridSelector {
            name: name.to_string(),
            index,
            purpose: None,
        };
        let reader = loader.open_field("smoke.vdb", &selector("temperature", 0)).unwrap();
        assert_eq!(reader.metadata().depth, 2);

        let err = loader.open_field("smoke.vdb", &selector("density", 1)).err().unwrap();
        assert!(matches!(err, TextureIoError::GridNotFound { .. }));
    }

    #[test]
    fn test_remove_forgets_path() {
        let loader = MemoryLoader::new();
        let texture = CpuTexture::filled_2d(1, 1, TextureFormat::R8Unorm, &[1]);
        loader.insert_image("a.png", MemoryImage::new(texture));
        loader.remove("a.png");
        assert!(loader.open_image("a.png", &ImageOptions::default()).is_err());
    }
}
