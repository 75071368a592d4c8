//! Texture loading.
//!
//! The cache never decodes files itself. It asks a [`TextureLoader`] for a
//! reader, inspects the reader's metadata to pick a degrade level that fits
//! the memory budget, and then reads the texels. Two loaders ship with the
//! crate:
//!
//! - [`ImageFileLoader`] decodes image files with the `image` crate
//!   (feature `image-files`).
//! - [`MemoryLoader`] serves textures registered in memory.

mod error;
#[cfg(feature = "image-files")]
mod image_file;
mod memory;

pub use error::TextureIoError;
#[cfg(feature = "image-files")]
pub use image_file::ImageFileLoader;
pub use memory::{MemoryImage, MemoryLoader};

use crate::identifier::{ColorSpace, GridSelector, SubtextureIdentifier};
use crate::math::BBox3d;
use crate::sampler::WrapMode;
use crate::texture::{CpuTexture, TextureFormat};

/// Options applied to texels while they are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageOptions {
    /// Flip rows.
    pub flip_vertically: bool,
    /// Multiply color by alpha.
    pub premultiply_alpha: bool,
    /// Color space of the texels.
    pub color_space: ColorSpace,
}

impl ImageOptions {
    /// Options carried by a sub-identifier.
    pub fn from_subtexture(subtexture: Option<&SubtextureIdentifier>) -> Self {
        match subtexture {
            Some(SubtextureIdentifier::PlainAsset {
                flip_vertically,
                premultiply_alpha,
                color_space,
            }) => Self {
                flip_vertically: *flip_vertically,
                premultiply_alpha: *premultiply_alpha,
                color_space: *color_space,
            },
            Some(SubtextureIdentifier::MultiPageAtlas {
                premultiply_alpha,
                color_space,
            }) => Self {
                premultiply_alpha: *premultiply_alpha,
                color_space: *color_space,
                ..Default::default()
            },
            Some(SubtextureIdentifier::MultiFaceAtlas { premultiply_alpha }) => Self {
                premultiply_alpha: *premultiply_alpha,
                ..Default::default()
            },
            _ => Self::default(),
        }
    }

    /// Apply flip, premultiplication and an explicit color space.
    ///
    /// [`ColorSpace::Auto`] keeps the format the loader decoded.
    pub fn apply(&self, texture: &mut CpuTexture) {
        if self.flip_vertically {
            texture.flip_vertically();
        }
        if self.premultiply_alpha && !texture.premultiply_alpha() {
            log::debug!(
                "Cannot premultiply {:?} texels of {}",
                texture.format,
                texture.name.as_deref().unwrap_or("<unnamed>")
            );
        }
        texture.format = match self.color_space {
            ColorSpace::Raw => texture.format.to_linear(),
            ColorSpace::Srgb => texture.format.to_srgb(),
            ColorSpace::Auto => texture.format,
        };
    }
}

/// Image properties known before texels are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel format after options were applied.
    pub format: TextureFormat,
    /// Wrap hint for s, [`WrapMode::NoOpinion`] if the file has none.
    pub wrap_s: WrapMode,
    /// Wrap hint for t, [`WrapMode::NoOpinion`] if the file has none.
    pub wrap_t: WrapMode,
    /// Mip levels stored in the file.
    pub mip_count: u32,
}

/// Reader for one 2D image.
pub trait ImageReader: Send {
    /// Image properties.
    fn metadata(&self) -> &ImageMetadata;

    /// Read texels reduced by `degrade_level` halvings.
    fn read(&mut self, degrade_level: u32, generate_mipmaps: bool) -> Result<CpuTexture, TextureIoError>;
}

/// Volume grid properties known before voxels are read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMetadata {
    /// Width in voxels.
    pub width: u32,
    /// Height in voxels.
    pub height: u32,
    /// Depth in voxels.
    pub depth: u32,
    /// Voxel format.
    pub format: TextureFormat,
    /// Grid bounds in their native frame.
    pub bounding_box: BBox3d,
}

/// Reader for one volume grid.
pub trait FieldReader: Send {
    /// Grid properties.
    fn metadata(&self) -> &FieldMetadata;

    /// Read voxels reduced by `degrade_level` halvings.
    fn read(&mut self, degrade_level: u32) -> Result<CpuTexture, TextureIoError>;
}

/// Per-face texels of a face atlas file, in face order.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAtlas {
    /// One 2D texture per face, all sharing a format.
    pub faces: Vec<CpuTexture>,
}

impl FaceAtlas {
    /// Texel format shared by the faces.
    pub fn format(&self) -> Option<TextureFormat> {
        self.faces.first().map(|face| face.format)
    }
}

/// Opens texture sources for the cache. Called from load workers.
pub trait TextureLoader: Send + Sync {
    /// Open a 2D image.
    fn open_image(&self, path: &str, options: &ImageOptions) -> Result<Box<dyn ImageReader>, TextureIoError>;

    /// Open a grid of a volume file.
    fn open_field(&self, path: &str, _grid: &GridSelector) -> Result<Box<dyn FieldReader>, TextureIoError> {
        Err(TextureIoError::unsupported(path, "volume files"))
    }

    /// Read all faces of a face atlas file.
    fn open_face_atlas(&self, path: &str, _options: &ImageOptions) -> Result<FaceAtlas, TextureIoError> {
        Err(TextureIoError::unsupported(path, "face atlas files"))
    }
}

/// Halve `texture` `levels` times.
///
/// Formats without a CPU filter are returned at full size.
pub fn degrade(texture: &CpuTexture, levels: u32) -> CpuTexture {
    let mut current = texture.clone();
    for _ in 0..levels {
        if current.width == 1 && current.height == 1 && current.depth == 1 {
            break;
        }
        match current.downsampled() {
            Some(next) => current = next,
            None => {
                log::warn!("No CPU filter for {:?}, keeping full resolution", current.format);
                break;
            }
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_subtexture() {
        let options = ImageOptions::from_subtexture(Some(&SubtextureIdentifier::MultiPageAtlas {
            premultiply_alpha: true,
            color_space: ColorSpace::Raw,
        }));
        assert!(options.premultiply_alpha);
        assert!(!options.flip_vertically);
        assert_eq!(options.color_space, ColorSpace::Raw);
        assert_eq!(ImageOptions::from_subtexture(None), ImageOptions::default());
    }

    #[test]
    fn test_apply_color_space() {
        let mut texture = CpuTexture::filled_2d(1, 1, TextureFormat::Rgba8Unorm, &[1, 2, 3, 255]);
        ImageOptions {
            color_space: ColorSpace::Srgb,
            ..Default::default()
        }
        .apply(&mut texture);
        assert_eq!(texture.format, TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn test_degrade_stops_at_one_texel() {
        let texture = CpuTexture::filled_2d(4, 2, TextureFormat::R8Unorm, &[7]);
        let degraded = degrade(&texture, 10);
        assert_eq!((degraded.width, degraded.height), (1, 1));
        assert_eq!(degraded.data, vec![7]);
    }
}
