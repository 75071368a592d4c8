//! Image files decoded with the `image` crate.

use std::path::Path;

use image::{ColorType, DynamicImage};

use super::{degrade, ImageMetadata, ImageOptions, ImageReader, TextureIoError, TextureLoader};
use crate::identifier::ColorSpace;
use crate::sampler::WrapMode;
use crate::texture::{CpuTexture, TextureFormat};

/// Loads 2D images from disk.
///
/// 8-bit images decode to RGBA8, everything else to RGBA32F. With
/// [`ColorSpace::Auto`], 8-bit images are treated as sRGB. Image files carry
/// no wrap hints. Volumes and face atlases are not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileLoader;

impl ImageFileLoader {
    /// Create a loader.
    pub fn new() -> Self {
        Self
    }
}

impl TextureLoader for ImageFileLoader {
    fn open_image(&self, path: &str, options: &ImageOptions) -> Result<Box<dyn ImageReader>, TextureIoError> {
        if !Path::new(path).is_file() {
            return Err(TextureIoError::NotFound(path.to_string()));
        }

        let image = image::open(path).map_err(|e| TextureIoError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let mut texture = to_cpu_texture(image, options.color_space).with_name(path);
        options.apply(&mut texture);

        log::trace!(
            "Decoded {} ({}x{} {:?})",
            path,
            texture.width,
            texture.height,
            texture.format
        );

        let metadata = ImageMetadata {
            width: texture.width,
            height: texture.height,
            format: texture.format,
            wrap_s: WrapMode::NoOpinion,
            wrap_t: WrapMode::NoOpinion,
            mip_count: 1,
        };
        Ok(Box::new(ImageFileReader { metadata, texture }))
    }
}

fn to_cpu_texture(image: DynamicImage, color_space: ColorSpace) -> CpuTexture {
    let (width, height) = (image.width(), image.height());
    let eight_bit = matches!(
        image.color(),
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
    );

    if eight_bit {
        let format = match color_space {
            ColorSpace::Auto => TextureFormat::Rgba8UnormSrgb,
            _ => TextureFormat::Rgba8Unorm,
        };
        CpuTexture::new_2d(width, height, format, image.to_rgba8().into_raw())
    } else {
        let texels = image.to_rgba32f().into_raw();
        CpuTexture::new_2d(
            width,
            height,
            TextureFormat::Rgba32Float,
            bytemuck::cast_slice(&texels).to_vec(),
        )
    }
}

struct ImageFileReader {
    metadata: ImageMetadata,
    texture: CpuTexture,
}

impl ImageReader for ImageFileReader {
    fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    fn read(&mut self, degrade_level: u32, generate_mipmaps: bool) -> Result<CpuTexture, TextureIoError> {
        Ok(degrade(&self.texture, degrade_level).with_generate_mipmaps(generate_mipmaps))
    }
}
