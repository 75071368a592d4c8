//! 2D image textures, from files or from the application.

use std::sync::Arc;

use texcache_core::identifier::DynamicTextureSource;
use texcache_core::io::{ImageOptions, TextureLoader};
use texcache_core::sampler::WrapMode;
use texcache_core::texture::{utils, CpuTexture, TextureDimension};

use super::{upload_texture, Committed};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

pub(super) struct UvStaging {
    texture: Option<CpuTexture>,
    wrap: [WrapMode; 2],
}

impl UvStaging {
    fn empty() -> Self {
        Self {
            texture: None,
            wrap: [WrapMode::NoOpinion; 2],
        }
    }
}

/// Read an image file at the largest size that fits `target_memory`.
pub(super) fn load_asset(
    loader: &dyn TextureLoader,
    path: &str,
    options: &ImageOptions,
    target_memory: usize,
) -> UvStaging {
    let mut reader = match loader.open_image(path, options) {
        Ok(reader) => reader,
        Err(e) => {
            log::warn!("Failed to open texture {path}: {e}");
            return UvStaging::empty();
        }
    };

    let metadata = *reader.metadata();
    let wrap = [metadata.wrap_s, metadata.wrap_t];
    let degrade_level = utils::degrade_level_for_target_memory(
        metadata.width,
        metadata.height,
        1,
        TextureDimension::D2,
        metadata.format,
        true,
        target_memory,
    );

    match reader.read(degrade_level, true) {
        Ok(texture) => {
            log::trace!(
                "Loaded {path} at {}x{} (degrade level {degrade_level})",
                texture.width,
                texture.height
            );
            UvStaging {
                texture: Some(texture),
                wrap,
            }
        }
        Err(e) => {
            log::warn!("Failed to read texture {path}: {e}");
            UvStaging { texture: None, wrap }
        }
    }
}

/// Ask the application for texels.
pub(super) fn load_dynamic(source: &dyn DynamicTextureSource, target_memory: usize) -> UvStaging {
    UvStaging {
        texture: source.load(target_memory),
        wrap: [WrapMode::NoOpinion; 2],
    }
}

pub(super) fn commit(
    staging: UvStaging,
    device: &Arc<GraphicsDevice>,
    label: &str,
    committed: &mut Committed,
) -> Result<(), GraphicsError> {
    committed.wrap = staging.wrap;
    if let Some(texture) = staging.texture {
        committed.texture = Some(upload_texture(device, &texture, label)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use texcache_core::io::{MemoryImage, MemoryLoader};
    use texcache_core::texture::TextureFormat;

    fn loader_with_image(width: u32, height: u32) -> MemoryLoader {
        let loader = MemoryLoader::new();
        loader.insert_image(
            "tex.png",
            MemoryImage::new(CpuTexture::filled_2d(width, height, TextureFormat::Rgba8Unorm, &[9; 4]))
                .with_wrap(WrapMode::Clamp, WrapMode::Mirror),
        );
        loader
    }

    #[test]
    fn test_unbounded_load_keeps_size() {
        let staging = load_asset(&loader_with_image(64, 32), "tex.png", &ImageOptions::default(), 0);
        let texture = staging.texture.unwrap();
        assert_eq!((texture.width, texture.height), (64, 32));
        assert!(texture.generate_mipmaps);
        assert_eq!(staging.wrap, [WrapMode::Clamp, WrapMode::Mirror]);
    }

    #[test]
    fn test_budget_degrades() {
        // 64x64 RGBA8 with mips is ~21 KiB; 8 KiB forces one halving.
        let staging = load_asset(&loader_with_image(64, 64), "tex.png", &ImageOptions::default(), 8 * 1024);
        let texture = staging.texture.unwrap();
        assert_eq!((texture.width, texture.height), (32, 32));
    }

    #[test]
    fn test_missing_file_stages_nothing() {
        let staging = load_asset(&MemoryLoader::new(), "missing.png", &ImageOptions::default(), 0);
        assert!(staging.texture.is_none());
        assert_eq!(staging.wrap, [WrapMode::NoOpinion; 2]);
    }
}
