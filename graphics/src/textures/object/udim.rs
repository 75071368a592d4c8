//! `<UDIM>` tile set textures.
//!
//! Tiles 1001 through 1100 are stacked as layers of a 2D array. The layout
//! texture is a 100 texel `R32Float` row mapping tile `1001 + i` to its
//! layer plus one, or 0 when the tile is missing.

use std::sync::Arc;

use texcache_core::io::{ImageOptions, ImageReader, TextureLoader};
use texcache_core::texture::{utils, CpuTexture, TextureDimension, TextureFormat};

use super::{upload_texture, Committed};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

/// Placeholder replaced by the tile number.
pub const UDIM_PATTERN: &str = "<UDIM>";

/// First tile number.
pub const FIRST_TILE: u32 = 1001;

/// Number of tiles searched for.
pub const TILE_COUNT: u32 = 100;

pub(super) struct UdimStaging {
    layers: Option<CpuTexture>,
    layout: Option<CpuTexture>,
}

/// Path of tile `tile` for a pattern containing [`UDIM_PATTERN`].
pub fn tile_path(pattern: &str, tile: u32) -> String {
    pattern.replace(UDIM_PATTERN, &tile.to_string())
}

pub(super) fn load(loader: &dyn TextureLoader, pattern: &str, options: &ImageOptions, target_memory: usize) -> UdimStaging {
    let empty = UdimStaging {
        layers: None,
        layout: None,
    };
    if !pattern.contains(UDIM_PATTERN) {
        log::warn!("UDIM path {pattern} has no {UDIM_PATTERN} placeholder");
        return empty;
    }

    let mut tiles: Vec<(usize, Box<dyn ImageReader>)> = Vec::new();
    for slot in 0..TILE_COUNT {
        let path = tile_path(pattern, FIRST_TILE + slot);
        match loader.open_image(&path, options) {
            Ok(reader) => tiles.push((slot as usize, reader)),
            Err(e) if e.is_not_found() => {}
            Err(e) => log::warn!("Failed to open UDIM tile {path}: {e}"),
        }
    }

    let Some(format) = tiles.first().map(|(_, reader)| reader.metadata().format) else {
        log::warn!("No UDIM tiles found for {pattern}");
        return empty;
    };
    tiles.retain(|(slot, reader)| {
        let matches = reader.metadata().format == format;
        if !matches {
            log::warn!(
                "Skipping UDIM tile {} of {pattern}: {:?} differs from {:?}",
                FIRST_TILE + *slot as u32,
                reader.metadata().format,
                format
            );
        }
        matches
    });

    let width = tiles.iter().map(|(_, r)| r.metadata().width).max().unwrap_or(1);
    let height = tiles.iter().map(|(_, r)| r.metadata().height).max().unwrap_or(1);
    let degrade_level = utils::degrade_level_for_target_memory(
        width,
        height,
        tiles.len() as u32,
        TextureDimension::D2Array,
        format,
        true,
        target_memory,
    );
    let (layer_width, layer_height) = ((width >> degrade_level).max(1), (height >> degrade_level).max(1));

    let mut layers = Vec::with_capacity(tiles.len());
    let mut layout = vec![0.0f32; TILE_COUNT as usize];
    for (slot, mut reader) in tiles {
        let texture = match reader.read(degrade_level, false) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Failed to read UDIM tile {} of {pattern}: {e}", FIRST_TILE + slot as u32);
                continue;
            }
        };
        let Some(texture) = texture.resized_nearest(layer_width, layer_height) else {
            continue;
        };
        layers.push(texture);
        layout[slot] = layers.len() as f32;
    }

    let Some(layers) = CpuTexture::from_layers(&layers) else {
        log::warn!("No readable UDIM tiles for {pattern}");
        return empty;
    };

    UdimStaging {
        layers: Some(layers.with_generate_mipmaps(true)),
        layout: Some(CpuTexture::new_2d(
            TILE_COUNT,
            1,
            TextureFormat::R32Float,
            bytemuck::cast_slice(&layout).to_vec(),
        )),
    }
}

pub(super) fn commit(
    staging: UdimStaging,
    device: &Arc<GraphicsDevice>,
    label: &str,
    committed: &mut Committed,
) -> Result<(), GraphicsError> {
    let (Some(layers), Some(layout)) = (staging.layers, staging.layout) else {
        return Ok(());
    };
    committed.texture = Some(upload_texture(device, &layers, label)?);
    committed.layout = Some(upload_texture(device, &layout, &format!("{label} layout"))?);
    Ok(())
}
