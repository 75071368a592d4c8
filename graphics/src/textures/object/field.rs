//! Volume grid textures.

use std::sync::Arc;

use texcache_core::identifier::GridSelector;
use texcache_core::io::TextureLoader;
use texcache_core::math::{compute_sampling_transform, BBox3d};
use texcache_core::texture::{utils, CpuTexture, TextureDimension};

use super::{upload_texture, Committed};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

pub(super) struct FieldStaging {
    texture: Option<CpuTexture>,
    bounding_box: BBox3d,
}

pub(super) fn load(loader: &dyn TextureLoader, path: &str, grid: &GridSelector, target_memory: usize) -> FieldStaging {
    let mut reader = match loader.open_field(path, grid) {
        Ok(reader) => reader,
        Err(e) => {
            log::warn!("Failed to open grid '{}' of {path}: {e}", grid.name);
            return FieldStaging {
                texture: None,
                bounding_box: BBox3d::default(),
            };
        }
    };

    let metadata = *reader.metadata();
    let degrade_level = utils::degrade_level_for_target_memory(
        metadata.width,
        metadata.height,
        metadata.depth,
        TextureDimension::D3,
        metadata.format,
        false,
        target_memory,
    );

    let texture = reader
        .read(degrade_level)
        .inspect_err(|e| log::warn!("Failed to read grid '{}' of {path}: {e}", grid.name))
        .ok();
    FieldStaging {
        texture,
        bounding_box: metadata.bounding_box,
    }
}

pub(super) fn commit(
    staging: FieldStaging,
    device: &Arc<GraphicsDevice>,
    label: &str,
    committed: &mut Committed,
) -> Result<(), GraphicsError> {
    let Some(texture) = staging.texture else {
        return Ok(());
    };
    committed.texture = Some(upload_texture(device, &texture, label)?);
    committed.bounding_box = staging.bounding_box;
    committed.sampling_transform = compute_sampling_transform(&staging.bounding_box);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use texcache_core::io::MemoryLoader;
    use texcache_core::math::{Range3d, Vec3d};
    use texcache_core::texture::TextureFormat;

    fn grid(name: &str) -> GridSelector {
        GridSelector {
            name: name.to_string(),
            index: 0,
            purpose: None,
        }
    }

    #[test]
    fn test_load_and_commit_grid() {
        let loader = MemoryLoader::new();
        let bbox = BBox3d::from_range(Range3d::new(Vec3d::new(-1.0, -1.0, -1.0), Vec3d::new(1.0, 1.0, 1.0)));
        loader.insert_field(
            "smoke.vdb",
            "density",
            0,
            CpuTexture::new_3d(4, 4, 4, TextureFormat::R32Float, vec![0; 256]),
            bbox,
        );

        let staging = load(&loader, "smoke.vdb", &grid("density"), 0);
        let device = GraphicsDevice::dummy();
        let mut committed = Committed::default();
        commit(staging, &device, "smoke", &mut committed).unwrap();

        let texture = committed.texture.unwrap();
        assert_eq!(texture.depth(), 4);
        assert_eq!(texture.mip_level_count(), 1);
        assert_eq!(committed.bounding_box, bbox);
        let center = committed.sampling_transform * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((center.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_budget_halves_all_axes() {
        let loader = MemoryLoader::new();
        loader.insert_field(
            "smoke.vdb",
            "density",
            0,
            CpuTexture::new_3d(8, 8, 8, TextureFormat::R32Float, vec![0; 2048]),
            BBox3d::default(),
        );
        let staging = load(&loader, "smoke.vdb", &grid("density"), 256);
        let texture = staging.texture.unwrap();
        assert_eq!((texture.width, texture.height, texture.depth), (4, 4, 4));
    }

    #[test]
    fn test_missing_grid() {
        let loader = MemoryLoader::new();
        let staging = load(&loader, "smoke.vdb", &grid("temperature"), 0);
        assert!(staging.texture.is_none());
    }
}
