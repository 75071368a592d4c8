//! Size and mip level arithmetic used to fit textures into a memory budget.

use super::{TextureDimension, TextureFormat};

/// Number of levels in a full mip chain.
pub fn mip_level_count(width: u32, height: u32, depth: u32) -> u32 {
    let largest = width.max(height).max(depth).max(1);
    32 - largest.leading_zeros()
}

/// Bytes used by a texture with `mip_levels` levels.
///
/// Array layers keep their count at every level; 3D depth halves.
pub fn texture_memory_size(
    width: u32,
    height: u32,
    depth: u32,
    dimension: TextureDimension,
    format: TextureFormat,
    mip_levels: u32,
) -> usize {
    let block = format.block_size() as usize;
    let (mut w, mut h, mut d) = (width.max(1), height.max(1), depth.max(1));
    let mut total = 0usize;
    for _ in 0..mip_levels.max(1) {
        total += w as usize * h as usize * d as usize * block;
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        if dimension == TextureDimension::D3 {
            d = (d / 2).max(1);
        }
    }
    total
}

/// Smallest number of halvings after which the texture fits `target_memory`.
///
/// A target of 0 means unbounded. The result never reduces the texture below
/// one texel, so the returned level may still exceed the budget.
pub fn degrade_level_for_target_memory(
    width: u32,
    height: u32,
    depth: u32,
    dimension: TextureDimension,
    format: TextureFormat,
    with_mipmaps: bool,
    target_memory: usize,
) -> u32 {
    if target_memory == 0 {
        return 0;
    }

    let halves_depth = dimension == TextureDimension::D3;
    let (mut w, mut h, mut d) = (width.max(1), height.max(1), depth.max(1));
    let mut level = 0;
    loop {
        let levels = if with_mipmaps {
            mip_level_count(w, h, if halves_depth { d } else { 1 })
        } else {
            1
        };
        let size = texture_memory_size(w, h, d, dimension, format, levels);
        let at_minimum = w == 1 && h == 1 && (!halves_depth || d == 1);
        if size <= target_memory || at_minimum {
            return level;
        }
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        if halves_depth {
            d = (d / 2).max(1);
        }
        level += 1;
    }
}
