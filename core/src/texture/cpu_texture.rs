//! CPU-side texel storage and the filters applied before upload.

use super::utils::mip_level_count;
use super::{ChannelKind, TextureDimension, TextureFormat};

/// CPU-side texture data.
///
/// Holds level 0 texels tightly packed, layer after layer (or slice after
/// slice for 3D textures). Lower mip levels are either generated on the
/// device or built with [`CpuTexture::mip_chain`].
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    /// Texture name, used as a debug label.
    pub name: Option<String>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth for 3D textures, layer count for array textures, 1 otherwise.
    pub depth: u32,
    /// Texture dimension.
    pub dimension: TextureDimension,
    /// Texel format.
    pub format: TextureFormat,
    /// Level 0 texels.
    pub data: Vec<u8>,
    /// Request a full mip chain when the texture is uploaded.
    pub generate_mipmaps: bool,
}

impl CpuTexture {
    /// Create a 2D texture.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        Self {
            name: None,
            width,
            height,
            depth: 1,
            dimension: TextureDimension::D2,
            format,
            data,
            generate_mipmaps: false,
        }
    }

    /// Create a 2D array texture with `layers` layers.
    pub fn new_2d_array(
        width: u32,
        height: u32,
        layers: u32,
        format: TextureFormat,
        data: Vec<u8>,
    ) -> Self {
        Self {
            depth: layers,
            dimension: TextureDimension::D2Array,
            ..Self::new_2d(width, height, format, data)
        }
    }

    /// Create a 3D texture.
    pub fn new_3d(width: u32, height: u32, depth: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        Self {
            depth,
            dimension: TextureDimension::D3,
            ..Self::new_2d(width, height, format, data)
        }
    }

    /// Create a 2D texture filled with one texel value.
    pub fn filled_2d(width: u32, height: u32, format: TextureFormat, texel: &[u8]) -> Self {
        let count = width as usize * height as usize;
        Self::new_2d(width, height, format, texel.repeat(count))
    }

    /// Set the texture name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Request mip generation on upload.
    pub fn with_generate_mipmaps(mut self, generate: bool) -> Self {
        self.generate_mipmaps = generate;
        self
    }

    /// Bytes in one row of texels.
    pub fn row_size(&self) -> usize {
        self.width as usize * self.format.block_size() as usize
    }

    /// Bytes in one layer or slice.
    pub fn layer_size(&self) -> usize {
        self.row_size() * self.height as usize
    }

    /// Number of level 0 bytes implied by the dimensions and format.
    pub fn expected_size(&self) -> usize {
        self.layer_size() * self.depth as usize
    }

    /// Returns true if the dimensions are non-zero and match the data length.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.depth > 0 && self.data.len() == self.expected_size()
    }

    /// Texels of one layer or slice.
    pub fn layer(&self, index: u32) -> Option<&[u8]> {
        let size = self.layer_size();
        let start = index as usize * size;
        self.data.get(start..start + size)
    }

    /// Number of levels in a full mip chain for this texture.
    pub fn full_mip_level_count(&self) -> u32 {
        match self.dimension {
            TextureDimension::D3 => mip_level_count(self.width, self.height, self.depth),
            _ => mip_level_count(self.width, self.height, 1),
        }
    }

    /// Box-filter the texture down to half its size.
    ///
    /// Array layers are filtered independently; 3D textures are halved in
    /// depth as well. Returns `None` for formats without a CPU filter.
    pub fn downsampled(&self) -> Option<CpuTexture> {
        let (kind, channels) = self.format.channel_layout()?;
        if !self.is_valid() {
            return None;
        }

        let halve_depth = self.dimension == TextureDimension::D3;
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let depth = if halve_depth {
            (self.depth / 2).max(1)
        } else {
            self.depth
        };

        let texel = self.format.block_size() as usize;
        let channel_size = texel / channels;
        let (src_w, src_h, src_d) = (self.width, self.height, self.depth);
        let mut data = Vec::with_capacity(width as usize * height as usize * depth as usize * texel);

        for z in 0..depth {
            let zs = if halve_depth {
                [2 * z, (2 * z + 1).min(src_d - 1)]
            } else {
                [z, z]
            };
            for y in 0..height {
                let ys = [(2 * y).min(src_h - 1), (2 * y + 1).min(src_h - 1)];
                for x in 0..width {
                    let xs = [(2 * x).min(src_w - 1), (2 * x + 1).min(src_w - 1)];
                    for c in 0..channels {
                        let mut sum = 0.0f32;
                        for sz in zs {
                            for sy in ys {
                                for sx in xs {
                                    let index = (sz as usize * src_h as usize + sy as usize)
                                        * src_w as usize
                                        + sx as usize;
                                    let offset = index * texel + c * channel_size;
                                    sum += read_channel(&self.data, kind, offset);
                                }
                            }
                        }
                        write_channel(&mut data, kind, sum / 8.0);
                    }
                }
            }
        }

        Some(CpuTexture {
            name: self.name.clone(),
            width,
            height,
            depth,
            dimension: self.dimension,
            format: self.format,
            data,
            generate_mipmaps: self.generate_mipmaps,
        })
    }

    /// Build mip levels 1 and up with the box filter.
    pub fn mip_chain(&self) -> Option<Vec<CpuTexture>> {
        let levels = self.full_mip_level_count();
        let mut chain: Vec<CpuTexture> = Vec::with_capacity(levels.saturating_sub(1) as usize);
        for _ in 1..levels {
            let next = chain.last().unwrap_or(self).downsampled()?;
            chain.push(next);
        }
        Some(chain)
    }

    /// Resize every layer to `width` x `height` with nearest sampling.
    ///
    /// Works for any format since texels are copied whole.
    pub fn resized_nearest(&self, width: u32, height: u32) -> Option<CpuTexture> {
        if !self.is_valid() || width == 0 || height == 0 {
            return None;
        }
        if width == self.width && height == self.height {
            return Some(self.clone());
        }

        let texel = self.format.block_size() as usize;
        let mut data = Vec::with_capacity(width as usize * height as usize * self.depth as usize * texel);
        for z in 0..self.depth as u64 {
            for y in 0..height as u64 {
                let sy = y * self.height as u64 / height as u64;
                for x in 0..width as u64 {
                    let sx = x * self.width as u64 / width as u64;
                    let index = ((z * self.height as u64 + sy) * self.width as u64 + sx) as usize;
                    let offset = index * texel;
                    data.extend_from_slice(&self.data[offset..offset + texel]);
                }
            }
        }

        Some(CpuTexture {
            width,
            height,
            data,
            ..self.clone_metadata()
        })
    }

    /// Stack equally sized 2D textures into one array texture.
    pub fn from_layers(layers: &[CpuTexture]) -> Option<CpuTexture> {
        let first = layers.first()?;
        let compatible = layers.iter().all(|layer| {
            layer.is_valid()
                && layer.depth == 1
                && layer.width == first.width
                && layer.height == first.height
                && layer.format == first.format
        });
        if !compatible {
            return None;
        }

        let mut data = Vec::with_capacity(first.layer_size() * layers.len());
        for layer in layers {
            data.extend_from_slice(&layer.data);
        }
        Some(
            CpuTexture::new_2d_array(first.width, first.height, layers.len() as u32, first.format, data)
                .with_generate_mipmaps(first.generate_mipmaps),
        )
    }

    /// Mirror every layer top to bottom.
    pub fn flip_vertically(&mut self) {
        let row = self.row_size();
        let layer_size = self.layer_size();
        let height = self.height as usize;
        if row == 0 || layer_size == 0 {
            return;
        }
        for layer in self.data.chunks_exact_mut(layer_size) {
            for y in 0..height / 2 {
                let (top, bottom) = layer.split_at_mut((height - 1 - y) * row);
                top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
            }
        }
    }

    /// Multiply color channels by alpha.
    ///
    /// Returns false if the format has no alpha channel the CPU can process.
    pub fn premultiply_alpha(&mut self) -> bool {
        match self.format.channel_layout() {
            Some((ChannelKind::U8, 4)) => {
                for texel in self.data.chunks_exact_mut(4) {
                    let alpha = texel[3] as f32 / 255.0;
                    for channel in &mut texel[..3] {
                        *channel = (*channel as f32 * alpha).round() as u8;
                    }
                }
                true
            }
            Some((ChannelKind::F32, 4)) => {
                for texel in self.data.chunks_exact_mut(16) {
                    let alpha: f32 = bytemuck::pod_read_unaligned(&texel[12..16]);
                    for c in 0..3 {
                        let range = c * 4..c * 4 + 4;
                        let value: f32 = bytemuck::pod_read_unaligned(&texel[range.clone()]);
                        texel[range].copy_from_slice(&(value * alpha).to_ne_bytes());
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn clone_metadata(&self) -> CpuTexture {
        CpuTexture {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            depth: self.depth,
            dimension: self.dimension,
            format: self.format,
            data: Vec::new(),
            generate_mipmaps: self.generate_mipmaps,
        }
    }
}

fn read_channel(data: &[u8], kind: ChannelKind, offset: usize) -> f32 {
    match kind {
        ChannelKind::U8 => data[offset] as f32,
        ChannelKind::F32 => bytemuck::pod_read_unaligned(&data[offset..offset + 4]),
    }
}

fn write_channel(data: &mut Vec<u8>, kind: ChannelKind, value: f32) {
    match kind {
        ChannelKind::U8 => data.push(value.round().clamp(0.0, 255.0) as u8),
        ChannelKind::F32 => data.extend_from_slice(&value.to_ne_bytes()),
    }
}
