//! Texture format, dimension and cache type tags.

/// Texture kind served by the cache.
///
/// The tag selects the texture object variant, the sampler variant and the
/// shader resources a consumer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureType {
    /// Plain 2D image addressed by uv coordinates.
    Uv,
    /// Volumetric grid sampled through a sampling transform.
    Field,
    /// Per-face atlas: texels plus a face layout table.
    Ptex,
    /// Multi-page tile atlas: texel layers plus a tile layout table.
    Udim,
}

impl TextureType {
    /// All texture types in declaration order.
    pub const ALL: [TextureType; 4] = [Self::Uv, Self::Field, Self::Ptex, Self::Udim];

    /// Returns true if the type is backed by two device textures.
    pub fn has_layout(&self) -> bool {
        matches!(self, Self::Ptex | Self::Udim)
    }
}

/// Texture dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// 1D texture.
    D1,
    /// 2D texture.
    #[default]
    D2,
    /// 2D array texture; depth is the layer count.
    D2Array,
    /// 3D texture.
    D3,
}

/// Texture format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    // 8-bit formats
    /// 8-bit red channel, unsigned normalized.
    R8Unorm,

    // 16-bit formats
    /// 16-bit red channel, float.
    R16Float,
    /// 8-bit RG channels, unsigned normalized.
    Rg8Unorm,

    // 32-bit formats
    /// 32-bit red channel, float.
    R32Float,
    /// 32-bit red channel, unsigned integer.
    R32Uint,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized.
    Bgra8Unorm,
    /// 8-bit BGRA channels, sRGB.
    Bgra8UnormSrgb,
    /// 32-bit depth, float.
    Depth32Float,

    // 64-bit formats
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit RG channels, float.
    Rg32Float,

    // 128-bit formats
    /// 32-bit RGBA channels, float.
    Rgba32Float,
}

/// Storage of a single channel inside a texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Unsigned normalized byte.
    U8,
    /// 32-bit float.
    F32,
}

impl TextureFormat {
    /// Returns the size in bytes per pixel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::R16Float | Self::Rg8Unorm => 2,
            Self::R32Float
            | Self::R32Uint
            | Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Depth32Float => 4,
            Self::Rgba16Float | Self::Rg32Float => 8,
            Self::Rgba32Float => 16,
        }
    }

    /// Returns true if this is a depth format.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth32Float)
    }

    /// Returns true if texels are stored with the sRGB transfer function.
    pub fn is_srgb(&self) -> bool {
        matches!(self, Self::Rgba8UnormSrgb | Self::Bgra8UnormSrgb)
    }

    /// sRGB counterpart of this format, or the format itself if it has none.
    pub fn to_srgb(self) -> Self {
        match self {
            Self::Rgba8Unorm => Self::Rgba8UnormSrgb,
            Self::Bgra8Unorm => Self::Bgra8UnormSrgb,
            other => other,
        }
    }

    /// Linear counterpart of this format.
    pub fn to_linear(self) -> Self {
        match self {
            Self::Rgba8UnormSrgb => Self::Rgba8Unorm,
            Self::Bgra8UnormSrgb => Self::Bgra8Unorm,
            other => other,
        }
    }

    /// Channel storage and count, for formats the CPU filters can process.
    pub fn channel_layout(&self) -> Option<(ChannelKind, usize)> {
        match self {
            Self::R8Unorm => Some((ChannelKind::U8, 1)),
            Self::Rg8Unorm => Some((ChannelKind::U8, 2)),
            Self::Rgba8Unorm | Self::Rgba8UnormSrgb | Self::Bgra8Unorm | Self::Bgra8UnormSrgb => {
                Some((ChannelKind::U8, 4))
            }
            Self::R32Float => Some((ChannelKind::F32, 1)),
            Self::Rg32Float => Some((ChannelKind::F32, 2)),
            Self::Rgba32Float => Some((ChannelKind::F32, 4)),
            _ => None,
        }
    }

    /// Returns true if the last channel is alpha.
    pub fn has_alpha(&self) -> bool {
        matches!(
            self,
            Self::Rgba8Unorm
                | Self::Rgba8UnormSrgb
                | Self::Bgra8Unorm
                | Self::Bgra8UnormSrgb
                | Self::Rgba16Float
                | Self::Rgba32Float
        )
    }
}
