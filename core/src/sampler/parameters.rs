//! Consumer-facing sampler parameters.

use super::{AddressMode, CompareFunction, FilterMode};

/// Wrap behavior requested for one texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Clamp to the edge texel.
    Clamp,
    /// Repeat.
    #[default]
    Repeat,
    /// Clamp to a transparent black border.
    Black,
    /// Mirrored repeat.
    Mirror,
    /// Use the texture file's wrap hint; black if the file has none.
    NoOpinion,
    /// Use the texture file's wrap hint; repeat if the file has none.
    LegacyNoOpinionFallbackRepeat,
}

impl WrapMode {
    /// Returns true if the mode defers to the texture file.
    pub fn is_no_opinion(&self) -> bool {
        matches!(self, Self::NoOpinion | Self::LegacyNoOpinionFallbackRepeat)
    }

    /// Resolve against the wrap hint of the texture file.
    pub fn resolve(self, file_hint: WrapMode) -> WrapMode {
        if !self.is_no_opinion() {
            return self;
        }
        if !file_hint.is_no_opinion() {
            return file_hint;
        }
        match self {
            Self::LegacyNoOpinionFallbackRepeat => Self::Repeat,
            _ => Self::Black,
        }
    }

    /// Device address mode for a resolved wrap mode.
    ///
    /// Unresolved modes fall back to clamp to border, matching [`WrapMode::NoOpinion`].
    pub fn address_mode(&self) -> AddressMode {
        match self {
            Self::Clamp => AddressMode::ClampToEdge,
            Self::Repeat => AddressMode::Repeat,
            Self::Mirror => AddressMode::MirrorRepeat,
            Self::Black | Self::NoOpinion => AddressMode::ClampToBorder,
            Self::LegacyNoOpinionFallbackRepeat => AddressMode::Repeat,
        }
    }
}

/// Minification filter, including the mip selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MinFilter {
    /// Nearest texel, no mips.
    #[default]
    Nearest,
    /// Linear filter, no mips.
    Linear,
    /// Nearest texel of the nearest mip.
    NearestMipmapNearest,
    /// Nearest texel, blended across mips.
    NearestMipmapLinear,
    /// Linear filter of the nearest mip.
    LinearMipmapNearest,
    /// Trilinear.
    LinearMipmapLinear,
}

impl MinFilter {
    /// Device minification filter.
    pub fn filter_mode(&self) -> FilterMode {
        match self {
            Self::Nearest | Self::NearestMipmapNearest | Self::NearestMipmapLinear => FilterMode::Nearest,
            Self::Linear | Self::LinearMipmapNearest | Self::LinearMipmapLinear => FilterMode::Linear,
        }
    }

    /// Device mipmap filter, or `None` if mips are not sampled.
    pub fn mipmap_filter(&self) -> Option<FilterMode> {
        match self {
            Self::Nearest | Self::Linear => None,
            Self::NearestMipmapNearest | Self::LinearMipmapNearest => Some(FilterMode::Nearest),
            Self::NearestMipmapLinear | Self::LinearMipmapLinear => Some(FilterMode::Linear),
        }
    }
}

/// Magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MagFilter {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Linear filter.
    Linear,
}

impl MagFilter {
    /// Device magnification filter.
    pub fn filter_mode(&self) -> FilterMode {
        match self {
            Self::Nearest => FilterMode::Nearest,
            Self::Linear => FilterMode::Linear,
        }
    }
}

/// Border color used by [`WrapMode::Black`] and clamp-to-border sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderColor {
    /// (0, 0, 0, 0)
    #[default]
    TransparentBlack,
    /// (0, 0, 0, 1)
    OpaqueBlack,
    /// (1, 1, 1, 1)
    OpaqueWhite,
}

/// Sampling parameters a consumer requests for a texture.
///
/// Wrap modes may defer to the texture file; they are resolved once the
/// texture has been loaded, see [`WrapMode::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerParameters {
    /// Wrap mode for the s coordinate.
    pub wrap_s: WrapMode,
    /// Wrap mode for the t coordinate.
    pub wrap_t: WrapMode,
    /// Wrap mode for the r coordinate.
    pub wrap_r: WrapMode,
    /// Minification filter.
    pub min_filter: MinFilter,
    /// Magnification filter.
    pub mag_filter: MagFilter,
    /// Border color for clamp-to-border.
    pub border_color: BorderColor,
    /// Enable depth comparison.
    pub enable_compare: bool,
    /// Comparison function, used if `enable_compare` is set.
    pub compare_function: CompareFunction,
    /// Maximum anisotropy.
    pub max_anisotropy: u16,
}

impl Default for SamplerParameters {
    fn default() -> Self {
        Self {
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            wrap_r: WrapMode::Repeat,
            min_filter: MinFilter::Nearest,
            mag_filter: MagFilter::Nearest,
            border_color: BorderColor::TransparentBlack,
            enable_compare: false,
            compare_function: CompareFunction::Never,
            max_anisotropy: 16,
        }
    }
}

impl SamplerParameters {
    /// Trilinear filtering.
    pub fn linear() -> Self {
        Self {
            min_filter: MinFilter::LinearMipmapLinear,
            mag_filter: MagFilter::Linear,
            ..Default::default()
        }
    }

    /// Set the wrap mode for all coordinates.
    pub fn with_wrap(mut self, mode: WrapMode) -> Self {
        self.wrap_s = mode;
        self.wrap_t = mode;
        self.wrap_r = mode;
        self
    }

    /// Set the min and mag filters.
    pub fn with_filters(mut self, min_filter: MinFilter, mag_filter: MagFilter) -> Self {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
        self
    }

    /// Enable depth comparison.
    pub fn with_compare(mut self, compare_function: CompareFunction) -> Self {
        self.enable_compare = true;
        self.compare_function = compare_function;
        self
    }

    /// Set the maximum anisotropy.
    pub fn with_anisotropy(mut self, level: u16) -> Self {
        self.max_anisotropy = level;
        self
    }
}
