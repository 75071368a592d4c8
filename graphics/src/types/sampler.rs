//! Sampler types and descriptors.

// Re-export CPU-side types from core.
pub use texcache_core::sampler::{AddressMode, BorderColor, CompareFunction, FilterMode};
use texcache_core::sampler::{SamplerParameters, WrapMode};

/// Descriptor for creating a sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor {
    /// Debug label for the sampler.
    pub label: Option<String>,
    /// Address mode for U coordinate.
    pub address_mode_u: AddressMode,
    /// Address mode for V coordinate.
    pub address_mode_v: AddressMode,
    /// Address mode for W coordinate.
    pub address_mode_w: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Mipmap filter.
    pub mipmap_filter: FilterMode,
    /// Minimum LOD clamp.
    pub lod_min_clamp: f32,
    /// Maximum LOD clamp.
    pub lod_max_clamp: f32,
    /// Comparison function for depth sampling.
    pub compare: Option<CompareFunction>,
    /// Maximum anisotropy level.
    pub anisotropy_clamp: u16,
    /// Border color, used when an address mode clamps to border.
    pub border_color: Option<BorderColor>,
}

impl SamplerDescriptor {
    /// Create a new sampler descriptor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build device state from consumer parameters and resolved wrap modes.
    ///
    /// `wraps` are the s, t and r modes after file hints were applied.
    pub fn from_parameters(parameters: &SamplerParameters, wraps: [WrapMode; 3]) -> Self {
        let [u, v, w] = wraps.map(|wrap| wrap.address_mode());
        let uses_border = [u, v, w].contains(&AddressMode::ClampToBorder);
        let mipmap_filter = parameters.min_filter.mipmap_filter();
        let filtered = parameters.min_filter.filter_mode() == FilterMode::Linear
            && parameters.mag_filter.filter_mode() == FilterMode::Linear
            && mipmap_filter == Some(FilterMode::Linear);

        Self {
            label: None,
            address_mode_u: u,
            address_mode_v: v,
            address_mode_w: w,
            mag_filter: parameters.mag_filter.filter_mode(),
            min_filter: parameters.min_filter.filter_mode(),
            mipmap_filter: mipmap_filter.unwrap_or(FilterMode::Nearest),
            lod_min_clamp: 0.0,
            lod_max_clamp: if mipmap_filter.is_some() { 32.0 } else { 0.0 },
            compare: parameters.enable_compare.then_some(parameters.compare_function),
            // Anisotropy requires all filters to be linear.
            anisotropy_clamp: if filtered { parameters.max_anisotropy.max(1) } else { 1 },
            border_color: uses_border.then_some(parameters.border_color),
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set address mode for all coordinates.
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode_u = mode;
        self.address_mode_v = mode;
        self.address_mode_w = mode;
        if mode != AddressMode::ClampToBorder {
            self.border_color = None;
        }
        self
    }
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            mipmap_filter: FilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            compare: None,
            anisotropy_clamp: 1,
            border_color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texcache_core::sampler::{MagFilter, MinFilter};

    #[test]
    fn test_from_parameters_black_uses_border() {
        let params = SamplerParameters::default();
        let desc = SamplerDescriptor::from_parameters(&params, [WrapMode::Black, WrapMode::Repeat, WrapMode::Repeat]);
        assert_eq!(desc.address_mode_u, AddressMode::ClampToBorder);
        assert_eq!(desc.border_color, Some(BorderColor::TransparentBlack));
        assert_eq!(desc.lod_max_clamp, 0.0);
    }

    #[test]
    fn test_from_parameters_trilinear_anisotropy() {
        let params = SamplerParameters::linear().with_anisotropy(8);
        let desc = SamplerDescriptor::from_parameters(&params, [WrapMode::Repeat; 3]);
        assert_eq!(desc.mipmap_filter, FilterMode::Linear);
        assert_eq!(desc.anisotropy_clamp, 8);
        assert_eq!(desc.border_color, None);

        let nearest = params.with_filters(MinFilter::Nearest, MagFilter::Nearest);
        let desc = SamplerDescriptor::from_parameters(&nearest, [WrapMode::Repeat; 3]);
        assert_eq!(desc.anisotropy_clamp, 1);
    }

    #[test]
    fn test_with_address_mode_clears_border() {
        let params = SamplerParameters::default();
        let desc = SamplerDescriptor::from_parameters(&params, [WrapMode::Black; 3])
            .with_address_mode(AddressMode::ClampToEdge);
        assert_eq!(desc.border_color, None);
    }
}
