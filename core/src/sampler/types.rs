//! Resolved filter, address and compare modes of a device sampler.

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    #[default]
    Nearest,
    /// Linear filtering.
    Linear,
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
    /// Clamp to border color.
    ClampToBorder,
}

/// Comparison function for depth/shadow sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// Never pass.
    #[default]
    Never,
    /// Pass if less than.
    Less,
    /// Pass if equal.
    Equal,
    /// Pass if less than or equal.
    LessEqual,
    /// Pass if greater than.
    Greater,
    /// Pass if not equal.
    NotEqual,
    /// Pass if greater than or equal.
    GreaterEqual,
    /// Always pass.
    Always,
}
