//! Selection of a texture inside a file.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::texture::CpuTexture;

/// Color space the texels are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// Linear data, no transfer function.
    Raw,
    /// sRGB encoded color.
    Srgb,
    /// Decided by the loader from the file's pixel type.
    #[default]
    Auto,
}

/// Caller-supplied texels for a dynamically populated texture.
pub trait DynamicTextureSource: Send + Sync {
    /// Produce texels for the next commit. Runs on a load worker.
    ///
    /// `None` leaves the texture without a device resource.
    fn load(&self, target_memory: usize) -> Option<CpuTexture>;

    /// Called on the commit thread after the texels were uploaded.
    fn committed(&self, _valid: bool) {}
}

/// Which part of a file a texture identifier refers to.
#[derive(Clone)]
pub enum SubtextureIdentifier {
    /// Plain image file with load options.
    PlainAsset {
        /// Flip rows on load.
        flip_vertically: bool,
        /// Multiply color by alpha on load.
        premultiply_alpha: bool,
        /// Color space of the texels.
        color_space: ColorSpace,
    },
    /// Grid of an OpenVDB volume.
    OpenVdbGrid {
        /// Grid name.
        field_name: String,
        /// Index among grids with the same name.
        field_index: u32,
    },
    /// Layer of a Field3D volume.
    Field3DGrid {
        /// Layer name.
        field_name: String,
        /// Index among layers with the same name.
        field_index: u32,
        /// Field3D partition.
        field_purpose: String,
    },
    /// Texture filled by the application instead of a file.
    DynamicallyPopulated {
        /// Texel producer; without one, texels are pushed to the texture object directly.
        source: Option<Arc<dyn DynamicTextureSource>>,
    },
    /// Per-face atlas file.
    MultiFaceAtlas {
        /// Multiply color by alpha on load.
        premultiply_alpha: bool,
    },
    /// Tiled texture with a `<UDIM>` pattern in its path.
    MultiPageAtlas {
        /// Multiply color by alpha on load.
        premultiply_alpha: bool,
        /// Color space of the texels.
        color_space: ColorSpace,
    },
}

/// Grid requested from a volume file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridSelector {
    /// Grid or layer name.
    pub name: String,
    /// Index among grids with the same name.
    pub index: u32,
    /// Field3D partition, if any.
    pub purpose: Option<String>,
}

impl SubtextureIdentifier {
    /// Plain asset with default options.
    pub fn plain() -> Self {
        Self::PlainAsset {
            flip_vertically: false,
            premultiply_alpha: false,
            color_space: ColorSpace::Auto,
        }
    }

    /// OpenVDB grid by name.
    pub fn open_vdb(field_name: impl Into<String>, field_index: u32) -> Self {
        Self::OpenVdbGrid {
            field_name: field_name.into(),
            field_index,
        }
    }

    /// Dynamic texture filled by `source`.
    pub fn dynamic(source: Arc<dyn DynamicTextureSource>) -> Self {
        Self::DynamicallyPopulated { source: Some(source) }
    }

    /// Returns true for the dynamically populated variant.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::DynamicallyPopulated { .. })
    }

    /// Grid selection for the volume variants.
    pub fn grid_selector(&self) -> Option<GridSelector> {
        match self {
            Self::OpenVdbGrid {
                field_name,
                field_index,
            } => Some(GridSelector {
                name: field_name.clone(),
                index: *field_index,
                purpose: None,
            }),
            Self::Field3DGrid {
                field_name,
                field_index,
                field_purpose,
            } => Some(GridSelector {
                name: field_name.clone(),
                index: *field_index,
                purpose: Some(field_purpose.clone()),
            }),
            _ => None,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::PlainAsset { .. } => 0,
            Self::OpenVdbGrid { .. } => 1,
            Self::Field3DGrid { .. } => 2,
            Self::DynamicallyPopulated { .. } => 3,
            Self::MultiFaceAtlas { .. } => 4,
            Self::MultiPageAtlas { .. } => 5,
        }
    }

    fn source_address(source: &Option<Arc<dyn DynamicTextureSource>>) -> usize {
        source
            .as_ref()
            .map_or(0, |source| Arc::as_ptr(source) as *const () as usize)
    }
}

impl PartialEq for SubtextureIdentifier {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::PlainAsset {
                    flip_vertically: a_flip,
                    premultiply_alpha: a_premult,
                    color_space: a_cs,
                },
                Self::PlainAsset {
                    flip_vertically: b_flip,
                    premultiply_alpha: b_premult,
                    color_space: b_cs,
                },
            ) => a_flip == b_flip && a_premult == b_premult && a_cs == b_cs,
            (
                Self::OpenVdbGrid {
                    field_name: a_name,
                    field_index: a_index,
                },
                Self::OpenVdbGrid {
                    field_name: b_name,
                    field_index: b_index,
                },
            ) => a_name == b_name && a_index == b_index,
            (
                Self::Field3DGrid {
                    field_name: a_name,
                    field_index: a_index,
                    field_purpose: a_purpose,
                },
                Self::Field3DGrid {
                    field_name: b_name,
                    field_index: b_index,
                    field_purpose: b_purpose,
                },
            ) => a_name == b_name && a_index == b_index && a_purpose == b_purpose,
            (
                Self::DynamicallyPopulated { source: a },
                Self::DynamicallyPopulated { source: b },
            ) => Self::source_address(a) == Self::source_address(b),
            (
                Self::MultiFaceAtlas { premultiply_alpha: a },
                Self::MultiFaceAtlas { premultiply_alpha: b },
            ) => a == b,
            (
                Self::MultiPageAtlas {
                    premultiply_alpha: a_premult,
                    color_space: a_cs,
                },
                Self::MultiPageAtlas {
                    premultiply_alpha: b_premult,
                    color_space: b_cs,
                },
            ) => a_premult == b_premult && a_cs == b_cs,
            _ => false,
        }
    }
}

impl Eq for SubtextureIdentifier {}

impl Hash for SubtextureIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        match self {
            Self::PlainAsset {
                flip_vertically,
                premultiply_alpha,
                color_space,
            } => {
                flip_vertically.hash(state);
                premultiply_alpha.hash(state);
                color_space.hash(state);
            }
            Self::OpenVdbGrid {
                field_name,
                field_index,
            } => {
                field_name.hash(state);
                field_index.hash(state);
            }
            Self::Field3DGrid {
                field_name,
                field_index,
                field_purpose,
            } => {
                field_name.hash(state);
                field_index.hash(state);
                field_purpose.hash(state);
            }
            Self::DynamicallyPopulated { source } => Self::source_address(source).hash(state),
            Self::MultiFaceAtlas { premultiply_alpha } => premultiply_alpha.hash(state),
            Self::MultiPageAtlas {
                premultiply_alpha,
                color_space,
            } => {
                premultiply_alpha.hash(state);
                color_space.hash(state);
            }
        }
    }
}

impl fmt::Debug for SubtextureIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainAsset {
                flip_vertically,
                premultiply_alpha,
                color_space,
            } => f
                .debug_struct("PlainAsset")
                .field("flip_vertically", flip_vertically)
                .field("premultiply_alpha", premultiply_alpha)
                .field("color_space", color_space)
                .finish(),
            Self::OpenVdbGrid {
                field_name,
                field_index,
            } => f
                .debug_struct("OpenVdbGrid")
                .field("field_name", field_name)
                .field("field_index", field_index)
                .finish(),
            Self::Field3DGrid {
                field_name,
                field_index,
                field_purpose,
            } => f
                .debug_struct("Field3DGrid")
                .field("field_name", field_name)
                .field("field_index", field_index)
                .field("field_purpose", field_purpose)
                .finish(),
            Self::DynamicallyPopulated { source } => f
                .debug_struct("DynamicallyPopulated")
                .field("source", &format_args!("{:#x}", Self::source_address(source)))
                .finish(),
            Self::MultiFaceAtlas { premultiply_alpha } => f
                .debug_struct("MultiFaceAtlas")
                .field("premultiply_alpha", premultiply_alpha)
                .finish(),
            Self::MultiPageAtlas {
                premultiply_alpha,
                color_space,
            } => f
                .debug_struct("MultiPageAtlas")
                .field("premultiply_alpha", premultiply_alpha)
                .field("color_space", color_space)
                .finish(),
        }
    }
}
