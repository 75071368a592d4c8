//! Texture loading errors.

/// Error returned by a [`TextureLoader`](super::TextureLoader).
///
/// Load failures are recoverable: the cache marks the texture invalid and
/// keeps going.
#[derive(Debug, thiserror::Error)]
pub enum TextureIoError {
    /// No file or registered source at the path.
    #[error("texture not found: {0}")]
    NotFound(String),

    /// The loader cannot serve this kind of texture.
    #[error("unsupported texture source {path}: {reason}")]
    Unsupported { path: String, reason: String },

    /// The file exists but could not be decoded.
    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    /// The requested grid is not in the volume file.
    #[error("grid '{name}' (index {index}) not found in {path}")]
    GridNotFound { path: String, name: String, index: u32 },

    /// Decoded texels do not match their declared size.
    #[error("invalid texel data for {path}: {message}")]
    InvalidData { path: String, message: String },
}

impl TextureIoError {
    /// Returns true if the error means the source does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::GridNotFound { .. })
    }

    pub(crate) fn unsupported(path: &str, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
