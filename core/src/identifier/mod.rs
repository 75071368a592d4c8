//! Texture identity.
//!
//! A [`TextureIdentifier`] names a texture by file path and, optionally, a
//! [`SubtextureIdentifier`] selecting a grid, an atlas mode or load options.
//! Identifiers are the cache key: two equal identifiers always share one
//! texture object.

mod subtexture;

use std::hash::{DefaultHasher, Hash, Hasher};

pub use subtexture::{ColorSpace, DynamicTextureSource, GridSelector, SubtextureIdentifier};

/// Identifies a texture by file path and sub-selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureIdentifier {
    /// Path of the backing file. Empty for dynamic textures without a file.
    pub file_path: String,
    /// Selection inside the file.
    pub subtexture: Option<SubtextureIdentifier>,
}

impl TextureIdentifier {
    /// Identifier for a whole file.
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            subtexture: None,
        }
    }

    /// Identifier for a selection inside a file.
    pub fn with_subtexture(file_path: impl Into<String>, subtexture: SubtextureIdentifier) -> Self {
        Self {
            file_path: file_path.into(),
            subtexture: Some(subtexture),
        }
    }

    /// Returns true if the texture is filled by the application.
    pub fn is_dynamic(&self) -> bool {
        self.subtexture.as_ref().is_some_and(SubtextureIdentifier::is_dynamic)
    }

    /// Hash of path and sub-selection that is stable within a build.
    pub fn identity_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Display for TextureIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subtexture {
            None => write!(f, "{}", self.file_path),
            Some(sub) => write!(f, "{} [{:?}]", self.file_path, sub),
        }
    }
}
