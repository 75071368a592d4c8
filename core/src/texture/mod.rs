//! CPU-side texture types.
//!
//! Provides [`CpuTexture`] for holding raw texel data, the [`TextureFormat`]
//! and [`TextureDimension`] enums shared between CPU and GPU code, and the
//! [`TextureType`] tag that selects how the cache serves a texture.

mod cpu_texture;
mod types;
pub mod utils;

pub use cpu_texture::CpuTexture;
pub use types::{ChannelKind, TextureDimension, TextureFormat, TextureType};
