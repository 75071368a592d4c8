//! # Texture Cache Core
//!
//! CPU-side building blocks of the texture cache: texture identifiers,
//! sampler parameters, CPU texel storage and the loaders that fill it.

pub mod identifier;
pub mod io;
pub mod math;
pub mod sampler;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
