//! Texture and sampler caching.
//!
//! The cache is layered:
//! - [`TextureObjectRegistry`] owns one [`TextureObject`] per identifier and
//!   runs the parallel load / serial commit cycle.
//! - [`SamplerObjectRegistry`] owns the [`SamplerObject`]s handles sample
//!   through.
//! - [`TextureHandleRegistry`] hands out [`TextureHandle`]s, turns their
//!   memory requests into texture budgets and creates sampler state.
//! - [`TextureCache`] wraps the above and notifies [`TextureConsumer`]s.
//!
//! The [`binder`] module exposes handles to shader code.

pub mod binder;
mod cache;
mod handle;
mod handle_registry;
mod object;
mod object_registry;
mod sampler_object;
mod sampler_registry;

pub use binder::{BufferElementType, BufferSource, BufferSpec, NamedTextureHandle, TextureBindingTarget};
pub use cache::{TextureCache, TextureCacheConfig, TextureCacheStats};
pub use handle::{TextureConsumer, TextureHandle};
pub use handle_registry::TextureHandleRegistry;
pub use object::{tile_path, TextureObject, FIRST_TILE, TILE_COUNT, UDIM_PATTERN};
pub use object_registry::TextureObjectRegistry;
pub use sampler_object::{resolve_sampler_descriptor, SamplerObject};
pub use sampler_registry::SamplerObjectRegistry;
