//! GPU resources.
//!
//! This module contains the GPU resource types that are created by [`GraphicsDevice`]:
//! - [`Texture`] - GPU texture/image
//! - [`Sampler`] - Texture sampler
//! - [`BindlessHandle`] - Resident texture+sampler token
//!
//! Resources are reference-counted with [`Arc`] and can be shared across threads.
//! Each resource holds a strong reference to its parent device and releases
//! its backend object when the last reference drops.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice
//! [`Arc`]: std::sync::Arc

mod bindless;
mod sampler;
mod texture;

pub use bindless::BindlessHandle;
pub use sampler::Sampler;
pub use texture::Texture;
