//! Resident texture+sampler tokens.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::resources::{Sampler, Texture};

/// A bindless token for a texture sampled through a sampler.
///
/// Created by [`GraphicsDevice::create_bindless_handle`]. The pair stays
/// resident as long as the handle lives; dropping it releases the token.
pub struct BindlessHandle {
    device: Arc<GraphicsDevice>,
    value: u64,
    texture: Arc<Texture>,
    sampler: Arc<Sampler>,
}

impl BindlessHandle {
    pub(crate) fn new(device: Arc<GraphicsDevice>, value: u64, texture: Arc<Texture>, sampler: Arc<Sampler>) -> Self {
        Self {
            device,
            value,
            texture,
            sampler,
        }
    }

    /// The token shaders use to sample. Never zero.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The resident texture.
    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    /// The sampler the texture is read through.
    pub fn sampler(&self) -> &Arc<Sampler> {
        &self.sampler
    }
}

impl Drop for BindlessHandle {
    fn drop(&mut self) {
        self.device.backend().release_bindless_handle(self.value);
    }
}

impl std::fmt::Debug for BindlessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindlessHandle")
            .field("value", &self.value)
            .field("texture", &self.texture.id())
            .finish()
    }
}

static_assertions::assert_impl_all!(BindlessHandle: Send, Sync);
