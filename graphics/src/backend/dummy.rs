//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations but provides
//! a valid implementation for testing the texture cache without
//! requiring GPU hardware. It counts every call so tests can check
//! how often the cache touched the device.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::types::{SamplerDescriptor, TextureDescriptor};

use super::{GpuBackend, GpuSampler, GpuTexture};

/// Snapshot of the calls a [`DummyBackend`] received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DummyStats {
    /// Textures created.
    pub textures_created: u64,
    /// Textures destroyed.
    pub textures_destroyed: u64,
    /// Mip level uploads.
    pub texture_writes: u64,
    /// GPU mip generations.
    pub mipmaps_generated: u64,
    /// Samplers created.
    pub samplers_created: u64,
    /// Samplers destroyed.
    pub samplers_destroyed: u64,
    /// Bindless tokens created.
    pub bindless_handles_created: u64,
    /// Bindless tokens released.
    pub bindless_handles_released: u64,
}

impl DummyStats {
    /// Textures currently alive.
    pub fn live_textures(&self) -> u64 {
        self.textures_created - self.textures_destroyed
    }

    /// Samplers currently alive.
    pub fn live_samplers(&self) -> u64 {
        self.samplers_created - self.samplers_destroyed
    }

    /// Bindless tokens currently resident.
    pub fn resident_bindless_handles(&self) -> u64 {
        self.bindless_handles_created - self.bindless_handles_released
    }
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    capabilities: DeviceCapabilities,
    textures_created: AtomicU64,
    textures_destroyed: AtomicU64,
    texture_writes: AtomicU64,
    mipmaps_generated: AtomicU64,
    samplers_created: AtomicU64,
    samplers_destroyed: AtomicU64,
    bindless_handles_created: AtomicU64,
    bindless_handles_released: AtomicU64,
}

impl DummyBackend {
    /// Create a new dummy backend supporting bindless textures and GPU mips.
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities {
            bindless_textures: true,
            gpu_mipmap_generation: true,
            ..Default::default()
        })
    }

    /// Create a dummy backend reporting `capabilities`.
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            ..Default::default()
        }
    }

    /// Counters of all calls so far.
    pub fn stats(&self) -> DummyStats {
        DummyStats {
            textures_created: self.textures_created.load(Ordering::Acquire),
            textures_destroyed: self.textures_destroyed.load(Ordering::Acquire),
            texture_writes: self.texture_writes.load(Ordering::Acquire),
            mipmaps_generated: self.mipmaps_generated.load(Ordering::Acquire),
            samplers_created: self.samplers_created.load(Ordering::Acquire),
            samplers_destroyed: self.samplers_destroyed.load(Ordering::Acquire),
            bindless_handles_created: self.bindless_handles_created.load(Ordering::Acquire),
            bindless_handles_released: self.bindless_handles_released.load(Ordering::Acquire),
        }
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth
        );
        self.textures_created.fetch_add(1, Ordering::AcqRel);
        Ok(GpuTexture::Dummy)
    }

    fn destroy_texture(&self, _texture: &GpuTexture) {
        self.textures_destroyed.fetch_add(1, Ordering::AcqRel);
    }

    fn write_texture(
        &self,
        _texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        mip_level: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        log::trace!(
            "DummyBackend: writing {} bytes to mip {} of {:?}",
            data.len(),
            mip_level,
            descriptor.label
        );
        self.texture_writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn generate_mipmaps(&self, _texture: &GpuTexture, descriptor: &TextureDescriptor) -> Result<(), GraphicsError> {
        if !self.capabilities.gpu_mipmap_generation {
            return Err(GraphicsError::FeatureNotSupported(
                "GPU mipmap generation".to_string(),
            ));
        }
        log::trace!(
            "DummyBackend: generating {} mips for {:?}",
            descriptor.mip_level_count,
            descriptor.label
        );
        self.mipmaps_generated.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError> {
        log::trace!("DummyBackend: creating sampler {:?}", descriptor.label);
        self.samplers_created.fetch_add(1, Ordering::AcqRel);
        Ok(GpuSampler::Dummy)
    }

    fn destroy_sampler(&self, _sampler: &GpuSampler) {
        self.samplers_destroyed.fetch_add(1, Ordering::AcqRel);
    }

    fn create_bindless_handle(&self, _texture: &GpuTexture, _sampler: &GpuSampler) -> Result<u64, GraphicsError> {
        if !self.capabilities.bindless_textures {
            return Err(GraphicsError::FeatureNotSupported("bindless textures".to_string()));
        }
        // Tokens start at 1 so 0 can mean "no texture" in shader buffers.
        let handle = self.bindless_handles_created.fetch_add(1, Ordering::AcqRel) + 1;
        Ok(handle)
    }

    fn release_bindless_handle(&self, handle: u64) {
        log::trace!("DummyBackend: releasing bindless handle {}", handle);
        self.bindless_handles_released.fetch_add(1, Ordering::AcqRel);
    }
}
