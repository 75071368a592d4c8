//! GPU backend abstraction layer.
//!
//! The texture cache talks to the GPU only through [`GpuBackend`], so the
//! same cache runs against real hardware or against the no-op backend used
//! by the tests.
//!
//! # Available Backends
//!
//! - `dummy` (default): No-op backend that records what it was asked to do
//! - `wgpu-backend`: Cross-platform backend using wgpu

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub mod dummy;

use std::sync::Arc;

use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::types::{SamplerDescriptor, TextureDescriptor};

/// Handle to a GPU texture resource.
#[allow(clippy::large_enum_variant)]
pub enum GpuTexture {
    /// Dummy backend (no GPU allocation)
    Dummy,
    /// wgpu backend texture
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        texture: Arc<wgpu::Texture>,
        view: Arc<wgpu::TextureView>,
    },
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuTexture::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { texture, view } => f
                .debug_struct("GpuTexture::Wgpu")
                .field("texture", texture)
                .field("view", view)
                .finish(),
        }
    }
}

/// Handle to a GPU sampler resource.
pub enum GpuSampler {
    /// Dummy backend (no GPU allocation)
    Dummy,
    /// wgpu backend sampler
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Sampler>),
}

impl std::fmt::Debug for GpuSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuSampler::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(sampler) => f.debug_tuple("GpuSampler::Wgpu").field(sampler).finish(),
        }
    }
}

/// GPU backend trait for abstracting different GPU APIs.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Limits and optional features of the backend.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Create a texture resource.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError>;

    /// Release a texture resource. Called once, when the owning texture drops.
    fn destroy_texture(&self, texture: &GpuTexture);

    /// Upload one whole mip level.
    fn write_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        mip_level: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError>;

    /// Fill mip levels 1 and up from level 0.
    ///
    /// Backends without GPU mip generation return
    /// [`GraphicsError::FeatureNotSupported`].
    fn generate_mipmaps(&self, texture: &GpuTexture, descriptor: &TextureDescriptor) -> Result<(), GraphicsError>;

    /// Create a sampler resource.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError>;

    /// Release a sampler resource. Called once, when the owning sampler drops.
    fn destroy_sampler(&self, sampler: &GpuSampler);

    /// Create a resident texture+sampler token.
    fn create_bindless_handle(&self, texture: &GpuTexture, sampler: &GpuSampler) -> Result<u64, GraphicsError>;

    /// Make a token non-resident and release it.
    fn release_bindless_handle(&self, handle: u64);
}

/// Selects and creates the appropriate backend based on available features.
pub fn create_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    // Try wgpu backend if available
    #[cfg(feature = "wgpu-backend")]
    {
        match wgpu_backend::WgpuBackend::new() {
            Ok(backend) => {
                log::info!("Using wgpu backend");
                return Ok(Arc::new(backend));
            }
            Err(e) => {
                log::warn!("Failed to create wgpu backend: {}", e);
            }
        }
    }

    // Fall back to dummy backend
    log::info!("Using dummy backend");
    Ok(Arc::new(dummy::DummyBackend::new()))
}

/// Check if a real GPU backend is available.
pub fn has_gpu_backend() -> bool {
    cfg!(feature = "wgpu-backend")
}
