//! GPU sampler resource.

use std::sync::Arc;

use crate::backend::GpuSampler;
use crate::device::GraphicsDevice;
use crate::types::SamplerDescriptor;

/// A GPU texture sampler.
///
/// Samplers are created by [`GraphicsDevice::create_sampler`] and are reference-counted.
///
/// # Example
///
/// ```ignore
/// let sampler = device.create_sampler(&SamplerDescriptor::new())?;
/// ```
pub struct Sampler {
    device: Arc<GraphicsDevice>,
    descriptor: SamplerDescriptor,
    gpu: GpuSampler,
}

impl Sampler {
    /// Create a new sampler (called by GraphicsDevice).
    pub(crate) fn new(device: Arc<GraphicsDevice>, descriptor: SamplerDescriptor, gpu: GpuSampler) -> Self {
        Self {
            device,
            descriptor,
            gpu,
        }
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the backend sampler.
    pub fn gpu(&self) -> &GpuSampler {
        &self.gpu
    }

    /// Get the sampler descriptor.
    pub fn descriptor(&self) -> &SamplerDescriptor {
        &self.descriptor
    }

    /// Get the sampler label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.device.backend().destroy_sampler(&self.gpu);
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("address_mode_u", &self.descriptor.address_mode_u)
            .field("mag_filter", &self.descriptor.mag_filter)
            .field("min_filter", &self.descriptor.min_filter)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Sampler is Send + Sync
static_assertions::assert_impl_all!(Sampler: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilterMode;

    #[test]
    fn test_sampler_debug() {
        let device = GraphicsDevice::dummy();
        let desc = SamplerDescriptor {
            mag_filter: FilterMode::Linear,
            ..Default::default()
        };
        let sampler = device.create_sampler(&desc).unwrap();
        let debug = format!("{:?}", sampler);
        assert!(debug.contains("Sampler"));
        assert!(debug.contains("Linear"));
    }

    #[test]
    fn test_sampler_label() {
        let device = GraphicsDevice::dummy();
        let desc = SamplerDescriptor::new().with_label("test_sampler");
        let sampler = device.create_sampler(&desc).unwrap();
        assert_eq!(sampler.label(), Some("test_sampler"));
    }
}
