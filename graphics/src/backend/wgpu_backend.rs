//! wgpu GPU backend implementation.
//!
//! This backend uses wgpu for cross-platform GPU access, supporting
//! Vulkan, Metal, DX12, and WebGPU. wgpu exposes neither bindless
//! texture handles nor mip generation, so the cache falls back to
//! per-draw binding and CPU-built mip chains on this backend.

use std::sync::Arc;

use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::types::{
    AddressMode, BorderColor, CompareFunction, FilterMode, SamplerDescriptor, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsage,
};

use super::{GpuBackend, GpuSampler, GpuTexture};

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .finish()
    }
}

impl WgpuBackend {
    /// Create a new wgpu backend.
    pub fn new() -> Result<Self, GraphicsError> {
        // Create instance with all backends
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        // Request adapter
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| GraphicsError::InitializationFailed(format!("No compatible GPU adapter: {e}")))?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        // Request device
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Texture Cache Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| GraphicsError::InitializationFailed(format!("Device creation failed: {e}")))?;

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Get the wgpu instance.
    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu Backend"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        let limits = self.device.limits();
        DeviceCapabilities {
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            max_texture_dimension_3d: limits.max_texture_dimension_3d,
            max_texture_array_layers: limits.max_texture_array_layers,
            bindless_textures: false,
            gpu_mipmap_generation: false,
        }
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        let format = convert_texture_format(descriptor.format)?;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: wgpu::Extent3d {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth_or_array_layers: descriptor.size.depth,
            },
            mip_level_count: descriptor.mip_level_count,
            sample_count: 1,
            dimension: convert_texture_dimension(descriptor.dimension),
            format,
            usage: convert_texture_usage(descriptor.usage),
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(convert_view_dimension(descriptor.dimension)),
            ..Default::default()
        });

        Ok(GpuTexture::Wgpu {
            texture: Arc::new(texture),
            view: Arc::new(view),
        })
    }

    fn destroy_texture(&self, texture: &GpuTexture) {
        if let GpuTexture::Wgpu { texture, .. } = texture {
            texture.destroy();
        }
    }

    fn write_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        mip_level: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let GpuTexture::Wgpu { texture, .. } = texture else {
            return Err(GraphicsError::InvalidParameter(
                "texture was not created by the wgpu backend".to_string(),
            ));
        };

        let shrink_depth = descriptor.dimension == TextureDimension::D3;
        let size = descriptor.size.mip_level_size(mip_level, shrink_depth);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size.width * descriptor.format.block_size()),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: size.depth,
            },
        );
        Ok(())
    }

    fn generate_mipmaps(&self, _texture: &GpuTexture, _descriptor: &TextureDescriptor) -> Result<(), GraphicsError> {
        Err(GraphicsError::FeatureNotSupported(
            "GPU mipmap generation".to_string(),
        ))
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError> {
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: convert_address_mode(descriptor.address_mode_u),
            address_mode_v: convert_address_mode(descriptor.address_mode_v),
            address_mode_w: convert_address_mode(descriptor.address_mode_w),
            mag_filter: convert_filter_mode(descriptor.mag_filter),
            min_filter: convert_filter_mode(descriptor.min_filter),
            mipmap_filter: convert_mipmap_filter_mode(descriptor.mipmap_filter),
            lod_min_clamp: descriptor.lod_min_clamp,
            lod_max_clamp: descriptor.lod_max_clamp,
            compare: descriptor.compare.map(convert_compare_function),
            anisotropy_clamp: descriptor.anisotropy_clamp,
            border_color: descriptor.border_color.map(convert_border_color),
        });

        Ok(GpuSampler::Wgpu(Arc::new(sampler)))
    }

    fn destroy_sampler(&self, _sampler: &GpuSampler) {}

    fn create_bindless_handle(&self, _texture: &GpuTexture, _sampler: &GpuSampler) -> Result<u64, GraphicsError> {
        Err(GraphicsError::FeatureNotSupported("bindless textures".to_string()))
    }

    fn release_bindless_handle(&self, _handle: u64) {}
}

fn convert_texture_format(format: TextureFormat) -> Result<wgpu::TextureFormat, GraphicsError> {
    let converted = match format {
        TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        TextureFormat::R16Float => wgpu::TextureFormat::R16Float,
        TextureFormat::Rg8Unorm => wgpu::TextureFormat::Rg8Unorm,
        TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
        TextureFormat::R32Uint => wgpu::TextureFormat::R32Uint,
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Rg32Float => wgpu::TextureFormat::Rg32Float,
        TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        // TextureFormat is non_exhaustive across crates.
        _ => {
            log::error!("Texture format {:?} has no wgpu equivalent", format);
            return Err(GraphicsError::InvalidParameter(format!(
                "texture format {format:?} is not supported by the wgpu backend"
            )));
        }
    };
    Ok(converted)
}

fn convert_texture_dimension(dimension: TextureDimension) -> wgpu::TextureDimension {
    match dimension {
        TextureDimension::D1 => wgpu::TextureDimension::D1,
        TextureDimension::D2 | TextureDimension::D2Array => wgpu::TextureDimension::D2,
        TextureDimension::D3 => wgpu::TextureDimension::D3,
    }
}

fn convert_view_dimension(dimension: TextureDimension) -> wgpu::TextureViewDimension {
    match dimension {
        TextureDimension::D1 => wgpu::TextureViewDimension::D1,
        TextureDimension::D2 => wgpu::TextureViewDimension::D2,
        TextureDimension::D2Array => wgpu::TextureViewDimension::D2Array,
        TextureDimension::D3 => wgpu::TextureViewDimension::D3,
    }
}

fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut result = wgpu::TextureUsages::empty();

    if usage.contains(TextureUsage::COPY_SRC) {
        result |= wgpu::TextureUsages::COPY_SRC;
    }
    if usage.contains(TextureUsage::COPY_DST) {
        result |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.contains(TextureUsage::TEXTURE_BINDING) {
        result |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.contains(TextureUsage::STORAGE_BINDING) {
        result |= wgpu::TextureUsages::STORAGE_BINDING;
    }
    if usage.contains(TextureUsage::RENDER_ATTACHMENT) {
        result |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }

    result
}

fn convert_address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        AddressMode::ClampToBorder => wgpu::AddressMode::ClampToBorder,
    }
}

fn convert_border_color(color: BorderColor) -> wgpu::SamplerBorderColor {
    match color {
        BorderColor::TransparentBlack => wgpu::SamplerBorderColor::TransparentBlack,
        BorderColor::OpaqueBlack => wgpu::SamplerBorderColor::OpaqueBlack,
        BorderColor::OpaqueWhite => wgpu::SamplerBorderColor::OpaqueWhite,
    }
}

fn convert_filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn convert_mipmap_filter_mode(mode: FilterMode) -> wgpu::MipmapFilterMode {
    match mode {
        FilterMode::Nearest => wgpu::MipmapFilterMode::Nearest,
        FilterMode::Linear => wgpu::MipmapFilterMode::Linear,
    }
}

fn convert_compare_function(func: CompareFunction) -> wgpu::CompareFunction {
    match func {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TextureFormat::R8Unorm, wgpu::TextureFormat::R8Unorm)]
    #[case(TextureFormat::Rgba8UnormSrgb, wgpu::TextureFormat::Rgba8UnormSrgb)]
    #[case(TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Bgra8Unorm)]
    #[case(TextureFormat::Rgba16Float, wgpu::TextureFormat::Rgba16Float)]
    #[case(TextureFormat::Rgba32Float, wgpu::TextureFormat::Rgba32Float)]
    fn test_texture_format_conversion(#[case] format: TextureFormat, #[case] expected: wgpu::TextureFormat) {
        assert_eq!(convert_texture_format(format).unwrap(), expected);
    }
}
