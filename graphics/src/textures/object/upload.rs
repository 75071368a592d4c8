//! Moving CPU texels into device textures.

use std::sync::Arc;

use texcache_core::texture::CpuTexture;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::types::TextureDescriptor;

/// Create a device texture for `cpu` and upload its texels.
///
/// When `cpu` asks for mipmaps they are generated on the device, or built
/// on the CPU and uploaded level by level if the backend cannot generate
/// them. Formats without a CPU filter get a single level on such backends.
pub(crate) fn upload_texture(
    device: &Arc<GraphicsDevice>,
    cpu: &CpuTexture,
    label: &str,
) -> Result<Arc<Texture>, GraphicsError> {
    if !cpu.is_valid() {
        return Err(GraphicsError::InvalidParameter(format!(
            "{label}: {} bytes for {}x{}x{} {:?}",
            cpu.data.len(),
            cpu.width,
            cpu.height,
            cpu.depth,
            cpu.format
        )));
    }

    let mut descriptor = TextureDescriptor::for_upload(cpu).with_label(label);
    if descriptor.mip_level_count > 1
        && !device.capabilities().gpu_mipmap_generation
        && cpu.format.channel_layout().is_none()
    {
        log::warn!("{label}: no mipmaps for {:?} without GPU generation", cpu.format);
        descriptor.mip_level_count = 1;
    }

    let texture = device.create_texture(&descriptor)?;
    device.write_texture(&texture, 0, &cpu.data)?;

    if descriptor.mip_level_count > 1 {
        match device.generate_mipmaps(&texture) {
            Err(GraphicsError::FeatureNotSupported(_)) => write_cpu_mipmaps(device, &texture, cpu)?,
            result => result?,
        }
    }

    Ok(texture)
}

fn write_cpu_mipmaps(device: &GraphicsDevice, texture: &Texture, cpu: &CpuTexture) -> Result<(), GraphicsError> {
    let chain = cpu
        .mip_chain()
        .ok_or_else(|| GraphicsError::FeatureNotSupported(format!("CPU mipmaps for {:?}", cpu.format)))?;
    for (index, level) in chain.iter().enumerate().take(texture.mip_level_count() as usize - 1) {
        device.write_texture(texture, index as u32 + 1, &level.data)?;
    }
    Ok(())
}
