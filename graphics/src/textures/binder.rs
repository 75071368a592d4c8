//! Shader-facing view of texture handles.
//!
//! Material code describes its textures as [`NamedTextureHandle`]s. The
//! binder derives the shader buffer fields those textures need and fills
//! them in, or binds texture/sampler pairs directly when bindless textures
//! are not used.

use std::sync::Arc;

use texcache_core::math::mat4d_to_cols_array;
use texcache_core::texture::TextureType;

use crate::resources::{Sampler, Texture};

use super::TextureHandle;

/// A texture handle under the name shaders know it by.
#[derive(Debug, Clone)]
pub struct NamedTextureHandle {
    /// Shader-visible name.
    pub name: String,
    /// Type the shader samples the texture as.
    pub texture_type: TextureType,
    /// The handle.
    pub handle: Arc<TextureHandle>,
}

impl NamedTextureHandle {
    /// Create a named handle.
    pub fn new(name: impl Into<String>, texture_type: TextureType, handle: Arc<TextureHandle>) -> Self {
        Self {
            name: name.into(),
            texture_type,
            handle,
        }
    }

    fn matches_handle(&self) -> bool {
        let actual = self.handle.texture_object().texture_type();
        if actual != self.texture_type {
            log::error!(
                "Texture binding {} declared as {:?} but its handle is {:?}",
                self.name,
                self.texture_type,
                actual
            );
            return false;
        }
        true
    }
}

/// Type of a shader buffer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferElementType {
    /// 64-bit bindless token.
    BindlessHandle,
    /// Boolean stored as a 32-bit integer.
    Bool,
    /// Column-major 4x4 float matrix.
    Mat4,
}

impl BufferElementType {
    /// Size in bytes.
    pub const fn size(&self) -> usize {
        match self {
            Self::BindlessHandle => 8,
            Self::Bool => 4,
            Self::Mat4 => 64,
        }
    }
}

/// A named shader buffer field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferSpec {
    /// Field name.
    pub name: String,
    /// Field type.
    pub element_type: BufferElementType,
}

impl BufferSpec {
    fn new(name: String, element_type: BufferElementType) -> Self {
        Self { name, element_type }
    }
}

/// Value of a shader buffer field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSource {
    /// Field name.
    pub name: String,
    /// Field type.
    pub element_type: BufferElementType,
    /// Native-endian bytes of the value.
    pub data: Vec<u8>,
}

impl BufferSource {
    fn new(name: String, element_type: BufferElementType, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), element_type.size());
        Self {
            name,
            element_type,
            data,
        }
    }
}

fn layout_name(name: &str) -> String {
    format!("{name}_layout")
}

fn valid_name(name: &str) -> String {
    format!("{name}_valid")
}

fn sampling_transform_name(name: &str) -> String {
    format!("{name}_samplingTransform")
}

/// Buffer fields shaders need for `handles`.
///
/// Handles whose declared type disagrees with their texture are logged and
/// skipped.
pub fn buffer_specs(handles: &[NamedTextureHandle], use_bindless: bool) -> Vec<BufferSpec> {
    let mut specs = Vec::new();
    for named in handles.iter().filter(|named| named.matches_handle()) {
        let name = &named.name;
        match named.texture_type {
            TextureType::Uv => {
                if use_bindless {
                    specs.push(BufferSpec::new(name.clone(), BufferElementType::BindlessHandle));
                }
                specs.push(BufferSpec::new(valid_name(name), BufferElementType::Bool));
            }
            TextureType::Field => {
                if use_bindless {
                    specs.push(BufferSpec::new(name.clone(), BufferElementType::BindlessHandle));
                }
                specs.push(BufferSpec::new(sampling_transform_name(name), BufferElementType::Mat4));
                specs.push(BufferSpec::new(valid_name(name), BufferElementType::Bool));
            }
            TextureType::Ptex | TextureType::Udim => {
                if use_bindless {
                    specs.push(BufferSpec::new(name.clone(), BufferElementType::BindlessHandle));
                    specs.push(BufferSpec::new(layout_name(name), BufferElementType::BindlessHandle));
                }
            }
        }
    }
    specs
}

/// Values for the fields [`buffer_specs`] returns, in the same order.
pub fn compute_buffer_sources(handles: &[NamedTextureHandle], use_bindless: bool) -> Vec<BufferSource> {
    let mut sources = Vec::new();
    for named in handles.iter().filter(|named| named.matches_handle()) {
        let name = &named.name;
        let texture = named.handle.texture_object();
        let sampler = named.handle.sampler_object();
        let token = sampler.as_ref().map_or(0u64, |s| s.bindless_handle());
        let layout_token = sampler.as_ref().map_or(0u64, |s| s.layout_bindless_handle());
        let valid = u32::from(texture.is_valid());

        let bindless = |name: String, value: u64| {
            BufferSource::new(name, BufferElementType::BindlessHandle, bytemuck::bytes_of(&value).to_vec())
        };
        let flag = |name: String| BufferSource::new(name, BufferElementType::Bool, bytemuck::bytes_of(&valid).to_vec());

        match named.texture_type {
            TextureType::Uv => {
                if use_bindless {
                    sources.push(bindless(name.clone(), token));
                }
                sources.push(flag(valid_name(name)));
            }
            TextureType::Field => {
                if use_bindless {
                    sources.push(bindless(name.clone(), token));
                }
                let transform = mat4d_to_cols_array(&texture.sampling_transform());
                sources.push(BufferSource::new(
                    sampling_transform_name(name),
                    BufferElementType::Mat4,
                    bytemuck::cast_slice(&transform).to_vec(),
                ));
                sources.push(flag(valid_name(name)));
            }
            TextureType::Ptex | TextureType::Udim => {
                if use_bindless {
                    sources.push(bindless(name.clone(), token));
                    sources.push(bindless(layout_name(name), layout_token));
                }
            }
        }
    }
    sources
}

/// Receiver of texture/sampler bindings when bindless textures are off.
pub trait TextureBindingTarget {
    /// Bind `texture` sampled with `sampler` under `name`.
    fn bind_texture(&mut self, name: &str, texture: &Arc<Texture>, sampler: &Arc<Sampler>);

    /// Remove the binding `name`.
    fn unbind_texture(&mut self, name: &str);
}

/// Bind the committed textures of `handles` to `target`.
///
/// Does nothing in bindless mode. Handles without a committed texture or
/// sampler are skipped.
pub fn bind_resources(handles: &[NamedTextureHandle], use_bindless: bool, target: &mut dyn TextureBindingTarget) {
    if use_bindless {
        return;
    }
    for named in handles.iter().filter(|named| named.matches_handle()) {
        let texture = named.handle.texture_object();
        let Some(sampler) = named.handle.sampler_object() else {
            log::trace!("Texture binding {} has no sampler yet", named.name);
            continue;
        };
        if let Some(gpu_texture) = texture.texture() {
            target.bind_texture(&named.name, &gpu_texture, sampler.sampler());
        }
        if let (Some(layout), Some(layout_sampler)) = (texture.layout_texture(), sampler.layout_sampler()) {
            target.bind_texture(&layout_name(&named.name), &layout, layout_sampler);
        }
    }
}

/// Remove the bindings [`bind_resources`] made. Does nothing in bindless
/// mode.
pub fn unbind_resources(handles: &[NamedTextureHandle], use_bindless: bool, target: &mut dyn TextureBindingTarget) {
    if use_bindless {
        return;
    }
    for named in handles.iter().filter(|named| named.matches_handle()) {
        target.unbind_texture(&named.name);
        if named.texture_type.has_layout() {
            target.unbind_texture(&layout_name(&named.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::GraphicsDevice;
    use crate::parallel::ParConfig;
    use crate::textures::{SamplerObjectRegistry, TextureHandleRegistry, TextureObjectRegistry};
    use texcache_core::identifier::{SubtextureIdentifier, TextureIdentifier};
    use texcache_core::io::{MemoryImage, MemoryLoader};
    use texcache_core::math::BBox3d;
    use texcache_core::sampler::SamplerParameters;
    use texcache_core::texture::{CpuTexture, TextureFormat};

    fn registry() -> TextureHandleRegistry {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert_image(
            "albedo.png",
            MemoryImage::new(CpuTexture::filled_2d(4, 4, TextureFormat::Rgba8Unorm, &[7; 4])),
        );
        loader.insert_field(
            "smoke.vdb",
            "density",
            0,
            CpuTexture::new_3d(2, 2, 2, TextureFormat::R32Float, vec![0; 32]),
            BBox3d::default(),
        );
        let device = GraphicsDevice::dummy();
        TextureHandleRegistry::new(
            TextureObjectRegistry::new(device.clone(), loader, ParConfig::default()),
            SamplerObjectRegistry::new(device),
        )
    }

    fn handle(registry: &TextureHandleRegistry, id: TextureIdentifier, texture_type: TextureType) -> Arc<TextureHandle> {
        registry
            .allocate_texture_handle(&id, texture_type, SamplerParameters::linear(), 0, true, None)
            .unwrap()
    }

    fn names(specs: &[BufferSpec]) -> Vec<&str> {
        specs.iter().map(|s| s.name.as_str()).collect()
    }

    #[derive(Default)]
    struct RecordingTarget {
        bound: Vec<String>,
        unbound: Vec<String>,
    }

    impl TextureBindingTarget for RecordingTarget {
        fn bind_texture(&mut self, name: &str, _texture: &Arc<Texture>, _sampler: &Arc<Sampler>) {
            self.bound.push(name.to_owned());
        }

        fn unbind_texture(&mut self, name: &str) {
            self.unbound.push(name.to_owned());
        }
    }

    #[test]
    fn test_specs_per_type() {
        let registry = registry();
        let field_id = TextureIdentifier::with_subtexture("smoke.vdb", SubtextureIdentifier::open_vdb("density", 0));
        let handles = vec![
            NamedTextureHandle::new("albedo", TextureType::Uv, handle(&registry, TextureIdentifier::new("albedo.png"), TextureType::Uv)),
            NamedTextureHandle::new("density", TextureType::Field, handle(&registry, field_id, TextureType::Field)),
            NamedTextureHandle::new(
                "skin",
                TextureType::Udim,
                handle(&registry, TextureIdentifier::new("skin.<UDIM>.png"), TextureType::Udim),
            ),
        ];

        assert_eq!(
            names(&buffer_specs(&handles, false)),
            ["albedo_valid", "density_samplingTransform", "density_valid"]
        );
        assert_eq!(
            names(&buffer_specs(&handles, true)),
            [
                "albedo",
                "albedo_valid",
                "density",
                "density_samplingTransform",
                "density_valid",
                "skin",
                "skin_layout"
            ]
        );
    }

    #[test]
    fn test_sources_match_specs() {
        let registry = registry();
        let albedo = handle(&registry, TextureIdentifier::new("albedo.png"), TextureType::Uv);
        let missing = handle(&registry, TextureIdentifier::new("missing.png"), TextureType::Uv);
        registry.commit();

        let handles = vec![
            NamedTextureHandle::new("albedo", TextureType::Uv, albedo),
            NamedTextureHandle::new("missing", TextureType::Uv, missing),
        ];
        let specs = buffer_specs(&handles, true);
        let sources = compute_buffer_sources(&handles, true);
        assert_eq!(specs.len(), sources.len());
        for (spec, source) in specs.iter().zip(&sources) {
            assert_eq!(spec.name, source.name);
            assert_eq!(source.data.len(), spec.element_type.size());
        }

        let value = |name: &str| sources.iter().find(|s| s.name == name).unwrap().data.clone();
        assert_ne!(bytemuck::pod_read_unaligned::<u64>(&value("albedo")), 0);
        assert_eq!(bytemuck::pod_read_unaligned::<u32>(&value("albedo_valid")), 1);
        assert_eq!(bytemuck::pod_read_unaligned::<u64>(&value("missing")), 0);
        assert_eq!(bytemuck::pod_read_unaligned::<u32>(&value("missing_valid")), 0);
    }

    #[test]
    fn test_type_mismatch_skipped() {
        let registry = registry();
        let uv = handle(&registry, TextureIdentifier::new("albedo.png"), TextureType::Uv);
        let handles = vec![NamedTextureHandle::new("albedo", TextureType::Ptex, uv)];
        assert!(buffer_specs(&handles, true).is_empty());
        assert!(compute_buffer_sources(&handles, true).is_empty());
    }

    #[test]
    fn test_bind_resources() {
        let registry = registry();
        let albedo = handle(&registry, TextureIdentifier::new("albedo.png"), TextureType::Uv);
        let pending = handle(&registry, TextureIdentifier::new("missing.png"), TextureType::Uv);
        registry.commit();
        let handles = vec![
            NamedTextureHandle::new("albedo", TextureType::Uv, albedo),
            NamedTextureHandle::new("missing", TextureType::Uv, pending),
        ];

        let mut target = RecordingTarget::default();
        bind_resources(&handles, true, &mut target);
        assert!(target.bound.is_empty());

        bind_resources(&handles, false, &mut target);
        assert_eq!(target.bound, ["albedo"]);
        unbind_resources(&handles, false, &mut target);
        assert_eq!(target.unbound, ["albedo", "missing"]);
    }
}
