//! Device sampler state for one texture handle.

use std::sync::Arc;

use texcache_core::sampler::{SamplerParameters, WrapMode};
use texcache_core::texture::TextureType;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::{BindlessHandle, Sampler, Texture};
use crate::types::SamplerDescriptor;

use super::TextureObject;

/// Sampler(s) and bindless tokens for one texture handle.
///
/// Uv and field textures use one sampler. Ptex and udim textures add a
/// nearest-filtering sampler for their layout table. In bindless mode
/// every texture/sampler pair also gets a resident token.
pub struct SamplerObject {
    texture_type: TextureType,
    descriptor: SamplerDescriptor,
    sampler: Arc<Sampler>,
    layout_sampler: Option<Arc<Sampler>>,
    bindless_supported: bool,
    bindless_requested: bool,
    bindless: Option<BindlessHandle>,
    layout_bindless: Option<BindlessHandle>,
}

/// Sampler state for `texture` sampled with `parameters`.
///
/// Uv textures resolve no-opinion wraps against the file's hints. Field,
/// ptex and udim textures always clamp to the edge.
pub fn resolve_sampler_descriptor(texture: &TextureObject, parameters: &SamplerParameters) -> SamplerDescriptor {
    let wraps = match texture.texture_type() {
        TextureType::Uv => {
            let [hint_s, hint_t] = texture.wrap_parameters();
            [
                parameters.wrap_s.resolve(hint_s),
                parameters.wrap_t.resolve(hint_t),
                parameters.wrap_r.resolve(WrapMode::NoOpinion),
            ]
        }
        TextureType::Field | TextureType::Ptex | TextureType::Udim => [WrapMode::Clamp; 3],
    };
    SamplerDescriptor::from_parameters(parameters, wraps).with_label(texture.identifier().to_string())
}

impl SamplerObject {
    /// Create the device state for `texture`.
    ///
    /// # Errors
    ///
    /// Fails if the device cannot create a sampler. A failed bindless token
    /// is logged and leaves the token empty.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        texture: &TextureObject,
        parameters: &SamplerParameters,
        create_bindless_handle: bool,
    ) -> Result<Self, GraphicsError> {
        let texture_type = texture.texture_type();
        let descriptor = resolve_sampler_descriptor(texture, parameters);
        let sampler = device.create_sampler(&descriptor)?;

        let layout_sampler = if texture_type.has_layout() {
            let layout_descriptor = SamplerDescriptor::new().with_label(format!("{} layout", texture.identifier()));
            Some(device.create_sampler(&layout_descriptor)?)
        } else {
            None
        };

        let bindless_supported = device.capabilities().bindless_textures;
        if create_bindless_handle && !bindless_supported {
            log::debug!("{}: bindless textures unsupported by {}", texture.identifier(), device.backend_name());
        }
        let bindless_requested = create_bindless_handle && bindless_supported;

        let (bindless, layout_bindless) = if bindless_requested {
            (
                make_resident(device, texture.texture(), Some(&sampler)),
                make_resident(device, texture.layout_texture(), layout_sampler.as_ref()),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            texture_type,
            descriptor,
            sampler,
            layout_sampler,
            bindless_supported,
            bindless_requested,
            bindless,
            layout_bindless,
        })
    }

    /// Returns true if this state still serves `texture` with `parameters`.
    ///
    /// Bindless state also goes stale when the texture object swapped its
    /// device textures.
    pub fn is_current(&self, texture: &TextureObject, parameters: &SamplerParameters, create_bindless_handle: bool) -> bool {
        let bindless_requested = create_bindless_handle && self.bindless_supported;
        if self.bindless_requested != bindless_requested
            || self.texture_type != texture.texture_type()
            || self.descriptor != resolve_sampler_descriptor(texture, parameters)
        {
            return false;
        }
        if !bindless_requested {
            return true;
        }
        resident_id(&self.bindless) == texture.texture().map(|t| t.id())
            && resident_id(&self.layout_bindless) == texture.layout_texture().map(|t| t.id())
    }

    /// The texture type this state was built for.
    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    /// The resolved sampler descriptor.
    pub fn descriptor(&self) -> &SamplerDescriptor {
        &self.descriptor
    }

    /// The texel sampler.
    pub fn sampler(&self) -> &Arc<Sampler> {
        &self.sampler
    }

    /// The layout table sampler of ptex and udim textures.
    pub fn layout_sampler(&self) -> Option<&Arc<Sampler>> {
        self.layout_sampler.as_ref()
    }

    /// Bindless token of the texels, 0 if there is none.
    pub fn bindless_handle(&self) -> u64 {
        self.bindless.as_ref().map_or(0, BindlessHandle::value)
    }

    /// Bindless token of the layout table, 0 if there is none.
    pub fn layout_bindless_handle(&self) -> u64 {
        self.layout_bindless.as_ref().map_or(0, BindlessHandle::value)
    }
}

fn make_resident(
    device: &Arc<GraphicsDevice>,
    texture: Option<Arc<Texture>>,
    sampler: Option<&Arc<Sampler>>,
) -> Option<BindlessHandle> {
    let (texture, sampler) = (texture?, sampler?);
    device
        .create_bindless_handle(&texture, sampler)
        .inspect_err(|e| log::error!("Failed to create bindless handle for {:?}: {e}", texture.label()))
        .ok()
}

fn resident_id(handle: &Option<BindlessHandle>) -> Option<u64> {
    handle.as_ref().map(|h| h.texture().id())
}

impl std::fmt::Debug for SamplerObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerObject")
            .field("texture_type", &self.texture_type)
            .field("descriptor", &self.descriptor)
            .field("bindless", &self.bindless_handle())
            .finish()
    }
}

static_assertions::assert_impl_all!(SamplerObject: Send, Sync);
